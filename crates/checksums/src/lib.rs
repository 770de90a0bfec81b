#![deny(unsafe_code)]
#![deny(missing_docs)]

//! # Overview
//!
//! Weak and strong block-hash primitives used by the [`signature`] and
//! [`matching`] crates to find block-level similarity between a receiver-held
//! basis file and a sender-held source file.
//!
//! - [`weak`] computes a fast, non-rolling 32-bit digest (XXH32) used to index
//!   candidate matches in a hash table.
//! - [`strong`] computes a 128-bit digest (XXH3/128) used to confirm a weak-hash
//!   hit before a block reference is ever emitted.
//!
//! Neither hash needs to be rolling: every match position this workspace
//! considers is aligned to a multiple of the block size (see the `signature`
//! crate), so there is no sliding window to maintain incrementally.
//!
//! # Examples
//!
//! ```
//! use checksums::{strong, weak};
//!
//! let block = b"some block of file content";
//! let w = weak(block);
//! let s = strong(block);
//! assert_eq!(w, weak(block));
//! assert_eq!(s, strong(block));
//! ```

mod streaming;

pub use streaming::{StrongHasher, WeakHasher};

/// Length in bytes of the strong digest produced by [`strong`].
pub const STRONG_DIGEST_LEN: usize = 16;

/// A 128-bit strong digest, confirmed only on a [`weak`] hash collision.
pub type StrongDigest = [u8; STRONG_DIGEST_LEN];

/// Computes the weak 32-bit digest of `data`.
///
/// Implemented with XXH32: fast, deterministic, and order-dependent, but with
/// no preimage or collision resistance guarantees. A match on `weak` alone is
/// never sufficient; callers must confirm with [`strong`] before treating two
/// blocks as identical.
#[must_use]
pub fn weak(data: &[u8]) -> u32 {
    xxhash_rust::xxh32::xxh32(data, 0)
}

/// Computes the strong 128-bit digest of `data`.
///
/// Implemented with XXH3/128. Not cryptographically secure, but its collision
/// probability is negligible even across the largest block counts this
/// workspace's block-sizing policy produces (~128 blocks per file, see the
/// `signature` crate).
#[must_use]
pub fn strong(data: &[u8]) -> StrongDigest {
    xxhash_rust::xxh3::xxh3_128(data).to_be_bytes()
}
