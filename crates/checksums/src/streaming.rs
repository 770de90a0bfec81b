//! Streaming variants of the weak and strong hashers.
//!
//! The one-shot [`super::weak`]/[`super::strong`] functions cover every
//! call site the delta engine needs (blocks are always materialized as a
//! contiguous slice before hashing), but a streaming interface is kept
//! alongside them for callers that want to feed a block incrementally
//! (for example while reading it off a memory-mapped region in chunks).

use crate::StrongDigest;

/// Incremental XXH32 hasher, mirroring [`super::weak`].
#[derive(Clone, Default)]
pub struct WeakHasher {
    inner: xxhash_rust::xxh32::Xxh32,
}

impl WeakHasher {
    /// Creates a hasher with an empty state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: xxhash_rust::xxh32::Xxh32::new(0),
        }
    }

    /// Feeds additional bytes into the digest state.
    pub fn update(&mut self, data: &[u8]) {
        self.inner.update(data);
    }

    /// Finalizes the digest and returns the 32-bit weak hash.
    #[must_use]
    pub fn finalize(self) -> u32 {
        self.inner.digest()
    }
}

/// Incremental XXH3/128 hasher, mirroring [`super::strong`].
#[derive(Clone, Default)]
pub struct StrongHasher {
    inner: xxhash_rust::xxh3::Xxh3,
}

impl StrongHasher {
    /// Creates a hasher with an empty state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: xxhash_rust::xxh3::Xxh3::new(),
        }
    }

    /// Feeds additional bytes into the digest state.
    pub fn update(&mut self, data: &[u8]) {
        self.inner.update(data);
    }

    /// Finalizes the digest and returns the 128-bit strong hash.
    #[must_use]
    pub fn finalize(self) -> StrongDigest {
        self.inner.digest128().to_be_bytes()
    }
}
