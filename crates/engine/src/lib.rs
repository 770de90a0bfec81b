#![deny(missing_docs)]

//! # Overview
//!
//! The sender and receiver protocol roles plus everything they need to
//! actually touch disk: the per-file sync decision predicate,
//! memory-mapped basis/source reads, atomic whole-file writes,
//! directory/symlink application, and deletion-phase path ordering.
//!
//! This crate deliberately does *not* unsafe-forbid itself the way the leaf
//! crates ([`checksums`], [`signature`], [`matching`]) do: memory-mapping a
//! file is an unavoidable `unsafe` operation, confined to [`fsops::map_file`].
//!
//! [`sender::run_sender`] and [`receiver::run_receiver`] are the two entry
//! points; both drive a [`transport::Transport`] through the fixed message
//! sequence from `HELLO` to `DONE`, failing the whole session on any
//! unexpected tag or framing error.

pub mod decision;
mod error;
pub mod fsops;
mod receiver;
mod sender;

pub use decision::{decide, Decision};
pub use error::EngineError;
pub use receiver::run_receiver;
pub use sender::run_sender;

/// Byte counters for one completed session, read off the transport after
/// `DONE`/`DONE` completes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SessionStats {
    /// Total bytes written to the transport.
    pub bytes_sent: u64,
    /// Total bytes read from the transport.
    pub bytes_received: u64,
}
