#![deny(unsafe_code)]
#![deny(missing_docs)]

//! # Overview
//!
//! The wire format the sender and receiver roles (see the `engine` crate)
//! exchange over a [`transport`](../transport/index.html)-owned byte stream:
//!
//! - [`envelope`] frames every message with a fixed six-byte header and
//!   optional zstd compression of the payload.
//! - [`version`] defines the single negotiated protocol version exchanged at
//!   `HELLO`.
//! - [`wire`] encodes and decodes the two binary payload shapes the protocol
//!   carries: signature lists and delta instruction streams.
//! - [`descriptor`] defines the JSON-encoded file descriptor records and the
//!   `NEED`/`DEL` message bodies.

pub mod descriptor;
pub mod envelope;
pub mod version;
pub mod wire;

pub use descriptor::{FileEntry, NeedSet};
pub use envelope::{FrameHeader, MessageTag, HEADER_LEN};
pub use version::PROTOCOL_VERSION;
