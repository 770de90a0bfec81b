//! The engine's top-level error type, flattening every collaborator's error
//! (transport, protocol codecs, matching, filesystem I/O) into one enum a
//! role can propagate with `?` and a caller can match on.

use protocol::descriptor::DescriptorError;
use protocol::version::VersionError;
use protocol::wire::WireError;
use protocol::MessageTag;
use transport::TransportError;

/// Errors a [`crate::sender`] or [`crate::receiver`] role can surface.
///
/// Every variant is treated as fatal to the whole session; this crate does
/// not retry mid-session.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The transport failed to send or receive a framed message.
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// A message arrived with a tag other than the one the state machine
    /// expected at this point in the session.
    #[error("protocol error: expected {expected} but received {got}")]
    UnexpectedTag {
        /// The tag the role was waiting for.
        expected: MessageTag,
        /// The tag actually received.
        got: MessageTag,
    },
    /// The `HELLO` exchange failed to decode or the versions did not match.
    #[error(transparent)]
    Version(#[from] VersionError),
    /// A JSON message body (`FILES`, `NEED`, `DEL`, or a `DATA` descriptor)
    /// failed to encode or decode.
    #[error(transparent)]
    Descriptor(#[from] DescriptorError),
    /// A binary message body (signature list or delta stream) failed to
    /// decode.
    #[error(transparent)]
    Wire(#[from] WireError),
    /// A delta referenced a basis block outside the signature list.
    #[error(transparent)]
    Patch(#[from] matching::PatchError),
    /// A filesystem or other I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// `NEED` (or `DEL`) named a path this role has no descriptor for.
    #[error("no descriptor for path {0:?}")]
    UnknownPath(String),
}
