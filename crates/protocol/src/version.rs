//! Protocol version negotiation.
//!
//! The sender transmits a `HELLO` message carrying [`PROTOCOL_VERSION`] as
//! its payload; the receiver echoes its own back. Either side aborts the
//! session if the versions don't match; there is no version range
//! negotiation, since both sides are always built from the same crate.

use std::convert::TryInto;

/// The single protocol version this crate speaks.
pub const PROTOCOL_VERSION: u32 = 1;

/// Errors produced while decoding a `HELLO` payload.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum VersionError {
    /// The `HELLO` payload was not exactly four bytes.
    #[error("malformed HELLO payload: expected 4 bytes, got {0}")]
    MalformedPayload(usize),
    /// The peer's version does not match ours.
    #[error("protocol version mismatch: local {local}, peer {peer}")]
    Mismatch {
        /// This side's [`PROTOCOL_VERSION`].
        local: u32,
        /// The version the peer sent.
        peer: u32,
    },
}

/// Encodes [`PROTOCOL_VERSION`] as a four-byte big-endian `HELLO` payload.
#[must_use]
pub fn encode_hello() -> [u8; 4] {
    PROTOCOL_VERSION.to_be_bytes()
}

/// Decodes a peer's `HELLO` payload and checks it against our own version.
pub fn decode_hello(payload: &[u8]) -> Result<u32, VersionError> {
    let bytes: [u8; 4] = payload
        .try_into()
        .map_err(|_| VersionError::MalformedPayload(payload.len()))?;
    let peer = u32::from_be_bytes(bytes);
    if peer != PROTOCOL_VERSION {
        return Err(VersionError::Mismatch {
            local: PROTOCOL_VERSION,
            peer,
        });
    }
    Ok(peer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hello_round_trips() {
        let payload = encode_hello();
        assert_eq!(decode_hello(&payload).unwrap(), PROTOCOL_VERSION);
    }

    #[test]
    fn hello_rejects_short_payload() {
        let err = decode_hello(&[1, 2, 3]).unwrap_err();
        assert_eq!(err, VersionError::MalformedPayload(3));
    }

    #[test]
    fn hello_rejects_version_mismatch() {
        let err = decode_hello(&99u32.to_be_bytes()).unwrap_err();
        assert_eq!(
            err,
            VersionError::Mismatch {
                local: PROTOCOL_VERSION,
                peer: 99
            }
        );
    }
}
