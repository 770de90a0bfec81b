//! Framed message header and whole-message encode/decode.
//!
//! Every message on the wire is a six-byte big-endian header,
//! `tag: u8, flags: u8, length: u32`, followed by exactly `length` bytes of
//! payload. `flags` bit 0 set means the payload is zstd-compressed; every
//! other bit is reserved and must be zero.

use compress::{Codec, MIN_COMPRESS_LEN};
use std::fmt;

/// Length in bytes of a framed message header.
pub const HEADER_LEN: usize = 6;

/// Flag bit indicating the payload is zstd-compressed.
const FLAG_COMPRESSED: u8 = 0b0000_0001;

/// The tag identifying a message's role in the session state machine
/// (see the `engine` crate's `Sender`/`Receiver` for how these are sequenced).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MessageTag {
    /// Handshake: protocol version exchange. Sender first, receiver echoes.
    Hello = 0,
    /// Sender -> Receiver: JSON array of file descriptor records.
    Files = 1,
    /// Receiver -> Sender: JSON `{ delta, data, delete }` path sets.
    Need = 2,
    /// Receiver -> Sender: signature list for one path from `NEED.delta`.
    Sigs = 3,
    /// Sender -> Receiver: delta instruction stream for the same path.
    Delta = 4,
    /// Sender -> Receiver: raw bytes or a directory/symlink descriptor.
    Data = 5,
    /// Sender -> Receiver: JSON array of paths to delete.
    Del = 6,
    /// Both directions: terminates the session.
    Done = 7,
    /// Reserved for error signalling; never emitted by this crate.
    Err = 8,
}

impl MessageTag {
    /// Converts a raw tag byte into a [`MessageTag`].
    pub fn from_u8(byte: u8) -> Result<Self, EnvelopeError> {
        match byte {
            0 => Ok(Self::Hello),
            1 => Ok(Self::Files),
            2 => Ok(Self::Need),
            3 => Ok(Self::Sigs),
            4 => Ok(Self::Delta),
            5 => Ok(Self::Data),
            6 => Ok(Self::Del),
            7 => Ok(Self::Done),
            8 => Ok(Self::Err),
            other => Err(EnvelopeError::InvalidTag(other)),
        }
    }
}

impl fmt::Display for MessageTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Hello => "HELLO",
            Self::Files => "FILES",
            Self::Need => "NEED",
            Self::Sigs => "SIGS",
            Self::Delta => "DELTA",
            Self::Data => "DATA",
            Self::Del => "DEL",
            Self::Done => "DONE",
            Self::Err => "ERR",
        };
        f.write_str(name)
    }
}

/// Errors produced while framing or parsing a message header or payload.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum EnvelopeError {
    /// The header's tag byte does not correspond to a known [`MessageTag`].
    #[error("invalid message tag: {0}")]
    InvalidTag(u8),
    /// A reserved flag bit (anything but bit 0) was set.
    #[error("reserved flag bits set: {0:#010b}")]
    ReservedFlagBits(u8),
    /// The stream ended before a complete header could be read.
    #[error("end of stream while reading message header")]
    UnexpectedEof,
    /// The stream ended before the payload's declared length was satisfied.
    #[error("payload truncated: expected {expected} bytes, got {actual}")]
    TruncatedPayload {
        /// Declared payload length from the header.
        expected: u32,
        /// Bytes actually available.
        actual: usize,
    },
    /// The payload claimed to be compressed but failed to decompress.
    #[error("failed to decompress payload: {0}")]
    Decompression(#[from] compress::CompressError),
}

/// A decoded six-byte message header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameHeader {
    tag: MessageTag,
    flags: u8,
    length: u32,
}

impl FrameHeader {
    /// Builds a header, rejecting reserved flag bits.
    pub fn new(tag: MessageTag, compressed: bool, length: u32) -> Self {
        Self {
            tag,
            flags: if compressed { FLAG_COMPRESSED } else { 0 },
            length,
        }
    }

    /// The message tag.
    #[must_use]
    pub const fn tag(&self) -> MessageTag {
        self.tag
    }

    /// Whether the payload is zstd-compressed.
    #[must_use]
    pub const fn is_compressed(&self) -> bool {
        self.flags & FLAG_COMPRESSED != 0
    }

    /// Declared payload length in bytes.
    #[must_use]
    pub const fn payload_len(&self) -> u32 {
        self.length
    }

    /// Encodes the header into its six-byte wire representation.
    #[must_use]
    pub fn encode(&self) -> [u8; HEADER_LEN] {
        let mut buf = [0u8; HEADER_LEN];
        buf[0] = self.tag as u8;
        buf[1] = self.flags;
        buf[2..6].copy_from_slice(&self.length.to_be_bytes());
        buf
    }

    /// Decodes a header from exactly [`HEADER_LEN`] bytes.
    pub fn decode(bytes: &[u8; HEADER_LEN]) -> Result<Self, EnvelopeError> {
        let tag = MessageTag::from_u8(bytes[0])?;
        let flags = bytes[1];
        if flags & !FLAG_COMPRESSED != 0 {
            return Err(EnvelopeError::ReservedFlagBits(flags));
        }
        let length = u32::from_be_bytes([bytes[2], bytes[3], bytes[4], bytes[5]]);
        Ok(Self { tag, flags, length })
    }
}

/// Encodes a full message: header plus payload, compressing the payload
/// first if `compress` is set and the payload is large enough to benefit
/// (see [`compress::MIN_COMPRESS_LEN`]).
///
/// Returns the bytes ready to write to a transport.
pub fn encode_message(tag: MessageTag, payload: &[u8], compress: bool, codec: &Codec) -> Vec<u8> {
    let (body, compressed) = if compress && payload.len() > MIN_COMPRESS_LEN {
        match codec.compress(payload) {
            Ok(z) if z.len() < payload.len() => (z, true),
            _ => (payload.to_vec(), false),
        }
    } else {
        (payload.to_vec(), false)
    };

    let header = FrameHeader::new(tag, compressed, body.len() as u32);
    let mut out = Vec::with_capacity(HEADER_LEN + body.len());
    out.extend_from_slice(&header.encode());
    out.extend_from_slice(&body);
    out
}

/// Decodes a complete message (header already parsed) by decompressing its
/// payload if the header's flag says so.
pub fn decode_payload(header: &FrameHeader, raw: &[u8], codec: &Codec) -> Result<Vec<u8>, EnvelopeError> {
    if raw.len() != header.payload_len() as usize {
        return Err(EnvelopeError::TruncatedPayload {
            expected: header.payload_len(),
            actual: raw.len(),
        });
    }
    if header.is_compressed() {
        Ok(codec.decompress(raw)?)
    } else {
        Ok(raw.to_vec())
    }
}
