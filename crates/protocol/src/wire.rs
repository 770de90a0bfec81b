//! Binary codecs for the two payload shapes that travel as raw bytes rather
//! than JSON: signature lists (`SIGS`) and delta instruction streams
//! (`DELTA`).
//!
//! Signature list layout:
//!
//! ```text
//! block_size: u32 BE
//! count:      u32 BE
//! count * (weak: u32 BE, strong: [u8; 16])
//! ```
//!
//! Delta instruction stream layout, one record after another to end of
//! payload:
//!
//! ```text
//! Ref:     kind = 0u8, index: u32 BE                      (5 bytes)
//! Literal: kind = 1u8, length: u32 BE, bytes: [u8; length] (5 + length bytes)
//! ```

use checksums::{StrongDigest, STRONG_DIGEST_LEN};
use matching::Instruction;
use signature::Signature;

/// Errors produced while decoding a signature list or delta stream.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum WireError {
    /// The buffer ended mid-record.
    #[error("truncated {what} at byte offset {offset}")]
    Truncated {
        /// Which payload shape was being decoded.
        what: &'static str,
        /// Byte offset into the payload where the record started.
        offset: usize,
    },
    /// A delta record's kind byte was neither 0 (ref) nor 1 (literal).
    #[error("unknown delta instruction kind {0}")]
    UnknownInstructionKind(u8),
}

const KIND_REF: u8 = 0;
const KIND_LITERAL: u8 = 1;

/// Encodes a signature list as produced by [`signature::signatures`].
#[must_use]
pub fn encode_signatures(block_size: u64, sigs: &[Signature]) -> Vec<u8> {
    let mut out = Vec::with_capacity(8 + sigs.len() * (4 + STRONG_DIGEST_LEN));
    out.extend_from_slice(&(block_size as u32).to_be_bytes());
    out.extend_from_slice(&(sigs.len() as u32).to_be_bytes());
    for sig in sigs {
        out.extend_from_slice(&sig.weak.to_be_bytes());
        out.extend_from_slice(&sig.strong);
    }
    out
}

/// Decodes a signature list, returning the block size it was generated with
/// and the list itself.
pub fn decode_signatures(payload: &[u8]) -> Result<(u64, Vec<Signature>), WireError> {
    if payload.len() < 8 {
        return Err(WireError::Truncated {
            what: "signature list header",
            offset: 0,
        });
    }
    let block_size = u32::from_be_bytes(payload[0..4].try_into().unwrap()) as u64;
    let count = u32::from_be_bytes(payload[4..8].try_into().unwrap()) as usize;

    let record_len = 4 + STRONG_DIGEST_LEN;
    let body = &payload[8..];
    if body.len() != count * record_len {
        return Err(WireError::Truncated {
            what: "signature list body",
            offset: 8 + body.len(),
        });
    }

    let mut sigs = Vec::with_capacity(count);
    for (i, chunk) in body.chunks_exact(record_len).enumerate() {
        let weak = u32::from_be_bytes(chunk[0..4].try_into().unwrap());
        let mut strong: StrongDigest = [0u8; STRONG_DIGEST_LEN];
        strong.copy_from_slice(&chunk[4..4 + STRONG_DIGEST_LEN]);
        let _ = i;
        sigs.push(Signature { weak, strong });
    }
    Ok((block_size, sigs))
}

/// Encodes a delta instruction stream as produced by [`matching::delta`].
#[must_use]
pub fn encode_delta(instructions: &[Instruction]) -> Vec<u8> {
    let mut out = Vec::new();
    for instruction in instructions {
        match instruction {
            Instruction::Ref { index } => {
                out.push(KIND_REF);
                out.extend_from_slice(&index.to_be_bytes());
            }
            Instruction::Literal { bytes } => {
                out.push(KIND_LITERAL);
                out.extend_from_slice(&(bytes.len() as u32).to_be_bytes());
                out.extend_from_slice(bytes);
            }
        }
    }
    out
}

/// Decodes a delta instruction stream.
pub fn decode_delta(payload: &[u8]) -> Result<Vec<Instruction>, WireError> {
    let mut instructions = Vec::new();
    let mut offset = 0;

    while offset < payload.len() {
        let kind = payload[offset];
        match kind {
            KIND_REF => {
                let end = offset + 5;
                let field = payload.get(offset + 1..end).ok_or(WireError::Truncated {
                    what: "ref instruction",
                    offset,
                })?;
                let index = u32::from_be_bytes(field.try_into().unwrap());
                instructions.push(Instruction::reference(index));
                offset = end;
            }
            KIND_LITERAL => {
                let len_field = payload
                    .get(offset + 1..offset + 5)
                    .ok_or(WireError::Truncated {
                        what: "literal instruction length",
                        offset,
                    })?;
                let length = u32::from_be_bytes(len_field.try_into().unwrap()) as usize;
                let data_start = offset + 5;
                let data_end = data_start + length;
                let bytes = payload
                    .get(data_start..data_end)
                    .ok_or(WireError::Truncated {
                        what: "literal instruction body",
                        offset,
                    })?;
                instructions.push(Instruction::literal(bytes.to_vec()));
                offset = data_end;
            }
            other => return Err(WireError::UnknownInstructionKind(other)),
        }
    }

    Ok(instructions)
}
