#![deny(unsafe_code)]
#![deny(missing_docs)]

//! # Overview
//!
//! Matches a sender-held source file against a receiver-held basis file's
//! [`Signature`] list and emits a [`Instruction`] sequence (a *delta*) that
//! reconstructs the source from the basis plus a handful of literal bytes.
//! [`patch`] is the receiver-side inverse: it walks a delta and rebuilds the
//! source file from the basis.
//!
//! # Matching algorithm
//!
//! The matcher checks only block-aligned offsets into `source`; it performs
//! no byte-granular (rolling) search. At each aligned offset it computes the
//! weak hash of the block and looks it up in a table built from `sigs`; on a
//! weak-hash hit it confirms with the strong hash before emitting a block
//! reference. Ties (multiple basis blocks sharing both digests) resolve to
//! the lowest basis index, making the output deterministic and testable.
//!
//! This is a deliberate simplification: an insertion that shifts the source
//! by fewer than `block_size` bytes defeats every subsequent block-aligned
//! match. The cost is bounded by the block size the `signature` crate's
//! sizing policy chooses for the file.

use checksums::{strong, weak, StrongDigest};
use rustc_hash::FxHashMap;
use signature::Signature;
use std::fmt;

/// One instruction in a delta sequence.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Instruction {
    /// Copy basis block `index` verbatim (`basis[index * bs .. index * bs + bs]`,
    /// or fewer bytes if it is the basis's final, short block).
    Ref {
        /// Index into the basis's signature list.
        index: u32,
    },
    /// Emit these raw bytes; no matching basis block was found for them.
    Literal {
        /// The literal bytes to emit.
        bytes: Vec<u8>,
    },
}

impl Instruction {
    /// Convenience constructor for a block reference.
    #[must_use]
    pub fn reference(index: u32) -> Self {
        Self::Ref { index }
    }

    /// Convenience constructor for a literal.
    #[must_use]
    pub fn literal(bytes: impl Into<Vec<u8>>) -> Self {
        Self::Literal {
            bytes: bytes.into(),
        }
    }
}

/// Errors surfaced while reconstructing a file from a basis and a delta.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PatchError {
    /// A `Ref` instruction named a basis block index beyond the basis's
    /// signature count (invariant: `0 <= index < len(signatures)`).
    #[error("delta references basis block {index}, but the basis has only {available} blocks")]
    RefOutOfRange {
        /// The out-of-range index the delta referenced.
        index: u32,
        /// Number of blocks actually available in the basis.
        available: u64,
    },
}

/// Matches `source` against the basis signatures `sigs` (computed with block
/// size `block_size`) and returns the delta instruction sequence that
/// reconstructs `source`.
///
/// - Returns `[]` if `source` is empty.
/// - Returns a single `Literal` covering the whole of `source` if `sigs` is
///   empty or `block_size` is zero (no matching is attempted).
#[must_use]
pub fn delta(source: &[u8], sigs: &[Signature], block_size: u64) -> Vec<Instruction> {
    if source.is_empty() {
        return Vec::new();
    }
    if sigs.is_empty() || block_size == 0 {
        return vec![Instruction::literal(source.to_vec())];
    }

    let table = WeakHashIndex::build(sigs);
    let block_size = block_size as usize;
    let mut instructions = Vec::new();

    let mut pos = 0;
    while pos < source.len() {
        let block = &source[pos..];
        let block = if block.len() < block_size {
            instructions.push(Instruction::literal(block.to_vec()));
            break;
        } else {
            &block[..block_size]
        };

        match table.lookup(block) {
            Some(index) => instructions.push(Instruction::reference(index)),
            None => instructions.push(Instruction::literal(block.to_vec())),
        }
        pos += block_size;
    }

    instructions
}

/// Reconstructs a file from `basis` by walking `deltas`: each `Ref(i)` copies
/// `basis[i * bs .. i * bs + bs]` (fewer bytes if `i` is the basis's final,
/// short block) and each `Literal` is appended verbatim.
///
/// # Errors
///
/// Returns [`PatchError::RefOutOfRange`] if any `Ref` instruction names a
/// block index beyond the basis's length at block size `bs`.
pub fn patch(basis: &[u8], deltas: &[Instruction], block_size: u64) -> Result<Vec<u8>, PatchError> {
    let mut out = Vec::new();
    if block_size == 0 {
        for instr in deltas {
            if let Instruction::Literal { bytes } = instr {
                out.extend_from_slice(bytes);
            }
        }
        return Ok(out);
    }

    let bs = block_size as usize;
    let basis_blocks: u64 = if basis.is_empty() {
        0
    } else {
        basis.len().div_ceil(bs) as u64
    };

    for instr in deltas {
        match instr {
            Instruction::Ref { index } => {
                let index = *index;
                if u64::from(index) >= basis_blocks {
                    return Err(PatchError::RefOutOfRange {
                        index,
                        available: basis_blocks,
                    });
                }
                let start = index as usize * bs;
                let end = (start + bs).min(basis.len());
                out.extend_from_slice(&basis[start..end]);
            }
            Instruction::Literal { bytes } => out.extend_from_slice(bytes),
        }
    }
    Ok(out)
}

/// A weak-hash-indexed view over a basis signature list, used to find
/// candidate matches for a source block in O(1) average time.
struct WeakHashIndex {
    table: FxHashMap<u32, Vec<(StrongDigest, u32)>>,
}

impl WeakHashIndex {
    fn build(sigs: &[Signature]) -> Self {
        let mut table: FxHashMap<u32, Vec<(StrongDigest, u32)>> = FxHashMap::default();
        for (index, sig) in sigs.iter().enumerate() {
            table
                .entry(sig.weak)
                .or_default()
                .push((sig.strong, index as u32));
        }
        Self { table }
    }

    /// Looks up `block` against the index. Confirms a weak-hash hit with the
    /// strong hash and returns the lowest-index basis block whose digests
    /// both match, if any.
    fn lookup(&self, block: &[u8]) -> Option<u32> {
        let candidates = self.table.get(&weak(block))?;
        let block_strong = strong(block);
        candidates
            .iter()
            .find(|(s, _)| *s == block_strong)
            .map(|(_, idx)| *idx)
    }
}

impl fmt::Debug for WeakHashIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakHashIndex")
            .field("entries", &self.table.len())
            .finish()
    }
}
