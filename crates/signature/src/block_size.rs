//! Piecewise-constant block sizing policy.
//!
//! The number of signatures produced for a file is roughly
//! `file_len / block_size`; this table caps it at a few hundred even for
//! multi-gigabyte files, trading finer match granularity for bounded
//! metadata overhead and weak-hash table size.

const KIB: u64 = 1024;
const MIB: u64 = 1024 * KIB;
const GIB: u64 = 1024 * MIB;

const MINIMUM_BLOCK_THRESHOLD: u64 = 128 * KIB;

/// Block size substituted when the receiver needs one but has no basis file
/// to size against (the basis does not exist yet).
pub const MISSING_BASIS_BLOCK_SIZE: u64 = 128 * KIB;

/// Maps a file length to the block size the signature/delta/patch pipeline
/// should use for that file.
///
/// Returns `0` as a sentinel for files below [`MINIMUM_BLOCK_THRESHOLD`]
/// (128 KiB): such files always take the whole-file transfer path, bypassing
/// delta matching entirely, since delta overhead cannot pay off at that size.
#[must_use]
pub const fn block_size(file_len: u64) -> u64 {
    if file_len < MINIMUM_BLOCK_THRESHOLD {
        0
    } else if file_len < 16 * MIB {
        128 * KIB
    } else if file_len < 256 * MIB {
        MIB
    } else if file_len < 4 * GIB {
        16 * MIB
    } else if file_len < 64 * GIB {
        128 * MIB
    } else {
        GIB
    }
}

/// Reports whether a file of this length always takes the whole-file path
/// (i.e. `block_size(file_len) == 0`).
#[must_use]
pub const fn is_whole_file_only(file_len: u64) -> bool {
    file_len < MINIMUM_BLOCK_THRESHOLD
}
