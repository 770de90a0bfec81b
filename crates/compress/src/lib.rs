#![deny(unsafe_code)]
#![deny(missing_docs)]

//! # Overview
//!
//! Zstandard compression for individual message payloads on the blocksync
//! wire (see the `protocol` crate's framed-message codec). Compression is a
//! per-message property, never negotiated at the session level: either side
//! may compress a given message and the other always decodes based on the
//! message's own flag bit.
//!
//! [`Codec`] keeps a single, reusable compression level around (the design
//! requirement this crate leans on: "reusable, thread-safe codec contexts
//! with a chosen compression level"); it holds no mutable state of its own
//! and is `Clone + Copy`, so callers own one per transport or per session as
//! convenient rather than sharing global state.

use std::io::{self, Write as _};

/// Threshold at or below which a payload is never compressed, even if the
/// caller opts in: compressing a handful of bytes. Zstd's frame overhead
/// would make the "compressed" output larger than the original.
pub const MIN_COMPRESS_LEN: usize = 512;

/// Errors produced while compressing or decompressing a payload.
#[derive(Debug, thiserror::Error)]
pub enum CompressError {
    /// The underlying zstd stream failed to encode or decode.
    #[error("zstd {operation} failed: {source}")]
    Zstd {
        /// `"compression"` or `"decompression"`, for error messages.
        operation: &'static str,
        /// The underlying I/O error from the zstd crate.
        #[source]
        source: io::Error,
    },
}

/// A reusable zstd compression context at a fixed level.
#[derive(Clone, Copy, Debug)]
pub struct Codec {
    level: i32,
}

impl Default for Codec {
    fn default() -> Self {
        Self::new(DEFAULT_LEVEL)
    }
}

/// Default zstd compression level: a middle ground between ratio and speed,
/// matching zstd's own recommended default.
pub const DEFAULT_LEVEL: i32 = 3;

impl Codec {
    /// Creates a codec at the given zstd compression level.
    #[must_use]
    pub const fn new(level: i32) -> Self {
        Self { level }
    }

    /// Compresses `data` unconditionally.
    ///
    /// Callers that want the size-gating behavior described in the wire
    /// protocol (only compress when the caller opts in *and* the payload
    /// exceeds [`MIN_COMPRESS_LEN`]) should check that before calling this.
    pub fn compress(&self, data: &[u8]) -> Result<Vec<u8>, CompressError> {
        zstd::stream::encode_all(data, self.level).map_err(|source| CompressError::Zstd {
            operation: "compression",
            source,
        })
    }

    /// Decompresses a zstd frame produced by [`Self::compress`].
    pub fn decompress(&self, data: &[u8]) -> Result<Vec<u8>, CompressError> {
        decompress(data)
    }

    /// Compresses `data` only if it is strictly larger than
    /// [`MIN_COMPRESS_LEN`] bytes, returning `None` when the caller should
    /// send the payload uncompressed.
    pub fn compress_if_worthwhile(&self, data: &[u8]) -> Result<Option<Vec<u8>>, CompressError> {
        if data.len() <= MIN_COMPRESS_LEN {
            return Ok(None);
        }
        self.compress(data).map(Some)
    }

    /// Writes zstd-compressed output to a `Write` sink, useful for streaming
    /// large literal payloads without materializing the compressed form.
    pub fn compress_into(&self, data: &[u8], sink: impl io::Write) -> Result<(), CompressError> {
        let mut encoder =
            zstd::stream::Encoder::new(sink, self.level).map_err(|source| CompressError::Zstd {
                operation: "compression",
                source,
            })?;
        encoder.write_all(data).map_err(|source| CompressError::Zstd {
            operation: "compression",
            source,
        })?;
        encoder.finish().map_err(|source| CompressError::Zstd {
            operation: "compression",
            source,
        })?;
        Ok(())
    }
}

/// Decompresses a zstd frame independent of the level it was produced at
/// (zstd frames are self-describing).
pub fn decompress(data: &[u8]) -> Result<Vec<u8>, CompressError> {
    zstd::stream::decode_all(data).map_err(|source| CompressError::Zstd {
        operation: "decompression",
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_preserves_payload() {
        let codec = Codec::default();
        let data = b"a".repeat(10_000);
        let compressed = codec.compress(&data).unwrap();
        assert_eq!(codec.decompress(&compressed).unwrap(), data);
    }

    #[test]
    fn compression_shrinks_repetitive_data() {
        let codec = Codec::default();
        let data = b"a".repeat(10_000);
        let compressed = codec.compress(&data).unwrap();
        assert!(compressed.len() < data.len());
    }

    #[test]
    fn decompress_rejects_garbage() {
        let err = decompress(b"not a zstd frame");
        assert!(err.is_err());
    }

    #[test]
    fn compress_if_worthwhile_skips_small_payloads() {
        let codec = Codec::default();
        assert!(codec.compress_if_worthwhile(b"short").unwrap().is_none());
    }

    #[test]
    fn compress_if_worthwhile_compresses_large_payloads() {
        let codec = Codec::default();
        let data = b"x".repeat(MIN_COMPRESS_LEN + 1);
        assert!(codec.compress_if_worthwhile(&data).unwrap().is_some());
    }

    #[test]
    fn compress_if_worthwhile_skips_payload_at_exact_threshold() {
        let codec = Codec::default();
        let data = b"x".repeat(MIN_COMPRESS_LEN);
        assert!(codec.compress_if_worthwhile(&data).unwrap().is_none());
    }

    #[test]
    fn compress_into_matches_compress() {
        let codec = Codec::default();
        let data = b"stream me".repeat(200);
        let mut buf = Vec::new();
        codec.compress_into(&data, &mut buf).unwrap();
        assert_eq!(codec.decompress(&buf).unwrap(), data);
    }
}
