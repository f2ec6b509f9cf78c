//! Packet compression.
//!
//! Serialized packets are gzipped before encryption so more of them fit in a
//! single 245-byte block. Decompression is bounded: a peer cannot make us
//! inflate an envelope into more than `limit` bytes.

use std::io::{Read, Write};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompressionError {
    #[error("compression failed: {0}")]
    CompressionFailed(std::io::Error),

    #[error("decompression failed: {0}")]
    DecompressionFailed(std::io::Error),

    #[error("decompressed payload exceeds {0} bytes")]
    TooLarge(usize),
}

/// Gzip `data` at the best compression level.
pub fn compress(data: &[u8]) -> Result<Vec<u8>, CompressionError> {
    let mut encoder = GzEncoder::new(Vec::with_capacity(data.len() / 2 + 32), Compression::best());
    encoder
        .write_all(data)
        .map_err(CompressionError::CompressionFailed)?;
    encoder.finish().map_err(CompressionError::CompressionFailed)
}

/// Gunzip `data`, refusing to produce more than `limit` bytes.
pub fn decompress(data: &[u8], limit: usize) -> Result<Vec<u8>, CompressionError> {
    let mut decoder = GzDecoder::new(data).take((limit as u64).saturating_add(1));
    let mut out = Vec::new();
    decoder
        .read_to_end(&mut out)
        .map_err(CompressionError::DecompressionFailed)?;
    if out.len() > limit {
        return Err(CompressionError::TooLarge(limit));
    }
    Ok(out)
}
