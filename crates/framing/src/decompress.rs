//! Gzip envelope

use std::io::{Read, Write};

use bytes::Bytes;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

use crate::FramingError;

/// Decompress a gzip stream
pub fn decompress(data: &[u8]) -> Result<Vec<u8>, FramingError> {
    let mut decoder = GzDecoder::new(data);
    let mut output = Vec::new();
    decoder
        .read_to_end(&mut output)
        .map_err(FramingError::Decompress)?;
    Ok(output)
}

/// Compress bytes into a gzip stream
pub fn compress(data: &[u8]) -> Result<Vec<u8>, FramingError> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).map_err(FramingError::Compress)?;
    encoder.finish().map_err(FramingError::Compress)
}

/// Apply the entry's compressed flag: decompress when set, pass through otherwise
pub fn decode_envelope(raw: &[u8], compressed: bool) -> Result<Bytes, FramingError> {
    if compressed {
        decompress(raw).map(Bytes::from)
    } else {
        Ok(Bytes::copy_from_slice(raw))
    }
}
