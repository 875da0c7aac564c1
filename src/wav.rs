//! Clip length of engine-produced WAV files
//!
//! The engine always emits 16-bit mono PCM with the canonical 44-byte header,
//! so the duration is read straight from two fixed header fields. The RIFF
//! structure is not otherwise validated.

use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;

/// Byte offset of the sample rate field
const SAMPLE_RATE_OFFSET: u64 = 24;

/// Byte offset of the data chunk size field
const DATA_SIZE_OFFSET: u64 = 40;

/// Bytes per sample frame (16-bit mono)
const BYTES_PER_FRAME: f64 = 2.0;

/// Duration in seconds of the WAV file at `path`
///
/// # Errors
///
/// Returns an IO error if the file cannot be opened or is too short to hold
/// both fields, or if the sample rate is zero
pub fn duration(path: impl AsRef<Path>) -> io::Result<f64> {
    let mut file = std::fs::File::open(path)?;
    duration_from_reader(&mut file)
}

/// Duration in seconds of the WAV data readable from `reader`
///
/// # Errors
///
/// See [`duration`]
pub fn duration_from_reader<R: Read + Seek>(reader: &mut R) -> io::Result<f64> {
    let sample_rate = read_u32_at(reader, SAMPLE_RATE_OFFSET)?;
    let data_size = read_u32_at(reader, DATA_SIZE_OFFSET)?;

    if sample_rate == 0 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "wav header has a zero sample rate",
        ));
    }

    Ok(f64::from(data_size) / (f64::from(sample_rate) * BYTES_PER_FRAME))
}

fn read_u32_at<R: Read + Seek>(reader: &mut R, offset: u64) -> io::Result<u32> {
    let mut field = [0u8; 4];
    reader.seek(SeekFrom::Start(offset))?;
    reader.read_exact(&mut field)?;
    Ok(u32::from_le_bytes(field))
}
