//! AIFF container layout.
//!
//! Big-endian throughout. Three header fields are unknown while streaming
//! and are written as zero placeholders, then patched once the final sample
//! count is known.
//!
//! Layout:
//! ```text
//! [0-3]    "FORM"
//! [4-7]    total data bytes      (patched: 50 * samples)
//! [8-11]   "AIFF"
//! [12-15]  "COMM"
//! [16-19]  18 (common chunk size)
//! [20-21]  1 (channels)
//! [22-25]  sample count          (patched: samples)
//! [26-27]  32 (bits per sample)
//! [28-37]  80-bit extended sample rate (44100)
//! [38-41]  "SSND"
//! [42-45]  sound chunk size      (patched: 4 * samples + 8)
//! [46-49]  0 (offset)
//! [50-53]  0 (block size)
//! [54..]   big-endian i32 samples
//! ```

use crate::models::config::{BITS_PER_SAMPLE, CHANNELS};
use crate::models::error::CaptureError;

pub const FILE_EXTENSION: &str = "aiff";

pub const FORM_MARKER: &[u8; 4] = b"FORM";
pub const AIFF_MARKER: &[u8; 4] = b"AIFF";
pub const COMMON_MARKER: &[u8; 4] = b"COMM";
pub const SOUND_MARKER: &[u8; 4] = b"SSND";

pub const FORM_CHUNK_SIZE: usize = 12;
pub const COMMON_CHUNK_LEN: usize = 26;
pub const SOUND_CHUNK_HEADER_LEN: usize = 16;

/// Size of the full header preceding sample data.
pub const HEADER_SIZE: usize = FORM_CHUNK_SIZE + COMMON_CHUNK_LEN + SOUND_CHUNK_HEADER_LEN;

/// Declared size of the common chunk body.
pub const COMMON_CHUNK_SIZE: i32 = 18;

pub const TOTAL_BYTES_OFFSET: u64 = 4;
pub const SAMPLE_COUNT_OFFSET: u64 = 22;
pub const SOUND_CHUNK_SIZE_OFFSET: u64 = 42;

/// 44100 Hz as an 80-bit IEEE 754 extended float.
pub const SAMPLE_RATE_44100_EXTENDED: [u8; 10] = [0x40, 0x0e, 0xac, 0x44, 0, 0, 0, 0, 0, 0];

/// Bytes per stored sample.
pub const BYTES_PER_SAMPLE: usize = (BITS_PER_SAMPLE / 8) as usize;

/// The three values written over the header placeholders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatchValues {
    pub total_bytes: i32,
    pub sample_count: i32,
    pub sound_chunk_size: i32,
}

impl PatchValues {
    /// Values for a stream of `sample_count` samples.
    ///
    /// Each field is 32 bits wide; larger counts wrap like the on-disk
    /// two's-complement field would.
    pub fn for_samples(sample_count: u64) -> Self {
        Self {
            total_bytes: sample_count.wrapping_mul(50) as i32,
            sample_count: sample_count as i32,
            sound_chunk_size: sample_count.wrapping_mul(4).wrapping_add(8) as i32,
        }
    }
}

/// "FORM" chunk header with a zero total-bytes placeholder.
pub fn form_chunk() -> [u8; FORM_CHUNK_SIZE] {
    let mut chunk = [0u8; FORM_CHUNK_SIZE];
    chunk[0..4].copy_from_slice(FORM_MARKER);
    chunk[4..8].copy_from_slice(&0i32.to_be_bytes());
    chunk[8..12].copy_from_slice(AIFF_MARKER);
    chunk
}

/// "COMM" chunk with a zero sample-count placeholder.
pub fn common_chunk() -> [u8; COMMON_CHUNK_LEN] {
    let mut chunk = [0u8; COMMON_CHUNK_LEN];
    chunk[0..4].copy_from_slice(COMMON_MARKER);
    chunk[4..8].copy_from_slice(&COMMON_CHUNK_SIZE.to_be_bytes());
    chunk[8..10].copy_from_slice(&(CHANNELS as i16).to_be_bytes());
    chunk[10..14].copy_from_slice(&0i32.to_be_bytes());
    chunk[14..16].copy_from_slice(&(BITS_PER_SAMPLE as i16).to_be_bytes());
    chunk[16..26].copy_from_slice(&SAMPLE_RATE_44100_EXTENDED);
    chunk
}

/// "SSND" chunk header with a zero size placeholder, offset and block size.
pub fn sound_chunk_header() -> [u8; SOUND_CHUNK_HEADER_LEN] {
    let mut chunk = [0u8; SOUND_CHUNK_HEADER_LEN];
    chunk[0..4].copy_from_slice(SOUND_MARKER);
    chunk[4..8].copy_from_slice(&0i32.to_be_bytes());
    chunk[8..12].copy_from_slice(&0i32.to_be_bytes());
    chunk[12..16].copy_from_slice(&0i32.to_be_bytes());
    chunk
}

/// Serialize samples as consecutive big-endian i32 values.
pub fn encode_samples(samples: &[i32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(samples.len() * BYTES_PER_SAMPLE);
    for sample in samples {
        bytes.extend_from_slice(&sample.to_be_bytes());
    }
    bytes
}

/// Decode an 80-bit IEEE 754 extended float.
pub fn decode_extended(bytes: &[u8; 10]) -> f64 {
    let sign = if bytes[0] & 0x80 != 0 { -1.0 } else { 1.0 };
    let exponent = (((bytes[0] & 0x7f) as i32) << 8) | bytes[1] as i32;
    let mut mantissa_bytes = [0u8; 8];
    mantissa_bytes.copy_from_slice(&bytes[2..10]);
    let mantissa = u64::from_be_bytes(mantissa_bytes);

    if exponent == 0 && mantissa == 0 {
        return 0.0;
    }
    // bias 16383, explicit integer bit, 63 fraction bits
    sign * mantissa as f64 * 2f64.powi(exponent - 16383 - 63)
}

/// Header fields read back from a container written by this crate.
#[derive(Debug, Clone, PartialEq)]
pub struct AiffHeader {
    pub total_bytes: i32,
    pub channels: i16,
    pub sample_count: i32,
    pub bits_per_sample: i16,
    pub sample_rate: f64,
    pub sound_chunk_size: i32,
    pub sound_offset: i32,
    pub block_size: i32,
}

impl AiffHeader {
    /// Parse the fixed 54-byte header.
    pub fn parse(bytes: &[u8]) -> Result<Self, CaptureError> {
        if bytes.len() < HEADER_SIZE {
            return Err(CaptureError::InvalidHeader(format!(
                "expected at least {} bytes, got {}",
                HEADER_SIZE,
                bytes.len()
            )));
        }

        expect_marker(bytes, 0, FORM_MARKER)?;
        expect_marker(bytes, 8, AIFF_MARKER)?;
        expect_marker(bytes, 12, COMMON_MARKER)?;
        expect_marker(bytes, 38, SOUND_MARKER)?;

        let common_size = be_i32(bytes, 16);
        if common_size != COMMON_CHUNK_SIZE {
            return Err(CaptureError::InvalidHeader(format!(
                "unexpected common chunk size {}",
                common_size
            )));
        }

        let mut rate = [0u8; 10];
        rate.copy_from_slice(&bytes[28..38]);

        Ok(Self {
            total_bytes: be_i32(bytes, 4),
            channels: be_i16(bytes, 20),
            sample_count: be_i32(bytes, 22),
            bits_per_sample: be_i16(bytes, 26),
            sample_rate: decode_extended(&rate),
            sound_chunk_size: be_i32(bytes, 42),
            sound_offset: be_i32(bytes, 46),
            block_size: be_i32(bytes, 50),
        })
    }

    /// Whether the three patched fields agree with the sample count.
    pub fn is_consistent(&self) -> bool {
        let expected = PatchValues::for_samples(self.sample_count as u32 as u64);
        self.total_bytes == expected.total_bytes && self.sound_chunk_size == expected.sound_chunk_size
    }

    /// Whether this looks like an unfinalized header (placeholders still zero).
    pub fn is_placeholder(&self) -> bool {
        self.total_bytes == 0 && self.sample_count == 0 && self.sound_chunk_size == 0
    }

    /// Duration implied by the declared sample count.
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate <= 0.0 {
            return 0.0;
        }
        self.sample_count as u32 as f64 / self.sample_rate
    }
}

fn expect_marker(bytes: &[u8], offset: usize, marker: &[u8; 4]) -> Result<(), CaptureError> {
    if &bytes[offset..offset + 4] != marker {
        return Err(CaptureError::InvalidHeader(format!(
            "expected {:?} at offset {}",
            String::from_utf8_lossy(marker),
            offset
        )));
    }
    Ok(())
}

fn be_i32(bytes: &[u8], offset: usize) -> i32 {
    i32::from_be_bytes([bytes[offset], bytes[offset + 1], bytes[offset + 2], bytes[offset + 3]])
}

fn be_i16(bytes: &[u8], offset: usize) -> i16 {
    i16::from_be_bytes([bytes[offset], bytes[offset + 1]])
}
