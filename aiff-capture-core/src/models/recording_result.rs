use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::config::{BITS_PER_SAMPLE, CHANNELS, SAMPLE_RATE};
use super::state::StopReason;

/// Per-session capture counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureDiagnostics {
    pub ticks: u64,
    pub read_errors: u64,
    pub write_errors: u64,
}

/// Result returned once a session has been torn down.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingResult {
    pub file_path: PathBuf,
    pub sample_count: u64,
    pub duration_secs: f64,
    pub stop_reason: StopReason,
    pub checksum: String,
    pub created_at: String,
    pub channels: u16,
    pub sample_rate: u32,
    pub bits_per_sample: u16,
    pub diagnostics: CaptureDiagnostics,
}

impl RecordingResult {
    pub fn new(
        file_path: PathBuf,
        sample_count: u64,
        stop_reason: StopReason,
        checksum: String,
        diagnostics: CaptureDiagnostics,
    ) -> Self {
        Self {
            file_path,
            sample_count,
            duration_secs: duration_secs(sample_count),
            stop_reason,
            checksum,
            created_at: chrono::Utc::now().to_rfc3339(),
            channels: CHANNELS,
            sample_rate: SAMPLE_RATE,
            bits_per_sample: BITS_PER_SAMPLE,
            diagnostics,
        }
    }
}

/// Duration of `sample_count` mono samples at the fixed capture rate.
pub fn duration_secs(sample_count: u64) -> f64 {
    sample_count as f64 / SAMPLE_RATE as f64
}
