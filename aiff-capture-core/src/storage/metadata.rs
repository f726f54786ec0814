use std::fs;
use std::path::{Path, PathBuf};

use crate::models::error::CaptureError;
use crate::models::recording_result::RecordingResult;

/// Path of the JSON sidecar for a recording: `take.aiff` → `take.metadata.json`.
pub fn metadata_path(recording_path: &Path) -> PathBuf {
    recording_path.with_extension("metadata.json")
}

/// Write a recording result as a JSON sidecar file.
pub fn write_metadata(result: &RecordingResult, recording_path: &Path) -> Result<PathBuf, CaptureError> {
    let path = metadata_path(recording_path);
    let json = serde_json::to_string_pretty(result)
        .map_err(|e| CaptureError::Storage(format!("failed to serialize metadata: {}", e)))?;
    fs::write(&path, json)
        .map_err(|e| CaptureError::Storage(format!("failed to write metadata: {}", e)))?;
    Ok(path)
}

/// Read a recording result back from its JSON sidecar file.
pub fn read_metadata(recording_path: &Path) -> Result<RecordingResult, CaptureError> {
    let json = fs::read_to_string(metadata_path(recording_path))
        .map_err(|e| CaptureError::Storage(format!("failed to read metadata: {}", e)))?;
    serde_json::from_str(&json)
        .map_err(|e| CaptureError::Storage(format!("failed to parse metadata: {}", e)))
}
