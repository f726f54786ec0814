use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::processing::aiff_format::FILE_EXTENSION;

/// Number of input channels captured. Fixed.
pub const CHANNELS: u16 = 1;

/// Capture sample rate in Hz. Fixed.
pub const SAMPLE_RATE: u32 = 44_100;

/// Bits per stored sample. Fixed.
pub const BITS_PER_SAMPLE: u16 = 32;

/// Samples per capture tick unless overridden.
pub const DEFAULT_FRAMES_PER_BUFFER: usize = 64;

/// Configuration for a recording session.
#[derive(Debug, Clone, PartialEq)]
pub struct RecorderConfig {
    /// Path of the AIFF file to create (truncated if it exists).
    pub output_path: PathBuf,

    /// Samples read from the device per tick (default: 64).
    pub frames_per_buffer: usize,

    /// Write a `.metadata.json` sidecar next to the recording.
    pub write_metadata: bool,

    /// How long a single blocking read may wait before reporting a read error.
    pub read_timeout: Duration,
}

impl RecorderConfig {
    pub fn new(output_path: impl Into<PathBuf>) -> Self {
        Self {
            output_path: output_path.into(),
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.frames_per_buffer == 0 {
            return Err("frames per buffer must be positive".into());
        }
        if self.output_path.as_os_str().is_empty() {
            return Err("output path is empty".into());
        }
        if self.read_timeout.is_zero() {
            return Err("read timeout must be positive".into());
        }
        Ok(())
    }
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            output_path: output_path_for(None),
            frames_per_buffer: DEFAULT_FRAMES_PER_BUFFER,
            write_metadata: false,
            read_timeout: Duration::from_secs(2),
        }
    }
}

/// Output file name for a recording.
///
/// `None` (or an empty name) yields `<unix-seconds>.aiff` in the working
/// directory; otherwise the extension is appended to the given base name.
pub fn output_path_for(base: Option<&str>) -> PathBuf {
    match base {
        Some(name) if !name.is_empty() => with_extension_appended(Path::new(name)),
        _ => PathBuf::from(format!("{}.{}", chrono::Utc::now().timestamp(), FILE_EXTENSION)),
    }
}

// Appends rather than replaces, so "take.1" becomes "take.1.aiff".
fn with_extension_appended(base: &Path) -> PathBuf {
    let mut name = base.as_os_str().to_os_string();
    name.push(".");
    name.push(FILE_EXTENSION);
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = RecorderConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.frames_per_buffer, 64);
        assert!(!config.write_metadata);
    }

    #[test]
    fn zero_frames_rejected() {
        let config = RecorderConfig {
            frames_per_buffer: 0,
            ..RecorderConfig::new("out.aiff")
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn user_base_name_gets_extension() {
        assert_eq!(output_path_for(Some("take")), PathBuf::from("take.aiff"));
        assert_eq!(output_path_for(Some("take.1")), PathBuf::from("take.1.aiff"));
        assert_eq!(
            output_path_for(Some("dir/session")),
            PathBuf::from("dir/session.aiff")
        );
    }

    #[test]
    fn default_name_is_unix_timestamp() {
        let before = chrono::Utc::now().timestamp();
        let path = output_path_for(None);
        let after = chrono::Utc::now().timestamp();

        let name = path.to_string_lossy().to_string();
        let stem = name.strip_suffix(".aiff").expect("missing extension");
        let ts: i64 = stem.parse().expect("stem is not a timestamp");
        assert!(ts >= before && ts <= after);
    }

    #[test]
    fn empty_base_name_falls_back_to_timestamp() {
        let name = output_path_for(Some("")).to_string_lossy().to_string();
        let stem = name.strip_suffix(".aiff").expect("missing extension");
        assert!(stem.parse::<i64>().is_ok());
    }
}
