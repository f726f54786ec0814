use std::time::Duration;

use crate::models::config::{CHANNELS, SAMPLE_RATE};
use crate::models::error::CaptureError;

/// Parameters for opening the default input stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamParameters {
    pub channels_in: u16,
    pub channels_out: u16,
    pub sample_rate: u32,
    pub frames_per_buffer: usize,
    /// Upper bound on a single blocking `read`.
    pub read_timeout: Duration,
}

impl StreamParameters {
    /// Mono capture at the fixed rate, no output channels.
    pub fn mono_capture(frames_per_buffer: usize, read_timeout: Duration) -> Self {
        Self {
            channels_in: CHANNELS,
            channels_out: 0,
            sample_rate: SAMPLE_RATE,
            frames_per_buffer,
            read_timeout,
        }
    }
}

/// Audio library handle that owns device access for one session.
///
/// Implemented by:
/// - `CpalHost` (aiff-capture-cpal)
/// - scripted fakes in tests
pub trait AudioHost {
    type Stream: InputStream;

    /// Bring up the audio library. Must succeed before any stream is opened.
    fn initialize(&mut self) -> Result<(), CaptureError>;

    /// Open the default input device with the given parameters.
    fn open_default_stream(&mut self, params: &StreamParameters) -> Result<Self::Stream, CaptureError>;

    /// Release the audio library. Called once, after every stream is closed.
    fn terminate(&mut self) -> Result<(), CaptureError>;
}

/// A blocking input stream delivering fixed-size frame blocks.
pub trait InputStream {
    fn start(&mut self) -> Result<(), CaptureError>;

    /// Block until `buffer.len()` samples are available and copy them in.
    ///
    /// On error the buffer contents are unspecified.
    fn read(&mut self, buffer: &mut [i32]) -> Result<(), CaptureError>;

    fn stop(&mut self) -> Result<(), CaptureError>;

    fn close(&mut self) -> Result<(), CaptureError>;
}
