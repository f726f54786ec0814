use thiserror::Error;

/// Errors that can occur while recording to an AIFF container.
///
/// Setup failures (`CannotCreateFile`, `HeaderWrite`, `DeviceInit`,
/// `StreamOpen`) abort the session. `Read` and append-time `IoWrite` are
/// reported per tick and capture continues.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("cannot create file: {0}")]
    CannotCreateFile(String),

    #[error("failed to write header: {0}")]
    HeaderWrite(String),

    #[error("write failed: {0}")]
    IoWrite(String),

    #[error("seek failed: {0}")]
    IoSeek(String),

    #[error("device initialization failed: {0}")]
    DeviceInit(String),

    #[error("failed to open stream: {0}")]
    StreamOpen(String),

    #[error("failed to start or stop stream: {0}")]
    StreamStartStop(String),

    #[error("read failed: {0}")]
    Read(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid header: {0}")]
    InvalidHeader(String),

    #[error("failed to register signal handler: {0}")]
    SignalRegistration(String),
}

impl CaptureError {
    /// Whether the error only affects a single capture tick.
    pub fn is_per_tick(&self) -> bool {
        matches!(self, Self::Read(_) | Self::IoWrite(_))
    }

    /// Whether the error means the session could not be set up at all.
    pub fn is_setup_failure(&self) -> bool {
        matches!(
            self,
            Self::CannotCreateFile(_)
                | Self::HeaderWrite(_)
                | Self::DeviceInit(_)
                | Self::StreamOpen(_)
                | Self::StreamStartStop(_)
                | Self::InvalidConfig(_)
                | Self::SignalRegistration(_)
        )
    }
}
