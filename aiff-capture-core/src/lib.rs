//! # aiff-capture-core
//!
//! Platform-agnostic mono capture core.
//!
//! Streams 32-bit big-endian samples into an AIFF container whose size
//! fields are written as placeholders and patched once the recording ends.
//! Device backends implement the `AudioHost` / `InputStream` traits and plug
//! into the generic `Recorder`.
//!
//! ## Architecture
//!
//! ```text
//! aiff-capture-core (this crate)
//! ├── traits/       ← AudioHost, InputStream, StreamParameters
//! ├── models/       ← CaptureError, RecorderConfig, CoordinatorState, RecordingResult
//! ├── processing/   ← AIFF header layout + parser, RingBuffer
//! ├── session/      ← CaptureLoop, ShutdownCoordinator, Recorder
//! └── storage/      ← AiffWriter, metadata sidecar
//! ```
//!
//! ## Data flow
//!
//! ```text
//! [InputStream] → [frame buffer (64 × i32)] → [big-endian bytes] → [AiffWriter]
//! ```

pub mod models;
pub mod processing;
pub mod session;
pub mod storage;
pub mod traits;

// Re-export key types at crate root for convenience.
pub use models::config::{output_path_for, RecorderConfig};
pub use models::error::CaptureError;
pub use models::recording_result::{CaptureDiagnostics, RecordingResult};
pub use models::state::{CoordinatorState, StopReason};
pub use processing::aiff_format::AiffHeader;
pub use processing::ring_buffer::RingBuffer;
pub use session::capture_loop::{CaptureLoop, SampleCounter};
pub use session::coordinator::{spawn_line_watcher, ShutdownCoordinator, SignalFlag, StopTrigger};
pub use session::recorder::Recorder;
pub use storage::aiff_writer::AiffWriter;
pub use traits::device_stream::{AudioHost, InputStream, StreamParameters};
