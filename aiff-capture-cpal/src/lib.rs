//! # aiff-capture-cpal
//!
//! Cross-platform input backend for aiff-capture, built on `cpal`.
//!
//! Provides:
//! - `CpalHost` / `CpalInputStream`: `AudioHost` and `InputStream` over the default input device
//! - `SampleQueue`: blocking fixed-size reads over callback-delivered audio
//! - `signals`: shutdown signal registration
//!
//! ## Usage
//! ```ignore
//! use aiff_capture_core::{Recorder, RecorderConfig, ShutdownCoordinator};
//! use aiff_capture_cpal::CpalHost;
//!
//! let recorder = Recorder::new(RecorderConfig::new("take.aiff"))?;
//! let mut coordinator = ShutdownCoordinator::new();
//! let result = recorder.run(&mut CpalHost::new(), &mut coordinator)?;
//! ```

pub mod cpal_input;
pub mod sample_queue;
pub mod signals;

pub use cpal_input::{CpalHost, CpalInputStream};
pub use sample_queue::SampleQueue;
