use std::io::{Seek, Write};
use std::path::Path;

use crate::models::config::RecorderConfig;
use crate::models::error::CaptureError;
use crate::models::recording_result::RecordingResult;
use crate::models::state::StopReason;
use crate::session::capture_loop::{CaptureLoop, CaptureTotals};
use crate::session::coordinator::ShutdownCoordinator;
use crate::storage::aiff_writer::{sha256_file, AiffWriter};
use crate::storage::metadata::write_metadata;
use crate::traits::device_stream::{AudioHost, InputStream, StreamParameters};

/// One recording session: output file + device stream + sample counter.
///
/// Setup runs in acquisition order (file, header, host, stream, start);
/// teardown runs in reverse on every exit path, each step logged and
/// attempted independently:
///
/// ```text
/// stream stop → stream close → host terminate → header patch → file close
/// ```
///
/// A signal-triggered stop gets the same teardown as a clean stop.
pub struct Recorder {
    config: RecorderConfig,
}

impl Recorder {
    pub fn new(config: RecorderConfig) -> Result<Self, CaptureError> {
        config.validate().map_err(CaptureError::InvalidConfig)?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &RecorderConfig {
        &self.config
    }

    /// Record until `coordinator` observes a stop, then tear down.
    ///
    /// Setup failures are returned after already-acquired resources have been
    /// released. If the header was written it is always patched, even when
    /// the device never started.
    pub fn run<H: AudioHost>(
        &self,
        host: &mut H,
        coordinator: &mut ShutdownCoordinator,
    ) -> Result<RecordingResult, CaptureError> {
        let path = self.config.output_path.as_path();

        let mut writer = AiffWriter::create(path)
            .inspect_err(|e| log::error!("failed to create {}: {}", path.display(), e))?;
        log::info!("successfully created {}", path.display());

        if let Err(e) = writer.write_header() {
            let _ = close_writer(writer, path);
            return Err(e);
        }

        let capture = capture_with_device(host, &mut writer, coordinator, &self.config);
        let sample_count = capture
            .as_ref()
            .map(|(_, totals)| totals.sample_count)
            .unwrap_or_default();

        let finalized = writer.finalize(sample_count);
        let closed = close_writer(writer, path);
        coordinator.finish();

        let (stop_reason, totals) = capture?;
        finalized?;
        closed?;

        let checksum = sha256_file(path)?;
        let result = RecordingResult::new(
            path.to_path_buf(),
            totals.sample_count,
            stop_reason,
            checksum,
            totals.diagnostics,
        );
        log::info!(
            "recorded {} samples ({:.2}s) to {}",
            result.sample_count,
            result.duration_secs,
            path.display()
        );

        if self.config.write_metadata {
            let sidecar = write_metadata(&result, path)?;
            log::info!("successfully wrote {}", sidecar.display());
        }

        Ok(result)
    }
}

fn capture_with_device<H: AudioHost, W: Write + Seek>(
    host: &mut H,
    writer: &mut AiffWriter<W>,
    coordinator: &mut ShutdownCoordinator,
    config: &RecorderConfig,
) -> Result<(StopReason, CaptureTotals), CaptureError> {
    host.initialize()
        .inspect_err(|e| log::error!("failed to initialize audio host: {}", e))?;
    log::info!("successfully initialized audio host");
    let mut host = HostGuard { host };

    let params = StreamParameters::mono_capture(config.frames_per_buffer, config.read_timeout);
    let stream = host
        .host
        .open_default_stream(&params)
        .inspect_err(|e| log::error!("failed to open audio stream: {}", e))?;
    log::info!("successfully opened audio stream");
    let mut stream = StreamGuard {
        stream,
        started: false,
    };

    stream
        .stream
        .start()
        .inspect_err(|e| log::error!("failed to start audio stream: {}", e))?;
    stream.started = true;
    log::info!("successfully started capturing audio");

    let mut capture = CaptureLoop::new(&mut stream.stream, writer, config.frames_per_buffer);
    let reason = coordinator.run(|| capture.tick());
    Ok((reason, capture.totals()))
}

fn close_writer<W: Write + Seek>(writer: AiffWriter<W>, path: &Path) -> Result<(), CaptureError> {
    log::info!("closing {}", path.display());
    match writer.close() {
        Ok(_) => {
            log::info!("successfully closed {}", path.display());
            Ok(())
        }
        Err(e) => {
            log::error!("failed to close {}: {}", path.display(), e);
            Err(e)
        }
    }
}

/// Terminates the audio host when dropped.
struct HostGuard<'h, H: AudioHost> {
    host: &'h mut H,
}

impl<H: AudioHost> Drop for HostGuard<'_, H> {
    fn drop(&mut self) {
        log::info!("terminating audio host");
        match self.host.terminate() {
            Ok(()) => log::info!("successfully terminated audio host"),
            Err(e) => log::error!("failed to terminate audio host: {}", e),
        }
    }
}

/// Stops (if started) and closes the stream when dropped.
struct StreamGuard<S: InputStream> {
    stream: S,
    started: bool,
}

impl<S: InputStream> Drop for StreamGuard<S> {
    fn drop(&mut self) {
        if self.started {
            log::info!("stopping audio stream");
            match self.stream.stop() {
                Ok(()) => log::info!("successfully stopped audio stream"),
                Err(e) => log::error!("failed to stop audio stream: {}", e),
            }
        }

        log::info!("closing audio stream");
        match self.stream.close() {
            Ok(()) => log::info!("successfully closed audio stream"),
            Err(e) => log::error!("failed to close audio stream: {}", e),
        }
    }
}
