//! cpal input backend.
//!
//! Opens the default input device at 44100 Hz and delivers mono i32 frame
//! blocks through a blocking [`SampleQueue`]. Multi-channel devices are
//! reduced to their first channel; f32/i16/u16/i32 device formats are
//! converted to i32.

use std::sync::Arc;
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{BufferSize, FromSample, SampleFormat, SampleRate, SizedSample, StreamConfig, SupportedStreamConfig};

use aiff_capture_core::models::error::CaptureError;
use aiff_capture_core::traits::device_stream::{AudioHost, InputStream, StreamParameters};

use crate::sample_queue::SampleQueue;

/// Seconds of audio the queue holds before dropping the oldest samples.
const QUEUE_SECONDS: usize = 2;

/// Minimum number of read blocks the queue can hold.
const QUEUE_MIN_BLOCKS: usize = 4;

fn queue_capacity(params: &StreamParameters) -> usize {
    let by_time = params.sample_rate as usize * QUEUE_SECONDS;
    let by_blocks = params.frames_per_buffer.saturating_mul(QUEUE_MIN_BLOCKS);
    by_time.max(by_blocks)
}

/// Audio host backed by the platform's default cpal host.
pub struct CpalHost {
    host: Option<cpal::Host>,
}

impl CpalHost {
    pub fn new() -> Self {
        Self { host: None }
    }
}

impl Default for CpalHost {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioHost for CpalHost {
    type Stream = CpalInputStream;

    fn initialize(&mut self) -> Result<(), CaptureError> {
        let host = cpal::default_host();
        log::debug!("using audio host {:?}", host.id());
        self.host = Some(host);
        Ok(())
    }

    fn open_default_stream(&mut self, params: &StreamParameters) -> Result<CpalInputStream, CaptureError> {
        if params.channels_in != 1 || params.channels_out != 0 {
            return Err(CaptureError::StreamOpen(format!(
                "unsupported channel layout: {} in, {} out",
                params.channels_in, params.channels_out
            )));
        }

        let host = self
            .host
            .as_ref()
            .ok_or_else(|| CaptureError::DeviceInit("audio host not initialized".into()))?;
        let device = host
            .default_input_device()
            .ok_or_else(|| CaptureError::StreamOpen("no default input device".into()))?;
        let device_name = device.name().unwrap_or_else(|_| "unknown device".into());

        let supported = select_config(&device, params.sample_rate)?;
        let config = StreamConfig {
            channels: supported.channels(),
            sample_rate: SampleRate(params.sample_rate),
            buffer_size: BufferSize::Default,
        };
        log::info!(
            "opening {} ({} ch, {:?}, {} Hz)",
            device_name,
            config.channels,
            supported.sample_format(),
            params.sample_rate
        );

        let queue = Arc::new(SampleQueue::new(queue_capacity(params)));
        let stream = match supported.sample_format() {
            SampleFormat::I32 => build_stream::<i32>(&device, &config, &queue),
            SampleFormat::F32 => build_stream::<f32>(&device, &config, &queue),
            SampleFormat::I16 => build_stream::<i16>(&device, &config, &queue),
            SampleFormat::U16 => build_stream::<u16>(&device, &config, &queue),
            other => {
                return Err(CaptureError::StreamOpen(format!(
                    "unsupported sample format {:?}",
                    other
                )))
            }
        }?;

        Ok(CpalInputStream {
            stream: Some(stream),
            queue,
            read_timeout: params.read_timeout,
            device_name,
        })
    }

    fn terminate(&mut self) -> Result<(), CaptureError> {
        self.host = None;
        Ok(())
    }
}

/// A running (or paused) cpal input stream.
pub struct CpalInputStream {
    stream: Option<cpal::Stream>,
    queue: Arc<SampleQueue>,
    read_timeout: Duration,
    device_name: String,
}

impl CpalInputStream {
    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    fn stream(&self) -> Result<&cpal::Stream, CaptureError> {
        self.stream
            .as_ref()
            .ok_or_else(|| CaptureError::StreamStartStop("stream is closed".into()))
    }
}

impl InputStream for CpalInputStream {
    fn start(&mut self) -> Result<(), CaptureError> {
        self.queue.clear();
        self.stream()?
            .play()
            .map_err(|e| CaptureError::StreamStartStop(format!("play failed: {}", e)))
    }

    fn read(&mut self, buffer: &mut [i32]) -> Result<(), CaptureError> {
        self.queue.read_exact(buffer, self.read_timeout)
    }

    fn stop(&mut self) -> Result<(), CaptureError> {
        self.stream()?
            .pause()
            .map_err(|e| CaptureError::StreamStartStop(format!("pause failed: {}", e)))
    }

    fn close(&mut self) -> Result<(), CaptureError> {
        // dropping the stream releases the device
        self.stream.take();
        Ok(())
    }
}

/// Pick a supported input configuration at `sample_rate`, preferring mono
/// and then the least lossy integer/float format.
fn select_config(device: &cpal::Device, sample_rate: u32) -> Result<SupportedStreamConfig, CaptureError> {
    let ranges = device
        .supported_input_configs()
        .map_err(|e| CaptureError::StreamOpen(format!("failed to query input configs: {}", e)))?;

    ranges
        .filter(|r| r.channels() >= 1)
        .filter(|r| r.min_sample_rate().0 <= sample_rate && sample_rate <= r.max_sample_rate().0)
        .filter_map(|r| format_rank(r.sample_format()).map(|rank| (r.channels() != 1, rank, r)))
        .min_by_key(|(not_mono, rank, _)| (*not_mono, *rank))
        .map(|(_, _, r)| r.with_sample_rate(SampleRate(sample_rate)))
        .ok_or_else(|| {
            CaptureError::StreamOpen(format!("no input configuration supports {} Hz", sample_rate))
        })
}

fn format_rank(format: SampleFormat) -> Option<u8> {
    match format {
        SampleFormat::I32 => Some(0),
        SampleFormat::F32 => Some(1),
        SampleFormat::I16 => Some(2),
        SampleFormat::U16 => Some(3),
        _ => None,
    }
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &StreamConfig,
    queue: &Arc<SampleQueue>,
) -> Result<cpal::Stream, CaptureError>
where
    T: SizedSample,
    i32: FromSample<T>,
{
    let channels = config.channels as usize;
    let data_queue = Arc::clone(queue);
    let error_queue = Arc::clone(queue);

    device
        .build_input_stream(
            config,
            move |data: &[T], _: &cpal::InputCallbackInfo| {
                let mono = data
                    .chunks_exact(channels)
                    .map(|frame| i32::from_sample_(frame[0]));
                data_queue.push_iter(mono);
            },
            move |err| {
                log::error!("audio stream error: {}", err);
                error_queue.report_error(err.to_string());
            },
            None,
        )
        .map_err(|e| CaptureError::StreamOpen(format!("failed to build input stream: {}", e)))
}
