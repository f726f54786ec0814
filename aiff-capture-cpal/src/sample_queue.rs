//! Blocking hand-off between the cpal callback thread and the capture loop.

use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use aiff_capture_core::models::error::CaptureError;
use aiff_capture_core::processing::ring_buffer::RingBuffer;

/// Ring buffer filled by the device callback and drained in fixed-size
/// blocks by [`read_exact`](Self::read_exact).
pub struct SampleQueue {
    buffer: Mutex<RingBuffer>,
    ready: Condvar,
    device_error: Mutex<Option<String>>,
}

impl SampleQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: Mutex::new(RingBuffer::new(capacity)),
            ready: Condvar::new(),
            device_error: Mutex::new(None),
        }
    }

    /// Called from the audio thread.
    pub fn push(&self, samples: &[i32]) {
        self.buffer.lock().write(samples);
        self.ready.notify_one();
    }

    /// Called from the audio thread. Pushes under a single lock without
    /// collecting `samples` first.
    pub fn push_iter<I>(&self, samples: I)
    where
        I: IntoIterator<Item = i32>,
    {
        {
            let mut buffer = self.buffer.lock();
            for sample in samples {
                buffer.push(sample);
            }
        }
        self.ready.notify_one();
    }

    pub fn capacity(&self) -> usize {
        self.buffer.lock().capacity()
    }

    /// Record a device error; surfaced by the next read.
    pub fn report_error(&self, message: String) {
        *self.device_error.lock() = Some(message);
        self.ready.notify_one();
    }

    /// Block until `out.len()` samples are queued, then move them into `out`.
    ///
    /// Returns a `Read` error on timeout, on a pending device error, or if
    /// samples were dropped since the previous read. In the last two cases
    /// `out` has still been filled. A block larger than the queue can never
    /// be satisfied and fails immediately.
    pub fn read_exact(&self, out: &mut [i32], timeout: Duration) -> Result<(), CaptureError> {
        let deadline = Instant::now() + timeout;
        let mut buffer = self.buffer.lock();

        if out.len() > buffer.capacity() {
            return Err(CaptureError::Read(format!(
                "block of {} samples exceeds queue capacity {}",
                out.len(),
                buffer.capacity()
            )));
        }

        while buffer.count() < out.len() {
            if self.ready.wait_until(&mut buffer, deadline).timed_out() && buffer.count() < out.len() {
                return Err(CaptureError::Read(format!(
                    "timed out after {:?} waiting for {} samples",
                    timeout,
                    out.len()
                )));
            }
        }

        buffer.read_into(out);
        let dropped = buffer.take_dropped();
        drop(buffer);

        if let Some(message) = self.device_error.lock().take() {
            return Err(CaptureError::Read(message));
        }
        if dropped > 0 {
            return Err(CaptureError::Read(format!(
                "input overflowed, {} samples dropped",
                dropped
            )));
        }
        Ok(())
    }

    /// Discard queued samples and any pending error.
    pub fn clear(&self) {
        self.buffer.lock().reset();
        self.device_error.lock().take();
    }
}
