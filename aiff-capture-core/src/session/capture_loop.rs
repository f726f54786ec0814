use std::io::{Seek, Write};

use crate::models::recording_result::CaptureDiagnostics;
use crate::storage::aiff_writer::AiffWriter;
use crate::traits::device_stream::InputStream;

/// Running total of samples handed to the writer in one session.
///
/// Source of truth for the header patch values. Never reset mid-session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SampleCounter(u64);

impl SampleCounter {
    pub fn advance(&mut self, samples: usize) {
        self.0 += samples as u64;
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}

/// Sample count and counters produced by a finished capture loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CaptureTotals {
    pub sample_count: u64,
    pub diagnostics: CaptureDiagnostics,
}

/// Read-and-append cycle against a started input stream.
///
/// Owns the frame buffer and sample counter. Does not decide when to stop
/// and does not tear anything down.
pub struct CaptureLoop<'a, S: InputStream, W: Write + Seek> {
    stream: &'a mut S,
    writer: &'a mut AiffWriter<W>,
    buffer: Vec<i32>,
    counter: SampleCounter,
    diagnostics: CaptureDiagnostics,
}

impl<'a, S: InputStream, W: Write + Seek> CaptureLoop<'a, S, W> {
    pub fn new(stream: &'a mut S, writer: &'a mut AiffWriter<W>, frames_per_buffer: usize) -> Self {
        Self {
            stream,
            writer,
            buffer: vec![0; frames_per_buffer],
            counter: SampleCounter::default(),
            diagnostics: CaptureDiagnostics::default(),
        }
    }

    /// One capture tick: blocking read, append, count.
    ///
    /// Read and append failures are logged and counted; the buffer is still
    /// appended and counted after a failed read, so a read error leaves the
    /// previous block repeated in the file rather than a gap.
    pub fn tick(&mut self) {
        if let Err(e) = self.stream.read(&mut self.buffer) {
            log::error!("failed to read from audio stream: {}", e);
            self.diagnostics.read_errors += 1;
        }

        if let Err(e) = self.writer.append_samples(&self.buffer) {
            log::error!("failed to write audio data to file: {}", e);
            self.diagnostics.write_errors += 1;
        }

        self.counter.advance(self.buffer.len());
        self.diagnostics.ticks += 1;
        log::trace!("tick {} ({} samples)", self.diagnostics.ticks, self.counter.get());
    }

    pub fn sample_count(&self) -> u64 {
        self.counter.get()
    }

    pub fn totals(&self) -> CaptureTotals {
        CaptureTotals {
            sample_count: self.counter.get(),
            diagnostics: self.diagnostics,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::error::CaptureError;
    use std::collections::VecDeque;
    use std::io::Cursor;

    /// Stream replaying a fixed list of read results.
    struct ScriptedStream {
        reads: VecDeque<Result<i32, CaptureError>>,
    }

    impl InputStream for ScriptedStream {
        fn start(&mut self) -> Result<(), CaptureError> {
            Ok(())
        }

        fn read(&mut self, buffer: &mut [i32]) -> Result<(), CaptureError> {
            match self.reads.pop_front() {
                Some(Ok(value)) => {
                    buffer.fill(value);
                    Ok(())
                }
                Some(Err(e)) => Err(e),
                None => Err(CaptureError::Read("script exhausted".into())),
            }
        }

        fn stop(&mut self) -> Result<(), CaptureError> {
            Ok(())
        }

        fn close(&mut self) -> Result<(), CaptureError> {
            Ok(())
        }
    }

    fn header_writer() -> AiffWriter<Cursor<Vec<u8>>> {
        let mut writer = AiffWriter::new(Cursor::new(Vec::new()), "memory");
        writer.write_header().unwrap();
        writer
    }

    #[test]
    fn counter_advances_per_tick() {
        let mut stream = ScriptedStream {
            reads: VecDeque::from(vec![Ok(1), Ok(2), Ok(3)]),
        };
        let mut writer = header_writer();

        let totals = {
            let mut capture = CaptureLoop::new(&mut stream, &mut writer, 64);
            for _ in 0..3 {
                capture.tick();
            }
            capture.totals()
        };

        assert_eq!(totals.sample_count, 192);
        assert_eq!(totals.diagnostics.ticks, 3);
        assert_eq!(totals.diagnostics.read_errors, 0);
        assert_eq!(writer.samples_appended(), 192);
    }

    #[test]
    fn read_error_repeats_previous_block_and_still_counts() {
        let mut stream = ScriptedStream {
            reads: VecDeque::from(vec![
                Ok(11),
                Err(CaptureError::Read("input overflowed".into())),
                Ok(33),
            ]),
        };
        let mut writer = header_writer();

        let totals = {
            let mut capture = CaptureLoop::new(&mut stream, &mut writer, 4);
            for _ in 0..3 {
                capture.tick();
            }
            capture.totals()
        };
        assert_eq!(totals.sample_count, 12);
        assert_eq!(totals.diagnostics.read_errors, 1);

        writer.finalize(totals.sample_count).unwrap();
        let data = writer.close().unwrap().into_inner();
        let samples: Vec<i32> = data[54..]
            .chunks_exact(4)
            .map(|c| i32::from_be_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        assert_eq!(samples, vec![11, 11, 11, 11, 11, 11, 11, 11, 33, 33, 33, 33]);
    }

    #[test]
    fn append_error_is_counted_not_fatal() {
        let mut stream = ScriptedStream {
            reads: VecDeque::from(vec![Ok(1), Ok(2)]),
        };
        // no header: every append is rejected
        let mut writer = AiffWriter::new(Cursor::new(Vec::new()), "memory");

        let mut capture = CaptureLoop::new(&mut stream, &mut writer, 8);
        capture.tick();
        capture.tick();

        let totals = capture.totals();
        assert_eq!(totals.diagnostics.write_errors, 2);
        assert_eq!(totals.sample_count, 16);
    }
}
