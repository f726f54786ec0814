use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Seek, SeekFrom, Write};
use std::path::Path;

use sha2::{Digest, Sha256};

use crate::models::error::CaptureError;
use crate::processing::aiff_format::{self, PatchValues};

/// Header offsets whose values are unknown until the stream ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingOffsets {
    pub total_bytes: u64,
    pub sample_count: u64,
    pub sound_chunk_size: u64,
}

impl PendingOffsets {
    fn from_header_start(start: u64) -> Self {
        Self {
            total_bytes: start + aiff_format::TOTAL_BYTES_OFFSET,
            sample_count: start + aiff_format::SAMPLE_COUNT_OFFSET,
            sound_chunk_size: start + aiff_format::SOUND_CHUNK_SIZE_OFFSET,
        }
    }
}

/// Streaming AIFF writer.
///
/// Writes the header with placeholder sizes, appends big-endian samples as
/// they arrive, then seeks back and patches the three size fields in
/// [`finalize`](Self::finalize).
///
/// ## Lifecycle
///
/// ```text
/// create/new → write_header → append_samples* → finalize → close
/// ```
///
/// If the writer is closed or dropped after the header was written but
/// before `finalize`, it patches the header using the samples it appended
/// itself, so the file never declares a zero length while holding data.
pub struct AiffWriter<W: Write + Seek> {
    sink: Option<W>,
    label: String,
    pending: Option<PendingOffsets>,
    samples_appended: u64,
    finalized: bool,
}

impl AiffWriter<BufWriter<File>> {
    /// Create (truncating) the output file.
    pub fn create(path: &Path) -> Result<Self, CaptureError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                CaptureError::CannotCreateFile(format!("{}: {}", parent.display(), e))
            })?;
        }

        let file = File::create(path)
            .map_err(|e| CaptureError::CannotCreateFile(format!("{}: {}", path.display(), e)))?;

        Ok(Self::new(BufWriter::new(file), path.display().to_string()))
    }
}

impl<W: Write + Seek> AiffWriter<W> {
    /// Wrap an already-open seekable sink. `label` names it in log output.
    pub fn new(sink: W, label: impl Into<String>) -> Self {
        Self {
            sink: Some(sink),
            label: label.into(),
            pending: None,
            samples_appended: 0,
            finalized: false,
        }
    }

    /// Write the form, common and sound chunk headers with zero placeholders.
    pub fn write_header(&mut self) -> Result<(), CaptureError> {
        if self.pending.is_some() {
            return Err(CaptureError::Storage("header already written".into()));
        }

        let start = self
            .sink_mut()?
            .stream_position()
            .map_err(|e| CaptureError::IoSeek(e.to_string()))?;
        self.write_chunk("form", &aiff_format::form_chunk())?;
        self.write_chunk("common", &aiff_format::common_chunk())?;
        self.write_chunk("sound", &aiff_format::sound_chunk_header())?;

        self.pending = Some(PendingOffsets::from_header_start(start));
        Ok(())
    }

    /// Append one frame block as big-endian i32 samples.
    pub fn append_samples(&mut self, samples: &[i32]) -> Result<(), CaptureError> {
        if self.pending.is_none() {
            return Err(CaptureError::Storage("header has not been written".into()));
        }

        let bytes = aiff_format::encode_samples(samples);
        self.sink_mut()?
            .write_all(&bytes)
            .map_err(|e| CaptureError::IoWrite(e.to_string()))?;
        self.samples_appended += samples.len() as u64;
        Ok(())
    }

    /// Patch the three size fields for `sample_count` samples.
    ///
    /// Every patch is attempted even if an earlier one fails; the first
    /// failure is returned after all attempts. The write cursor is left at
    /// the end of the stream.
    pub fn finalize(&mut self, sample_count: u64) -> Result<(), CaptureError> {
        let pending = self
            .pending
            .ok_or_else(|| CaptureError::Storage("header has not been written".into()))?;

        log::info!("filling in missing sizes for {}", self.label);

        let values = PatchValues::for_samples(sample_count);
        let patches = [
            ("total data bytes", pending.total_bytes, values.total_bytes),
            ("sample count", pending.sample_count, values.sample_count),
            ("sound chunk size", pending.sound_chunk_size, values.sound_chunk_size),
        ];

        let Some(sink) = self.sink.as_mut() else {
            return Err(CaptureError::Storage("sink already closed".into()));
        };
        let mut first_error = None;

        for (name, offset, value) in patches {
            if let Err(e) = patch_field(sink, offset, value) {
                log::error!("failed to patch {} at offset {}: {}", name, offset, e);
                first_error.get_or_insert(e);
            }
        }

        if let Err(e) = sink.seek(SeekFrom::End(0)) {
            log::error!("failed to restore write position: {}", e);
            first_error.get_or_insert(CaptureError::IoSeek(e.to_string()));
        }
        if let Err(e) = sink.flush() {
            log::error!("failed to flush {}: {}", self.label, e);
            first_error.get_or_insert(CaptureError::IoWrite(e.to_string()));
        }

        self.finalized = true;

        match first_error {
            None => {
                log::info!("successfully filled in missing sizes ({} samples)", sample_count);
                Ok(())
            }
            Some(e) => Err(e),
        }
    }

    /// Flush and release the sink.
    ///
    /// Finalizes with the appended sample count first if `finalize` never ran.
    pub fn close(mut self) -> Result<W, CaptureError> {
        self.finalize_if_pending();

        let mut sink = self
            .sink
            .take()
            .ok_or_else(|| CaptureError::Storage("sink already closed".into()))?;
        sink.flush().map_err(|e| CaptureError::IoWrite(e.to_string()))?;
        Ok(sink)
    }

    /// Samples successfully appended so far.
    pub fn samples_appended(&self) -> u64 {
        self.samples_appended
    }

    pub fn header_written(&self) -> bool {
        self.pending.is_some()
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    pub fn pending_offsets(&self) -> Option<PendingOffsets> {
        self.pending
    }

    fn finalize_if_pending(&mut self) {
        if self.pending.is_some() && !self.finalized && self.sink.is_some() {
            log::warn!(
                "{} was not finalized; patching with {} appended samples",
                self.label,
                self.samples_appended
            );
            // errors are already logged per field
            let _ = self.finalize(self.samples_appended);
        }
    }

    fn write_chunk(&mut self, name: &str, bytes: &[u8]) -> Result<(), CaptureError> {
        match self.sink_mut()?.write_all(bytes) {
            Ok(()) => {
                log::info!("successfully wrote {} chunk", name);
                Ok(())
            }
            Err(e) => {
                log::error!("failed to write {} chunk: {}", name, e);
                Err(CaptureError::HeaderWrite(format!("{} chunk: {}", name, e)))
            }
        }
    }

    fn sink_mut(&mut self) -> Result<&mut W, CaptureError> {
        self.sink
            .as_mut()
            .ok_or_else(|| CaptureError::Storage("sink already closed".into()))
    }
}

impl<W: Write + Seek> Drop for AiffWriter<W> {
    fn drop(&mut self) {
        self.finalize_if_pending();
    }
}

fn patch_field<W: Write + Seek>(sink: &mut W, offset: u64, value: i32) -> Result<(), CaptureError> {
    sink.seek(SeekFrom::Start(offset))
        .map_err(|e| CaptureError::IoSeek(e.to_string()))?;
    sink.write_all(&value.to_be_bytes())
        .map_err(|e| CaptureError::IoWrite(e.to_string()))
}

/// Compute SHA-256 hex digest of a file, streaming it through the hasher.
pub fn sha256_file(path: &Path) -> Result<String, CaptureError> {
    let file = File::open(path)
        .map_err(|e| CaptureError::Storage(format!("failed to open file for checksum: {}", e)))?;
    let mut hasher = Sha256::new();
    io::copy(&mut BufReader::new(file), &mut hasher)
        .map_err(|e| CaptureError::Storage(format!("failed to read file for checksum: {}", e)))?;
    Ok(hex_encode(&hasher.finalize()))
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
