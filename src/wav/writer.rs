//! Output WAV writer
//!
//! Builds the stereo 16-bit file the sampler listens to: the canonical
//! header with its two size fields patched, followed by the encoder's frames
//! in the order they were produced.

use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

use super::format::{HEADER_SIZE, HEADER_TEMPLATE, POS_DATA_SIZE, POS_RIFF_SIZE, RIFF_SIZE_BIAS};
use crate::encoder::{FrameStream, StereoFrame};
use crate::{Result, VolcaError};

/// Bytes per output frame (2 channels x 16 bits)
pub const BYTES_PER_FRAME: u32 = 4;

/// In-memory output WAV file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyroWav {
    bytes: Vec<u8>,
    frame_count: u32,
}

impl SyroWav {
    /// Allocate a file for `frame_count` frames and patch the header sizes
    ///
    /// Fails when the frame count does not fit a 32-bit RIFF size field.
    pub fn with_frame_count(frame_count: u32) -> Result<Self> {
        let (data_size, riff_size) = frame_count
            .checked_mul(BYTES_PER_FRAME)
            .and_then(|data| data.checked_add(RIFF_SIZE_BIAS).map(|riff| (data, riff)))
            .ok_or_else(|| {
                VolcaError::EncoderStartFailure(format!(
                    "{} frames do not fit in a WAV container",
                    frame_count
                ))
            })?;

        let mut bytes = Vec::with_capacity(HEADER_SIZE + data_size as usize);
        bytes.extend_from_slice(&HEADER_TEMPLATE);
        bytes[POS_RIFF_SIZE..POS_RIFF_SIZE + 4].copy_from_slice(&riff_size.to_le_bytes());
        bytes[POS_DATA_SIZE..POS_DATA_SIZE + 4].copy_from_slice(&data_size.to_le_bytes());

        Ok(Self { bytes, frame_count })
    }

    /// Drain `stream` into a new file, one frame per declared frame
    pub fn render<S: FrameStream + ?Sized>(stream: &mut S) -> Result<Self> {
        let mut remaining = stream.frame_count();
        let mut wav = Self::with_frame_count(remaining)?;

        while remaining > 0 {
            wav.push_frame(stream.next_frame());
            remaining -= 1;
        }

        Ok(wav)
    }

    /// Append one frame as little-endian left then right
    pub fn push_frame(&mut self, frame: StereoFrame) {
        self.bytes.extend_from_slice(&frame.left.to_le_bytes());
        self.bytes.extend_from_slice(&frame.right.to_le_bytes());
    }

    /// Frame count declared in the header
    pub fn frame_count(&self) -> u32 {
        self.frame_count
    }

    /// Complete file contents
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Write the file to `path`, replacing any existing file
    ///
    /// The bytes go to a temporary file in the destination directory which is
    /// then renamed over `path`, so readers never observe a partial file.
    pub fn write_to<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let write_failure = |source: std::io::Error| VolcaError::FileWriteFailure {
            path: path.to_path_buf(),
            source,
        };

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut temp_file = NamedTempFile::new_in(dir).map_err(write_failure)?;
        temp_file.write_all(&self.bytes).map_err(write_failure)?;
        temp_file.flush().map_err(write_failure)?;
        temp_file
            .persist(path)
            .map_err(|e| write_failure(e.error))?;

        tracing::debug!(path = %path.display(), bytes = self.bytes.len(), "wrote output WAV");
        Ok(())
    }
}
