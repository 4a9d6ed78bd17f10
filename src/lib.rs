//! Sample preparation for the Korg Volca Sample
//!
//! Turns WAV files and slot selections into the typed records consumed by a
//! Syro stream encoder, and renders the encoder's output into a stereo WAV
//! that can be played into the sampler's sync input.
//!
//! # Pipeline
//! - `wav`: RIFF/WAVE container parsing and the output WAV writer
//! - `pcm`: down-conversion of 16/24-bit mono/stereo PCM to mono 16-bit
//! - `slots`: slot indices, erase/load records, selection grammar and the 100-slot table
//! - `loader`: reads sample files from disk into normalized samples
//! - `encoder`: the Syro encoder seam (preview renderer, optional Korg SDK binding)
//! - `pipeline`: batch → frame stream → WAV buffer → disk
//! - `cli`: argument model and the three front-ends
//!
//! # Quick start
//! ```no_run
//! use volcamatic::encoder::PreviewEncoder;
//! use volcamatic::pipeline::{render_batch, PipelineConfig};
//! use volcamatic::slots::{SlotIndex, SlotTable};
//!
//! # fn main() -> volcamatic::Result<()> {
//! let mut table = SlotTable::new();
//! table.mark_erase(SlotIndex::new(12)?)?;
//! let wav = render_batch(&mut PreviewEncoder::new(), table.into_records(), &PipelineConfig::default())?;
//! wav.write_to("syro.wav")?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod cli;
pub mod encoder; // Syro encoder seam
pub mod loader; // Sample file loading
pub mod pcm; // PCM normalization
pub mod pipeline; // Stream rendering
pub mod slots; // Slot table
pub mod wav; // WAV container I/O

use std::path::PathBuf;

use slots::SlotIndex;

/// Error types for sample preparation and stream rendering
#[derive(thiserror::Error, Debug)]
pub enum VolcaError {
    /// Buffer is not larger than the canonical 44-byte header
    #[error("header too small ({len} bytes)")]
    HeaderTooSmall {
        /// Size of the rejected buffer
        len: usize,
    },

    /// File does not start with `RIFF`
    #[error("missing 'RIFF' header")]
    MissingRiff,

    /// `WAVE` form type or `fmt ` chunk id not where expected
    #[error("missing 'WAVE' or 'fmt ' header")]
    MissingWaveFmt,

    /// Format tag other than integer PCM
    #[error("bad encoding tag: {0} (only integer PCM is supported)")]
    UnsupportedEncoding(u16),

    /// Channel count other than 1 or 2
    #[error("too many channels: {0} (max=2)")]
    UnsupportedChannelCount(u16),

    /// Bit depth other than 16 or 24
    #[error("invalid bit depth: {0} (supported: 16,24)")]
    UnsupportedBitDepth(u16),

    /// Chunk walk ran off the buffer before a `data` chunk
    #[error("missing 'data' header")]
    MissingDataChunk,

    /// `data` chunk holds no complete frame
    #[error("empty payload")]
    EmptyPayload,

    /// `data` chunk declares more bytes than the buffer holds
    #[error("payload size mismatch ({declared} bytes declared, {available} available)")]
    PayloadSizeMismatch {
        /// Size declared by the chunk header
        declared: u32,
        /// Bytes actually present after the chunk header
        available: usize,
    },

    /// Slot number outside 0..=99
    #[error("sample number {0} is out of range (0-99)")]
    InvalidSlotIndex(i64),

    /// Argument that does not match the expected grammar
    #[error("invalid input: {0}")]
    InvalidArgumentSyntax(String),

    /// Input file could not be read
    #[error("file not found: {}", path.display())]
    FileNotFound {
        /// Path that was requested
        path: PathBuf,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },

    /// Encoder refused the batch
    #[error("error starting conversion: {0}")]
    EncoderStartFailure(String),

    /// Output file could not be written
    #[error("error writing file {}: {source}", path.display())]
    FileWriteFailure {
        /// Destination path
        path: PathBuf,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },

    /// Slot claimed twice while running in strict mode
    #[error("slot {0} is already claimed by an earlier argument")]
    SlotConflict(SlotIndex),

    /// Nothing was selected for the batch
    #[error("nothing to do: no valid slot selections")]
    NothingToDo,
}

/// Result type for sample preparation operations
pub type Result<T> = std::result::Result<T, VolcaError>;

// Public API exports
pub use encoder::{EncodeOptions, FrameStream, PreviewEncoder, StereoFrame, StreamEncoder};
pub use loader::{load_sample, LoadOutcome, LoadReport};
pub use pcm::{normalize, NormalizedSample};
pub use pipeline::{render_batch, BatchSummary, PipelineConfig, PreparedBatch};
pub use slots::{SampleEncoding, SlotRecord, SlotTable};
pub use wav::{parse_wav, AudioFormat, RawAudioChunk, SyroWav};
