//! Syro Encoder Domain
//!
//! The encoder turns a batch of slot records into the stereo frame stream
//! the sampler decodes. Starting an encoder consumes the batch; the returned
//! stream owns it until dropped, and dropping the stream ends the encoder
//! session (releasing the sample buffers with it).

#[cfg(feature = "korg-sdk")]
pub mod korg;
pub mod preview;

#[cfg(feature = "korg-sdk")]
pub use korg::KorgSyroEncoder;
pub use preview::PreviewEncoder;

use crate::slots::SlotRecord;
use crate::Result;

/// One output frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StereoFrame {
    /// Left channel sample
    pub left: i16,
    /// Right channel sample
    pub right: i16,
}

impl StereoFrame {
    /// Same sample on both channels
    pub fn centered(sample: i16) -> Self {
        Self {
            left: sample,
            right: sample,
        }
    }
}

/// Options forwarded to the encoder's start call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EncodeOptions {
    /// Raw start flags; the Korg encoder defines none, so this stays 0
    pub flags: u32,
}

impl EncodeOptions {
    /// Set raw start flags
    pub fn flags(mut self, flags: u32) -> Self {
        self.flags = flags;
        self
    }
}

/// A started encoder session
///
/// `next_frame` is called exactly `frame_count` times. Dropping the stream
/// ends the session.
pub trait FrameStream {
    /// Total frames this session produces
    fn frame_count(&self) -> u32;

    /// Produce the next frame
    fn next_frame(&mut self) -> StereoFrame;
}

/// Encoder that can start a session from a batch of records
pub trait StreamEncoder {
    /// Session type returned by [`StreamEncoder::start`]
    type Stream: FrameStream;

    /// Begin a stream for `records`
    ///
    /// Fails with `EncoderStartFailure`; the records are released on failure.
    fn start(&mut self, records: Vec<SlotRecord>, options: &EncodeOptions)
        -> Result<Self::Stream>;

    /// Short name used in diagnostics
    fn name(&self) -> &str;
}
