//! PCM normalization
//!
//! Down-converts 16/24-bit mono/stereo integer PCM into the mono 16-bit
//! signed samples the Syro encoder accepts.

use crate::slots::SlotIndex;
use crate::wav::{AudioFormat, RawAudioChunk};

/// Mono 16-bit sample bound to a slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedSample {
    /// Target slot on the device
    pub slot: SlotIndex,
    /// Sample rate of the source file, in Hz
    pub sample_rate: u32,
    /// Mono 16-bit frames
    pub frames: Vec<i16>,
}

impl NormalizedSample {
    /// Normalize a parsed `data` chunk for `slot`
    pub fn from_wav(slot: SlotIndex, format: &AudioFormat, audio: &RawAudioChunk<'_>) -> Self {
        Self {
            slot,
            sample_rate: format.sample_rate,
            frames: normalize(format, audio),
        }
    }

    /// Size in bytes once handed to the encoder (2 bytes per frame)
    pub fn byte_len(&self) -> usize {
        self.frames.len() * 2
    }

    /// Frames serialized as little-endian bytes
    pub fn to_le_bytes(&self) -> Vec<u8> {
        self.frames.iter().flat_map(|s| s.to_le_bytes()).collect()
    }
}

/// Downmix `audio` to mono 16-bit
///
/// Each channel sample is rebuilt from its little-endian bytes with the top
/// byte sign-extended, channels are summed and divided by the channel count
/// (truncating toward zero) and the result is narrowed to 16 bits. Narrowing
/// keeps the low 16 bits; nothing is clamped. A trailing partial frame is
/// discarded.
pub fn normalize(format: &AudioFormat, audio: &RawAudioChunk<'_>) -> Vec<i16> {
    let bytes_per_sample = format.bytes_per_sample();
    let channels = i32::from(format.channel_count);

    let out: Vec<i16> = audio
        .frames(format)
        .map(|frame| {
            let sum: i32 = frame
                .chunks_exact(bytes_per_sample)
                .map(sign_extend_le)
                .sum();
            (sum / channels) as i16
        })
        .collect();

    tracing::debug!(
        frames = out.len(),
        dropped_bytes = audio.len() % format.block_align().max(1),
        "normalized PCM"
    );

    out
}

/// Rebuild a signed sample from little-endian bytes, sign taken from the last byte
fn sign_extend_le(bytes: &[u8]) -> i32 {
    let (&msb, rest) = match bytes.split_last() {
        Some(split) => split,
        None => return 0,
    };
    rest.iter()
        .rev()
        .fold(i32::from(msb as i8), |acc, &b| (acc << 8) | i32::from(b))
}
