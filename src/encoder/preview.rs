//! Preview encoder
//!
//! Renders the loaded samples as plain audio instead of a Syro stream: each
//! sample is played centered on both channels, followed by a short silence.
//! Erase records produce no audio. Compressed samples are previewed with
//! their low bits masked off, which approximates the reduced bit depth.
//! Used when the vendor encoder is not linked in, and for auditioning what
//! the normalizer produced.

use super::{EncodeOptions, FrameStream, StereoFrame, StreamEncoder};
use crate::slots::{SampleEncoding, SlotRecord};
use crate::{Result, VolcaError};

/// Silence after each sample, in frames (100ms at 44.1kHz)
pub const DEFAULT_GAP_FRAMES: u32 = 4_410;

/// Encoder that renders samples back to back for listening
#[derive(Debug, Clone)]
pub struct PreviewEncoder {
    gap_frames: u32,
}

impl PreviewEncoder {
    /// Preview encoder with the default gap
    pub fn new() -> Self {
        Self {
            gap_frames: DEFAULT_GAP_FRAMES,
        }
    }

    /// Set the silence inserted after each sample
    pub fn gap_frames(mut self, frames: u32) -> Self {
        self.gap_frames = frames;
        self
    }
}

impl Default for PreviewEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamEncoder for PreviewEncoder {
    type Stream = PreviewStream;

    fn start(&mut self, records: Vec<SlotRecord>, _options: &EncodeOptions) -> Result<PreviewStream> {
        if records.is_empty() {
            return Err(VolcaError::EncoderStartFailure("empty batch".into()));
        }

        let total: u64 = records
            .iter()
            .filter_map(|record| match record {
                SlotRecord::Load { sample, .. } => {
                    Some(sample.frames.len() as u64 + u64::from(self.gap_frames))
                }
                SlotRecord::Erase(_) => None,
            })
            .sum();

        let frame_count = u32::try_from(total).map_err(|_| {
            VolcaError::EncoderStartFailure(format!("preview of {} frames is too long", total))
        })?;

        Ok(PreviewStream {
            records,
            frame_count,
            gap_frames: self.gap_frames as usize,
            record: 0,
            position: 0,
        })
    }

    fn name(&self) -> &str {
        "preview"
    }
}

/// Running preview session, owning the submitted records
#[derive(Debug)]
pub struct PreviewStream {
    records: Vec<SlotRecord>,
    frame_count: u32,
    gap_frames: usize,
    record: usize,
    position: usize,
}

fn quantize(sample: i16, encoding: SampleEncoding) -> i16 {
    match encoding {
        SampleEncoding::Linear => sample,
        SampleEncoding::Compressed { bits } => {
            let drop = 16u32.saturating_sub(u32::from(bits));
            sample & !((1i16 << drop) - 1)
        }
    }
}

impl FrameStream for PreviewStream {
    fn frame_count(&self) -> u32 {
        self.frame_count
    }

    fn next_frame(&mut self) -> StereoFrame {
        while let Some(record) = self.records.get(self.record) {
            if let SlotRecord::Load { sample, encoding } = record {
                if self.position < sample.frames.len() + self.gap_frames {
                    let value = sample
                        .frames
                        .get(self.position)
                        .map_or(0, |&s| quantize(s, *encoding));
                    self.position += 1;
                    return StereoFrame::centered(value);
                }
            }
            self.record += 1;
            self.position = 0;
        }
        StereoFrame::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pcm::NormalizedSample;
    use crate::slots::SlotIndex;

    fn load(slot: i64, frames: Vec<i16>, encoding: SampleEncoding) -> SlotRecord {
        SlotRecord::Load {
            sample: NormalizedSample {
                slot: SlotIndex::new(slot).unwrap(),
                sample_rate: 44_100,
                frames,
            },
            encoding,
        }
    }

    fn drain(stream: &mut PreviewStream) -> Vec<i16> {
        (0..stream.frame_count())
            .map(|_| {
                let frame = stream.next_frame();
                assert_eq!(frame.left, frame.right);
                frame.left
            })
            .collect()
    }

    #[test]
    fn test_samples_are_separated_by_gaps() {
        let records = vec![
            load(0, vec![1, 2], SampleEncoding::Linear),
            SlotRecord::Erase(SlotIndex::new(1).unwrap()),
            load(2, vec![3], SampleEncoding::Linear),
        ];
        let mut stream = PreviewEncoder::new()
            .gap_frames(2)
            .start(records, &EncodeOptions::default())
            .unwrap();

        assert_eq!(stream.frame_count(), 7);
        assert_eq!(drain(&mut stream), vec![1, 2, 0, 0, 3, 0, 0]);
        assert_eq!(stream.next_frame(), StereoFrame::default());
    }

    #[test]
    fn test_erase_only_batch_is_silent() {
        let records = vec![SlotRecord::Erase(SlotIndex::new(5).unwrap())];
        let stream = PreviewEncoder::new()
            .start(records, &EncodeOptions::default())
            .unwrap();
        assert_eq!(stream.frame_count(), 0);
    }

    #[test]
    fn test_empty_batch_fails_to_start() {
        assert!(matches!(
            PreviewEncoder::new().start(Vec::new(), &EncodeOptions::default()),
            Err(VolcaError::EncoderStartFailure(_))
        ));
    }

    #[test]
    fn test_compressed_preview_masks_low_bits() {
        assert_eq!(quantize(0x1234, SampleEncoding::Compressed { bits: 8 }), 0x1200);
        assert_eq!(quantize(-1, SampleEncoding::Compressed { bits: 12 }), -16);
        assert_eq!(quantize(0x1234, SampleEncoding::Compressed { bits: 16 }), 0x1234);
        assert_eq!(quantize(0x1234, SampleEncoding::Linear), 0x1234);
    }
}
