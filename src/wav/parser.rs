//! RIFF/WAVE parser
//!
//! Validates the fixed part of the header against the canonical template,
//! reads the `fmt ` fields at their fixed offsets and then walks the chunk
//! list looking for `data`. All header integers are little-endian.

use nom::bytes::complete::take;
use nom::number::complete::{le_u16, le_u32};
use nom::sequence::tuple;
use nom::IResult;

use super::format::{
    AudioFormat, RawAudioChunk, CHUNK_HEADER_SIZE, FORMAT_TAG_PCM, HEADER_SIZE, HEADER_TEMPLATE,
    POS_FMT_BODY, POS_FMT_CHUNK, POS_WAVE_FMT,
};
use crate::{Result, VolcaError};

/// Parse a WAV file held in memory
///
/// Returns the validated format together with the `data` chunk payload.
///
/// # Examples
///
/// ```no_run
/// use volcamatic::wav::parse_wav;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let bytes = std::fs::read("07-kick.wav")?;
/// let (format, audio) = parse_wav(&bytes)?;
/// println!("{} Hz, {} frames", format.sample_rate, audio.frame_count(&format));
/// # Ok(())
/// # }
/// ```
pub fn parse_wav(data: &[u8]) -> Result<(AudioFormat, RawAudioChunk<'_>)> {
    WavParser { data }.parse()
}

/// `fmt ` body fields in file order
struct FmtFields {
    format_tag: u16,
    channel_count: u16,
    sample_rate: u32,
    bits_per_sample: u16,
}

/// Chunk id and declared payload size
struct ChunkHeader<'a> {
    id: &'a [u8],
    size: u32,
}

fn chunk_header(input: &[u8]) -> IResult<&[u8], ChunkHeader<'_>> {
    let (input, (id, size)) = tuple((take(4usize), le_u32))(input)?;
    Ok((input, ChunkHeader { id, size }))
}

fn fmt_fields(input: &[u8]) -> IResult<&[u8], FmtFields> {
    // tag, channels, rate, byte rate, block align, bits
    let (input, (format_tag, channel_count, sample_rate, _, _, bits_per_sample)) =
        tuple((le_u16, le_u16, le_u32, le_u32, le_u16, le_u16))(input)?;
    Ok((
        input,
        FmtFields {
            format_tag,
            channel_count,
            sample_rate,
            bits_per_sample,
        },
    ))
}

struct WavParser<'a> {
    data: &'a [u8],
}

impl<'a> WavParser<'a> {
    fn parse(&self) -> Result<(AudioFormat, RawAudioChunk<'a>)> {
        if self.data.len() <= HEADER_SIZE {
            return Err(VolcaError::HeaderTooSmall {
                len: self.data.len(),
            });
        }

        if self.data[0..4] != HEADER_TEMPLATE[0..4] {
            return Err(VolcaError::MissingRiff);
        }

        if self.data[POS_WAVE_FMT..POS_WAVE_FMT + 8] != HEADER_TEMPLATE[POS_WAVE_FMT..POS_WAVE_FMT + 8]
        {
            return Err(VolcaError::MissingWaveFmt);
        }

        let format = self.parse_format()?;
        let audio = self.find_data_chunk()?;

        if audio.frame_count(&format) == 0 {
            // Non-empty payload shorter than one frame
            return Err(VolcaError::EmptyPayload);
        }

        tracing::debug!(
            channels = format.channel_count,
            bits = format.bits_per_sample,
            sample_rate = format.sample_rate,
            payload = audio.len(),
            "parsed WAV header"
        );

        Ok((format, audio))
    }

    fn parse_format(&self) -> Result<AudioFormat> {
        // The buffer is longer than the 44-byte header, so the 16-byte body is present
        let (_, fields) = fmt_fields(&self.data[POS_FMT_BODY..]).map_err(|_| {
            VolcaError::HeaderTooSmall {
                len: self.data.len(),
            }
        })?;

        if fields.format_tag != FORMAT_TAG_PCM {
            return Err(VolcaError::UnsupportedEncoding(fields.format_tag));
        }

        if !matches!(fields.channel_count, 1 | 2) {
            return Err(VolcaError::UnsupportedChannelCount(fields.channel_count));
        }

        if !matches!(fields.bits_per_sample, 16 | 24) {
            return Err(VolcaError::UnsupportedBitDepth(fields.bits_per_sample));
        }

        Ok(AudioFormat {
            channel_count: fields.channel_count,
            bits_per_sample: fields.bits_per_sample,
            sample_rate: fields.sample_rate,
        })
    }

    /// Walk chunks starting at `fmt `, skipping by declared size until `data`
    fn find_data_chunk(&self) -> Result<RawAudioChunk<'a>> {
        let mut pos = POS_FMT_CHUNK;

        let payload_size = loop {
            let header = self.chunk_at(pos)?;
            if header.id == b"data" {
                break header.size;
            }

            tracing::debug!(
                id = %String::from_utf8_lossy(header.id),
                size = header.size,
                offset = pos,
                "skipping chunk"
            );

            pos = usize::try_from(header.size)
                .ok()
                .and_then(|size| size.checked_add(CHUNK_HEADER_SIZE))
                .and_then(|step| pos.checked_add(step))
                .ok_or(VolcaError::MissingDataChunk)?;
        };

        if payload_size == 0 {
            return Err(VolcaError::EmptyPayload);
        }

        let start = pos + CHUNK_HEADER_SIZE;
        let available = self.data.len() - start;
        let end = usize::try_from(payload_size)
            .ok()
            .and_then(|size| start.checked_add(size))
            .filter(|&end| end <= self.data.len())
            .ok_or(VolcaError::PayloadSizeMismatch {
                declared: payload_size,
                available,
            })?;

        Ok(RawAudioChunk::new(&self.data[start..end]))
    }

    fn chunk_at(&self, pos: usize) -> Result<ChunkHeader<'a>> {
        match pos.checked_add(CHUNK_HEADER_SIZE) {
            Some(end) if end <= self.data.len() => {}
            _ => return Err(VolcaError::MissingDataChunk),
        }
        let (_, header) = chunk_header(&self.data[pos..]).map_err(|_| VolcaError::MissingDataChunk)?;
        Ok(header)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build a WAV image by hand: canonical `fmt ` body, optional extra chunks, then `data`
    fn build_wav(
        format_tag: u16,
        channels: u16,
        bits: u16,
        extra_chunks: &[(&[u8; 4], Vec<u8>)],
        data_size: u32,
        payload: &[u8],
    ) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(b"RIFF");
        out.extend_from_slice(&0u32.to_le_bytes());
        out.extend_from_slice(b"WAVEfmt ");
        out.extend_from_slice(&16u32.to_le_bytes());
        out.extend_from_slice(&format_tag.to_le_bytes());
        out.extend_from_slice(&channels.to_le_bytes());
        out.extend_from_slice(&22_050u32.to_le_bytes());
        let align = channels * bits / 8;
        out.extend_from_slice(&(22_050u32 * u32::from(align)).to_le_bytes());
        out.extend_from_slice(&align.to_le_bytes());
        out.extend_from_slice(&bits.to_le_bytes());
        for (id, body) in extra_chunks {
            out.extend_from_slice(*id);
            out.extend_from_slice(&(body.len() as u32).to_le_bytes());
            out.extend_from_slice(body);
        }
        out.extend_from_slice(b"data");
        out.extend_from_slice(&data_size.to_le_bytes());
        out.extend_from_slice(payload);
        out
    }

    fn pcm16_mono(payload: &[u8]) -> Vec<u8> {
        build_wav(1, 1, 16, &[], payload.len() as u32, payload)
    }

    #[test]
    fn test_parse_mono_16() {
        let wav = pcm16_mono(&[1, 0, 2, 0, 3, 0]);
        let (format, audio) = parse_wav(&wav).unwrap();
        assert_eq!(format.channel_count, 1);
        assert_eq!(format.bits_per_sample, 16);
        assert_eq!(format.sample_rate, 22_050);
        assert_eq!(audio.payload(), &[1, 0, 2, 0, 3, 0]);
    }

    #[test]
    fn test_header_too_small() {
        let wav = vec![0u8; HEADER_SIZE];
        assert!(matches!(
            parse_wav(&wav),
            Err(VolcaError::HeaderTooSmall { len: 44 })
        ));
    }

    #[test]
    fn test_missing_riff() {
        let mut wav = pcm16_mono(&[0; 8]);
        wav[0..4].copy_from_slice(b"RIFX");
        assert!(matches!(parse_wav(&wav), Err(VolcaError::MissingRiff)));
    }

    #[test]
    fn test_missing_wave_fmt() {
        let mut wav = pcm16_mono(&[0; 8]);
        wav[8..12].copy_from_slice(b"AVI ");
        assert!(matches!(parse_wav(&wav), Err(VolcaError::MissingWaveFmt)));
    }

    #[test]
    fn test_rejects_float_encoding() {
        let wav = build_wav(3, 1, 16, &[], 8, &[0; 8]);
        assert!(matches!(
            parse_wav(&wav),
            Err(VolcaError::UnsupportedEncoding(3))
        ));
    }

    #[test]
    fn test_rejects_channel_count() {
        let wav = build_wav(1, 4, 16, &[], 8, &[0; 8]);
        assert!(matches!(
            parse_wav(&wav),
            Err(VolcaError::UnsupportedChannelCount(4))
        ));
    }

    #[test]
    fn test_rejects_bit_depth() {
        let wav = build_wav(1, 1, 8, &[], 8, &[0; 8]);
        assert!(matches!(
            parse_wav(&wav),
            Err(VolcaError::UnsupportedBitDepth(8))
        ));
    }

    #[test]
    fn test_skips_unknown_chunks() {
        let wav = build_wav(
            1,
            2,
            24,
            &[(b"LIST", vec![0xAA; 12]), (b"fact", vec![0xBB; 4])],
            6,
            &[1, 2, 3, 4, 5, 6],
        );
        let (format, audio) = parse_wav(&wav).unwrap();
        assert_eq!(format.block_align(), 6);
        assert_eq!(audio.payload(), &[1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_extended_fmt_chunk() {
        // WAVEFORMATEX: 18-byte fmt body ending in cbSize = 0
        let mut wav = pcm16_mono(&[1, 0, 2, 0]);
        wav[16..20].copy_from_slice(&18u32.to_le_bytes());
        wav.splice(36..36, [0u8, 0]);

        let (format, audio) = parse_wav(&wav).unwrap();
        assert_eq!(format.channel_count, 1);
        assert_eq!(format.bits_per_sample, 16);
        assert_eq!(audio.payload(), &[1, 0, 2, 0]);
    }

    #[test]
    fn test_missing_data_chunk() {
        let mut wav = pcm16_mono(&[0; 16]);
        let data_pos = wav.len() - 16 - 8;
        wav[data_pos..data_pos + 4].copy_from_slice(b"junk");
        assert!(matches!(parse_wav(&wav), Err(VolcaError::MissingDataChunk)));
    }

    #[test]
    fn test_chunk_size_overflow_is_missing_data() {
        let mut wav = build_wav(1, 1, 16, &[(b"LIST", vec![0; 4])], 4, &[0; 4]);
        // LIST size field sits right after the 36-byte RIFF/fmt prefix
        wav[40..44].copy_from_slice(&u32::MAX.to_le_bytes());
        assert!(matches!(parse_wav(&wav), Err(VolcaError::MissingDataChunk)));
    }

    #[test]
    fn test_empty_payload() {
        let wav = build_wav(1, 1, 16, &[(b"LIST", vec![0; 4])], 0, &[]);
        assert!(matches!(parse_wav(&wav), Err(VolcaError::EmptyPayload)));
    }

    #[test]
    fn test_payload_shorter_than_a_frame_is_empty() {
        let wav = build_wav(1, 2, 24, &[], 5, &[0; 5]);
        assert!(matches!(parse_wav(&wav), Err(VolcaError::EmptyPayload)));
    }

    #[test]
    fn test_payload_size_mismatch() {
        let wav = build_wav(1, 1, 16, &[], 64, &[0; 8]);
        match parse_wav(&wav) {
            Err(VolcaError::PayloadSizeMismatch {
                declared,
                available,
            }) => {
                assert_eq!(declared, 64);
                assert_eq!(available, 8);
            }
            other => panic!("expected PayloadSizeMismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_trailing_bytes_after_data_are_ignored() {
        let mut wav = pcm16_mono(&[9, 0, 8, 0]);
        wav.extend_from_slice(b"LIST\x00\x00\x00\x00");
        let (_, audio) = parse_wav(&wav).unwrap();
        assert_eq!(audio.payload(), &[9, 0, 8, 0]);
    }
}
