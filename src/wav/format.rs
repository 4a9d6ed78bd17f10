//! WAV container layout shared by the parser and the writer
//!
//! The sampler only ever receives one kind of file: a 44-byte canonical
//! header describing 2-channel, 16-bit, 44.1kHz integer PCM followed by the
//! interleaved frames. The same template doubles as the reference the parser
//! compares incoming headers against.

/// Canonical 44-byte RIFF/WAVE header (2ch, 16-bit, 44.1kHz PCM)
///
/// The RIFF size and data size fields are left zeroed and patched per file.
pub const HEADER_TEMPLATE: [u8; HEADER_SIZE] = [
    b'R', b'I', b'F', b'F', // 'RIFF'
    0x00, 0x00, 0x00, 0x00, // size (data size + 0x24)
    b'W', b'A', b'V', b'E', // 'WAVE'
    b'f', b'm', b't', b' ', // 'fmt '
    0x10, 0x00, 0x00, 0x00, // fmt chunk size
    0x01, 0x00, // format tag (PCM)
    0x02, 0x00, // channels = 2
    0x44, 0xAC, 0x00, 0x00, // 44100 Hz
    0x10, 0xB1, 0x02, 0x00, // bytes per second (Fs * 4)
    0x04, 0x00, // block align (2ch, 16-bit)
    0x10, 0x00, // 16 bits
    b'd', b'a', b't', b'a', // 'data'
    0x00, 0x00, 0x00, 0x00, // data size (bytes)
];

/// Size of [`HEADER_TEMPLATE`]
pub const HEADER_SIZE: usize = 44;

/// Offset of the RIFF chunk size field
pub const POS_RIFF_SIZE: usize = 0x04;
/// Offset of the `WAVE` form type, immediately followed by the `fmt ` id
pub const POS_WAVE_FMT: usize = 0x08;
/// Offset of the `fmt ` chunk header
pub const POS_FMT_CHUNK: usize = 0x0C;
/// Offset of the `fmt ` chunk body
pub const POS_FMT_BODY: usize = POS_FMT_CHUNK + CHUNK_HEADER_SIZE;
/// Offset of the data chunk size field in the canonical layout
pub const POS_DATA_SIZE: usize = 0x28;

/// `{id}{size}` prefix of every RIFF chunk
pub const CHUNK_HEADER_SIZE: usize = 8;

/// RIFF size counts everything after the size field: 36 header bytes plus data
pub const RIFF_SIZE_BIAS: u32 = 0x24;

/// Format tag for integer PCM
pub const FORMAT_TAG_PCM: u16 = 1;

/// Sample format of a parsed input file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioFormat {
    /// 1 (mono) or 2 (stereo)
    pub channel_count: u16,
    /// 16 or 24
    pub bits_per_sample: u16,
    /// Declared sample rate in Hz, forwarded untouched to the encoder
    pub sample_rate: u32,
}

impl AudioFormat {
    /// Bytes per single-channel sample (2 or 3)
    pub fn bytes_per_sample(&self) -> usize {
        usize::from(self.bits_per_sample / 8)
    }

    /// Bytes per interleaved frame
    pub fn block_align(&self) -> usize {
        usize::from(self.channel_count) * self.bytes_per_sample()
    }
}

/// Payload of the `data` chunk, borrowed from the loaded file buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawAudioChunk<'a> {
    payload: &'a [u8],
}

impl<'a> RawAudioChunk<'a> {
    /// Wrap a `data` chunk payload
    pub fn new(payload: &'a [u8]) -> Self {
        Self { payload }
    }

    /// Raw payload bytes, including any trailing partial frame
    pub fn payload(&self) -> &'a [u8] {
        self.payload
    }

    /// Payload size in bytes
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    /// True when the payload holds no bytes
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// Number of complete frames under `format`; a trailing partial frame is not counted
    pub fn frame_count(&self, format: &AudioFormat) -> usize {
        match format.block_align() {
            0 => 0,
            align => self.payload.len() / align,
        }
    }

    /// Iterate complete interleaved frames, dropping any trailing partial frame
    pub fn frames(&self, format: &AudioFormat) -> std::slice::ChunksExact<'a, u8> {
        self.payload.chunks_exact(format.block_align().max(1))
    }
}
