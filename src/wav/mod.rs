//! WAV Container Domain
//!
//! Reading sample files (RIFF/WAVE PCM) and producing the stereo output file
//! that carries the Syro stream.

pub mod format;
pub mod parser;
pub mod writer;

pub use format::{AudioFormat, RawAudioChunk, HEADER_SIZE, HEADER_TEMPLATE};
pub use parser::parse_wav;
pub use writer::SyroWav;
