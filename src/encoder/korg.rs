//! Binding to the vendor Syro encoder (`libkorg_syro_volcasample`)
//!
//! Enabled with the `korg-sdk` feature. The library itself is not shipped;
//! build it from the Volca Sample SDK and point the linker at it, e.g.
//! `RUSTFLAGS="-L /path/to/sdk/lib"`.

use std::os::raw::{c_int, c_void};
use std::ptr;

use super::{EncodeOptions, FrameStream, StereoFrame, StreamEncoder};
use crate::slots::{SampleEncoding, SlotRecord};
use crate::{Result, VolcaError};

mod ffi {
    use std::os::raw::{c_int, c_void};

    pub const DATA_TYPE_SAMPLE_LINER: c_int = 0;
    pub const DATA_TYPE_SAMPLE_COMPRESS: c_int = 1;
    pub const DATA_TYPE_SAMPLE_ERASE: c_int = 2;

    pub const LITTLE_ENDIAN: c_int = 0;

    pub const STATUS_SUCCESS: c_int = 0;

    pub type SyroHandle = *mut c_void;

    #[repr(C)]
    pub struct SyroData {
        pub data_type: c_int,
        pub p_data: *mut u8,
        pub number: u32,
        pub size: u32,
        pub quality: u32,
        pub fs: u32,
        pub sample_endian: c_int,
    }

    #[link(name = "korg_syro_volcasample")]
    extern "C" {
        pub fn SyroVolcaSample_Start(
            handle: *mut SyroHandle,
            data: *mut SyroData,
            num_of_data: c_int,
            flags: u32,
            num_of_syro_frame: *mut u32,
        ) -> c_int;

        pub fn SyroVolcaSample_GetSample(
            handle: SyroHandle,
            left: *mut i16,
            right: *mut i16,
        ) -> c_int;

        pub fn SyroVolcaSample_End(handle: SyroHandle) -> c_int;
    }
}

/// Encoder backed by the Korg Syro library
#[derive(Debug, Default)]
pub struct KorgSyroEncoder;

impl KorgSyroEncoder {
    /// Create the encoder
    pub fn new() -> Self {
        KorgSyroEncoder
    }
}

impl StreamEncoder for KorgSyroEncoder {
    type Stream = KorgSyroStream;

    fn start(&mut self, records: Vec<SlotRecord>, options: &EncodeOptions) -> Result<KorgSyroStream> {
        if records.is_empty() {
            return Err(VolcaError::EncoderStartFailure("empty batch".into()));
        }

        // Sample bytes must outlive the session: the library reads them while streaming
        let mut buffers: Vec<Vec<u8>> = records
            .iter()
            .map(|record| match record {
                SlotRecord::Load { sample, .. } => sample.to_le_bytes(),
                SlotRecord::Erase(_) => Vec::new(),
            })
            .collect();

        let mut data: Vec<ffi::SyroData> = Vec::with_capacity(records.len());
        for (record, buffer) in records.iter().zip(buffers.iter_mut()) {
            let size = u32::try_from(buffer.len()).map_err(|_| {
                VolcaError::EncoderStartFailure(format!("sample {} is too large", record.slot()))
            })?;
            let (data_type, quality, fs) = match record {
                SlotRecord::Erase(_) => (ffi::DATA_TYPE_SAMPLE_ERASE, 0, 0),
                SlotRecord::Load { sample, encoding } => match encoding {
                    SampleEncoding::Linear => (ffi::DATA_TYPE_SAMPLE_LINER, 16, sample.sample_rate),
                    SampleEncoding::Compressed { bits } => (
                        ffi::DATA_TYPE_SAMPLE_COMPRESS,
                        u32::from(*bits),
                        sample.sample_rate,
                    ),
                },
            };
            data.push(ffi::SyroData {
                data_type,
                p_data: if buffer.is_empty() {
                    ptr::null_mut()
                } else {
                    buffer.as_mut_ptr()
                },
                number: u32::from(record.slot().get()),
                size,
                quality,
                fs,
                sample_endian: ffi::LITTLE_ENDIAN,
            });
        }

        let mut handle: ffi::SyroHandle = ptr::null_mut();
        let mut frame_count: u32 = 0;
        // SAFETY: `data` holds `records.len()` initialized entries whose sample
        // pointers stay valid for as long as the returned stream owns `buffers`.
        let status = unsafe {
            ffi::SyroVolcaSample_Start(
                &mut handle,
                data.as_mut_ptr(),
                data.len() as c_int,
                options.flags,
                &mut frame_count,
            )
        };

        if status != ffi::STATUS_SUCCESS {
            return Err(VolcaError::EncoderStartFailure(format!("status {}", status)));
        }

        Ok(KorgSyroStream {
            handle,
            frame_count,
            _data: data,
            _buffers: buffers,
            _records: records,
        })
    }

    fn name(&self) -> &str {
        "korg-syro"
    }
}

/// Running Syro session; ends the session on drop
pub struct KorgSyroStream {
    handle: *mut c_void,
    frame_count: u32,
    _data: Vec<ffi::SyroData>,
    _buffers: Vec<Vec<u8>>,
    _records: Vec<SlotRecord>,
}

impl FrameStream for KorgSyroStream {
    fn frame_count(&self) -> u32 {
        self.frame_count
    }

    fn next_frame(&mut self) -> StereoFrame {
        let mut frame = StereoFrame::default();
        // SAFETY: `handle` came from a successful start and is ended only in Drop.
        unsafe {
            ffi::SyroVolcaSample_GetSample(self.handle, &mut frame.left, &mut frame.right);
        }
        frame
    }
}

impl Drop for KorgSyroStream {
    fn drop(&mut self) {
        // SAFETY: called once, after a successful start.
        let status: c_int = unsafe { ffi::SyroVolcaSample_End(self.handle) };
        if status != ffi::STATUS_SUCCESS {
            tracing::warn!(status, "Syro encoder did not end cleanly");
        }
    }
}
