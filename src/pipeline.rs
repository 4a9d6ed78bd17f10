//! Stream rendering
//!
//! Hands a finished slot table to an encoder, drains the resulting frame
//! stream into an output WAV and writes it to disk.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::encoder::{EncodeOptions, StreamEncoder};
use crate::loader::LoadReport;
use crate::slots::{SampleEncoding, SlotIndex, SlotRecord, SlotTable};
use crate::wav::SyroWav;
use crate::{Result, VolcaError};

/// Sample memory of the Volca Sample, in bytes
pub const DEVICE_MEMORY_BYTES: usize = 4_194_304;

/// Default output file name
pub const DEFAULT_OUTPUT: &str = "syro.wav";

/// Rendering configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Options forwarded to the encoder
    pub options: EncodeOptions,
    /// Where the output WAV is written
    pub output: PathBuf,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            options: EncodeOptions::default(),
            output: PathBuf::from(DEFAULT_OUTPUT),
        }
    }
}

impl PipelineConfig {
    /// Set the output path
    pub fn output<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.output = path.as_ref().to_path_buf();
        self
    }

    /// Set the encoder options
    pub fn options(mut self, options: EncodeOptions) -> Self {
        self.options = options;
        self
    }
}

/// A loaded slot as reported in the batch summary
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadedEntry {
    /// Target slot
    pub slot: SlotIndex,
    /// Source sample rate in Hz
    pub sample_rate: u32,
    /// Mono frames after normalization
    pub frames: usize,
    /// Device memory used
    pub bytes: usize,
    /// Storage encoding
    pub encoding: SampleEncoding,
}

/// A file that was left out of the batch
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedFile {
    /// File as given on the command line
    pub path: PathBuf,
    /// Why it was not loaded
    pub reason: String,
}

/// What a run submitted and produced
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchSummary {
    /// Slots erased, ascending
    pub erased: Vec<SlotIndex>,
    /// Slots loaded, ascending
    pub loaded: Vec<LoadedEntry>,
    /// Input files that failed to load
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<SkippedFile>,
    /// Total device memory used by loaded samples
    pub sample_bytes: usize,
    /// `sample_bytes` as a percentage of device memory
    pub memory_percent: f64,
    /// Frames in the rendered stream (0 until rendered)
    pub frame_count: u32,
    /// Output file, once written
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
}

impl BatchSummary {
    /// Summarize a batch before it is handed to the encoder
    pub fn from_records(records: &[SlotRecord]) -> Self {
        let mut erased = Vec::new();
        let mut loaded = Vec::new();

        for record in records {
            match record {
                SlotRecord::Erase(slot) => erased.push(*slot),
                SlotRecord::Load { sample, encoding } => loaded.push(LoadedEntry {
                    slot: sample.slot,
                    sample_rate: sample.sample_rate,
                    frames: sample.frames.len(),
                    bytes: sample.byte_len(),
                    encoding: *encoding,
                }),
            }
        }

        let sample_bytes = loaded.iter().map(|entry| entry.bytes).sum();

        Self {
            erased,
            loaded,
            skipped: Vec::new(),
            sample_bytes,
            memory_percent: memory_percent(sample_bytes),
            frame_count: 0,
            output: None,
        }
    }

    /// Number of records in the batch
    pub fn record_count(&self) -> usize {
        self.erased.len() + self.loaded.len()
    }

    /// True when the loaded samples do not fit the device
    pub fn exceeds_memory(&self) -> bool {
        self.sample_bytes > DEVICE_MEMORY_BYTES
    }
}

/// Share of device memory taken by `bytes`, in percent
pub fn memory_percent(bytes: usize) -> f64 {
    100.0 * bytes as f64 / DEVICE_MEMORY_BYTES as f64
}

/// Start `encoder` on `records` and drain its stream into a WAV buffer
///
/// The encoder session ends (and the records are released) before this
/// returns, whether rendering succeeded or not.
pub fn render_batch<E: StreamEncoder + ?Sized>(
    encoder: &mut E,
    records: Vec<SlotRecord>,
    config: &PipelineConfig,
) -> Result<SyroWav> {
    if records.is_empty() {
        return Err(VolcaError::NothingToDo);
    }

    tracing::debug!(encoder = encoder.name(), records = records.len(), "starting encoder");
    let mut stream = encoder.start(records, &config.options)?;
    let wav = SyroWav::render(&mut stream);
    drop(stream);
    wav
}

/// Records taken out of a slot table, ready for the encoder
#[derive(Debug)]
pub struct PreparedBatch {
    records: Vec<SlotRecord>,
    summary: BatchSummary,
}

impl PreparedBatch {
    /// Consume `table` into an ascending batch and summarize it
    pub fn from_table(table: SlotTable) -> Self {
        let records = table.into_records();
        let summary = BatchSummary::from_records(&records);

        if summary.exceeds_memory() {
            tracing::warn!(
                bytes = summary.sample_bytes,
                percent = summary.memory_percent,
                "samples exceed device memory"
            );
        }

        Self { records, summary }
    }

    /// Record the files of `report` that failed to load
    pub fn skipped(mut self, report: &LoadReport) -> Self {
        self.summary.skipped = report
            .failed()
            .map(|(path, err)| SkippedFile {
                path: path.to_path_buf(),
                reason: err.to_string(),
            })
            .collect();
        self
    }

    /// Summary of what is about to be submitted
    pub fn summary(&self) -> &BatchSummary {
        &self.summary
    }

    /// Run the batch through `encoder`
    pub fn render<E: StreamEncoder + ?Sized>(
        self,
        encoder: &mut E,
        config: &PipelineConfig,
    ) -> Result<RenderedBatch> {
        let mut summary = self.summary;
        let wav = render_batch(encoder, self.records, config)?;
        summary.frame_count = wav.frame_count();
        Ok(RenderedBatch { wav, summary })
    }
}

/// Encoder output held in memory until written
#[derive(Debug)]
pub struct RenderedBatch {
    wav: SyroWav,
    summary: BatchSummary,
}

impl RenderedBatch {
    /// Rendered output file
    pub fn wav(&self) -> &SyroWav {
        &self.wav
    }

    /// Write the output to `config.output`
    pub fn write(self, config: &PipelineConfig) -> Result<BatchSummary> {
        self.wav.write_to(&config.output)?;
        let mut summary = self.summary;
        summary.output = Some(config.output.clone());
        Ok(summary)
    }
}

/// Render the table's batch and write it to `config.output`
pub fn run_batch<E: StreamEncoder + ?Sized>(
    encoder: &mut E,
    table: SlotTable,
    config: &PipelineConfig,
) -> Result<BatchSummary> {
    PreparedBatch::from_table(table)
        .render(encoder, config)?
        .write(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::{FrameStream, PreviewEncoder, StereoFrame};
    use crate::pcm::NormalizedSample;
    use approx::assert_relative_eq;
    use std::cell::Cell;
    use std::rc::Rc;

    /// Encoder double that counts started and ended sessions
    struct CountingEncoder {
        frames: u32,
        fail: bool,
        ended: Rc<Cell<u32>>,
    }

    struct CountingStream {
        frames: u32,
        ended: Rc<Cell<u32>>,
    }

    impl FrameStream for CountingStream {
        fn frame_count(&self) -> u32 {
            self.frames
        }

        fn next_frame(&mut self) -> StereoFrame {
            StereoFrame { left: 1, right: 2 }
        }
    }

    impl Drop for CountingStream {
        fn drop(&mut self) {
            self.ended.set(self.ended.get() + 1);
        }
    }

    impl StreamEncoder for CountingEncoder {
        type Stream = CountingStream;

        fn start(&mut self, _records: Vec<SlotRecord>, _options: &EncodeOptions) -> Result<CountingStream> {
            if self.fail {
                return Err(VolcaError::EncoderStartFailure("refused".into()));
            }
            Ok(CountingStream {
                frames: self.frames,
                ended: Rc::clone(&self.ended),
            })
        }

        fn name(&self) -> &str {
            "counting"
        }
    }

    fn erase_batch() -> Vec<SlotRecord> {
        vec![SlotRecord::Erase(SlotIndex::new(3).unwrap())]
    }

    #[test]
    fn test_session_is_ended_after_render() {
        let ended = Rc::new(Cell::new(0));
        let mut encoder = CountingEncoder {
            frames: 10,
            fail: false,
            ended: Rc::clone(&ended),
        };

        let wav = render_batch(&mut encoder, erase_batch(), &PipelineConfig::default()).unwrap();
        assert_eq!(wav.frame_count(), 10);
        assert_eq!(wav.as_bytes().len(), 44 + 40);
        assert_eq!(ended.get(), 1);
    }

    #[test]
    fn test_start_failure_is_reported() {
        let ended = Rc::new(Cell::new(0));
        let mut encoder = CountingEncoder {
            frames: 0,
            fail: true,
            ended: Rc::clone(&ended),
        };

        let result = render_batch(&mut encoder, erase_batch(), &PipelineConfig::default());
        assert!(matches!(result, Err(VolcaError::EncoderStartFailure(_))));
        assert_eq!(ended.get(), 0);
    }

    #[test]
    fn test_empty_batch_is_nothing_to_do() {
        let result = render_batch(
            &mut PreviewEncoder::new(),
            Vec::new(),
            &PipelineConfig::default(),
        );
        assert!(matches!(result, Err(VolcaError::NothingToDo)));
    }

    #[test]
    fn test_summary_counts_memory() {
        let records = vec![
            SlotRecord::Erase(SlotIndex::new(0).unwrap()),
            SlotRecord::Load {
                sample: NormalizedSample {
                    slot: SlotIndex::new(1).unwrap(),
                    sample_rate: 44_100,
                    frames: vec![0; 1_048_576],
                },
                encoding: SampleEncoding::Linear,
            },
        ];

        let summary = BatchSummary::from_records(&records);
        assert_eq!(summary.record_count(), 2);
        assert_eq!(summary.sample_bytes, 2_097_152);
        assert_relative_eq!(summary.memory_percent, 50.0);
    }

    #[test]
    fn test_run_batch_writes_output() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.wav");
        let mut table = SlotTable::new();
        table
            .load(
                NormalizedSample {
                    slot: SlotIndex::new(8).unwrap(),
                    sample_rate: 22_050,
                    frames: vec![7, 8, 9],
                },
                SampleEncoding::Linear,
            )
            .unwrap();

        let config = PipelineConfig::default().output(&output);
        let mut encoder = PreviewEncoder::new().gap_frames(1);
        let summary = run_batch(&mut encoder, table, &config).unwrap();

        assert_eq!(summary.frame_count, 4);
        assert_eq!(summary.output.as_deref(), Some(output.as_path()));
        let bytes = std::fs::read(&output).unwrap();
        assert_eq!(bytes.len(), 44 + 16);
        assert_eq!(&bytes[44..48], &[7, 0, 7, 0]);
    }

    #[test]
    fn test_summary_serializes() {
        let summary = BatchSummary::from_records(&erase_batch());
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["erased"], serde_json::json!([3]));
        assert!(json.get("output").is_none());
        assert!(json.get("skipped").is_none());
    }

    #[test]
    fn test_prepared_batch_lists_skipped_files() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("04-missing.wav");
        let mut table = SlotTable::new();
        table.mark_erase(SlotIndex::new(2).unwrap()).unwrap();
        let report = crate::loader::load_all(&mut table, [&missing], SampleEncoding::Linear);

        let batch = PreparedBatch::from_table(table).skipped(&report);
        assert_eq!(batch.summary().skipped.len(), 1);
        assert_eq!(batch.summary().skipped[0].path, missing);
        assert!(batch.summary().skipped[0].reason.starts_with("file not found"));

        let output = dir.path().join("out.wav");
        let config = PipelineConfig::default().output(&output);
        let rendered = batch.render(&mut PreviewEncoder::new(), &config).unwrap();
        assert_eq!(rendered.wav().frame_count(), 0);
        assert!(!output.exists());

        let summary = rendered.write(&config).unwrap();
        assert!(output.exists());
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["skipped"][0]["reason"], summary.skipped[0].reason.as_str());
    }

    #[test]
    fn test_oversized_batch_is_flagged() {
        let mut table = SlotTable::new();
        for slot in 0..2 {
            table
                .load(
                    NormalizedSample {
                        slot: SlotIndex::new(slot).unwrap(),
                        sample_rate: 44_100,
                        frames: vec![0; DEVICE_MEMORY_BYTES / 4 + 1],
                    },
                    SampleEncoding::Linear,
                )
                .unwrap();
        }

        let batch = PreparedBatch::from_table(table);
        assert!(batch.summary().exceeds_memory());
        assert!(batch.summary().memory_percent > 100.0);
    }
}
