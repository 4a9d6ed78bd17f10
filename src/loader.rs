//! Sample file loading
//!
//! Reads sample files from disk, validates them and queues the normalized
//! result in a [`SlotTable`]. A failing file is reported and skipped; it
//! never aborts the rest of the batch.

use std::fs;
use std::path::{Path, PathBuf};

use crate::pcm::NormalizedSample;
use crate::slots::{slot_from_filename, SampleEncoding, SlotIndex, SlotTable};
use crate::wav::parse_wav;
use crate::{Result, VolcaError};

/// Load one sample file
///
/// The slot comes from the file name prefix and is validated before the file
/// is read. The raw file buffer is dropped as soon as the sample has been
/// normalized.
pub fn load_sample<P: AsRef<Path>>(path: P) -> Result<NormalizedSample> {
    let path = path.as_ref();
    let slot = slot_from_filename(path)?;

    let bytes = fs::read(path).map_err(|source| VolcaError::FileNotFound {
        path: path.to_path_buf(),
        source,
    })?;

    let (format, audio) = parse_wav(&bytes)?;
    Ok(NormalizedSample::from_wav(slot, &format, &audio))
}

/// A successfully queued file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadedSlot {
    /// Slot the sample was queued for
    pub slot: SlotIndex,
    /// Device memory taken by the sample
    pub bytes: usize,
    /// Sample rate of the source file
    pub sample_rate: u32,
    /// Whether an earlier claim on the slot was replaced
    pub replaced: bool,
}

/// Result of processing one file
#[derive(Debug)]
pub struct LoadOutcome {
    /// File as given on the command line
    pub path: PathBuf,
    /// Queued slot or the reason the file was skipped
    pub result: Result<LoadedSlot>,
}

impl LoadOutcome {
    /// File name without directories, for diagnostics
    pub fn display_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

/// Per-file outcomes of a load batch, in command-line order
#[derive(Debug, Default)]
pub struct LoadReport {
    /// One entry per input file
    pub outcomes: Vec<LoadOutcome>,
}

impl LoadReport {
    /// Files that were queued
    pub fn loaded(&self) -> impl Iterator<Item = (&Path, &LoadedSlot)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().ok().map(|slot| (o.path.as_path(), slot)))
    }

    /// Files that were skipped, with the reason
    pub fn failed(&self) -> impl Iterator<Item = (&Path, &VolcaError)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|err| (o.path.as_path(), err)))
    }

    /// True when every file was queued
    pub fn all_loaded(&self) -> bool {
        self.outcomes.iter().all(|o| o.result.is_ok())
    }

    /// Load `path` into `table` and record the outcome
    pub fn load(
        &mut self,
        table: &mut SlotTable,
        path: &Path,
        encoding: SampleEncoding,
    ) -> &LoadOutcome {
        let index = self.outcomes.len();
        self.outcomes.push(load_into(table, path, encoding));
        &self.outcomes[index]
    }
}

/// Load a single file into `table`
pub fn load_into(table: &mut SlotTable, path: &Path, encoding: SampleEncoding) -> LoadOutcome {
    let result = load_sample(path).and_then(|sample| {
        let slot = sample.slot;
        let bytes = sample.byte_len();
        let sample_rate = sample.sample_rate;
        let replaced = table.load(sample, encoding)?.is_some();
        Ok(LoadedSlot {
            slot,
            bytes,
            sample_rate,
            replaced,
        })
    });

    match &result {
        Ok(loaded) => tracing::debug!(path = %path.display(), slot = %loaded.slot, bytes = loaded.bytes, "queued sample"),
        Err(err) => tracing::debug!(path = %path.display(), error = %err, "skipped sample"),
    }

    LoadOutcome {
        path: path.to_path_buf(),
        result,
    }
}

/// Load every file in order, skipping the ones that fail
pub fn load_all<I, P>(table: &mut SlotTable, paths: I, encoding: SampleEncoding) -> LoadReport
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    let mut report = LoadReport::default();
    for path in paths {
        report.load(table, path.as_ref(), encoding);
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slots::ConflictPolicy;

    fn write_mono(dir: &Path, name: &str, samples: &[i16]) -> PathBuf {
        let path = dir.join(name);
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 32_000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for &s in samples {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();
        path
    }

    #[test]
    fn test_load_sample_reads_slot_and_frames() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_mono(dir.path(), "07-kick.wav", &[5, -5, 10]);

        let sample = load_sample(&path).unwrap();
        assert_eq!(sample.slot.get(), 7);
        assert_eq!(sample.sample_rate, 32_000);
        assert_eq!(sample.frames, vec![5, -5, 10]);
    }

    #[test]
    fn test_bad_name_is_reported_before_reading() {
        let dir = tempfile::tempdir().unwrap();
        // Never created: the name check must fail first
        let path = dir.path().join("kick.wav");
        assert!(matches!(
            load_sample(&path),
            Err(VolcaError::InvalidArgumentSyntax(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("12-missing.wav");
        assert!(matches!(
            load_sample(&path),
            Err(VolcaError::FileNotFound { .. })
        ));
    }

    #[test]
    fn test_failures_do_not_stop_the_batch() {
        let dir = tempfile::tempdir().unwrap();
        let good_a = write_mono(dir.path(), "01-a.wav", &[1, 2]);
        let broken = dir.path().join("02-broken.wav");
        std::fs::write(&broken, vec![0u8; 100]).unwrap();
        let good_b = write_mono(dir.path(), "03-b.wav", &[3]);

        let mut table = SlotTable::new();
        let report = load_all(
            &mut table,
            [&good_a, &broken, &good_b],
            SampleEncoding::Linear,
        );

        assert_eq!(report.outcomes.len(), 3);
        assert!(!report.all_loaded());
        let loaded: Vec<u8> = report.loaded().map(|(_, s)| s.slot.get()).collect();
        assert_eq!(loaded, vec![1, 3]);
        let failed: Vec<&Path> = report.failed().map(|(p, _)| p).collect();
        assert_eq!(failed, vec![broken.as_path()]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.sample_bytes(), 6);
    }

    #[test]
    fn test_strict_duplicate_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let first = write_mono(dir.path(), "04-first.wav", &[1]);
        let second = write_mono(dir.path(), "4-second.wav", &[2, 2]);

        let mut table = SlotTable::with_policy(ConflictPolicy::Strict);
        let report = load_all(&mut table, [&first, &second], SampleEncoding::Linear);

        assert!(matches!(
            report.outcomes[1].result,
            Err(VolcaError::SlotConflict(_))
        ));
        assert_eq!(table.sample_bytes(), 2);
    }

    #[test]
    fn test_duplicate_replaces_by_default() {
        let dir = tempfile::tempdir().unwrap();
        let first = write_mono(dir.path(), "04-first.wav", &[1]);
        let second = write_mono(dir.path(), "4-second.wav", &[2, 2]);

        let mut table = SlotTable::new();
        let report = load_all(&mut table, [&first, &second], SampleEncoding::Linear);

        assert!(report.all_loaded());
        assert!(report.outcomes[1].result.as_ref().unwrap().replaced);
        assert_eq!(table.sample_bytes(), 4);
        assert_eq!(report.outcomes[1].display_name(), "4-second.wav");
    }

    #[test]
    fn test_report_load_returns_latest_outcome() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_mono(dir.path(), "09-hat.wav", &[1, 2, 3]);

        let mut table = SlotTable::new();
        let mut report = LoadReport::default();
        let outcome = report.load(&mut table, &path, SampleEncoding::Linear);
        assert_eq!(outcome.result.as_ref().unwrap().bytes, 6);

        let missing = dir.path().join("10-missing.wav");
        let outcome = report.load(&mut table, &missing, SampleEncoding::Linear);
        assert_eq!(outcome.display_name(), "10-missing.wav");
        assert!(outcome.result.is_err());

        assert_eq!(report.outcomes.len(), 2);
        assert_eq!(report.loaded().count(), 1);
        assert_eq!(table.len(), 1);
    }
}
