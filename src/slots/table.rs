//! Per-run slot table
//!
//! Holds at most one record per slot. A fresh table is built for every run
//! and consumed when the batch is handed to the encoder.

use super::selector::SlotSelection;
use super::{SampleEncoding, SlotIndex, SlotRecord};
use crate::pcm::NormalizedSample;
use crate::{Result, VolcaError};

/// What happens when a slot is claimed twice in one run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConflictPolicy {
    /// The later claim replaces the earlier one
    #[default]
    LastWins,
    /// The later claim is rejected with `SlotConflict`
    Strict,
}

/// Fixed 100-slot registry of pending erase/load records
#[derive(Debug, Clone)]
pub struct SlotTable {
    slots: Vec<Option<SlotRecord>>,
    policy: ConflictPolicy,
}

impl Default for SlotTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SlotTable {
    /// Empty table, last claim wins
    pub fn new() -> Self {
        Self::with_policy(ConflictPolicy::LastWins)
    }

    /// Empty table with an explicit conflict policy
    pub fn with_policy(policy: ConflictPolicy) -> Self {
        Self {
            slots: vec![None; SlotIndex::COUNT],
            policy,
        }
    }

    /// Mark one slot for erase
    ///
    /// Marking an already-erased slot is a no-op under either policy.
    pub fn mark_erase(&mut self, slot: SlotIndex) -> Result<()> {
        if let Some(SlotRecord::Erase(_)) = self.get(slot) {
            return Ok(());
        }
        self.claim(SlotRecord::Erase(slot)).map(|_| ())
    }

    /// Mark every slot of a selection for erase
    pub fn mark_selection(&mut self, selection: &SlotSelection) -> Result<()> {
        for slot in selection.slots() {
            self.mark_erase(slot)?;
        }
        Ok(())
    }

    /// Queue a sample for its slot, returning the record it displaced
    pub fn load(
        &mut self,
        sample: NormalizedSample,
        encoding: SampleEncoding,
    ) -> Result<Option<SlotRecord>> {
        self.claim(SlotRecord::Load { sample, encoding })
    }

    /// Store `record` under its slot according to the conflict policy
    pub fn claim(&mut self, record: SlotRecord) -> Result<Option<SlotRecord>> {
        let slot = record.slot();
        let entry = &mut self.slots[slot.as_usize()];

        if entry.is_some() {
            if self.policy == ConflictPolicy::Strict {
                return Err(VolcaError::SlotConflict(slot));
            }
            tracing::warn!(%slot, "slot claimed twice, keeping the later claim");
        }

        Ok(entry.replace(record))
    }

    /// Record currently queued for `slot`
    pub fn get(&self, slot: SlotIndex) -> Option<&SlotRecord> {
        self.slots[slot.as_usize()].as_ref()
    }

    /// Number of claimed slots
    pub fn len(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    /// True when no slot is claimed
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    /// Claimed records in ascending slot order
    pub fn records(&self) -> impl Iterator<Item = &SlotRecord> {
        self.slots.iter().flatten()
    }

    /// Number of erase records
    pub fn erase_count(&self) -> usize {
        self.records().filter(|r| r.is_erase()).count()
    }

    /// Number of load records
    pub fn load_count(&self) -> usize {
        self.records().filter(|r| !r.is_erase()).count()
    }

    /// Device memory used by queued samples
    pub fn sample_bytes(&self) -> usize {
        self.records().map(SlotRecord::byte_len).sum()
    }

    /// Consume the table into the batch handed to the encoder, ascending by slot
    pub fn into_records(self) -> Vec<SlotRecord> {
        self.slots.into_iter().flatten().collect()
    }
}
