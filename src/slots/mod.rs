//! Slot Table Domain
//!
//! The Volca Sample addresses its sample memory through 100 fixed slots.
//! This module models slot numbers, the erase/load records handed to the
//! encoder, the argument grammar that selects slots, and the table that
//! collects one record per slot for a single run.

pub mod grid;
pub mod selector;
pub mod table;

use std::fmt;

use serde::Serialize;

use crate::pcm::NormalizedSample;
use crate::{Result, VolcaError};

pub use grid::SlotGrid;
pub use selector::{parse_selection, slot_from_filename, SlotSelection};
pub use table::{ConflictPolicy, SlotTable};

/// One of the 100 sample slots (0..=99)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct SlotIndex(u8);

impl SlotIndex {
    /// Number of slots on the device
    pub const COUNT: usize = 100;

    /// Validate a slot number
    pub fn new(number: i64) -> Result<Self> {
        if (0..Self::COUNT as i64).contains(&number) {
            Ok(SlotIndex(number as u8))
        } else {
            Err(VolcaError::InvalidSlotIndex(number))
        }
    }

    /// Slot number as an integer
    pub fn get(self) -> u8 {
        self.0
    }

    /// Position in a 100-entry table
    pub fn as_usize(self) -> usize {
        usize::from(self.0)
    }

    /// All slots in ascending order
    pub fn all() -> impl Iterator<Item = SlotIndex> {
        (0..Self::COUNT as u8).map(SlotIndex)
    }
}

impl fmt::Display for SlotIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}", self.0)
    }
}

/// How a loaded sample is stored on the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum SampleEncoding {
    /// Uncompressed 16-bit
    #[default]
    Linear,
    /// Lossy compression to `bits` bits per sample (8..=16)
    Compressed {
        /// Bits kept per sample
        bits: u8,
    },
}

impl SampleEncoding {
    /// Smallest accepted compression depth
    pub const MIN_COMPRESSED_BITS: u8 = 8;
    /// Largest accepted compression depth
    pub const MAX_COMPRESSED_BITS: u8 = 16;

    /// Compressed encoding with a validated bit depth
    pub fn compressed(bits: u8) -> Result<Self> {
        if (Self::MIN_COMPRESSED_BITS..=Self::MAX_COMPRESSED_BITS).contains(&bits) {
            Ok(SampleEncoding::Compressed { bits })
        } else {
            Err(VolcaError::InvalidArgumentSyntax(format!(
                "compression depth {} (supported: {}-{})",
                bits,
                Self::MIN_COMPRESSED_BITS,
                Self::MAX_COMPRESSED_BITS
            )))
        }
    }
}

/// Unit of work submitted to the encoder
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotRecord {
    /// Clear a slot
    Erase(SlotIndex),
    /// Write a sample into its slot
    Load {
        /// Normalized sample, owning its frames
        sample: NormalizedSample,
        /// Storage encoding on the device
        encoding: SampleEncoding,
    },
}

impl SlotRecord {
    /// Slot this record targets
    pub fn slot(&self) -> SlotIndex {
        match self {
            SlotRecord::Erase(slot) => *slot,
            SlotRecord::Load { sample, .. } => sample.slot,
        }
    }

    /// True for erase records
    pub fn is_erase(&self) -> bool {
        matches!(self, SlotRecord::Erase(_))
    }

    /// Sample memory used on the device (0 for erase)
    pub fn byte_len(&self) -> usize {
        match self {
            SlotRecord::Erase(_) => 0,
            SlotRecord::Load { sample, .. } => sample.byte_len(),
        }
    }
}
