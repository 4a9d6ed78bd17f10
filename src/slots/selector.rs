//! Slot selection grammar
//!
//! Erase arguments are a slot number `n` or an interval `n1-n2` (either
//! order). Sample files carry their slot as a decimal prefix of the file
//! name, e.g. `07-kick.wav` or `3_hat.wav`.

use std::ops::RangeInclusive;
use std::path::Path;

use nom::character::complete::{char, digit1, one_of};
use nom::combinator::{all_consuming, opt, recognize};
use nom::sequence::{pair, preceded};
use nom::IResult;

use super::SlotIndex;
use crate::{Result, VolcaError};

/// Parsed erase argument
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotSelection {
    /// A single slot
    Single(SlotIndex),
    /// Every slot between two endpoints, inclusive
    Range(SlotIndex, SlotIndex),
}

impl SlotSelection {
    /// Selected slots in ascending order
    pub fn slots(&self) -> impl Iterator<Item = SlotIndex> {
        let range: RangeInclusive<u8> = match *self {
            SlotSelection::Single(slot) => slot.get()..=slot.get(),
            SlotSelection::Range(a, b) => a.get().min(b.get())..=a.get().max(b.get()),
        };
        range.filter_map(|n| SlotIndex::new(i64::from(n)).ok())
    }
}

/// Optionally signed decimal integer
fn integer(input: &str) -> IResult<&str, &str> {
    recognize(pair(opt(one_of("+-")), digit1))(input)
}

/// `n` or `n-m`
fn selection(input: &str) -> IResult<&str, (&str, Option<&str>)> {
    all_consuming(pair(integer, opt(preceded(char('-'), integer))))(input)
}

/// Numbers too long for `i64` are clamped so they still report as out of range
fn to_number(text: &str) -> i64 {
    text.parse().unwrap_or(if text.starts_with('-') {
        i64::MIN
    } else {
        i64::MAX
    })
}

/// Parse one erase argument
///
/// Arguments that are not `n` / `n1-n2` fail with `InvalidArgumentSyntax`;
/// well-formed numbers outside 0..=99 fail with `InvalidSlotIndex`.
pub fn parse_selection(arg: &str) -> Result<SlotSelection> {
    let (_, (first, second)) = selection(arg.trim())
        .map_err(|_| VolcaError::InvalidArgumentSyntax(arg.to_string()))?;

    let first = SlotIndex::new(to_number(first))?;
    match second {
        None => Ok(SlotSelection::Single(first)),
        Some(second) => Ok(SlotSelection::Range(first, SlotIndex::new(to_number(second))?)),
    }
}

/// Slot number encoded as the leading integer of a sample's file name
pub fn slot_from_filename(path: &Path) -> Result<SlotIndex> {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy())
        .unwrap_or_default();

    let (_, number) = integer(&name).map_err(|_| {
        VolcaError::InvalidArgumentSyntax(format!("can't parse sample number from '{}'", name))
    })?;

    SlotIndex::new(to_number(number))
}
