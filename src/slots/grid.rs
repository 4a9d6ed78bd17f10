//! 10x10 slot map printed for operator feedback

use std::fmt;

use super::{SlotIndex, SlotRecord, SlotTable};

const RESET: &str = "\x1b[0m";
const RED: &str = "\x1b[31m";
const GREEN: &str = "\x1b[32m";
const BORDER: &str = "+----------------------------------------+";

/// Printable view of a [`SlotTable`]
///
/// Marked slots render as `[NN]` (red for erase, green for load), free slots
/// as ` NN `. Row `r`, column `c` holds slot `r * 10 + c`.
pub struct SlotGrid<'a> {
    table: &'a SlotTable,
    color: bool,
}

impl<'a> SlotGrid<'a> {
    /// Colored grid for `table`
    pub fn new(table: &'a SlotTable) -> Self {
        Self { table, color: true }
    }

    /// Toggle ANSI colors
    pub fn color(mut self, enabled: bool) -> Self {
        self.color = enabled;
        self
    }
}

impl fmt::Display for SlotGrid<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", BORDER)?;
        for row in SlotIndex::all().collect::<Vec<_>>().chunks(10) {
            f.write_str("|")?;
            for &slot in row {
                let color = match self.table.get(slot) {
                    None => {
                        write!(f, " {} ", slot)?;
                        continue;
                    }
                    Some(SlotRecord::Erase(_)) => RED,
                    Some(SlotRecord::Load { .. }) => GREEN,
                };
                if self.color {
                    write!(f, "{}[{}]{}", color, slot, RESET)?;
                } else {
                    write!(f, "[{}]", slot)?;
                }
            }
            writeln!(f, "|")?;
        }
        writeln!(f, "{}", BORDER)
    }
}
