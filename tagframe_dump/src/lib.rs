//! Walks a tagframe stream using nothing but its type tags, and accounts for every byte.

use anyhow::{anyhow, Result};
use itertools::Itertools;
use shorthand::ShortHand;
use std::fmt;

mod walk;

pub use walk::*;

/// Field counts per category, and where the stream's bytes went.
///
/// Field headers, string length prefixes, array headers and frame-end markers are all overhead.
#[derive(ShortHand, Default, Clone, PartialEq, Eq, Debug)]
#[shorthand(disable(set))]
pub struct DumpStats {
    objects: usize,
    arrays: usize,
    array_elements: usize,
    numbers: usize,
    strings: usize,
    nulls: usize,
    booleans: usize,
    /// Fields that fit no category. Always zero for a stream that could be walked at all.
    other: usize,

    fixed_bytes: usize,
    string_bytes: usize,
    overhead_bytes: usize,
    /// Objects nested deeper than the walk was allowed to go.
    skipped_bytes: usize,
    total_bytes: usize,
}

impl DumpStats {
    pub fn fields(&self) -> usize {
        self.objects + self.arrays + self.numbers + self.strings + self.nulls + self.booleans
            + self.other
    }

    pub fn accounted_bytes(&self) -> usize {
        self.fixed_bytes + self.string_bytes + self.overhead_bytes + self.skipped_bytes
    }

    /// Every field was classified and every byte was accounted for.
    pub fn verify(&self) -> Result<()> {
        if self.other != 0 {
            return Err(anyhow!("{} fields fit no category", self.other));
        }
        if self.accounted_bytes() != self.total_bytes {
            return Err(anyhow!(
                "accounted for {} of {} bytes",
                self.accounted_bytes(),
                self.total_bytes
            ));
        }
        Ok(())
    }
}

impl fmt::Display for DumpStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rows = [
            ("objects", self.objects),
            ("arrays", self.arrays),
            ("array elements", self.array_elements),
            ("numbers", self.numbers),
            ("strings", self.strings),
            ("nulls", self.nulls),
            ("booleans", self.booleans),
            ("other", self.other),
            ("fixed bytes", self.fixed_bytes),
            ("string bytes", self.string_bytes),
            ("overhead bytes", self.overhead_bytes),
            ("skipped bytes", self.skipped_bytes),
            ("total bytes", self.total_bytes),
        ];
        let report = rows
            .iter()
            .map(|(label, n)| format!("{label:<16}{n:>12}"))
            .join("\n");
        write!(f, "{report}")
    }
}
