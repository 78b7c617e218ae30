//! Compact run/lumi-section interval lists.
//!
//! A [`LumiList`] stores, per run, an ordered list of disjoint inclusive
//! `[first, last]` lumi ranges. Its JSON form is the usual lumi mask:
//!
//! ```text
//! {"1": [[10, 11], [15, 15]], "4": [[1, 20]]}
//! ```

use serde::{Deserialize, Serialize};
use serde_json::ser::Formatter;
use std::collections::BTreeMap;
use std::fmt;
use std::io;

use crate::errors::ClientError;

/// Inclusive lumi-section range.
pub type LumiRange = [u32; 2];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LumiList {
    runs: BTreeMap<u32, Vec<LumiRange>>,
}

impl LumiList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from (run, lumi) pairs in any order; duplicates are allowed.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (u32, u32)>,
    {
        let mut runs: BTreeMap<u32, Vec<LumiRange>> = BTreeMap::new();
        for (run, lumi) in pairs {
            runs.entry(run).or_default().push([lumi, lumi]);
        }
        for ranges in runs.values_mut() {
            merge_ranges(ranges);
        }
        Self { runs }
    }

    /// Parse a JSON lumi mask. Ranges may be unsorted or overlapping.
    pub fn from_json(json: &str) -> Result<Self, ClientError> {
        let mut list: LumiList = serde_json::from_str(json)
            .map_err(|e| ClientError::Client(format!("Invalid lumi mask: {}", e)))?;

        for (run, ranges) in list.runs.iter_mut() {
            if let Some([first, last]) = ranges.iter().find(|[first, last]| first > last) {
                return Err(ClientError::Client(format!(
                    "Invalid lumi mask: run {} has range [{}, {}]",
                    run, first, last
                )));
            }
            merge_ranges(ranges);
        }
        list.runs.retain(|_, ranges| !ranges.is_empty());
        Ok(list)
    }

    pub fn compact_list(&self) -> &BTreeMap<u32, Vec<LumiRange>> {
        &self.runs
    }

    pub fn runs(&self) -> Vec<u32> {
        self.runs.keys().copied().collect()
    }

    /// Every (run, lumi) pair, sorted.
    pub fn lumis(&self) -> Vec<(u32, u32)> {
        self.runs
            .iter()
            .flat_map(|(&run, ranges)| {
                ranges
                    .iter()
                    .flat_map(move |&[first, last]| (first..=last).map(move |lumi| (run, lumi)))
            })
            .collect()
    }

    pub fn contains(&self, run: u32, lumi: u32) -> bool {
        self.runs.get(&run).is_some_and(|ranges| {
            let idx = ranges.partition_point(|range| range[1] < lumi);
            ranges.get(idx).is_some_and(|range| range[0] <= lumi)
        })
    }

    /// Number of distinct lumi sections.
    pub fn len(&self) -> usize {
        self.runs
            .values()
            .flatten()
            .map(|[first, last]| (last - first) as usize + 1)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    pub fn to_json(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for LumiList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut buf = Vec::new();
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, MaskFormatter);
        self.serialize(&mut serializer).map_err(|_| fmt::Error)?;
        f.write_str(std::str::from_utf8(&buf).map_err(|_| fmt::Error)?)
    }
}

/// Compact JSON with a space after `,` and `:`, as lumi masks are
/// conventionally written.
struct MaskFormatter;

impl Formatter for MaskFormatter {
    fn begin_array_value<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        writer.write_all(b": ")
    }
}

/// Sort and coalesce overlapping or adjacent ranges in place.
fn merge_ranges(ranges: &mut Vec<LumiRange>) {
    ranges.sort_unstable();
    let mut merged: Vec<LumiRange> = Vec::with_capacity(ranges.len());
    for &[first, last] in ranges.iter() {
        match merged.last_mut() {
            Some(prev) if first <= prev[1].saturating_add(1) => {
                prev[1] = prev[1].max(last);
            }
            _ => merged.push([first, last]),
        }
    }
    *ranges = merged;
}
