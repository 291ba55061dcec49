//! In-memory view of the persisted dataset.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use chrono::{DateTime, Utc};

use premia_core::{FeatureRow, Instrument};

/// Rows unique on `(instrument, primary_timestamp)` and sorted by that key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dataset {
    rows: Vec<FeatureRow>,
}

/// Counters returned by [`Dataset::merge`] and `IncrementalStore::upsert`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpsertSummary {
    /// Keys that did not exist before.
    pub inserted: usize,
    /// Keys whose existing row was overwritten.
    pub replaced: usize,
    /// Dataset size after the merge.
    pub total: usize,
}

impl Dataset {
    /// Build from rows already known to be sorted and unique.
    pub(crate) const fn from_sorted(rows: Vec<FeatureRow>) -> Self {
        Self { rows }
    }

    /// All rows in key order.
    #[must_use]
    pub fn rows(&self) -> &[FeatureRow] {
        &self.rows
    }

    /// Consume into the sorted rows.
    #[must_use]
    pub fn into_rows(self) -> Vec<FeatureRow> {
        self.rows
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True for an empty (or absent) dataset.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows of one instrument, ascending by timestamp.
    #[must_use]
    pub fn instrument_rows(&self, instrument: &Instrument) -> &[FeatureRow] {
        let lo = self.rows.partition_point(|r| &r.instrument < instrument);
        let hi = self.rows.partition_point(|r| &r.instrument <= instrument);
        &self.rows[lo..hi]
    }

    /// Most recent row of one instrument.
    #[must_use]
    pub fn latest(&self, instrument: &Instrument) -> Option<&FeatureRow> {
        self.instrument_rows(instrument).last()
    }

    /// Row with the given key.
    #[must_use]
    pub fn get(&self, instrument: &Instrument, at: DateTime<Utc>) -> Option<&FeatureRow> {
        let rows = self.instrument_rows(instrument);
        rows.binary_search_by_key(&at, |r| r.primary_timestamp)
            .ok()
            .map(|i| &rows[i])
    }

    /// Distinct instruments in key order.
    pub fn instruments(&self) -> impl Iterator<Item = &Instrument> {
        let mut last: Option<&Instrument> = None;
        self.rows.iter().filter_map(move |r| {
            if last == Some(&r.instrument) {
                None
            } else {
                last = Some(&r.instrument);
                last
            }
        })
    }

    /// Merge `incoming` into this dataset, last write wins.
    ///
    /// Existing rows are inserted first and incoming rows after them in the
    /// order given, so a later occurrence of a key always replaces an earlier
    /// one. The result is sorted by key. Merging the same rows twice leaves
    /// the dataset unchanged.
    pub fn merge(&mut self, incoming: Vec<FeatureRow>) -> UpsertSummary {
        let mut keyed: BTreeMap<(Instrument, DateTime<Utc>), FeatureRow> = BTreeMap::new();
        for row in self.rows.drain(..) {
            keyed.insert((row.instrument.clone(), row.primary_timestamp), row);
        }
        let existing = keyed.len();
        let mut summary = UpsertSummary::default();
        for row in incoming {
            match keyed.entry((row.instrument.clone(), row.primary_timestamp)) {
                Entry::Vacant(v) => {
                    v.insert(row);
                    summary.inserted += 1;
                }
                Entry::Occupied(mut o) => {
                    o.insert(row);
                    summary.replaced += 1;
                }
            }
        }
        self.rows = keyed.into_values().collect();
        summary.total = self.rows.len();
        debug_assert_eq!(summary.total, existing + summary.inserted);
        summary
    }
}
