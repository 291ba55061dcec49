//! Per-cycle summary produced by the reconciliation driver.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::PremiaError;

/// Normalization counters for one venue batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct VenueCounts {
    /// Raw payloads received from the collaborator.
    pub received: usize,
    /// Records that passed normalization (after duplicate collapse).
    pub normalized: usize,
    /// Payloads dropped with a schema error.
    pub rejected: usize,
    /// Earlier duplicates of `(instrument, timestamp)` replaced by a later
    /// occurrence in the same batch.
    pub duplicates_collapsed: usize,
}

/// A primary record for which no secondary record lay within tolerance.
///
/// Informational only; the primary timestamp simply has no output row in
/// this cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchGap {
    /// Canonical instrument (`BASE/QUOTE`).
    pub instrument: String,
    /// Timestamp of the unmatched primary record.
    pub primary_timestamp: DateTime<Utc>,
    /// Signed offset in milliseconds to the nearest secondary record, if the
    /// instrument had any secondary records at all.
    pub nearest_offset_ms: Option<i64>,
}

/// Summary of one reconciliation cycle.
///
/// Record-level failures (schema errors, dropped rows) are listed in
/// `warnings`; a cycle that returns a report always persisted its rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CycleReport {
    /// Primary batch counters.
    pub primary: VenueCounts,
    /// Secondary batch counters.
    pub secondary: VenueCounts,
    /// Number of matched pairs across all instruments.
    pub pairs_matched: usize,
    /// Primary records left without a partner.
    pub match_gaps: Vec<MatchGap>,
    /// Feature rows produced.
    pub rows_computed: usize,
    /// Rows dropped with a computation error.
    pub rows_dropped: usize,
    /// Rows handed to the store.
    pub rows_upserted: usize,
    /// Dataset size after the write.
    pub dataset_rows: usize,
    /// Non-fatal issues encountered during the cycle.
    pub warnings: Vec<PremiaError>,
}

impl CycleReport {
    /// Total schema errors across both venues.
    #[must_use]
    pub const fn schema_failures(&self) -> usize {
        self.primary.rejected + self.secondary.rejected
    }

    /// Total records normalized across both venues.
    #[must_use]
    pub const fn records_normalized(&self) -> usize {
        self.primary.normalized + self.secondary.normalized
    }
}
