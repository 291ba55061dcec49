//! Feature Calculator: premium spread plus causal rolling statistics.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::record::{FeatureRow, Instrument, MatchedPair};
use crate::timeseries::rolling::{Observation, Overflow, RollingState};
use premia_types::{PremiaError, WindowSet};

/// Rows and row-level errors for one instrument.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeatureBatch {
    /// One row per successfully computed pair, ascending by timestamp.
    pub rows: Vec<FeatureRow>,
    /// One `Computation` error per dropped row.
    pub errors: Vec<PremiaError>,
}

/// Computes `FeatureRow`s for one instrument at a time.
#[derive(Debug, Clone, Copy)]
pub struct FeatureCalculator<'a> {
    windows: &'a WindowSet,
    scale: u32,
}

enum Sample<'a> {
    History(&'a FeatureRow),
    Pair(&'a MatchedPair),
}

impl<'a> FeatureCalculator<'a> {
    /// Calculator for the given windows; percentages and means are rounded to
    /// `scale` decimal places.
    #[must_use]
    pub const fn new(windows: &'a WindowSet, scale: u32) -> Self {
        Self { windows, scale }
    }

    /// `primary_close - secondary_close` and its percentage of the secondary
    /// close. The percentage is `None` when the secondary close is zero.
    ///
    /// # Errors
    /// Returns `Overflow` when the arithmetic leaves the `Decimal` range.
    pub fn premium(
        &self,
        primary_close: Decimal,
        secondary_close: Decimal,
    ) -> Result<(Decimal, Option<Decimal>), Overflow> {
        let diff = primary_close.checked_sub(secondary_close).ok_or(Overflow)?;
        if secondary_close.is_zero() {
            return Ok((diff, None));
        }
        let pct = diff
            .checked_mul(Decimal::ONE_HUNDRED)
            .and_then(|x| x.checked_div(secondary_close))
            .ok_or(Overflow)?
            .round_dp(self.scale)
            .normalize();
        Ok((diff, Some(pct)))
    }

    /// Compute one row per pair of `instrument`.
    ///
    /// `history` holds the persisted rows of the same instrument (any order).
    /// It is replayed as warm-up so the trailing windows of the first pairs
    /// are filled: the last `max(windows)` rows before the first pair, plus
    /// any persisted rows that fall between pairs of this batch. A pair
    /// replaces the persisted row with the same timestamp. Persisted rows
    /// after the last pair are never read, which keeps every row causal.
    ///
    /// Only pairs produce output rows; history is never re-emitted. A row
    /// whose arithmetic overflows is dropped with a `Computation` error and
    /// does not enter the rolling state.
    #[must_use]
    pub fn compute(
        &self,
        instrument: &Instrument,
        history: &[FeatureRow],
        pairs: &[MatchedPair],
    ) -> FeatureBatch {
        let mut out = FeatureBatch::default();
        let mut state = RollingState::new(self.windows, self.scale);

        for sample in self.samples(instrument, history, pairs) {
            match sample {
                Sample::History(row) => {
                    let obs = Observation {
                        diff: row.premium_diff,
                        pct: row.premium_pct,
                        primary_volume: row.primary_volume,
                        secondary_volume: row.secondary_volume,
                    };
                    if state.push(obs).is_err() {
                        #[cfg(feature = "tracing")]
                        tracing::warn!(
                            instrument = %instrument,
                            ts = %row.primary_timestamp,
                            "skipping persisted row that overflows rolling sums"
                        );
                    }
                }
                Sample::Pair(pair) => match self.row_for(&mut state, pair) {
                    Ok(row) => out.rows.push(row),
                    Err(Overflow) => {
                        let err = PremiaError::computation(
                            instrument.as_str(),
                            pair.primary_timestamp.to_rfc3339(),
                            Overflow.to_string(),
                        );
                        #[cfg(feature = "tracing")]
                        tracing::warn!(error = %err, "dropping feature row");
                        out.errors.push(err);
                    }
                },
            }
        }
        out
    }

    fn samples<'s>(
        &self,
        instrument: &Instrument,
        history: &'s [FeatureRow],
        pairs: &'s [MatchedPair],
    ) -> Vec<Sample<'s>> {
        let mut by_ts: BTreeMap<DateTime<Utc>, Sample<'s>> = BTreeMap::new();
        for p in pairs.iter().filter(|p| &p.instrument == instrument) {
            by_ts.entry(p.primary_timestamp).or_insert(Sample::Pair(p));
        }
        let (Some(&first), Some(&last)) = (by_ts.keys().next(), by_ts.keys().next_back()) else {
            return Vec::new();
        };

        let mut warmup: Vec<&FeatureRow> = history
            .iter()
            .filter(|r| &r.instrument == instrument && r.primary_timestamp < first)
            .collect();
        warmup.sort_by_key(|r| r.primary_timestamp);
        let skip = warmup.len().saturating_sub(self.windows.max());
        for r in warmup.into_iter().skip(skip) {
            by_ts.insert(r.primary_timestamp, Sample::History(r));
        }

        for r in history.iter().filter(|r| {
            &r.instrument == instrument && r.primary_timestamp > first && r.primary_timestamp < last
        }) {
            by_ts.entry(r.primary_timestamp).or_insert(Sample::History(r));
        }
        by_ts.into_values().collect()
    }

    fn row_for(
        &self,
        state: &mut RollingState,
        pair: &MatchedPair,
    ) -> Result<FeatureRow, Overflow> {
        let p = &pair.primary_candle;
        let s = &pair.secondary_candle;
        let (premium_diff, premium_pct) = self.premium(p.close, s.close)?;
        let windows = state.push(Observation {
            diff: premium_diff,
            pct: premium_pct,
            primary_volume: p.volume,
            secondary_volume: s.volume,
        })?;
        Ok(FeatureRow {
            instrument: pair.instrument.clone(),
            primary_timestamp: pair.primary_timestamp,
            secondary_timestamp: pair.secondary_timestamp,
            time_offset_ms: pair.time_offset.num_milliseconds(),
            primary_source: p.source.clone(),
            secondary_source: s.source.clone(),
            primary_close: p.close,
            secondary_close: s.close,
            premium_diff,
            premium_pct,
            primary_volume: p.volume,
            secondary_volume: s.volume,
            primary_quote_volume: p.quote_volume,
            secondary_quote_volume: s.quote_volume,
            windows,
        })
    }
}
