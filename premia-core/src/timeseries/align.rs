//! Cross-Source Matcher: nearest-neighbour pairing under a timestamp tolerance.

use chrono::{DateTime, TimeDelta, Utc};

use crate::record::{CandleRecord, Instrument, MatchedPair};
use premia_types::MatchGap;

/// Pairs and gaps produced for one instrument.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchOutcome {
    /// At most one pair per primary timestamp, ascending.
    pub pairs: Vec<MatchedPair>,
    /// Primary timestamps with no secondary record within tolerance.
    pub gaps: Vec<MatchGap>,
}

/// Pair every primary record with the nearest secondary record within
/// `tolerance` (inclusive).
///
/// Behavior and trade-offs:
/// - Both inputs are ordered by timestamp with a stable sort first, so
///   already-sorted input keeps its index order and the scan stays linear.
/// - For each primary timestamp the candidates are the last secondary strictly
///   before it and the first secondary at or after it. The smaller absolute
///   offset wins; on equal offsets the earlier secondary timestamp wins; among
///   secondaries sharing a timestamp the smallest input index wins.
/// - A secondary record may serve several primaries. Repeated primary
///   timestamps yield only one pair (the first occurrence).
/// - Records of other instruments are ignored.
/// - Empty secondary input yields gaps only, never an error.
#[must_use]
pub fn match_nearest(
    instrument: &Instrument,
    primary: &[CandleRecord],
    secondary: &[CandleRecord],
    tolerance: TimeDelta,
) -> MatchOutcome {
    let primary = sorted_for(instrument, primary);
    let secondary = sorted_for(instrument, secondary);
    let sec_ts: Vec<DateTime<Utc>> = secondary.iter().map(|r| r.timestamp).collect();

    // run_start[k]: first sorted position sharing sec_ts[k]
    let mut run_start = Vec::with_capacity(sec_ts.len());
    for k in 0..sec_ts.len() {
        if k > 0 && sec_ts[k] == sec_ts[k - 1] {
            run_start.push(run_start[k - 1]);
        } else {
            run_start.push(k);
        }
    }

    let tolerance = tolerance.abs();
    let mut out = MatchOutcome::default();
    let mut j = 0usize;
    let mut last_key: Option<DateTime<Utc>> = None;

    for p in primary {
        if last_key == Some(p.timestamp) {
            continue;
        }
        last_key = Some(p.timestamp);

        while j < sec_ts.len() && sec_ts[j] < p.timestamp {
            j += 1;
        }
        let before = j.checked_sub(1).map(|k| run_start[k]);
        let after = (j < sec_ts.len()).then_some(j);

        let nearest = match (before, after) {
            (Some(b), Some(a)) => {
                let db = p.timestamp - sec_ts[b];
                let da = sec_ts[a] - p.timestamp;
                Some(if db <= da { b } else { a })
            }
            (Some(b), None) => Some(b),
            (None, Some(a)) => Some(a),
            (None, None) => None,
        };

        match nearest {
            Some(k) if (sec_ts[k] - p.timestamp).abs() <= tolerance => {
                let s = secondary[k];
                out.pairs.push(MatchedPair {
                    instrument: instrument.clone(),
                    primary_timestamp: p.timestamp,
                    secondary_timestamp: s.timestamp,
                    primary_candle: p.clone(),
                    secondary_candle: s.clone(),
                    time_offset: s.timestamp - p.timestamp,
                });
            }
            _ => {
                let nearest_offset_ms =
                    nearest.map(|k| (sec_ts[k] - p.timestamp).num_milliseconds());
                #[cfg(feature = "tracing")]
                tracing::info!(
                    instrument = %instrument,
                    primary_ts = %p.timestamp,
                    nearest_offset_ms = ?nearest_offset_ms,
                    "no secondary record within tolerance"
                );
                out.gaps.push(MatchGap {
                    instrument: instrument.to_string(),
                    primary_timestamp: p.timestamp,
                    nearest_offset_ms,
                });
            }
        }
    }
    out
}

fn sorted_for<'a>(instrument: &Instrument, records: &'a [CandleRecord]) -> Vec<&'a CandleRecord> {
    let mut v: Vec<&CandleRecord> = records
        .iter()
        .filter(|r| &r.instrument == instrument)
        .collect();
    v.sort_by_key(|r| r.timestamp);
    v
}
