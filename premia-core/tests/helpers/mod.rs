#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use premia_core::{CandleRecord, Instrument, MatchedPair, Venue};
use rust_decimal::Decimal;

pub fn dt(y: i32, m: u32, d: u32, hh: u32, mm: u32, ss: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, hh, mm, ss).unwrap()
}

pub fn ts(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap()
}

pub fn inst(s: &str) -> Instrument {
    Instrument::parse(s).unwrap()
}

pub fn candle(instrument: &str, venue: Venue, at: DateTime<Utc>, close: Decimal) -> CandleRecord {
    CandleRecord {
        instrument: inst(instrument),
        venue,
        timestamp: at,
        open: close,
        high: close,
        low: close,
        close,
        volume: Decimal::ONE,
        quote_volume: None,
        source: None,
    }
}

/// A pair whose primary and secondary share `at`.
pub fn pair(
    instrument: &str,
    at: DateTime<Utc>,
    primary_close: Decimal,
    secondary_close: Decimal,
) -> MatchedPair {
    let p = candle(instrument, Venue::Primary, at, primary_close);
    let s = candle(instrument, Venue::Secondary, at, secondary_close);
    MatchedPair {
        instrument: inst(instrument),
        primary_timestamp: at,
        secondary_timestamp: at,
        primary_candle: p,
        secondary_candle: s,
        time_offset: chrono::TimeDelta::zero(),
    }
}

/// Pairs whose premium_diff equals each entry of `diffs` (secondary close 100).
pub fn pairs_with_diffs(instrument: &str, start: DateTime<Utc>, diffs: &[i64]) -> Vec<MatchedPair> {
    diffs
        .iter()
        .enumerate()
        .map(|(i, d)| {
            let at = start + chrono::TimeDelta::minutes(5 * i as i64);
            pair(instrument, at, Decimal::from(100 + d), Decimal::from(100))
        })
        .collect()
}
