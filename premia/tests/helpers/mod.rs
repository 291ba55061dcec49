#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use premia::{Instrument, RawCandle, Reconciler, ReconcilerBuilder, VenueSchema};
use premia_mock::{binance_schema, upbit_schema};
use tempfile::TempDir;

pub fn dt(hh: u32, mm: u32, ss: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, hh, mm, ss).unwrap()
}

pub fn inst(s: &str) -> Instrument {
    Instrument::parse(s).unwrap()
}

/// Canonical-field payload with a flat candle at `close`.
pub fn raw(instrument: &str, at: DateTime<Utc>, close: i64) -> RawCandle {
    RawCandle::new()
        .with("instrument", instrument)
        .with("timestamp", at.to_rfc3339())
        .with("open", close.to_string())
        .with("high", close.to_string())
        .with("low", close.to_string())
        .with("close", close.to_string())
        .with("volume", "1")
}

/// Builder over a dataset in `dir`; the secondary venue has no grid so
/// skewed timestamps are accepted.
pub fn builder(dir: &TempDir) -> ReconcilerBuilder {
    Reconciler::builder()
        .primary(VenueSchema::new("primary"))
        .secondary(VenueSchema::new("secondary").with_grid(None))
        .windows(&[3, 12])
        .dataset_path(dir.path().join("combined_candles.csv"))
}

/// Reconciler configured for the fixture sources.
pub fn fixture_reconciler(dir: &TempDir) -> Reconciler {
    Reconciler::builder()
        .primary(binance_schema())
        .secondary(upbit_schema())
        .windows(&[3, 12])
        .dataset_path(dir.path().join("combined_candles.csv"))
        .build()
        .unwrap()
}

pub fn dataset_bytes(r: &Reconciler) -> Option<Vec<u8>> {
    std::fs::read(r.store().path()).ok()
}
