#![allow(dead_code)]

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use premia_core::{FeatureRow, Instrument, WindowFeatures, WindowSet};
use rust_decimal::Decimal;

pub fn windows() -> WindowSet {
    WindowSet::new(vec![3, 12]).unwrap()
}

pub fn t(minute: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + TimeDelta::minutes(minute)
}

/// Row whose values are derived from `tag` so different writes are distinguishable.
pub fn row(instrument: &str, minute: i64, tag: i64) -> FeatureRow {
    let diff = Decimal::from(tag);
    FeatureRow {
        instrument: Instrument::parse(instrument).unwrap(),
        primary_timestamp: t(minute),
        secondary_timestamp: t(minute) - TimeDelta::seconds(60),
        time_offset_ms: -60_000,
        primary_source: Some("Binance_spot".into()),
        secondary_source: None,
        primary_close: Decimal::new(100_000 + tag, 3),
        secondary_close: Decimal::from(100),
        premium_diff: diff,
        premium_pct: if tag % 2 == 0 { Some(Decimal::new(tag, 2)) } else { None },
        primary_volume: Decimal::new(15, 1),
        secondary_volume: Decimal::ZERO,
        primary_quote_volume: None,
        secondary_quote_volume: Some(Decimal::new(12345, 4)),
        windows: windows()
            .sizes()
            .iter()
            .map(|&w| WindowFeatures {
                window: w,
                avg_diff: diff,
                avg_pct: None,
                deviation_diff: Decimal::ZERO,
                deviation_pct: None,
                primary_volume_sum: Decimal::from(w as i64),
                secondary_volume_sum: Decimal::new(-5, 1),
            })
            .collect(),
    }
}
