//! Secondary-venue payloads in the REST collector's shape: naive UTC
//! `candle_date_time_utc` one minute before the slot opens, float prices,
//! `market` as `BASE-QUOTE`, plus a last-trade `timestamp` in milliseconds.
//!
//! The `timestamp` field collides with the canonical field name, so the
//! schema returned by [`schema`](crate::upbit_schema) drops that alias.

use chrono::TimeDelta;
use premia_core::RawCandle;
use rust_decimal::prelude::ToPrimitive;

use super::{GAP_SLOT, MALFORMED_SLOT, Market, slot_time, volume};

/// Source tag carried on every record.
pub const SOURCE: &str = "Upbit";

/// How early the venue stamps its candles relative to the slot grid.
pub const SKEW: TimeDelta = TimeDelta::minutes(1);

fn stamp(k: i64) -> String {
    (slot_time(k) - SKEW)
        .format("%Y-%m-%dT%H:%M:%S")
        .to_string()
}

fn record(m: &Market, k: i64) -> RawCandle {
    let o = m.ohlc(m.secondary_close(k));
    let vol = volume(k) * rust_decimal::Decimal::from(3);
    let f = |d: rust_decimal::Decimal| d.to_f64().unwrap_or_default();
    RawCandle::new()
        .with("market", format!("{}-{}", m.base, m.quote))
        .with("candle_date_time_utc", stamp(k))
        .with("opening_price", f(o.open))
        .with("high_price", f(o.high))
        .with("low_price", f(o.low))
        .with("trade_price", f(o.close))
        .with("candle_acc_trade_volume", f(vol))
        .with("candle_acc_trade_price", f(vol * o.close))
        .with("timestamp", (slot_time(k) + TimeDelta::seconds(299)).timestamp_millis())
        .with("unit", 5)
        .with("source", SOURCE)
}

/// Slots `from..to` of `m`. Gap slots are absent; malformed slots are
/// preceded by a record whose `trade_price` is not a number.
pub(crate) fn batch(m: &Market, from: i64, to: i64) -> Vec<RawCandle> {
    let mut out = Vec::new();
    for k in from..to {
        match k.rem_euclid(10) {
            GAP_SLOT => continue,
            MALFORMED_SLOT => out.push(record(m, k).with("trade_price", "n/a")),
            _ => {}
        }
        out.push(record(m, k));
    }
    out
}
