//! Primary-venue payloads in the kline collector's shape: epoch-millisecond
//! `open_time`, decimal strings, `symbol` as `BASE_QUOTE`.

use premia_core::RawCandle;
use serde_json::json;

use super::{DUPLICATE_SLOT, Market, slot_time, volume};

/// Source tag carried on every record.
pub const SOURCE: &str = "Binance_spot";

fn record(m: &Market, k: i64, close: i64) -> RawCandle {
    let o = m.ohlc(close);
    let vol = volume(k);
    RawCandle::new()
        .with("symbol", format!("{}_{}", m.base, m.quote))
        .with("open_time", slot_time(k).timestamp_millis())
        .with("open", o.open.to_string())
        .with("high", o.high.to_string())
        .with("low", o.low.to_string())
        .with("close", o.close.to_string())
        .with("volume", vol.to_string())
        .with("quote_volume", (vol * o.close).to_string())
        .with("source", SOURCE)
        .with("trades", json!(100 + k))
}

/// Slots `from..to` of `m`. Duplicate slots are delivered twice, first with a
/// stale close one unit above the final one.
pub(crate) fn batch(m: &Market, from: i64, to: i64) -> Vec<RawCandle> {
    let mut out = Vec::new();
    for k in from..to {
        let close = m.primary_close(k);
        if k.rem_euclid(10) == DUPLICATE_SLOT {
            out.push(record(m, k, close + 1));
        }
        out.push(record(m, k, close));
    }
    out
}
