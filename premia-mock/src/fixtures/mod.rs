//! Slot-based candle generators.
//!
//! Slot `k` opens at `ANCHOR + 5k minutes`. Prices depend on `k` only, so a
//! slot fetched in two different cycles yields the same payload.

use chrono::{DateTime, TimeDelta, Utc};
use rust_decimal::Decimal;

pub mod binance;
pub mod upbit;

/// Length of one slot.
pub const SLOT: TimeDelta = TimeDelta::minutes(5);

/// Slots with `k % 10 == GAP_SLOT` are missing from the upbit fixture.
pub const GAP_SLOT: i64 = 7;
/// Slots with `k % 10 == MALFORMED_SLOT` carry an extra malformed upbit record.
pub const MALFORMED_SLOT: i64 = 3;
/// Slots with `k % 10 == DUPLICATE_SLOT` are delivered twice by binance.
pub const DUPLICATE_SLOT: i64 = 5;

/// 2024-01-01T00:00:00Z, the opening of slot 0.
#[must_use]
pub fn anchor() -> DateTime<Utc> {
    DateTime::from_timestamp(1_704_067_200, 0).unwrap_or_default()
}

/// Opening time of slot `k`.
#[must_use]
pub fn slot_time(k: i64) -> DateTime<Utc> {
    anchor() + TimeDelta::seconds(k * SLOT.num_seconds())
}

/// Slot containing `at`, rounded down.
#[must_use]
pub fn slot_of(at: DateTime<Utc>) -> i64 {
    (at - anchor()).num_seconds().div_euclid(SLOT.num_seconds())
}

/// Price path of one fixture instrument.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Market {
    pub base: &'static str,
    pub quote: &'static str,
    /// Secondary close at slot 0.
    pub start: i64,
    /// Secondary close increment per slot.
    pub step: i64,
    /// Primary premium over the secondary close at `k % 4 == 0`.
    pub premium: i64,
    /// Premium increment per `k % 4`.
    pub premium_step: i64,
}

pub(crate) const MARKETS: &[Market] = &[
    Market {
        base: "BTC",
        quote: "KRW",
        start: 50_000_000,
        step: 1_000,
        premium: 20_000,
        premium_step: 5_000,
    },
    Market {
        base: "ETH",
        quote: "KRW",
        start: 3_000_000,
        step: 100,
        premium: 1_000,
        premium_step: 250,
    },
];

/// Open, high, low, close around `close`.
pub(crate) struct Ohlc {
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
}

impl Market {
    pub(crate) fn find(base: &str, quote: &str) -> Option<&'static Self> {
        MARKETS.iter().find(|m| m.base == base && m.quote == quote)
    }

    pub(crate) fn secondary_close(&self, k: i64) -> i64 {
        self.start + self.step * k
    }

    pub(crate) fn primary_close(&self, k: i64) -> i64 {
        self.secondary_close(k) + self.premium + self.premium_step * k.rem_euclid(4)
    }

    pub(crate) fn ohlc(&self, close: i64) -> Ohlc {
        Ohlc {
            open: Decimal::from(close - self.step / 2),
            high: Decimal::from(close + self.step),
            low: Decimal::from(close - self.step),
            close: Decimal::from(close),
        }
    }
}

/// Base volume of slot `k`, three decimal places.
pub(crate) fn volume(k: i64) -> Decimal {
    Decimal::new(1_000 + (k * 37).rem_euclid(500), 3)
}
