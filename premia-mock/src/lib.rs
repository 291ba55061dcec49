//! Deterministic candle sources for tests and demos.
//!
//! `MockSource` serves generated fixtures shaped like the two venues'
//! collector output; `DynamicMockSource` serves whatever a test scripts.
#![warn(missing_docs)]

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use premia_core::{CandleSource, Instrument, PremiaError, RawCandle, VenueSchema};

mod dynamic;
pub mod fixtures;

pub use dynamic::{DynamicMockController, DynamicMockSource, MockBehavior};

use fixtures::{MARKETS, Market};

/// Schema matching the binance fixture: default aliases, 5-minute grid.
#[must_use]
pub fn binance_schema() -> VenueSchema {
    VenueSchema::new("binance")
}

/// Schema matching the upbit fixture: one-minute grid (the venue stamps
/// candles off the 5-minute boundary) and no `timestamp` alias, since that
/// field holds the last trade time.
#[must_use]
pub fn upbit_schema() -> VenueSchema {
    VenueSchema::new("upbit")
        .with_grid(Some(Duration::from_secs(60)))
        .without_alias("timestamp")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Style {
    Binance,
    Upbit,
}

/// Fixture-backed source for CI-safe demos.
///
/// Serves slots `[from, to)` of the fixture grid (see [`fixtures`]) for the
/// fixture instruments `BTC/KRW` and `ETH/KRW`. Other instruments yield no
/// records; any `FAIL/*` instrument fails the whole fetch.
#[derive(Debug, Clone)]
pub struct MockSource {
    style: Style,
    from: i64,
    to: i64,
}

impl MockSource {
    /// Primary-venue fixture covering slots `0..12` (the first hour).
    #[must_use]
    pub const fn binance() -> Self {
        Self {
            style: Style::Binance,
            from: 0,
            to: 12,
        }
    }

    /// Secondary-venue fixture covering slots `0..12` (the first hour).
    #[must_use]
    pub const fn upbit() -> Self {
        Self {
            style: Style::Upbit,
            from: 0,
            to: 12,
        }
    }

    /// Serve slots `[from, to)` instead.
    #[must_use]
    pub const fn slots(mut self, from: i64, to: i64) -> Self {
        self.from = from;
        self.to = to;
        self
    }

    /// Serve the slots whose opening times fall in `[start, end)`.
    #[must_use]
    pub fn between(self, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        let ceil = |t: DateTime<Utc>| {
            let k = fixtures::slot_of(t);
            if fixtures::slot_time(k) < t { k + 1 } else { k }
        };
        self.slots(ceil(start), ceil(end))
    }

    fn markets(instruments: &[Instrument]) -> Result<Vec<&'static Market>, PremiaError> {
        if let Some(bad) = instruments.iter().find(|i| i.base() == "FAIL") {
            return Err(PremiaError::Other(format!("forced failure: {bad}")));
        }
        if instruments.is_empty() {
            return Ok(MARKETS.iter().collect());
        }
        Ok(instruments
            .iter()
            .filter_map(|i| Market::find(i.base(), i.quote()))
            .collect())
    }
}

#[async_trait]
impl CandleSource for MockSource {
    fn venue_name(&self) -> &str {
        match self.style {
            Style::Binance => "binance",
            Style::Upbit => "upbit",
        }
    }

    async fn fetch_batch(&self, instruments: &[Instrument]) -> Result<Vec<RawCandle>, PremiaError> {
        let mut out = Vec::new();
        for m in Self::markets(instruments)? {
            out.extend(match self.style {
                Style::Binance => fixtures::binance::batch(m, self.from, self.to),
                Style::Upbit => fixtures::upbit::batch(m, self.from, self.to),
            });
        }
        Ok(out)
    }
}
