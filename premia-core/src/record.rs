//! Domain records flowing through one reconciliation cycle.

use core::fmt;
use std::str::FromStr;

use chrono::{DateTime, TimeDelta, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use premia_types::Venue;

/// Canonical `BASE/QUOTE` instrument identifier.
///
/// Parsing trims, upper-cases, and accepts `/`, `-` or `_` as the single
/// separator; both legs must be non-empty ASCII alphanumerics. Ordering is the
/// ordering of the canonical string, which is also the dataset sort order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Instrument(String);

impl Instrument {
    /// Parse and canonicalize an instrument string.
    ///
    /// # Errors
    /// Returns a human-readable reason when the string has no separator, more
    /// than one separator, an empty leg, or a non-alphanumeric character.
    pub fn parse(raw: &str) -> Result<Self, String> {
        let upper = raw.trim().to_ascii_uppercase();
        let mut legs = upper.split(['/', '-', '_']);
        let (Some(base), Some(quote), None) = (legs.next(), legs.next(), legs.next()) else {
            return Err("expected exactly one of '/', '-' or '_' between base and quote".into());
        };
        if base.is_empty() || quote.is_empty() {
            return Err("base and quote must be non-empty".into());
        }
        if !base
            .chars()
            .chain(quote.chars())
            .all(|c| c.is_ascii_alphanumeric())
        {
            return Err("base and quote must be ASCII alphanumeric".into());
        }
        Ok(Self(format!("{base}/{quote}")))
    }

    /// Canonical `BASE/QUOTE` string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Base leg (`BTC` in `BTC/USDT`).
    #[must_use]
    pub fn base(&self) -> &str {
        self.0.split_once('/').map_or(self.0.as_str(), |(b, _)| b)
    }

    /// Quote leg (`USDT` in `BTC/USDT`).
    #[must_use]
    pub fn quote(&self) -> &str {
        self.0.split_once('/').map_or("", |(_, q)| q)
    }
}

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Instrument {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Instrument {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<Instrument> for String {
    fn from(i: Instrument) -> Self {
        i.0
    }
}

/// A raw venue payload: an untyped map from field name to JSON value.
///
/// Field names are kept exactly as delivered; the normalizer applies the
/// venue's alias table.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawCandle(Map<String, Value>);

impl RawCandle {
    /// Empty payload.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON object.
    ///
    /// # Errors
    /// Returns the `serde_json` error when the text is not a JSON object.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Insert or replace a field.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    /// Remove a field, returning its value.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    /// Iterate fields in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when the payload has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Map<String, Value>> for RawCandle {
    fn from(m: Map<String, Value>) -> Self {
        Self(m)
    }
}

/// One sampled interval for one instrument at one venue.
///
/// Constructed by the normalizer, which guarantees `low <= open, close <=
/// high`, non-negative volumes, and grid alignment of `timestamp`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandleRecord {
    /// Canonical instrument.
    pub instrument: Instrument,
    /// Venue the record was sampled at.
    pub venue: Venue,
    /// Interval-open instant.
    pub timestamp: DateTime<Utc>,
    /// Opening price.
    pub open: Decimal,
    /// Highest price.
    pub high: Decimal,
    /// Lowest price.
    pub low: Decimal,
    /// Closing price.
    pub close: Decimal,
    /// Base-asset volume.
    pub volume: Decimal,
    /// Quote-asset volume, when the venue reports it.
    pub quote_volume: Option<Decimal>,
    /// Free-form origin tag, e.g. `Binance_spot`.
    pub source: Option<String>,
}

/// A primary record paired with the closest secondary record within tolerance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedPair {
    /// Instrument shared by both candles.
    pub instrument: Instrument,
    /// Key timestamp of the pair.
    pub primary_timestamp: DateTime<Utc>,
    /// Timestamp of the chosen secondary record.
    pub secondary_timestamp: DateTime<Utc>,
    /// Primary venue candle.
    pub primary_candle: CandleRecord,
    /// Secondary venue candle.
    pub secondary_candle: CandleRecord,
    /// `secondary_timestamp - primary_timestamp`; its absolute value never
    /// exceeds the tolerance used to build the pair.
    pub time_offset: TimeDelta,
}

/// Rolling statistics of one configured window for one row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowFeatures {
    /// Window size in samples.
    pub window: usize,
    /// Mean `premium_diff` over the trailing samples (current row included).
    pub avg_diff: Decimal,
    /// Mean of the non-missing `premium_pct` values in the window.
    pub avg_pct: Option<Decimal>,
    /// `premium_diff - avg_diff`.
    pub deviation_diff: Decimal,
    /// `premium_pct - avg_pct`; missing when either side is missing.
    pub deviation_pct: Option<Decimal>,
    /// Sum of primary volumes over the window.
    pub primary_volume_sum: Decimal,
    /// Sum of secondary volumes over the window.
    pub secondary_volume_sum: Decimal,
}

/// One persisted output row keyed by `(instrument, primary_timestamp)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureRow {
    /// Key part one.
    pub instrument: Instrument,
    /// Key part two.
    pub primary_timestamp: DateTime<Utc>,
    /// Timestamp of the matched secondary candle.
    pub secondary_timestamp: DateTime<Utc>,
    /// Signed secondary-minus-primary offset in milliseconds.
    pub time_offset_ms: i64,
    /// Source tag of the primary candle.
    pub primary_source: Option<String>,
    /// Source tag of the secondary candle.
    pub secondary_source: Option<String>,
    /// Primary closing price.
    pub primary_close: Decimal,
    /// Secondary closing price.
    pub secondary_close: Decimal,
    /// `primary_close - secondary_close`.
    pub premium_diff: Decimal,
    /// `premium_diff / secondary_close * 100`; missing when the secondary
    /// close is zero.
    pub premium_pct: Option<Decimal>,
    /// Primary base volume.
    pub primary_volume: Decimal,
    /// Secondary base volume.
    pub secondary_volume: Decimal,
    /// Primary quote volume.
    pub primary_quote_volume: Option<Decimal>,
    /// Secondary quote volume.
    pub secondary_quote_volume: Option<Decimal>,
    /// One entry per configured window, ascending by size.
    pub windows: Vec<WindowFeatures>,
}

impl FeatureRow {
    /// Composite dataset key.
    #[must_use]
    pub fn key(&self) -> (&Instrument, DateTime<Utc>) {
        (&self.instrument, self.primary_timestamp)
    }

    /// Features of a given window size, if configured.
    #[must_use]
    pub fn window(&self, size: usize) -> Option<&WindowFeatures> {
        self.windows.iter().find(|w| w.window == size)
    }
}
