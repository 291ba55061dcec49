//! Configuration types shared by the engine, the store and the demos.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::PremiaError;

/// Largest scale accepted for rounded percentages and means.
pub const MAX_PCT_SCALE: u32 = 20;

/// Canonical candle fields every venue payload is mapped onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalField {
    /// Instrument identifier, canonicalized to `BASE/QUOTE`.
    Instrument,
    /// Interval-open instant.
    Timestamp,
    /// Opening price.
    Open,
    /// Highest price.
    High,
    /// Lowest price.
    Low,
    /// Closing price.
    Close,
    /// Base-asset volume.
    Volume,
    /// Quote-asset volume (optional).
    QuoteVolume,
    /// Free-form source tag such as `Binance_spot` (optional).
    Source,
}

impl CanonicalField {
    /// Fields that must be present in every payload.
    pub const REQUIRED: &'static [Self] = &[
        Self::Instrument,
        Self::Timestamp,
        Self::Open,
        Self::High,
        Self::Low,
        Self::Close,
        Self::Volume,
    ];

    /// All canonical fields in schema order.
    pub const ALL: &'static [Self] = &[
        Self::Instrument,
        Self::Timestamp,
        Self::Open,
        Self::High,
        Self::Low,
        Self::Close,
        Self::Volume,
        Self::QuoteVolume,
        Self::Source,
    ];

    /// Canonical snake_case name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Instrument => "instrument",
            Self::Timestamp => "timestamp",
            Self::Open => "open",
            Self::High => "high",
            Self::Low => "low",
            Self::Close => "close",
            Self::Volume => "volume",
            Self::QuoteVolume => "quote_volume",
            Self::Source => "source",
        }
    }
}

/// Normalize a payload field name: trim, lowercase, and collapse inner
/// whitespace runs and dashes into a single underscore.
#[must_use]
pub fn normalize_field_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut pending_sep = false;
    for ch in name.trim().chars() {
        if ch.is_whitespace() || ch == '-' {
            pending_sep = true;
            continue;
        }
        if pending_sep && !out.is_empty() {
            out.push('_');
        }
        pending_sep = false;
        out.extend(ch.to_lowercase());
    }
    out
}

/// Per-venue normalization settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VenueSchema {
    /// Display name used in logs and reports (e.g. "binance").
    pub name: String,
    /// Sampling grid; timestamps must be whole multiples of it since the
    /// epoch. `None` disables the check.
    pub grid: Option<Duration>,
    /// Normalized payload field name → canonical field.
    pub aliases: BTreeMap<String, CanonicalField>,
}

impl VenueSchema {
    /// Schema with the default alias table and a 5-minute grid.
    ///
    /// The default aliases accept the canonical names plus the column names
    /// produced by the upstream candle collectors (`market`,
    /// `candle_date_time_utc`, `opening_price`, `trade_price`,
    /// `candle_acc_trade_volume`, ...).
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let mut aliases = BTreeMap::new();
        for f in CanonicalField::ALL {
            aliases.insert(f.as_str().to_string(), *f);
        }
        for (alias, field) in [
            ("market", CanonicalField::Instrument),
            ("symbol", CanonicalField::Instrument),
            ("candle_date_time_utc", CanonicalField::Timestamp),
            ("candle_date_time_utc_x", CanonicalField::Timestamp),
            ("open_time", CanonicalField::Timestamp),
            ("opening_price", CanonicalField::Open),
            ("high_price", CanonicalField::High),
            ("low_price", CanonicalField::Low),
            ("trade_price", CanonicalField::Close),
            ("candle_acc_trade_volume", CanonicalField::Volume),
            ("candle_acc_trade_price", CanonicalField::QuoteVolume),
        ] {
            aliases.insert(alias.to_string(), field);
        }
        Self {
            name: name.into(),
            grid: Some(Duration::from_secs(300)),
            aliases,
        }
    }

    /// Set or clear the sampling grid.
    #[must_use]
    pub const fn with_grid(mut self, grid: Option<Duration>) -> Self {
        self.grid = grid;
        self
    }

    /// Map an additional payload field name onto a canonical field.
    #[must_use]
    pub fn with_alias(mut self, name: &str, field: CanonicalField) -> Self {
        self.aliases.insert(normalize_field_name(name), field);
        self
    }

    /// Stop recognizing a payload field name.
    ///
    /// Useful when a venue reuses a canonical name for something else, such
    /// as a last-trade `timestamp` next to the interval-open time.
    #[must_use]
    pub fn without_alias(mut self, name: &str) -> Self {
        self.aliases.remove(&normalize_field_name(name));
        self
    }

    /// Resolve an already-normalized payload field name.
    #[must_use]
    pub fn resolve(&self, normalized: &str) -> Option<CanonicalField> {
        self.aliases.get(normalized).copied()
    }

    fn validate(&self) -> Result<(), PremiaError> {
        if self.grid.is_some_and(|g| g.as_secs() == 0 || g.subsec_nanos() != 0) {
            return Err(PremiaError::InvalidArg(format!(
                "venue '{}': grid must be a positive whole number of seconds",
                self.name
            )));
        }
        for required in CanonicalField::REQUIRED {
            if !self.aliases.values().any(|f| f == required) {
                return Err(PremiaError::InvalidArg(format!(
                    "venue '{}': no alias maps to required field '{}'",
                    self.name,
                    required.as_str()
                )));
            }
        }
        Ok(())
    }
}

/// Sorted, de-duplicated set of rolling window sizes (in samples).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<usize>", into = "Vec<usize>")]
pub struct WindowSet(Vec<usize>);

impl WindowSet {
    /// Build a window set.
    ///
    /// # Errors
    /// Returns `InvalidArg` when the list is empty or contains a zero.
    pub fn new(mut sizes: Vec<usize>) -> Result<Self, PremiaError> {
        if sizes.is_empty() {
            return Err(PremiaError::InvalidArg(
                "at least one rolling window is required".into(),
            ));
        }
        if sizes.contains(&0) {
            return Err(PremiaError::InvalidArg(
                "rolling window sizes must be positive".into(),
            ));
        }
        sizes.sort_unstable();
        sizes.dedup();
        Ok(Self(sizes))
    }

    /// Window sizes in ascending order.
    #[must_use]
    pub fn sizes(&self) -> &[usize] {
        &self.0
    }

    /// Largest configured window; the trailing buffer keeps this many samples.
    #[must_use]
    pub fn max(&self) -> usize {
        self.0.last().copied().unwrap_or(0)
    }

    /// Number of configured windows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false for a constructed set; provided for API symmetry.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for WindowSet {
    fn default() -> Self {
        // one hour, one day and thirty days of 5-minute candles
        Self(vec![12, 288, 8640])
    }
}

impl TryFrom<Vec<usize>> for WindowSet {
    type Error = PremiaError;

    fn try_from(v: Vec<usize>) -> Result<Self, Self::Error> {
        Self::new(v)
    }
}

impl From<WindowSet> for Vec<usize> {
    fn from(w: WindowSet) -> Self {
        w.0
    }
}

/// Global configuration for a `Reconciler`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PremiaConfig {
    /// Schema of the venue that drives the output grid.
    pub primary: VenueSchema,
    /// Schema of the venue matched against the primary.
    pub secondary: VenueSchema,
    /// Maximum absolute timestamp offset for a valid match (inclusive).
    pub tolerance: Duration,
    /// Rolling window sizes in samples.
    pub windows: WindowSet,
    /// Decimal places kept for `premium_pct` and every rolling mean.
    pub pct_scale: u32,
    /// Location of the persisted dataset.
    pub dataset_path: PathBuf,
}

impl Default for PremiaConfig {
    fn default() -> Self {
        Self {
            primary: VenueSchema::new("primary"),
            // Secondary venues stamp candles off the primary grid; the
            // matcher absorbs the skew within `tolerance`.
            secondary: VenueSchema::new("secondary").with_grid(None),
            tolerance: Duration::from_secs(120),
            windows: WindowSet::default(),
            pct_scale: 8,
            dataset_path: PathBuf::from("combined_candles.csv"),
        }
    }
}

impl PremiaConfig {
    /// Check cross-field constraints that serde cannot express.
    ///
    /// # Errors
    /// Returns `InvalidArg` describing the first violated constraint.
    pub fn validate(&self) -> Result<(), PremiaError> {
        self.primary.validate()?;
        self.secondary.validate()?;
        if self.pct_scale > MAX_PCT_SCALE {
            return Err(PremiaError::InvalidArg(format!(
                "pct_scale {} exceeds maximum {MAX_PCT_SCALE}",
                self.pct_scale
            )));
        }
        if self.dataset_path.as_os_str().is_empty() {
            return Err(PremiaError::InvalidArg("dataset_path is empty".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_names_are_normalized() {
        assert_eq!(normalize_field_name("  Trade Price "), "trade_price");
        assert_eq!(normalize_field_name("QUOTE-volume"), "quote_volume");
        assert_eq!(normalize_field_name("close"), "close");
    }

    #[test]
    fn window_set_sorts_and_dedups() {
        let w = WindowSet::new(vec![288, 12, 288]).unwrap();
        assert_eq!(w.sizes(), &[12, 288]);
        assert_eq!(w.max(), 288);
        assert!(WindowSet::new(vec![]).is_err());
        assert!(WindowSet::new(vec![3, 0]).is_err());
    }

    #[test]
    fn zero_grid_is_rejected() {
        let mut cfg = PremiaConfig::default();
        cfg.secondary.grid = Some(Duration::from_secs(0));
        assert!(matches!(cfg.validate(), Err(PremiaError::InvalidArg(_))));
    }
}
