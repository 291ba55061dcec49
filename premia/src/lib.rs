//! Premia reconciles the candle streams of two trading venues into one
//! persisted premium dataset.
//!
//! Overview
//! - Normalizes raw venue payloads into canonical candles, per venue schema.
//! - Pairs every primary candle with the nearest secondary candle of the same
//!   instrument within a tolerance.
//! - Computes the premium spread and causal rolling statistics over several
//!   window sizes.
//! - Merges the rows into a CSV dataset keyed by `(instrument,
//!   primary_timestamp)`, replacing the file atomically.
//!
//! Key behaviors and trade-offs
//! - Cycles are stateless: rolling windows are warmed up from the persisted
//!   dataset, so running batches one at a time yields the same rows as one
//!   large batch, as long as the history covers the largest window.
//! - Bad records are dropped and reported, never fatal. Store corruption and
//!   write failures abort the cycle and leave the previous dataset intact.
//! - The primary venue's timestamps key the output; a primary candle without
//!   a secondary partner inside the tolerance produces no row, only a gap.
//! - Percentages and means are rounded to a configurable number of decimal
//!   places; sums and differences stay exact.
//!
//! Examples
//! Building a reconciler and running one cycle:
//! ```rust,ignore
//! use std::time::Duration;
//! use premia::{Reconciler, VenueSchema};
//!
//! let reconciler = Reconciler::builder()
//!     .primary(VenueSchema::new("binance"))
//!     .secondary(VenueSchema::new("upbit").without_alias("timestamp"))
//!     .tolerance(Duration::from_secs(120))
//!     .windows(&[12, 288, 8640])
//!     .dataset_path("combined_candles.csv")
//!     .build()?;
//!
//! let report = reconciler.run_cycle(primary_batch, secondary_batch).await?;
//! println!(
//!     "{} rows upserted, {} gaps, {} warnings",
//!     report.rows_upserted,
//!     report.match_gaps.len(),
//!     report.warnings.len()
//! );
//! ```
//!
//! Fetching through `CandleSource` collaborators:
//! ```rust,ignore
//! use premia::Instrument;
//!
//! let instruments = [Instrument::parse("BTC/KRW")?];
//! let report = reconciler
//!     .run_with_sources(&binance, &upbit, &instruments)
//!     .await?;
//! ```
//!
//! See `demos/examples/` for runnable end-to-end demonstrations.
#![warn(missing_docs)]

pub(crate) mod core;
mod cycle;
mod pipeline;

pub use core::{Reconciler, ReconcilerBuilder};

pub use premia_store::{Dataset, FIXED_COLUMNS, IncrementalStore, UpsertSummary, WINDOW_COLUMNS};

// Re-export domain types for convenience
pub use premia_core::{
    CandleRecord,
    CandleSource,
    // Configuration
    CanonicalField,
    // Reports
    CycleReport,
    // Numeric and time primitives
    DateTime,
    Decimal,
    FeatureBatch,
    FeatureCalculator,
    FeatureRow,
    // Records
    Instrument,
    MAX_PCT_SCALE,
    MatchGap,
    MatchOutcome,
    MatchedPair,
    NormalizedBatch,
    Normalizer,
    PremiaConfig,
    PremiaError,
    RawCandle,
    TimeDelta,
    Utc,
    Venue,
    VenueCounts,
    VenueSchema,
    WindowFeatures,
    WindowSet,
    match_nearest,
    normalize_field_name,
};
