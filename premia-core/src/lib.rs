//! premia-core
//!
//! Domain records and pure pipeline stages of the premia reconciliation
//! engine.
//!
//! - `record`: instruments, raw payloads, candles, matched pairs, feature rows.
//! - `normalize`: the record normalizer (raw payload → `CandleRecord`).
//! - `timeseries`: the cross-source matcher and the rolling feature calculator.
//! - `source`: the `CandleSource` trait implemented by fetch collaborators.
//!
//! Everything here is synchronous and free of I/O except the `CandleSource`
//! trait, which is async so collaborators can run on any Tokio-based stack.
#![warn(missing_docs)]

/// Record normalizer.
pub mod normalize;
/// Domain records.
pub mod record;
/// Fetch collaborator trait.
pub mod source;
/// Matching and rolling feature computation.
pub mod timeseries;
pub mod types;

pub use normalize::{NormalizedBatch, Normalizer};
pub use record::{CandleRecord, FeatureRow, Instrument, MatchedPair, RawCandle, WindowFeatures};
pub use source::CandleSource;
pub use timeseries::align::{MatchOutcome, match_nearest};
pub use timeseries::features::{FeatureBatch, FeatureCalculator};
pub use timeseries::rolling::{Observation, Overflow, RollingState};
pub use types::*;
