//! Fetch collaborator seam for venue candle sources.

use async_trait::async_trait;

use crate::record::{Instrument, RawCandle};
use premia_types::PremiaError;

/// Collaborator that delivers one venue's raw candle batch per cycle.
///
/// Implementations own everything the engine does not: HTTP access, paging,
/// rate limits, retries, and currency conversion. The engine calls
/// `fetch_batch` once per cycle and never retries.
#[async_trait]
pub trait CandleSource: Send + Sync {
    /// Short name used in logs and error messages.
    fn venue_name(&self) -> &str;

    /// Fetch whatever raw candles are currently available for `instruments`.
    ///
    /// An empty `instruments` slice means "everything the source tracks".
    ///
    /// # Errors
    /// Any error aborts the cycle before anything is written.
    async fn fetch_batch(&self, instruments: &[Instrument]) -> Result<Vec<RawCandle>, PremiaError>;
}
