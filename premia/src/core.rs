//! Reconciliation driver and its builder.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use premia_core::{
    CandleSource, CycleReport, Instrument, PremiaConfig, PremiaError, RawCandle, Venue,
    VenueSchema, WindowSet,
};
use premia_store::IncrementalStore;

use crate::cycle::{CycleEvent, CyclePhase};
use crate::pipeline;

/// Reconciliation driver: one `run_cycle` call is one batch pass.
///
/// The driver keeps no state between cycles. Everything a cycle needs from
/// earlier cycles (the trailing rows that fill rolling windows) is re-read
/// from the persisted dataset.
#[derive(Debug, Clone)]
pub struct Reconciler {
    pub(crate) cfg: Arc<PremiaConfig>,
    pub(crate) store: IncrementalStore,
}

/// Builder for a [`Reconciler`].
#[derive(Debug, Clone)]
pub struct ReconcilerBuilder {
    cfg: PremiaConfig,
    windows: Option<Vec<usize>>,
}

impl Default for ReconcilerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ReconcilerBuilder {
    /// Start from [`PremiaConfig::default`].
    ///
    /// Behavior and trade-offs:
    /// - 120 s matching tolerance, windows of 12, 288 and 8640 samples, eight
    ///   decimal places for percentages and means, dataset
    ///   `combined_candles.csv` in the working directory.
    /// - The primary venue expects a 5-minute grid; the secondary venue has
    ///   no grid check, so skewed timestamps reach the matcher. Both accept
    ///   the default field aliases.
    #[must_use]
    pub fn new() -> Self {
        Self {
            cfg: PremiaConfig::default(),
            windows: None,
        }
    }

    /// Replace the whole configuration, e.g. one loaded from JSON.
    #[must_use]
    pub fn config(mut self, cfg: PremiaConfig) -> Self {
        self.cfg = cfg;
        self.windows = None;
        self
    }

    /// Schema of the primary venue (the one whose timestamps key the output).
    #[must_use]
    pub fn primary(mut self, schema: VenueSchema) -> Self {
        self.cfg.primary = schema;
        self
    }

    /// Schema of the secondary venue.
    #[must_use]
    pub fn secondary(mut self, schema: VenueSchema) -> Self {
        self.cfg.secondary = schema;
        self
    }

    /// Maximum absolute timestamp offset for a valid match (inclusive).
    ///
    /// Behavior and trade-offs:
    /// - A wider tolerance pairs more candles across skewed clocks but can
    ///   pair a primary with a neighbouring interval when the secondary venue
    ///   skips one.
    /// - Zero requires identical timestamps.
    #[must_use]
    pub const fn tolerance(mut self, tolerance: Duration) -> Self {
        self.cfg.tolerance = tolerance;
        self
    }

    /// Rolling window sizes in samples. Validated by [`build`](Self::build).
    #[must_use]
    pub fn windows(mut self, sizes: &[usize]) -> Self {
        self.windows = Some(sizes.to_vec());
        self
    }

    /// Decimal places kept for `premium_pct` and rolling means.
    #[must_use]
    pub const fn pct_scale(mut self, scale: u32) -> Self {
        self.cfg.pct_scale = scale;
        self
    }

    /// Location of the persisted dataset.
    #[must_use]
    pub fn dataset_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.cfg.dataset_path = path.into();
        self
    }

    /// Build the driver.
    ///
    /// # Errors
    /// Returns `InvalidArg` for an empty window list or a zero window, a zero
    /// or fractional venue grid, a schema missing a required field alias, a
    /// scale above `MAX_PCT_SCALE`, an empty dataset path, or a tolerance too
    /// large to represent.
    pub fn build(mut self) -> Result<Reconciler, PremiaError> {
        if let Some(sizes) = self.windows.take() {
            self.cfg.windows = WindowSet::new(sizes)?;
        }
        self.cfg.validate()?;
        chrono::TimeDelta::from_std(self.cfg.tolerance)
            .map_err(|_| PremiaError::InvalidArg("tolerance out of range".into()))?;
        let store = IncrementalStore::open(self.cfg.dataset_path.clone(), self.cfg.windows.clone());
        Ok(Reconciler {
            cfg: Arc::new(self.cfg),
            store,
        })
    }
}

impl Reconciler {
    /// Start building a new `Reconciler`.
    ///
    /// ```rust,ignore
    /// use std::time::Duration;
    /// use premia::{Reconciler, VenueSchema};
    ///
    /// let reconciler = Reconciler::builder()
    ///     .primary(VenueSchema::new("binance"))
    ///     .secondary(VenueSchema::new("upbit").without_alias("timestamp"))
    ///     .tolerance(Duration::from_secs(120))
    ///     .windows(&[12, 288])
    ///     .dataset_path("data/combined_candles.csv")
    ///     .build()?;
    /// let report = reconciler.run_cycle(primary_batch, secondary_batch).await?;
    /// ```
    #[must_use]
    pub fn builder() -> ReconcilerBuilder {
        ReconcilerBuilder::new()
    }

    /// Effective configuration.
    #[must_use]
    pub fn config(&self) -> &PremiaConfig {
        &self.cfg
    }

    /// Store handle for downstream reads (`load`, `Dataset::latest`, ...).
    #[must_use]
    pub const fn store(&self) -> &IncrementalStore {
        &self.store
    }

    /// Run one cycle over already-fetched venue batches.
    ///
    /// Behavior and trade-offs:
    /// - Normalizes both batches, matches per instrument, computes features
    ///   with the persisted rows as warm-up history, and upserts the result.
    /// - Per-instrument work fans out onto the blocking pool and is joined
    ///   before the single store write.
    /// - Record-level problems (schema errors, dropped rows) end up in the
    ///   report's `warnings`; match gaps in `match_gaps`.
    /// - Any fatal error aborts the cycle and is returned unchanged; nothing
    ///   is written in that case. There is no internal retry.
    ///
    /// # Errors
    /// `StoreCorruption` when the persisted dataset cannot be read, `Store`
    /// when the new dataset cannot be written, `Other` if a worker task dies.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "premia::reconciler::run_cycle",
            skip(self, primary, secondary),
            fields(primary = primary.len(), secondary = secondary.len()),
        )
    )]
    pub async fn run_cycle(
        &self,
        primary: Vec<RawCandle>,
        secondary: Vec<RawCandle>,
    ) -> Result<CycleReport, PremiaError> {
        let mut phase = CyclePhase::Idle.handle(CycleEvent::Start)?;
        match self.drive(&mut phase, primary, secondary).await {
            Ok(report) => Ok(report),
            Err(e) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(phase = phase.as_str(), error = %e, "cycle aborted");
                if phase != CyclePhase::Idle {
                    phase.handle(CycleEvent::Failed)?;
                }
                Err(e)
            }
        }
    }

    /// Fetch both venue batches concurrently, then run one cycle.
    ///
    /// A failing source aborts the cycle before anything is normalized or
    /// written; its error is surfaced as `PremiaError::Source`.
    ///
    /// # Errors
    /// `Source` for fetch failures, otherwise as [`run_cycle`](Self::run_cycle).
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "premia::reconciler::run_with_sources",
            skip(self, primary, secondary, instruments),
            fields(primary = primary.venue_name(), secondary = secondary.venue_name()),
        )
    )]
    pub async fn run_with_sources(
        &self,
        primary: &dyn CandleSource,
        secondary: &dyn CandleSource,
        instruments: &[Instrument],
    ) -> Result<CycleReport, PremiaError> {
        let (p, s) = futures::future::try_join(
            fetch(Venue::Primary, primary, instruments),
            fetch(Venue::Secondary, secondary, instruments),
        )
        .await?;
        self.run_cycle(p, s).await
    }

    async fn drive(
        &self,
        phase: &mut CyclePhase,
        primary: Vec<RawCandle>,
        secondary: Vec<RawCandle>,
    ) -> Result<CycleReport, PremiaError> {
        let mut report = CycleReport::default();

        let (mut p, mut s) = pipeline::normalize(&self.cfg, primary, secondary).await?;
        report.primary = p.counts;
        report.secondary = s.counts;
        report.warnings.append(&mut p.errors);
        report.warnings.append(&mut s.errors);
        *phase = phase.handle(CycleEvent::Normalized)?;

        let matched = pipeline::match_all(&self.cfg, p, s).await?;
        for (_, outcome) in &matched {
            report.pairs_matched += outcome.pairs.len();
            report.match_gaps.extend(outcome.gaps.iter().cloned());
        }
        *phase = phase.handle(CycleEvent::Matched)?;

        let history = Arc::new(self.store.load().await?);
        let batches = pipeline::compute_all(&self.cfg, history, matched).await?;
        let mut rows = Vec::new();
        for batch in batches {
            report.rows_dropped += batch.errors.len();
            report.warnings.extend(batch.errors);
            rows.extend(batch.rows);
        }
        report.rows_computed = rows.len();
        *phase = phase.handle(CycleEvent::Computed)?;

        report.rows_upserted = rows.len();
        let summary = self.store.upsert(rows).await?;
        report.dataset_rows = summary.total;
        *phase = phase.handle(CycleEvent::Merged)?;

        #[cfg(feature = "tracing")]
        tracing::info!(
            normalized = report.records_normalized(),
            schema_failures = report.schema_failures(),
            pairs = report.pairs_matched,
            gaps = report.match_gaps.len(),
            rows = report.rows_upserted,
            dropped = report.rows_dropped,
            dataset_rows = report.dataset_rows,
            "cycle complete"
        );
        Ok(report)
    }
}

/// Fetch one venue batch, tagging foreign errors with the venue.
async fn fetch(
    venue: Venue,
    source: &dyn CandleSource,
    instruments: &[Instrument],
) -> Result<Vec<RawCandle>, PremiaError> {
    source
        .fetch_batch(instruments)
        .await
        .map_err(|e| tag_err(venue, source.venue_name(), e))
}

pub(crate) fn tag_err(venue: Venue, name: &str, e: PremiaError) -> PremiaError {
    match e {
        e @ PremiaError::Source { .. } => e,
        other => PremiaError::source(venue, format!("{name}: {other}")),
    }
}
