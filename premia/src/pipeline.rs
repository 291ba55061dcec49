//! Stage functions of a cycle. Each stage fans out onto the blocking pool and
//! joins before returning, so the driver sees one fan-in point per stage.

use std::sync::Arc;

use futures::future::join_all;
use tokio::task::JoinError;

use premia_core::{
    CandleRecord, FeatureBatch, FeatureCalculator, Instrument, MatchOutcome, NormalizedBatch,
    Normalizer, PremiaConfig, PremiaError, RawCandle, TimeDelta, Venue, match_nearest,
};
use premia_store::Dataset;

fn worker_failed(stage: &str, e: &JoinError) -> PremiaError {
    PremiaError::Other(format!("{stage} worker failed: {e}"))
}

/// Normalize both venue batches concurrently.
pub(crate) async fn normalize(
    cfg: &Arc<PremiaConfig>,
    primary: Vec<RawCandle>,
    secondary: Vec<RawCandle>,
) -> Result<(NormalizedBatch, NormalizedBatch), PremiaError> {
    let run = |venue: Venue, raws: Vec<RawCandle>| {
        let cfg = Arc::clone(cfg);
        tokio::task::spawn_blocking(move || {
            let schema = match venue {
                Venue::Primary => &cfg.primary,
                Venue::Secondary => &cfg.secondary,
            };
            Normalizer::new(venue, schema).normalize_batch(&raws)
        })
    };
    let (p, s) = futures::future::join(
        run(Venue::Primary, primary),
        run(Venue::Secondary, secondary),
    )
    .await;
    Ok((
        p.map_err(|e| worker_failed("normalize", &e))?,
        s.map_err(|e| worker_failed("normalize", &e))?,
    ))
}

/// Match every primary instrument against the secondary records of the same
/// instrument. Instruments present only on the secondary venue produce nothing.
pub(crate) async fn match_all(
    cfg: &Arc<PremiaConfig>,
    primary: NormalizedBatch,
    secondary: NormalizedBatch,
) -> Result<Vec<(Instrument, MatchOutcome)>, PremiaError> {
    let tolerance = TimeDelta::from_std(cfg.tolerance)
        .map_err(|_| PremiaError::InvalidArg("tolerance out of range".into()))?;
    let mut secondary = secondary.into_instruments();

    let tasks = primary.into_instruments().into_iter().map(|(inst, p)| {
        let s: Vec<CandleRecord> = secondary.remove(&inst).unwrap_or_default();
        tokio::task::spawn_blocking(move || {
            let outcome = match_nearest(&inst, &p, &s, tolerance);
            (inst, outcome)
        })
    });
    join_all(tasks.collect::<Vec<_>>())
        .await
        .into_iter()
        .map(|r| r.map_err(|e| worker_failed("match", &e)))
        .collect()
}

/// Compute feature rows per instrument, replaying persisted rows as history.
pub(crate) async fn compute_all(
    cfg: &Arc<PremiaConfig>,
    history: Arc<Dataset>,
    matched: Vec<(Instrument, MatchOutcome)>,
) -> Result<Vec<FeatureBatch>, PremiaError> {
    let tasks: Vec<_> = matched
        .into_iter()
        .filter(|(_, outcome)| !outcome.pairs.is_empty())
        .map(|(inst, outcome)| {
            let cfg = Arc::clone(cfg);
            let history = Arc::clone(&history);
            tokio::task::spawn_blocking(move || {
                FeatureCalculator::new(&cfg.windows, cfg.pct_scale).compute(
                    &inst,
                    history.instrument_rows(&inst),
                    &outcome.pairs,
                )
            })
        })
        .collect();
    join_all(tasks)
        .await
        .into_iter()
        .map(|r| r.map_err(|e| worker_failed("features", &e)))
        .collect()
}
