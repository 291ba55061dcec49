mod helpers;

use std::time::Duration;

use helpers::{builder, dataset_bytes, dt, fixture_reconciler, inst, raw};
use premia::{PremiaError, Reconciler, Venue, VenueSchema};
use premia_mock::{DynamicMockSource, MockBehavior, MockSource};
use tempfile::tempdir;

#[tokio::test]
async fn corrupt_dataset_aborts_and_is_left_untouched() {
    let dir = tempdir().unwrap();
    let r = builder(&dir).build().unwrap();
    std::fs::write(r.store().path(), "instrument,primary_timestamp\nBTC/USDT,yesterday\n").unwrap();
    let before = dataset_bytes(&r);

    let err = r
        .run_cycle(
            vec![raw("BTC/USDT", dt(12, 0, 0), 100)],
            vec![raw("BTC/USDT", dt(12, 0, 0), 99)],
        )
        .await
        .unwrap_err();
    assert!(matches!(err, PremiaError::StoreCorruption { .. }), "{err}");
    assert!(err.is_fatal());
    assert_eq!(dataset_bytes(&r), before);
}

#[tokio::test]
async fn changing_windows_requires_migration() {
    let dir = tempdir().unwrap();
    let first = builder(&dir).build().unwrap();
    first
        .run_cycle(
            vec![raw("BTC/USDT", dt(12, 0, 0), 100)],
            vec![raw("BTC/USDT", dt(12, 0, 0), 99)],
        )
        .await
        .unwrap();
    let before = dataset_bytes(&first);

    let second = builder(&dir).windows(&[3, 24]).build().unwrap();
    let err = second
        .run_cycle(
            vec![raw("BTC/USDT", dt(12, 5, 0), 100)],
            vec![raw("BTC/USDT", dt(12, 5, 0), 99)],
        )
        .await
        .unwrap_err();
    assert!(matches!(err, PremiaError::StoreCorruption { .. }));
    assert_eq!(dataset_bytes(&second), before);
}

#[tokio::test]
async fn source_failure_aborts_before_anything_is_written() {
    let dir = tempdir().unwrap();
    let r = fixture_reconciler(&dir);

    let err = r
        .run_with_sources(
            &MockSource::binance(),
            &MockSource::upbit(),
            &[inst("BTC/KRW"), inst("FAIL/KRW")],
        )
        .await
        .unwrap_err();
    match err {
        PremiaError::Source { venue, msg } => {
            assert_eq!(venue, Venue::Primary);
            assert!(msg.starts_with("binance: "), "{msg}");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(dataset_bytes(&r).is_none());
}

#[tokio::test]
async fn source_errors_keep_their_venue() {
    let dir = tempdir().unwrap();
    let r = fixture_reconciler(&dir);
    let (secondary, controller) = DynamicMockSource::new_with_controller("upbit");
    let tagged = PremiaError::source(Venue::Secondary, "HTTP 429");
    controller
        .set_behavior(inst("BTC/KRW"), MockBehavior::Fail(tagged.clone()))
        .await;

    let err = r
        .run_with_sources(&MockSource::binance(), &secondary, &[inst("BTC/KRW")])
        .await
        .unwrap_err();
    assert_eq!(err, tagged);
    assert!(dataset_bytes(&r).is_none());
}

#[tokio::test(start_paused = true)]
async fn cancelled_cycle_leaves_no_dataset() {
    let dir = tempdir().unwrap();
    let r = fixture_reconciler(&dir);
    let (secondary, controller) = DynamicMockSource::new_with_controller("upbit");
    controller
        .set_behavior(inst("BTC/KRW"), MockBehavior::Hang)
        .await;

    let res = tokio::time::timeout(
        Duration::from_secs(30),
        r.run_with_sources(&MockSource::binance(), &secondary, &[inst("BTC/KRW")]),
    )
    .await;
    assert!(res.is_err());
    assert!(dataset_bytes(&r).is_none());
}

#[test]
fn builder_rejects_bad_settings() {
    let dir = tempdir().unwrap();
    let invalid = |b: premia::ReconcilerBuilder| {
        matches!(b.build().unwrap_err(), PremiaError::InvalidArg(_))
    };

    assert!(invalid(builder(&dir).windows(&[])));
    assert!(invalid(builder(&dir).windows(&[0, 12])));
    assert!(invalid(builder(&dir).pct_scale(premia::MAX_PCT_SCALE + 1)));
    assert!(invalid(builder(&dir).dataset_path("")));
    assert!(invalid(builder(&dir).primary(
        VenueSchema::new("primary").with_grid(Some(Duration::ZERO))
    )));
    assert!(invalid(builder(&dir).primary(
        VenueSchema::new("primary").with_grid(Some(Duration::from_millis(1_500)))
    )));
    assert!(invalid(builder(&dir).secondary(
        VenueSchema::new("secondary")
            .without_alias("close")
            .without_alias("trade_price")
    )));
    assert!(invalid(builder(&dir).tolerance(Duration::MAX)));

    let ok = builder(&dir).windows(&[12, 3, 12]).build().unwrap();
    assert_eq!(ok.config().windows.sizes(), &[3, 12]);
}

#[test]
fn defaults_follow_the_collectors() {
    let r = Reconciler::builder().build().unwrap();
    let cfg = r.config();
    assert_eq!(cfg.tolerance, Duration::from_secs(120));
    assert_eq!(cfg.windows.sizes(), &[12, 288, 8640]);
    assert_eq!(cfg.pct_scale, 8);
    assert_eq!(cfg.primary.grid, Some(Duration::from_secs(300)));
    assert!(cfg.secondary.grid.is_none());
    assert_eq!(r.store().path(), std::path::Path::new("combined_candles.csv"));
}
