mod helpers;

use helpers::{dataset_bytes, fixture_reconciler};
use premia::{FeatureRow, Reconciler};
use premia_mock::MockSource;
use proptest::prelude::*;
use tempfile::tempdir;

async fn run_slots(r: &Reconciler, from: i64, to: i64) {
    r.run_with_sources(
        &MockSource::binance().slots(from, to),
        &MockSource::upbit().slots(from, to),
        &[],
    )
    .await
    .unwrap();
}

async fn rows(r: &Reconciler) -> Vec<FeatureRow> {
    r.store().load().await.unwrap().into_rows()
}

#[tokio::test]
async fn repeating_a_cycle_is_idempotent() {
    let dir = tempdir().unwrap();
    let r = fixture_reconciler(&dir);

    run_slots(&r, 0, 24).await;
    let first = dataset_bytes(&r).unwrap();
    run_slots(&r, 0, 24).await;
    assert_eq!(dataset_bytes(&r).unwrap(), first);
}

#[tokio::test]
async fn consecutive_cycles_match_one_large_cycle() {
    let once_dir = tempdir().unwrap();
    let once = fixture_reconciler(&once_dir);
    run_slots(&once, 0, 36).await;

    let split_dir = tempdir().unwrap();
    let split = fixture_reconciler(&split_dir);
    run_slots(&split, 0, 12).await;
    run_slots(&split, 12, 24).await;
    run_slots(&split, 24, 36).await;

    assert_eq!(rows(&split).await, rows(&once).await);
    assert_eq!(dataset_bytes(&split), dataset_bytes(&once));
}

#[tokio::test]
async fn overlapping_redelivery_refines_nothing_when_history_is_complete() {
    let once_dir = tempdir().unwrap();
    let once = fixture_reconciler(&once_dir);
    run_slots(&once, 0, 30).await;

    let dir = tempdir().unwrap();
    let r = fixture_reconciler(&dir);
    run_slots(&r, 0, 20).await;
    run_slots(&r, 14, 30).await;

    assert_eq!(rows(&r).await, rows(&once).await);
}

#[tokio::test]
async fn late_history_refines_earlier_windows() {
    let dir = tempdir().unwrap();
    let r = fixture_reconciler(&dir);

    // Second half first: its windows start empty.
    run_slots(&r, 12, 24).await;
    let early = rows(&r).await;
    run_slots(&r, 0, 12).await;
    let after = rows(&r).await;

    // Rows of the first batch were not in the second one, so they keep the
    // windows computed without history.
    for row in &early {
        let same = after.iter().find(|a| a.key() == row.key()).unwrap();
        assert_eq!(same, row);
    }
    // Re-running the later slots with history in place fills their windows.
    run_slots(&r, 12, 24).await;
    let refined = rows(&r).await;

    let once_dir = tempdir().unwrap();
    let once = fixture_reconciler(&once_dir);
    run_slots(&once, 0, 24).await;
    assert_eq!(refined, rows(&once).await);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn any_split_matches_one_shot(a in 1i64..35, b in 1i64..35) {
        let (lo, hi) = (a.min(b), a.max(b));
        tokio_test::block_on(async {
            let once_dir = tempdir().unwrap();
            let once = fixture_reconciler(&once_dir);
            run_slots(&once, 0, 36).await;

            let split_dir = tempdir().unwrap();
            let split = fixture_reconciler(&split_dir);
            run_slots(&split, 0, lo).await;
            run_slots(&split, lo, hi).await;
            run_slots(&split, hi, 36).await;

            assert_eq!(rows(&split).await, rows(&once).await);
        });
    }
}
