use std::time::Duration;

use premia_core::{CandleSource, Instrument, PremiaError, RawCandle};
use premia_mock::{DynamicMockSource, MockBehavior};

fn inst(s: &str) -> Instrument {
    Instrument::parse(s).unwrap()
}

fn raw(tag: i64) -> RawCandle {
    RawCandle::new().with("tag", tag)
}

#[tokio::test]
async fn returns_scripted_batches_in_instrument_order() {
    let (mock, controller) = DynamicMockSource::new_with_controller("P0");
    controller.set_batch(inst("ETH/KRW"), vec![raw(2)]).await;
    controller.set_batch(inst("BTC/KRW"), vec![raw(1)]).await;

    let got = mock
        .fetch_batch(&[inst("ETH/KRW"), inst("BTC/KRW"), inst("XRP/KRW")])
        .await
        .unwrap();
    assert_eq!(got, vec![raw(1), raw(2)]);

    let all = mock.fetch_batch(&[]).await.unwrap();
    assert_eq!(all, vec![raw(1), raw(2)]);
    assert_eq!(controller.requests().await.len(), 2);
}

#[tokio::test]
async fn fail_behavior_fails_the_whole_fetch() {
    let (mock, controller) = DynamicMockSource::new_with_controller("P0");
    controller.set_batch(inst("BTC/KRW"), vec![raw(1)]).await;
    let err = PremiaError::Other("boom".into());
    controller
        .set_behavior(inst("ETH/KRW"), MockBehavior::Fail(err.clone()))
        .await;

    let got = mock
        .fetch_batch(&[inst("BTC/KRW"), inst("ETH/KRW")])
        .await
        .unwrap_err();
    assert_eq!(got, err);
}

#[tokio::test(start_paused = true)]
async fn hang_behavior_never_completes() {
    let (mock, controller) = DynamicMockSource::new_with_controller("P0");
    controller
        .set_behavior(inst("BTC/KRW"), MockBehavior::Hang)
        .await;

    let res = tokio::time::timeout(
        Duration::from_secs(5),
        mock.fetch_batch(&[inst("BTC/KRW")]),
    )
    .await;
    assert!(res.is_err());

    controller.clear_all_behaviors().await;
    assert!(mock.fetch_batch(&[inst("BTC/KRW")]).await.unwrap().is_empty());
    assert_eq!(controller.requests().await.len(), 1);
}
