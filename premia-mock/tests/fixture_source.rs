use chrono::TimeDelta;
use premia_core::{
    CandleSource, Instrument, Normalizer, PremiaError, Venue, VenueSchema, match_nearest,
};
use premia_mock::fixtures::{self, GAP_SLOT};
use premia_mock::{MockSource, binance_schema, upbit_schema};

fn btc() -> Instrument {
    Instrument::parse("BTC/KRW").unwrap()
}

#[tokio::test]
async fn binance_fixture_collapses_stale_duplicates() {
    let raws = MockSource::binance().fetch_batch(&[btc()]).await.unwrap();
    assert_eq!(raws.len(), 13);

    let schema = binance_schema();
    let batch = Normalizer::new(Venue::Primary, &schema).normalize_batch(&raws);
    assert!(batch.errors.is_empty(), "{:?}", batch.errors);
    assert_eq!(batch.counts.normalized, 12);
    assert_eq!(batch.counts.duplicates_collapsed, 1);

    let dup = &batch.records[fixtures::DUPLICATE_SLOT as usize];
    assert_eq!(dup.timestamp, fixtures::slot_time(fixtures::DUPLICATE_SLOT));
    assert_eq!(dup.close.to_string(), "50030000");
    assert_eq!(dup.source.as_deref(), Some("Binance_spot"));
}

#[tokio::test]
async fn upbit_fixture_needs_its_own_schema() {
    let raws = MockSource::upbit().fetch_batch(&[btc()]).await.unwrap();

    let schema = upbit_schema();
    let ok = Normalizer::new(Venue::Secondary, &schema).normalize_batch(&raws);
    assert_eq!(ok.counts.rejected, 1);
    assert_eq!(ok.counts.normalized, 11);
    assert!(matches!(
        &ok.errors[0],
        PremiaError::Schema { field, .. } if field == "close"
    ));
    assert_eq!(
        ok.records[0].timestamp,
        fixtures::slot_time(0) - TimeDelta::minutes(1)
    );

    // The default table maps the last-trade `timestamp` onto the canonical
    // timestamp, which disagrees with `candle_date_time_utc`; the 5-minute
    // grid rejects the skewed stamps as well.
    let default = VenueSchema::new("upbit");
    let bad = Normalizer::new(Venue::Secondary, &default).normalize_batch(&raws);
    assert_eq!(bad.counts.normalized, 0);
    assert_eq!(bad.counts.rejected, raws.len());
}

#[tokio::test]
async fn fixtures_match_except_on_gap_slots() {
    let p = MockSource::binance().fetch_batch(&[btc()]).await.unwrap();
    let s = MockSource::upbit().fetch_batch(&[btc()]).await.unwrap();
    let (ps, ss) = (binance_schema(), upbit_schema());
    let p = Normalizer::new(Venue::Primary, &ps).normalize_batch(&p).records;
    let s = Normalizer::new(Venue::Secondary, &ss).normalize_batch(&s).records;

    let out = match_nearest(&btc(), &p, &s, TimeDelta::seconds(120));
    assert_eq!(out.pairs.len(), 11);
    assert_eq!(out.gaps.len(), 1);
    assert_eq!(out.gaps[0].primary_timestamp, fixtures::slot_time(GAP_SLOT));
    assert!(
        out.pairs
            .iter()
            .all(|pair| pair.time_offset == TimeDelta::minutes(-1))
    );
}

#[tokio::test]
async fn slots_are_stable_across_fetch_windows() {
    let whole = MockSource::binance().slots(0, 24).fetch_batch(&[btc()]).await.unwrap();
    let tail = MockSource::binance()
        .between(fixtures::slot_time(12), fixtures::slot_time(24))
        .fetch_batch(&[btc()])
        .await
        .unwrap();
    assert_eq!(&whole[whole.len() - tail.len()..], tail.as_slice());
}

#[tokio::test]
async fn empty_instrument_list_serves_every_market() {
    let all = MockSource::binance().fetch_batch(&[]).await.unwrap();
    assert_eq!(all.len(), 26);
    let unknown = MockSource::binance()
        .fetch_batch(&[Instrument::parse("DOGE/KRW").unwrap()])
        .await
        .unwrap();
    assert!(unknown.is_empty());
}

#[tokio::test]
async fn fail_instrument_fails_the_fetch() {
    let err = MockSource::upbit()
        .fetch_batch(&[btc(), Instrument::parse("FAIL/KRW").unwrap()])
        .await
        .unwrap_err();
    assert!(matches!(err, PremiaError::Other(msg) if msg.contains("FAIL/KRW")));
}
