use chrono::{TimeZone, Utc};
use premia_types::{CycleReport, MatchGap, PremiaError, Venue, VenueCounts};

#[test]
fn cycle_report_roundtrip_with_warnings() {
    let report = CycleReport {
        primary: VenueCounts {
            received: 3,
            normalized: 2,
            rejected: 1,
            duplicates_collapsed: 0,
        },
        secondary: VenueCounts {
            received: 2,
            normalized: 1,
            rejected: 0,
            duplicates_collapsed: 1,
        },
        pairs_matched: 1,
        match_gaps: vec![MatchGap {
            instrument: "BTC/USDT".into(),
            primary_timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 12, 5, 0).unwrap(),
            nearest_offset_ms: Some(-300_000),
        }],
        rows_computed: 1,
        rows_dropped: 0,
        rows_upserted: 1,
        dataset_rows: 10,
        warnings: vec![PremiaError::schema(
            Venue::Primary,
            "close",
            Some("abc".into()),
            "not a decimal",
        )],
    };

    let json = serde_json::to_string(&report).expect("serialize report");
    let de: CycleReport = serde_json::from_str(&json).expect("deserialize report");
    assert_eq!(de, report);
    assert_eq!(de.schema_failures(), 1);
    assert_eq!(de.records_normalized(), 3);
}

#[test]
fn error_classification() {
    assert!(PremiaError::schema(Venue::Secondary, "open", None, "missing").is_record_level());
    assert!(
        PremiaError::computation("BTC/USDT", "2024-01-01T00:00:00Z", "overflow").is_record_level()
    );
    assert!(PremiaError::corruption("x.csv", "bad header").is_fatal());
    assert!(PremiaError::source(Venue::Primary, "timeout").is_fatal());
    assert!(PremiaError::Store("disk full".into()).is_fatal());
}

#[test]
fn error_messages_name_field_and_raw_value() {
    let err = PremiaError::schema(Venue::Primary, "close", Some("1,0".into()), "not a decimal");
    let msg = err.to_string();
    assert!(msg.contains("primary"));
    assert!(msg.contains("close"));
    assert!(msg.contains("1,0"));
}
