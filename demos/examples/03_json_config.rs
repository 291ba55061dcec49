use premia::{RawCandle, Reconciler};
use premia_demos::common::{
    config_path, dataset_dir, init_tracing, load_config, print_report, print_row,
};

const PRIMARY: &[&str] = &[
    r#"{"symbol": "BTC_USDT", "open_time": 1704110400000, "open": "100", "high": "100.5", "low": "99.5", "close": "100", "volume": "12.5", "source": "Binance_perpetual"}"#,
];

const SECONDARY: &[&str] = &[
    r#"{"market": "BTC-USDT", "candle_date_time_utc": "2024-01-01T11:59:00", "opening_price": 99.0, "high_price": 99.2, "low_price": 98.9, "trade_price": 99.0, "candle_acc_trade_volume": 3.2, "source": "Upbit"}"#,
    r#"{"market": "BTC-USDT", "candle_date_time_utc": "2024-01-01T12:01:30", "opening_price": 101.0, "high_price": 101.0, "low_price": 100.8, "trade_price": 101.0, "candle_acc_trade_volume": 1.1, "source": "Upbit"}"#,
    r#"{"market": "BTC-USDT", "candle_date_time_utc": "not a time", "opening_price": 1, "high_price": 1, "low_price": 1, "trade_price": 1, "candle_acc_trade_volume": 1}"#,
];

fn parse(lines: &[&str]) -> Result<Vec<RawCandle>, serde_json::Error> {
    lines.iter().map(|l| RawCandle::from_json(l)).collect()
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let cfg = load_config(&config_path("premia.json"))?;
    println!(
        "tolerance {:?}, windows {:?}, scale {}",
        cfg.tolerance,
        cfg.windows.sizes(),
        cfg.pct_scale
    );

    let (dir, _guard) = dataset_dir()?;
    let reconciler = Reconciler::builder()
        .config(cfg)
        .dataset_path(dir.join("json_config.csv"))
        .build()?;

    let report = reconciler
        .run_cycle(parse(PRIMARY)?, parse(SECONDARY)?)
        .await?;
    print_report("json config", &report);
    for row in reconciler.store().load().await?.rows() {
        print_row(row);
    }
    Ok(())
}
