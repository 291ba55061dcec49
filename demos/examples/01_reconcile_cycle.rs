use std::time::Duration;

use premia::{Instrument, Reconciler};
use premia_demos::common::{dataset_dir, init_tracing, print_report, print_row};
use premia_mock::{MockSource, binance_schema, upbit_schema};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let (dir, _guard) = dataset_dir()?;
    let reconciler = Reconciler::builder()
        .primary(binance_schema())
        .secondary(upbit_schema())
        .tolerance(Duration::from_secs(120))
        .windows(&[3, 12])
        .dataset_path(dir.join("combined_candles.csv"))
        .build()?;

    // Two hours of 5-minute candles for both fixture markets.
    let instruments = [Instrument::parse("BTC/KRW")?, Instrument::parse("eth-krw")?];
    let report = reconciler
        .run_with_sources(
            &MockSource::binance().slots(0, 24),
            &MockSource::upbit().slots(0, 24),
            &instruments,
        )
        .await?;
    print_report("cycle", &report);

    let dataset = reconciler.store().load().await?;
    for inst in &instruments {
        println!("-- last rows of {inst}");
        let rows = dataset.instrument_rows(inst);
        for row in &rows[rows.len().saturating_sub(3)..] {
            print_row(row);
        }
    }
    println!("dataset: {}", reconciler.store().path().display());
    Ok(())
}
