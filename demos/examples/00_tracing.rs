use premia::{Instrument, Reconciler};
use premia_demos::common::dataset_dir;
use premia_mock::{MockSource, binance_schema, upbit_schema};
use tracing_subscriber::fmt::format::FmtSpan;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Span enter/exit events show each cycle stage.
    // Suggested: RUST_LOG=info,premia=debug,premia_core=debug,premia_store=debug
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .with_span_events(FmtSpan::ENTER | FmtSpan::EXIT)
        .try_init();

    let (dir, _guard) = dataset_dir()?;
    let reconciler = Reconciler::builder()
        .primary(binance_schema())
        .secondary(upbit_schema())
        .windows(&[3, 12])
        .dataset_path(dir.join("combined_candles.csv"))
        .build()?;

    let instruments = [Instrument::parse("BTC/KRW")?];
    let _ = reconciler
        .run_with_sources(&MockSource::binance(), &MockSource::upbit(), &instruments)
        .await?;

    Ok(())
}
