use premia::Reconciler;
use premia_demos::common::{dataset_dir, init_tracing, print_report};
use premia_mock::{MockSource, binance_schema, upbit_schema};

fn reconciler(path: std::path::PathBuf) -> Result<Reconciler, premia::PremiaError> {
    Reconciler::builder()
        .primary(binance_schema())
        .secondary(upbit_schema())
        .windows(&[3, 12])
        .dataset_path(path)
        .build()
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let (dir, _guard) = dataset_dir()?;

    // One cycle per hour of data, as an external scheduler would run it.
    let hourly = reconciler(dir.join("hourly.csv"))?;
    for hour in 0..3 {
        let (from, to) = (hour * 12, hour * 12 + 12);
        let report = hourly
            .run_with_sources(
                &MockSource::binance().slots(from, to),
                &MockSource::upbit().slots(from, to),
                &[],
            )
            .await?;
        print_report(&format!("hour {hour}"), &report);
    }

    // Re-delivering the last hour changes nothing.
    let before = std::fs::read(hourly.store().path())?;
    hourly
        .run_with_sources(
            &MockSource::binance().slots(24, 36),
            &MockSource::upbit().slots(24, 36),
            &[],
        )
        .await?;
    let after = std::fs::read(hourly.store().path())?;
    println!("re-run identical: {}", before == after);

    // The same three hours in one cycle produce the same dataset.
    let once = reconciler(dir.join("once.csv"))?;
    once.run_with_sources(
        &MockSource::binance().slots(0, 36),
        &MockSource::upbit().slots(0, 36),
        &[],
    )
    .await?;
    let same = hourly.store().load().await?.rows() == once.store().load().await?.rows();
    println!("hourly == one-shot: {same}");
    if !same {
        return Err("incremental and one-shot datasets differ".into());
    }
    Ok(())
}
