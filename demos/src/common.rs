use std::error::Error;
use std::path::{Path, PathBuf};

use premia::{CycleReport, FeatureRow, PremiaConfig};
use tempfile::TempDir;

/// Install a compact subscriber filtered by `RUST_LOG` (default `info`).
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .try_init();
}

/// Directory holding the demo dataset.
///
/// Uses `PREMIA_DEMO_DIR` when set so the dataset can be inspected after the
/// run; otherwise a temporary directory removed on drop.
///
/// # Errors
/// Returns the I/O error if the directory cannot be created.
pub fn dataset_dir() -> std::io::Result<(PathBuf, Option<TempDir>)> {
    if let Ok(dir) = std::env::var("PREMIA_DEMO_DIR") {
        std::fs::create_dir_all(&dir)?;
        return Ok((PathBuf::from(dir), None));
    }
    let tmp = tempfile::tempdir()?;
    Ok((tmp.path().to_path_buf(), Some(tmp)))
}

/// Load and validate a JSON configuration file.
///
/// # Errors
/// Returns the read, parse or validation error.
pub fn load_config(path: &Path) -> Result<PremiaConfig, Box<dyn Error>> {
    let text = std::fs::read_to_string(path)?;
    let cfg: PremiaConfig = serde_json::from_str(&text)?;
    cfg.validate()?;
    Ok(cfg)
}

/// Path of a file under the demo crate's `config/` directory.
#[must_use]
pub fn config_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("config").join(name)
}

pub fn print_report(label: &str, report: &CycleReport) {
    println!("== {label} ==");
    println!(
        "normalized: {} primary / {} secondary ({} schema failures, {} duplicates collapsed)",
        report.primary.normalized,
        report.secondary.normalized,
        report.schema_failures(),
        report.primary.duplicates_collapsed + report.secondary.duplicates_collapsed,
    );
    println!(
        "pairs matched: {}, gaps: {}, rows upserted: {}, dataset rows: {}",
        report.pairs_matched,
        report.match_gaps.len(),
        report.rows_upserted,
        report.dataset_rows,
    );
    for gap in &report.match_gaps {
        match gap.nearest_offset_ms {
            Some(ms) => println!(
                "  gap {} @ {} (nearest {ms} ms)",
                gap.instrument, gap.primary_timestamp
            ),
            None => println!(
                "  gap {} @ {} (no secondary data)",
                gap.instrument, gap.primary_timestamp
            ),
        }
    }
    for w in &report.warnings {
        println!("  warning: {w}");
    }
}

pub fn print_row(row: &FeatureRow) {
    print!(
        "{} {} diff={} pct={}",
        row.instrument,
        row.primary_timestamp.format("%Y-%m-%d %H:%M"),
        row.premium_diff,
        row.premium_pct.map_or_else(|| "-".to_string(), |p| format!("{p}%")),
    );
    for w in &row.windows {
        print!(
            " | w{}: avg={} dev={}",
            w.window, w.avg_diff, w.deviation_diff
        );
    }
    println!();
}
