//! CSV layout of the persisted dataset.
//!
//! Column order is a compatibility contract: fixed columns first, then six
//! columns per configured window in ascending window order. Missing values
//! are empty cells.

use std::io::{Read, Write};
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use rust_decimal::Decimal;

use premia_core::{FeatureRow, Instrument, WindowFeatures, WindowSet};

/// Columns preceding the per-window block.
pub const FIXED_COLUMNS: &[&str] = &[
    "instrument",
    "primary_timestamp",
    "secondary_timestamp",
    "time_offset_ms",
    "primary_source",
    "secondary_source",
    "primary_close",
    "secondary_close",
    "premium_diff",
    "premium_pct",
    "primary_volume",
    "secondary_volume",
    "primary_quote_volume",
    "secondary_quote_volume",
];

/// Per-window column stems; the window size is appended as `_{w}`.
pub const WINDOW_COLUMNS: &[&str] = &[
    "avg_diff",
    "avg_pct",
    "deviation_diff",
    "deviation_pct",
    "primary_volume_sum",
    "secondary_volume_sum",
];

/// Full header implied by `windows`.
#[must_use]
pub fn header(windows: &WindowSet) -> Vec<String> {
    let mut cols: Vec<String> = FIXED_COLUMNS.iter().map(|c| (*c).to_string()).collect();
    for w in windows.sizes() {
        cols.extend(WINDOW_COLUMNS.iter().map(|c| format!("{c}_{w}")));
    }
    cols
}

/// Outcome of decoding a dataset body.
pub(crate) enum DecodeError {
    /// Header differs from the configured layout.
    Header(String),
    /// A record could not be decoded; line number and reason.
    Record(u64, String),
    /// Underlying CSV/IO failure.
    Csv(String),
}

pub(crate) fn read_rows<R: Read>(
    rdr: R,
    windows: &WindowSet,
) -> Result<Vec<FeatureRow>, DecodeError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .from_reader(rdr);
    let expected = header(windows);
    let found = rdr.headers().map_err(|e| DecodeError::Csv(e.to_string()))?;
    if found.is_empty() {
        return Err(DecodeError::Header("missing header".into()));
    }
    if found.iter().ne(expected.iter().map(String::as_str)) {
        return Err(DecodeError::Header(format!(
            "header does not match configured windows {:?}: found {} columns, expected {}",
            windows.sizes(),
            found.len(),
            expected.len()
        )));
    }

    let mut rows = Vec::new();
    for rec in rdr.records() {
        let rec = rec.map_err(|e| DecodeError::Csv(e.to_string()))?;
        let line = rec.position().map_or(0, csv::Position::line);
        let row = decode(&rec, windows).map_err(|reason| DecodeError::Record(line, reason))?;
        rows.push(row);
    }
    Ok(rows)
}

pub(crate) fn write_rows<W: Write>(
    w: W,
    rows: &[FeatureRow],
    windows: &WindowSet,
) -> Result<W, String> {
    let mut wtr = csv::WriterBuilder::new().has_headers(false).from_writer(w);
    wtr.write_record(header(windows)).map_err(|e| e.to_string())?;
    for row in rows {
        wtr.write_record(encode(row)).map_err(|e| e.to_string())?;
    }
    wtr.flush().map_err(|e| e.to_string())?;
    wtr.into_inner().map_err(|e| e.to_string())
}

fn encode(row: &FeatureRow) -> Vec<String> {
    let mut out =
        Vec::with_capacity(FIXED_COLUMNS.len() + WINDOW_COLUMNS.len() * row.windows.len());
    out.push(row.instrument.to_string());
    out.push(fmt_ts(row.primary_timestamp));
    out.push(fmt_ts(row.secondary_timestamp));
    out.push(row.time_offset_ms.to_string());
    out.push(row.primary_source.clone().unwrap_or_default());
    out.push(row.secondary_source.clone().unwrap_or_default());
    out.push(row.primary_close.to_string());
    out.push(row.secondary_close.to_string());
    out.push(row.premium_diff.to_string());
    out.push(fmt_opt(row.premium_pct));
    out.push(row.primary_volume.to_string());
    out.push(row.secondary_volume.to_string());
    out.push(fmt_opt(row.primary_quote_volume));
    out.push(fmt_opt(row.secondary_quote_volume));
    for w in &row.windows {
        out.push(w.avg_diff.to_string());
        out.push(fmt_opt(w.avg_pct));
        out.push(w.deviation_diff.to_string());
        out.push(fmt_opt(w.deviation_pct));
        out.push(w.primary_volume_sum.to_string());
        out.push(w.secondary_volume_sum.to_string());
    }
    out
}

fn decode(rec: &csv::StringRecord, windows: &WindowSet) -> Result<FeatureRow, String> {
    let cell = |i: usize| rec.get(i).unwrap_or("");
    let mut windows_out = Vec::with_capacity(windows.len());
    for (k, &size) in windows.sizes().iter().enumerate() {
        let base = FIXED_COLUMNS.len() + k * WINDOW_COLUMNS.len();
        windows_out.push(WindowFeatures {
            window: size,
            avg_diff: dec(&format!("avg_diff_{size}"), cell(base))?,
            avg_pct: opt_dec(&format!("avg_pct_{size}"), cell(base + 1))?,
            deviation_diff: dec(&format!("deviation_diff_{size}"), cell(base + 2))?,
            deviation_pct: opt_dec(&format!("deviation_pct_{size}"), cell(base + 3))?,
            primary_volume_sum: dec(&format!("primary_volume_sum_{size}"), cell(base + 4))?,
            secondary_volume_sum: dec(&format!("secondary_volume_sum_{size}"), cell(base + 5))?,
        });
    }
    Ok(FeatureRow {
        instrument: Instrument::parse(cell(0)).map_err(|e| format!("instrument: {e}"))?,
        primary_timestamp: ts("primary_timestamp", cell(1))?,
        secondary_timestamp: ts("secondary_timestamp", cell(2))?,
        time_offset_ms: cell(3)
            .parse()
            .map_err(|_| format!("time_offset_ms: not an integer: {:?}", cell(3)))?,
        primary_source: opt_str(cell(4)),
        secondary_source: opt_str(cell(5)),
        primary_close: dec("primary_close", cell(6))?,
        secondary_close: dec("secondary_close", cell(7))?,
        premium_diff: dec("premium_diff", cell(8))?,
        premium_pct: opt_dec("premium_pct", cell(9))?,
        primary_volume: dec("primary_volume", cell(10))?,
        secondary_volume: dec("secondary_volume", cell(11))?,
        primary_quote_volume: opt_dec("primary_quote_volume", cell(12))?,
        secondary_quote_volume: opt_dec("secondary_quote_volume", cell(13))?,
        windows: windows_out,
    })
}

fn fmt_ts(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

fn fmt_opt(v: Option<Decimal>) -> String {
    v.map(|d| d.to_string()).unwrap_or_default()
}

fn ts(col: &str, s: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|_| format!("{col}: not an RFC 3339 timestamp: {s:?}"))
}

fn dec(col: &str, s: &str) -> Result<Decimal, String> {
    Decimal::from_str(s).map_err(|_| format!("{col}: not a decimal: {s:?}"))
}

fn opt_dec(col: &str, s: &str) -> Result<Option<Decimal>, String> {
    if s.is_empty() {
        Ok(None)
    } else {
        dec(col, s).map(Some)
    }
}

fn opt_str(s: &str) -> Option<String> {
    (!s.is_empty()).then(|| s.to_string())
}
