//! Record Normalizer: raw venue payloads → canonical `CandleRecord`s.
//!
//! Normalization is a pure transform. Every rejection is a structured
//! `PremiaError::Schema` naming the canonical field and, where one exists, the
//! raw value; a rejected payload never aborts the batch.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde_json::Value;

use crate::record::{CandleRecord, Instrument, RawCandle};
use premia_types::{
    CanonicalField, PremiaError, Venue, VenueCounts, VenueSchema, normalize_field_name,
};

const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];
const OFFSET_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%d %H:%M:%S%.f%z"];

/// Output of normalizing one venue batch.
#[derive(Debug, Clone, Default)]
pub struct NormalizedBatch {
    /// Accepted records, sorted by `(instrument, timestamp)`, one per key.
    pub records: Vec<CandleRecord>,
    /// Counters for the cycle report.
    pub counts: VenueCounts,
    /// One schema error per rejected payload.
    pub errors: Vec<PremiaError>,
}

impl NormalizedBatch {
    /// Split records per instrument, preserving timestamp order.
    #[must_use]
    pub fn into_instruments(self) -> BTreeMap<Instrument, Vec<CandleRecord>> {
        let mut out: BTreeMap<Instrument, Vec<CandleRecord>> = BTreeMap::new();
        for rec in self.records {
            out.entry(rec.instrument.clone()).or_default().push(rec);
        }
        out
    }
}

/// Normalizer bound to one venue and its schema.
#[derive(Debug, Clone, Copy)]
pub struct Normalizer<'a> {
    venue: Venue,
    schema: &'a VenueSchema,
}

impl<'a> Normalizer<'a> {
    /// Create a normalizer for `venue` using `schema`'s aliases and grid.
    #[must_use]
    pub const fn new(venue: Venue, schema: &'a VenueSchema) -> Self {
        Self { venue, schema }
    }

    /// Normalize a whole batch.
    ///
    /// Behavior:
    /// - rejected payloads are counted and their errors collected;
    /// - records sharing `(instrument, timestamp)` collapse to the last
    ///   occurrence in input order, and the number collapsed is counted;
    /// - the surviving records are sorted by `(instrument, timestamp)`.
    #[must_use]
    pub fn normalize_batch(&self, raws: &[RawCandle]) -> NormalizedBatch {
        let mut counts = VenueCounts {
            received: raws.len(),
            ..VenueCounts::default()
        };
        let mut errors = Vec::new();
        let mut keyed: BTreeMap<(Instrument, DateTime<Utc>), CandleRecord> = BTreeMap::new();

        for raw in raws {
            match self.normalize(raw) {
                Ok(rec) => match keyed.entry((rec.instrument.clone(), rec.timestamp)) {
                    Entry::Vacant(v) => {
                        v.insert(rec);
                    }
                    Entry::Occupied(mut o) => {
                        o.insert(rec);
                        counts.duplicates_collapsed += 1;
                    }
                },
                Err(e) => {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(venue = %self.venue, error = %e, "dropping malformed record");
                    counts.rejected += 1;
                    errors.push(e);
                }
            }
        }

        counts.normalized = keyed.len();
        NormalizedBatch {
            records: keyed.into_values().collect(),
            counts,
            errors,
        }
    }

    /// Normalize a single payload.
    ///
    /// # Errors
    /// Returns `PremiaError::Schema` when a required field is missing, two
    /// aliases of one field disagree, a value cannot be coerced, the OHLC or
    /// volume invariants fail, or the timestamp is off the venue grid.
    pub fn normalize(&self, raw: &RawCandle) -> Result<CandleRecord, PremiaError> {
        let fields = self.resolve_fields(raw)?;
        let get = |f: CanonicalField| fields.get(&f).map(|(_, v)| *v);
        let required = |f: CanonicalField| {
            get(f).ok_or_else(|| self.err(f, None, "missing required field"))
        };

        let instrument = {
            let v = required(CanonicalField::Instrument)?;
            let s = v
                .as_str()
                .ok_or_else(|| self.err(CanonicalField::Instrument, Some(v), "expected a string"))?;
            Instrument::parse(s)
                .map_err(|reason| self.err(CanonicalField::Instrument, Some(v), reason))?
        };

        let timestamp = self.parse_timestamp(required(CanonicalField::Timestamp)?)?;
        let open = self.parse_decimal(CanonicalField::Open, required(CanonicalField::Open)?)?;
        let high = self.parse_decimal(CanonicalField::High, required(CanonicalField::High)?)?;
        let low = self.parse_decimal(CanonicalField::Low, required(CanonicalField::Low)?)?;
        let close = self.parse_decimal(CanonicalField::Close, required(CanonicalField::Close)?)?;
        let volume =
            self.parse_decimal(CanonicalField::Volume, required(CanonicalField::Volume)?)?;
        let quote_volume = get(CanonicalField::QuoteVolume)
            .map(|v| self.parse_decimal(CanonicalField::QuoteVolume, v))
            .transpose()?;
        let source = get(CanonicalField::Source)
            .map(|v| {
                v.as_str()
                    .map(|s| s.trim().to_string())
                    .ok_or_else(|| self.err(CanonicalField::Source, Some(v), "expected a string"))
            })
            .transpose()?
            .filter(|s| !s.is_empty());

        if volume < Decimal::ZERO {
            return Err(self.err(
                CanonicalField::Volume,
                Some(&Value::String(volume.to_string())),
                "must be >= 0",
            ));
        }
        if let Some(q) = quote_volume.filter(|q| *q < Decimal::ZERO) {
            return Err(self.err(
                CanonicalField::QuoteVolume,
                Some(&Value::String(q.to_string())),
                "must be >= 0",
            ));
        }
        if low > high {
            return Err(self.err(
                CanonicalField::Low,
                None,
                format!("low {low} exceeds high {high}"),
            ));
        }
        for (field, px) in [(CanonicalField::Open, open), (CanonicalField::Close, close)] {
            if px < low || px > high {
                return Err(self.err(
                    field,
                    Some(&Value::String(px.to_string())),
                    format!("outside [low {low}, high {high}]"),
                ));
            }
        }
        if let Some(grid) = self.schema.grid {
            let step_ms = i64::try_from(grid.as_millis()).unwrap_or(i64::MAX);
            if step_ms > 0 && timestamp.timestamp_millis().rem_euclid(step_ms) != 0 {
                return Err(self.err(
                    CanonicalField::Timestamp,
                    Some(&Value::String(timestamp.to_rfc3339())),
                    format!("not aligned to the {}s grid", grid.as_secs()),
                ));
            }
        }

        Ok(CandleRecord {
            instrument,
            venue: self.venue,
            timestamp,
            open,
            high,
            low,
            close,
            volume,
            quote_volume,
            source,
        })
    }

    /// Map payload keys to canonical fields, rejecting disagreeing aliases.
    /// JSON `null` counts as absent.
    fn resolve_fields<'r>(
        &self,
        raw: &'r RawCandle,
    ) -> Result<BTreeMap<CanonicalField, (&'r str, &'r Value)>, PremiaError> {
        let mut out: BTreeMap<CanonicalField, (&str, &Value)> = BTreeMap::new();
        for (key, value) in raw.iter() {
            if value.is_null() {
                continue;
            }
            let Some(field) = self.schema.resolve(&normalize_field_name(key)) else {
                continue;
            };
            match out.entry(field) {
                Entry::Vacant(v) => {
                    v.insert((key.as_str(), value));
                }
                Entry::Occupied(o) => {
                    let (prev_key, prev_value) = *o.get();
                    if prev_value != value {
                        return Err(self.err(
                            field,
                            Some(value),
                            format!("conflicts with '{prev_key}' = {}", raw_text(prev_value)),
                        ));
                    }
                }
            }
        }
        Ok(out)
    }

    fn parse_decimal(&self, field: CanonicalField, v: &Value) -> Result<Decimal, PremiaError> {
        let text = match v {
            Value::String(s) => s.trim().to_string(),
            Value::Number(n) => n.to_string(),
            _ => return Err(self.err(field, Some(v), "expected a number or numeric string")),
        };
        Decimal::from_str(&text)
            .or_else(|_| Decimal::from_scientific(&text))
            .map_err(|_| self.err(field, Some(v), "not a decimal"))
    }

    fn parse_timestamp(&self, v: &Value) -> Result<DateTime<Utc>, PremiaError> {
        let field = CanonicalField::Timestamp;
        let parsed = match v {
            Value::Number(n) => n.as_i64().and_then(DateTime::from_timestamp_millis),
            Value::String(s) => parse_timestamp_text(s.trim()),
            _ => None,
        };
        parsed.ok_or_else(|| {
            self.err(
                field,
                Some(v),
                "expected RFC 3339, 'YYYY-MM-DD HH:MM:SS' (UTC) or epoch milliseconds",
            )
        })
    }

    fn err(
        &self,
        field: CanonicalField,
        raw: Option<&Value>,
        reason: impl Into<String>,
    ) -> PremiaError {
        PremiaError::schema(self.venue, field.as_str(), raw.map(raw_text), reason)
    }
}

fn parse_timestamp_text(s: &str) -> Option<DateTime<Utc>> {
    if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) {
        return s.parse::<i64>().ok().and_then(DateTime::from_timestamp_millis);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Some(dt.with_timezone(&Utc));
        }
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|n| n.and_utc())
}

fn raw_text(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
