use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::venue::Venue;

/// Unified error type for the premia workspace.
///
/// Variants split into two families:
/// - record-level failures (`Schema`, `Computation`) that drop a single
///   record or row and let the cycle continue;
/// - cycle-level failures (`StoreCorruption`, `Store`, `Source`, `InvalidArg`,
///   `Other`) that abort the current reconciliation cycle and are surfaced to
///   the caller unchanged.
#[derive(Debug, Error, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum PremiaError {
    /// A raw payload is missing a required field or carries a value that
    /// cannot be coerced into the canonical schema.
    #[error("schema error ({venue}): field '{field}' raw={raw:?}: {reason}")]
    Schema {
        /// Venue the offending payload came from.
        venue: Venue,
        /// Canonical field name (or the payload key for alias conflicts).
        field: String,
        /// Raw value as received, if any.
        raw: Option<String>,
        /// Human-readable reason.
        reason: String,
    },

    /// The persisted dataset exists but cannot be read or does not match the
    /// expected layout. No merge is attempted.
    #[error("dataset corrupted at {path}: {reason}")]
    StoreCorruption {
        /// Dataset location.
        path: String,
        /// Human-readable reason (parse error, header mismatch, ...).
        reason: String,
    },

    /// Writing the dataset failed; the previous dataset is left in place.
    #[error("dataset write failed: {0}")]
    Store(String),

    /// A feature row could not be computed (for example decimal overflow).
    #[error("computation failed for {instrument} at {timestamp}: {reason}")]
    Computation {
        /// Canonical instrument of the dropped row.
        instrument: String,
        /// Primary timestamp of the dropped row (RFC 3339).
        timestamp: String,
        /// Human-readable reason.
        reason: String,
    },

    /// The external fetch collaborator failed to deliver a venue batch.
    #[error("{venue} source failed: {msg}")]
    Source {
        /// Venue whose batch could not be fetched.
        venue: Venue,
        /// Human-readable error message.
        msg: String,
    },

    /// Invalid input argument or configuration.
    #[error("invalid argument: {0}")]
    InvalidArg(String),

    /// Unknown/opaque error.
    #[error("unknown error: {0}")]
    Other(String),
}

impl PremiaError {
    /// Helper: build a `Schema` error.
    pub fn schema(
        venue: Venue,
        field: impl Into<String>,
        raw: Option<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::Schema {
            venue,
            field: field.into(),
            raw,
            reason: reason.into(),
        }
    }

    /// Helper: build a `StoreCorruption` error.
    pub fn corruption(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::StoreCorruption {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Helper: build a `Computation` error.
    pub fn computation(
        instrument: impl Into<String>,
        timestamp: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::Computation {
            instrument: instrument.into(),
            timestamp: timestamp.into(),
            reason: reason.into(),
        }
    }

    /// Helper: build a `Source` error.
    pub fn source(venue: Venue, msg: impl Into<String>) -> Self {
        Self::Source {
            venue,
            msg: msg.into(),
        }
    }

    /// Returns true if this error only invalidates a single record or row.
    ///
    /// Record-level errors are collected into the cycle report; every other
    /// variant aborts the cycle.
    #[must_use]
    pub const fn is_record_level(&self) -> bool {
        matches!(self, Self::Schema { .. } | Self::Computation { .. })
    }

    /// Returns true if this error must abort the current cycle.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        !self.is_record_level()
    }
}
