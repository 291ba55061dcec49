//! Shared error taxonomy, configuration and report types for the premia
//! reconciliation workspace.
#![warn(missing_docs)]

mod config;
mod error;
mod reports;
mod venue;

pub use config::{
    CanonicalField, MAX_PCT_SCALE, PremiaConfig, VenueSchema, WindowSet, normalize_field_name,
};
pub use error::PremiaError;
pub use reports::{CycleReport, MatchGap, VenueCounts};
pub use venue::Venue;
