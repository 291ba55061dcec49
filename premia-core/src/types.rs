//! Re-export of shared types so downstream crates can depend on `premia-core` only.

pub use premia_types::{
    CanonicalField, CycleReport, MAX_PCT_SCALE, MatchGap, PremiaConfig, PremiaError, Venue,
    VenueCounts, VenueSchema, WindowSet, normalize_field_name,
};

pub use chrono::{DateTime, TimeDelta, Utc};
pub use rust_decimal::Decimal;
