//! Venue tags usable across crates.

use core::fmt;
use serde::{Deserialize, Serialize};

/// One of the two independently sampled data sources being reconciled.
///
/// The primary venue drives the output timestamp grid; every feature row is
/// keyed by a primary timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Venue {
    /// Venue whose timestamps key the output table.
    Primary,
    /// Venue matched against the primary within the tolerance window.
    Secondary,
}

impl Venue {
    /// Returns the lowercase label used in logs and column prefixes.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Secondary => "secondary",
        }
    }
}

impl fmt::Display for Venue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
