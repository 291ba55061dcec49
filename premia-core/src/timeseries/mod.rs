//! Time-series stages of one reconciliation cycle.
//!
//! - `align`: pair primary and secondary records under a timestamp tolerance
//! - `rolling`: bounded trailing buffer with incremental window sums
//! - `features`: premium spread and rolling features per instrument
/// Nearest-neighbour matching of two venue series.
pub mod align;
/// Feature rows built from matched pairs and persisted history.
pub mod features;
/// Rolling-window running sums.
pub mod rolling;
