#![doc = include_str!("../README.md")]
//! premia-store
//!
//! Incremental, atomically replaced dataset of feature rows.
#![warn(missing_docs)]

mod codec;
mod dataset;
mod lock;
mod store;

pub use crate::codec::{FIXED_COLUMNS, WINDOW_COLUMNS, header};
pub use crate::dataset::{Dataset, UpsertSummary};
pub use crate::store::IncrementalStore;
