//! Query modules for the analyzer.
//!
//! Each module provides a query struct that borrows from a
//! [`Backend`](crate::backend::Backend) and exposes methods returning `Result<T>`.

pub mod days;
pub mod stats;
pub mod storage;

pub use days::{day_bounds, DayQuery};
pub use stats::StatsQuery;
pub use storage::StorageQuery;
