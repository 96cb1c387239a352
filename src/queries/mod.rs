//! Query interfaces over the journal's tables.
//!
//! Each struct borrows the [`Connection`](crate::connection::Connection) (and,
//! for charts, the [`FileHost`](crate::file_host::FileHost)) from the owning
//! [`ChartJournal`](crate::ChartJournal) and returns typed models.

pub mod charts;
pub mod strategy_types;

pub use charts::{ChartQuery, ImageSource, ImageUpload};
pub use strategy_types::StrategyTypeQuery;
