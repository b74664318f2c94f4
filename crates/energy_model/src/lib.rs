//! Block and wallet documents plus the byte-size energy heuristic.
//!
//! This crate exposes:
//! - Documents served by blockchain.info style endpoints: `BlockSummary`, `RawBlock`, `Transaction`, `Wallet`
//! - The heuristic itself: `CONVERSION_FACTOR`, `power_consumption`, `total_power_consumption`
//! - Calendar helpers used to walk days backwards: `day::{end_of_day, previous_day, format_day}`
//! - The per-day output record: `DailyConsumption`
pub mod day;
pub mod types;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use types::{BlockSummary, Input, Output, RawBlock, SpendingOutpoint, Transaction, Wallet};

/// Energy estimate per byte of block or transaction data, in kWh.
pub const CONVERSION_FACTOR: f64 = 4.56;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("local time {0} does not exist in this time zone")]
    NonexistentLocalTime(chrono::NaiveDateTime),
    #[error("date arithmetic out of range before {0}")]
    OutOfRange(chrono::NaiveDate),
}

/// Estimated consumption of a single day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyConsumption {
    /// Calendar day in `YYYY-MM-DD` form.
    pub date: String,
    pub consumption: f64,
}

/// Energy estimate for `size` bytes.
pub fn power_consumption(size: u64) -> f64 {
    size as f64 * CONVERSION_FACTOR
}

/// Folds a set of sizes into one estimate. An empty set yields `0.0`.
pub fn total_power_consumption<I>(sizes: I) -> f64
where
    I: IntoIterator<Item = u64>,
{
    sizes
        .into_iter()
        .fold(0.0, |acc, size| acc + power_consumption(size))
}
