//! Daily energy consumption estimates for blockchain activity.
//!
//! - `net`: block data source (`BlockSource`) and its blockchain.info client
//! - `store`: whole-document persistence for cached block sizes
//! - `cache`: `BlockSizeCache`, deduplicating size lookups across queries
//! - `aggregate`: `DailyConsumptionAggregator`, the day-by-day walk
//! - `api`: the query surface used by the `block-energy` binary
pub mod aggregate;
pub mod api;
pub mod cache;
pub mod net;
pub mod store;
