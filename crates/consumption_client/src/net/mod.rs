//! Access to the external block data source.
//!
//! `BlockSource` is the narrow view the aggregator needs; `blockchain_info`
//! provides the HTTP implementation plus the block and wallet lookups used by
//! the query surface.
use std::fmt;

use async_trait::async_trait;
use energy_model::{BlockSummary, RawBlock, Wallet};
use reqwest::StatusCode;

pub mod blockchain_info;

/// Errors that can occur when talking to the block data source.
#[derive(Debug)]
pub enum FetchError {
    NonHttpUrl,
    Client(String),
    Json(serde_json::Error),
    Status(StatusCode),
    InvalidHash(String),
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::NonHttpUrl => write!(f, "only http:// and https:// URLs are supported"),
            FetchError::Client(e) => write!(f, "client error: {e}"),
            FetchError::Json(e) => write!(f, "JSON error: {e}"),
            FetchError::Status(status) => write!(f, "unexpected HTTP status: {status}"),
            FetchError::InvalidHash(hash) => {
                write!(f, "invalid block hash {hash:?}: expected 64 hex characters")
            }
        }
    }
}

impl std::error::Error for FetchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FetchError::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(e: serde_json::Error) -> Self {
        FetchError::Json(e)
    }
}

/// Source of block listings and block sizes.
#[async_trait]
pub trait BlockSource: Send + Sync {
    /// Blocks mined in the 24 hours ending at `reference_time_millis` (unix ms).
    async fn list_blocks_up_to(
        &self,
        reference_time_millis: i64,
    ) -> Result<Vec<BlockSummary>, FetchError>;

    /// Full size in bytes of the block with the given hash.
    async fn fetch_block_size(&self, hash: &str) -> Result<u64, FetchError>;
}

/// Block and address detail lookups passed straight through to callers.
#[async_trait]
pub trait DetailSource: BlockSource {
    async fn raw_block(&self, hash: &str) -> Result<RawBlock, FetchError>;

    /// `limit` and `offset` of zero mean "not set".
    async fn wallet(&self, address: &str, limit: u32, offset: u32) -> Result<Wallet, FetchError>;
}
