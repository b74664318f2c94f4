//! Durable storage behind the block-size cache.
//!
//! A store holds one ordered collection of `{ "hash": String, "size": u64 }`
//! entries and is always read and written as a whole: `load()` returns every
//! entry, `save()` replaces the full contents.
use std::io;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod file;
pub mod memory;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Persisted form of a cached block size.
///
/// `size` may be missing in documents written by older tooling; such entries
/// are treated as absent by the cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeEntry {
    pub hash: String,
    #[serde(default)]
    pub size: Option<u64>,
}

pub trait SizeStore: Send + Sync + 'static {
    fn load(&self) -> Result<Vec<SizeEntry>, StoreError>;
    fn save(&self, entries: &[SizeEntry]) -> Result<(), StoreError>;
}
