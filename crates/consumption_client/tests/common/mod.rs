#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use consumption_client::net::{BlockSource, DetailSource, FetchError};
use energy_model::{BlockSummary, RawBlock, Transaction, Wallet};

pub fn summary(hash: &str) -> BlockSummary {
    BlockSummary {
        hash: hash.to_string(),
        height: 0,
        time: 0,
        block_index: 0,
    }
}

pub fn transaction(hash: &str, size: u64) -> Transaction {
    serde_json::from_value(serde_json::json!({ "hash": hash, "size": size }))
        .expect("valid transaction")
}

/// Scripted data source: listings are handed out in call order, sizes come
/// from a fixed table, and every call is recorded.
#[derive(Default)]
pub struct MockSource {
    listings: Mutex<VecDeque<Result<Vec<BlockSummary>, String>>>,
    sizes: HashMap<String, u64>,
    pub blocks: HashMap<String, RawBlock>,
    pub wallets: HashMap<String, Wallet>,
    upper_bounds: Mutex<Vec<i64>>,
    fetched: Mutex<Vec<String>>,
    size_calls: AtomicUsize,
}

impl MockSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_day(self, hashes: &[&str]) -> Self {
        self.listings
            .lock()
            .unwrap()
            .push_back(Ok(hashes.iter().map(|h| summary(h)).collect()));
        self
    }

    pub fn with_failing_day(self, message: &str) -> Self {
        self.listings
            .lock()
            .unwrap()
            .push_back(Err(message.to_string()));
        self
    }

    pub fn with_size(mut self, hash: &str, size: u64) -> Self {
        self.sizes.insert(hash.to_string(), size);
        self
    }

    pub fn size_calls(&self) -> usize {
        self.size_calls.load(Ordering::SeqCst)
    }

    pub fn fetched(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }

    pub fn upper_bounds(&self) -> Vec<i64> {
        self.upper_bounds.lock().unwrap().clone()
    }
}

#[async_trait]
impl BlockSource for MockSource {
    async fn list_blocks_up_to(
        &self,
        reference_time_millis: i64,
    ) -> Result<Vec<BlockSummary>, FetchError> {
        self.upper_bounds
            .lock()
            .unwrap()
            .push(reference_time_millis);
        match self.listings.lock().unwrap().pop_front() {
            Some(Ok(day)) => Ok(day),
            Some(Err(message)) => Err(FetchError::Client(message)),
            None => Ok(Vec::new()),
        }
    }

    async fn fetch_block_size(&self, hash: &str) -> Result<u64, FetchError> {
        self.size_calls.fetch_add(1, Ordering::SeqCst);
        self.fetched.lock().unwrap().push(hash.to_string());
        tokio::task::yield_now().await;
        self.sizes
            .get(hash)
            .copied()
            .ok_or_else(|| FetchError::Client(format!("unknown block {hash}")))
    }
}

#[async_trait]
impl DetailSource for MockSource {
    async fn raw_block(&self, hash: &str) -> Result<RawBlock, FetchError> {
        self.blocks
            .get(hash)
            .cloned()
            .ok_or_else(|| FetchError::Client(format!("unknown block {hash}")))
    }

    async fn wallet(&self, address: &str, limit: u32, offset: u32) -> Result<Wallet, FetchError> {
        let mut wallet = self
            .wallets
            .get(address)
            .cloned()
            .ok_or_else(|| FetchError::Client(format!("unknown address {address}")))?;
        let skip = offset as usize;
        let take = if limit == 0 { usize::MAX } else { limit as usize };
        wallet.txs = wallet.txs.into_iter().skip(skip).take(take).collect();
        Ok(wallet)
    }
}
