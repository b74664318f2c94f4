use async_trait::async_trait;
use energy_model::{BlockSummary, RawBlock, Wallet};
use reqwest::{Client, Url, header};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::{BlockSource, DetailSource, FetchError};

/// Default public endpoint.
pub const DEFAULT_BASE_URL: &str = "https://blockchain.info";

/// Minimal client for the blockchain.info data API.
///
/// Only the three read endpoints needed for estimates are covered:
/// - `/blocks/{millis}?format=json` lists a day of blocks;
/// - `/rawblock/{hash}` returns block detail including transactions;
/// - `/rawaddr/{address}` returns an address with its transactions.
pub struct BlockchainInfoClient {
    client: Client,
    base: Url,
}

impl BlockchainInfoClient {
    /// Creates a client rooted at `url`, e.g. `https://blockchain.info`.
    pub fn new(url: &str) -> Result<Self, FetchError> {
        let base = Url::parse(url).map_err(|e| FetchError::Client(e.to_string()))?;
        match base.scheme() {
            "http" | "https" => {}
            _ => {
                return Err(FetchError::NonHttpUrl);
            }
        }

        let client = Client::new();

        Ok(BlockchainInfoClient { client, base })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, FetchError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| FetchError::NonHttpUrl)?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get<T>(&self, url: Url, query: &[(&str, String)]) -> Result<T, FetchError>
    where
        T: DeserializeOwned,
    {
        debug!(%url, ?query, "GET");
        let res = self
            .client
            .get(url)
            .query(query)
            .header(header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| FetchError::Client(e.to_string()))?;

        if !res.status().is_success() {
            return Err(FetchError::Status(res.status()));
        }

        let bytes = res
            .bytes()
            .await
            .map_err(|e| FetchError::Client(e.to_string()))?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Blocks mined in the 24 hours ending at `upper_bound_millis`.
    pub async fn get_blocks(&self, upper_bound_millis: i64) -> Result<Vec<BlockSummary>, FetchError> {
        let url = self.endpoint(&["blocks", &upper_bound_millis.to_string()])?;
        self.get(url, &[("format", "json".to_string())]).await
    }

    /// Full block detail for `hash`.
    ///
    /// Only 64-character hex block hashes are accepted. Other identifiers
    /// that the endpoint itself might resolve, such as block indexes, fail
    /// with `FetchError::InvalidHash` without a request being sent.
    pub async fn get_raw_block(&self, hash: &str) -> Result<RawBlock, FetchError> {
        validate_block_hash(hash)?;
        let url = self.endpoint(&["rawblock", hash])?;
        self.get(url, &[]).await
    }

    /// Address detail with its transactions.
    ///
    /// `limit` and `offset` are only sent when greater than zero.
    pub async fn get_wallet(
        &self,
        address: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Wallet, FetchError> {
        let url = self.endpoint(&["rawaddr", address])?;
        self.get(url, &wallet_query(limit, offset)).await
    }
}

#[async_trait]
impl BlockSource for BlockchainInfoClient {
    async fn list_blocks_up_to(
        &self,
        reference_time_millis: i64,
    ) -> Result<Vec<BlockSummary>, FetchError> {
        self.get_blocks(reference_time_millis).await
    }

    async fn fetch_block_size(&self, hash: &str) -> Result<u64, FetchError> {
        Ok(self.get_raw_block(hash).await?.size)
    }
}

#[async_trait]
impl DetailSource for BlockchainInfoClient {
    async fn raw_block(&self, hash: &str) -> Result<RawBlock, FetchError> {
        self.get_raw_block(hash).await
    }

    async fn wallet(&self, address: &str, limit: u32, offset: u32) -> Result<Wallet, FetchError> {
        self.get_wallet(address, limit, offset).await
    }
}

fn wallet_query(limit: u32, offset: u32) -> Vec<(&'static str, String)> {
    let mut query = Vec::new();
    if limit > 0 {
        query.push(("limit", limit.to_string()));
    }
    if offset > 0 {
        query.push(("offset", offset.to_string()));
    }
    query
}

/// Rejects anything that is not a 32-byte hex string before it reaches the network.
pub fn validate_block_hash(hash: &str) -> Result<(), FetchError> {
    match hex::decode(hash) {
        Ok(bytes) if bytes.len() == 32 => Ok(()),
        _ => Err(FetchError::InvalidHash(hash.to_string())),
    }
}
