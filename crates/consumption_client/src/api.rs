//! Query surface: daily totals plus block and wallet lookups annotated with
//! per-transaction estimates.
use std::sync::Arc;

use energy_model::{DailyConsumption, RawBlock, Transaction, Wallet, power_consumption};
use serde::Serialize;
use thiserror::Error;

use crate::aggregate::{AggregateError, DailyConsumptionAggregator};
use crate::cache::BlockSizeCache;
use crate::net::{DetailSource, FetchError};
use crate::store::SizeStore;

const TRANSACTION_DESCRIPTION: &str = "Transaction power consumption in kWh";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Aggregate(#[from] AggregateError),
    #[error("failed to fetch block {hash}: {source}")]
    Block {
        hash: String,
        #[source]
        source: FetchError,
    },
    #[error("failed to fetch wallet {address}: {source}")]
    Wallet {
        address: String,
        #[source]
        source: FetchError,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionReport {
    pub hash: String,
    pub description: String,
    pub power_consumption: f64,
}

impl From<&Transaction> for TransactionReport {
    fn from(tx: &Transaction) -> Self {
        TransactionReport {
            hash: tx.hash.clone(),
            description: TRANSACTION_DESCRIPTION.to_string(),
            power_consumption: power_consumption(tx.size),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlockReport {
    #[serde(flatten)]
    pub block: RawBlock,
    pub tx_power_consumption: Vec<TransactionReport>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WalletReport {
    #[serde(flatten)]
    pub wallet: Wallet,
    pub total_power_consumption: f64,
    pub tx_power_consumption: Vec<TransactionReport>,
}

fn transaction_reports(txs: &[Transaction]) -> Vec<TransactionReport> {
    txs.iter().map(TransactionReport::from).collect()
}

pub struct EnergyApi<B, S> {
    source: Arc<B>,
    aggregator: DailyConsumptionAggregator<B, S>,
}

impl<B: DetailSource, S: SizeStore> EnergyApi<B, S> {
    pub fn new(source: Arc<B>, cache: Arc<BlockSizeCache<S>>) -> Self {
        let aggregator = DailyConsumptionAggregator::new(Arc::clone(&source), cache);
        EnergyApi { source, aggregator }
    }

    pub fn aggregator(&self) -> &DailyConsumptionAggregator<B, S> {
        &self.aggregator
    }

    pub async fn daily_consumption(
        &self,
        number_of_days: i64,
    ) -> Result<Vec<DailyConsumption>, ApiError> {
        Ok(self
            .aggregator
            .compute_daily_consumption(number_of_days)
            .await?)
    }

    /// Block detail with a power estimate per transaction.
    ///
    /// With `BlockchainInfoClient` as the source, `hash` must be a 64-character
    /// hex block hash; anything else fails with `FetchError::InvalidHash`.
    pub async fn block(&self, hash: &str) -> Result<BlockReport, ApiError> {
        let block = self
            .source
            .raw_block(hash)
            .await
            .map_err(|source| ApiError::Block {
                hash: hash.to_string(),
                source,
            })?;
        let tx_power_consumption = transaction_reports(&block.tx);
        Ok(BlockReport {
            block,
            tx_power_consumption,
        })
    }

    pub async fn wallet(
        &self,
        address: &str,
        limit: Option<u32>,
        offset: Option<u32>,
    ) -> Result<WalletReport, ApiError> {
        let wallet = self
            .source
            .wallet(address, limit.unwrap_or(0), offset.unwrap_or(0))
            .await
            .map_err(|source| ApiError::Wallet {
                address: address.to_string(),
                source,
            })?;
        let tx_power_consumption = transaction_reports(&wallet.txs);
        let total_power_consumption: f64 = tx_power_consumption
            .iter()
            .map(|r| r.power_consumption)
            .sum();
        Ok(WalletReport {
            wallet,
            total_power_consumption,
            tx_power_consumption,
        })
    }
}
