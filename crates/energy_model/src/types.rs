//! Documents returned by blockchain.info compatible endpoints.
//!
//! Only `hash` and `size` are required where they appear; everything else
//! falls back to its default so that sparse or partially filled responses
//! still decode. Unknown fields are ignored.
use serde::{Deserialize, Serialize};

/// Entry of the windowed block listing (`/blocks/{millis}`). Carries no size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockSummary {
    pub hash: String,
    #[serde(default)]
    pub height: u64,
    /// Unix seconds.
    #[serde(default)]
    pub time: u64,
    #[serde(default)]
    pub block_index: u64,
}

/// Full block detail (`/rawblock/{hash}`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawBlock {
    pub hash: String,
    #[serde(default)]
    pub ver: u32,
    #[serde(default)]
    pub prev_block: String,
    #[serde(default)]
    pub mrkl_root: String,
    #[serde(default)]
    pub time: u64,
    #[serde(default)]
    pub bits: u32,
    #[serde(default)]
    pub next_block: Vec<String>,
    #[serde(default)]
    pub fee: u64,
    #[serde(default)]
    pub nonce: u64,
    #[serde(default)]
    pub n_tx: u64,
    pub size: u64,
    #[serde(default)]
    pub block_index: u64,
    #[serde(default)]
    pub main_chain: bool,
    #[serde(default)]
    pub height: u64,
    #[serde(default)]
    pub weight: u64,
    #[serde(default)]
    pub tx: Vec<Transaction>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub hash: String,
    #[serde(default)]
    pub ver: u32,
    #[serde(default)]
    pub vin_sz: u64,
    #[serde(default)]
    pub vout_sz: u64,
    pub size: u64,
    #[serde(default)]
    pub weight: u64,
    #[serde(default)]
    pub fee: u64,
    #[serde(default)]
    pub relayed_by: String,
    #[serde(default)]
    pub lock_time: u64,
    #[serde(default)]
    pub tx_index: u64,
    #[serde(default)]
    pub double_spend: bool,
    #[serde(default)]
    pub time: u64,
    /// Absent for unconfirmed transactions.
    #[serde(default)]
    pub block_index: Option<u64>,
    #[serde(default)]
    pub block_height: Option<u64>,
    #[serde(default)]
    pub inputs: Vec<Input>,
    #[serde(default)]
    pub out: Vec<Output>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Input {
    #[serde(default)]
    pub sequence: u64,
    #[serde(default)]
    pub witness: String,
    #[serde(default)]
    pub script: String,
    #[serde(default)]
    pub index: u64,
    /// Missing on coinbase inputs.
    #[serde(default)]
    pub prev_out: Option<Output>,
}

/// Transaction output, also used for an input's `prev_out`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Output {
    #[serde(default, rename = "type")]
    pub kind: u32,
    #[serde(default)]
    pub spent: bool,
    #[serde(default)]
    pub value: u64,
    #[serde(default)]
    pub spending_outpoints: Vec<SpendingOutpoint>,
    #[serde(default)]
    pub n: u64,
    #[serde(default)]
    pub tx_index: u64,
    #[serde(default)]
    pub script: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub addr: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpendingOutpoint {
    pub tx_index: u64,
    pub n: u64,
}

/// Address detail (`/rawaddr/{address}`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wallet {
    #[serde(default)]
    pub hash160: String,
    pub address: String,
    #[serde(default)]
    pub n_tx: u64,
    #[serde(default)]
    pub n_unredeemed: u64,
    #[serde(default)]
    pub total_received: u64,
    #[serde(default)]
    pub total_sent: u64,
    #[serde(default)]
    pub final_balance: u64,
    #[serde(default)]
    pub txs: Vec<Transaction>,
}
