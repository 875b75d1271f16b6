//! Records exactly as the node returns them. Every field is optional here; which ones
//! are required is decided during conversion.

use serde::Deserialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcBlock {
    pub difficulty: Option<String>,
    pub extra_data: Option<String>,
    pub gas_limit: Option<String>,
    pub gas_used: Option<String>,
    pub hash: Option<String>,
    pub logs_bloom: Option<String>,
    pub miner: Option<String>,
    pub mix_hash: Option<String>,
    pub nonce: Option<String>,
    pub number: Option<String>,
    pub parent_hash: Option<String>,
    pub receipts_root: Option<String>,
    pub sha3_uncles: Option<String>,
    pub size: Option<String>,
    pub state_root: Option<String>,
    pub timestamp: Option<String>,
    pub total_difficulty: Option<String>,
    #[serde(default)]
    pub transactions: Vec<RpcTransaction>,
    pub transactions_root: Option<String>,
    #[serde(default)]
    pub uncles: Vec<String>,
    pub base_fee_per_gas: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcTransaction {
    pub block_hash: Option<String>,
    pub block_number: Option<String>,
    pub from: Option<String>,
    pub gas: Option<String>,
    pub gas_price: Option<String>,
    pub max_fee_per_gas: Option<String>,
    pub max_priority_fee_per_gas: Option<String>,
    pub hash: Option<String>,
    pub input: Option<String>,
    pub nonce: Option<String>,
    pub to: Option<String>,
    pub transaction_index: Option<String>,
    pub value: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub chain_id: Option<String>,
    pub v: Option<String>,
    pub r: Option<String>,
    pub s: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcLog {
    pub address: Option<String>,
    #[serde(default)]
    pub topics: Vec<String>,
    pub data: Option<String>,
    pub block_number: Option<String>,
    pub transaction_hash: Option<String>,
    pub transaction_index: Option<String>,
    pub block_hash: Option<String>,
    pub log_index: Option<String>,
    #[serde(default)]
    pub removed: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcReceipt {
    pub block_hash: Option<String>,
    pub block_number: Option<String>,
    pub contract_address: Option<String>,
    pub cumulative_gas_used: Option<String>,
    pub gas_used: Option<String>,
    pub status: Option<String>,
    pub to: Option<String>,
    pub transaction_hash: Option<String>,
    pub transaction_index: Option<String>,
    #[serde(default)]
    pub logs: Vec<RpcLog>,
    pub logs_bloom: Option<String>,
    pub from: Option<String>,
    pub effective_gas_price: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

/// Entry of a `debug_accountRange` page. The balance is a decimal string on geth.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcAccount {
    pub balance: String,
    #[serde(default)]
    pub nonce: u64,
    pub root: Option<String>,
    pub code_hash: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RpcAccountPage {
    pub root: String,
    #[serde(default)]
    pub accounts: BTreeMap<String, RpcAccount>,
    /// Opaque continuation token. Absent once the node reached the end of the range.
    #[serde(default)]
    pub next: Option<String>,
}
