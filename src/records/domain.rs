use arrayvec::ArrayVec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::hex::Quantity;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub difficulty: Quantity,
    pub extra_data: String,
    pub gas_limit: Quantity,
    pub gas_used: Quantity,
    pub hash: String,
    pub logs_bloom: String,
    pub miner: String,
    pub mix_hash: String,
    pub nonce: Option<Quantity>,
    pub number: Quantity,
    pub parent_hash: String,
    pub receipts_root: String,
    pub sha3_uncles: String,
    pub size: Quantity,
    pub state_root: String,
    pub timestamp: Quantity,
    pub total_difficulty: Option<Quantity>,
    pub transactions_root: String,
    pub uncles: Vec<String>,
    pub base_fee_per_gas: Option<Quantity>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub block_hash: String,
    pub block_number: Quantity,
    pub from: String,
    pub gas: Quantity,
    pub gas_price: Option<Quantity>,
    pub max_fee_per_gas: Option<Quantity>,
    pub max_priority_fee_per_gas: Option<Quantity>,
    pub hash: String,
    pub input: String,
    pub nonce: Quantity,
    /// Empty for contract creations.
    pub to: String,
    pub transaction_index: Quantity,
    pub value: Quantity,
    #[serde(rename = "type")]
    pub kind: Option<Quantity>,
    pub chain_id: Option<Quantity>,
    pub v: String,
    pub r: String,
    pub s: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Log {
    pub address: String,
    pub topics: ArrayVec<String, 4>,
    pub data: String,
    pub block_number: Quantity,
    pub transaction_hash: String,
    pub transaction_index: Quantity,
    pub block_hash: String,
    pub log_index: Quantity,
    pub removed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    pub block_hash: String,
    pub block_number: Quantity,
    /// Empty unless the transaction created a contract.
    pub contract_address: String,
    pub cumulative_gas_used: Quantity,
    pub gas_used: Quantity,
    /// Missing on pre-Byzantium receipts.
    pub status: Option<Quantity>,
    pub to: String,
    pub transaction_hash: String,
    pub transaction_index: Quantity,
    pub logs: Vec<Log>,
    pub logs_bloom: String,
    pub from: String,
    pub effective_gas_price: Option<Quantity>,
    #[serde(rename = "type")]
    pub kind: Option<Quantity>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FullTransaction {
    pub base_transaction: Transaction,
    pub receipt: Receipt,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FullBlock {
    pub base_block: Block,
    pub full_transactions: Vec<FullTransaction>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub balance: Quantity,
    pub nonce: u64,
    pub root: String,
    pub code_hash: String,
    pub is_contract: bool,
}

/// Accounts keyed by lowercase address. Ordered so that every file written from it is
/// canonical.
pub type AccountStore = BTreeMap<String, Account>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractCode {
    pub address: String,
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceSheet {
    pub address: String,
    pub balance: Quantity,
    /// Unix seconds at which the balance was read.
    pub updated_at: i64,
}
