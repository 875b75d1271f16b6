use arrayvec::ArrayVec;
use serde::de::DeserializeOwned;
use thiserror::Error as ThisError;

use super::domain::{
    Account, BalanceSheet, Block, ContractCode, FullTransaction, Log, Receipt, Transaction,
};
use super::raw::{RpcAccount, RpcBlock, RpcLog, RpcReceipt, RpcTransaction};
use crate::hex::{decimal_or_hex_to_int, HexError, Quantity};

#[derive(Debug, ThisError)]
pub enum ConversionError {
    #[error("field {field}: {source}")]
    Hex {
        field: &'static str,
        #[source]
        source: HexError,
    },
    #[error("missing field {0}")]
    MissingField(&'static str),
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),
    #[error("failed to deserialize {kind}: {source}")]
    Deserialize {
        kind: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, ConversionError>;

/// Decodes a raw rpc result into one of the [`super::raw`] shapes.
pub fn decode<T: DeserializeOwned>(kind: &'static str, value: serde_json::Value) -> Result<T> {
    serde_json::from_value(value).map_err(|source| ConversionError::Deserialize { kind, source })
}

fn required<'a>(field: &'static str, v: &'a Option<String>) -> Result<&'a str> {
    v.as_deref().ok_or(ConversionError::MissingField(field))
}

fn quantity(field: &'static str, v: &Option<String>) -> Result<Quantity> {
    Quantity::from_hex(required(field, v)?).map_err(|source| ConversionError::Hex { field, source })
}

fn opt_quantity(field: &'static str, v: &Option<String>) -> Result<Option<Quantity>> {
    v.as_deref()
        .map(|s| Quantity::from_hex(s).map_err(|source| ConversionError::Hex { field, source }))
        .transpose()
}

/// Hashes, addresses and other byte strings, lowercased.
fn bytes(field: &'static str, v: &Option<String>) -> Result<String> {
    required(field, v).map(str::to_ascii_lowercase)
}

fn opt_bytes(v: &Option<String>) -> String {
    v.as_deref().map(str::to_ascii_lowercase).unwrap_or_default()
}

pub fn to_block(raw: RpcBlock) -> Result<(Block, Vec<Transaction>)> {
    let block = Block {
        difficulty: quantity("block.difficulty", &raw.difficulty)?,
        extra_data: opt_bytes(&raw.extra_data),
        gas_limit: quantity("block.gasLimit", &raw.gas_limit)?,
        gas_used: quantity("block.gasUsed", &raw.gas_used)?,
        hash: bytes("block.hash", &raw.hash)?,
        logs_bloom: opt_bytes(&raw.logs_bloom),
        miner: bytes("block.miner", &raw.miner)?,
        mix_hash: opt_bytes(&raw.mix_hash),
        nonce: opt_quantity("block.nonce", &raw.nonce)?,
        number: quantity("block.number", &raw.number)?,
        parent_hash: bytes("block.parentHash", &raw.parent_hash)?,
        receipts_root: bytes("block.receiptsRoot", &raw.receipts_root)?,
        sha3_uncles: opt_bytes(&raw.sha3_uncles),
        size: quantity("block.size", &raw.size)?,
        state_root: bytes("block.stateRoot", &raw.state_root)?,
        timestamp: quantity("block.timestamp", &raw.timestamp)?,
        total_difficulty: opt_quantity("block.totalDifficulty", &raw.total_difficulty)?,
        transactions_root: bytes("block.transactionsRoot", &raw.transactions_root)?,
        uncles: raw.uncles.iter().map(|u| u.to_ascii_lowercase()).collect(),
        base_fee_per_gas: opt_quantity("block.baseFeePerGas", &raw.base_fee_per_gas)?,
    };

    let transactions = raw
        .transactions
        .iter()
        .map(to_transaction)
        .collect::<Result<Vec<_>>>()?;

    Ok((block, transactions))
}

pub fn to_transaction(raw: &RpcTransaction) -> Result<Transaction> {
    Ok(Transaction {
        block_hash: bytes("tx.blockHash", &raw.block_hash)?,
        block_number: quantity("tx.blockNumber", &raw.block_number)?,
        from: bytes("tx.from", &raw.from)?,
        gas: quantity("tx.gas", &raw.gas)?,
        gas_price: opt_quantity("tx.gasPrice", &raw.gas_price)?,
        max_fee_per_gas: opt_quantity("tx.maxFeePerGas", &raw.max_fee_per_gas)?,
        max_priority_fee_per_gas: opt_quantity(
            "tx.maxPriorityFeePerGas",
            &raw.max_priority_fee_per_gas,
        )?,
        hash: bytes("tx.hash", &raw.hash)?,
        input: opt_bytes(&raw.input),
        nonce: quantity("tx.nonce", &raw.nonce)?,
        to: opt_bytes(&raw.to),
        transaction_index: quantity("tx.transactionIndex", &raw.transaction_index)?,
        value: quantity("tx.value", &raw.value)?,
        kind: opt_quantity("tx.type", &raw.kind)?,
        chain_id: opt_quantity("tx.chainId", &raw.chain_id)?,
        v: opt_bytes(&raw.v),
        r: opt_bytes(&raw.r),
        s: opt_bytes(&raw.s),
    })
}

fn to_log(raw: &RpcLog) -> Result<Log> {
    let mut topics = ArrayVec::new();
    for topic in raw.topics.iter() {
        topics.try_push(topic.to_ascii_lowercase()).map_err(|_| {
            ConversionError::ShapeMismatch(format!("log has {} topics", raw.topics.len()))
        })?;
    }

    Ok(Log {
        address: bytes("log.address", &raw.address)?,
        topics,
        data: opt_bytes(&raw.data),
        block_number: quantity("log.blockNumber", &raw.block_number)?,
        transaction_hash: bytes("log.transactionHash", &raw.transaction_hash)?,
        transaction_index: quantity("log.transactionIndex", &raw.transaction_index)?,
        block_hash: bytes("log.blockHash", &raw.block_hash)?,
        log_index: quantity("log.logIndex", &raw.log_index)?,
        removed: raw.removed,
    })
}

pub fn to_receipt(raw: RpcReceipt) -> Result<Receipt> {
    Ok(Receipt {
        block_hash: bytes("receipt.blockHash", &raw.block_hash)?,
        block_number: quantity("receipt.blockNumber", &raw.block_number)?,
        contract_address: opt_bytes(&raw.contract_address),
        cumulative_gas_used: quantity("receipt.cumulativeGasUsed", &raw.cumulative_gas_used)?,
        gas_used: quantity("receipt.gasUsed", &raw.gas_used)?,
        status: opt_quantity("receipt.status", &raw.status)?,
        to: opt_bytes(&raw.to),
        transaction_hash: bytes("receipt.transactionHash", &raw.transaction_hash)?,
        transaction_index: quantity("receipt.transactionIndex", &raw.transaction_index)?,
        logs: raw.logs.iter().map(to_log).collect::<Result<Vec<_>>>()?,
        logs_bloom: opt_bytes(&raw.logs_bloom),
        from: opt_bytes(&raw.from),
        effective_gas_price: opt_quantity("receipt.effectiveGasPrice", &raw.effective_gas_price)?,
        kind: opt_quantity("receipt.type", &raw.kind)?,
    })
}

/// Contracts are accounts whose code hash differs from `empty_code_hash`.
pub fn to_account(raw: RpcAccount, empty_code_hash: &str) -> Result<Account> {
    let balance = decimal_or_hex_to_int(&raw.balance).map_err(|source| ConversionError::Hex {
        field: "account.balance",
        source,
    })?;
    let code_hash = bytes("account.codeHash", &raw.code_hash)?;
    let is_contract = !code_hash.eq_ignore_ascii_case(empty_code_hash);

    Ok(Account {
        balance: balance.into(),
        nonce: raw.nonce,
        root: opt_bytes(&raw.root),
        code_hash,
        is_contract,
    })
}

pub fn to_contract_code(address: &str, raw: serde_json::Value) -> Result<ContractCode> {
    let code: String = decode("contract code", raw)?;
    if !code.starts_with("0x") && !code.starts_with("0X") {
        return Err(ConversionError::Hex {
            field: "code",
            source: HexError::InvalidHexFormat(code),
        });
    }

    Ok(ContractCode {
        address: address.to_ascii_lowercase(),
        code: code.to_ascii_lowercase(),
    })
}

pub fn to_balance_sheet(
    address: &str,
    raw: serde_json::Value,
    updated_at: i64,
) -> Result<BalanceSheet> {
    let balance: String = decode("balance", raw)?;

    Ok(BalanceSheet {
        address: address.to_ascii_lowercase(),
        balance: Quantity::from_hex(&balance).map_err(|source| ConversionError::Hex {
            field: "balance",
            source,
        })?,
        updated_at,
    })
}

/// Pairs transactions with the receipts fetched for them, position by position.
pub fn pair(
    transactions: Vec<Transaction>,
    receipts: Vec<Receipt>,
) -> Result<Vec<FullTransaction>> {
    if transactions.len() != receipts.len() {
        return Err(ConversionError::ShapeMismatch(format!(
            "{} transactions but {} receipts",
            transactions.len(),
            receipts.len()
        )));
    }

    transactions
        .into_iter()
        .zip(receipts)
        .map(|(tx, receipt)| {
            if tx.hash != receipt.transaction_hash {
                return Err(ConversionError::ShapeMismatch(format!(
                    "receipt {} does not belong to transaction {}",
                    receipt.transaction_hash, tx.hash
                )));
            }

            Ok(FullTransaction {
                base_transaction: tx,
                receipt,
            })
        })
        .collect()
}
