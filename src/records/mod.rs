//! Raw node records and their canonical, numerically normalized counterparts.

mod convert;
mod domain;
pub mod raw;

pub use convert::{
    decode, pair, to_account, to_balance_sheet, to_block, to_contract_code, to_receipt,
    to_transaction, ConversionError,
};
pub use domain::{
    Account, AccountStore, BalanceSheet, Block, ContractCode, FullBlock, FullTransaction, Log,
    Receipt, Transaction,
};
