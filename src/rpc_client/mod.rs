pub mod config;
mod endpoint;
mod error;
pub mod inner;
mod types;

pub use config::EndpointConfig;
pub use endpoint::Endpoint;
pub use error::{Error, Result};
pub use inner::{RpcClient, Transport};
pub use types::{
    AccountRange, BlockTag, GetBalance, GetBlockByNumber, GetBlockNumber, GetCode,
    GetTransactionReceipt, RpcErrorObject, RpcOutcome, RpcRequest,
};
