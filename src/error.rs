use std::result::Result as StdResult;
use thiserror::Error as ThisError;

use crate::config::ConfigError;
use crate::records::ConversionError;
use crate::rpc_client::{self, RpcErrorObject};
use crate::store;

#[derive(Debug, ThisError)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("batch transport failure: {0}")]
    Transport(#[from] rpc_client::Error),
    #[error("conversion failed: {0}")]
    Conversion(#[from] ConversionError),
    #[error("node rejected account range request: {0}")]
    PageRejected(RpcErrorObject),
    #[error("no {0} fetched")]
    NoDataFetched(&'static str),
    #[error(transparent)]
    Store(#[from] store::Error),
}

pub type Result<T> = StdResult<T, Error>;
