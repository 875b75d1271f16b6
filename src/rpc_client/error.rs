use std::result::Result as StdResult;
use thiserror::Error as ThisError;

/// Failure of a whole batch. Nothing from the batch is usable when one of these is
/// returned; per-item errors are reported through [`super::RpcOutcome`] instead.
#[derive(Debug, ThisError)]
pub enum Error {
    #[error("Failed to execute http request:\n{0}")]
    HttpRequest(reqwest::Error),
    #[error("Endpoint responded with http status {0}.")]
    HttpStatus(reqwest::StatusCode),
    #[error("Invalid RPC response.\n{0:?}")]
    InvalidRPCResponse(anyhow::Error),
    #[error("Refusing to send an empty batch.")]
    EmptyBatch,
    #[error("Batch mixes rpc methods {0} and {1}.")]
    MixedBatch(&'static str, &'static str),
}

pub type Result<T> = StdResult<T, Error>;
