use anyhow::Context;
use async_trait::async_trait;

use super::types::{batch_resp_from_json, batch_to_json};
use super::{endpoint::Endpoint, EndpointConfig, Error, GetBlockNumber, Result, RpcOutcome, RpcRequest};
use crate::hex::hex_to_int;

/// Carries one json-rpc request body to a node and returns the raw response body.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, body: &serde_json::Value) -> Result<String>;

    fn label(&self) -> &str;
}

/// Batch dispatcher. Sends exactly one grouped call per batch and never retries.
pub struct RpcClient<T = Endpoint> {
    transport: T,
}

impl RpcClient<Endpoint> {
    pub fn new(config: EndpointConfig) -> anyhow::Result<Self> {
        let endpoint = Endpoint::new(config).context("create endpoint")?;

        Ok(Self::with_transport(endpoint))
    }
}

impl<T: Transport> RpcClient<T> {
    pub fn with_transport(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Executes the batch and returns one outcome per request, in request order.
    ///
    /// A failure to deliver the batch or to make sense of the reply fails the whole
    /// batch. Errors the node reports for single elements are returned as `Err`
    /// outcomes and left to the caller.
    pub async fn send_batch(&self, reqs: &[RpcRequest]) -> Result<Vec<RpcOutcome>> {
        let first = reqs.first().ok_or(Error::EmptyBatch)?;
        if let Some(other) = reqs.iter().find(|req| req.method != first.method) {
            return Err(Error::MixedBatch(first.method, other.method));
        }

        let body = batch_to_json(reqs);
        let res = self.transport.send(&body).await?;

        match batch_resp_from_json(reqs.len(), res) {
            Ok(outcomes) => Ok(outcomes),
            Err(e) => {
                log::warn!(
                    "failed to parse {} response from {}: {:?}",
                    first.method,
                    self.transport.label(),
                    e
                );
                Err(Error::InvalidRPCResponse(e))
            }
        }
    }

    /// Height of the node's chain head.
    pub async fn last_block(&self) -> anyhow::Result<u64> {
        let outcome = self
            .send_batch(&[GetBlockNumber.into()])
            .await?
            .pop()
            .context("empty response")?;

        let res = outcome.context("eth_blockNumber rejected")?;
        let height = hex_to_int(res.as_str().context("block number is str")?)
            .context("parse block number")?;

        u64::try_from(height).context("block number fits in u64")
    }
}
