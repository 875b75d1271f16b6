use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

use crate::hex::int_to_hex;
use alloy_primitives::U256;

/// One element of a batch: a method name and its positional parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct RpcRequest {
    pub method: &'static str,
    pub params: Vec<serde_json::Value>,
}

/// Error object a node returns for a single element of an otherwise successful batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ThisError)]
#[error("rpc error {code}: {message}")]
pub struct RpcErrorObject {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

/// Result of one batch element.
pub type RpcOutcome = std::result::Result<serde_json::Value, RpcErrorObject>;

/// Block to read state at. `Latest` is sent as the `"latest"` tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlockTag {
    Number(u64),
    Latest,
}

impl From<BlockTag> for serde_json::Value {
    fn from(tag: BlockTag) -> Self {
        match tag {
            BlockTag::Number(n) => int_to_hex(U256::from(n)).into(),
            BlockTag::Latest => "latest".into(),
        }
    }
}

impl From<Option<u64>> for BlockTag {
    fn from(v: Option<u64>) -> Self {
        v.map(BlockTag::Number).unwrap_or(BlockTag::Latest)
    }
}

pub struct GetBlockNumber;

impl From<GetBlockNumber> for RpcRequest {
    fn from(_: GetBlockNumber) -> Self {
        Self {
            method: "eth_blockNumber",
            params: Vec::new(),
        }
    }
}

/// Block with full transaction objects.
pub struct GetBlockByNumber(pub u64);

impl From<GetBlockByNumber> for RpcRequest {
    fn from(req: GetBlockByNumber) -> Self {
        Self {
            method: "eth_getBlockByNumber",
            params: vec![BlockTag::Number(req.0).into(), true.into()],
        }
    }
}

pub struct GetTransactionReceipt(pub String);

impl From<GetTransactionReceipt> for RpcRequest {
    fn from(req: GetTransactionReceipt) -> Self {
        Self {
            method: "eth_getTransactionReceipt",
            params: vec![req.0.into()],
        }
    }
}

pub struct GetCode(pub String, pub BlockTag);

impl From<GetCode> for RpcRequest {
    fn from(req: GetCode) -> Self {
        Self {
            method: "eth_getCode",
            params: vec![req.0.into(), req.1.into()],
        }
    }
}

pub struct GetBalance(pub String, pub BlockTag);

impl From<GetBalance> for RpcRequest {
    fn from(req: GetBalance) -> Self {
        Self {
            method: "eth_getBalance",
            params: vec![req.0.into(), req.1.into()],
        }
    }
}

/// One page of `debug_accountRange`. `start` is the opaque cursor returned by the
/// previous page and is passed back untouched.
pub struct AccountRange {
    pub block: BlockTag,
    pub start: String,
    pub max_results: usize,
    pub nocode: bool,
    pub nostorage: bool,
}

impl From<AccountRange> for RpcRequest {
    fn from(req: AccountRange) -> Self {
        Self {
            method: "debug_accountRange",
            params: vec![
                req.block.into(),
                req.start.into(),
                req.max_results.into(),
                req.nocode.into(),
                req.nostorage.into(),
            ],
        }
    }
}

impl RpcRequest {
    fn to_json(&self, idx: usize) -> serde_json::Value {
        serde_json::json!({
            "method": self.method,
            "params": self.params,
            "id": idx,
            "jsonrpc": "2.0",
        })
    }
}

/// Request body for a batch. Ids are the positions in `reqs`.
pub(crate) fn batch_to_json(reqs: &[RpcRequest]) -> serde_json::Value {
    serde_json::Value::Array(
        reqs.iter()
            .enumerate()
            .map(|(idx, req)| req.to_json(idx))
            .collect(),
    )
}

/// Parses a batch response body into one outcome per request, in request order.
///
/// Nodes are free to answer batch elements in any order, so elements are placed by id.
pub(crate) fn batch_resp_from_json(num_reqs: usize, json: String) -> Result<Vec<RpcOutcome>> {
    let mut json = json.into_bytes();
    let json: serde_json::Value =
        simd_json::serde::from_slice(&mut json).context("parse response json")?;

    let arr = match json {
        serde_json::Value::Array(arr) => arr,
        serde_json::Value::Object(obj) => match obj.get("error") {
            Some(err) => return Err(anyhow!("batch rejected by node: {err}")),
            None => return Err(anyhow!("non array response to batch request")),
        },
        _ => return Err(anyhow!("invalid rpc response")),
    };

    if arr.len() != num_reqs {
        return Err(anyhow!(
            "expected {} responses in batch, got {}",
            num_reqs,
            arr.len()
        ));
    }

    let mut slots: Vec<Option<RpcOutcome>> = (0..num_reqs).map(|_| None).collect();

    for val in arr {
        let obj = match val {
            serde_json::Value::Object(obj) => obj,
            _ => return Err(anyhow!("non object item in array response")),
        };

        let (idx, outcome) = item_from_json(obj)?;
        let slot = slots
            .get_mut(idx)
            .with_context(|| format!("response id {idx} out of range"))?;

        if slot.replace(outcome).is_some() {
            return Err(anyhow!("duplicate id {idx} in response"));
        }
    }

    slots
        .into_iter()
        .enumerate()
        .map(|(idx, slot)| slot.with_context(|| format!("missing response for id {idx}")))
        .collect()
}

fn item_from_json(mut json: JsonObject) -> Result<(usize, RpcOutcome)> {
    if json
        .remove("jsonrpc")
        .context("get jsonrpc field")?
        .as_str()
        .context("jsonrpc field is str")?
        != "2.0"
    {
        return Err(anyhow!("invalid jsonrpc field in response"));
    }

    let idx = json
        .remove("id")
        .context("get id field")?
        .as_u64()
        .context("id field is u64")?;
    let idx = usize::try_from(idx).context("id field fits in usize")?;

    match json.remove("error") {
        Some(serde_json::Value::Null) | None => {}
        Some(err) => {
            let err = serde_json::from_value(err).context("deserialize error object")?;
            return Ok((idx, Err(err)));
        }
    }

    let res = json.remove("result").context("get result field")?;

    Ok((idx, Ok(res)))
}

type JsonObject = serde_json::Map<String, serde_json::Value>;
