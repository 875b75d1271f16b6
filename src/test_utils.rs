use crate::config::Config;
use crate::hex::hex_to_int;
use crate::rpc_client::{Error, Result, RpcErrorObject, Transport};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Mutex;

pub fn read_json_file(name: &str) -> String {
    std::fs::read_to_string(format!("{}/test-data/{name}", env!("CARGO_MANIFEST_DIR"))).unwrap()
}

pub fn read_test_value(name: &str) -> Value {
    serde_json::from_str(&read_json_file(name)).unwrap()
}

/// Sample config pointing at `output_dir`, without the inter-request delay.
pub fn base_config(output_dir: PathBuf) -> Config {
    let mut cfg = Config::sample();
    cfg.rpc.delay_ms = 0;
    cfg.scan.output_dir = output_dir;
    cfg
}

/// In-memory node answering batches from canned data.
///
/// Unknown blocks and receipts come back as `null` like on a real node. Requests whose
/// first parameter is registered through [`MockNode::reject`] get a per-item error.
#[derive(Default)]
pub struct MockNode {
    state: Mutex<MockState>,
    reversed: bool,
}

#[derive(Default)]
struct MockState {
    blocks: BTreeMap<u64, Value>,
    receipts: HashMap<String, Value>,
    codes: HashMap<String, String>,
    balances: HashMap<String, String>,
    pages: HashMap<String, Value>,
    rejected: HashSet<String>,
    fail_after: Option<usize>,
    calls: Vec<(String, usize)>,
}

impl MockNode {
    /// Answer batch elements in reverse order, ids still match.
    pub fn with_reversed_replies(mut self) -> Self {
        self.reversed = true;
        self
    }

    pub fn add_block(&self, block: Value) {
        let number = block["number"].as_str().unwrap();
        let number = u64::try_from(hex_to_int(number).unwrap()).unwrap();
        self.state.lock().unwrap().blocks.insert(number, block);
    }

    pub fn add_receipt(&self, receipt: Value) {
        let hash = receipt["transactionHash"].as_str().unwrap().to_owned();
        self.state.lock().unwrap().receipts.insert(hash, receipt);
    }

    pub fn add_code(&self, address: &str, code: &str) {
        let mut state = self.state.lock().unwrap();
        state.codes.insert(address.to_owned(), code.to_owned());
    }

    pub fn add_balance(&self, address: &str, balance: &str) {
        let mut state = self.state.lock().unwrap();
        state.balances.insert(address.to_owned(), balance.to_owned());
    }

    /// Page served when `cursor` is requested.
    pub fn add_page(&self, cursor: &str, page: Value) {
        let mut state = self.state.lock().unwrap();
        state.pages.insert(cursor.to_owned(), page);
    }

    pub fn reject(&self, first_param: &str) {
        let mut state = self.state.lock().unwrap();
        state.rejected.insert(first_param.to_owned());
    }

    /// Fail every batch after the first `n` successful ones.
    pub fn fail_after(&self, n: usize) {
        self.state.lock().unwrap().fail_after = Some(n);
    }

    /// `(method, batch size)` of every delivered batch.
    pub fn calls(&self) -> Vec<(String, usize)> {
        self.state.lock().unwrap().calls.clone()
    }
}

impl MockState {
    fn answer(&self, method: &str, params: &[Value]) -> std::result::Result<Value, RpcErrorObject> {
        let first = params.first().and_then(Value::as_str).unwrap_or_default();

        if self.rejected.contains(first) {
            return Err(RpcErrorObject {
                code: -32000,
                message: format!("rejected {first}"),
                data: None,
            });
        }

        let res = match method {
            "eth_blockNumber" => {
                let height = self.blocks.keys().next_back().copied().unwrap_or_default();
                json!(format!("0x{height:x}"))
            }
            "eth_getBlockByNumber" => {
                let number = u64::try_from(hex_to_int(first).unwrap()).unwrap();
                self.blocks.get(&number).cloned().unwrap_or(Value::Null)
            }
            "eth_getTransactionReceipt" => {
                self.receipts.get(first).cloned().unwrap_or(Value::Null)
            }
            "eth_getCode" => json!(self.codes.get(first).map(String::as_str).unwrap_or("0x")),
            "eth_getBalance" => {
                json!(self.balances.get(first).map(String::as_str).unwrap_or("0x0"))
            }
            "debug_accountRange" => {
                let cursor = params.get(1).and_then(Value::as_str).unwrap_or_default();
                match self.pages.get(cursor) {
                    Some(page) => page.clone(),
                    None => {
                        return Err(RpcErrorObject {
                            code: -32000,
                            message: format!("unknown start key {cursor}"),
                            data: None,
                        })
                    }
                }
            }
            _ => {
                return Err(RpcErrorObject {
                    code: -32601,
                    message: format!("Method not found: {method}"),
                    data: None,
                })
            }
        };

        Ok(res)
    }
}

#[async_trait]
impl Transport for MockNode {
    async fn send(&self, body: &Value) -> Result<String> {
        let mut state = self.state.lock().unwrap();

        if let Some(n) = state.fail_after {
            if state.calls.len() >= n {
                return Err(Error::HttpStatus(reqwest::StatusCode::BAD_GATEWAY));
            }
        }

        let reqs = body.as_array().unwrap();
        let method = reqs[0]["method"].as_str().unwrap().to_owned();
        state.calls.push((method, reqs.len()));

        let mut replies = reqs
            .iter()
            .map(|req| {
                let method = req["method"].as_str().unwrap();
                let params = req["params"].as_array().unwrap();
                match state.answer(method, params) {
                    Ok(res) => json!({ "jsonrpc": "2.0", "id": req["id"], "result": res }),
                    Err(err) => json!({ "jsonrpc": "2.0", "id": req["id"], "error": err }),
                }
            })
            .collect::<Vec<_>>();

        if self.reversed {
            replies.reverse();
        }

        Ok(serde_json::to_string(&replies).unwrap())
    }

    fn label(&self) -> &str {
        "mock"
    }
}
