use serde::{Deserialize, Serialize};
use std::num::NonZeroU64;
use url::Url;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct EndpointConfig {
    /// Url of the json-rpc node. Takes precedence over `chain_id`.
    pub url: Option<Url>,
    /// Resolve the endpoint for this chain from the local MESC configuration.
    pub chain_id: Option<u64>,
    pub bearer_token: Option<String>,
    /// Fixed pause after every batch, in milliseconds.
    #[serde(default = "default_delay")]
    pub delay_ms: u64,
    #[serde(default = "default_req_timeout")]
    pub http_req_timeout_millis: NonZeroU64,
    pub label: Option<String>,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            url: Some(default_url()),
            chain_id: None,
            bearer_token: None,
            delay_ms: default_delay(),
            http_req_timeout_millis: default_req_timeout(),
            label: None,
        }
    }
}

pub fn default_url() -> Url {
    Url::parse("http://localhost:8545").expect("static url is valid")
}

pub fn default_delay() -> u64 {
    1000
}

pub fn default_req_timeout() -> NonZeroU64 {
    NonZeroU64::new(30000).unwrap()
}
