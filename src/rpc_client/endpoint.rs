use super::{EndpointConfig, Error, Result, Transport};
use anyhow::Context;
use async_trait::async_trait;
use reqwest::Method;
use std::time::Duration;
use url::Url;

/// HTTP json-rpc endpoint.
pub struct Endpoint {
    url: Url,
    label: String,
    bearer_token: Option<String>,
    http_client: reqwest::Client,
}

impl Endpoint {
    pub fn new(config: EndpointConfig) -> anyhow::Result<Self> {
        let http_client = reqwest::Client::builder()
            .gzip(true)
            .http1_only()
            .timeout(Duration::from_millis(config.http_req_timeout_millis.get()))
            .tcp_keepalive(Duration::from_secs(7200))
            .build()
            .context("build http client")?;

        let (url, mesc_name) = match (config.url, config.chain_id) {
            (Some(url), _) => (url, None),
            (None, Some(chain_id)) => {
                let endpoint = mesc::get_endpoint_by_network(chain_id, None)
                    .context("load mesc config")?
                    .context("endpoint for this chain not found")?;
                (endpoint.url.parse().context("parse url")?, Some(endpoint.name))
            }
            (None, None) => anyhow::bail!("either rpc.url or rpc.chain_id must be set"),
        };

        // Make label default to the url if not specified
        let label = config
            .label
            .or(mesc_name)
            .unwrap_or_else(|| url.to_string());

        Ok(Self {
            url,
            label,
            bearer_token: config.bearer_token,
            http_client,
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

#[async_trait]
impl Transport for Endpoint {
    async fn send(&self, body: &serde_json::Value) -> Result<String> {
        let mut req = self
            .http_client
            .request(Method::POST, Url::clone(&self.url));

        if let Some(bearer_token) = &self.bearer_token {
            req = req.bearer_auth(bearer_token);
        }

        let res = req.json(body).send().await.map_err(Error::HttpRequest)?;

        if !res.status().is_success() {
            return Err(Error::HttpStatus(res.status()));
        }

        res.text().await.map_err(Error::HttpRequest)
    }

    fn label(&self) -> &str {
        &self.label
    }
}
