use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

use crate::rpc_client::{BlockTag, EndpointConfig};
use crate::BlockRange;

pub const SAMPLE_CONFIG_PATH: &str = "config.toml.sample";

#[derive(Debug, ThisError)]
pub enum ConfigError {
    #[error("from_block ({from}) must be less or equal to to_block ({to})")]
    InvalidRange { from: u64, to: u64 },
    #[error("missing required field {0}")]
    MissingField(&'static str),
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub rpc: EndpointConfig,
    pub scan: ScanConfig,
    #[serde(default)]
    pub filter: FilterConfig,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScanConfig {
    /// First block to scan, inclusive
    pub from_block: u64,
    /// Last block to scan, inclusive
    pub to_block: u64,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default)]
    pub blocks: BlockScanConfig,
    #[serde(default)]
    pub receipts: ReceiptScanConfig,
    #[serde(default)]
    pub accounts: AccountScanConfig,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BlockScanConfig {
    ///  Number of blocks requested in one batch
    #[serde(default = "default_batch_size")]
    pub batch_size: NonZeroUsize,
    ///  Number of batches in flight at once. Output order does not depend on it.
    #[serde(default = "default_concurrency")]
    pub concurrency: NonZeroUsize,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReceiptScanConfig {
    #[serde(default = "default_batch_size")]
    pub batch_size: NonZeroUsize,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AccountScanConfig {
    /// Accounts requested per debug_accountRange page
    #[serde(default = "default_page_size")]
    pub page_size: NonZeroUsize,
    /// Stop after this many distinct addresses. 0 means no limit.
    #[serde(default)]
    pub max_accounts: u64,
    /// Cursor of the first page
    #[serde(default = "default_start_key")]
    pub start_key: String,
    /// State to enumerate. Latest when unset.
    pub block_number: Option<u64>,
    #[serde(default = "default_output_file_name")]
    pub output_file_name: String,
    /// Code hash of an account without code
    #[serde(default = "default_empty_code_hash")]
    pub empty_code_hash: String,
    /// Estimated accumulator size that triggers writing a chunk file
    #[serde(default = "default_flush_threshold_bytes")]
    pub flush_threshold_bytes: NonZeroUsize,
    #[serde(default = "default_true")]
    pub nocode: bool,
    #[serde(default = "default_true")]
    pub nostorage: bool,
    /// Addresses per batch for contract code and balance scans
    #[serde(default = "default_batch_size")]
    pub batch_size: NonZeroUsize,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Keep only transactions from or to these addresses. Empty keeps everything.
    #[serde(default)]
    pub addresses: Vec<String>,
}

impl Config {
    /// Reads, parses and validates the config file at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let cfg = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_owned(),
            source,
        })?;

        let cfg: Config = toml::de::from_str(&cfg)?;
        cfg.validate()?;

        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.scan.block_range()?;

        if self.rpc.url.is_none() && self.rpc.chain_id.is_none() {
            return Err(ConfigError::MissingField("rpc.url"));
        }
        if self.scan.accounts.output_file_name.is_empty() {
            return Err(ConfigError::MissingField("scan.accounts.output_file_name"));
        }
        if self.scan.accounts.empty_code_hash.is_empty() {
            return Err(ConfigError::MissingField("scan.accounts.empty_code_hash"));
        }

        Ok(())
    }

    /// Config written by `create-config`.
    pub fn sample() -> Self {
        Self {
            rpc: EndpointConfig::default(),
            scan: ScanConfig {
                from_block: 1,
                to_block: 100,
                output_dir: default_output_dir(),
                blocks: BlockScanConfig::default(),
                receipts: ReceiptScanConfig::default(),
                accounts: AccountScanConfig::default(),
            },
            filter: FilterConfig::default(),
        }
    }
}

impl ScanConfig {
    pub fn block_range(&self) -> Result<BlockRange, ConfigError> {
        BlockRange::new(self.from_block, self.to_block)
    }
}

impl AccountScanConfig {
    pub fn block_tag(&self) -> BlockTag {
        self.block_number.into()
    }
}

impl Default for BlockScanConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            concurrency: default_concurrency(),
        }
    }
}

impl Default for ReceiptScanConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
        }
    }
}

impl Default for AccountScanConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            max_accounts: 0,
            start_key: default_start_key(),
            block_number: None,
            output_file_name: default_output_file_name(),
            empty_code_hash: default_empty_code_hash(),
            flush_threshold_bytes: default_flush_threshold_bytes(),
            nocode: true,
            nostorage: true,
            batch_size: default_batch_size(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    "output".into()
}

fn default_batch_size() -> NonZeroUsize {
    NonZeroUsize::new(10).unwrap()
}

fn default_concurrency() -> NonZeroUsize {
    NonZeroUsize::new(1).unwrap()
}

fn default_page_size() -> NonZeroUsize {
    NonZeroUsize::new(256).unwrap()
}

fn default_start_key() -> String {
    "0x".into()
}

fn default_output_file_name() -> String {
    "accounts".into()
}

fn default_empty_code_hash() -> String {
    "0xc5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470".into()
}

fn default_flush_threshold_bytes() -> NonZeroUsize {
    NonZeroUsize::new(10 * 1024 * 1024).unwrap()
}

fn default_true() -> bool {
    true
}
