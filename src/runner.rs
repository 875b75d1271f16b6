use std::path::Path;

use anyhow::Context;

use crate::args::{ConfigArgs, Subcommands};
use crate::config::{Config, SAMPLE_CONFIG_PATH};
use crate::rpc_client::RpcClient;
use crate::scan::{AccountScanner, AddressScanner, BlockScanner, ReceiptScanner};

pub struct Runner;

impl Runner {
    pub async fn run(cmd: Subcommands) -> anyhow::Result<()> {
        match cmd {
            Subcommands::CreateConfig => {
                let sample =
                    toml::to_string_pretty(&Config::sample()).context("serialize sample config")?;
                tokio::fs::write(SAMPLE_CONFIG_PATH, sample)
                    .await
                    .context("write sample config")?;
                log::info!("wrote sample config to {SAMPLE_CONFIG_PATH}");
            }
            Subcommands::TestConnection(args) => {
                let (_, client) = Self::setup(&args)?;
                let height = client.last_block().await.context("query chain head")?;
                log::info!(
                    "connected to {}, chain head is at block {}",
                    client.transport().url(),
                    height
                );
            }
            Subcommands::ScanBlocks(args) => {
                let (cfg, client) = Self::setup(&args)?;
                BlockScanner::new(&client, &cfg)?
                    .run()
                    .await
                    .context("scan blocks")?;
            }
            Subcommands::ScanReceipts { config, block_file } => {
                let (cfg, client) = Self::setup(&config)?;
                ReceiptScanner::new(&client, &cfg)?
                    .run(&block_file)
                    .await
                    .context("scan receipts")?;
            }
            Subcommands::ScanAccounts(args) => {
                let (cfg, client) = Self::setup(&args)?;
                let report = AccountScanner::new(&client, &cfg)
                    .run()
                    .await
                    .context("scan accounts")?;
                log::info!(
                    "account scan ended ({:?}) after {} pages in {:?}, output in {}",
                    report.end,
                    report.stats.pages,
                    report.stats.elapsed(),
                    report.output.display()
                );
            }
            Subcommands::ScanContractCode {
                config,
                accounts_file,
            } => {
                let (cfg, client) = Self::setup(&config)?;
                AddressScanner::new(&client, &cfg)
                    .scan_contract_code(&accounts_file)
                    .await
                    .context("scan contract code")?;
            }
            Subcommands::ScanBalances {
                config,
                accounts_file,
            } => {
                let (cfg, client) = Self::setup(&config)?;
                AddressScanner::new(&client, &cfg)
                    .scan_balances(&accounts_file)
                    .await
                    .context("scan balances")?;
            }
        }

        Ok(())
    }

    fn setup(args: &ConfigArgs) -> anyhow::Result<(Config, RpcClient)> {
        let cfg = Config::load(Path::new(&args.config_path))
            .with_context(|| format!("load config from {}", args.config_path))?;
        let client = RpcClient::new(cfg.rpc.clone()).context("create rpc client")?;

        Ok((cfg, client))
    }
}
