use std::path::PathBuf;

use clap::{Args, Parser};

#[derive(Parser, Debug, Clone)]
#[command(version, about = "Bulk extraction of blocks, receipts and accounts from a json-rpc node")]
pub enum Subcommands {
    /// Write a sample config to config.toml.sample
    CreateConfig,
    /// Check that the configured node answers
    TestConnection(ConfigArgs),
    /// Fetch the configured block range with receipts
    ScanBlocks(ConfigArgs),
    /// Fetch the receipts of every transaction in a block file
    ScanReceipts {
        #[command(flatten)]
        config: ConfigArgs,
        #[clap(long)]
        block_file: PathBuf,
    },
    /// Enumerate accounts and keep contracts holding a balance
    ScanAccounts(ConfigArgs),
    /// Fetch the code of every account in an accounts file
    ScanContractCode {
        #[command(flatten)]
        config: ConfigArgs,
        #[clap(long)]
        accounts_file: PathBuf,
    },
    /// Fetch the balance of every account in an accounts file
    ScanBalances {
        #[command(flatten)]
        config: ConfigArgs,
        #[clap(long)]
        accounts_file: PathBuf,
    },
}

impl Subcommands {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }
}

#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    #[clap(long, default_value_t = default_config_path())]
    pub config_path: String,
}

fn default_config_path() -> String {
    "config.toml".to_owned()
}
