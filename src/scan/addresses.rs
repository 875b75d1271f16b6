use std::collections::BTreeMap;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use super::{accept, throttle};
use crate::config::Config;
use crate::records::{
    to_balance_sheet, to_contract_code, BalanceSheet, ContractCode, ConversionError,
};
use crate::rpc_client::{BlockTag, GetBalance, GetCode, RpcClient, RpcRequest, Transport};
use crate::store::{read_json_file, write_json_file};
use crate::{Error, Result};

/// Per-address lookups over the addresses of an account scan output.
pub struct AddressScanner<'a, T> {
    client: &'a RpcClient<T>,
    block: BlockTag,
    batch_size: NonZeroUsize,
    delay: Duration,
    output_dir: PathBuf,
    name: String,
}

impl<'a, T: Transport> AddressScanner<'a, T> {
    pub fn new(client: &'a RpcClient<T>, cfg: &Config) -> Self {
        let accounts = &cfg.scan.accounts;
        Self {
            client,
            block: accounts.block_tag(),
            batch_size: accounts.batch_size,
            delay: Duration::from_millis(cfg.rpc.delay_ms),
            output_dir: cfg.scan.output_dir.clone(),
            name: accounts.output_file_name.clone(),
        }
    }

    pub fn code_path(&self) -> PathBuf {
        self.output_dir.join(format!("{}_code.json", self.name))
    }

    pub fn balances_path(&self) -> PathBuf {
        self.output_dir.join(format!("{}_balances.json", self.name))
    }

    /// Fetches the code of every address in `accounts_file`.
    pub async fn scan_contract_code(&self, accounts_file: &Path) -> Result<PathBuf> {
        let addresses = read_addresses(accounts_file)?;
        log::info!("fetching code of {} addresses", addresses.len());

        let codes = self
            .lookup(
                &addresses,
                |address| GetCode(address, self.block).into(),
                to_contract_code,
            )
            .await?;

        self.write("contract code", &self.code_path(), &codes)
    }

    /// Fetches the current balance of every address in `accounts_file`.
    pub async fn scan_balances(&self, accounts_file: &Path) -> Result<PathBuf> {
        let addresses = read_addresses(accounts_file)?;
        log::info!("fetching balances of {} addresses", addresses.len());

        let updated_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or_default();

        let balances = self
            .lookup(
                &addresses,
                |address| GetBalance(address, self.block).into(),
                |address, raw| to_balance_sheet(address, raw, updated_at),
            )
            .await?;

        self.write("balances", &self.balances_path(), &balances)
    }

    async fn lookup<R, M, C>(&self, addresses: &[String], make: M, convert: C) -> Result<Vec<R>>
    where
        M: Fn(String) -> RpcRequest,
        C: Fn(&str, serde_json::Value) -> std::result::Result<R, ConversionError>,
    {
        let mut out = Vec::with_capacity(addresses.len());

        for chunk in addresses.chunks(self.batch_size.get()) {
            let reqs = chunk.iter().cloned().map(&make).collect::<Vec<_>>();
            let method = reqs.first().map(|req| req.method).unwrap_or_default();

            let outcomes = self.client.send_batch(&reqs).await?;
            throttle(self.delay).await;

            for (address, outcome) in chunk.iter().zip(outcomes) {
                if let Some(raw) = accept(method, address, outcome) {
                    out.push(convert(address, raw)?);
                }
            }

            log::debug!("{method}: {}/{} addresses done", out.len(), addresses.len());
        }

        Ok(out)
    }

    fn write<R: serde::Serialize>(
        &self,
        what: &'static str,
        path: &Path,
        records: &[R],
    ) -> Result<PathBuf> {
        if records.is_empty() {
            return Err(Error::NoDataFetched(what));
        }

        write_json_file(path, records)?;
        log::info!("wrote {} {} records to {}", records.len(), what, path.display());

        Ok(path.to_owned())
    }
}

/// Addresses of an account map file, sorted.
fn read_addresses(path: &Path) -> Result<Vec<String>> {
    let accounts: BTreeMap<String, serde_json::Value> = read_json_file(path)?;

    Ok(accounts.into_keys().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hex::Quantity;
    use crate::records::{Account, AccountStore};
    use crate::test_utils::{base_config, MockNode};

    fn accounts_file(dir: &Path, addresses: &[&str]) -> PathBuf {
        let accounts = addresses
            .iter()
            .map(|address| {
                let account = Account {
                    balance: Quantity::from(1),
                    nonce: 1,
                    root: "0x56e8".into(),
                    code_hash: "0x9a".into(),
                    is_contract: true,
                };
                (address.to_string(), account)
            })
            .collect::<AccountStore>();

        let path = dir.join("accounts_merged.json");
        write_json_file(&path, &accounts).unwrap();
        path
    }

    #[tokio::test]
    async fn test_contract_code_scan() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = base_config(dir.path().to_owned());
        cfg.scan.accounts.batch_size = NonZeroUsize::new(2).unwrap();
        cfg.scan.accounts.block_number = Some(16);

        let node = MockNode::default();
        node.add_code("0x01", "0x6080AB");
        node.reject("0x02");
        let client = RpcClient::with_transport(node);
        let scanner = AddressScanner::new(&client, &cfg);

        let file = accounts_file(dir.path(), &["0x01", "0x02", "0x03"]);
        let path = scanner.scan_contract_code(&file).await.unwrap();
        assert_eq!(path, dir.path().join("accounts_code.json"));

        let codes: Vec<ContractCode> = read_json_file(&path).unwrap();
        assert_eq!(
            codes,
            vec![
                ContractCode {
                    address: "0x01".into(),
                    code: "0x6080ab".into()
                },
                ContractCode {
                    address: "0x03".into(),
                    code: "0x".into()
                },
            ]
        );
        assert_eq!(
            client.transport().calls(),
            vec![("eth_getCode".to_owned(), 2), ("eth_getCode".to_owned(), 1)]
        );
    }

    #[tokio::test]
    async fn test_balance_scan() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = base_config(dir.path().to_owned());

        let node = MockNode::default();
        node.add_balance("0x01", "0xde0b6b3a7640000");
        let client = RpcClient::with_transport(node);
        let scanner = AddressScanner::new(&client, &cfg);

        let file = accounts_file(dir.path(), &["0x01", "0x02"]);
        let path = scanner.scan_balances(&file).await.unwrap();
        assert_eq!(path, dir.path().join("accounts_balances.json"));

        let balances: Vec<BalanceSheet> = read_json_file(&path).unwrap();
        assert_eq!(balances.len(), 2);
        assert_eq!(balances[0].balance, Quantity::from(1_000_000_000_000_000_000));
        assert!(balances[1].balance.is_zero());
        assert!(balances[0].updated_at > 0);
    }

    #[tokio::test]
    async fn test_malformed_balance_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = base_config(dir.path().to_owned());

        let node = MockNode::default();
        node.add_balance("0x01", "12345");
        let client = RpcClient::with_transport(node);
        let scanner = AddressScanner::new(&client, &cfg);

        let file = accounts_file(dir.path(), &["0x01"]);
        let res = scanner.scan_balances(&file).await;

        assert!(matches!(res, Err(Error::Conversion(_))));
        assert!(!scanner.balances_path().exists());
    }

    #[tokio::test]
    async fn test_missing_accounts_file() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = base_config(dir.path().to_owned());
        let client = RpcClient::with_transport(MockNode::default());

        let res = AddressScanner::new(&client, &cfg)
            .scan_contract_code(&dir.path().join("missing.json"))
            .await;

        assert!(matches!(res, Err(Error::Store(_))));
    }
}
