use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::{accept, throttle};
use crate::config::Config;
use crate::records::{decode, to_receipt, FullBlock, Receipt};
use crate::rpc_client::{GetTransactionReceipt, RpcClient, RpcRequest, Transport};
use crate::store::{read_json_file, write_json_file};
use crate::{BlockRange, Error, Result};

/// Fetches the receipts of `hashes` in batches of `batch_size`.
///
/// The result lines up with `hashes`. It holds `None` where the node rejected the lookup
/// or had no receipt.
pub(crate) async fn fetch_receipts<T: Transport>(
    client: &RpcClient<T>,
    hashes: &[String],
    batch_size: NonZeroUsize,
    delay: Duration,
) -> Result<Vec<Option<Receipt>>> {
    let mut receipts = Vec::with_capacity(hashes.len());

    for chunk in hashes.chunks(batch_size.get()) {
        let reqs = chunk
            .iter()
            .map(|hash| GetTransactionReceipt(hash.clone()).into())
            .collect::<Vec<RpcRequest>>();

        let outcomes = client.send_batch(&reqs).await?;
        throttle(delay).await;

        for (hash, outcome) in chunk.iter().zip(outcomes) {
            let receipt = match accept("eth_getTransactionReceipt", hash, outcome) {
                Some(raw) => Some(to_receipt(decode("receipt", raw)?)?),
                None => None,
            };
            receipts.push(receipt);
        }

        log::debug!("fetched {} receipts", receipts.len());
    }

    Ok(receipts)
}

/// Re-fetches the receipts of every transaction in a block file.
pub struct ReceiptScanner<'a, T> {
    client: &'a RpcClient<T>,
    range: BlockRange,
    batch_size: NonZeroUsize,
    delay: Duration,
    output_dir: PathBuf,
}

impl<'a, T: Transport> ReceiptScanner<'a, T> {
    pub fn new(client: &'a RpcClient<T>, cfg: &Config) -> Result<Self> {
        Ok(Self {
            client,
            range: cfg.scan.block_range()?,
            batch_size: cfg.scan.receipts.batch_size,
            delay: Duration::from_millis(cfg.rpc.delay_ms),
            output_dir: cfg.scan.output_dir.clone(),
        })
    }

    pub fn output_path(&self) -> PathBuf {
        self.output_dir.join(format!(
            "receipts_{}_to_{}.json",
            self.range.from, self.range.to
        ))
    }

    /// Reads the blocks in `block_file` and writes the receipts of their transactions.
    pub async fn run(&self, block_file: &Path) -> Result<PathBuf> {
        let blocks: Vec<FullBlock> = read_json_file(block_file)?;
        let hashes = blocks
            .iter()
            .flat_map(|block| &block.full_transactions)
            .map(|tx| tx.base_transaction.hash.clone())
            .collect::<Vec<_>>();

        log::info!(
            "fetching {} receipts for {} blocks from {}",
            hashes.len(),
            blocks.len(),
            self.client.transport().label()
        );

        let receipts = fetch_receipts(self.client, &hashes, self.batch_size, self.delay)
            .await?
            .into_iter()
            .flatten()
            .collect::<Vec<_>>();

        if receipts.is_empty() {
            return Err(Error::NoDataFetched("receipts"));
        }

        let path = self.output_path();
        write_json_file(&path, &receipts)?;
        log::info!("wrote {} receipts to {}", receipts.len(), path.display());

        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{pair, to_block, ConversionError};
    use crate::test_utils::{base_config, read_test_value, MockNode};

    fn node_with_receipts() -> MockNode {
        let node = MockNode::default();
        let receipts = read_test_value("eth_getTransactionReceipt_batch.json");
        for reply in receipts.as_array().unwrap() {
            node.add_receipt(reply["result"].clone());
        }
        node
    }

    fn block_file(dir: &Path) -> PathBuf {
        let blocks = read_test_value("eth_getBlockByNumber_batch.json");
        let receipts = read_test_value("eth_getTransactionReceipt_batch.json");

        let receipts = receipts
            .as_array()
            .unwrap()
            .iter()
            .map(|reply| to_receipt(decode("receipt", reply["result"].clone()).unwrap()).unwrap())
            .collect::<Vec<_>>();
        let (block, txs) = to_block(decode("block", blocks[0]["result"].clone()).unwrap()).unwrap();
        let full = FullBlock {
            base_block: block,
            full_transactions: pair(txs, receipts).unwrap(),
        };

        let path = dir.join("blocks_100_to_100.json");
        write_json_file(&path, &vec![full]).unwrap();
        path
    }

    #[tokio::test]
    async fn test_fetch_receipts_lines_up_with_hashes() {
        let node = node_with_receipts();
        let client = RpcClient::with_transport(node);
        let hashes = vec![
            format!("0x{}", "b2".repeat(32)),
            format!("0x{}", "ff".repeat(32)),
            format!("0x{}", "b1".repeat(32)),
        ];

        let receipts = fetch_receipts(&client, &hashes, NonZeroUsize::new(2).unwrap(), Duration::ZERO)
            .await
            .unwrap();

        assert_eq!(receipts.len(), 3);
        assert_eq!(receipts[0].as_ref().unwrap().transaction_hash, hashes[0]);
        assert!(receipts[1].is_none());
        assert_eq!(receipts[2].as_ref().unwrap().transaction_hash, hashes[2]);
        assert_eq!(
            client.transport().calls(),
            vec![
                ("eth_getTransactionReceipt".to_owned(), 2),
                ("eth_getTransactionReceipt".to_owned(), 1)
            ]
        );
    }

    #[tokio::test]
    async fn test_receipt_scan_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = base_config(dir.path().to_owned());
        cfg.scan.from_block = 100;
        cfg.scan.to_block = 100;

        let client = RpcClient::with_transport(node_with_receipts());
        let scanner = ReceiptScanner::new(&client, &cfg).unwrap();
        let path = scanner.run(&block_file(dir.path())).await.unwrap();

        assert_eq!(path, dir.path().join("receipts_100_to_100.json"));
        let receipts: Vec<Receipt> = read_json_file(&path).unwrap();
        assert_eq!(receipts.len(), 2);
        assert_eq!(receipts[1].contract_address, format!("0x{}", "00".repeat(19) + "d4"));
    }

    #[tokio::test]
    async fn test_malformed_receipt_aborts_scan() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = base_config(dir.path().to_owned());
        cfg.scan.from_block = 100;
        cfg.scan.to_block = 100;

        let node = node_with_receipts();
        let mut receipt = read_test_value("eth_getTransactionReceipt_batch.json")[1]["result"].clone();
        receipt["cumulativeGasUsed"] = "0xzz".into();
        node.add_receipt(receipt);

        let client = RpcClient::with_transport(node);
        let scanner = ReceiptScanner::new(&client, &cfg).unwrap();
        let res = scanner.run(&block_file(dir.path())).await;

        assert!(matches!(
            res,
            Err(Error::Conversion(ConversionError::Hex { field: "receipt.cumulativeGasUsed", .. }))
        ));
        assert!(!scanner.output_path().exists());
    }

    #[tokio::test]
    async fn test_receipt_scan_without_receipts() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = base_config(dir.path().to_owned());
        cfg.scan.from_block = 100;
        cfg.scan.to_block = 100;

        let client = RpcClient::with_transport(MockNode::default());
        let scanner = ReceiptScanner::new(&client, &cfg).unwrap();
        let res = scanner.run(&block_file(dir.path())).await;

        assert!(matches!(res, Err(Error::NoDataFetched("receipts"))));
        assert!(!scanner.output_path().exists());
    }
}
