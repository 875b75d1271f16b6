use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use futures::StreamExt;
use rayon::prelude::*;

use super::receipts::fetch_receipts;
use super::{accept, throttle, AddressFilter};
use crate::config::Config;
use crate::records::{
    decode, pair, raw::RpcBlock, to_block, Block, FullBlock, Receipt, Transaction,
};
use crate::rpc_client::{GetBlockByNumber, RpcClient, RpcRequest, Transport};
use crate::store::write_json_file;
use crate::{BlockRange, Error, Result};

/// Fetches a block range together with the receipts of its transactions.
pub struct BlockScanner<'a, T> {
    client: &'a RpcClient<T>,
    range: BlockRange,
    batch_size: NonZeroUsize,
    receipt_batch_size: NonZeroUsize,
    concurrency: NonZeroUsize,
    delay: Duration,
    filter: AddressFilter,
    output_dir: PathBuf,
}

impl<'a, T: Transport> BlockScanner<'a, T> {
    pub fn new(client: &'a RpcClient<T>, cfg: &Config) -> Result<Self> {
        Ok(Self {
            client,
            range: cfg.scan.block_range()?,
            batch_size: cfg.scan.blocks.batch_size,
            receipt_batch_size: cfg.scan.receipts.batch_size,
            concurrency: cfg.scan.blocks.concurrency,
            delay: Duration::from_millis(cfg.rpc.delay_ms),
            filter: AddressFilter::from_config(&cfg.filter),
            output_dir: cfg.scan.output_dir.clone(),
        })
    }

    pub fn output_path(&self) -> PathBuf {
        self.output_dir
            .join(format!("blocks_{}_to_{}.json", self.range.from, self.range.to))
    }

    /// Scans the whole range and writes it as one file.
    ///
    /// Batches run `concurrency` at a time but are collected in range order. The first
    /// failing batch aborts the scan and nothing is written.
    pub async fn run(&self) -> Result<PathBuf> {
        let batches = self.range.partition(self.batch_size.get());
        let num_batches = batches.num_batches();
        let start = Instant::now();

        log::info!(
            "scanning blocks {}..={} in {} batches from {}",
            self.range.from,
            self.range.to,
            num_batches,
            self.client.transport().label()
        );

        let mut results = futures::stream::iter(batches)
            .map(|batch| self.fetch_batch(batch))
            .buffered(self.concurrency.get());

        let mut blocks = Vec::with_capacity(self.range.num_blocks().min(1 << 16) as usize);
        let mut num_txs = 0;
        let mut done = 0;
        while let Some(res) = results.next().await {
            let batch = res?;
            num_txs += batch.iter().map(|b| b.full_transactions.len()).sum::<usize>();
            blocks.extend(batch);
            done += 1;

            log::debug!("finished block batch {done}/{num_batches}");
        }

        if blocks.is_empty() {
            return Err(Error::NoDataFetched("blocks"));
        }

        let path = self.output_path();
        write_json_file(&path, &blocks)?;

        log::info!(
            "wrote {} blocks with {} transactions to {} in {:?}",
            blocks.len(),
            num_txs,
            path.display(),
            start.elapsed()
        );

        Ok(path)
    }

    async fn fetch_batch(&self, batch: Vec<u64>) -> Result<Vec<FullBlock>> {
        let reqs = batch
            .iter()
            .map(|&n| GetBlockByNumber(n).into())
            .collect::<Vec<RpcRequest>>();

        let outcomes = self.client.send_batch(&reqs).await?;
        throttle(self.delay).await;

        let raw_blocks = batch
            .iter()
            .zip(outcomes)
            .filter_map(|(n, outcome)| accept("eth_getBlockByNumber", n, outcome))
            .map(|raw| decode::<RpcBlock>("block", raw))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut blocks = raw_blocks
            .into_par_iter()
            .map(to_block)
            .collect::<std::result::Result<Vec<_>, _>>()?;

        for (_, txs) in blocks.iter_mut() {
            self.filter.retain(txs);
        }

        let hashes = blocks
            .iter()
            .flat_map(|(_, txs)| txs.iter().map(|tx| tx.hash.clone()))
            .collect::<Vec<_>>();
        let receipts = fetch_receipts(self.client, &hashes, self.receipt_batch_size, self.delay)
            .await?;

        let mut receipts = receipts.into_iter();
        blocks
            .into_iter()
            .map(|(block, txs)| -> Result<FullBlock> {
                let (txs, block_receipts) = with_receipts(&block, txs, &mut receipts);
                Ok(FullBlock {
                    full_transactions: pair(txs, block_receipts)?,
                    base_block: block,
                })
            })
            .collect()
    }
}

/// Takes one receipt per transaction, dropping transactions that have none.
fn with_receipts<R>(
    block: &Block,
    txs: Vec<Transaction>,
    receipts: &mut R,
) -> (Vec<Transaction>, Vec<Receipt>)
where
    R: Iterator<Item = Option<Receipt>>,
{
    let mut kept = Vec::with_capacity(txs.len());
    let mut kept_receipts = Vec::with_capacity(txs.len());

    for tx in txs {
        match receipts.next().flatten() {
            Some(receipt) => {
                kept.push(tx);
                kept_receipts.push(receipt);
            }
            None => log::warn!(
                "dropping transaction {} of block {}: no receipt",
                tx.hash,
                block.number
            ),
        }
    }

    (kept, kept_receipts)
}
