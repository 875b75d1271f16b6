use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use super::throttle;
use crate::config::{AccountScanConfig, Config};
use crate::records::{decode, raw::RpcAccountPage, to_account, Account, AccountStore};
use crate::rpc_client::{self, AccountRange, RpcClient, RpcRequest, Transport};
use crate::store::{read_json_file, write_json_file};
use crate::{Error, Result};

const REPORT_EVERY_PAGES: u64 = 20;

/// Why an account scan stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScanEnd {
    /// A page repeated an address that was already seen.
    Wrapped,
    /// At least `max_accounts` distinct addresses were processed. The page that crossed
    /// the limit is processed in full.
    MaxReached,
    /// The node returned an empty page or no continuation cursor.
    Exhausted,
}

#[derive(Clone, Debug)]
pub struct ScanStats {
    pub pages: u64,
    pub contracts: u64,
    pub non_contracts: u64,
    /// Contracts with a non-zero balance, the ones that end up in the output.
    pub contracts_with_balance: u64,
    started: Instant,
    last_report: Instant,
    retained_at_last_report: u64,
}

impl ScanStats {
    fn new() -> Self {
        let now = Instant::now();
        Self {
            pages: 0,
            contracts: 0,
            non_contracts: 0,
            contracts_with_balance: 0,
            started: now,
            last_report: now,
            retained_at_last_report: 0,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

pub struct AccountScanReport {
    /// Merged output holding every retained account.
    pub output: PathBuf,
    /// Chunk files written during the scan. They are left on disk.
    pub chunk_files: Vec<PathBuf>,
    pub stats: ScanStats,
    pub end: ScanEnd,
    /// Cursor after the last processed page.
    pub cursor: String,
}

struct ScanState {
    cursor: String,
    seen: HashSet<String>,
    latest: Option<String>,
    accumulated: AccountStore,
    accumulated_bytes: usize,
    chunk_files: Vec<PathBuf>,
    stats: ScanStats,
}

impl ScanState {
    fn new(cursor: String) -> Self {
        Self {
            cursor,
            seen: HashSet::new(),
            latest: None,
            accumulated: AccountStore::new(),
            accumulated_bytes: 0,
            chunk_files: Vec::new(),
            stats: ScanStats::new(),
        }
    }

    /// Folds one page into the accumulator. Returns `Some` once the scan is over.
    fn apply_page(
        &mut self,
        page: RpcAccountPage,
        cfg: &AccountScanConfig,
    ) -> Result<Option<ScanEnd>> {
        self.stats.pages += 1;

        if page.accounts.is_empty() {
            return Ok(Some(ScanEnd::Exhausted));
        }

        let mut end = None;
        for (address, raw) in page.accounts {
            let address = address.to_ascii_lowercase();
            if self.seen.contains(&address) {
                log::info!("address {address} seen before, account range wrapped around");
                end.get_or_insert(ScanEnd::Wrapped);
                break;
            }

            let account = to_account(raw, &cfg.empty_code_hash)?;
            self.seen.insert(address.clone());
            self.latest = Some(address.clone());

            if account.is_contract {
                self.stats.contracts += 1;
                if !account.balance.is_zero() {
                    self.stats.contracts_with_balance += 1;
                    self.accumulated_bytes += estimated_size(&address, &account);
                    self.accumulated.insert(address, account);
                }
            } else {
                self.stats.non_contracts += 1;
            }

            // the rest of the page is still processed
            if cfg.max_accounts > 0 && self.seen.len() as u64 >= cfg.max_accounts {
                end.get_or_insert(ScanEnd::MaxReached);
            }
        }

        match page.next.filter(|next| !next.is_empty()) {
            Some(next) => self.cursor = next,
            None => {
                end.get_or_insert(ScanEnd::Exhausted);
            }
        }

        Ok(end)
    }

    fn report(&mut self) {
        let stats = &mut self.stats;
        let since = stats.last_report.elapsed().as_secs_f64();
        let retained = stats.contracts_with_balance - stats.retained_at_last_report;
        let rate = if since > 0.0 { retained as f64 / since } else { 0.0 };

        log::info!(
            "pages: {}, accounts: {}, contracts: {}, non-contracts: {}, retained: {} ({:.1}/s), cursor: {}, latest: {}, elapsed: {:?}",
            stats.pages,
            self.seen.len(),
            stats.contracts,
            stats.non_contracts,
            stats.contracts_with_balance,
            rate,
            self.cursor,
            self.latest.as_deref().unwrap_or("-"),
            stats.started.elapsed()
        );

        stats.last_report = Instant::now();
        stats.retained_at_last_report = stats.contracts_with_balance;
    }
}

/// Rough in-memory footprint of one accumulator entry.
fn estimated_size(address: &str, account: &Account) -> usize {
    std::mem::size_of::<String>()
        + std::mem::size_of::<Account>()
        + address.len()
        + account.root.len()
        + account.code_hash.len()
}

/// Walks the node's account trie page by page and keeps contracts holding a balance.
///
/// Memory stays bounded by flushing the accumulator into numbered chunk files, which
/// are merged into one sorted file at the end.
pub struct AccountScanner<'a, T> {
    client: &'a RpcClient<T>,
    cfg: AccountScanConfig,
    output_dir: PathBuf,
    delay: Duration,
}

impl<'a, T: Transport> AccountScanner<'a, T> {
    pub fn new(client: &'a RpcClient<T>, cfg: &Config) -> Self {
        Self {
            client,
            cfg: cfg.scan.accounts.clone(),
            output_dir: cfg.scan.output_dir.clone(),
            delay: Duration::from_millis(cfg.rpc.delay_ms),
        }
    }

    pub fn chunk_path(&self, n: usize) -> PathBuf {
        self.output_dir
            .join(format!("{}_{}.json", self.cfg.output_file_name, n))
    }

    pub fn merged_path(&self) -> PathBuf {
        self.output_dir
            .join(format!("{}_merged.json", self.cfg.output_file_name))
    }

    pub async fn run(&self) -> Result<AccountScanReport> {
        let mut state = ScanState::new(self.cfg.start_key.clone());

        log::info!(
            "scanning accounts at {:?} from {} with pages of {}",
            self.cfg.block_tag(),
            self.client.transport().label(),
            self.cfg.page_size
        );

        let end = loop {
            let page = self.fetch_page(&state.cursor).await?;
            throttle(self.delay).await;

            let end = state.apply_page(page, &self.cfg)?;
            if state.stats.pages % REPORT_EVERY_PAGES == 0 {
                state.report();
            }

            if let Some(end) = end {
                break end;
            }

            if state.accumulated_bytes >= self.cfg.flush_threshold_bytes.get() {
                self.flush(&mut state)?;
            }
        };

        state.report();
        let output = self.finish(&mut state)?;

        Ok(AccountScanReport {
            output,
            chunk_files: state.chunk_files,
            stats: state.stats,
            end,
            cursor: state.cursor,
        })
    }

    async fn fetch_page(&self, cursor: &str) -> Result<RpcAccountPage> {
        let req: RpcRequest = AccountRange {
            block: self.cfg.block_tag(),
            start: cursor.to_owned(),
            max_results: self.cfg.page_size.get(),
            nocode: self.cfg.nocode,
            nostorage: self.cfg.nostorage,
        }
        .into();

        let outcome = self
            .client
            .send_batch(&[req])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| {
                rpc_client::Error::InvalidRPCResponse(anyhow::anyhow!("empty account range reply"))
            })?;

        let raw = outcome.map_err(Error::PageRejected)?;

        Ok(decode("account range page", raw)?)
    }

    fn flush(&self, state: &mut ScanState) -> Result<()> {
        let path = self.chunk_path(state.chunk_files.len() + 1);
        write_json_file(&path, &state.accumulated)?;

        log::info!(
            "flushed {} accounts (~{} KiB) to {}",
            state.accumulated.len(),
            state.accumulated_bytes / 1024,
            path.display()
        );

        state.chunk_files.push(path);
        state.accumulated.clear();
        state.accumulated_bytes = 0;

        Ok(())
    }

    fn finish(&self, state: &mut ScanState) -> Result<PathBuf> {
        let merged = self.merged_path();

        if state.chunk_files.is_empty() {
            if state.accumulated.is_empty() {
                return Err(Error::NoDataFetched("accounts"));
            }

            write_json_file(&merged, &state.accumulated)?;
            log::info!(
                "wrote {} accounts to {}",
                state.accumulated.len(),
                merged.display()
            );
            return Ok(merged);
        }

        if !state.accumulated.is_empty() {
            self.flush(state)?;
        }

        let total = merge_chunks(&state.chunk_files, &merged)?;
        log::info!(
            "merged {} chunks into {} with {} accounts",
            state.chunk_files.len(),
            merged.display(),
            total
        );

        Ok(merged)
    }
}

/// Merges chunk files into one address-sorted file and returns the number of accounts.
///
/// On a repeated address the later chunk wins. Chunks are left in place.
pub fn merge_chunks(chunk_files: &[PathBuf], output: &Path) -> Result<usize> {
    let mut merged = AccountStore::new();

    for chunk in chunk_files {
        let accounts: AccountStore = read_json_file(chunk)?;
        log::debug!("merging {} accounts from {}", accounts.len(), chunk.display());
        merged.extend(accounts);
    }

    write_json_file(output, &merged)?;

    Ok(merged.len())
}
