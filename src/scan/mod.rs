//! Scan orchestration: block ranges, receipts, account ranges and per-address lookups.

pub mod accounts;
pub mod addresses;
pub mod blocks;
pub mod filter;
pub mod receipts;

pub use accounts::{merge_chunks, AccountScanReport, AccountScanner, ScanEnd, ScanStats};
pub use addresses::AddressScanner;
pub use blocks::BlockScanner;
pub use filter::{AddressFilter, CONTRACT_CREATION};
pub use receipts::ReceiptScanner;

use std::fmt::Display;
use std::time::Duration;

use crate::rpc_client::RpcOutcome;

/// Fixed pause after each batch.
pub(crate) async fn throttle(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

/// Result of one batch element, or `None` if the node rejected it or had nothing for it.
/// Either way the element is logged and left out of the scan.
pub(crate) fn accept(method: &str, key: &dyn Display, outcome: RpcOutcome) -> Option<serde_json::Value> {
    match outcome {
        Ok(serde_json::Value::Null) => {
            log::warn!("{method} returned null for {key}, skipping");
            None
        }
        Ok(res) => Some(res),
        Err(e) => {
            log::warn!("{method} failed for {key}, skipping. Caused by: {e}");
            None
        }
    }
}
