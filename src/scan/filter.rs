use std::collections::BTreeSet;

use crate::config::FilterConfig;
use crate::records::Transaction;

/// Filter entry matching transactions without a recipient.
pub const CONTRACT_CREATION: &str = "ContractCreation";

/// Allow-list of transaction senders and recipients.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AddressFilter {
    addresses: BTreeSet<String>,
    contract_creation: bool,
}

impl AddressFilter {
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut filter = Self::default();

        for entry in entries {
            let entry = entry.as_ref();
            if entry == CONTRACT_CREATION {
                filter.contract_creation = true;
            } else {
                filter.addresses.insert(entry.to_ascii_lowercase());
            }
        }

        filter
    }

    pub fn from_config(cfg: &FilterConfig) -> Self {
        Self::new(&cfg.addresses)
    }

    /// An empty filter lets everything through.
    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty() && !self.contract_creation
    }

    pub fn matches(&self, tx: &Transaction) -> bool {
        if self.is_empty() {
            return true;
        }

        if tx.to.is_empty() && self.contract_creation {
            return true;
        }

        self.addresses.contains(&tx.from.to_ascii_lowercase())
            || (!tx.to.is_empty() && self.addresses.contains(&tx.to.to_ascii_lowercase()))
    }

    pub fn retain(&self, txs: &mut Vec<Transaction>) {
        if !self.is_empty() {
            txs.retain(|tx| self.matches(tx));
        }
    }
}
