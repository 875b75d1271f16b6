mod args;
pub mod config;
pub mod error;
pub mod hex;
pub mod records;
pub mod rpc_client;
mod runner;
pub mod scan;
pub mod store;
#[cfg(test)]
pub(crate) mod test_utils;

pub use args::{ConfigArgs, Subcommands};
pub use error::{Error, Result};
pub use runner::Runner;

use config::ConfigError;

/// Inclusive range of block numbers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockRange {
    pub from: u64,
    pub to: u64,
}

impl BlockRange {
    pub fn new(from: u64, to: u64) -> std::result::Result<Self, ConfigError> {
        if from > to {
            return Err(ConfigError::InvalidRange { from, to });
        }

        Ok(Self { from, to })
    }

    pub fn num_blocks(&self) -> u64 {
        (self.to - self.from).saturating_add(1)
    }

    /// Consecutive batches of at most `batch_size` block numbers covering the range.
    /// Batches are built as the iterator is advanced.
    pub fn partition(&self, batch_size: usize) -> Partition {
        Partition {
            next: Some(self.from),
            to: self.to,
            batch_size: batch_size.max(1) as u64,
        }
    }
}

/// Iterator returned by [`BlockRange::partition`].
#[derive(Clone, Debug)]
pub struct Partition {
    next: Option<u64>,
    to: u64,
    batch_size: u64,
}

impl Partition {
    /// Number of batches left.
    pub fn num_batches(&self) -> u64 {
        match self.next {
            Some(start) => (self.to - start).saturating_add(1).div_ceil(self.batch_size),
            None => 0,
        }
    }
}

impl Iterator for Partition {
    type Item = Vec<u64>;

    fn next(&mut self) -> Option<Self::Item> {
        let start = self.next?;
        let end = start.saturating_add(self.batch_size - 1).min(self.to);
        self.next = if end == self.to { None } else { Some(end + 1) };

        Some((start..=end).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partition_example() {
        let batches = BlockRange::new(1, 10).unwrap().partition(3).collect::<Vec<_>>();

        assert_eq!(
            batches,
            vec![vec![1, 2, 3], vec![4, 5, 6], vec![7, 8, 9], vec![10]]
        );
    }

    #[test]
    fn test_partition_covers_range_once() {
        for (from, to) in [(0, 0), (5, 5), (0, 99), (17, 1000), (100, 101)] {
            let range = BlockRange::new(from, to).unwrap();
            for b in [1usize, 2, 3, 7, 64, 5000] {
                let partition = range.partition(b);
                let expected = range.num_blocks().div_ceil(b as u64);
                assert_eq!(partition.num_batches(), expected);

                let batches = partition.collect::<Vec<_>>();
                assert_eq!(batches.len() as u64, expected);
                assert!(batches.iter().all(|batch| !batch.is_empty() && batch.len() <= b));

                let flat: Vec<u64> = batches.into_iter().flatten().collect();
                assert_eq!(flat, (from..=to).collect::<Vec<_>>());
            }
        }
    }

    #[test]
    fn test_partition_at_u64_max() {
        let mut batches = BlockRange::new(u64::MAX - 1, u64::MAX).unwrap().partition(10);
        assert_eq!(batches.next(), Some(vec![u64::MAX - 1, u64::MAX]));
        assert_eq!(batches.next(), None);
        assert_eq!(batches.num_batches(), 0);
    }

    #[test]
    fn test_partition_is_lazy() {
        let mut batches = BlockRange::new(0, u64::MAX - 1).unwrap().partition(2);

        assert_eq!(batches.next(), Some(vec![0, 1]));
        assert_eq!(batches.next(), Some(vec![2, 3]));
        assert_eq!(batches.num_batches(), (u64::MAX - 4).div_ceil(2));
    }

    #[test]
    fn test_invalid_range() {
        assert!(matches!(
            BlockRange::new(3, 2),
            Err(ConfigError::InvalidRange { from: 3, to: 2 })
        ));
    }
}
