//! Generated-transactions index — cumulative transaction count per height.
//!
//! Heights are appended strictly in order starting at 0 and only the tip can
//! be removed, so the index always mirrors the main chain exactly.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::IndexError;
use crate::optional::OptionalIndex;
use crate::types::GenerationBlock;

/// Serialized form of a [`GeneratedTransactionsIndex`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedTransactionsSnapshot {
    pub index: BTreeMap<u32, u64>,
    pub last_generated_tx_number: u64,
}

#[derive(Debug, Clone, Default)]
struct GeneratedCounts {
    index: BTreeMap<u32, u64>,
    last_generated_tx_number: u64,
}

/// Height → number of transactions in the chain up to and including that height.
#[derive(Debug, Clone)]
pub struct GeneratedTransactionsIndex {
    inner: OptionalIndex<GeneratedCounts>,
}

impl GeneratedTransactionsIndex {
    pub fn new(enabled: bool) -> Self {
        Self {
            inner: OptionalIndex::new("generated transactions", enabled),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.is_enabled()
    }

    /// Record `block` as the next height.
    ///
    /// Fails unless the block's height equals the number of recorded heights.
    pub fn add(&mut self, block: &impl GenerationBlock) -> bool {
        self.inner.mutate(|counts| {
            let height = match block.generation_height() {
                Ok(height) => height,
                Err(e) => {
                    tracing::debug!(error = %e, "generated transactions index: no block height");
                    return false;
                }
            };
            if counts.index.len() != height as usize {
                return false;
            }
            // +1 for the generation transaction
            let total = counts.last_generated_tx_number + block.transaction_count() as u64 + 1;
            counts.index.insert(height, total);
            counts.last_generated_tx_number = total;
            true
        })
    }

    /// Remove the most recently added height.
    pub fn remove(&mut self, block: &impl GenerationBlock) -> bool {
        self.inner.mutate(|counts| {
            let height = match block.generation_height() {
                Ok(height) => height,
                Err(e) => {
                    tracing::debug!(error = %e, "generated transactions index: no block height");
                    return false;
                }
            };
            if counts.index.is_empty() || height as usize != counts.index.len() - 1 {
                return false;
            }
            counts.index.remove(&height);
            counts.last_generated_tx_number = match height.checked_sub(1) {
                Some(prev) => counts.index.get(&prev).copied().unwrap_or(0),
                None => 0,
            };
            true
        })
    }

    /// Cumulative transaction count at `height`, or `None` if not recorded.
    pub fn find(&self, height: u32) -> Result<Option<u64>, IndexError> {
        Ok(self.inner.read()?.index.get(&height).copied())
    }

    /// Running total of transactions across all recorded heights.
    pub fn total(&self) -> Result<u64, IndexError> {
        Ok(self.inner.read()?.last_generated_tx_number)
    }

    /// Number of recorded heights.
    pub fn len(&self) -> Result<usize, IndexError> {
        Ok(self.inner.read()?.index.len())
    }

    pub fn is_empty(&self) -> Result<bool, IndexError> {
        Ok(self.inner.read()?.index.is_empty())
    }

    pub fn clear(&mut self) {
        self.inner.clear();
    }

    pub fn snapshot(&self) -> Result<GeneratedTransactionsSnapshot, IndexError> {
        let counts = self.inner.read()?;
        Ok(GeneratedTransactionsSnapshot {
            index: counts.index.clone(),
            last_generated_tx_number: counts.last_generated_tx_number,
        })
    }

    /// Replace the contents with `snapshot`.
    ///
    /// Rejects a snapshot whose heights are not `0..n`, whose counts do not
    /// grow by at least one per height, or whose running total disagrees
    /// with the tip; the current contents are kept in that case.
    pub fn restore(&mut self, snapshot: GeneratedTransactionsSnapshot) -> Result<(), IndexError> {
        let counts = self.inner.write()?;
        if let Err(reason) = validate(&snapshot) {
            tracing::warn!(%reason, "Rejected generated transactions snapshot");
            return Err(IndexError::InvalidSnapshot {
                index: "generated transactions",
                reason,
            });
        }
        counts.index = snapshot.index;
        counts.last_generated_tx_number = snapshot.last_generated_tx_number;
        Ok(())
    }
}

fn validate(snapshot: &GeneratedTransactionsSnapshot) -> Result<(), String> {
    let mut previous = 0u64;
    for (expected_height, (&height, &count)) in snapshot.index.iter().enumerate() {
        if height as usize != expected_height {
            return Err(format!("height {expected_height} missing"));
        }
        if count <= previous {
            return Err(format!("count at height {height} does not grow"));
        }
        previous = count;
    }
    if snapshot.last_generated_tx_number != previous {
        return Err(format!(
            "running total {} does not match tip count {previous}",
            snapshot.last_generated_tx_number
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ChainDataError;
    use crate::types::Hash;

    struct B {
        height: Result<u32, ChainDataError>,
        txs: usize,
    }

    impl GenerationBlock for B {
        fn hash(&self) -> Hash {
            Hash::ZERO
        }
        fn generation_height(&self) -> Result<u32, ChainDataError> {
            self.height.clone()
        }
        fn transaction_count(&self) -> usize {
            self.txs
        }
    }

    fn b(height: u32, txs: usize) -> B {
        B {
            height: Ok(height),
            txs,
        }
    }

    #[test]
    fn cumulative_counts() {
        let mut idx = GeneratedTransactionsIndex::new(true);
        let tx_counts = [0usize, 3, 1, 5];
        for (h, txs) in tx_counts.iter().enumerate() {
            assert!(idx.add(&b(h as u32, *txs)));
        }
        let mut expected = 0u64;
        for (h, txs) in tx_counts.iter().enumerate() {
            expected += *txs as u64 + 1;
            assert_eq!(idx.find(h as u32).unwrap(), Some(expected));
        }
        assert_eq!(idx.total().unwrap(), expected);
        assert_eq!(idx.find(4).unwrap(), None);
    }

    #[test]
    fn rejects_gaps_and_overwrites() {
        let mut idx = GeneratedTransactionsIndex::new(true);
        assert!(!idx.add(&b(1, 0)));
        assert!(idx.add(&b(0, 0)));
        assert!(!idx.add(&b(0, 7)));
        assert!(!idx.add(&b(2, 0)));
        assert_eq!(idx.len().unwrap(), 1);
        assert_eq!(idx.total().unwrap(), 1);
    }

    #[test]
    fn only_tip_can_be_removed() {
        let mut idx = GeneratedTransactionsIndex::new(true);
        idx.add(&b(0, 2));
        idx.add(&b(1, 4));
        idx.add(&b(2, 1));

        assert!(!idx.remove(&b(1, 4)));
        assert!(idx.remove(&b(2, 1)));
        assert_eq!(idx.total().unwrap(), 8);
        assert!(idx.remove(&b(1, 4)));
        assert_eq!(idx.total().unwrap(), 3);
        assert!(idx.remove(&b(0, 2)));
        assert_eq!(idx.total().unwrap(), 0);
        assert!(!idx.remove(&b(0, 2)));
    }

    #[test]
    fn missing_height_is_an_ordinary_miss() {
        let mut idx = GeneratedTransactionsIndex::new(true);
        let bad = B {
            height: Err(ChainDataError::NoInputs),
            txs: 0,
        };
        assert!(!idx.add(&bad));
        assert!(!idx.remove(&bad));
        assert!(idx.is_empty().unwrap());
    }

    #[test]
    fn restore_rejects_inconsistent_snapshots() {
        let mut idx = GeneratedTransactionsIndex::new(true);
        idx.add(&b(0, 1));
        let before = idx.snapshot().unwrap();

        let gap = GeneratedTransactionsSnapshot {
            index: BTreeMap::from([(0, 1), (2, 3)]),
            last_generated_tx_number: 3,
        };
        let stale_total = GeneratedTransactionsSnapshot {
            index: BTreeMap::from([(0, 1), (1, 3)]),
            last_generated_tx_number: 1,
        };
        let shrinking = GeneratedTransactionsSnapshot {
            index: BTreeMap::from([(0, 4), (1, 2)]),
            last_generated_tx_number: 2,
        };
        let orphan_total = GeneratedTransactionsSnapshot {
            index: BTreeMap::new(),
            last_generated_tx_number: 9,
        };

        for snapshot in [gap, stale_total, shrinking, orphan_total] {
            assert!(matches!(
                idx.restore(snapshot),
                Err(IndexError::InvalidSnapshot { .. })
            ));
            assert_eq!(idx.snapshot().unwrap(), before);
        }

        assert!(idx.restore(GeneratedTransactionsSnapshot::default()).is_ok());
        assert!(idx.is_empty().unwrap());
    }

    #[test]
    fn disabled_policy() {
        let mut idx = GeneratedTransactionsIndex::new(false);
        assert!(!idx.add(&b(0, 0)));
        assert!(!idx.remove(&b(0, 0)));
        assert!(matches!(idx.find(0), Err(IndexError::Disabled { .. })));
        assert!(idx.snapshot().is_err());
    }

    #[test]
    fn snapshot_keeps_running_total() {
        let mut idx = GeneratedTransactionsIndex::new(true);
        idx.add(&b(0, 2));
        idx.add(&b(1, 2));
        let json = serde_json::to_string(&idx.snapshot().unwrap()).unwrap();

        let mut restored = GeneratedTransactionsIndex::new(true);
        restored.restore(serde_json::from_str(&json).unwrap()).unwrap();
        assert_eq!(restored.total().unwrap(), 6);
        assert!(restored.add(&b(2, 0)));
        assert_eq!(restored.find(2).unwrap(), Some(7));
    }
}
