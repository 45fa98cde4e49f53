//! Orphan-blocks index — height → hashes of blocks that left the main chain.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::IndexError;
use crate::optional::{remove_one, OptionalIndex};
use crate::types::{GenerationBlock, Hash};

/// Serialized form of an [`OrphanBlocksIndex`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrphanBlocksSnapshot {
    pub index: BTreeMap<u32, Vec<Hash>>,
}

/// Competing blocks that were once applied, keyed by height.
#[derive(Debug, Clone)]
pub struct OrphanBlocksIndex {
    inner: OptionalIndex<BTreeMap<u32, Vec<Hash>>>,
}

impl OrphanBlocksIndex {
    pub fn new(enabled: bool) -> Self {
        Self {
            inner: OptionalIndex::new("orphan blocks", enabled),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.is_enabled()
    }

    pub fn add(&mut self, block: &impl GenerationBlock) -> bool {
        self.inner.mutate(|map| match block.generation_height() {
            Ok(height) => {
                map.entry(height).or_default().push(block.hash());
                true
            }
            Err(e) => {
                tracing::debug!(error = %e, "orphan blocks index: no block height");
                false
            }
        })
    }

    pub fn remove(&mut self, block: &impl GenerationBlock) -> bool {
        self.inner.mutate(|map| {
            let height = match block.generation_height() {
                Ok(height) => height,
                Err(e) => {
                    tracing::debug!(error = %e, "orphan blocks index: no block height");
                    return false;
                }
            };
            let Some(bucket) = map.get_mut(&height) else {
                return false;
            };
            let removed = remove_one(bucket, &block.hash());
            if bucket.is_empty() {
                map.remove(&height);
            }
            removed
        })
    }

    /// All orphaned block hashes at `height`, or `None` if there are none.
    pub fn find(&self, height: u32) -> Result<Option<Vec<Hash>>, IndexError> {
        let map = self.inner.read()?;
        Ok(map.get(&height).filter(|b| !b.is_empty()).cloned())
    }

    pub fn clear(&mut self) {
        self.inner.clear();
    }

    pub fn snapshot(&self) -> Result<OrphanBlocksSnapshot, IndexError> {
        Ok(OrphanBlocksSnapshot {
            index: self.inner.read()?.clone(),
        })
    }

    pub fn restore(&mut self, snapshot: OrphanBlocksSnapshot) -> Result<(), IndexError> {
        let map = self.inner.write()?;
        *map = snapshot.index;
        map.retain(|_, bucket| !bucket.is_empty());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Block, Transaction, TransactionInput};

    fn block(height: u32, hash: u8) -> Block {
        Block {
            hash: Hash::new([hash; 32]),
            timestamp: 0,
            base_transaction: Transaction {
                hash: Hash::ZERO,
                inputs: vec![TransactionInput::Generation { height }],
                extra: vec![],
            },
            transaction_hashes: vec![],
        }
    }

    #[test]
    fn competing_blocks_share_a_height() {
        let mut idx = OrphanBlocksIndex::new(true);
        assert!(idx.add(&block(10, 1)));
        assert!(idx.add(&block(10, 2)));
        assert_eq!(
            idx.find(10).unwrap(),
            Some(vec![Hash::new([1; 32]), Hash::new([2; 32])])
        );
        assert_eq!(idx.find(11).unwrap(), None);
    }

    #[test]
    fn remove_exact_pair() {
        let mut idx = OrphanBlocksIndex::new(true);
        idx.add(&block(10, 1));
        assert!(!idx.remove(&block(11, 1)));
        assert!(!idx.remove(&block(10, 2)));
        assert!(idx.remove(&block(10, 1)));
        assert_eq!(idx.find(10).unwrap(), None);
        assert_eq!(idx.snapshot().unwrap(), OrphanBlocksSnapshot::default());
    }

    #[test]
    fn non_generation_block_is_ignored() {
        let mut idx = OrphanBlocksIndex::new(true);
        let mut b = block(3, 1);
        b.base_transaction.inputs = vec![TransactionInput::Multisignature {
            amount: 5,
            signatures: 2,
            output_index: 0,
        }];
        assert!(!idx.add(&b));
        assert_eq!(idx.snapshot().unwrap(), OrphanBlocksSnapshot::default());
    }

    #[test]
    fn snapshot_roundtrip_through_json() {
        let mut idx = OrphanBlocksIndex::new(true);
        idx.add(&block(10, 1));
        idx.add(&block(10, 2));
        idx.add(&block(12, 3));
        let json = serde_json::to_string(&idx.snapshot().unwrap()).unwrap();

        let mut restored = OrphanBlocksIndex::new(true);
        restored.restore(serde_json::from_str(&json).unwrap()).unwrap();
        assert_eq!(restored.snapshot().unwrap(), idx.snapshot().unwrap());
        assert_eq!(
            restored.find(10).unwrap(),
            Some(vec![Hash::new([1; 32]), Hash::new([2; 32])])
        );
        assert!(restored.remove(&block(10, 2)));
        assert_eq!(restored.find(10).unwrap(), Some(vec![Hash::new([1; 32])]));
    }

    #[test]
    fn disabled_policy() {
        let mut idx = OrphanBlocksIndex::new(false);
        assert!(!idx.add(&block(1, 1)));
        assert!(!idx.remove(&block(1, 1)));
        assert!(matches!(idx.find(1), Err(IndexError::Disabled { .. })));
    }
}
