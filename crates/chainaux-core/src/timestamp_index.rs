//! Timestamp indices — ordered multimaps of timestamp → block or transaction hash.
//!
//! Blocks and transactions are indexed by two separate instances with the same
//! structure. The transaction variant carries one extra rule for queries that
//! end at timestamp 0, see [`TimestampTransactionsIndex::find`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::IndexError;
use crate::optional::{remove_one, OptionalIndex};
use crate::types::Hash;

/// Result of a timestamp range query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimestampRange {
    /// Matching hashes in timestamp order, at most `limit` of them.
    pub hashes: Vec<Hash>,
    /// Number of entries in the range regardless of `limit`.
    pub total: usize,
}

impl TimestampRange {
    /// Returns `true` if `limit` cut the result short.
    pub fn is_truncated(&self) -> bool {
        self.hashes.len() < self.total
    }
}

/// Serialized form of a timestamp index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimestampSnapshot {
    pub index: BTreeMap<u64, Vec<Hash>>,
}

#[derive(Debug, Clone, Default)]
struct TimestampMap(BTreeMap<u64, Vec<Hash>>);

impl TimestampMap {
    fn add(&mut self, timestamp: u64, hash: Hash) -> bool {
        self.0.entry(timestamp).or_default().push(hash);
        true
    }

    fn remove(&mut self, timestamp: u64, hash: &Hash) -> bool {
        let Some(bucket) = self.0.get_mut(&timestamp) else {
            return false;
        };
        let removed = remove_one(bucket, hash);
        if bucket.is_empty() {
            self.0.remove(&timestamp);
        }
        removed
    }

    fn find(&self, begin: u64, end: u64, limit: usize, genesis_fix: bool) -> Option<TimestampRange> {
        if begin > end {
            return None;
        }

        let mut total: usize = self.0.range(begin..=end).map(|(_, b)| b.len()).sum();
        let mut hashes: Vec<Hash> = self
            .0
            .range(begin..=end)
            .flat_map(|(_, bucket)| bucket.iter().copied())
            .take(limit)
            .collect();

        // Genesis may be recorded with a non-zero timestamp; a query ending at 0
        // that would start at the first entry and match nothing still yields it.
        if genesis_fix && end == 0 && total == 0 && self.0.range(..begin).next().is_none() {
            if let Some(first) = self.0.values().flat_map(|b| b.first()).next() {
                total = 1;
                if limit > 0 {
                    hashes.push(*first);
                }
            }
        }

        (!hashes.is_empty()).then_some(TimestampRange { hashes, total })
    }

    fn snapshot(&self) -> TimestampSnapshot {
        TimestampSnapshot {
            index: self.0.clone(),
        }
    }

    fn restore(&mut self, snapshot: TimestampSnapshot) {
        self.0 = snapshot.index;
        self.0.retain(|_, bucket| !bucket.is_empty());
    }
}

// ─── Blocks ───────────────────────────────────────────────────────────────────

/// Block timestamp → block hash.
#[derive(Debug, Clone)]
pub struct TimestampBlocksIndex {
    inner: OptionalIndex<TimestampMap>,
}

impl TimestampBlocksIndex {
    pub fn new(enabled: bool) -> Self {
        Self {
            inner: OptionalIndex::new("timestamp blocks", enabled),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.is_enabled()
    }

    pub fn add(&mut self, timestamp: u64, hash: Hash) -> bool {
        self.inner.mutate(|map| map.add(timestamp, hash))
    }

    pub fn remove(&mut self, timestamp: u64, hash: &Hash) -> bool {
        self.inner.mutate(|map| map.remove(timestamp, hash))
    }

    /// Up to `limit` block hashes with a timestamp in `[begin, end]`.
    ///
    /// Returns `None` when `begin > end` or nothing was returned.
    pub fn find(
        &self,
        begin: u64,
        end: u64,
        limit: usize,
    ) -> Result<Option<TimestampRange>, IndexError> {
        Ok(self.inner.read()?.find(begin, end, limit, false))
    }

    pub fn clear(&mut self) {
        self.inner.clear();
    }

    pub fn snapshot(&self) -> Result<TimestampSnapshot, IndexError> {
        Ok(self.inner.read()?.snapshot())
    }

    pub fn restore(&mut self, snapshot: TimestampSnapshot) -> Result<(), IndexError> {
        self.inner.write()?.restore(snapshot);
        Ok(())
    }
}

// ─── Transactions ─────────────────────────────────────────────────────────────

/// Transaction timestamp → transaction hash.
#[derive(Debug, Clone)]
pub struct TimestampTransactionsIndex {
    inner: OptionalIndex<TimestampMap>,
}

impl TimestampTransactionsIndex {
    pub fn new(enabled: bool) -> Self {
        Self {
            inner: OptionalIndex::new("timestamp transactions", enabled),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.is_enabled()
    }

    pub fn add(&mut self, timestamp: u64, hash: Hash) -> bool {
        self.inner.mutate(|map| map.add(timestamp, hash))
    }

    pub fn remove(&mut self, timestamp: u64, hash: &Hash) -> bool {
        self.inner.mutate(|map| map.remove(timestamp, hash))
    }

    /// Up to `limit` transaction hashes with a timestamp in `[begin, end]`.
    ///
    /// When `end == 0` and the range is empty at the very start of a non-empty
    /// index, the first entry is returned anyway so the genesis transaction is
    /// visible to default-epoch queries.
    pub fn find(
        &self,
        begin: u64,
        end: u64,
        limit: usize,
    ) -> Result<Option<TimestampRange>, IndexError> {
        Ok(self.inner.read()?.find(begin, end, limit, true))
    }

    pub fn clear(&mut self) {
        self.inner.clear();
    }

    pub fn snapshot(&self) -> Result<TimestampSnapshot, IndexError> {
        Ok(self.inner.read()?.snapshot())
    }

    pub fn restore(&mut self, snapshot: TimestampSnapshot) -> Result<(), IndexError> {
        self.inner.write()?.restore(snapshot);
        Ok(())
    }
}
