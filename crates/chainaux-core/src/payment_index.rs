//! Payment-id index — maps a payment id to every transaction tagged with it.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::IndexError;
use crate::optional::{remove_one, OptionalIndex};
use crate::types::{Hash, PaymentIdSource};

/// Initial bucket count of the payment-id map.
pub const DEFAULT_BUCKET_COUNT: usize = 5;

/// Serialized form of a [`PaymentIdIndex`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentIdSnapshot {
    pub index: HashMap<Hash, Vec<Hash>>,
}

#[derive(Debug, Clone)]
struct PaymentIdMap(HashMap<Hash, Vec<Hash>>);

impl Default for PaymentIdMap {
    fn default() -> Self {
        Self(HashMap::with_capacity(DEFAULT_BUCKET_COUNT))
    }
}

/// Many-to-many mapping of payment id → transaction hash.
#[derive(Debug, Clone)]
pub struct PaymentIdIndex {
    inner: OptionalIndex<PaymentIdMap>,
}

impl PaymentIdIndex {
    pub fn new(enabled: bool) -> Self {
        Self {
            inner: OptionalIndex::new("payment id", enabled),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.is_enabled()
    }

    /// Index a transaction under its payment id.
    ///
    /// Returns `false` if the transaction carries no payment id.
    pub fn add(&mut self, transaction: &impl PaymentIdSource) -> bool {
        self.inner.mutate(|map| {
            let Some(payment_id) = transaction.payment_id() else {
                return false;
            };
            map.0.entry(payment_id).or_default().push(transaction.hash());
            true
        })
    }

    /// Undo a previous [`add`](Self::add) of the same transaction.
    pub fn remove(&mut self, transaction: &impl PaymentIdSource) -> bool {
        self.inner.mutate(|map| {
            let Some(payment_id) = transaction.payment_id() else {
                return false;
            };
            let Some(bucket) = map.0.get_mut(&payment_id) else {
                return false;
            };
            let removed = remove_one(bucket, &transaction.hash());
            if bucket.is_empty() {
                map.0.remove(&payment_id);
            }
            removed
        })
    }

    /// All transaction hashes tagged with `payment_id`, or `None` if there are none.
    pub fn find(&self, payment_id: &Hash) -> Result<Option<Vec<Hash>>, IndexError> {
        let map = self.inner.read()?;
        Ok(map.0.get(payment_id).filter(|b| !b.is_empty()).cloned())
    }

    pub fn clear(&mut self) {
        self.inner.clear();
    }

    pub fn snapshot(&self) -> Result<PaymentIdSnapshot, IndexError> {
        Ok(PaymentIdSnapshot {
            index: self.inner.read()?.0.clone(),
        })
    }

    pub fn restore(&mut self, snapshot: PaymentIdSnapshot) -> Result<(), IndexError> {
        let map = self.inner.write()?;
        map.0 = snapshot.index;
        map.0.retain(|_, bucket| !bucket.is_empty());
        Ok(())
    }
}
