//! Enabled/disabled wrapper shared by every auxiliary index.
//!
//! An index is switched on or off once, at construction, from configuration.
//! A disabled index silently ignores mutations (they return `false`) but
//! refuses queries and snapshots with [`IndexError::Disabled`]: the caller is
//! expected to know its own configuration before asking.

use crate::error::IndexError;
use crate::types::Hash;

#[derive(Debug, Clone)]
pub(crate) struct OptionalIndex<T> {
    name: &'static str,
    inner: Option<T>,
}

impl<T: Default> OptionalIndex<T> {
    pub(crate) fn new(name: &'static str, enabled: bool) -> Self {
        Self {
            name,
            inner: enabled.then(T::default),
        }
    }

    pub(crate) fn is_enabled(&self) -> bool {
        self.inner.is_some()
    }

    /// Apply a mutation if enabled; a disabled index reports `false`.
    pub(crate) fn mutate(&mut self, f: impl FnOnce(&mut T) -> bool) -> bool {
        self.inner.as_mut().map_or(false, f)
    }

    pub(crate) fn read(&self) -> Result<&T, IndexError> {
        self.inner
            .as_ref()
            .ok_or(IndexError::Disabled { index: self.name })
    }

    pub(crate) fn write(&mut self) -> Result<&mut T, IndexError> {
        let name = self.name;
        self.inner
            .as_mut()
            .ok_or(IndexError::Disabled { index: name })
    }

    pub(crate) fn clear(&mut self) {
        if let Some(inner) = self.inner.as_mut() {
            *inner = T::default();
        }
    }
}

/// Remove the first occurrence of `hash` from a multimap bucket.
pub(crate) fn remove_one(bucket: &mut Vec<Hash>, hash: &Hash) -> bool {
    match bucket.iter().position(|h| h == hash) {
        Some(pos) => {
            bucket.remove(pos);
            true
        }
        None => false,
    }
}
