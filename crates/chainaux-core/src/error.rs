//! Error types for indices, chain data extraction, and checkpoints.

use thiserror::Error;

use crate::types::Hash;

/// Errors raised by the auxiliary indices.
///
/// Ordinary misses (absent payment id, nothing to remove, empty range) are
/// not errors; they are reported through `bool` / `Option` return values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IndexError {
    /// The index was constructed disabled and cannot be queried or snapshotted.
    #[error("{index} index disabled")]
    Disabled { index: &'static str },

    /// A snapshot handed to `restore` breaks the index's own invariants.
    #[error("invalid {index} snapshot: {reason}")]
    InvalidSnapshot { index: &'static str, reason: String },
}

/// Errors extracting data from a block's generation transaction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainDataError {
    #[error("generation transaction has no inputs")]
    NoInputs,

    #[error("first input of the generation transaction is a {found} input")]
    NotGeneration { found: &'static str },
}

/// Errors raised by the checkpoint authority.
#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("wrong hash in checkpoint for height {height}: {hash:?}")]
    InvalidHash { height: u32, hash: String },

    #[error("checkpoint already exists for height {height}")]
    Duplicate { height: u32 },

    #[error("invalid checkpoint height {value:?} on line {line}")]
    InvalidHeight { line: usize, value: String },

    #[error("invalid checkpoint file format on line {line}: expected 2 fields, found {fields}")]
    Format { line: usize, fields: usize },

    #[error("could not load checkpoints file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("checkpoint failed for height {height}: expected hash {expected}, fetched hash {actual}")]
    Mismatch {
        height: u32,
        expected: Hash,
        actual: Hash,
    },

    #[error("DNS checkpoint lookup for {domain} failed: {reason}")]
    Dns { domain: String, reason: String },
}

impl CheckpointError {
    /// Returns `true` if the error means a block contradicts a pinned hash.
    ///
    /// The chain core must reject such a block outright.
    pub fn is_consensus_failure(&self) -> bool {
        matches!(self, Self::Mismatch { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_error_names_index() {
        let err = IndexError::Disabled { index: "payment id" };
        assert_eq!(err.to_string(), "payment id index disabled");
    }

    #[test]
    fn only_mismatch_is_consensus_failure() {
        let mismatch = CheckpointError::Mismatch {
            height: 1,
            expected: Hash::ZERO,
            actual: Hash::new([1; 32]),
        };
        assert!(mismatch.is_consensus_failure());
        assert!(!CheckpointError::Duplicate { height: 1 }.is_consensus_failure());
    }
}
