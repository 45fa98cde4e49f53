//! Checkpoint authority — trusted `(height, hash)` pins.
//!
//! Checkpoints are loaded once at startup from a CSV file and optionally
//! topped up from DNS. A pinned height can never be overwritten: the first
//! hash recorded for a height wins, whatever its source.
//!
//! The chain core consults the table before accepting a block
//! ([`Checkpoints::check_block`]) and before building on an alternative
//! chain ([`Checkpoints::is_alternative_block_allowed`]).

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

use crate::config::CheckpointConfig;
use crate::csv;
use crate::dns::{self, TxtResolver};
use crate::error::CheckpointError;
use crate::types::Hash;

/// Outcome of [`Checkpoints::check_block`] for a block that is not rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckpointStatus {
    /// No checkpoint at this height.
    NotCheckpointed,
    /// The block matches the pinned hash.
    Passed,
}

impl CheckpointStatus {
    pub fn is_checkpoint(&self) -> bool {
        matches!(self, Self::Passed)
    }
}

/// A checkpoint table shared between the chain core and the DNS refresh task.
pub type SharedCheckpoints = Arc<RwLock<Checkpoints>>;

/// Ordered, append-only table of height → expected block hash.
///
/// Serializes as an ascending list of `(height, hash)` pairs; a list that
/// pins the same height twice is rejected on deserialization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "Vec<(u32, Hash)>", try_from = "Vec<(u32, Hash)>")]
pub struct Checkpoints {
    points: BTreeMap<u32, Hash>,
}

impl From<Checkpoints> for Vec<(u32, Hash)> {
    fn from(checkpoints: Checkpoints) -> Self {
        checkpoints.points.into_iter().collect()
    }
}

impl TryFrom<Vec<(u32, Hash)>> for Checkpoints {
    type Error = CheckpointError;

    fn try_from(points: Vec<(u32, Hash)>) -> Result<Self, Self::Error> {
        let mut checkpoints = Self::new();
        for (height, hash) in points {
            if checkpoints.points.insert(height, hash).is_some() {
                return Err(CheckpointError::Duplicate { height });
            }
        }
        Ok(checkpoints)
    }
}

impl Checkpoints {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from built-in `(height, hex hash)` pairs.
    pub fn with_checkpoints(points: &[(u32, &str)]) -> Result<Self, CheckpointError> {
        let mut checkpoints = Self::new();
        for (height, hash) in points {
            checkpoints.add_checkpoint(*height, hash)?;
        }
        Ok(checkpoints)
    }

    /// Build the startup table: the configured file first, then DNS.
    ///
    /// A file failure is returned to the caller; DNS is best-effort.
    pub async fn bootstrap(
        config: &CheckpointConfig,
        resolver: &dyn TxtResolver,
    ) -> Result<Self, CheckpointError> {
        let mut checkpoints = Self::new();
        if let Some(file) = &config.file {
            checkpoints.load_checkpoints_from_file(file)?;
        }
        if config.dns_enabled {
            checkpoints
                .load_checkpoints_from_dns(resolver, &config.dns_domain)
                .await;
        }
        Ok(checkpoints)
    }

    /// [`bootstrap`](Self::bootstrap), then start the periodic DNS refresh
    /// when DNS is enabled and `dns_refresh_interval_secs` is set.
    ///
    /// Dropping the returned handle leaves the task running; abort it to stop.
    pub async fn bootstrap_shared(
        config: &CheckpointConfig,
        resolver: Arc<dyn TxtResolver>,
    ) -> Result<(SharedCheckpoints, Option<JoinHandle<()>>), CheckpointError> {
        let checkpoints = Arc::new(RwLock::new(
            Self::bootstrap(config, resolver.as_ref()).await?,
        ));

        let refresh = match config.dns_refresh_interval() {
            Some(interval) if config.dns_enabled => {
                tracing::info!(
                    domain = %config.dns_domain,
                    interval_secs = interval.as_secs(),
                    "Starting DNS checkpoint refresh"
                );
                Some(dns::spawn_dns_refresh(
                    checkpoints.clone(),
                    resolver,
                    config.dns_domain.clone(),
                    interval,
                ))
            }
            _ => None,
        };
        Ok((checkpoints, refresh))
    }

    /// Pin `hash` at `height`.
    ///
    /// Rejects a hash that is not exactly 64 hex characters and a height that
    /// is already pinned.
    pub fn add_checkpoint(&mut self, height: u32, hash: &str) -> Result<(), CheckpointError> {
        let Some(parsed) = Hash::from_hex(hash) else {
            tracing::warn!(height, hash, "Wrong hash in checkpoint");
            return Err(CheckpointError::InvalidHash {
                height,
                hash: hash.to_string(),
            });
        };

        if self.points.contains_key(&height) {
            tracing::warn!(height, "Checkpoint already exists");
            return Err(CheckpointError::Duplicate { height });
        }

        self.points.insert(height, parsed);
        Ok(())
    }

    /// Load `height,hash` rows from a CSV file.
    ///
    /// The first bad row aborts the load. Rows before it stay applied.
    /// Returns the number of checkpoints added.
    pub fn load_checkpoints_from_file(
        &mut self,
        path: impl AsRef<Path>,
    ) -> Result<usize, CheckpointError> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path).map_err(|source| {
            tracing::error!(path = %path.display(), error = %source, "Could not load checkpoints file");
            CheckpointError::Io {
                path: path.display().to_string(),
                source,
            }
        })?;

        let mut count = 0;
        for (i, line) in csv::split_lines(&data).into_iter().enumerate() {
            let line_no = i + 1;
            let row = csv::split_fields(line);
            if row.len() != 2 {
                tracing::error!(line = line_no, fields = row.len(), "Invalid checkpoint file format");
                return Err(CheckpointError::Format {
                    line: line_no,
                    fields: row.len(),
                });
            }

            let height_field = csv::unquote(row[0]);
            let height: u32 = height_field.parse().map_err(|_| {
                tracing::error!(line = line_no, value = height_field, "Invalid checkpoint height");
                CheckpointError::InvalidHeight {
                    line: line_no,
                    value: height_field.to_string(),
                }
            })?;

            self.add_checkpoint(height, csv::unquote(row[1]))?;
            count += 1;
        }

        tracing::info!(count, path = %path.display(), "Loaded checkpoints from file");
        Ok(count)
    }

    /// Fetch checkpoints from `domain` TXT records and add the new ones.
    ///
    /// Best-effort: a failed lookup is logged and adds nothing, malformed
    /// records are skipped, and already-pinned heights are left untouched.
    /// Returns the number of checkpoints added.
    pub async fn load_checkpoints_from_dns(
        &mut self,
        resolver: &dyn TxtResolver,
        domain: &str,
    ) -> usize {
        match dns::fetch_checkpoint_records(resolver, domain).await {
            Ok(records) => self.merge_dns_records(records),
            Err(e) => {
                tracing::warn!(error = %e, domain, "Failed to lookup DNS checkpoint records");
                0
            }
        }
    }

    /// Add DNS-sourced checkpoints, never overwriting a pinned height.
    pub fn merge_dns_records(&mut self, records: Vec<(u32, Hash)>) -> usize {
        let mut added = 0;
        for (height, hash) in records {
            if self.points.contains_key(&height) {
                tracing::debug!(height, "Checkpoint already exists, ignoring DNS checkpoint");
                continue;
            }
            self.points.insert(height, hash);
            added += 1;
        }
        if added > 0 {
            tracing::info!(added, "Loaded checkpoints from DNS");
        }
        added
    }

    /// Returns `true` if `height` is at or below the highest checkpoint.
    pub fn is_in_checkpoint_zone(&self, height: u32) -> bool {
        self.max_height().is_some_and(|max| height <= max)
    }

    /// Check a block against the pin at its height.
    ///
    /// A mismatch is returned as [`CheckpointError::Mismatch`]; the block
    /// must be rejected.
    pub fn check_block(&self, height: u32, hash: &Hash) -> Result<CheckpointStatus, CheckpointError> {
        let Some(expected) = self.points.get(&height) else {
            return Ok(CheckpointStatus::NotCheckpointed);
        };

        if expected == hash {
            tracing::info!(height, %hash, "Checkpoint passed");
            Ok(CheckpointStatus::Passed)
        } else {
            tracing::error!(height, expected = %expected, fetched = %hash, "Checkpoint failed");
            Err(CheckpointError::Mismatch {
                height,
                expected: *expected,
                actual: *hash,
            })
        }
    }

    /// `true` unless `hash` contradicts the pin at `height`.
    pub fn is_block_valid(&self, height: u32, hash: &Hash) -> bool {
        self.check_block(height, hash).is_ok()
    }

    /// Whether an alternative block at `block_height` may be accepted while the
    /// main chain is at `blockchain_height`.
    ///
    /// An alternative block may never land at or below the last checkpoint the
    /// main chain has already passed. Height 0 is never allowed.
    pub fn is_alternative_block_allowed(&self, blockchain_height: u32, block_height: u32) -> bool {
        if block_height == 0 {
            return false;
        }

        match self.points.range(..=blockchain_height).next_back() {
            // Main chain is still before the first checkpoint.
            None => true,
            Some((checkpoint_height, _)) => *checkpoint_height < block_height,
        }
    }

    /// Pinned heights in ascending order.
    pub fn checkpoint_heights(&self) -> Vec<u32> {
        self.points.keys().copied().collect()
    }

    pub fn get(&self, height: u32) -> Option<&Hash> {
        self.points.get(&height)
    }

    pub fn max_height(&self) -> Option<u32> {
        self.points.keys().next_back().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &Hash)> {
        self.points.iter().map(|(h, hash)| (*h, hash))
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
