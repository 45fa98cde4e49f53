//! DNS checkpoint source.
//!
//! Checkpoints are published as TXT records of the form
//! `"<decimal height>:<64 hex chars>"`. Lookups go through the
//! [`TxtResolver`] trait so the refresh logic can run without a network.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use hickory_resolver::config::{ResolverConfig, ResolverOpts};
use hickory_resolver::TokioAsyncResolver;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

use crate::checkpoint::Checkpoints;
use crate::error::CheckpointError;
use crate::types::{Hash, HASH_SIZE};

/// Looks up the TXT records of a domain.
#[async_trait]
pub trait TxtResolver: Send + Sync {
    /// Return every TXT record of `domain` as a string.
    async fn lookup_txt(&self, domain: &str) -> Result<Vec<String>, CheckpointError>;
}

/// [`TxtResolver`] backed by `hickory-resolver` with the default upstream config.
pub struct HickoryTxtResolver {
    resolver: TokioAsyncResolver,
}

impl HickoryTxtResolver {
    pub fn new() -> Self {
        Self {
            resolver: TokioAsyncResolver::tokio(ResolverConfig::default(), ResolverOpts::default()),
        }
    }
}

impl Default for HickoryTxtResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TxtResolver for HickoryTxtResolver {
    async fn lookup_txt(&self, domain: &str) -> Result<Vec<String>, CheckpointError> {
        tracing::debug!(domain, "Performing DNS TXT lookup");
        let lookup = self
            .resolver
            .txt_lookup(domain)
            .await
            .map_err(|e| CheckpointError::Dns {
                domain: domain.to_string(),
                reason: e.to_string(),
            })?;

        let records: Vec<String> = lookup
            .iter()
            .map(|txt| {
                txt.txt_data()
                    .iter()
                    .map(|chunk| String::from_utf8_lossy(chunk))
                    .collect()
            })
            .collect();
        tracing::debug!(count = records.len(), domain, "DNS TXT lookup returned records");
        Ok(records)
    }
}

/// Parse one `"<height>:<hash>"` record.
///
/// Only the first 64 characters after the colon are read as the hash.
pub fn parse_dns_record(record: &str) -> Option<(u32, Hash)> {
    let (height, rest) = record.split_once(':')?;
    let height: u32 = height.parse().ok()?;
    let hash = Hash::from_hex(rest.get(..HASH_SIZE * 2)?)?;
    Some((height, hash))
}

/// Look up `domain` and parse every well-formed checkpoint record.
///
/// Malformed records are logged and skipped; only a failed lookup is an error.
pub async fn fetch_checkpoint_records(
    resolver: &dyn TxtResolver,
    domain: &str,
) -> Result<Vec<(u32, Hash)>, CheckpointError> {
    let records = resolver.lookup_txt(domain).await?;
    Ok(records
        .iter()
        .filter_map(|record| {
            let parsed = parse_dns_record(record);
            if parsed.is_none() {
                tracing::info!(record = %record, "Failed to parse DNS checkpoint record");
            }
            parsed
        })
        .collect())
}

/// Periodically merge DNS checkpoints into a shared table.
///
/// The lookup runs without holding the lock; the write lock is only taken to
/// merge parsed records. The first refresh happens one `interval` after the
/// call, since the startup load is expected to have run already.
pub fn spawn_dns_refresh(
    checkpoints: Arc<RwLock<Checkpoints>>,
    resolver: Arc<dyn TxtResolver>,
    domain: String,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);
        loop {
            ticker.tick().await;
            match fetch_checkpoint_records(resolver.as_ref(), &domain).await {
                Ok(records) => {
                    let added = checkpoints.write().await.merge_dns_records(records);
                    tracing::debug!(added, domain = %domain, "DNS checkpoint refresh finished");
                }
                Err(e) => {
                    tracing::info!(error = %e, domain = %domain, "DNS checkpoint refresh failed");
                }
            }
        }
    })
}
