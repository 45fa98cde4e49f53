//! Configuration for the auxiliary indices and the checkpoint authority.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Domain queried for DNS checkpoint TXT records.
pub const DEFAULT_CHECKPOINT_DNS_DOMAIN: &str = "checkpoints.nur1labs.org";

/// Which auxiliary indices the node maintains.
///
/// Each flag is fixed for the lifetime of the index it controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicesConfig {
    pub payment_id: bool,
    pub timestamp_blocks: bool,
    pub timestamp_transactions: bool,
    pub generated_transactions: bool,
    pub orphan_blocks: bool,
}

impl Default for IndicesConfig {
    fn default() -> Self {
        Self {
            payment_id: true,
            timestamp_blocks: true,
            timestamp_transactions: true,
            generated_transactions: true,
            orphan_blocks: true,
        }
    }
}

impl IndicesConfig {
    /// All indices switched off.
    pub fn disabled() -> Self {
        Self {
            payment_id: false,
            timestamp_blocks: false,
            timestamp_transactions: false,
            generated_transactions: false,
            orphan_blocks: false,
        }
    }
}

/// Where checkpoints come from at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckpointConfig {
    /// Optional CSV file of `height,hash` rows. A load failure is fatal.
    pub file: Option<PathBuf>,
    /// Query DNS for additional checkpoints (best-effort).
    pub dns_enabled: bool,
    /// Domain holding the checkpoint TXT records.
    pub dns_domain: String,
    /// Re-query DNS every N seconds after startup. `None` or `0` = startup only.
    ///
    /// Honoured by [`Checkpoints::bootstrap_shared`](crate::Checkpoints::bootstrap_shared).
    pub dns_refresh_interval_secs: Option<u64>,
}

impl Default for CheckpointConfig {
    fn default() -> Self {
        Self {
            file: None,
            dns_enabled: false,
            dns_domain: DEFAULT_CHECKPOINT_DNS_DOMAIN.into(),
            dns_refresh_interval_secs: None,
        }
    }
}

impl CheckpointConfig {
    pub fn dns_refresh_interval(&self) -> Option<Duration> {
        self.dns_refresh_interval_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let cfg: IndicesConfig = serde_json::from_str(r#"{"payment_id": false}"#).unwrap();
        assert!(!cfg.payment_id);
        assert!(cfg.orphan_blocks);

        let cp: CheckpointConfig = serde_json::from_str(r#"{"dns_enabled": true}"#).unwrap();
        assert!(cp.dns_enabled);
        assert_eq!(cp.dns_domain, DEFAULT_CHECKPOINT_DNS_DOMAIN);
        assert_eq!(cp.dns_refresh_interval(), None);
    }

    #[test]
    fn zero_refresh_interval_means_startup_only() {
        let cp = CheckpointConfig {
            dns_refresh_interval_secs: Some(0),
            ..Default::default()
        };
        assert_eq!(cp.dns_refresh_interval(), None);
    }
}
