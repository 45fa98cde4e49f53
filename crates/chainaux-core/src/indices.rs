//! The full set of auxiliary indices owned by the chain core.

use crate::config::IndicesConfig;
use crate::generated_index::GeneratedTransactionsIndex;
use crate::orphan_index::OrphanBlocksIndex;
use crate::payment_index::PaymentIdIndex;
use crate::timestamp_index::{TimestampBlocksIndex, TimestampTransactionsIndex};

/// All five auxiliary indices, each enabled per [`IndicesConfig`].
///
/// The indices are independent; callers mutate them individually as blocks
/// and transactions are applied or rolled back.
#[derive(Debug, Clone)]
pub struct ChainIndices {
    pub payment_id: PaymentIdIndex,
    pub timestamp_blocks: TimestampBlocksIndex,
    pub timestamp_transactions: TimestampTransactionsIndex,
    pub generated_transactions: GeneratedTransactionsIndex,
    pub orphan_blocks: OrphanBlocksIndex,
}

impl ChainIndices {
    pub fn new(config: &IndicesConfig) -> Self {
        tracing::info!(
            payment_id = config.payment_id,
            timestamp_blocks = config.timestamp_blocks,
            timestamp_transactions = config.timestamp_transactions,
            generated_transactions = config.generated_transactions,
            orphan_blocks = config.orphan_blocks,
            "Initialising chain indices"
        );
        Self {
            payment_id: PaymentIdIndex::new(config.payment_id),
            timestamp_blocks: TimestampBlocksIndex::new(config.timestamp_blocks),
            timestamp_transactions: TimestampTransactionsIndex::new(config.timestamp_transactions),
            generated_transactions: GeneratedTransactionsIndex::new(config.generated_transactions),
            orphan_blocks: OrphanBlocksIndex::new(config.orphan_blocks),
        }
    }

    /// Empty every enabled index (used when the chain state is rebuilt).
    pub fn clear(&mut self) {
        self.payment_id.clear();
        self.timestamp_blocks.clear();
        self.timestamp_transactions.clear();
        self.generated_transactions.clear();
        self.orphan_blocks.clear();
    }
}

impl Default for ChainIndices {
    fn default() -> Self {
        Self::new(&IndicesConfig::default())
    }
}
