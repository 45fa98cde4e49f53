//! chainaux-core — auxiliary indices, chain-state events, and checkpoints
//! for a full node's blockchain core.
//!
//! # Architecture
//!
//! ```text
//! chain core ──add/remove──▶ ChainIndices
//!                              ├── PaymentIdIndex              (payment id → tx hashes)
//!                              ├── TimestampBlocksIndex        (timestamp → block hashes)
//!                              ├── TimestampTransactionsIndex  (timestamp → tx hashes)
//!                              ├── GeneratedTransactionsIndex  (height → cumulative tx count)
//!                              └── OrphanBlocksIndex           (height → orphaned block hashes)
//!            ──check────────▶ Checkpoints  (file + DNS, append-only trust table)
//!            ──emit─────────▶ BlockchainMessage  (new block / alternative block / chain switch)
//! ```
//!
//! Nothing here locks internally: the chain core owns all state and
//! serializes mutations.

pub mod checkpoint;
pub mod config;
pub mod csv;
pub mod dns;
pub mod error;
pub mod generated_index;
pub mod indices;
pub mod message;
mod optional;
pub mod orphan_index;
pub mod payment_index;
pub mod timestamp_index;
pub mod types;

pub use checkpoint::{CheckpointStatus, Checkpoints, SharedCheckpoints};
pub use config::{CheckpointConfig, IndicesConfig, DEFAULT_CHECKPOINT_DNS_DOMAIN};
pub use dns::{HickoryTxtResolver, TxtResolver};
pub use error::{ChainDataError, CheckpointError, IndexError};
pub use generated_index::GeneratedTransactionsIndex;
pub use indices::ChainIndices;
pub use message::{BlockchainMessage, MessageType};
pub use orphan_index::OrphanBlocksIndex;
pub use payment_index::PaymentIdIndex;
pub use timestamp_index::{TimestampBlocksIndex, TimestampRange, TimestampTransactionsIndex};
pub use types::{Block, Hash, Transaction, TransactionInput};
