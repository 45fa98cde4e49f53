//! Chain-state change notifications.
//!
//! The chain core builds one [`BlockchainMessage`] per state change and hands
//! it to whatever delivery mechanism carries it to subscribers.

use serde::{Deserialize, Serialize};

use crate::types::Hash;

/// Which kind of change a [`BlockchainMessage`] describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageType {
    NewBlock,
    NewAlternativeBlock,
    ChainSwitch,
}

impl std::fmt::Display for MessageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NewBlock => write!(f, "new block"),
            Self::NewAlternativeBlock => write!(f, "new alternative block"),
            Self::ChainSwitch => write!(f, "chain switch"),
        }
    }
}

/// A chain-state change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockchainMessage {
    /// A block extended the main chain.
    NewBlock(Hash),
    /// A block was accepted onto an alternative chain.
    NewAlternativeBlock(Hash),
    /// The main chain switched; hashes run from the common root to the new tip.
    ChainSwitch(Vec<Hash>),
}

impl BlockchainMessage {
    pub fn message_type(&self) -> MessageType {
        match self {
            Self::NewBlock(_) => MessageType::NewBlock,
            Self::NewAlternativeBlock(_) => MessageType::NewAlternativeBlock,
            Self::ChainSwitch(_) => MessageType::ChainSwitch,
        }
    }

    /// The new main-chain block, if this is a [`NewBlock`](Self::NewBlock) message.
    pub fn new_block_hash(&self) -> Option<&Hash> {
        match self {
            Self::NewBlock(hash) => Some(hash),
            _ => None,
        }
    }

    pub fn new_alternative_block_hash(&self) -> Option<&Hash> {
        match self {
            Self::NewAlternativeBlock(hash) => Some(hash),
            _ => None,
        }
    }

    /// Blocks from the common root to the new tip, for a chain switch.
    pub fn chain_switch(&self) -> Option<&[Hash]> {
        match self {
            Self::ChainSwitch(hashes) => Some(hashes),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn probe(msg: &BlockchainMessage) -> (Option<Hash>, Option<Hash>, Option<Vec<Hash>>) {
        (
            msg.new_block_hash().copied(),
            msg.new_alternative_block_hash().copied(),
            msg.chain_switch().map(<[Hash]>::to_vec),
        )
    }

    #[test]
    fn only_matching_accessor_answers() {
        let a = Hash::new([1; 32]);
        let b = Hash::new([2; 32]);
        let switch = vec![a, b, Hash::new([3; 32])];

        let cases = [
            (BlockchainMessage::NewBlock(a), (Some(a), None, None)),
            (BlockchainMessage::NewAlternativeBlock(b), (None, Some(b), None)),
            (
                BlockchainMessage::ChainSwitch(switch.clone()),
                (None, None, Some(switch.clone())),
            ),
        ];

        for (msg, expected) in cases {
            let copy = msg.clone();
            assert_eq!(probe(&msg), expected);
            assert_eq!(probe(&copy), expected);
            assert_eq!(copy.message_type(), msg.message_type());
        }
    }

    #[test]
    fn empty_chain_switch_is_still_a_chain_switch() {
        let msg = BlockchainMessage::ChainSwitch(vec![]);
        assert_eq!(msg.message_type(), MessageType::ChainSwitch);
        assert_eq!(msg.chain_switch(), Some(&[][..]));
        assert_eq!(msg.new_block_hash(), None);
    }

    #[test]
    fn message_type_display() {
        assert_eq!(MessageType::ChainSwitch.to_string(), "chain switch");
    }
}
