//! Chain data consumed by the indices and the checkpoint authority.
//!
//! These are the minimal shapes the auxiliary subsystem needs from the chain
//! core. Consensus validation and hashing live elsewhere; a [`Hash`] is
//! always supplied by the caller, never computed here.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ChainDataError;

// ─── Hash ─────────────────────────────────────────────────────────────────────

/// Size of a [`Hash`] in bytes.
pub const HASH_SIZE: usize = 32;

/// A 32-byte block, transaction, or payment-id hash.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Hash([u8; HASH_SIZE]);

impl Hash {
    pub const ZERO: Self = Self([0u8; HASH_SIZE]);

    pub fn new(bytes: [u8; HASH_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; HASH_SIZE] {
        &self.0
    }

    /// Parse a hash from exactly 64 hex characters.
    pub fn from_hex(s: &str) -> Option<Self> {
        let mut bytes = [0u8; HASH_SIZE];
        hex::decode_to_slice(s, &mut bytes).ok()?;
        Some(Self(bytes))
    }

    fn from_slice(slice: &[u8]) -> Option<Self> {
        let bytes: [u8; HASH_SIZE] = slice.try_into().ok()?;
        Some(Self(bytes))
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash({})", hex::encode(&self.0[..4]))
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

/// Error returned when a string is not 64 hex characters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid hash: expected 64 hex characters")]
pub struct ParseHashError;

impl FromStr for Hash {
    type Err = ParseHashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s).ok_or(ParseHashError)
    }
}

impl Serialize for Hash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Hash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// ─── Transaction inputs ───────────────────────────────────────────────────────

/// One input of a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionInput {
    /// Coinbase input; records the height of the block that contains it.
    Generation { height: u32 },
    /// Spend of a previous output, identified by its key image.
    Key { amount: u64, key_image: Hash },
    /// Spend of a multisignature output.
    Multisignature {
        amount: u64,
        signatures: u8,
        output_index: u32,
    },
}

impl TransactionInput {
    /// Returns the block height if this is a generation input.
    pub fn generation_height(&self) -> Option<u32> {
        match self {
            Self::Generation { height } => Some(*height),
            _ => None,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::Generation { .. } => "generation",
            Self::Key { .. } => "key",
            Self::Multisignature { .. } => "multisignature",
        }
    }
}

// ─── Transaction ──────────────────────────────────────────────────────────────

const TX_EXTRA_PADDING: u8 = 0x00;
const TX_EXTRA_PUBKEY: u8 = 0x01;
const TX_EXTRA_NONCE: u8 = 0x02;
const TX_EXTRA_MERGE_MINING: u8 = 0x03;
const TX_EXTRA_NONCE_PAYMENT_ID: u8 = 0x00;
const MAX_EXTRA_FIELD_SIZE: u64 = 255;

/// A transaction as seen by the indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    /// Transaction hash, computed by the chain core.
    pub hash: Hash,
    pub inputs: Vec<TransactionInput>,
    /// Raw `extra` field: a tagged sequence of public key, nonce, and padding.
    pub extra: Vec<u8>,
}

impl Transaction {
    /// Extract the payment id carried in the first `extra` nonce, if any.
    ///
    /// The whole field list must parse; malformed `extra` data yields `None`,
    /// the same as a missing id. Only the first nonce is consulted.
    pub fn payment_id(&self) -> Option<Hash> {
        let mut first_nonce: Option<&[u8]> = None;
        let mut rest = self.extra.as_slice();
        while let Some((&tag, tail)) = rest.split_first() {
            rest = tail;
            match tag {
                TX_EXTRA_PADDING => {
                    // Padding runs to the end and must be all zeros.
                    if rest.len() >= MAX_EXTRA_FIELD_SIZE as usize || rest.iter().any(|b| *b != 0) {
                        return None;
                    }
                    break;
                }
                TX_EXTRA_PUBKEY => {
                    rest = rest.get(HASH_SIZE..)?;
                }
                TX_EXTRA_NONCE => {
                    let (nonce, tail) = read_sized_field(rest)?;
                    first_nonce.get_or_insert(nonce);
                    rest = tail;
                }
                TX_EXTRA_MERGE_MINING => {
                    let (_, tail) = read_sized_field(rest)?;
                    rest = tail;
                }
                _ => return None,
            }
        }

        match first_nonce? {
            [TX_EXTRA_NONCE_PAYMENT_ID, id @ ..] => Hash::from_slice(id),
            _ => None,
        }
    }
}

/// Read a varint length prefix followed by that many bytes.
fn read_sized_field(data: &[u8]) -> Option<(&[u8], &[u8])> {
    let mut len: u64 = 0;
    let mut consumed = 0;
    for (i, byte) in data.iter().enumerate().take(9) {
        len |= u64::from(byte & 0x7f) << (7 * i);
        consumed = i + 1;
        if byte & 0x80 == 0 {
            break;
        }
    }
    if consumed == 0 || data[consumed - 1] & 0x80 != 0 || len > MAX_EXTRA_FIELD_SIZE {
        return None;
    }
    let body = data.get(consumed..)?;
    let len = len as usize;
    if body.len() < len {
        return None;
    }
    Some(body.split_at(len))
}

// ─── Block ────────────────────────────────────────────────────────────────────

/// A block as seen by the indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    /// Block hash, computed by the chain core.
    pub hash: Hash,
    /// Unix timestamp of the block (seconds since epoch).
    pub timestamp: u64,
    /// The generation (coinbase) transaction.
    pub base_transaction: Transaction,
    /// Hashes of the regular transactions included in the block.
    pub transaction_hashes: Vec<Hash>,
}

impl Block {
    /// Read the block height from the generation transaction's first input.
    pub fn generation_height(&self) -> Result<u32, ChainDataError> {
        let input = self
            .base_transaction
            .inputs
            .first()
            .ok_or(ChainDataError::NoInputs)?;
        input
            .generation_height()
            .ok_or(ChainDataError::NotGeneration { found: input.kind() })
    }
}

// ─── Seams ────────────────────────────────────────────────────────────────────

/// Anything the payment-id index can read a `(payment id, hash)` pair from.
pub trait PaymentIdSource {
    fn hash(&self) -> Hash;
    fn payment_id(&self) -> Option<Hash>;
}

impl PaymentIdSource for Transaction {
    fn hash(&self) -> Hash {
        self.hash
    }

    fn payment_id(&self) -> Option<Hash> {
        Transaction::payment_id(self)
    }
}

/// Anything the height-keyed indices can read a block's position from.
pub trait GenerationBlock {
    fn hash(&self) -> Hash;
    fn generation_height(&self) -> Result<u32, ChainDataError>;
    /// Number of regular (non-generation) transactions in the block.
    fn transaction_count(&self) -> usize;
}

impl GenerationBlock for Block {
    fn hash(&self) -> Hash {
        self.hash
    }

    fn generation_height(&self) -> Result<u32, ChainDataError> {
        Block::generation_height(self)
    }

    fn transaction_count(&self) -> usize {
        self.transaction_hashes.len()
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn tx_with_extra(extra: Vec<u8>) -> Transaction {
        Transaction {
            hash: Hash::new([9; 32]),
            inputs: vec![],
            extra,
        }
    }

    fn payment_nonce(id: [u8; 32]) -> Vec<u8> {
        let mut extra = vec![TX_EXTRA_NONCE, 33, TX_EXTRA_NONCE_PAYMENT_ID];
        extra.extend_from_slice(&id);
        extra
    }

    #[test]
    fn hash_hex_roundtrip() {
        let s = "a1".repeat(32);
        let hash: Hash = s.parse().unwrap();
        assert_eq!(hash.to_string(), s);
    }

    #[test]
    fn hash_rejects_wrong_length_and_non_hex() {
        assert!(Hash::from_hex(&"a".repeat(63)).is_none());
        assert!(Hash::from_hex(&"a".repeat(66)).is_none());
        assert!(Hash::from_hex(&"zz".repeat(32)).is_none());
    }

    #[test]
    fn hash_serializes_as_hex_string() {
        let hash = Hash::new([0xab; 32]);
        let json = serde_json::to_string(&hash).unwrap();
        assert_eq!(json, format!("\"{}\"", "ab".repeat(32)));
        let back: Hash = serde_json::from_str(&json).unwrap();
        assert_eq!(back, hash);
    }

    #[test]
    fn payment_id_after_public_key() {
        let mut extra = vec![TX_EXTRA_PUBKEY];
        extra.extend_from_slice(&[7; 32]);
        extra.extend(payment_nonce([5; 32]));
        assert_eq!(tx_with_extra(extra).payment_id(), Some(Hash::new([5; 32])));
    }

    #[test]
    fn no_payment_id_in_plain_nonce() {
        let extra = vec![TX_EXTRA_NONCE, 4, 1, 2, 3, 4];
        assert_eq!(tx_with_extra(extra).payment_id(), None);
    }

    #[test]
    fn truncated_extra_has_no_payment_id() {
        let mut extra = payment_nonce([5; 32]);
        extra.truncate(20);
        assert_eq!(tx_with_extra(extra).payment_id(), None);
        assert_eq!(tx_with_extra(vec![TX_EXTRA_PUBKEY, 1, 2]).payment_id(), None);
    }

    #[test]
    fn only_the_first_nonce_is_consulted() {
        let mut extra = vec![TX_EXTRA_NONCE, 2, 1, 2];
        extra.extend(payment_nonce([5; 32]));
        assert_eq!(tx_with_extra(extra).payment_id(), None);
    }

    #[test]
    fn malformed_trailing_field_voids_payment_id() {
        let mut extra = payment_nonce([5; 32]);
        extra.extend_from_slice(&[TX_EXTRA_PUBKEY, 1, 2]);
        assert_eq!(tx_with_extra(extra).payment_id(), None);

        let mut extra = payment_nonce([5; 32]);
        extra.push(0x7f);
        assert_eq!(tx_with_extra(extra).payment_id(), None);
    }

    #[test]
    fn zero_padding_after_payment_id() {
        let mut extra = payment_nonce([5; 32]);
        extra.extend_from_slice(&[TX_EXTRA_PADDING, 0, 0, 0]);
        assert_eq!(tx_with_extra(extra).payment_id(), Some(Hash::new([5; 32])));

        let mut extra = payment_nonce([5; 32]);
        extra.extend_from_slice(&[TX_EXTRA_PADDING, 0, 1]);
        assert_eq!(tx_with_extra(extra).payment_id(), None);
    }

    #[test]
    fn generation_height_is_checked() {
        let mut block = Block {
            hash: Hash::ZERO,
            timestamp: 0,
            base_transaction: Transaction {
                hash: Hash::ZERO,
                inputs: vec![TransactionInput::Generation { height: 42 }],
                extra: vec![],
            },
            transaction_hashes: vec![],
        };
        assert_eq!(block.generation_height(), Ok(42));

        block.base_transaction.inputs = vec![TransactionInput::Key {
            amount: 1,
            key_image: Hash::ZERO,
        }];
        assert_eq!(
            block.generation_height(),
            Err(ChainDataError::NotGeneration { found: "key" })
        );

        block.base_transaction.inputs.clear();
        assert_eq!(block.generation_height(), Err(ChainDataError::NoInputs));
    }
}
