//! Transaction handles and confirmation receipts

use primitive_types::U256;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 32-byte hash
pub type Hash = [u8; 32];

/// Opaque handle returned by a successful publication.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TxHash(pub Hash);

impl TxHash {
    pub fn as_bytes(&self) -> &Hash {
        &self.0
    }
}

impl From<Hash> for TxHash {
    fn from(bytes: Hash) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TxHash({})", self)
    }
}

/// Backend-issued proof that a transaction was included.
///
/// The tx manager never inspects these fields; it forwards the first receipt
/// it observes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionReceipt {
    /// Hash of the included transaction
    pub tx_hash: TxHash,
    /// Block that included it
    pub block_hash: Hash,
    /// Height of that block
    pub block_number: u64,
    /// Gas consumed by execution
    pub gas_used: u64,
    /// Fee the transaction was published at
    pub effective_fee: U256,
    /// Whether execution succeeded
    pub success: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tx_hash_display_is_prefixed_hex() {
        let mut bytes = [0u8; 32];
        bytes[0] = 0xab;
        bytes[31] = 0x01;
        let shown = TxHash(bytes).to_string();
        assert!(shown.starts_with("0xab00"));
        assert!(shown.ends_with("01"));
        assert_eq!(shown.len(), 66);
    }
}
