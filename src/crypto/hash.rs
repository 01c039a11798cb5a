//! Domain-separated hashing for transactions, batches, and state roots
//!
//! All digests are SHA-256 over a canonical binary encoding:
//! - fixed-width fields in big-endian byte order
//! - variable-length byte strings length-prefixed with a big-endian u32
//! - every hash input starts with a domain prefix so a transaction digest
//!   can never collide with a state root or a set digest
//!
//! The encoding is deliberately self-contained (no serde involvement) so the
//! digest of a transaction is reproducible across implementations.

use alloy_primitives::B256;
use sha2::{Digest, Sha256};

use crate::domain::Transaction;

// ============================================================================
// Domain Separation Constants
// ============================================================================

/// Domain prefix for transaction content digests
pub const DOMAIN_TRANSACTION: &[u8] = b"ROLLUP_TX_V1";

/// Domain prefix for transaction-set digests (batch identity)
pub const DOMAIN_TRANSACTION_SET: &[u8] = b"ROLLUP_TXSET_V1";

/// Domain prefix for commitment-chain state roots
pub const DOMAIN_STATE_ROOT: &[u8] = b"ROLLUP_STATE_ROOT_V1";

// ============================================================================
// Binary Encoding Helpers
// ============================================================================

/// Encode a u64 as 8 bytes big-endian
#[inline]
pub fn u64_be(n: u64) -> [u8; 8] {
    n.to_be_bytes()
}

/// Encode a byte string as length-prefixed bytes
/// Format: U32_BE(len) || bytes
pub fn encode_bytes(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(4 + bytes.len());
    out.extend_from_slice(&(bytes.len() as u32).to_be_bytes());
    out.extend_from_slice(bytes);
    out
}

// ============================================================================
// Digests
// ============================================================================

/// Compute the content digest of a transaction.
///
/// tx_digest = SHA256(DOMAIN_TRANSACTION || from || to || value_be(32)
///                    || LP(payload) || U64_BE(nonce) || U64_BE(gas_limit)
///                    || U64_BE(gas_price))
///
/// Two transactions with identical field tuples always produce the same
/// digest; the pool relies on this for idempotent ingestion.
pub fn transaction_digest(tx: &Transaction) -> B256 {
    let mut hasher = Sha256::new();
    hasher.update(DOMAIN_TRANSACTION);
    hasher.update(tx.from.as_slice());
    hasher.update(tx.to.as_slice());
    hasher.update(tx.value.to_be_bytes::<32>());
    hasher.update(encode_bytes(&tx.payload));
    hasher.update(u64_be(tx.nonce));
    hasher.update(u64_be(tx.gas_limit));
    hasher.update(u64_be(tx.gas_price));
    B256::from_slice(&hasher.finalize())
}

/// Compute the digest of an ordered transaction-digest list.
///
/// txset_digest = SHA256(DOMAIN_TRANSACTION_SET || U64_BE(count) || d0 || d1 ...)
///
/// Order-sensitive: the same digests in a different order identify a
/// different batch.
pub fn transaction_set_digest(digests: &[B256]) -> B256 {
    let mut hasher = Sha256::new();
    hasher.update(DOMAIN_TRANSACTION_SET);
    hasher.update(u64_be(digests.len() as u64));
    for digest in digests {
        hasher.update(digest.as_slice());
    }
    B256::from_slice(&hasher.finalize())
}

/// Compute the declared post-batch state root for the commitment chain.
///
/// new_root = SHA256(DOMAIN_STATE_ROOT || prev_root || txset_digest
///                   || U64_BE(batch_index))
///
/// The prover attests this exact chaining; the commitment manager rejects
/// any proof whose public values disagree with it.
pub fn chain_state_root(prev_root: &B256, txset_digest: &B256, batch_index: u64) -> B256 {
    let mut hasher = Sha256::new();
    hasher.update(DOMAIN_STATE_ROOT);
    hasher.update(prev_root.as_slice());
    hasher.update(txset_digest.as_slice());
    hasher.update(u64_be(batch_index));
    B256::from_slice(&hasher.finalize())
}
