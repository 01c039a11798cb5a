//! Batch and state-transition types

use alloy_primitives::B256;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Transaction;

/// An ordered group of transactions assigned one sequential index and one
/// declared state transition.
///
/// Created by the batch former; finalized only after successful settlement
/// submission and never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Batch {
    /// Monotonically increasing batch index
    pub index: u64,

    /// Transactions in fee-priority order
    pub transactions: Vec<Transaction>,

    /// Declared state root before this batch
    pub prev_state_root: B256,

    /// Declared state root after this batch
    pub new_state_root: B256,

    /// Content digests of the included transactions, same order
    pub transaction_digests: Vec<B256>,

    /// When this batch was formed
    pub created_at: DateTime<Utc>,

    /// Set once the settlement ledger has accepted the batch
    pub finalized: bool,
}

impl Batch {
    /// Build a batch, computing digests and the declared chained state root.
    pub fn new(index: u64, transactions: Vec<Transaction>, prev_state_root: B256) -> Self {
        let transaction_digests: Vec<B256> = transactions.iter().map(|tx| tx.digest()).collect();
        let txset_digest = crate::crypto::transaction_set_digest(&transaction_digests);
        let new_state_root = crate::crypto::chain_state_root(&prev_state_root, &txset_digest, index);

        Self {
            index,
            transactions,
            prev_state_root,
            new_state_root,
            transaction_digests,
            created_at: Utc::now(),
            finalized: false,
        }
    }

    /// Number of included transactions
    pub fn transaction_count(&self) -> usize {
        self.transactions.len()
    }

    /// Digest identifying the exact transaction set of this batch
    pub fn transaction_set_digest(&self) -> B256 {
        crate::crypto::transaction_set_digest(&self.transaction_digests)
    }

    /// The state transition this batch declares
    pub fn transition(&self) -> StateTransition {
        StateTransition {
            batch_index: self.index,
            old_root: self.prev_state_root,
            new_root: self.new_state_root,
        }
    }
}

/// A single root transition submitted to the settlement ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateTransition {
    /// Batch index this transition belongs to
    pub batch_index: u64,
    /// Root before the batch
    pub old_root: B256,
    /// Root after the batch
    pub new_root: B256,
}
