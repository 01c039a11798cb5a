//! Validity-proof types and settlement-facing records

use alloy_primitives::{Bytes, B256};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Public values a proof commits to.
///
/// The commitment manager compares these byte-for-byte against the batch's
/// declared transition before anything is submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofPublicValues {
    /// State root before the batch
    pub old_state_root: B256,
    /// State root after the batch
    pub new_state_root: B256,
    /// Number of transactions covered by the proof
    pub transaction_count: u64,
    /// Content digests of the covered transactions, batch order
    pub transaction_digests: Vec<B256>,
}

/// A succinct validity proof for one batch's state transition.
///
/// Produced once per batch index by the external prover and cached by the
/// proof coordinator; the proof bytes are opaque to this crate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Proof {
    /// Unique proof identifier
    pub proof_id: Uuid,

    /// Batch index this proof covers
    pub batch_index: u64,

    /// Opaque proof bytes
    pub proof_bytes: Bytes,

    /// Public values the proof attests to
    pub public_values: ProofPublicValues,

    /// Size of the proof in bytes
    pub proof_size: u64,

    /// Time the prover took, in milliseconds
    pub proving_time_ms: u64,

    /// When the proof was generated
    pub generated_at: DateTime<Utc>,
}

impl Proof {
    pub fn new(
        batch_index: u64,
        proof_bytes: Bytes,
        public_values: ProofPublicValues,
        proving_time_ms: u64,
    ) -> Self {
        let proof_size = proof_bytes.len() as u64;
        Self {
            proof_id: Uuid::new_v4(),
            batch_index,
            proof_bytes,
            public_values,
            proof_size,
            proving_time_ms,
            generated_at: Utc::now(),
        }
    }
}

/// Opaque identifiers the settlement ledger uses to select verification
/// circuits/keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationKeyRefs {
    /// Key reference for single-batch submissions
    pub single: String,
    /// Key reference for aggregate submissions
    pub aggregate: String,
}

impl VerificationKeyRefs {
    pub fn new(single: impl Into<String>, aggregate: impl Into<String>) -> Self {
        Self {
            single: single.into(),
            aggregate: aggregate.into(),
        }
    }
}

/// Receipt returned by the settlement ledger after a successful submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementReceipt {
    /// Settlement-layer transaction hash
    pub tx_hash: B256,
    /// Block the submission landed in, if already known
    pub block_number: Option<u64>,
}
