//! Settlement-submission glue
//!
//! Translates verified transitions into calls against the external
//! settlement ledger. Rejections surface as typed [`SettlementError`]s;
//! there is no built-in retry.

use std::sync::Arc;

use tracing::info;

use crate::domain::{Proof, SettlementReceipt, StateTransition, VerificationKeyRefs};
use crate::infra::{SettlementError, SettlementLedger};

/// Thin client over the settlement ledger collaborator.
pub struct SettlementClient {
    ledger: Arc<dyn SettlementLedger>,
}

impl SettlementClient {
    pub fn new(ledger: Arc<dyn SettlementLedger>) -> Self {
        Self { ledger }
    }

    /// Direct access for root/index queries
    pub fn ledger(&self) -> &Arc<dyn SettlementLedger> {
        &self.ledger
    }

    /// Submit one transition to the ledger.
    pub async fn submit_single(
        &self,
        proof: &Proof,
        transition: &StateTransition,
        vk_refs: &VerificationKeyRefs,
    ) -> Result<SettlementReceipt, SettlementError> {
        self.ensure_accepting().await?;

        info!(
            batch_index = transition.batch_index,
            old_root = %transition.old_root,
            new_root = %transition.new_root,
            vk = %vk_refs.single,
            "submitting single transition"
        );

        let receipt = self
            .ledger
            .submit_single(&proof.proof_bytes, transition, vk_refs)
            .await?;

        info!(
            batch_index = transition.batch_index,
            tx_hash = %receipt.tx_hash,
            block = receipt.block_number,
            "transition settled"
        );
        Ok(receipt)
    }

    /// Submit a chained sequence of transitions as one aggregate.
    ///
    /// The member proofs' opaque bytes are concatenated into the aggregate
    /// proof payload; the ledger verifies them against the aggregate key.
    pub async fn submit_aggregate(
        &self,
        proofs: &[Proof],
        transitions: &[StateTransition],
        vk_refs: &VerificationKeyRefs,
    ) -> Result<SettlementReceipt, SettlementError> {
        self.ensure_accepting().await?;

        let aggregate_bytes: Vec<u8> = proofs
            .iter()
            .flat_map(|p| crate::crypto::encode_bytes(&p.proof_bytes))
            .collect();

        info!(
            transitions = transitions.len(),
            first_index = transitions.first().map(|t| t.batch_index),
            last_index = transitions.last().map(|t| t.batch_index),
            vk = %vk_refs.aggregate,
            "submitting aggregate"
        );

        let receipt = self
            .ledger
            .submit_aggregate(&aggregate_bytes, transitions, vk_refs)
            .await?;

        info!(
            transitions = transitions.len(),
            tx_hash = %receipt.tx_hash,
            block = receipt.block_number,
            "aggregate settled"
        );
        Ok(receipt)
    }

    async fn ensure_accepting(&self) -> Result<(), SettlementError> {
        if self.ledger.is_paused().await? {
            return Err(SettlementError::Paused);
        }
        Ok(())
    }
}
