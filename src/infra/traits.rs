//! Trait seams for the external collaborators
//!
//! The proof system and the settlement ledger are opaque to this crate;
//! everything behind these traits is somebody else's problem, including
//! timeouts and retries.

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use alloy_primitives::B256;

use crate::domain::{
    Batch, Proof, ProofPublicValues, SettlementReceipt, StateTransition, VerificationKeyRefs,
};
use crate::infra::{ProverError, SequencerError, SettlementError};

/// External proof system.
///
/// `generate` is an opaque, possibly slow asynchronous operation; the proof
/// coordinator guarantees it is invoked at most once per batch index.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Prover: Send + Sync {
    /// Generate a validity proof for a batch's declared transition
    async fn generate(&self, batch: &Batch) -> Result<Proof, ProverError>;

    /// Verify proof bytes against public values
    async fn verify(
        &self,
        proof_bytes: &[u8],
        public_values: &ProofPublicValues,
    ) -> Result<bool, ProverError>;
}

/// External settlement ledger: the system of record for state commitments.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait SettlementLedger: Send + Sync {
    /// Current on-chain state root
    async fn current_root(&self) -> Result<B256, SettlementError>;

    /// Next batch index the ledger expects
    async fn current_batch_index(&self) -> Result<u64, SettlementError>;

    /// Submit one verified transition
    async fn submit_single(
        &self,
        proof_bytes: &[u8],
        transition: &StateTransition,
        vk_refs: &VerificationKeyRefs,
    ) -> Result<SettlementReceipt, SettlementError>;

    /// Submit a chained sequence of transitions as one aggregate
    async fn submit_aggregate(
        &self,
        proof_bytes: &[u8],
        transitions: &[StateTransition],
        vk_refs: &VerificationKeyRefs,
    ) -> Result<SettlementReceipt, SettlementError>;

    /// Whether the ledger is currently refusing submissions
    async fn is_paused(&self) -> Result<bool, SettlementError>;
}

/// Pluggable gas-price source feeding the congestion multiplier.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait GasPriceEstimator: Send + Sync {
    /// Estimate the current gas price
    async fn estimate_gas_price(&self) -> Result<u64, SequencerError>;
}

/// Fixed-price estimator; handy default when no fee market data exists.
#[derive(Debug, Clone)]
pub struct FixedGasPriceEstimator {
    price: u64,
}

impl FixedGasPriceEstimator {
    pub fn new(price: u64) -> Self {
        Self { price }
    }
}

#[async_trait]
impl GasPriceEstimator for FixedGasPriceEstimator {
    async fn estimate_gas_price(&self) -> Result<u64, SequencerError> {
        Ok(self.price)
    }
}
