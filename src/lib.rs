//! Rollup Sequencer Library
//!
//! Batch orchestration and state-commitment pipeline for an off-chain
//! rollup: transaction intake, batch formation, proof coordination, and
//! strictly ordered settlement of state roots.
//!
//! ## Modules
//!
//! - [`domain`] - Core domain types (transactions, batches, proofs)
//! - [`infra`] - Pipeline components and collaborator trait seams
//! - [`auth`] - Capability checks for privileged operations
//! - [`config`] - Explicit, injectable configuration
//! - [`crypto`] - Deterministic digests and commitment chaining
//! - [`telemetry`] - Structured logging setup

pub mod auth;
pub mod config;
pub mod crypto;
pub mod domain;
pub mod infra;
pub mod telemetry;

// Re-export commonly used types
pub use auth::{Capability, CapabilitySet};
pub use config::SequencerConfig;
pub use domain::{
    Batch, Proof, ProofPublicValues, SettlementReceipt, StateTransition, Transaction,
    TransactionLimits, VerificationKeyRefs,
};
pub use infra::{
    AdmissionOutcome, BatchFormer, GasPriceEstimator, IngestReceipt, ProofCoordinator, Prover,
    Result, Sequencer, SequencerError, SequencerStatus, SettlementLedger, StateCommitmentManager,
    TransactionPool,
};
