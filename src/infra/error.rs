//! Error types for the rollup sequencer pipeline

use alloy_primitives::B256;
use thiserror::Error;

use crate::auth::Capability;

/// Errors that can occur in the sequencer pipeline
#[derive(Error, Debug)]
pub enum SequencerError {
    /// Transaction failed structural validation
    #[error("transaction validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// No transactions available to batch
    #[error("transaction pool is empty")]
    EmptyPool,

    /// Proof generation or verification failed
    #[error("prover error: {0}")]
    Prover(#[from] ProverError),

    /// Declared root does not match the expected chain state
    #[error(
        "invalid transition for batch {batch_index}: expected old root {expected}, declared {declared}"
    )]
    InvalidTransition {
        batch_index: u64,
        expected: B256,
        declared: B256,
    },

    /// Settlement ledger rejected the submission
    #[error("settlement error: {0}")]
    Settlement(#[from] SettlementError),

    /// Caller lacks a required capability
    #[error("missing capability: {0:?}")]
    Unauthorized(Capability),

    /// Configuration error
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Internal invariant violation
    #[error("internal error: {0}")]
    Internal(String),
}

/// Structural validation failures; the offending transaction is rejected
/// before queueing and all other state is left untouched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Sender is the zero address
    #[error("sender is the zero address")]
    ZeroSender,

    /// Gas limit below the configured minimum
    #[error("gas limit {gas_limit} below minimum {min}")]
    GasLimitTooLow { gas_limit: u64, min: u64 },

    /// Gas limit above the configured maximum
    #[error("gas limit {gas_limit} above maximum {max}")]
    GasLimitTooHigh { gas_limit: u64, max: u64 },

    /// Payload exceeds the configured size bound
    #[error("payload of {size} bytes exceeds maximum {max}")]
    PayloadTooLarge { size: usize, max: usize },
}

/// Prover collaborator failures. Not retried by this crate.
///
/// Clone so the proof coordinator can hand one failure to every caller
/// subscribed to a single-flight operation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProverError {
    /// Proof generation failed
    #[error("proof generation failed: {0}")]
    Generation(String),

    /// Proof verification failed to run
    #[error("proof verification failed: {0}")]
    Verification(String),

    /// Prover unreachable
    #[error("prover unavailable: {0}")]
    Unavailable(String),
}

/// Settlement ledger rejections. Surfaced to the caller, no automatic retry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SettlementError {
    /// The ledger's verifier rejected the proof
    #[error("ledger rejected proof: {0}")]
    InvalidProof(String),

    /// The declared old root no longer matches the on-chain root
    #[error("stale root: ledger expects {expected}, submission declared {declared}")]
    StaleRoot { expected: B256, declared: B256 },

    /// Batch index out of sequence on-chain
    #[error("wrong batch index: ledger expects {expected}, got {got}")]
    WrongIndex { expected: u64, got: u64 },

    /// The ledger is paused and not accepting submissions
    #[error("settlement ledger is paused")]
    Paused,

    /// Transport/RPC failure talking to the ledger
    #[error("ledger rpc error: {0}")]
    Rpc(String),
}

/// Result type for sequencer operations
pub type Result<T> = std::result::Result<T, SequencerError>;
