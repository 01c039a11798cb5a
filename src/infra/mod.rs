//! Infrastructure layer for the rollup sequencer
//!
//! Contains trait seams for the external collaborators and the pipeline
//! components:
//! - Transaction pool (validation, dedup, ordered drain)
//! - Batch former (congestion-aware sizing, fee priority)
//! - Proof coordinator (single-flight, bounded caching)
//! - State-commitment manager (root history, chaining protocol)
//! - Settlement client (submission glue)
//! - Sequencing loop (periodic driver, single-flight cycles)

mod batcher;
mod cache;
mod commitments;
mod error;
mod pool;
mod proofs;
mod settlement;
mod traits;
mod worker;

pub use batcher::BatchFormer;
pub use cache::{CacheStats, LruCache, ProofCache, ProofCacheKey};
pub use commitments::StateCommitmentManager;
pub use error::*;
pub use pool::{AdmissionOutcome, IngestReceipt, TransactionPool};
pub use proofs::ProofCoordinator;
pub use settlement::SettlementClient;
pub use traits::{FixedGasPriceEstimator, GasPriceEstimator, Prover, SettlementLedger};
pub use worker::{Sequencer, SequencerStatus};

#[cfg(test)]
pub use traits::{MockGasPriceEstimator, MockProver, MockSettlementLedger};
