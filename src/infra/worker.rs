//! Sequencing loop
//!
//! Drives the pipeline end-to-end: drain-eligibility check, batch
//! formation, proof coordination, transition verification, settlement
//! submission. One cycle at a time; a timer tick that fires while a cycle
//! is still running is skipped outright, never queued.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::B256;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::auth::{Capability, CapabilitySet};
use crate::config::SequencerConfig;
use crate::domain::{Batch, Proof, Transaction, VerificationKeyRefs};
use crate::infra::{
    AdmissionOutcome, BatchFormer, GasPriceEstimator, IngestReceipt, ProofCache, ProofCoordinator,
    Prover, Result, SequencerError, SettlementLedger, StateCommitmentManager, TransactionPool,
};

/// Snapshot of the sequencer's externally visible state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SequencerStatus {
    pub running: bool,
    pub pending_transactions: usize,
    pub last_batch_timestamp: Option<DateTime<Utc>>,
    pub total_batches: u64,
}

struct LoopHandle {
    task: JoinHandle<()>,
    shutdown: watch::Sender<bool>,
}

/// The control loop tying pool, batch former, proof coordinator, and
/// commitment manager together.
///
/// State machine: Stopped -> `start` -> Running -> `stop` -> Stopped.
/// Counters survive stop/start within the lifetime of one instance.
pub struct Sequencer {
    config: SequencerConfig,
    capabilities: CapabilitySet,
    pool: Arc<TransactionPool>,
    batcher: Arc<BatchFormer>,
    coordinator: Arc<ProofCoordinator>,
    commitments: Arc<StateCommitmentManager>,
    /// At most one cycle in flight; ticks try-lock and skip, force waits
    cycle_guard: Mutex<()>,
    running: AtomicBool,
    total_batches: AtomicU64,
    last_batch_at: std::sync::Mutex<Option<DateTime<Utc>>>,
    loop_handle: std::sync::Mutex<Option<LoopHandle>>,
}

impl Sequencer {
    /// Wire up the pipeline against its external collaborators.
    ///
    /// The batch index counter is seeded with the index the ledger reports;
    /// an unreachable ledger falls back to zero (and the genesis root).
    pub async fn new(
        config: SequencerConfig,
        capabilities: CapabilitySet,
        prover: Arc<dyn Prover>,
        ledger: Arc<dyn SettlementLedger>,
        estimator: Arc<dyn GasPriceEstimator>,
        genesis_root: B256,
    ) -> Self {
        let pool = Arc::new(TransactionPool::new(config.transaction_limits()));

        let initial_index = match ledger.current_batch_index().await {
            Ok(index) => index,
            Err(error) => {
                warn!(%error, "ledger batch index unavailable at init, starting from 0");
                0
            }
        };
        let batcher = Arc::new(BatchFormer::new(
            Arc::clone(&pool),
            estimator,
            initial_index,
            &config,
        ));

        let cache = ProofCache::new(config.proof_cache_entries, config.proof_cache_ttl);
        let coordinator = Arc::new(ProofCoordinator::new(prover, cache));

        let commitments =
            Arc::new(StateCommitmentManager::new(ledger, genesis_root, &config).await);

        Self {
            config,
            capabilities,
            pool,
            batcher,
            coordinator,
            commitments,
            cycle_guard: Mutex::new(()),
            running: AtomicBool::new(false),
            total_batches: AtomicU64::new(0),
            last_batch_at: std::sync::Mutex::new(None),
            loop_handle: std::sync::Mutex::new(None),
        }
    }

    // ------------------------------------------------------------------
    // Transaction intake
    // ------------------------------------------------------------------

    /// Validate and admit one transaction into the pool
    pub async fn add_transaction(&self, tx: Transaction) -> Result<AdmissionOutcome> {
        self.pool.add_transaction(tx).await
    }

    /// Admit many transactions, collecting per-element failures
    pub async fn add_transactions(&self, txs: Vec<Transaction>) -> IngestReceipt {
        self.pool.add_transactions(txs).await
    }

    /// Number of pending transactions
    pub async fn pending_count(&self) -> usize {
        self.pool.pending_count().await
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Settled root history, batch index -> root
    pub async fn root_history(&self) -> std::collections::BTreeMap<u64, B256> {
        self.commitments.history().await
    }

    /// The `n` most recent finalized batches, newest first
    pub async fn latest_batches(&self, n: usize) -> Vec<Batch> {
        self.commitments.latest_batches(n).await
    }

    /// Externally visible status snapshot
    pub async fn status(&self) -> SequencerStatus {
        SequencerStatus {
            running: self.running.load(Ordering::SeqCst),
            pending_transactions: self.pool.pending_count().await,
            last_batch_timestamp: *self.last_batch_at.lock().unwrap_or_else(|e| e.into_inner()),
            total_batches: self.total_batches.load(Ordering::SeqCst),
        }
    }

    // ------------------------------------------------------------------
    // Control
    // ------------------------------------------------------------------

    /// Start the periodic loop. Fails if already running.
    pub fn start(self: &Arc<Self>, interval: Duration, vk_refs: VerificationKeyRefs) -> Result<()> {
        self.capabilities.require(Capability::Sequence)?;

        if self.running.swap(true, Ordering::SeqCst) {
            return Err(SequencerError::Internal(
                "sequencer already running".to_string(),
            ));
        }

        let (shutdown, mut shutdown_rx) = watch::channel(false);
        let sequencer = Arc::clone(self);
        let task = tokio::spawn(async move {
            info!(interval_secs = interval.as_secs(), "sequencing loop started");
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // the interval fires immediately; consume the first tick so the
            // loop waits one full period before its first cycle
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        sequencer.tick(&vk_refs).await;
                    }
                    _ = shutdown_rx.changed() => {
                        info!("sequencing loop stopped");
                        break;
                    }
                }
            }
        });

        *self.loop_handle.lock().unwrap_or_else(|e| e.into_inner()) =
            Some(LoopHandle { task, shutdown });
        Ok(())
    }

    /// Cancel future ticks. An in-flight cycle completes naturally.
    pub fn stop(&self) -> Result<()> {
        self.capabilities.require(Capability::Sequence)?;

        if !self.running.swap(false, Ordering::SeqCst) {
            return Ok(());
        }
        if let Some(handle) = self.loop_handle.lock().unwrap_or_else(|e| e.into_inner()).take() {
            // signal, do not abort: the select loop exits once any running
            // tick handler finishes
            let _ = handle.shutdown.send(true);
            drop(handle.task);
        }
        Ok(())
    }

    /// Run one cycle immediately, respecting the single-flight guard (waits
    /// for an in-flight cycle instead of skipping). Fails with `EmptyPool`
    /// if there is nothing to batch.
    pub async fn force_batch(&self, vk_refs: &VerificationKeyRefs) -> Result<Proof> {
        self.capabilities.require(Capability::Sequence)?;
        let _guard = self.cycle_guard.lock().await;
        self.run_cycle(vk_refs).await
    }

    // ------------------------------------------------------------------
    // Cycle execution
    // ------------------------------------------------------------------

    /// One timer tick: skip if a cycle is in flight or the pool is below
    /// the drain threshold; errors are logged and the loop resumes at the
    /// next tick.
    async fn tick(&self, vk_refs: &VerificationKeyRefs) {
        let _guard = match self.cycle_guard.try_lock() {
            Ok(guard) => guard,
            Err(_) => {
                debug!("cycle in flight, tick skipped");
                return;
            }
        };

        if !self.config.batch_on_interval {
            let pending = self.pool.pending_count().await;
            if pending < self.config.min_batch_size {
                debug!(
                    pending,
                    threshold = self.config.min_batch_size,
                    "below drain threshold, tick skipped"
                );
                return;
            }
        }

        match self.run_cycle(vk_refs).await {
            Ok(proof) => {
                debug!(batch_index = proof.batch_index, "cycle completed");
            }
            Err(SequencerError::EmptyPool) => {
                debug!("pool empty at cycle start");
            }
            Err(err) => {
                error!(error = %err, "cycle failed");
            }
        }
    }

    /// Form, prove, verify, and settle one batch.
    ///
    /// Failure handling: a prover failure drops the batch's transactions
    /// (no retry, no requeue) and releases the index; a verification or
    /// settlement failure requeues the transactions and releases the index
    /// so the next cycle can try again from a clean slate.
    async fn run_cycle(&self, vk_refs: &VerificationKeyRefs) -> Result<Proof> {
        let prev_root = self.commitments.current_root().await;
        let batch = self.batcher.create_batch(prev_root).await?;
        let index = batch.index;
        let transactions = batch.transactions.clone();

        let proof = match self.coordinator.generate_proof(&batch).await {
            Ok(proof) => proof,
            Err(err) => {
                warn!(batch_index = index, error = %err, "proof generation failed, batch dropped");
                self.batcher.release_index(index);
                return Err(err);
            }
        };

        let settled = match self.commitments.verify_state_transition(
            batch.prev_state_root,
            batch.new_state_root,
            &proof,
        ) {
            Ok(()) => self.commitments.submit_single(batch, &proof, vk_refs).await,
            Err(err) => Err(err),
        };

        match settled {
            Ok(receipt) => {
                self.total_batches.fetch_add(1, Ordering::SeqCst);
                *self.last_batch_at.lock().unwrap_or_else(|e| e.into_inner()) = Some(Utc::now());
                info!(
                    batch_index = index,
                    tx_hash = %receipt.tx_hash,
                    "batch settled"
                );
                Ok(proof)
            }
            Err(err) => {
                warn!(
                    batch_index = index,
                    error = %err,
                    "settlement failed, requeueing transactions"
                );
                self.pool.requeue(transactions).await;
                self.batcher.release_index(index);
                Err(err)
            }
        }
    }
}
