//! Batch formation with congestion-aware sizing and fee-priority ordering

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use alloy_primitives::B256;
use tracing::{debug, warn};

use crate::config::SequencerConfig;
use crate::domain::Batch;
use crate::infra::{GasPriceEstimator, Result, TransactionPool};

/// Multiplier bounds applied to the congestion-adjusted batch size
const MULTIPLIER_MIN: f64 = 0.5;
const MULTIPLIER_MAX: f64 = 1.5;

/// Drains the pool into ordered batches.
///
/// Exclusively owns each batch until it is handed to the proof coordinator.
/// Index assignment is atomic and strictly increasing; the counter is seeded
/// with the index the settlement ledger reported at initialization.
pub struct BatchFormer {
    pool: Arc<TransactionPool>,
    estimator: Arc<dyn GasPriceEstimator>,
    next_index: AtomicU64,
    max_batch_size: usize,
    reference_gas_price: u64,
}

impl BatchFormer {
    pub fn new(
        pool: Arc<TransactionPool>,
        estimator: Arc<dyn GasPriceEstimator>,
        initial_index: u64,
        config: &SequencerConfig,
    ) -> Self {
        Self {
            pool,
            estimator,
            next_index: AtomicU64::new(initial_index),
            max_batch_size: config.max_batch_size,
            reference_gas_price: config.reference_gas_price,
        }
    }

    /// Index the next formed batch will receive
    pub fn next_index(&self) -> u64 {
        self.next_index.load(Ordering::SeqCst)
    }

    /// Form a batch chained onto `prev_state_root`.
    ///
    /// Target size is `min(configured_max, pool_size)` scaled by the
    /// congestion multiplier (clamped to [0.5, 1.5], floor of one
    /// transaction). Drained transactions are stably sorted by descending
    /// `gas_price * gas_limit`, so equal-fee transactions keep arrival
    /// order. Fails with `EmptyPool` if nothing is pending.
    pub async fn create_batch(&self, prev_state_root: B256) -> Result<Batch> {
        let pool_size = self.pool.pending_count().await;
        let base = self.max_batch_size.min(pool_size);
        let multiplier = self.congestion_multiplier().await;
        let target = (((base as f64) * multiplier).floor() as usize).max(1);

        // drain errors with EmptyPool when the pool emptied since the count
        let mut transactions = self.pool.drain(target).await?;
        transactions.sort_by(|a, b| b.fee_weight().cmp(&a.fee_weight()));

        let index = self.next_index.fetch_add(1, Ordering::SeqCst);
        let batch = Batch::new(index, transactions, prev_state_root);
        debug!(
            batch_index = index,
            transactions = batch.transaction_count(),
            multiplier,
            "batch formed"
        );
        Ok(batch)
    }

    /// Roll the index counter back after a cycle failed before finalization,
    /// so the settled history stays contiguous. Only the most recently
    /// assigned index can be released; anything else is a no-op.
    pub fn release_index(&self, index: u64) {
        let _ = self.next_index.compare_exchange(
            index + 1,
            index,
            Ordering::SeqCst,
            Ordering::SeqCst,
        );
    }

    /// Congestion multiplier derived from the gas-price estimator.
    ///
    /// Cheap gas relative to the reference grows batches, expensive gas
    /// shrinks them. Estimator failure falls back to 1.0.
    async fn congestion_multiplier(&self) -> f64 {
        match self.estimator.estimate_gas_price().await {
            Ok(price) if price > 0 => {
                let ratio = self.reference_gas_price as f64 / price as f64;
                ratio.clamp(MULTIPLIER_MIN, MULTIPLIER_MAX)
            }
            Ok(_) => MULTIPLIER_MAX,
            Err(error) => {
                warn!(%error, "gas price estimation failed, using neutral multiplier");
                1.0
            }
        }
    }
}
