//! Transaction pool with validation and idempotent ingestion
//!
//! The queue and the pending-digest set live under a single lock so that
//! admission, drain, and count observe one consistent view: a transaction
//! can never be returned by two drains, and a duplicate can never slip in
//! between the digest check and the enqueue.

use std::collections::{HashSet, VecDeque};

use alloy_primitives::B256;
use tokio::sync::RwLock;
use tracing::debug;

use crate::domain::{Transaction, TransactionLimits};
use crate::infra::{Result, SequencerError, ValidationError};

/// Outcome of a single admission attempt.
///
/// A duplicate is not an error; callers that care can tell the two apart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdmissionOutcome {
    /// Transaction queued; digest recorded in the pending set
    Admitted { digest: B256 },
    /// Identical transaction already pending; input dropped
    Duplicate { digest: B256 },
}

impl AdmissionOutcome {
    pub fn digest(&self) -> B256 {
        match self {
            AdmissionOutcome::Admitted { digest } | AdmissionOutcome::Duplicate { digest } => {
                *digest
            }
        }
    }

    pub fn is_admitted(&self) -> bool {
        matches!(self, AdmissionOutcome::Admitted { .. })
    }
}

/// Receipt for a bulk submission: per-element results, nothing aborted.
#[derive(Debug, Clone, Default)]
pub struct IngestReceipt {
    /// Digests of newly admitted transactions
    pub admitted: Vec<B256>,
    /// Digests that were already pending
    pub duplicates: Vec<B256>,
    /// Input positions that failed validation, with the reason
    pub rejected: Vec<(usize, ValidationError)>,
}

impl IngestReceipt {
    pub fn admitted_count(&self) -> usize {
        self.admitted.len()
    }
}

struct PoolInner {
    /// Insertion-ordered pending transactions with their digests
    queue: VecDeque<(Transaction, B256)>,
    /// Digests currently queued, for de-duplication only
    pending: HashSet<B256>,
}

/// Validated, de-duplicated, insertion-ordered pending set.
///
/// Exclusively owns pending transactions until they are drained into a
/// batch.
pub struct TransactionPool {
    limits: TransactionLimits,
    inner: RwLock<PoolInner>,
}

impl TransactionPool {
    pub fn new(limits: TransactionLimits) -> Self {
        Self {
            limits,
            inner: RwLock::new(PoolInner {
                queue: VecDeque::new(),
                pending: HashSet::new(),
            }),
        }
    }

    /// Validate and admit one transaction.
    ///
    /// Re-submitting an identical transaction tuple is a silent no-op at the
    /// pool level; the returned outcome still reports it as a duplicate.
    pub async fn add_transaction(&self, tx: Transaction) -> Result<AdmissionOutcome> {
        tx.validate(&self.limits)?;
        Ok(self.admit(tx).await)
    }

    /// Admit a list of transactions, collecting validation failures per
    /// element instead of aborting the whole input.
    pub async fn add_transactions(&self, txs: Vec<Transaction>) -> IngestReceipt {
        let mut receipt = IngestReceipt::default();
        for (position, tx) in txs.into_iter().enumerate() {
            if let Err(reason) = tx.validate(&self.limits) {
                receipt.rejected.push((position, reason));
                continue;
            }
            match self.admit(tx).await {
                AdmissionOutcome::Admitted { digest } => receipt.admitted.push(digest),
                AdmissionOutcome::Duplicate { digest } => receipt.duplicates.push(digest),
            }
        }
        receipt
    }

    /// Enqueue an already-validated transaction.
    async fn admit(&self, tx: Transaction) -> AdmissionOutcome {
        let digest = tx.digest();

        let mut inner = self.inner.write().await;
        if !inner.pending.insert(digest) {
            debug!(digest = %digest, "duplicate transaction dropped");
            return AdmissionOutcome::Duplicate { digest };
        }
        inner.queue.push_back((tx, digest));
        debug!(digest = %digest, pending = inner.queue.len(), "transaction admitted");
        AdmissionOutcome::Admitted { digest }
    }

    /// Atomically remove and return up to `n` oldest transactions.
    ///
    /// Their digests leave the pending set in the same critical section, so
    /// concurrent drains partition the pool.
    pub async fn drain(&self, n: usize) -> Result<Vec<Transaction>> {
        let mut inner = self.inner.write().await;
        if inner.queue.is_empty() {
            return Err(SequencerError::EmptyPool);
        }

        let take = n.min(inner.queue.len());
        let mut drained = Vec::with_capacity(take);
        for _ in 0..take {
            // non-empty by the check above
            if let Some((tx, digest)) = inner.queue.pop_front() {
                inner.pending.remove(&digest);
                drained.push(tx);
            }
        }
        debug!(drained = drained.len(), remaining = inner.queue.len(), "pool drained");
        Ok(drained)
    }

    /// Reinsert transactions at the front of the queue, preserving their
    /// relative order and restoring their digests.
    ///
    /// Used after a failed settlement submission so a failed cycle does not
    /// silently lose client transactions.
    pub async fn requeue(&self, txs: Vec<Transaction>) {
        let mut inner = self.inner.write().await;
        for tx in txs.into_iter().rev() {
            let digest = tx.digest();
            if inner.pending.insert(digest) {
                inner.queue.push_front((tx, digest));
            }
        }
        debug!(pending = inner.queue.len(), "transactions requeued");
    }

    /// Number of pending transactions; safe to call concurrently with any
    /// mutation.
    pub async fn pending_count(&self) -> usize {
        self.inner.read().await.queue.len()
    }
}
