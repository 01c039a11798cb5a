//! State-commitment history and transition verification
//!
//! Owns the monotonic root history and is its only writer. Enforces the
//! chaining protocol for single and aggregate submissions: a transition is
//! settled only if its declared old root matches the current root, and an
//! aggregate either lands completely or mutates nothing.

use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;

use alloy_primitives::B256;
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

use crate::config::SequencerConfig;
use crate::domain::{Batch, Proof, SettlementReceipt, StateTransition, VerificationKeyRefs};
use crate::infra::{Result, SequencerError, SettlementClient, SettlementLedger};

struct CommitmentState {
    /// batch index -> settled root, contiguous and append-only
    history: BTreeMap<u64, B256>,
    /// Finalized batches, oldest first, bounded by config
    finalized: VecDeque<Batch>,
    /// Root after the last settled batch
    current_root: B256,
}

/// Manager of the state-commitment chain.
pub struct StateCommitmentManager {
    client: SettlementClient,
    retained_batches: usize,
    /// Submissions are strictly sequential to preserve the chaining invariant
    submission_lock: Mutex<()>,
    inner: RwLock<CommitmentState>,
}

impl StateCommitmentManager {
    /// Initialize against the ledger's current root; `genesis_root` is the
    /// fallback when the ledger is unreachable or has no commitments yet.
    pub async fn new(
        ledger: Arc<dyn SettlementLedger>,
        genesis_root: B256,
        config: &SequencerConfig,
    ) -> Self {
        let client = SettlementClient::new(ledger);
        let current_root = match client.ledger().current_root().await {
            Ok(root) => root,
            Err(error) => {
                warn!(%error, "ledger root unavailable at init, using genesis root");
                genesis_root
            }
        };

        Self {
            client,
            retained_batches: config.retained_batches,
            submission_lock: Mutex::new(()),
            inner: RwLock::new(CommitmentState {
                history: BTreeMap::new(),
                finalized: VecDeque::new(),
                current_root,
            }),
        }
    }

    /// The root the next transition must chain from: the ledger's view when
    /// reachable, the local head otherwise.
    pub async fn current_root(&self) -> B256 {
        match self.client.ledger().current_root().await {
            Ok(root) => root,
            Err(error) => {
                let local = self.inner.read().await.current_root;
                warn!(%error, local_root = %local, "ledger unreachable, using local root");
                local
            }
        }
    }

    /// Pre-submission guard: the caller-supplied roots must equal the
    /// proof's public values byte-for-byte.
    pub fn verify_state_transition(
        &self,
        old_root: B256,
        new_root: B256,
        proof: &Proof,
    ) -> Result<()> {
        if proof.public_values.old_state_root != old_root {
            return Err(SequencerError::InvalidTransition {
                batch_index: proof.batch_index,
                expected: old_root,
                declared: proof.public_values.old_state_root,
            });
        }
        if proof.public_values.new_state_root != new_root {
            return Err(SequencerError::InvalidTransition {
                batch_index: proof.batch_index,
                expected: new_root,
                declared: proof.public_values.new_state_root,
            });
        }
        Ok(())
    }

    /// Submit one batch's transition and, on success, extend the history.
    ///
    /// The transition's old root must equal the current root; mismatch fails
    /// with `InvalidTransition` and nothing is submitted.
    pub async fn submit_single(
        &self,
        batch: Batch,
        proof: &Proof,
        vk_refs: &VerificationKeyRefs,
    ) -> Result<SettlementReceipt> {
        let _guard = self.submission_lock.lock().await;

        let transition = batch.transition();
        let expected = self.current_root().await;
        if transition.old_root != expected {
            return Err(SequencerError::InvalidTransition {
                batch_index: batch.index,
                expected,
                declared: transition.old_root,
            });
        }
        self.verify_state_transition(transition.old_root, transition.new_root, proof)?;
        self.check_index_contiguity(&[transition]).await?;

        let receipt = self.client.submit_single(proof, &transition, vk_refs).await?;

        self.record(vec![batch], &[transition]).await;
        self.confirm_against_ledger(transition.new_root).await;
        Ok(receipt)
    }

    /// Submit a chained sequence of batches as one aggregate.
    ///
    /// Requires `t0.old == current_root` and `ti.old == t(i-1).new` for all
    /// subsequent transitions; any break aborts the entire aggregate with no
    /// partial commit and no history mutation.
    pub async fn submit_aggregate(
        &self,
        items: Vec<(Batch, Proof)>,
        vk_refs: &VerificationKeyRefs,
    ) -> Result<SettlementReceipt> {
        if items.is_empty() {
            return Err(SequencerError::Internal(
                "aggregate submission requires at least one batch".to_string(),
            ));
        }

        let _guard = self.submission_lock.lock().await;

        let transitions: Vec<StateTransition> =
            items.iter().map(|(batch, _)| batch.transition()).collect();

        let mut expected = self.current_root().await;
        for ((batch, proof), transition) in items.iter().zip(&transitions) {
            if transition.old_root != expected {
                return Err(SequencerError::InvalidTransition {
                    batch_index: batch.index,
                    expected,
                    declared: transition.old_root,
                });
            }
            self.verify_state_transition(transition.old_root, transition.new_root, proof)?;
            expected = transition.new_root;
        }
        self.check_index_contiguity(&transitions).await?;

        let proofs: Vec<Proof> = items.iter().map(|(_, proof)| proof.clone()).collect();
        let receipt = self
            .client
            .submit_aggregate(&proofs, &transitions, vk_refs)
            .await?;

        let last_root = transitions[transitions.len() - 1].new_root;
        let batches: Vec<Batch> = items.into_iter().map(|(batch, _)| batch).collect();
        self.record(batches, &transitions).await;
        self.confirm_against_ledger(last_root).await;
        Ok(receipt)
    }

    /// The full settled history, batch index -> root
    pub async fn history(&self) -> BTreeMap<u64, B256> {
        self.inner.read().await.history.clone()
    }

    /// The `n` most recent finalized batches, newest first
    pub async fn latest_batches(&self, n: usize) -> Vec<Batch> {
        let inner = self.inner.read().await;
        inner.finalized.iter().rev().take(n).cloned().collect()
    }

    /// Index and root of the latest settled batch
    pub async fn local_head(&self) -> Option<(u64, B256)> {
        let inner = self.inner.read().await;
        inner.history.last_key_value().map(|(k, v)| (*k, *v))
    }

    /// History must stay gap-free: each new index extends the head by one,
    /// and aggregate members are consecutive among themselves.
    async fn check_index_contiguity(&self, transitions: &[StateTransition]) -> Result<()> {
        let head = self.local_head().await.map(|(index, _)| index);
        let mut expected_index = head.map(|h| h + 1);
        for transition in transitions {
            if let Some(expected) = expected_index {
                if transition.batch_index != expected {
                    return Err(SequencerError::Internal(format!(
                        "batch index {} would leave a gap, history head expects {}",
                        transition.batch_index, expected
                    )));
                }
            }
            expected_index = Some(transition.batch_index + 1);
        }
        Ok(())
    }

    /// Extend the history atomically for every included batch index and
    /// advance the current root to the last transition's new root.
    async fn record(&self, batches: Vec<Batch>, transitions: &[StateTransition]) {
        let mut inner = self.inner.write().await;
        for transition in transitions {
            inner.history.insert(transition.batch_index, transition.new_root);
        }
        // trusting the attested root rather than re-deriving it locally;
        // confirm_against_ledger cross-checks the ledger's view afterwards
        inner.current_root = transitions[transitions.len() - 1].new_root;

        for mut batch in batches {
            batch.finalized = true;
            info!(
                batch_index = batch.index,
                transactions = batch.transaction_count(),
                new_root = %batch.new_state_root,
                "batch finalized"
            );
            inner.finalized.push_back(batch);
        }
        while inner.finalized.len() > self.retained_batches {
            inner.finalized.pop_front();
        }
    }

    /// Consistency check only: a disagreement with the ledger is logged,
    /// never treated as a failure of an already-settled submission.
    async fn confirm_against_ledger(&self, settled_root: B256) {
        if let Ok(ledger_root) = self.client.ledger().current_root().await {
            if ledger_root != settled_root {
                warn!(
                    local = %settled_root,
                    ledger = %ledger_root,
                    "ledger root diverges from settled root"
                );
            }
        }
    }
}
