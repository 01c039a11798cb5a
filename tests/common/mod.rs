//! Common test fixtures: an honest in-memory prover and settlement ledger
//!
//! Both fakes count invocations and detect overlapping calls so tests can
//! assert the single-flight and strictly-sequential-submission guarantees.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use alloy_primitives::{Address, Bytes, B256, U256};
use async_trait::async_trait;

use rollup_sequencer::infra::{ProverError, SettlementError};
use rollup_sequencer::{
    Batch, Proof, ProofPublicValues, Prover, SettlementLedger, SettlementReceipt, StateTransition,
    Transaction, VerificationKeyRefs,
};

/// Genesis root used across tests
pub fn genesis_root() -> B256 {
    B256::repeat_byte(0xee)
}

/// A valid transaction with minimum-valid gas limit
pub fn tx(nonce: u64) -> Transaction {
    tx_with_price(nonce, 10)
}

pub fn tx_with_price(nonce: u64, gas_price: u64) -> Transaction {
    Transaction {
        from: Address::repeat_byte(0x01),
        to: Address::repeat_byte(0x02),
        value: U256::from(nonce + 1),
        payload: Bytes::new(),
        nonce,
        gas_limit: 21_000,
        gas_price,
    }
}

pub fn vk_refs() -> VerificationKeyRefs {
    VerificationKeyRefs::new("vk-single-test", "vk-aggregate-test")
}

// ============================================================================
// FakeProver
// ============================================================================

/// Prover that attests exactly what the batch declares.
pub struct FakeProver {
    pub invocations: AtomicUsize,
    pub concurrent: AtomicUsize,
    pub max_concurrent: AtomicUsize,
    pub fail: AtomicBool,
    pub delay: Duration,
}

impl FakeProver {
    pub fn new() -> Self {
        Self {
            invocations: AtomicUsize::new(0),
            concurrent: AtomicUsize::new(0),
            max_concurrent: AtomicUsize::new(0),
            fail: AtomicBool::new(false),
            delay: Duration::ZERO,
        }
    }

    pub fn slow(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::new()
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.fail.store(failing, Ordering::SeqCst);
    }

    pub fn invocation_count(&self) -> usize {
        self.invocations.load(Ordering::SeqCst)
    }

    /// Build a proof attesting the batch's declared transition, without
    /// going through the async path or the counters.
    pub fn honest_proof(&self, batch: &Batch) -> Proof {
        Proof::new(
            batch.index,
            Bytes::from(batch.new_state_root.to_vec()),
            ProofPublicValues {
                old_state_root: batch.prev_state_root,
                new_state_root: batch.new_state_root,
                transaction_count: batch.transaction_count() as u64,
                transaction_digests: batch.transaction_digests.clone(),
            },
            1,
        )
    }
}

#[async_trait]
impl Prover for FakeProver {
    async fn generate(&self, batch: &Batch) -> Result<Proof, ProverError> {
        self.invocations.fetch_add(1, Ordering::SeqCst);
        let now = self.concurrent.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_concurrent.fetch_max(now, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.concurrent.fetch_sub(1, Ordering::SeqCst);

        if self.fail.load(Ordering::SeqCst) {
            return Err(ProverError::Generation("fake circuit failure".to_string()));
        }

        Ok(Proof::new(
            batch.index,
            Bytes::from(batch.new_state_root.to_vec()),
            ProofPublicValues {
                old_state_root: batch.prev_state_root,
                new_state_root: batch.new_state_root,
                transaction_count: batch.transaction_count() as u64,
                transaction_digests: batch.transaction_digests.clone(),
            },
            1,
        ))
    }

    async fn verify(
        &self,
        proof_bytes: &[u8],
        public_values: &ProofPublicValues,
    ) -> Result<bool, ProverError> {
        // the fake proof bytes are the attested new root
        Ok(proof_bytes == public_values.new_state_root.as_slice())
    }
}

// ============================================================================
// FakeLedger
// ============================================================================

struct LedgerState {
    root: B256,
    next_index: u64,
    history: BTreeMap<u64, B256>,
}

/// In-memory settlement ledger enforcing root chaining and index order.
pub struct FakeLedger {
    state: Mutex<LedgerState>,
    pub paused: AtomicBool,
    pub fail_submissions: AtomicBool,
    pub submissions: AtomicUsize,
    in_submission: AtomicBool,
    pub overlap_detected: AtomicBool,
}

impl FakeLedger {
    pub fn new(genesis: B256) -> Self {
        Self::with_state(genesis, 0)
    }

    /// Ledger that already settled batches up to `next_index`
    pub fn with_state(root: B256, next_index: u64) -> Self {
        Self {
            state: Mutex::new(LedgerState {
                root,
                next_index,
                history: BTreeMap::new(),
            }),
            paused: AtomicBool::new(false),
            fail_submissions: AtomicBool::new(false),
            submissions: AtomicUsize::new(0),
            in_submission: AtomicBool::new(false),
            overlap_detected: AtomicBool::new(false),
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.fail_submissions.store(failing, Ordering::SeqCst);
    }

    pub fn settled_root(&self, index: u64) -> Option<B256> {
        self.state.lock().unwrap().history.get(&index).copied()
    }

    pub fn submission_count(&self) -> usize {
        self.submissions.load(Ordering::SeqCst)
    }

    fn apply(&self, transitions: &[StateTransition]) -> Result<SettlementReceipt, SettlementError> {
        if self.in_submission.swap(true, Ordering::SeqCst) {
            self.overlap_detected.store(true, Ordering::SeqCst);
        }
        self.submissions.fetch_add(1, Ordering::SeqCst);

        let result = (|| {
            if self.fail_submissions.load(Ordering::SeqCst) {
                return Err(SettlementError::Rpc("injected failure".to_string()));
            }

            let mut state = self.state.lock().unwrap();
            let mut root = state.root;
            let mut next_index = state.next_index;
            for transition in transitions {
                if transition.old_root != root {
                    return Err(SettlementError::StaleRoot {
                        expected: root,
                        declared: transition.old_root,
                    });
                }
                if transition.batch_index != next_index {
                    return Err(SettlementError::WrongIndex {
                        expected: next_index,
                        got: transition.batch_index,
                    });
                }
                root = transition.new_root;
                next_index = transition.batch_index + 1;
            }
            for transition in transitions {
                state.history.insert(transition.batch_index, transition.new_root);
            }
            state.root = root;
            state.next_index = next_index;

            Ok(SettlementReceipt {
                tx_hash: B256::repeat_byte(next_index as u8),
                block_number: Some(next_index),
            })
        })();

        self.in_submission.store(false, Ordering::SeqCst);
        result
    }
}

#[async_trait]
impl SettlementLedger for FakeLedger {
    async fn current_root(&self) -> Result<B256, SettlementError> {
        Ok(self.state.lock().unwrap().root)
    }

    async fn current_batch_index(&self) -> Result<u64, SettlementError> {
        Ok(self.state.lock().unwrap().next_index)
    }

    async fn submit_single(
        &self,
        _proof_bytes: &[u8],
        transition: &StateTransition,
        _vk_refs: &VerificationKeyRefs,
    ) -> Result<SettlementReceipt, SettlementError> {
        self.apply(std::slice::from_ref(transition))
    }

    async fn submit_aggregate(
        &self,
        _proof_bytes: &[u8],
        transitions: &[StateTransition],
        _vk_refs: &VerificationKeyRefs,
    ) -> Result<SettlementReceipt, SettlementError> {
        self.apply(transitions)
    }

    async fn is_paused(&self) -> Result<bool, SettlementError> {
        Ok(self.paused.load(Ordering::SeqCst))
    }
}
