//! Proof coordination: single-flight deduplication and result caching
//!
//! The single entry point for proof computation. Concurrent callers for the
//! same batch index share one real prover invocation: the first caller
//! becomes the leader and broadcasts its result (success or failure) to
//! everyone who subscribed while the operation was in flight.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::domain::{Batch, Proof, ProofPublicValues};
use crate::infra::{ProofCache, Prover, ProverError, Result};

type ProofResult = std::result::Result<Proof, ProverError>;
type InFlightMap = Mutex<HashMap<u64, broadcast::Sender<ProofResult>>>;

/// Occupies the in-flight slot for one batch index while its leader runs.
///
/// Dropping the guard vacates the slot and, if the leader never published,
/// drops the last sender so subscribers fail out of `recv` instead of
/// waiting forever. A cancelled leader therefore cannot poison its index:
/// the next caller simply leads a fresh operation.
struct InFlightGuard<'a> {
    slots: &'a InFlightMap,
    index: u64,
    sender: broadcast::Sender<ProofResult>,
}

impl InFlightGuard<'_> {
    /// Vacate the slot, then hand the result to every subscriber.
    fn publish(self, result: ProofResult) {
        let sender = self.sender.clone();
        drop(self);
        // no subscribers is fine
        let _ = sender.send(result);
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        slots.remove(&self.index);
    }
}

enum Slot<'a> {
    Lead(InFlightGuard<'a>),
    Join(broadcast::Receiver<ProofResult>),
}

/// Coordinates proof generation against the external prover.
pub struct ProofCoordinator {
    prover: Arc<dyn Prover>,
    cache: ProofCache,
    in_flight: InFlightMap,
}

impl ProofCoordinator {
    pub fn new(prover: Arc<dyn Prover>, cache: ProofCache) -> Self {
        Self {
            prover,
            cache,
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    /// Generate (or reuse) the proof for a batch.
    ///
    /// - cache hit on `(index, txset_digest)`: returns immediately
    /// - request already in flight for the index: awaits the shared result
    /// - otherwise: invokes the prover once and publishes the outcome
    ///
    /// Prover failures propagate without retry; retry policy belongs to the
    /// caller.
    pub async fn generate_proof(&self, batch: &Batch) -> Result<Proof> {
        let txset_digest = batch.transaction_set_digest();

        if let Some(proof) = self.cache.get(batch.index, txset_digest).await {
            debug!(batch_index = batch.index, "proof cache hit");
            return Ok(proof);
        }

        // join an in-flight operation, or occupy the slot as its leader
        let slot = {
            let mut slots = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
            match slots.get(&batch.index) {
                Some(sender) => Slot::Join(sender.subscribe()),
                None => {
                    let (sender, _) = broadcast::channel(1);
                    slots.insert(batch.index, sender.clone());
                    Slot::Lead(InFlightGuard {
                        slots: &self.in_flight,
                        index: batch.index,
                        sender,
                    })
                }
            }
        };

        let guard = match slot {
            Slot::Join(mut receiver) => {
                debug!(batch_index = batch.index, "awaiting in-flight proof");
                let result = receiver.recv().await.map_err(|_| {
                    ProverError::Unavailable("in-flight proof operation dropped".to_string())
                })?;
                return Ok(result?);
            }
            Slot::Lead(guard) => guard,
        };

        // leader path: re-check the cache in case a previous leader finished
        // between our miss and our registration, then invoke the prover once
        if let Some(proof) = self.cache.get(batch.index, txset_digest).await {
            guard.publish(Ok(proof.clone()));
            return Ok(proof);
        }

        let result = self.prover.generate(batch).await;
        if let Ok(proof) = &result {
            info!(
                batch_index = batch.index,
                proof_id = %proof.proof_id,
                proving_time_ms = proof.proving_time_ms,
                proof_size = proof.proof_size,
                "proof generated"
            );
            self.cache.insert(batch.index, txset_digest, proof.clone()).await;
        }

        guard.publish(result.clone());
        Ok(result?)
    }

    /// Verify proof bytes against public values via the prover collaborator.
    /// Mutates no core state.
    pub async fn verify_proof(
        &self,
        proof_bytes: &[u8],
        public_values: &ProofPublicValues,
    ) -> Result<bool> {
        Ok(self.prover.verify(proof_bytes, public_values).await?)
    }

    /// Proof cache statistics
    pub fn cache_stats(&self) -> &crate::infra::CacheStats {
        self.cache.stats()
    }
}
