//! Sequencer configuration
//!
//! An explicit configuration value constructed once and passed by reference
//! to each component. No shared static instance.
//!
//! Environment overrides:
//!
//! - `SEQUENCER_MAX_BATCH_SIZE` - Maximum transactions per batch (default: 100)
//! - `SEQUENCER_MIN_BATCH_SIZE` - Pool threshold before a timer tick batches (default: 1)
//! - `SEQUENCER_BATCH_ON_INTERVAL` - Batch on every tick regardless of threshold (default: false)
//! - `SEQUENCER_MIN_GAS_LIMIT` / `SEQUENCER_MAX_GAS_LIMIT` - Gas-limit bounds
//! - `SEQUENCER_MAX_PAYLOAD_BYTES` - Payload size bound (default: 131072)
//! - `SEQUENCER_REFERENCE_GAS_PRICE` - Congestion reference point (default: 50)
//! - `SEQUENCER_PROOF_CACHE_ENTRIES` / `SEQUENCER_PROOF_CACHE_TTL_SECS` - Proof cache bounds
//! - `SEQUENCER_RETAINED_BATCHES` - Finalized batches kept in memory (default: 256)
//! - `SEQUENCER_BATCH_INTERVAL_SECS` - Default loop interval (default: 30)

use std::time::Duration;

use crate::domain::TransactionLimits;

/// Configuration for the batch orchestration pipeline
#[derive(Debug, Clone)]
pub struct SequencerConfig {
    /// Maximum transactions per batch before the congestion multiplier
    pub max_batch_size: usize,
    /// Minimum pending transactions before a timer tick forms a batch
    pub min_batch_size: usize,
    /// Form a batch on every tick, ignoring `min_batch_size`
    pub batch_on_interval: bool,
    /// Minimum acceptable transaction gas limit
    pub min_gas_limit: u64,
    /// Maximum acceptable transaction gas limit
    pub max_gas_limit: u64,
    /// Maximum transaction payload size in bytes
    pub max_payload_bytes: usize,
    /// Gas price at which the congestion multiplier is exactly 1.0
    pub reference_gas_price: u64,
    /// Maximum entries in the proof cache
    pub proof_cache_entries: usize,
    /// Time-to-live for cached proofs
    pub proof_cache_ttl: Duration,
    /// Finalized batches retained for `latest_batches` queries
    pub retained_batches: usize,
    /// Default interval for the sequencing loop
    pub batch_interval: Duration,
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self {
            max_batch_size: 100,
            min_batch_size: 1,
            batch_on_interval: false,
            min_gas_limit: 21_000,
            max_gas_limit: 10_000_000,
            max_payload_bytes: 128 * 1024,
            reference_gas_price: 50,
            proof_cache_entries: 1000,
            proof_cache_ttl: Duration::from_secs(600),
            retained_batches: 256,
            batch_interval: Duration::from_secs(30),
        }
    }
}

impl SequencerConfig {
    /// Load configuration from environment variables, falling back to
    /// defaults for anything unset or unparseable.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            max_batch_size: env_parse("SEQUENCER_MAX_BATCH_SIZE", defaults.max_batch_size),
            min_batch_size: env_parse("SEQUENCER_MIN_BATCH_SIZE", defaults.min_batch_size),
            batch_on_interval: std::env::var("SEQUENCER_BATCH_ON_INTERVAL")
                .map(|s| s == "true" || s == "1")
                .unwrap_or(defaults.batch_on_interval),
            min_gas_limit: env_parse("SEQUENCER_MIN_GAS_LIMIT", defaults.min_gas_limit),
            max_gas_limit: env_parse("SEQUENCER_MAX_GAS_LIMIT", defaults.max_gas_limit),
            max_payload_bytes: env_parse("SEQUENCER_MAX_PAYLOAD_BYTES", defaults.max_payload_bytes),
            reference_gas_price: env_parse(
                "SEQUENCER_REFERENCE_GAS_PRICE",
                defaults.reference_gas_price,
            ),
            proof_cache_entries: env_parse(
                "SEQUENCER_PROOF_CACHE_ENTRIES",
                defaults.proof_cache_entries,
            ),
            proof_cache_ttl: Duration::from_secs(env_parse(
                "SEQUENCER_PROOF_CACHE_TTL_SECS",
                defaults.proof_cache_ttl.as_secs(),
            )),
            retained_batches: env_parse("SEQUENCER_RETAINED_BATCHES", defaults.retained_batches),
            batch_interval: Duration::from_secs(env_parse(
                "SEQUENCER_BATCH_INTERVAL_SECS",
                defaults.batch_interval.as_secs(),
            )),
        }
    }

    /// The validation bounds applied by the transaction pool
    pub fn transaction_limits(&self) -> TransactionLimits {
        TransactionLimits {
            min_gas_limit: self.min_gas_limit,
            max_gas_limit: self.max_gas_limit,
            max_payload_bytes: self.max_payload_bytes,
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}
