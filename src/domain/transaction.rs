//! Transaction type and structural validation

use alloy_primitives::{Address, Bytes, B256, U256};
use serde::{Deserialize, Serialize};

use crate::infra::ValidationError;

/// Bounds applied during structural validation.
///
/// Constructed from [`SequencerConfig`](crate::config::SequencerConfig);
/// passed by reference so the pool never reads global state.
#[derive(Debug, Clone, Copy)]
pub struct TransactionLimits {
    /// Minimum acceptable gas limit
    pub min_gas_limit: u64,
    /// Maximum acceptable gas limit
    pub max_gas_limit: u64,
    /// Maximum payload size in bytes
    pub max_payload_bytes: usize,
}

/// A rollup transaction as submitted by a client.
///
/// Immutable once admitted to the pool; dropped from the pool when drained
/// into a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Sender address
    pub from: Address,
    /// Recipient address
    pub to: Address,
    /// Transferred amount
    pub value: U256,
    /// Opaque call payload
    pub payload: Bytes,
    /// Sender nonce
    pub nonce: u64,
    /// Gas limit
    pub gas_limit: u64,
    /// Gas price
    pub gas_price: u64,
}

impl Transaction {
    /// Fee-priority weight used for batch ordering.
    ///
    /// Widened to u128 so `u64::MAX * u64::MAX` cannot overflow.
    pub fn fee_weight(&self) -> u128 {
        self.gas_price as u128 * self.gas_limit as u128
    }

    /// Content digest over the canonical encoding of all fields.
    pub fn digest(&self) -> B256 {
        crate::crypto::transaction_digest(self)
    }

    /// Check structural invariants against the configured limits.
    pub fn validate(&self, limits: &TransactionLimits) -> Result<(), ValidationError> {
        if self.from == Address::ZERO {
            return Err(ValidationError::ZeroSender);
        }
        if self.gas_limit < limits.min_gas_limit {
            return Err(ValidationError::GasLimitTooLow {
                gas_limit: self.gas_limit,
                min: limits.min_gas_limit,
            });
        }
        if self.gas_limit > limits.max_gas_limit {
            return Err(ValidationError::GasLimitTooHigh {
                gas_limit: self.gas_limit,
                max: limits.max_gas_limit,
            });
        }
        if self.payload.len() > limits.max_payload_bytes {
            return Err(ValidationError::PayloadTooLarge {
                size: self.payload.len(),
                max: limits.max_payload_bytes,
            });
        }
        Ok(())
    }
}
