//! Cryptographic utilities for the rollup sequencer
//!
//! Provides:
//! - Deterministic transaction digests over a canonical binary encoding
//! - Transaction-set digests for batch identity
//! - Commitment-chain state roots with domain separation

mod hash;

pub use hash::*;
