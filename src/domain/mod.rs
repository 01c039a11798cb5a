//! Domain models for the rollup sequencer
//!
//! Core types for transactions, batches, proofs, and state transitions.

mod batch;
mod proof;
mod transaction;

pub use batch::*;
pub use proof::*;
pub use transaction::*;
