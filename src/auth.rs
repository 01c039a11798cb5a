//! Capability checks for privileged operations
//!
//! A tagged-variant capability set replaces mutable role/permission maps:
//! each component states exactly which capability an operation requires and
//! checks it through this interface. The set is built once and passed by
//! reference at construction time.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::infra::{Result, SequencerError};

/// A single privileged capability
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Submit transactions into the pool
    SubmitTransactions,
    /// Drive the sequencing loop (start/stop/force cycles)
    Sequence,
    /// Administrative operations
    Administer,
}

/// An immutable set of granted capabilities
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilitySet(BTreeSet<Capability>);

impl CapabilitySet {
    /// Empty set; every privileged check fails
    pub fn none() -> Self {
        Self::default()
    }

    /// Grant for a node operator: sequencing plus transaction submission
    pub fn operator() -> Self {
        Self::from_iter([Capability::SubmitTransactions, Capability::Sequence])
    }

    /// Grant for an administrator: everything
    pub fn admin() -> Self {
        Self::from_iter([
            Capability::SubmitTransactions,
            Capability::Sequence,
            Capability::Administer,
        ])
    }

    pub fn contains(&self, capability: Capability) -> bool {
        self.0.contains(&capability)
    }

    /// Fail with [`SequencerError::Unauthorized`] unless the capability is
    /// granted.
    pub fn require(&self, capability: Capability) -> Result<()> {
        if self.contains(capability) {
            Ok(())
        } else {
            Err(SequencerError::Unauthorized(capability))
        }
    }
}

impl FromIterator<Capability> for CapabilitySet {
    fn from_iter<I: IntoIterator<Item = Capability>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
