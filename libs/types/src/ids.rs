//! Identifier conventions for module entities
//!
//! Contract addresses are opaque bech32-style strings assigned by the host
//! chain. Order ids are `u64`s unique within their owning contract, so they
//! stay plain integers rather than newtypes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Address of a deployed trading contract
///
/// The canonical string form is used as a map key everywhere, so ordering
/// and equality follow plain string comparison.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContractAddr(String);

impl ContractAddr {
    /// Create a new contract address from a string
    pub fn new(addr: impl Into<String>) -> Self {
        Self(addr.into())
    }

    /// Get the address string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContractAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ContractAddr {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}
