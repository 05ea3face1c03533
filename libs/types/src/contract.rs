//! Registered-contract metadata

use crate::ids::ContractAddr;
use serde::{Deserialize, Serialize};

/// Registration record for a deployed trading contract
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractInfo {
    pub contract_addr: ContractAddr,
    /// Contract wants the new-block / finalize-block sudo hooks
    pub need_hook: bool,
    /// Contract participates in per-block order matching
    pub need_order_matching: bool,
}

impl ContractInfo {
    /// Register a contract that both hooks and matches
    pub fn new(contract_addr: impl Into<String>) -> Self {
        Self {
            contract_addr: ContractAddr::new(contract_addr),
            need_hook: true,
            need_order_matching: true,
        }
    }

    /// Disable hooks for this contract
    pub fn without_hooks(mut self) -> Self {
        self.need_hook = false;
        self
    }

    /// Disable order matching for this contract
    pub fn without_matching(mut self) -> Self {
        self.need_order_matching = false;
        self
    }
}
