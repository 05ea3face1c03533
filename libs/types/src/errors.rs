//! Error taxonomy for block execution
//!
//! Errors attributable to a contract move that contract into the failed set
//! for the block; the store and codec variants surface programming or
//! isolation faults.

use thiserror::Error;

/// Top-level execution error
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExecutionError {
    #[error("Hook error: {0}")]
    Hook(#[from] HookError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Matching panicked for contract {contract}: {message}")]
    MatchingPanic { contract: String, message: String },
}

/// Errors surfaced by contract sudo calls
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HookError {
    #[error("Contract {contract} rejected {hook} hook: {reason}")]
    Rejected {
        contract: String,
        hook: String,
        reason: String,
    },

    #[error("Deposit handling failed for contract {contract}: {reason}")]
    DepositFailure { contract: String, reason: String },

    #[error("Settlement write failed for contract {contract}: {reason}")]
    SettlementWriteFailure { contract: String, reason: String },

    #[error("Finalize-block hook failed for contract {contract}: {reason}")]
    FinalizeFailure { contract: String, reason: String },
}

impl HookError {
    /// The contract this error is attributable to
    pub fn contract(&self) -> &str {
        match self {
            HookError::Rejected { contract, .. }
            | HookError::DepositFailure { contract, .. }
            | HookError::SettlementWriteFailure { contract, .. }
            | HookError::FinalizeFailure { contract, .. } => contract,
        }
    }
}

/// Errors from the persistent-store layer
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Write to non-whitelisted key: {key}")]
    KeyNotWhitelisted { key: String },

    #[error("Value codec failure at {key}: {reason}")]
    Codec { key: String, reason: String },
}
