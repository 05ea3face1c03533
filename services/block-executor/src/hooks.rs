//! Contract sudo-call surface
//!
//! The host state machine talks to deployed contracts through these hooks.
//! Implementations wrap the actual contract VM; tests substitute mocks. Any
//! error is attributed to the contract and excludes it for the block.

use crate::memstate::BlockState;
use crate::store::StoreWrite;
use serde::{Deserialize, Serialize};
use types::errors::HookError;
use types::ids::ContractAddr;
use types::order::{Cancellation, Order};
use types::pair::Pair;
use types::settlement::SettlementEntry;

/// Order results attributed to one account
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccountOrderResult {
    pub account: String,
    pub orders: Vec<Order>,
    pub cancellations: Vec<Cancellation>,
}

/// Payload of the finalize-block sudo call
///
/// Carries the order results of every account that is itself a registered
/// contract, accumulated across the block's matching phase.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SudoFinalizeBlockMsg {
    pub contract_order_results: Vec<AccountOrderResult>,
}

impl SudoFinalizeBlockMsg {
    /// Empty message
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one account's results
    pub fn add_contract_result(&mut self, result: AccountOrderResult) {
        self.contract_order_results.push(result);
    }
}

/// Privileged calls from the module into deployed contracts
pub trait ContractHooks: Send + Sync {
    /// Block-start bookkeeping hook (contracts with `need_hook`)
    fn handle_new_block(&self, contract: &ContractAddr, epoch: u64) -> Result<(), HookError>;

    /// Pre-execution: let the contract stage cancellations
    fn bulk_cancellations(
        &self,
        contract: &ContractAddr,
        pairs: &[Pair],
        state: &BlockState,
    ) -> Result<(), HookError>;

    /// Pre-execution: let the contract stage order placements
    fn bulk_order_placements(
        &self,
        contract: &ContractAddr,
        pairs: &[Pair],
        state: &BlockState,
    ) -> Result<(), HookError>;

    /// Move escrowed funds; mutates shared bank state, so the coordinator
    /// calls this sequentially
    fn handle_deposits(
        &self,
        contract: &ContractAddr,
        store: &mut dyn StoreWrite,
    ) -> Result<(), HookError>;

    /// Deliver the contract's settlement stream before commit
    fn handle_settlements(
        &self,
        contract: &ContractAddr,
        settlements: &[SettlementEntry],
        store: &mut dyn StoreWrite,
    ) -> Result<(), HookError>;

    /// Finalize-block sudo call (contracts with `need_hook`)
    fn finalize_block(
        &self,
        contract: &ContractAddr,
        msg: &SudoFinalizeBlockMsg,
    ) -> Result<(), HookError>;
}

/// Hooks that accept everything and do nothing
///
/// Useful for contracts that only consume matching, and as a test scaffold.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullHooks;

impl ContractHooks for NullHooks {
    fn handle_new_block(&self, _contract: &ContractAddr, _epoch: u64) -> Result<(), HookError> {
        Ok(())
    }

    fn bulk_cancellations(
        &self,
        _contract: &ContractAddr,
        _pairs: &[Pair],
        _state: &BlockState,
    ) -> Result<(), HookError> {
        Ok(())
    }

    fn bulk_order_placements(
        &self,
        _contract: &ContractAddr,
        _pairs: &[Pair],
        _state: &BlockState,
    ) -> Result<(), HookError> {
        Ok(())
    }

    fn handle_deposits(
        &self,
        _contract: &ContractAddr,
        _store: &mut dyn StoreWrite,
    ) -> Result<(), HookError> {
        Ok(())
    }

    fn handle_settlements(
        &self,
        _contract: &ContractAddr,
        _settlements: &[SettlementEntry],
        _store: &mut dyn StoreWrite,
    ) -> Result<(), HookError> {
        Ok(())
    }

    fn finalize_block(
        &self,
        _contract: &ContractAddr,
        _msg: &SudoFinalizeBlockMsg,
    ) -> Result<(), HookError> {
        Ok(())
    }
}
