//! In-memory block state
//!
//! Per-block staging area mapping (contract, pair) to the orders and
//! cancellations emitted by contract pre-execution hooks. Cleared at block
//! start, snapshotted before each commit attempt, and filtered per contract
//! on rollback. Backed by a concurrent map because pair tasks of one
//! contract run in parallel, always on distinct keys.

use dashmap::DashMap;
use types::ids::ContractAddr;
use types::order::{Cancellation, Order};
use types::pair::PairKey;

/// Orders and cancellations staged for one (contract, pair)
#[derive(Debug, Clone, Default)]
pub struct PairBlockState {
    pub orders: Vec<Order>,
    pub cancels: Vec<Cancellation>,
}

/// Block-scoped staging state for every contract and pair
#[derive(Debug, Default)]
pub struct BlockState {
    entries: DashMap<(ContractAddr, PairKey), PairBlockState>,
}

impl BlockState {
    /// Create an empty block state
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop everything; called at block start
    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Stage an order for matching
    pub fn add_order(&self, contract: &ContractAddr, pair: &PairKey, order: Order) {
        self.entries
            .entry((contract.clone(), pair.clone()))
            .or_default()
            .orders
            .push(order);
    }

    /// Stage a cancellation
    pub fn add_cancel(&self, contract: &ContractAddr, pair: &PairKey, cancel: Cancellation) {
        self.entries
            .entry((contract.clone(), pair.clone()))
            .or_default()
            .cancels
            .push(cancel);
    }

    /// Clone of the staged orders for one (contract, pair)
    pub fn orders_snapshot(&self, contract: &ContractAddr, pair: &PairKey) -> Vec<Order> {
        self.entries
            .get(&(contract.clone(), pair.clone()))
            .map(|entry| entry.orders.clone())
            .unwrap_or_default()
    }

    /// Clone of the staged cancellations for one (contract, pair)
    pub fn cancels_snapshot(&self, contract: &ContractAddr, pair: &PairKey) -> Vec<Cancellation> {
        self.entries
            .get(&(contract.clone(), pair.clone()))
            .map(|entry| entry.cancels.clone())
            .unwrap_or_default()
    }

    /// Staged stop orders; these double as the triggered-order cache
    pub fn triggered_orders_snapshot(&self, contract: &ContractAddr, pair: &PairKey) -> Vec<Order> {
        self.orders_snapshot(contract, pair)
            .into_iter()
            .filter(|order| order.order_type.is_triggerable())
            .collect()
    }

    /// Replace the staged orders for one (contract, pair)
    pub fn set_orders(&self, contract: &ContractAddr, pair: &PairKey, orders: Vec<Order>) {
        self.entries
            .entry((contract.clone(), pair.clone()))
            .or_default()
            .orders = orders;
    }

    /// Independent snapshot of the whole state
    pub fn deep_copy(&self) -> BlockState {
        let copy = BlockState::new();
        for entry in self.entries.iter() {
            copy.entries
                .insert(entry.key().clone(), entry.value().clone());
        }
        copy
    }

    /// Replace the whole state with a previously taken snapshot
    pub fn restore(&self, snapshot: BlockState) {
        self.entries.clear();
        for (key, value) in snapshot.entries {
            self.entries.insert(key, value);
        }
    }

    /// Drop every entry staged under `contract`
    pub fn deep_filter_account(&self, contract: &ContractAddr) {
        self.entries.retain(|key, _| &key.0 != contract);
    }

    /// Number of (contract, pair) entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is staged
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
