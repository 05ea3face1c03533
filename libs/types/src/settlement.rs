//! Settlement entries and per-contract match results

use crate::ids::ContractAddr;
use crate::numeric::{Price, Quantity};
use crate::order::{Cancellation, Order, OrderType, PositionDirection};
use serde::{Deserialize, Serialize};

/// One side of an executed trade
///
/// Every consumption during matching produces two entries, one per
/// participating order, both priced at the resting (older) order's price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettlementEntry {
    pub order_id: u64,
    pub account: String,
    pub price: Price,
    pub quantity: Quantity,
    pub order_type: OrderType,
    pub direction: PositionDirection,
    pub asset_denom: String,
    pub price_denom: String,
    /// The order on the other side of this trade
    pub counter_order_id: u64,
}

/// Aggregated per-contract results of one block's matching
///
/// Overwritten in the persistent store every block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub contract_addr: String,
    pub orders: Vec<Order>,
    pub cancellations: Vec<Cancellation>,
    pub settlements: Vec<SettlementEntry>,
}

impl MatchResult {
    /// Assemble a match result for a contract
    pub fn new(
        contract_addr: &ContractAddr,
        orders: Vec<Order>,
        cancellations: Vec<Cancellation>,
        settlements: Vec<SettlementEntry>,
    ) -> Self {
        Self {
            contract_addr: contract_addr.as_str().to_string(),
            orders,
            cancellations,
            settlements,
        }
    }
}
