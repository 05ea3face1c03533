//! Non-consensus events emitted during matching
//!
//! Observability only: consumers may index or broadcast these, but they
//! never feed back into committed state, so their ordering across pair
//! tasks is unspecified.

use serde::{Deserialize, Serialize};
use types::ids::ContractAddr;
use types::numeric::{Price, Quantity};
use types::order::PositionDirection;

/// Events surfaced by block execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ModuleEvent {
    /// One side of an executed trade
    Settlement {
        contract: ContractAddr,
        order_id: u64,
        account: String,
        direction: PositionDirection,
        price: Price,
        quantity: Quantity,
    },
    /// A market order left unfulfilled and converted to a cancellation
    SyntheticCancel {
        contract: ContractAddr,
        order_id: u64,
    },
}
