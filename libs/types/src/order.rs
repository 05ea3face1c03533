//! Order and cancellation types
//!
//! Orders are staged by contract pre-execution hooks, live in the in-memory
//! block state for one block, and are consumed by matching or rejected by a
//! cancellation.

use crate::numeric::{Price, Quantity};
use crate::pair::{Pair, PairKey};
use serde::{Deserialize, Serialize};

/// Position direction of an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PositionDirection {
    /// Buy side (bids)
    Long,
    /// Sell side (asks)
    Short,
}

impl PositionDirection {
    /// Get the opposite direction
    pub fn opposite(&self) -> Self {
        match self {
            PositionDirection::Long => PositionDirection::Short,
            PositionDirection::Short => PositionDirection::Long,
        }
    }

    /// Label used in telemetry counter names
    pub fn label(&self) -> &'static str {
        match self {
            PositionDirection::Long => "long",
            PositionDirection::Short => "short",
        }
    }
}

/// Order type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderType {
    /// Rests on the book at a limit price
    Limit,
    /// Consumes the best counter levels, optionally bounded by a worst price
    Market,
    /// Becomes a market order once its trigger price is crossed
    Stoploss,
    /// Becomes a limit order once its trigger price is crossed
    Stoplimit,
}

impl OrderType {
    /// Whether this is a stop variant awaiting trigger activation
    pub fn is_triggerable(&self) -> bool {
        matches!(self, OrderType::Stoploss | OrderType::Stoplimit)
    }

    /// Label used in telemetry counter names
    pub fn label(&self) -> &'static str {
        match self {
            OrderType::Limit => "limit",
            OrderType::Market => "market",
            OrderType::Stoploss => "stoploss",
            OrderType::Stoplimit => "stoplimit",
        }
    }
}

/// An order staged for matching
///
/// `id` is unique within the owning contract. `price` is meaningful for
/// LIMIT and STOPLIMIT orders; on a MARKET order a non-zero price is the
/// worst acceptable fill price and zero means unconstrained.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: u64,
    pub account: String,
    pub price_denom: String,
    pub asset_denom: String,
    pub direction: PositionDirection,
    pub order_type: OrderType,
    pub price: Price,
    pub quantity: Quantity,
    pub remaining_quantity: Quantity,
    /// Activation price for stop variants; zero otherwise
    pub trigger_price: Price,
    /// Set once the trigger price has been crossed; never reverts
    pub trigger_status: bool,
}

impl Order {
    /// Create a new order with full remaining quantity
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: u64,
        account: impl Into<String>,
        pair: &Pair,
        direction: PositionDirection,
        order_type: OrderType,
        price: Price,
        quantity: Quantity,
    ) -> Self {
        Self {
            id,
            account: account.into(),
            price_denom: pair.price_denom.clone(),
            asset_denom: pair.asset_denom.clone(),
            direction,
            order_type,
            price,
            quantity,
            remaining_quantity: quantity,
            trigger_price: Price::zero(),
            trigger_status: false,
        }
    }

    /// Attach a trigger price (stop variants)
    pub fn with_trigger(mut self, trigger_price: Price) -> Self {
        self.trigger_price = trigger_price;
        self
    }

    /// The canonical key of the pair this order trades
    pub fn pair_key(&self) -> PairKey {
        Pair::untick(self.price_denom.clone(), self.asset_denom.clone()).key()
    }

    /// Whether the order still has unmatched quantity
    pub fn has_remaining(&self) -> bool {
        !self.remaining_quantity.is_zero()
    }

    /// Quantity already consumed by settlements
    pub fn filled_quantity(&self) -> Quantity {
        self.quantity.saturating_sub(self.remaining_quantity)
    }
}

/// A cancellation staged against a resting order
///
/// Consumed once at the start of pair execution; a no-op if the order id is
/// absent from the book. Carries the cancelled order's account so results
/// can be attributed back to it for refunds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cancellation {
    pub order_id: u64,
    pub account: String,
    pub price: Price,
    pub direction: PositionDirection,
    pub price_denom: String,
    pub asset_denom: String,
}

impl Cancellation {
    /// Create a cancellation for an order resting at `price`
    pub fn new(order: &Order) -> Self {
        Self {
            order_id: order.id,
            account: order.account.clone(),
            price: order.price,
            direction: order.direction,
            price_denom: order.price_denom.clone(),
            asset_denom: order.asset_denom.clone(),
        }
    }

    /// The canonical key of the pair this cancellation targets
    pub fn pair_key(&self) -> PairKey {
        Pair::untick(self.price_denom.clone(), self.asset_denom.clone()).key()
    }
}
