//! Order book for one trading pair
//!
//! Two price-ordered ladders of resting limit orders plus a book-wide
//! arrival counter that fixes maker/taker seniority when the book crosses.

pub mod long_book;
pub mod price_level;
pub mod short_book;

pub use long_book::LongBook;
pub use price_level::{PriceLevel, RestingOrder};
pub use short_book::ShortBook;

use types::numeric::{Price, Quantity};
use types::order::PositionDirection;

/// Two-sided book for one (contract, pair)
#[derive(Debug, Clone, Default)]
pub struct OrderBook {
    pub longs: LongBook,
    pub shorts: ShortBook,
    arrival_seq: u64,
}

impl OrderBook {
    /// Create a new empty book
    pub fn new() -> Self {
        Self::default()
    }

    /// Rest a limit order on the ladder for `direction`
    ///
    /// Arrival order is assigned here, so callers must insert in their
    /// deterministic order (persisted ladders first, then block orders).
    pub fn insert_limit(
        &mut self,
        direction: PositionDirection,
        price: Price,
        id: u64,
        account: &str,
        quantity: Quantity,
    ) {
        let order = RestingOrder {
            id,
            account: account.to_string(),
            remaining_quantity: quantity,
            arrival: self.next_arrival(),
        };
        match direction {
            PositionDirection::Long => self.longs.insert(price, order),
            PositionDirection::Short => self.shorts.insert(price, order),
        }
    }

    /// Remove a resting order; no-op (returns None) if absent
    pub fn remove(
        &mut self,
        direction: PositionDirection,
        order_id: u64,
        price: Price,
    ) -> Option<RestingOrder> {
        match direction {
            PositionDirection::Long => self.longs.remove(order_id, price),
            PositionDirection::Short => self.shorts.remove(order_id, price),
        }
    }

    /// Best bid price, if any
    pub fn best_bid(&self) -> Option<Price> {
        self.longs.best_price()
    }

    /// Best ask price, if any
    pub fn best_ask(&self) -> Option<Price> {
        self.shorts.best_price()
    }

    /// Whether the top of book crosses (best bid ≥ best ask)
    pub fn is_crossed(&self) -> bool {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => bid >= ask,
            _ => false,
        }
    }

    /// Whether both sides are empty
    pub fn is_empty(&self) -> bool {
        self.longs.is_empty() && self.shorts.is_empty()
    }

    fn next_arrival(&mut self) -> u64 {
        let seq = self.arrival_seq;
        self.arrival_seq += 1;
        seq
    }
}
