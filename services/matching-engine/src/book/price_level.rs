//! Price level with FIFO queue
//!
//! A price level holds the resting limit orders at one price point, in
//! arrival order, to enforce time priority within the level.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use types::numeric::Quantity;

/// A limit order resting on the book
///
/// `arrival` is the book-wide insertion sequence; the smaller of two
/// arrivals is the older (maker) order when the book crosses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestingOrder {
    pub id: u64,
    pub account: String,
    pub remaining_quantity: Quantity,
    pub arrival: u64,
}

/// All orders resting at one price, FIFO by arrival
#[derive(Debug, Clone, Default)]
pub struct PriceLevel {
    orders: VecDeque<RestingOrder>,
    total_quantity: Quantity,
}

impl PriceLevel {
    /// Create a new empty price level
    pub fn new() -> Self {
        Self {
            orders: VecDeque::new(),
            total_quantity: Quantity::zero(),
        }
    }

    /// Append an order at the back of the queue (time priority)
    pub fn push_back(&mut self, order: RestingOrder) {
        self.total_quantity = self.total_quantity + order.remaining_quantity;
        self.orders.push_back(order);
    }

    /// Remove an order by id
    ///
    /// Returns the removed resting order, or None if absent.
    pub fn remove(&mut self, order_id: u64) -> Option<RestingOrder> {
        let position = self.orders.iter().position(|entry| entry.id == order_id)?;
        let entry = self.orders.remove(position)?;
        self.total_quantity = self.total_quantity.saturating_sub(entry.remaining_quantity);
        Some(entry)
    }

    /// Peek at the front order without removing it
    pub fn front(&self) -> Option<&RestingOrder> {
        self.orders.front()
    }

    /// Reduce the front order's remaining quantity by `fill`
    ///
    /// Evicts the order when it is fully consumed.
    pub fn fill_front(&mut self, fill: Quantity) {
        if let Some(entry) = self.orders.front_mut() {
            entry.remaining_quantity = entry.remaining_quantity.saturating_sub(fill);
            self.total_quantity = self.total_quantity.saturating_sub(fill);
            if entry.remaining_quantity.is_zero() {
                self.orders.pop_front();
            }
        }
    }

    /// Whether the level holds no orders
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// Total resting quantity at this level
    pub fn total_quantity(&self) -> Quantity {
        self.total_quantity
    }

    /// Number of resting orders
    pub fn order_count(&self) -> usize {
        self.orders.len()
    }

    /// Iterate resting orders in FIFO order
    pub fn iter(&self) -> impl Iterator<Item = &RestingOrder> {
        self.orders.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resting(id: u64, qty: u64, arrival: u64) -> RestingOrder {
        RestingOrder {
            id,
            account: "acct".to_string(),
            remaining_quantity: Quantity::from_u64(qty),
            arrival,
        }
    }

    #[test]
    fn test_push_back_accumulates_quantity() {
        let mut level = PriceLevel::new();
        level.push_back(resting(1, 2, 0));
        level.push_back(resting(2, 3, 1));

        assert_eq!(level.order_count(), 2);
        assert_eq!(level.total_quantity(), Quantity::from_u64(5));
    }

    #[test]
    fn test_fifo_order_preserved() {
        let mut level = PriceLevel::new();
        level.push_back(resting(1, 1, 0));
        level.push_back(resting(2, 2, 1));
        level.push_back(resting(3, 3, 2));

        assert_eq!(level.front().unwrap().id, 1);
    }

    #[test]
    fn test_remove_updates_total() {
        let mut level = PriceLevel::new();
        level.push_back(resting(1, 2, 0));
        level.push_back(resting(2, 3, 1));

        let removed = level.remove(1).unwrap();
        assert_eq!(removed.remaining_quantity, Quantity::from_u64(2));
        assert_eq!(level.total_quantity(), Quantity::from_u64(3));
        assert!(level.remove(1).is_none());
    }

    #[test]
    fn test_fill_front_partial_then_evict() {
        let mut level = PriceLevel::new();
        level.push_back(resting(1, 5, 0));
        level.push_back(resting(2, 1, 1));

        level.fill_front(Quantity::from_u64(3));
        assert_eq!(level.front().unwrap().remaining_quantity, Quantity::from_u64(2));

        level.fill_front(Quantity::from_u64(2));
        assert_eq!(level.front().unwrap().id, 2);
        assert_eq!(level.total_quantity(), Quantity::from_u64(1));
    }
}
