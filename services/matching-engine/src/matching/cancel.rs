//! Cancellation of resting orders

use crate::book::OrderBook;
use types::order::Cancellation;

/// Apply staged cancellations to the resting book
///
/// A cancellation whose order id is not resting at the quoted price is a
/// no-op. Returns how many orders were actually removed.
pub fn cancel_orders(book: &mut OrderBook, cancels: &[Cancellation]) -> usize {
    let mut removed = 0;
    for cancel in cancels {
        if book
            .remove(cancel.direction, cancel.order_id, cancel.price)
            .is_some()
        {
            removed += 1;
        }
    }
    removed
}
