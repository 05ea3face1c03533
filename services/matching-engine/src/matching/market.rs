//! Market-order matching

use crate::book::OrderBook;
use crate::matching::settlement_entry;
use crate::outcome::ExecutionOutcome;
use std::cmp::Ordering;
use types::order::{Order, OrderType, PositionDirection};
use types::pair::Pair;

/// Extract and sort the market orders of one direction
///
/// Priority: unconstrained orders (zero worst-price) first, then the more
/// aggressive worst-price (higher for longs, lower for shorts), ties broken
/// by ascending order id so the result is a total order.
pub fn sorted_market_orders(orders: &[Order], direction: PositionDirection) -> Vec<Order> {
    let mut takers: Vec<Order> = orders
        .iter()
        .filter(|o| {
            o.order_type == OrderType::Market && o.direction == direction && o.has_remaining()
        })
        .cloned()
        .collect();
    takers.sort_by(|a, b| market_priority(direction, a, b));
    takers
}

fn market_priority(direction: PositionDirection, a: &Order, b: &Order) -> Ordering {
    match (a.price.is_zero(), b.price.is_zero()) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (true, true) => a.id.cmp(&b.id),
        (false, false) => {
            let by_price = match direction {
                PositionDirection::Long => b.price.cmp(&a.price),
                PositionDirection::Short => a.price.cmp(&b.price),
            };
            by_price.then(a.id.cmp(&b.id))
        }
    }
}

/// Fill market takers against the opposite ladder
///
/// Takers are consumed in their sorted order. Each consumption settles at
/// the resting level's price and reduces both sides; a taker stops when it
/// is exhausted, the counter side is empty, or its worst-price constraint
/// would be violated. Residual taker quantity is left on the order for the
/// unfulfilled-market cleanup.
pub fn match_market_orders(
    book: &mut OrderBook,
    pair: &Pair,
    takers: &mut [Order],
    direction: PositionDirection,
) -> ExecutionOutcome {
    let mut outcome = ExecutionOutcome::empty();
    for taker in takers.iter_mut() {
        while taker.has_remaining() {
            let progressed = match direction {
                PositionDirection::Long => consume_best_ask(book, pair, taker, &mut outcome),
                PositionDirection::Short => consume_best_bid(book, pair, taker, &mut outcome),
            };
            if !progressed {
                break;
            }
        }
    }
    outcome
}

/// One consumption of the best ask by a long taker
fn consume_best_ask(
    book: &mut OrderBook,
    pair: &Pair,
    taker: &mut Order,
    outcome: &mut ExecutionOutcome,
) -> bool {
    let Some((level_price, level)) = book.shorts.best_level_mut() else {
        return false;
    };
    if !taker.price.is_zero() && level_price > taker.price {
        return false;
    }
    let Some(maker) = level.front().cloned() else {
        return false;
    };

    let fill = taker.remaining_quantity.min(maker.remaining_quantity);
    level.fill_front(fill);
    book.shorts.prune_best();
    taker.remaining_quantity = taker.remaining_quantity - fill;

    outcome.record(
        settlement_entry(
            pair,
            taker.id,
            &taker.account,
            taker.order_type,
            PositionDirection::Long,
            level_price,
            fill,
            maker.id,
        ),
        settlement_entry(
            pair,
            maker.id,
            &maker.account,
            OrderType::Limit,
            PositionDirection::Short,
            level_price,
            fill,
            taker.id,
        ),
        level_price,
    );
    true
}

/// One consumption of the best bid by a short taker
fn consume_best_bid(
    book: &mut OrderBook,
    pair: &Pair,
    taker: &mut Order,
    outcome: &mut ExecutionOutcome,
) -> bool {
    let Some((level_price, level)) = book.longs.best_level_mut() else {
        return false;
    };
    if !taker.price.is_zero() && level_price < taker.price {
        return false;
    }
    let Some(maker) = level.front().cloned() else {
        return false;
    };

    let fill = taker.remaining_quantity.min(maker.remaining_quantity);
    level.fill_front(fill);
    book.longs.prune_best();
    taker.remaining_quantity = taker.remaining_quantity - fill;

    outcome.record(
        settlement_entry(
            pair,
            taker.id,
            &taker.account,
            taker.order_type,
            PositionDirection::Short,
            level_price,
            fill,
            maker.id,
        ),
        settlement_entry(
            pair,
            maker.id,
            &maker.account,
            OrderType::Limit,
            PositionDirection::Long,
            level_price,
            fill,
            taker.id,
        ),
        level_price,
    );
    true
}
