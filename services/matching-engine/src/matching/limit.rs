//! Limit-order placement and book crossing

use crate::book::OrderBook;
use crate::matching::settlement_entry;
use crate::outcome::ExecutionOutcome;
use types::numeric::Price;
use types::order::{Order, OrderType, PositionDirection};
use types::pair::Pair;

/// Rest every staged limit order on the book
///
/// Prices are normalized to the pair's tick before insertion. Orders must be
/// supplied in deterministic order (ascending id); arrival seniority is
/// assigned at insertion. The book may be crossed afterwards; the cross is
/// resolved by [`match_limit_orders`] within the same pair execution, so a
/// marketable placement fills at the resting counter-price and only its
/// residual rests.
pub fn add_outstanding_limit_orders_to_orderbook(
    book: &mut OrderBook,
    pair: &Pair,
    limit_buys: &[Order],
    limit_sells: &[Order],
) {
    for order in limit_buys {
        insert_limit(book, pair, order, PositionDirection::Long);
    }
    for order in limit_sells {
        insert_limit(book, pair, order, PositionDirection::Short);
    }
}

fn insert_limit(book: &mut OrderBook, pair: &Pair, order: &Order, direction: PositionDirection) {
    if !order.has_remaining() {
        return;
    }
    let price = order.price.round_to_tick(pair.price_tick_size);
    book.insert_limit(
        direction,
        price,
        order.id,
        &order.account,
        order.remaining_quantity,
    );
}

/// Cross the book while `best_bid >= best_ask`
///
/// Each cross consumes the smaller front order at the price of the older
/// (maker) side. Fully consumed orders are evicted and emptied levels
/// removed, so the loop strictly reduces resting quantity and terminates
/// with an uncrossed book.
pub fn match_limit_orders(book: &mut OrderBook, pair: &Pair) -> ExecutionOutcome {
    let mut outcome = ExecutionOutcome::empty();

    loop {
        let (bid_price, ask_price) = match (book.best_bid(), book.best_ask()) {
            (Some(bid), Some(ask)) if bid >= ask => (bid, ask),
            _ => break,
        };
        let (Some(bid), Some(ask)) = (front_of_longs(book), front_of_shorts(book)) else {
            break;
        };

        let fill = bid.remaining_quantity.min(ask.remaining_quantity);
        // the order that arrived first sets the trade price
        let trade_price: Price = if bid.arrival <= ask.arrival {
            bid_price
        } else {
            ask_price
        };

        outcome.record(
            settlement_entry(
                pair,
                bid.id,
                &bid.account,
                OrderType::Limit,
                PositionDirection::Long,
                trade_price,
                fill,
                ask.id,
            ),
            settlement_entry(
                pair,
                ask.id,
                &ask.account,
                OrderType::Limit,
                PositionDirection::Short,
                trade_price,
                fill,
                bid.id,
            ),
            trade_price,
        );

        if let Some((_, level)) = book.longs.best_level_mut() {
            level.fill_front(fill);
        }
        book.longs.prune_best();
        if let Some((_, level)) = book.shorts.best_level_mut() {
            level.fill_front(fill);
        }
        book.shorts.prune_best();
    }

    outcome
}

fn front_of_longs(book: &OrderBook) -> Option<crate::book::RestingOrder> {
    book.longs.iter().next().and_then(|(_, level)| level.front()).cloned()
}

fn front_of_shorts(book: &OrderBook) -> Option<crate::book::RestingOrder> {
    book.shorts.iter().next().and_then(|(_, level)| level.front()).cloned()
}
