//! Matching logic
//!
//! Cancels, limit-order placement/crossing, and market-order sweeps for one
//! pair execution. All entry points are pure over the book and their inputs,
//! so outcomes are identical across replicas regardless of scheduling.

pub mod cancel;
pub mod limit;
pub mod market;

pub use cancel::cancel_orders;
pub use limit::{add_outstanding_limit_orders_to_orderbook, match_limit_orders};
pub use market::{match_market_orders, sorted_market_orders};

use types::numeric::{Price, Quantity};
use types::order::{OrderType, PositionDirection};
use types::pair::Pair;
use types::settlement::SettlementEntry;

/// Build one settlement entry for a consumption
#[allow(clippy::too_many_arguments)]
pub fn settlement_entry(
    pair: &Pair,
    order_id: u64,
    account: &str,
    order_type: OrderType,
    direction: PositionDirection,
    price: Price,
    quantity: Quantity,
    counter_order_id: u64,
) -> SettlementEntry {
    SettlementEntry {
        order_id,
        account: account.to_string(),
        price,
        quantity,
        order_type,
        direction,
        asset_denom: pair.asset_denom.clone(),
        price_denom: pair.price_denom.clone(),
        counter_order_id,
    }
}

#[cfg(test)]
mod tests {
    use crate::book::OrderBook;
    use crate::matching::{
        add_outstanding_limit_orders_to_orderbook, cancel_orders, match_limit_orders,
        match_market_orders, sorted_market_orders,
    };
    use crate::outcome::ExecutionOutcome;
    use rust_decimal::Decimal;
    use std::collections::HashMap;
    use types::numeric::{Price, Quantity};
    use types::order::{Cancellation, Order, OrderType, PositionDirection};
    use types::pair::Pair;

    fn pair() -> Pair {
        Pair::untick("usdc", "atom")
    }

    fn limit(id: u64, account: &str, direction: PositionDirection, price: u64, qty: u64) -> Order {
        Order::new(
            id,
            account,
            &pair(),
            direction,
            OrderType::Limit,
            Price::from_u64(price),
            Quantity::from_u64(qty),
        )
    }

    fn market(id: u64, account: &str, direction: PositionDirection, qty: u64) -> Order {
        Order::new(
            id,
            account,
            &pair(),
            direction,
            OrderType::Market,
            Price::zero(),
            Quantity::from_u64(qty),
        )
    }

    /// settled quantity per order id, counting each entry once
    fn settled_by_order(outcome: &ExecutionOutcome) -> HashMap<u64, Decimal> {
        let mut settled: HashMap<u64, Decimal> = HashMap::new();
        for entry in &outcome.settlements {
            *settled.entry(entry.order_id).or_default() += entry.quantity.as_decimal();
        }
        settled
    }

    #[test]
    fn test_simple_cross_settles_at_maker_price() {
        let mut book = OrderBook::new();
        let buys = vec![limit(1, "alice", PositionDirection::Long, 100, 5)];
        let sells = vec![limit(2, "bob", PositionDirection::Short, 100, 3)];

        add_outstanding_limit_orders_to_orderbook(&mut book, &pair(), &buys, &sells);
        let outcome = match_limit_orders(&mut book, &pair());

        assert_eq!(outcome.settlements.len(), 2);
        for entry in &outcome.settlements {
            assert_eq!(entry.price, Price::from_u64(100));
            assert_eq!(entry.quantity, Quantity::from_u64(3));
        }
        assert_eq!(outcome.min_price, Decimal::from(100));
        assert_eq!(outcome.max_price, Decimal::from(100));

        // residual buy rests at 100
        assert_eq!(book.best_bid(), Some(Price::from_u64(100)));
        assert!(book.shorts.is_empty());
    }

    #[test]
    fn test_market_sweep_walks_the_ladder() {
        let mut book = OrderBook::new();
        let sells = vec![
            limit(1, "maker1", PositionDirection::Short, 100, 2),
            limit(2, "maker2", PositionDirection::Short, 101, 3),
            limit(3, "maker3", PositionDirection::Short, 102, 1),
        ];
        add_outstanding_limit_orders_to_orderbook(&mut book, &pair(), &[], &sells);

        let mut takers = vec![market(4, "taker", PositionDirection::Long, 5)];
        let outcome =
            match_market_orders(&mut book, &pair(), &mut takers, PositionDirection::Long);

        // (100, 2) then (101, 3); the 102 level is untouched
        assert_eq!(outcome.min_price, Decimal::from(100));
        assert_eq!(outcome.max_price, Decimal::from(101));
        assert!(!takers[0].has_remaining());
        assert_eq!(book.best_ask(), Some(Price::from_u64(102)));

        let taker_fills: Vec<_> = outcome
            .settlements
            .iter()
            .filter(|e| e.order_id == 4)
            .map(|e| (e.price, e.quantity))
            .collect();
        assert_eq!(
            taker_fills,
            vec![
                (Price::from_u64(100), Quantity::from_u64(2)),
                (Price::from_u64(101), Quantity::from_u64(3)),
            ]
        );
    }

    #[test]
    fn test_market_order_respects_worst_price() {
        let mut book = OrderBook::new();
        let sells = vec![
            limit(1, "maker1", PositionDirection::Short, 100, 1),
            limit(2, "maker2", PositionDirection::Short, 105, 1),
        ];
        add_outstanding_limit_orders_to_orderbook(&mut book, &pair(), &[], &sells);

        let mut takers = vec![Order::new(
            3,
            "taker",
            &pair(),
            PositionDirection::Long,
            OrderType::Market,
            Price::from_u64(102),
            Quantity::from_u64(2),
        )];
        let outcome =
            match_market_orders(&mut book, &pair(), &mut takers, PositionDirection::Long);

        // only the 100 level is acceptable
        assert_eq!(outcome.max_price, Decimal::from(100));
        assert_eq!(takers[0].remaining_quantity, Quantity::from_u64(1));
    }

    #[test]
    fn test_cancel_beats_match() {
        let mut book = OrderBook::new();
        let resting = limit(1, "alice", PositionDirection::Long, 100, 5);
        add_outstanding_limit_orders_to_orderbook(
            &mut book,
            &pair(),
            std::slice::from_ref(&resting),
            &[],
        );

        cancel_orders(&mut book, &[Cancellation::new(&resting)]);

        let mut takers = vec![market(2, "bob", PositionDirection::Short, 5)];
        let outcome =
            match_market_orders(&mut book, &pair(), &mut takers, PositionDirection::Short);

        assert!(outcome.settlements.is_empty());
        assert_eq!(takers[0].remaining_quantity, Quantity::from_u64(5));
        assert!(book.is_empty());
    }

    #[test]
    fn test_self_trade_is_permitted() {
        let mut book = OrderBook::new();
        let buys = vec![limit(1, "xavier", PositionDirection::Long, 100, 2)];
        let sells = vec![limit(2, "xavier", PositionDirection::Short, 100, 2)];

        add_outstanding_limit_orders_to_orderbook(&mut book, &pair(), &buys, &sells);
        let outcome = match_limit_orders(&mut book, &pair());

        assert_eq!(outcome.settlements.len(), 2);
        assert!(outcome.settlements.iter().all(|e| e.account == "xavier"));
        assert!(book.is_empty());
    }

    #[test]
    fn test_no_crossed_book_after_limit_match() {
        let mut book = OrderBook::new();
        let buys = vec![
            limit(1, "a", PositionDirection::Long, 103, 4),
            limit(3, "c", PositionDirection::Long, 101, 2),
        ];
        let sells = vec![
            limit(2, "b", PositionDirection::Short, 100, 3),
            limit(4, "d", PositionDirection::Short, 102, 5),
        ];
        add_outstanding_limit_orders_to_orderbook(&mut book, &pair(), &buys, &sells);
        assert!(book.is_crossed());

        match_limit_orders(&mut book, &pair());
        assert!(!book.is_crossed());
    }

    #[test]
    fn test_older_order_sets_the_price() {
        let mut book = OrderBook::new();
        // the sell arrives first and rests at 99
        add_outstanding_limit_orders_to_orderbook(
            &mut book,
            &pair(),
            &[],
            &[limit(1, "bob", PositionDirection::Short, 99, 1)],
        );
        // the crossing buy arrives later at 101
        add_outstanding_limit_orders_to_orderbook(
            &mut book,
            &pair(),
            &[limit(2, "alice", PositionDirection::Long, 101, 1)],
            &[],
        );

        let outcome = match_limit_orders(&mut book, &pair());
        assert_eq!(outcome.settlements.len(), 2);
        assert!(outcome
            .settlements
            .iter()
            .all(|e| e.price == Price::from_u64(99)));
    }

    #[test]
    fn test_market_sort_order_is_deterministic() {
        let orders = vec![
            Order::new(
                5,
                "a",
                &pair(),
                PositionDirection::Long,
                OrderType::Market,
                Price::from_u64(101),
                Quantity::from_u64(1),
            ),
            market(3, "b", PositionDirection::Long, 1),
            Order::new(
                2,
                "c",
                &pair(),
                PositionDirection::Long,
                OrderType::Market,
                Price::from_u64(105),
                Quantity::from_u64(1),
            ),
            market(1, "d", PositionDirection::Long, 1),
            limit(9, "e", PositionDirection::Long, 100, 1),
        ];

        let sorted = sorted_market_orders(&orders, PositionDirection::Long);
        let ids: Vec<_> = sorted.iter().map(|o| o.id).collect();
        // unconstrained first by id, then higher worst-price first
        assert_eq!(ids, vec![1, 3, 2, 5]);
    }

    #[test]
    fn test_conservation_across_mixed_matching() {
        let mut book = OrderBook::new();
        let buys = vec![
            limit(1, "a", PositionDirection::Long, 100, 4),
            limit(2, "b", PositionDirection::Long, 99, 2),
        ];
        let sells = vec![
            limit(3, "c", PositionDirection::Short, 100, 1),
            limit(4, "d", PositionDirection::Short, 101, 6),
        ];
        add_outstanding_limit_orders_to_orderbook(&mut book, &pair(), &buys, &sells);

        let mut takers = vec![market(5, "e", PositionDirection::Long, 3)];
        let market_outcome =
            match_market_orders(&mut book, &pair(), &mut takers, PositionDirection::Long);
        let limit_outcome = match_limit_orders(&mut book, &pair());
        let total = market_outcome.merge(limit_outcome);

        let settled = settled_by_order(&total);
        // the market taker settles exactly its placed quantity
        assert_eq!(settled.get(&5).copied().unwrap_or_default(), Decimal::from(3));
        // no order settles more than it placed
        let placed: HashMap<u64, Decimal> = [
            (1u64, 4u64),
            (2, 2),
            (3, 1),
            (4, 6),
            (5, 3),
        ]
        .into_iter()
        .map(|(id, q)| (id, Decimal::from(q)))
        .collect();
        for (id, qty) in settled {
            assert!(qty <= placed[&id], "order {} over-settled", id);
        }
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        fn arb_side() -> impl Strategy<Value = PositionDirection> {
            prop_oneof![
                Just(PositionDirection::Long),
                Just(PositionDirection::Short)
            ]
        }

        proptest! {
            /// settled + residual = placed for every order, whatever the flow
            #[test]
            fn conservation_holds(
                specs in prop::collection::vec((arb_side(), 90u64..110, 1u64..10), 1..24)
            ) {
                let mut book = OrderBook::new();
                let mut buys = Vec::new();
                let mut sells = Vec::new();
                for (i, (direction, price, qty)) in specs.iter().enumerate() {
                    let order = limit(i as u64 + 1, "acct", *direction, *price, *qty);
                    match direction {
                        PositionDirection::Long => buys.push(order),
                        PositionDirection::Short => sells.push(order),
                    }
                }
                add_outstanding_limit_orders_to_orderbook(&mut book, &pair(), &buys, &sells);
                let outcome = match_limit_orders(&mut book, &pair());

                let settled = settled_by_order(&outcome);
                let mut resting: HashMap<u64, Decimal> = HashMap::new();
                for (_, level) in book.longs.iter() {
                    for order in level.iter() {
                        *resting.entry(order.id).or_default() += order.remaining_quantity.as_decimal();
                    }
                }
                for (_, level) in book.shorts.iter() {
                    for order in level.iter() {
                        *resting.entry(order.id).or_default() += order.remaining_quantity.as_decimal();
                    }
                }

                for order in buys.iter().chain(sells.iter()) {
                    let s = settled.get(&order.id).copied().unwrap_or_default();
                    let r = resting.get(&order.id).copied().unwrap_or_default();
                    prop_assert_eq!(s + r, order.quantity.as_decimal());
                }
                prop_assert!(!book.is_crossed());
            }

            /// merge is associative with empty() as identity
            #[test]
            fn merge_is_a_monoid(prices in prop::collection::vec(1u64..1000, 0..6)) {
                let outcomes: Vec<ExecutionOutcome> = prices
                    .chunks(2)
                    .map(|chunk| {
                        let mut outcome = ExecutionOutcome::empty();
                        for (i, p) in chunk.iter().enumerate() {
                            let price = Price::from_u64(*p);
                            outcome.record(
                                crate::matching::settlement_entry(
                                    &pair(), i as u64, "a", OrderType::Limit,
                                    PositionDirection::Long, price, Quantity::from_u64(1), 99,
                                ),
                                crate::matching::settlement_entry(
                                    &pair(), 99, "b", OrderType::Limit,
                                    PositionDirection::Short, price, Quantity::from_u64(1), i as u64,
                                ),
                                price,
                            );
                        }
                        outcome
                    })
                    .collect();

                if outcomes.len() >= 3 {
                    let left = outcomes[0].clone().merge(outcomes[1].clone()).merge(outcomes[2].clone());
                    let right = outcomes[0].clone().merge(outcomes[1].clone().merge(outcomes[2].clone()));
                    prop_assert_eq!(left, right);
                }
                for outcome in outcomes {
                    let left = ExecutionOutcome::empty().merge(outcome.clone());
                    let right = outcome.clone().merge(ExecutionOutcome::empty());
                    prop_assert_eq!(&left, &outcome);
                    prop_assert_eq!(&right, &outcome);
                }
            }
        }
    }
}
