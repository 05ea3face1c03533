//! Stop-order trigger propagation
//!
//! Before matching, activated stops are promoted to executable orders and
//! injected into the block state. After matching, the pair's realized price
//! range activates whichever stored or freshly staged stops it crossed.
//! An activated stop executes in the next block, not recursively in this
//! one.

use crate::keeper;
use crate::memstate::BlockState;
use crate::store::StoreWrite;
use matching_engine::outcome::ExecutionOutcome;
use types::errors::StoreError;
use types::ids::ContractAddr;
use types::order::{Order, OrderType, PositionDirection};
use types::pair::PairKey;

/// Promote activated stops into this block's orders
///
/// STOPLOSS becomes MARKET, STOPLIMIT becomes LIMIT; the persistent entry
/// is consumed.
pub fn move_triggered_orders_for_pair(
    store: &mut dyn StoreWrite,
    state: &BlockState,
    contract: &ContractAddr,
    pair: &PairKey,
) -> Result<(), StoreError> {
    let Some((price_denom, asset_denom)) = pair.split() else {
        return Ok(());
    };
    for mut order in
        keeper::all_triggered_orders_for_pair(store, contract, price_denom, asset_denom)?
    {
        if !order.trigger_status {
            continue;
        }
        order.order_type = match order.order_type {
            OrderType::Stoploss => OrderType::Market,
            OrderType::Stoplimit => OrderType::Limit,
            other => other,
        };
        keeper::remove_triggered_order(store, contract, price_denom, asset_denom, order.id)?;
        state.add_order(contract, pair, order);
    }
    Ok(())
}

/// Activate stops crossed by this pair execution's price range
///
/// A LONG stop activates when its trigger price is at or below the realized
/// maximum; a SHORT stop when at or above the realized minimum. Both the
/// persistent entries and the stops staged this block are evaluated, and
/// staged stops are persisted here whether or not they activated. With no
/// trades the sentinel bounds make both comparisons false.
pub fn update_triggered_orders_for_pair(
    store: &mut dyn StoreWrite,
    state: &BlockState,
    contract: &ContractAddr,
    pair: &PairKey,
    outcome: &ExecutionOutcome,
) -> Result<(), StoreError> {
    let Some((price_denom, asset_denom)) = pair.split() else {
        return Ok(());
    };

    for mut order in
        keeper::all_triggered_orders_for_pair(store, contract, price_denom, asset_denom)?
    {
        if !order.trigger_status && activates(&order, outcome) {
            order.trigger_status = true;
            keeper::set_triggered_order(store, contract, &order)?;
        }
    }

    for mut order in state.triggered_orders_snapshot(contract, pair) {
        if !order.trigger_status && activates(&order, outcome) {
            order.trigger_status = true;
        }
        keeper::set_triggered_order(store, contract, &order)?;
    }
    Ok(())
}

fn activates(order: &Order, outcome: &ExecutionOutcome) -> bool {
    match order.direction {
        PositionDirection::Long => order.trigger_price.as_decimal() <= outcome.max_price,
        PositionDirection::Short => order.trigger_price.as_decimal() >= outcome.min_price,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemStore;
    use matching_engine::matching::settlement_entry;
    use types::numeric::{Price, Quantity};
    use types::pair::Pair;

    fn pair() -> Pair {
        Pair::untick("usdc", "atom")
    }

    fn stop(id: u64, direction: PositionDirection, trigger: u64) -> Order {
        Order::new(
            id,
            "alice",
            &pair(),
            direction,
            OrderType::Stoploss,
            Price::zero(),
            Quantity::from_u64(1),
        )
        .with_trigger(Price::from_u64(trigger))
    }

    fn outcome_with_range(min: u64, max: u64) -> ExecutionOutcome {
        let mut outcome = ExecutionOutcome::empty();
        for price in [min, max] {
            let p = Price::from_u64(price);
            outcome.record(
                settlement_entry(
                    &pair(),
                    90,
                    "x",
                    OrderType::Limit,
                    PositionDirection::Long,
                    p,
                    Quantity::from_u64(1),
                    91,
                ),
                settlement_entry(
                    &pair(),
                    91,
                    "y",
                    OrderType::Limit,
                    PositionDirection::Short,
                    p,
                    Quantity::from_u64(1),
                    90,
                ),
                p,
            );
        }
        outcome
    }

    #[test]
    fn test_long_stop_activates_at_or_below_max() {
        let mut store = MemStore::new();
        let state = BlockState::new();
        let contract = ContractAddr::new("c1");
        let key = pair().key();

        keeper::set_triggered_order(&mut store, &contract, &stop(1, PositionDirection::Long, 105))
            .unwrap();
        keeper::set_triggered_order(&mut store, &contract, &stop(2, PositionDirection::Long, 107))
            .unwrap();

        update_triggered_orders_for_pair(
            &mut store,
            &state,
            &contract,
            &key,
            &outcome_with_range(100, 106),
        )
        .unwrap();

        let stored = keeper::all_triggered_orders_for_pair(&store, &contract, "usdc", "atom").unwrap();
        assert!(stored.iter().find(|o| o.id == 1).unwrap().trigger_status);
        assert!(!stored.iter().find(|o| o.id == 2).unwrap().trigger_status);
    }

    #[test]
    fn test_short_stop_activates_at_or_above_min() {
        let mut store = MemStore::new();
        let state = BlockState::new();
        let contract = ContractAddr::new("c1");
        let key = pair().key();

        keeper::set_triggered_order(&mut store, &contract, &stop(1, PositionDirection::Short, 101))
            .unwrap();
        keeper::set_triggered_order(&mut store, &contract, &stop(2, PositionDirection::Short, 99))
            .unwrap();

        update_triggered_orders_for_pair(
            &mut store,
            &state,
            &contract,
            &key,
            &outcome_with_range(100, 106),
        )
        .unwrap();

        let stored = keeper::all_triggered_orders_for_pair(&store, &contract, "usdc", "atom").unwrap();
        assert!(stored.iter().find(|o| o.id == 1).unwrap().trigger_status);
        assert!(!stored.iter().find(|o| o.id == 2).unwrap().trigger_status);
    }

    #[test]
    fn test_empty_outcome_activates_nothing() {
        let mut store = MemStore::new();
        let state = BlockState::new();
        let contract = ContractAddr::new("c1");
        let key = pair().key();

        keeper::set_triggered_order(&mut store, &contract, &stop(1, PositionDirection::Long, 1))
            .unwrap();
        keeper::set_triggered_order(&mut store, &contract, &stop(2, PositionDirection::Short, 1_000))
            .unwrap();

        update_triggered_orders_for_pair(
            &mut store,
            &state,
            &contract,
            &key,
            &ExecutionOutcome::empty(),
        )
        .unwrap();

        let stored = keeper::all_triggered_orders_for_pair(&store, &contract, "usdc", "atom").unwrap();
        assert!(stored.iter().all(|o| !o.trigger_status));
    }

    #[test]
    fn test_staged_stops_are_persisted_even_without_activation() {
        let mut store = MemStore::new();
        let state = BlockState::new();
        let contract = ContractAddr::new("c1");
        let key = pair().key();

        state.add_order(&contract, &key, stop(5, PositionDirection::Long, 200));
        update_triggered_orders_for_pair(
            &mut store,
            &state,
            &contract,
            &key,
            &outcome_with_range(100, 106),
        )
        .unwrap();

        let stored = keeper::all_triggered_orders_for_pair(&store, &contract, "usdc", "atom").unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].id, 5);
        assert!(!stored[0].trigger_status);
    }

    #[test]
    fn test_move_promotes_and_consumes_activated_stops() {
        let mut store = MemStore::new();
        let state = BlockState::new();
        let contract = ContractAddr::new("c1");
        let key = pair().key();

        let mut activated = stop(1, PositionDirection::Long, 105);
        activated.trigger_status = true;
        keeper::set_triggered_order(&mut store, &contract, &activated).unwrap();
        keeper::set_triggered_order(&mut store, &contract, &stop(2, PositionDirection::Long, 200))
            .unwrap();

        move_triggered_orders_for_pair(&mut store, &state, &contract, &key).unwrap();

        let staged = state.orders_snapshot(&contract, &key);
        assert_eq!(staged.len(), 1);
        assert_eq!(staged[0].id, 1);
        assert_eq!(staged[0].order_type, OrderType::Market);

        let stored = keeper::all_triggered_orders_for_pair(&store, &contract, "usdc", "atom").unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].id, 2);
    }
}
