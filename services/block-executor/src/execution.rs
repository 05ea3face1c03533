//! Per-pair and per-contract execution
//!
//! One pair executes as: cancels, limit-book load, market match, limit
//! match, trigger update, price-state write, book flush. A contract fans
//! its pairs out over the parallel runner, each task confined to a
//! whitelisted store view, and the results are aggregated deterministically
//! by pair key.

use crate::events::ModuleEvent;
use crate::hooks::{AccountOrderResult, ContractHooks};
use crate::keeper;
use crate::memstate::BlockState;
use crate::runner::ParallelRunner;
use crate::store::{keys, Delta, StoreRead, StoreWrite, WhitelistedStore};
use crate::telemetry::ExecutionMetrics;
use crate::triggers;
use matching_engine::book::OrderBook;
use matching_engine::matching::{
    add_outstanding_limit_orders_to_orderbook, cancel_orders, match_limit_orders,
    match_market_orders, sorted_market_orders,
};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::sync::Mutex;
use std::time::Instant;
use tracing::{debug, info};
use types::contract::ContractInfo;
use types::errors::{ExecutionError, StoreError};
use types::ids::ContractAddr;
use types::numeric::Quantity;
use types::order::{Cancellation, Order, OrderType, PositionDirection};
use types::pair::{Pair, PairKey};
use types::settlement::SettlementEntry;

/// Everything one contract produced in the matching phase
///
/// The store delta is applied by the block coordinator once the parallel
/// phase has joined; nothing here has touched shared state yet.
#[derive(Debug, Default)]
pub struct ContractExecutionOutput {
    pub settlements: Vec<SettlementEntry>,
    pub orders: Vec<Order>,
    pub cancellations: Vec<Cancellation>,
    /// Order results grouped by account, ascending by account
    pub order_results: BTreeMap<String, AccountOrderResult>,
    pub delta: Delta,
    pub events: Vec<ModuleEvent>,
}

/// Results of one pair task, tagged for deterministic aggregation
struct PairExecutionResult {
    pair_key: PairKey,
    delta: Delta,
    settlements: Vec<SettlementEntry>,
    orders: Vec<Order>,
    cancellations: Vec<Cancellation>,
    events: Vec<ModuleEvent>,
}

/// Invoke the contract's pre-execution sudo hooks: cancels, then placements
pub fn call_pre_execution_hooks<H: ContractHooks>(
    hooks: &H,
    contract: &ContractAddr,
    pairs: &[Pair],
    state: &BlockState,
) -> Result<(), ExecutionError> {
    hooks.bulk_cancellations(contract, pairs, state)?;
    hooks.bulk_order_placements(contract, pairs, state)?;
    Ok(())
}

/// Execute one (contract, pair)
///
/// Returns the merged settlement stream; the book and the store view carry
/// all other effects.
pub fn execute_pair(
    store: &mut dyn StoreWrite,
    state: &BlockState,
    timestamp: u64,
    contract: &ContractAddr,
    pair: &Pair,
    book: &mut OrderBook,
) -> Result<Vec<SettlementEntry>, StoreError> {
    let pair_key = pair.key();

    let cancels = state.cancels_snapshot(contract, &pair_key);
    cancel_orders(book, &cancels);

    let mut orders = state.orders_snapshot(contract, &pair_key);
    orders.sort_by_key(|order| order.id);
    let limit_buys: Vec<Order> = orders
        .iter()
        .filter(|o| o.order_type == OrderType::Limit && o.direction == PositionDirection::Long)
        .cloned()
        .collect();
    let limit_sells: Vec<Order> = orders
        .iter()
        .filter(|o| o.order_type == OrderType::Limit && o.direction == PositionDirection::Short)
        .cloned()
        .collect();
    add_outstanding_limit_orders_to_orderbook(book, pair, &limit_buys, &limit_sells);

    let mut market_buys = sorted_market_orders(&orders, PositionDirection::Long);
    let mut market_sells = sorted_market_orders(&orders, PositionDirection::Short);
    let buy_outcome = match_market_orders(book, pair, &mut market_buys, PositionDirection::Long);
    let sell_outcome = match_market_orders(book, pair, &mut market_sells, PositionDirection::Short);
    let market_outcome = buy_outcome.merge(sell_outcome);

    let limit_outcome = match_limit_orders(book, pair);
    let total = market_outcome.merge(limit_outcome);

    triggers::update_triggered_orders_for_pair(store, state, contract, &pair_key, &total)?;
    keeper::set_price_state_from_outcome(store, contract, &pair_key, timestamp, &total)?;
    keeper::flush_order_book(store, contract, &pair_key, book)?;

    Ok(total.settlements)
}

/// Fold a settlement stream into settled quantity per order id
pub fn order_id_to_settled_quantities(
    settlements: &[SettlementEntry],
) -> BTreeMap<u64, Decimal> {
    let mut settled: BTreeMap<u64, Decimal> = BTreeMap::new();
    for entry in settlements {
        *settled.entry(entry.order_id).or_default() += entry.quantity.as_decimal();
    }
    settled
}

/// Convert unfulfilled market orders into synthetic cancellations
///
/// Partially filled and fully unfilled market orders are treated alike:
/// both get a cancellation for the shortfall so clients can be refunded.
/// Fully unfilled ones are also dropped from the block order list. Returns
/// the cancelled order ids.
pub fn prepare_cancel_unfulfilled_market_orders(
    state: &BlockState,
    contract: &ContractAddr,
    pair: &PairKey,
    settled: &BTreeMap<u64, Decimal>,
) -> Vec<u64> {
    let mut cancelled = Vec::new();
    let orders = state.orders_snapshot(contract, pair);
    let mut kept = Vec::with_capacity(orders.len());

    for mut order in orders {
        if order.order_type != OrderType::Market {
            kept.push(order);
            continue;
        }
        let filled = settled.get(&order.id).copied().unwrap_or_default();
        let placed = order.quantity.as_decimal();
        if filled < placed {
            cancelled.push(order.id);
            state.add_cancel(contract, pair, Cancellation::new(&order));
        }
        if filled.is_zero() {
            continue;
        }
        order.remaining_quantity = Quantity::new(placed - filled);
        kept.push(order);
    }

    state.set_orders(contract, pair, kept);
    cancelled
}

/// Writable key prefixes for one (contract, pair) task
fn pair_whitelist(contract: &ContractAddr, pair: &Pair) -> Vec<Vec<u8>> {
    let pair_key = pair.key();
    vec![
        keys::price_state_prefix(contract, &pair_key),
        keys::long_book_prefix(contract, &pair_key),
        keys::short_book_prefix(contract, &pair_key),
        keys::triggered_order_prefix(contract, &pair.price_denom, &pair.asset_denom),
    ]
}

/// Run every registered pair of one contract in parallel
///
/// Each task owns a whitelisted branch of the frozen iteration view; task
/// results land in a mutex-guarded accumulator and are aggregated in pair
/// key order, so the output is independent of scheduling.
pub fn execute_pairs_in_parallel(
    base: &dyn StoreRead,
    state: &BlockState,
    timestamp: u64,
    contract: &ContractAddr,
    pairs: &[Pair],
    runner: &ParallelRunner,
) -> Result<ContractExecutionOutput, ExecutionError> {
    let accumulator: Mutex<Vec<PairExecutionResult>> = Mutex::new(Vec::new());
    let started = Instant::now();

    let task_results = runner.run(pairs.to_vec(), |pair| -> Result<(), StoreError> {
        let pair_key = pair.key();
        let mut view = WhitelistedStore::new(base, pair_whitelist(contract, &pair));

        triggers::move_triggered_orders_for_pair(&mut view, state, contract, &pair_key)?;
        let mut book = keeper::load_order_book(&view, contract, &pair_key)?;
        let settlements = execute_pair(&mut view, state, timestamp, contract, &pair, &mut book)?;

        let settled = order_id_to_settled_quantities(&settlements);
        let cancelled_ids =
            prepare_cancel_unfulfilled_market_orders(state, contract, &pair_key, &settled);

        let mut events: Vec<ModuleEvent> = settlements
            .iter()
            .map(|entry| ModuleEvent::Settlement {
                contract: contract.clone(),
                order_id: entry.order_id,
                account: entry.account.clone(),
                direction: entry.direction,
                price: entry.price,
                quantity: entry.quantity,
            })
            .collect();
        events.extend(cancelled_ids.into_iter().map(|order_id| {
            ModuleEvent::SyntheticCancel {
                contract: contract.clone(),
                order_id,
            }
        }));

        let result = PairExecutionResult {
            pair_key: pair_key.clone(),
            delta: view.into_delta(),
            settlements,
            orders: state.orders_snapshot(contract, &pair_key),
            cancellations: state.cancels_snapshot(contract, &pair_key),
            events,
        };
        if let Ok(mut accumulator) = accumulator.lock() {
            accumulator.push(result);
        }
        Ok(())
    });

    for task_result in task_results {
        match task_result {
            Ok(Ok(())) => {}
            Ok(Err(store_err)) => return Err(store_err.into()),
            Err(panic) => {
                return Err(ExecutionError::MatchingPanic {
                    contract: contract.as_str().to_string(),
                    message: panic.message,
                })
            }
        }
    }

    let mut results = accumulator.into_inner().unwrap_or_default();
    results.sort_by(|a, b| a.pair_key.cmp(&b.pair_key));

    let mut output = ContractExecutionOutput::default();
    for result in results {
        for (key, value) in result.delta {
            output.delta.insert(key, value);
        }
        output.settlements.extend(result.settlements);
        for order in &result.orders {
            output
                .order_results
                .entry(order.account.clone())
                .or_insert_with(|| AccountOrderResult {
                    account: order.account.clone(),
                    ..Default::default()
                })
                .orders
                .push(order.clone());
        }
        for cancel in &result.cancellations {
            output
                .order_results
                .entry(cancel.account.clone())
                .or_insert_with(|| AccountOrderResult {
                    account: cancel.account.clone(),
                    ..Default::default()
                })
                .cancellations
                .push(cancel.clone());
        }
        output.orders.extend(result.orders);
        output.cancellations.extend(result.cancellations);
        output.events.extend(result.events);
    }

    debug!(
        contract = %contract,
        pairs = pairs.len(),
        elapsed_us = started.elapsed().as_micros() as u64,
        "pair execution complete"
    );
    Ok(output)
}

/// Pre-execution hooks plus parallel pair matching for one contract
pub fn handle_execution_for_contract<H: ContractHooks>(
    base: &dyn StoreRead,
    state: &BlockState,
    timestamp: u64,
    hooks: &H,
    contract_info: &ContractInfo,
    runner: &ParallelRunner,
    metrics: &ExecutionMetrics,
) -> Result<ContractExecutionOutput, ExecutionError> {
    let started = Instant::now();
    let contract = &contract_info.contract_addr;
    let pairs = keeper::all_registered_pairs(base, contract)?;

    call_pre_execution_hooks(hooks, contract, &pairs, state)?;
    let output = execute_pairs_in_parallel(base, state, timestamp, contract, &pairs, runner)?;

    metrics.emit_settlement_metrics(&output.settlements);
    metrics.record_execution_duration(contract.as_str(), started.elapsed().as_millis());
    info!(
        contract = %contract,
        settlements = output.settlements.len(),
        "contract execution complete"
    );
    Ok(output)
}
