//! Typed access to the persistent store
//!
//! Thin serde_json codecs over the key layout in [`crate::store::keys`].
//! Every function takes an explicit store view so the same code runs against
//! the canonical store, an iteration branch, or a whitelisted per-pair view.

use crate::store::keys;
use crate::store::{StoreRead, StoreWrite};
use matching_engine::book::{OrderBook, RestingOrder};
use matching_engine::outcome::ExecutionOutcome;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use types::errors::StoreError;
use types::ids::ContractAddr;
use types::numeric::{Price, Quantity};
use types::order::{Order, PositionDirection};
use types::pair::{Pair, PairKey};
use types::settlement::MatchResult;
use types::contract::ContractInfo;

/// Module parameters, stored under `dex/params`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DexParams {
    /// Seconds of price snapshots to keep
    pub price_snapshot_retention: u64,
    /// Seconds per epoch
    pub epoch_duration: u64,
}

impl Default for DexParams {
    fn default() -> Self {
        Self {
            price_snapshot_retention: 24 * 3600,
            epoch_duration: 3600,
        }
    }
}

/// Last-trade snapshot for one pair at one block timestamp
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSnapshot {
    pub timestamp: u64,
    pub last_price: Price,
    pub volume: Quantity,
}

/// One persisted ladder level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct BookLevel {
    price: Price,
    orders: Vec<RestingOrder>,
}

fn encode<T: Serialize>(key: &[u8], value: &T) -> Result<Vec<u8>, StoreError> {
    serde_json::to_vec(value).map_err(|err| StoreError::Codec {
        key: String::from_utf8_lossy(key).into_owned(),
        reason: err.to_string(),
    })
}

fn decode<T: DeserializeOwned>(key: &[u8], bytes: &[u8]) -> Result<T, StoreError> {
    serde_json::from_slice(bytes).map_err(|err| StoreError::Codec {
        key: String::from_utf8_lossy(key).into_owned(),
        reason: err.to_string(),
    })
}

// ── Params and epoch ────────────────────────────────────────────────

pub fn params(store: &dyn StoreRead) -> Result<DexParams, StoreError> {
    let key = keys::params_key();
    match store.get(&key) {
        Some(bytes) => decode(&key, &bytes),
        None => Ok(DexParams::default()),
    }
}

pub fn set_params(store: &mut dyn StoreWrite, value: &DexParams) -> Result<(), StoreError> {
    let key = keys::params_key();
    let bytes = encode(&key, value)?;
    store.set(key, bytes)
}

pub fn epoch(store: &dyn StoreRead) -> Result<u64, StoreError> {
    let key = keys::epoch_key();
    match store.get(&key) {
        Some(bytes) => decode(&key, &bytes),
        None => Ok(0),
    }
}

pub fn set_epoch(store: &mut dyn StoreWrite, value: u64) -> Result<(), StoreError> {
    let key = keys::epoch_key();
    let bytes = encode(&key, &value)?;
    store.set(key, bytes)
}

/// Epoch the block timestamp falls in, and whether it is new
pub fn is_new_epoch(
    store: &dyn StoreRead,
    params: &DexParams,
    timestamp: u64,
) -> Result<(bool, u64), StoreError> {
    let duration = params.epoch_duration.max(1);
    let current = timestamp / duration;
    Ok((current > epoch(store)?, current))
}

// ── Contract registry ───────────────────────────────────────────────

/// Every registered contract, ascending by address
pub fn all_contracts(store: &dyn StoreRead) -> Result<Vec<ContractInfo>, StoreError> {
    store
        .scan_prefix(&keys::contracts_prefix())
        .into_iter()
        .map(|(key, bytes)| decode(&key, &bytes))
        .collect()
}

pub fn register_contract(store: &mut dyn StoreWrite, info: &ContractInfo) -> Result<(), StoreError> {
    let key = keys::contract_key(&info.contract_addr);
    let bytes = encode(&key, info)?;
    store.set(key, bytes)
}

// ── Pair registry ───────────────────────────────────────────────────

/// Every pair registered by `contract`, ascending by pair key
pub fn all_registered_pairs(
    store: &dyn StoreRead,
    contract: &ContractAddr,
) -> Result<Vec<Pair>, StoreError> {
    store
        .scan_prefix(&keys::pairs_prefix(contract))
        .into_iter()
        .map(|(key, bytes)| decode(&key, &bytes))
        .collect()
}

pub fn register_pair(
    store: &mut dyn StoreWrite,
    contract: &ContractAddr,
    pair: &Pair,
) -> Result<(), StoreError> {
    let key = keys::pair_key(contract, &pair.key());
    let bytes = encode(&key, pair)?;
    store.set(key, bytes)
}

// ── Order-book persistence ──────────────────────────────────────────

/// Rebuild the resting book for one pair from storage
///
/// Ladders are scanned in ascending key (price) order; arrival seniority is
/// reassigned on load, which is sound because a flushed book is never
/// crossed and every restored order predates any block order.
pub fn load_order_book(
    store: &dyn StoreRead,
    contract: &ContractAddr,
    pair: &PairKey,
) -> Result<OrderBook, StoreError> {
    let mut book = OrderBook::new();
    for (key, bytes) in store.scan_prefix(&keys::long_book_prefix(contract, pair)) {
        let level: BookLevel = decode(&key, &bytes)?;
        for order in level.orders {
            book.insert_limit(
                PositionDirection::Long,
                level.price,
                order.id,
                &order.account,
                order.remaining_quantity,
            );
        }
    }
    for (key, bytes) in store.scan_prefix(&keys::short_book_prefix(contract, pair)) {
        let level: BookLevel = decode(&key, &bytes)?;
        for order in level.orders {
            book.insert_limit(
                PositionDirection::Short,
                level.price,
                order.id,
                &order.account,
                order.remaining_quantity,
            );
        }
    }
    Ok(book)
}

/// Persist the mutated ladders for one pair
pub fn flush_order_book(
    store: &mut dyn StoreWrite,
    contract: &ContractAddr,
    pair: &PairKey,
    book: &OrderBook,
) -> Result<(), StoreError> {
    for prefix in [
        keys::long_book_prefix(contract, pair),
        keys::short_book_prefix(contract, pair),
    ] {
        for (key, _) in store.scan_prefix(&prefix) {
            store.delete(key)?;
        }
    }
    for (price, level) in book.longs.iter() {
        let key = keys::long_book_key(contract, pair, *price);
        let value = BookLevel {
            price: *price,
            orders: level.iter().cloned().collect(),
        };
        let bytes = encode(&key, &value)?;
        store.set(key, bytes)?;
    }
    for (price, level) in book.shorts.iter() {
        let key = keys::short_book_key(contract, pair, *price);
        let value = BookLevel {
            price: *price,
            orders: level.iter().cloned().collect(),
        };
        let bytes = encode(&key, &value)?;
        store.set(key, bytes)?;
    }
    Ok(())
}

// ── Price state ─────────────────────────────────────────────────────

/// Record the pair's realized price for this block
///
/// The last settlement in the merged stream sets `last_price`; volume is the
/// single-counted traded quantity (each consumption produces two entries).
pub fn set_price_state_from_outcome(
    store: &mut dyn StoreWrite,
    contract: &ContractAddr,
    pair: &PairKey,
    timestamp: u64,
    outcome: &ExecutionOutcome,
) -> Result<(), StoreError> {
    let Some(last) = outcome.settlements.last() else {
        return Ok(());
    };
    let total: Decimal = outcome
        .settlements
        .iter()
        .map(|entry| entry.quantity.as_decimal())
        .sum();
    let snapshot = PriceSnapshot {
        timestamp,
        last_price: last.price,
        volume: Quantity::new(total / Decimal::TWO),
    };
    let key = keys::price_state_key(contract, pair, timestamp);
    let bytes = encode(&key, &snapshot)?;
    store.set(key, bytes)
}

/// All price snapshots for a pair, ascending by timestamp
pub fn price_snapshots(
    store: &dyn StoreRead,
    contract: &ContractAddr,
    pair: &PairKey,
) -> Result<Vec<PriceSnapshot>, StoreError> {
    store
        .scan_prefix(&keys::price_state_prefix(contract, pair))
        .into_iter()
        .map(|(key, bytes)| decode(&key, &bytes))
        .collect()
}

/// Prune price snapshots older than `cutoff`
pub fn delete_price_states_before(
    store: &mut dyn StoreWrite,
    contract: &ContractAddr,
    pair: &PairKey,
    cutoff: u64,
) -> Result<(), StoreError> {
    for (key, bytes) in store.scan_prefix(&keys::price_state_prefix(contract, pair)) {
        let snapshot: PriceSnapshot = decode(&key, &bytes)?;
        if snapshot.timestamp < cutoff {
            store.delete(key)?;
        }
    }
    Ok(())
}

// ── Triggered orders ────────────────────────────────────────────────

/// All persistent stop orders for a pair, ascending by order id
pub fn all_triggered_orders_for_pair(
    store: &dyn StoreRead,
    contract: &ContractAddr,
    price_denom: &str,
    asset_denom: &str,
) -> Result<Vec<Order>, StoreError> {
    store
        .scan_prefix(&keys::triggered_order_prefix(contract, price_denom, asset_denom))
        .into_iter()
        .map(|(key, bytes)| decode(&key, &bytes))
        .collect()
}

pub fn set_triggered_order(
    store: &mut dyn StoreWrite,
    contract: &ContractAddr,
    order: &Order,
) -> Result<(), StoreError> {
    let key = keys::triggered_order_key(contract, &order.price_denom, &order.asset_denom, order.id);
    let bytes = encode(&key, order)?;
    store.set(key, bytes)
}

pub fn remove_triggered_order(
    store: &mut dyn StoreWrite,
    contract: &ContractAddr,
    price_denom: &str,
    asset_denom: &str,
    order_id: u64,
) -> Result<(), StoreError> {
    store.delete(keys::triggered_order_key(
        contract,
        price_denom,
        asset_denom,
        order_id,
    ))
}

// ── Match results ───────────────────────────────────────────────────

pub fn set_match_result(
    store: &mut dyn StoreWrite,
    contract: &ContractAddr,
    result: &MatchResult,
) -> Result<(), StoreError> {
    let key = keys::match_result_key(contract);
    let bytes = encode(&key, result)?;
    store.set(key, bytes)
}

pub fn match_result(
    store: &dyn StoreRead,
    contract: &ContractAddr,
) -> Result<Option<MatchResult>, StoreError> {
    let key = keys::match_result_key(contract);
    store.get(&key).map(|bytes| decode(&key, &bytes)).transpose()
}
