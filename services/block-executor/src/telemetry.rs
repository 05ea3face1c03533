//! Execution metrics
//!
//! In-process counters and gauges for Prometheus-style scraping. None of
//! this is consensus-bearing; label maps are ordered only so that dumps are
//! stable for operators.

use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use types::settlement::SettlementEntry;

/// Metrics for block execution
#[derive(Debug, Default)]
pub struct ExecutionMetrics {
    /// Settlements produced by the most recent block
    pub num_settlements: AtomicU64,
    /// Labeled counters, e.g. `num_settlements_order_type_limit`
    labeled: Mutex<BTreeMap<String, u64>>,
    /// Total order quantity across the most recent block's settlements
    total_quantity: Mutex<Decimal>,
    /// Wall-clock per-contract execution time, most recent block
    execution_ms: Mutex<BTreeMap<String, u128>>,
    pub begin_block_panics: AtomicU64,
    pub end_block_panics: AtomicU64,
}

impl ExecutionMetrics {
    /// Create a zeroed registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the settlement stream of one contract
    pub fn emit_settlement_metrics(&self, settlements: &[SettlementEntry]) {
        if settlements.is_empty() {
            return;
        }
        self.num_settlements
            .fetch_add(settlements.len() as u64, Ordering::Relaxed);

        let mut total = Decimal::ZERO;
        if let Ok(mut labeled) = self.labeled.lock() {
            for entry in settlements {
                total += entry.quantity.as_decimal();
                for name in [
                    format!("num_settlements_order_type_{}", entry.order_type.label()),
                    format!(
                        "num_settlements_position_direction_{}",
                        entry.direction.label()
                    ),
                    format!("num_settlements_asset_denom_{}", entry.asset_denom),
                    format!("num_settlements_price_denom_{}", entry.price_denom),
                ] {
                    *labeled.entry(name).or_insert(0) += 1;
                }
            }
        }
        if let Ok(mut gauge) = self.total_quantity.lock() {
            *gauge += total;
        }
    }

    /// Record a panic caught at the block-start boundary
    pub fn record_begin_block_panic(&self, error: &str) {
        self.begin_block_panics.fetch_add(1, Ordering::Relaxed);
        self.incr_labeled(format!("dexbeginblockpanic_error_{error}"));
    }

    /// Record a panic caught at the block-end boundary
    ///
    /// `contract` is present when the panic was isolated to one contract's
    /// matching task.
    pub fn record_end_block_panic(&self, error: &str, contract: Option<&str>) {
        self.end_block_panics.fetch_add(1, Ordering::Relaxed);
        match contract {
            Some(contract) => {
                self.incr_labeled(format!("dexendblockpanic_error_{error}_contract_{contract}"))
            }
            None => self.incr_labeled(format!("dexendblockpanic_error_{error}")),
        }
    }

    /// Record how long one contract's matching took
    pub fn record_execution_duration(&self, contract: &str, millis: u128) {
        if let Ok(mut timings) = self.execution_ms.lock() {
            timings.insert(
                format!("handle_execution_for_contract_ms_{contract}"),
                millis,
            );
        }
    }

    /// Current value of a labeled counter
    pub fn labeled_counter(&self, name: &str) -> u64 {
        self.labeled
            .lock()
            .map(|labeled| labeled.get(name).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    /// Total settled quantity gauge
    pub fn total_quantity(&self) -> Decimal {
        self.total_quantity
            .lock()
            .map(|gauge| *gauge)
            .unwrap_or(Decimal::ZERO)
    }

    fn incr_labeled(&self, name: String) {
        if let Ok(mut labeled) = self.labeled.lock() {
            *labeled.entry(name).or_insert(0) += 1;
        }
    }
}
