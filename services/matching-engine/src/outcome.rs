//! Execution outcome of one matching run
//!
//! Settlements plus the realized price range, merged across market and limit
//! phases and consumed by trigger activation and price-state snapshots.

use rust_decimal::Decimal;
use types::numeric::Price;
use types::settlement::SettlementEntry;

/// Result of one matching run over a pair
///
/// `min_price`/`max_price` span every trade price observed in the run; with
/// no trades they hold the `Decimal::MAX`/`Decimal::MIN` sentinels so that
/// merging stays a monoid and trigger comparisons are vacuously false.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionOutcome {
    pub settlements: Vec<SettlementEntry>,
    pub min_price: Decimal,
    pub max_price: Decimal,
}

impl Default for ExecutionOutcome {
    fn default() -> Self {
        Self::empty()
    }
}

impl ExecutionOutcome {
    /// The identity outcome: no settlements, sentinel bounds
    pub fn empty() -> Self {
        Self {
            settlements: Vec::new(),
            min_price: Decimal::MAX,
            max_price: Decimal::MIN,
        }
    }

    /// Whether any trade happened
    pub fn has_trades(&self) -> bool {
        !self.settlements.is_empty()
    }

    /// Record one consumption: both settlement entries and the trade price
    pub fn record(&mut self, taker: SettlementEntry, maker: SettlementEntry, price: Price) {
        self.settlements.push(taker);
        self.settlements.push(maker);
        let p = price.as_decimal();
        if p < self.min_price {
            self.min_price = p;
        }
        if p > self.max_price {
            self.max_price = p;
        }
    }

    /// Monoid merge: concatenate settlements, widen bounds
    pub fn merge(mut self, other: ExecutionOutcome) -> Self {
        self.settlements.extend(other.settlements);
        self.min_price = self.min_price.min(other.min_price);
        self.max_price = self.max_price.max(other.max_price);
        self
    }
}
