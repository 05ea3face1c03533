//! Trading-pair identity and tick sizes
//!
//! A pair is identified by its `(price_denom, asset_denom)` tuple. The
//! canonical string encoding is used as a map key across the in-memory block
//! state and the persistent store.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Separator between the two denoms in a pair key
const PAIR_KEY_SEPARATOR: char = '|';

/// A tradeable market registered by a contract
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pair {
    pub price_denom: String,
    pub asset_denom: String,
    /// Minimum price increment; zero disables rounding
    pub price_tick_size: Decimal,
    /// Minimum quantity increment; zero disables rounding
    pub quantity_tick_size: Decimal,
}

impl Pair {
    /// Create a pair with explicit tick sizes
    pub fn new(
        price_denom: impl Into<String>,
        asset_denom: impl Into<String>,
        price_tick_size: Decimal,
        quantity_tick_size: Decimal,
    ) -> Self {
        Self {
            price_denom: price_denom.into(),
            asset_denom: asset_denom.into(),
            price_tick_size,
            quantity_tick_size,
        }
    }

    /// Create a pair with no tick constraints (test convenience)
    pub fn untick(price_denom: impl Into<String>, asset_denom: impl Into<String>) -> Self {
        Self::new(price_denom, asset_denom, Decimal::ZERO, Decimal::ZERO)
    }

    /// Canonical string key: `price_denom|asset_denom`
    pub fn key(&self) -> PairKey {
        PairKey(format!(
            "{}{}{}",
            self.price_denom, PAIR_KEY_SEPARATOR, self.asset_denom
        ))
    }
}

impl fmt::Display for Pair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.price_denom, PAIR_KEY_SEPARATOR, self.asset_denom)
    }
}

/// Canonical pair key used for map lookups and store key segments
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PairKey(String);

impl PairKey {
    /// Get the key string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Split the key back into `(price_denom, asset_denom)`
    ///
    /// Returns None if the key is malformed.
    pub fn split(&self) -> Option<(&str, &str)> {
        self.0.split_once(PAIR_KEY_SEPARATOR)
    }
}

impl fmt::Display for PairKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
