//! Store key layout
//!
//! All keys are `/`-joined UTF-8 segments under a `dex` root. Numeric
//! segments are zero-padded to fixed width so lexicographic key order
//! matches numeric order.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use types::ids::ContractAddr;
use types::numeric::Price;
use types::pair::PairKey;

const ROOT: &str = "dex";

/// Fractional resolution of price key segments
const PRICE_KEY_SCALE: u64 = 1_000_000_000;

pub fn params_key() -> Vec<u8> {
    format!("{ROOT}/params").into_bytes()
}

pub fn epoch_key() -> Vec<u8> {
    format!("{ROOT}/epoch").into_bytes()
}

pub fn contracts_prefix() -> Vec<u8> {
    format!("{ROOT}/contracts/").into_bytes()
}

pub fn contract_key(contract: &ContractAddr) -> Vec<u8> {
    format!("{ROOT}/contracts/{contract}").into_bytes()
}

pub fn pairs_prefix(contract: &ContractAddr) -> Vec<u8> {
    format!("{ROOT}/pairs/{contract}/").into_bytes()
}

pub fn pair_key(contract: &ContractAddr, pair: &PairKey) -> Vec<u8> {
    format!("{ROOT}/pairs/{contract}/{pair}").into_bytes()
}

pub fn long_book_prefix(contract: &ContractAddr, pair: &PairKey) -> Vec<u8> {
    format!("{ROOT}/long_book/{contract}/{pair}/").into_bytes()
}

pub fn short_book_prefix(contract: &ContractAddr, pair: &PairKey) -> Vec<u8> {
    format!("{ROOT}/short_book/{contract}/{pair}/").into_bytes()
}

pub fn long_book_key(contract: &ContractAddr, pair: &PairKey, price: Price) -> Vec<u8> {
    let mut key = long_book_prefix(contract, pair);
    key.extend_from_slice(encode_price(price).as_bytes());
    key
}

pub fn short_book_key(contract: &ContractAddr, pair: &PairKey, price: Price) -> Vec<u8> {
    let mut key = short_book_prefix(contract, pair);
    key.extend_from_slice(encode_price(price).as_bytes());
    key
}

pub fn price_state_prefix(contract: &ContractAddr, pair: &PairKey) -> Vec<u8> {
    format!("{ROOT}/price/{contract}/{pair}/").into_bytes()
}

pub fn price_state_key(contract: &ContractAddr, pair: &PairKey, timestamp: u64) -> Vec<u8> {
    format!("{ROOT}/price/{contract}/{pair}/{timestamp:020}").into_bytes()
}

pub fn triggered_order_prefix(
    contract: &ContractAddr,
    price_denom: &str,
    asset_denom: &str,
) -> Vec<u8> {
    format!("{ROOT}/trigger/{contract}/{price_denom}/{asset_denom}/").into_bytes()
}

pub fn triggered_order_key(
    contract: &ContractAddr,
    price_denom: &str,
    asset_denom: &str,
    order_id: u64,
) -> Vec<u8> {
    format!("{ROOT}/trigger/{contract}/{price_denom}/{asset_denom}/{order_id:020}").into_bytes()
}

pub fn match_result_key(contract: &ContractAddr) -> Vec<u8> {
    format!("{ROOT}/match_result/{contract}").into_bytes()
}

/// Fixed-width sortable encoding of a non-negative price
fn encode_price(price: Price) -> String {
    let scaled = (price.as_decimal() * Decimal::from(PRICE_KEY_SCALE)).trunc();
    format!("{:039}", scaled.to_u128().unwrap_or(0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_encoding_sorts_numerically() {
        let low = encode_price(Price::from_str("9.5").unwrap());
        let high = encode_price(Price::from_u64(10));
        assert!(low < high);
        assert_eq!(low.len(), high.len());
    }

    #[test]
    fn test_timestamp_keys_sort_numerically() {
        let contract = ContractAddr::new("c1");
        let pair = types::pair::Pair::untick("usdc", "atom").key();
        let early = price_state_key(&contract, &pair, 999);
        let late = price_state_key(&contract, &pair, 1_000);
        assert!(early < late);
    }

    #[test]
    fn test_book_keys_are_pair_scoped() {
        let contract = ContractAddr::new("c1");
        let pair = types::pair::Pair::untick("usdc", "atom").key();
        let key = long_book_key(&contract, &pair, Price::from_u64(100));
        assert!(key.starts_with(&long_book_prefix(&contract, &pair)));
    }
}
