//! Types library for the per-block order-matching module
//!
//! Provides all core type definitions shared by the matching engine and the
//! block executor, ensuring type safety and deterministic behavior.
//!
//! # Modules
//! - `ids`: Contract address newtype and id conventions
//! - `numeric`: Fixed-point decimal types (Price, Quantity)
//! - `pair`: Trading-pair identity and tick sizes
//! - `order`: Order, cancellation, and direction types
//! - `settlement`: Settlement entries and per-contract match results
//! - `contract`: Registered-contract metadata
//! - `errors`: Error taxonomy

pub mod contract;
pub mod errors;
pub mod ids;
pub mod numeric;
pub mod order;
pub mod pair;
pub mod settlement;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::contract::*;
    pub use crate::errors::*;
    pub use crate::ids::*;
    pub use crate::numeric::*;
    pub use crate::order::*;
    pub use crate::pair::*;
    pub use crate::settlement::*;
}
