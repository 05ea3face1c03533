//! Block executor
//!
//! Drives per-block order matching for every registered trading contract:
//! trigger propagation, per-pair execution over isolated store views,
//! per-contract coordination, and a block-level commit loop that excludes
//! failing contracts and retries with the survivors.
//!
//! **Key invariants:**
//! - Contract-level atomicity: a contract's writes either commit together or
//!   are discarded together
//! - Deterministic replay: committed state is independent of scheduler
//!   timing and worker count
//! - In-memory block state never outlives its block

pub mod block;
pub mod context;
pub mod events;
pub mod execution;
pub mod hooks;
pub mod keeper;
pub mod memstate;
pub mod runner;
pub mod store;
pub mod telemetry;
pub mod triggers;

pub use block::{begin_block, end_block};
pub use context::BlockContext;
pub use memstate::BlockState;
pub use runner::ParallelRunner;
