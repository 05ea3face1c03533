//! Block-scoped execution context
//!
//! Created at block start and threaded explicitly through every entry point
//! so there is no process-wide mutable state; the in-memory block state
//! lives here and dies with the block.

use crate::events::ModuleEvent;
use crate::memstate::BlockState;

/// Everything block-scoped: height, timestamp, staged state, and the
/// non-consensus event sink
pub struct BlockContext {
    pub height: u64,
    /// Block time as unix seconds
    pub timestamp: u64,
    pub state: BlockState,
    events: Vec<ModuleEvent>,
}

impl BlockContext {
    /// Start a context for one block
    pub fn new(height: u64, timestamp: u64) -> Self {
        Self {
            height,
            timestamp,
            state: BlockState::new(),
            events: Vec::new(),
        }
    }

    /// Append events collected by a pair task
    ///
    /// Event order is not consensus-bearing.
    pub fn emit_events(&mut self, events: Vec<ModuleEvent>) {
        self.events.extend(events);
    }

    /// Events emitted so far this block
    pub fn events(&self) -> &[ModuleEvent] {
        &self.events
    }
}
