//! Bounded parallel task runner
//!
//! Structured fan-out over scoped threads: the caller blocks until every
//! task finishes, results come back in input order, and a panicking task is
//! contained and reported instead of unwinding through the runner.

use std::collections::VecDeque;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Mutex;
use std::thread;

/// A panic captured at a task boundary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskPanic {
    pub message: String,
}

/// Thread-pool-backed task group with a fixed worker count
#[derive(Debug, Clone, Copy)]
pub struct ParallelRunner {
    workers: usize,
}

impl ParallelRunner {
    /// Runner with an explicit worker count (at least one)
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
        }
    }

    /// Runner sized to the host's hardware parallelism
    pub fn with_default_parallelism() -> Self {
        let workers = thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        Self::new(workers)
    }

    /// Configured worker count
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Run `task` over every item, returning results in input order
    ///
    /// Tasks run on at most `workers` threads. A panic in one task becomes
    /// `Err(TaskPanic)` for that slot and does not affect the others.
    pub fn run<T, R, F>(&self, items: Vec<T>, task: F) -> Vec<Result<R, TaskPanic>>
    where
        T: Send,
        R: Send,
        F: Fn(T) -> R + Sync,
    {
        if items.is_empty() {
            return Vec::new();
        }

        let queue: Mutex<VecDeque<(usize, T)>> = Mutex::new(items.into_iter().enumerate().collect());
        let slots: Mutex<Vec<Option<Result<R, TaskPanic>>>> = {
            let len = queue.lock().map(|q| q.len()).unwrap_or(0);
            Mutex::new((0..len).map(|_| None).collect())
        };
        let task = &task;

        thread::scope(|scope| {
            let thread_count = {
                let len = queue.lock().map(|q| q.len()).unwrap_or(0);
                self.workers.min(len)
            };
            for _ in 0..thread_count {
                scope.spawn(|| loop {
                    let next = queue.lock().ok().and_then(|mut q| q.pop_front());
                    let Some((index, item)) = next else {
                        break;
                    };
                    let result = catch_unwind(AssertUnwindSafe(|| task(item)))
                        .map_err(|payload| TaskPanic {
                            message: panic_message(payload.as_ref()),
                        });
                    if let Ok(mut slots) = slots.lock() {
                        slots[index] = Some(result);
                    }
                });
            }
        });

        slots
            .into_inner()
            .unwrap_or_default()
            .into_iter()
            .map(|slot| {
                slot.unwrap_or(Err(TaskPanic {
                    message: "task result missing".to_string(),
                }))
            })
            .collect()
    }
}

impl Default for ParallelRunner {
    fn default() -> Self {
        Self::with_default_parallelism()
    }
}

pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
