// src/crawl/tracker.rs
// =============================================================================
// Completion tracker: how many work items still owe a completion signal.
//
// - +1 when the coordinator seeds the root
// - +1 by the edge aggregator for every identity it newly admits
// - -1 once an item is completely finished
//
// Each +1 hands out an `Outstanding` guard that travels with the work item
// and gives the -1 back when dropped. The count is therefore exactly the
// number of live guards, and an item can't be forgotten on an early return
// or a panic.
//
// The crawl is over exactly when the count returns to zero. Only one task
// (the coordinator) ever waits for that.
//
// Rust concepts:
// - AtomicUsize: a counter many tasks can update without a lock
// - Drop: runs when a value goes out of scope, even while unwinding
// - tokio::sync::Notify: wakes the waiting coordinator. notify_one stores a
//   permit when nobody is waiting yet, so a wake-up can't be lost between
//   the coordinator's check and its await.
// =============================================================================

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

#[derive(Debug, Default)]
pub struct CompletionTracker {
    outstanding: AtomicUsize,
    drained: Notify,
}

impl CompletionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one more outstanding item; dropping the guard finishes it.
    pub fn begin(self: &Arc<Self>) -> Outstanding {
        self.increment();
        Outstanding {
            tracker: Arc::clone(self),
        }
    }

    pub fn increment(&self) {
        self.outstanding.fetch_add(1, Ordering::AcqRel);
    }

    /// Marks one item finished and wakes the coordinator if it was the last.
    pub fn decrement(&self) {
        let previous = self.outstanding.fetch_sub(1, Ordering::AcqRel);
        debug_assert!(previous > 0, "completion tracker decremented below zero");
        if previous == 1 {
            self.drained.notify_one();
        }
    }

    pub fn outstanding(&self) -> usize {
        self.outstanding.load(Ordering::Acquire)
    }

    /// Waits until the count reaches zero.
    pub async fn wait_zero(&self) {
        loop {
            if self.outstanding() == 0 {
                return;
            }
            self.drained.notified().await;
        }
    }
}

/// Proof that one work item is still owed a completion signal.
#[must_use = "dropping the guard immediately marks the item finished"]
pub struct Outstanding {
    tracker: Arc<CompletionTracker>,
}

impl fmt::Debug for Outstanding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Outstanding")
    }
}

impl Drop for Outstanding {
    fn drop(&mut self) {
        self.tracker.decrement();
    }
}
