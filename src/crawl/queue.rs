// src/crawl/queue.rs
// =============================================================================
// The two hand-off channels of the crawl and the items that travel on them.
//
//   frontier: WorkItem  - seed/aggregator  ->  workers     (many consumers)
//   results:  EdgeBatch - workers          ->  aggregator  (one consumer)
//
// Both are bounded tokio mpsc channels: a producer waits for room instead of
// dropping work. tokio's mpsc has a single receiver, so the workers share
// the frontier receiver behind an async Mutex and take turns pulling.
//
// Every WorkItem carries the `Outstanding` guard that counts it in the
// completion tracker. A worker that produces edges moves the guard into the
// EdgeBatch, so the item only counts as finished once the aggregator has
// admitted (and counted) all of its children.
// =============================================================================

use super::tracker::Outstanding;
use crate::model::IdentityKey;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};

/// One identity waiting to be crawled.
#[derive(Debug)]
pub struct WorkItem {
    pub key: IdentityKey,
    /// Follow-hops from the root.
    pub depth: usize,
    pub(crate) pending: Outstanding,
}

impl WorkItem {
    pub(crate) fn new(key: IdentityKey, depth: usize, pending: Outstanding) -> Self {
        Self { key, depth, pending }
    }
}

/// The follow list of one crawled identity, on its way to the aggregator.
#[derive(Debug)]
pub struct EdgeBatch {
    pub source_id: i64,
    pub parent_depth: usize,
    pub targets: Vec<IdentityKey>,
    pub(crate) pending: Outstanding,
}

/// Receiving side of the frontier, shared by all workers.
#[derive(Clone)]
pub struct Frontier {
    rx: Arc<Mutex<mpsc::Receiver<WorkItem>>>,
}

impl Frontier {
    pub fn channel(capacity: usize) -> (mpsc::Sender<WorkItem>, Frontier) {
        let (tx, rx) = mpsc::channel(capacity);
        (
            tx,
            Frontier {
                rx: Arc::new(Mutex::new(rx)),
            },
        )
    }

    /// Next item, or None once the frontier is closed and drained.
    pub async fn next(&self) -> Option<WorkItem> {
        self.rx.lock().await.recv().await
    }
}

pub fn results_channel(capacity: usize) -> (mpsc::Sender<EdgeBatch>, mpsc::Receiver<EdgeBatch>) {
    mpsc::channel(capacity)
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why a bounded channel?
//    - mpsc::channel(capacity) holds at most `capacity` items
//    - send().await waits when it is full instead of growing forever
//    - A fast-growing graph then slows the aggregator down (backpressure)
//
// 2. Why is the receiver inside Arc<Mutex<...>>?
//    - tokio's mpsc allows many senders but only one receiver
//    - Arc lets every worker own a handle to the same receiver
//    - The async Mutex makes workers take turns; the lock is released as
//      soon as one item has been received
//
// 3. When does next() return None?
//    - Only after every Sender is dropped AND the buffered items are gone
//    - That is how workers learn the crawl is over
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawl::tracker::CompletionTracker;

    #[tokio::test]
    async fn test_frontier_is_fifo_and_closes() {
        let tracker = Arc::new(CompletionTracker::new());
        let (tx, frontier) = Frontier::channel(4);

        for (i, name) in ["a", "b", "c"].iter().enumerate() {
            tx.send(WorkItem::new(IdentityKey::from(*name), i, tracker.begin()))
                .await
                .unwrap();
        }
        drop(tx);

        let mut seen = Vec::new();
        while let Some(item) = frontier.next().await {
            seen.push((item.key.to_string(), item.depth));
        }
        assert_eq!(
            seen,
            vec![("a".to_string(), 0), ("b".to_string(), 1), ("c".to_string(), 2)]
        );
        // Every item was dropped after being pulled.
        assert_eq!(tracker.outstanding(), 0);
    }

    #[tokio::test]
    async fn test_shared_frontier_hands_each_item_out_once() {
        let tracker = Arc::new(CompletionTracker::new());
        let (tx, frontier) = Frontier::channel(64);
        for i in 0..50 {
            tx.send(WorkItem::new(IdentityKey::new(format!("u{i}")), 0, tracker.begin()))
                .await
                .unwrap();
        }
        drop(tx);

        let mut handles = Vec::new();
        for _ in 0..4 {
            let frontier = frontier.clone();
            handles.push(tokio::spawn(async move {
                let mut keys = Vec::new();
                while let Some(item) = frontier.next().await {
                    keys.push(item.key);
                }
                keys
            }));
        }

        let mut all = Vec::new();
        for handle in handles {
            all.extend(handle.await.unwrap());
        }
        all.sort();
        all.dedup();
        assert_eq!(all.len(), 50);
    }
}
