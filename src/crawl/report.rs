// src/crawl/report.rs
// =============================================================================
// Counters collected while the crawl runs, and the summary returned at the
// end.
//
// Workers and the aggregator bump relaxed atomics; nothing reads them until
// every task has been joined, so no stronger ordering is needed.
// =============================================================================

use crate::model::IdentityKey;
use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

#[derive(Debug, Default)]
pub(crate) struct CrawlStats {
    pub admitted: AtomicUsize,
    pub fetched: AtomicUsize,
    pub persisted: AtomicUsize,
    pub explored: AtomicUsize,
    pub fetch_failures: AtomicUsize,
    pub persist_failures: AtomicUsize,
    pub edges_recorded: AtomicUsize,
}

impl CrawlStats {
    pub fn bump(counter: &AtomicUsize) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add(counter: &AtomicUsize, n: usize) {
        counter.fetch_add(n, Ordering::Relaxed);
    }

    pub fn report(&self, root: IdentityKey, max_depth: usize, workers: usize, elapsed: Duration) -> CrawlReport {
        let get = |c: &AtomicUsize| c.load(Ordering::Relaxed);
        CrawlReport {
            root,
            max_depth,
            workers,
            admitted: get(&self.admitted),
            fetched: get(&self.fetched),
            persisted: get(&self.persisted),
            explored: get(&self.explored),
            fetch_failures: get(&self.fetch_failures),
            persist_failures: get(&self.persist_failures),
            edges_recorded: get(&self.edges_recorded),
            elapsed_ms: elapsed.as_millis() as u64,
        }
    }
}

/// Summary of one finished crawl.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrawlReport {
    pub root: IdentityKey,
    pub max_depth: usize,
    pub workers: usize,
    /// Identities admitted to the frontier (including the root).
    pub admitted: usize,
    /// Profiles fetched successfully.
    pub fetched: usize,
    /// Identities stored by the persistence sink.
    pub persisted: usize,
    /// Identities whose follow list was fetched.
    pub explored: usize,
    /// Profile or follow-list fetches that failed.
    pub fetch_failures: usize,
    /// Identity or edge writes that failed.
    pub persist_failures: usize,
    /// Follow edges handed to the sink successfully.
    pub edges_recorded: usize,
    pub elapsed_ms: u64,
}

impl CrawlReport {
    /// True when the root itself could not be fetched or stored.
    pub fn root_failed(&self) -> bool {
        self.persisted == 0
    }
}
