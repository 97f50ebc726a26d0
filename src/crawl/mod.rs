// src/crawl/mod.rs
// =============================================================================
// This module walks the follow graph.
//
// Features:
// - Breadth-first crawl starting from one root handle
// - Configurable depth limit and number of parallel workers
// - Each identity is fetched at most once per run (visited set)
// - Deterministic termination via a completion counter, not "queue empty"
//
// Submodules:
// - visited: concurrent set of admitted handles
// - tracker: counts items that are still being worked on
// - queue: the frontier and result channels and their items
// - engine: the coordinator, workers and edge aggregator
// - report: counters and the summary returned to the caller
// =============================================================================

mod engine;
mod queue;
mod report;
mod tracker;
mod visited;

pub use engine::{
    run, CrawlConfig, Crawler, DEFAULT_FRONTIER_CAPACITY, DEFAULT_RESULT_CAPACITY, DEFAULT_WORKERS,
};
pub use queue::{EdgeBatch, WorkItem};
pub use report::CrawlReport;
pub use tracker::{CompletionTracker, Outstanding};
pub use visited::VisitedSet;
