// src/crawl/engine.rs
// =============================================================================
// The concurrent breadth-first crawl.
//
// Tasks:
// - coordinator (the caller of `Crawler::run`): seeds the root, waits for the
//   completion tracker to drain, then closes both channels
// - N workers: pull a WorkItem, fetch the profile, store it, and (if the item
//   is shallower than max_depth) fetch + store its follow list and send it to
//   the aggregator
// - 1 aggregator: admits each target through the visited set and enqueues the
//   new ones one level deeper; it never blocks on a full frontier while
//   workers wait on it
//
// Shutdown:
// The coordinator holds the only strong Sender of each channel. Workers and
// the aggregator hold WeakSenders and upgrade them only while the item they
// are working on is still counted, so once the count hits zero no strong
// sender exists outside the coordinator. Dropping its two senders closes the
// frontier (workers exit) and then the result channel (aggregator exits).
//
// Rust concepts:
// - Arc<dyn Trait>: shared, dynamically dispatched collaborators
// - tokio::task::JoinSet: owns all spawned tasks and reports panics
// - tokio::select!: wait for "crawl finished" or "a task died", whichever
//   happens first
// =============================================================================

use super::queue::{results_channel, EdgeBatch, Frontier, WorkItem};
use super::report::{CrawlReport, CrawlStats};
use super::tracker::CompletionTracker;
use super::visited::VisitedSet;
use crate::error::{CrawlError, PersistError};
use crate::fetch::PageFetcher;
use crate::model::IdentityKey;
use crate::store::PersistenceSink;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

pub const DEFAULT_WORKERS: usize = 10;
pub const DEFAULT_FRONTIER_CAPACITY: usize = 10_000;
pub const DEFAULT_RESULT_CAPACITY: usize = 1_000;

/// Knobs for one crawl.
///
/// A full frontier or result channel slows producers down. Children the
/// aggregator can't enqueue yet wait in its own buffer, so small capacities
/// cost throughput but never stall the crawl.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlConfig {
    /// Identities at this depth are stored but their follows are not fetched.
    pub max_depth: usize,
    pub workers: usize,
    pub frontier_capacity: usize,
    pub result_capacity: usize,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            max_depth: 0,
            workers: DEFAULT_WORKERS,
            frontier_capacity: DEFAULT_FRONTIER_CAPACITY,
            result_capacity: DEFAULT_RESULT_CAPACITY,
        }
    }
}

impl CrawlConfig {
    pub fn new(max_depth: usize, workers: usize) -> Self {
        Self {
            max_depth,
            workers,
            ..Self::default()
        }
    }

    fn validate(&self) -> Result<(), CrawlError> {
        if self.workers == 0 {
            return Err(CrawlError::InvalidConfig("at least one worker is required".into()));
        }
        if self.frontier_capacity == 0 || self.result_capacity == 0 {
            return Err(CrawlError::InvalidConfig("channel capacities must be positive".into()));
        }
        Ok(())
    }
}

/// Runs crawls against one fetcher and one sink.
pub struct Crawler {
    config: CrawlConfig,
    fetcher: Arc<dyn PageFetcher>,
    sink: Arc<dyn PersistenceSink>,
}

impl Crawler {
    pub fn new(config: CrawlConfig, fetcher: Arc<dyn PageFetcher>, sink: Arc<dyn PersistenceSink>) -> Self {
        Self { config, fetcher, sink }
    }

    pub fn config(&self) -> &CrawlConfig {
        &self.config
    }

    /// Crawls everything reachable from `root` within `max_depth` hops and
    /// returns once every discovered identity has been processed.
    ///
    /// Individual fetch or storage failures are logged and counted in the
    /// report; they never fail the crawl.
    pub async fn run(&self, root: IdentityKey) -> Result<CrawlReport, CrawlError> {
        self.config.validate()?;
        let started = Instant::now();

        let visited = Arc::new(VisitedSet::new());
        let tracker = Arc::new(CompletionTracker::new());
        let stats = Arc::new(CrawlStats::default());

        let (frontier_tx, frontier) = Frontier::channel(self.config.frontier_capacity);
        let (results_tx, results_rx) = results_channel(self.config.result_capacity);

        info!(
            root = %root,
            max_depth = self.config.max_depth,
            workers = self.config.workers,
            "starting crawl"
        );

        let mut tasks = JoinSet::new();
        for id in 0..self.config.workers {
            let worker = Worker {
                id,
                max_depth: self.config.max_depth,
                fetcher: Arc::clone(&self.fetcher),
                sink: Arc::clone(&self.sink),
                frontier: frontier.clone(),
                results: results_tx.downgrade(),
                stats: Arc::clone(&stats),
            };
            tasks.spawn(worker.run());
        }
        drop(frontier);

        let aggregator = Aggregator {
            results: results_rx,
            frontier: frontier_tx.downgrade(),
            visited: Arc::clone(&visited),
            tracker: Arc::clone(&tracker),
            stats: Arc::clone(&stats),
        };
        tasks.spawn(aggregator.run());

        // Seed: visited first, then counted, then enqueued.
        visited.admit(&root);
        CrawlStats::bump(&stats.admitted);
        let seed = WorkItem::new(root.clone(), 0, tracker.begin());
        if frontier_tx.send(seed).await.is_err() {
            // Only possible if every worker already died.
            return Err(shutdown_after_failure(tasks, "frontier closed before seeding".into()).await);
        }

        // Running: wait for the count to drain, unless a task dies first.
        // Tasks only exit on their own after the channels close, so any task
        // finishing here is a failure.
        tokio::select! {
            _ = tracker.wait_zero() => {}
            Some(joined) = tasks.join_next() => {
                let reason = match joined {
                    Err(e) => e.to_string(),
                    Ok(()) => "crawl task exited while work was outstanding".to_string(),
                };
                return Err(shutdown_after_failure(tasks, reason).await);
            }
        }

        // Draining: no item is outstanding, so nothing else will be sent.
        debug!("crawl drained, closing channels");
        drop(frontier_tx);
        drop(results_tx);

        // Terminated once every task has observed its closed channel.
        while let Some(joined) = tasks.join_next().await {
            joined?;
        }

        let report = stats.report(root, self.config.max_depth, self.config.workers, started.elapsed());
        info!(
            admitted = report.admitted,
            persisted = report.persisted,
            fetch_failures = report.fetch_failures,
            persist_failures = report.persist_failures,
            elapsed_ms = report.elapsed_ms,
            "crawl finished"
        );
        Ok(report)
    }
}

/// Crawls from `root` with default channel capacities.
pub async fn run(
    max_depth: usize,
    root: IdentityKey,
    workers: usize,
    fetcher: Arc<dyn PageFetcher>,
    sink: Arc<dyn PersistenceSink>,
) -> Result<CrawlReport, CrawlError> {
    Crawler::new(CrawlConfig::new(max_depth, workers), fetcher, sink)
        .run(root)
        .await
}

async fn shutdown_after_failure(mut tasks: JoinSet<()>, reason: String) -> CrawlError {
    error!(reason = %reason, "aborting crawl");
    tasks.shutdown().await;
    CrawlError::TaskPanicked(reason)
}

struct Worker {
    id: usize,
    max_depth: usize,
    fetcher: Arc<dyn PageFetcher>,
    sink: Arc<dyn PersistenceSink>,
    frontier: Frontier,
    results: mpsc::WeakSender<EdgeBatch>,
    stats: Arc<CrawlStats>,
}

impl Worker {
    async fn run(self) {
        while let Some(item) = self.frontier.next().await {
            self.process(item).await;
        }
        debug!(worker = self.id, "worker exiting");
    }

    /// Handles one item. The item's completion guard is dropped on every
    /// early return, or travels to the aggregator inside the EdgeBatch.
    async fn process(&self, item: WorkItem) {
        info!(worker = self.id, handle = %item.key, depth = item.depth, "crawling identity");

        let attrs = match self.fetcher.fetch_profile(&item.key).await {
            Ok(attrs) => attrs,
            Err(e) => {
                CrawlStats::bump(&self.stats.fetch_failures);
                warn!(worker = self.id, handle = %item.key, error = %e, "failed to fetch profile");
                return;
            }
        };
        CrawlStats::bump(&self.stats.fetched);

        let source_id = match self.sink.persist_identity(&item.key, &attrs).await {
            Ok(id) if id >= 0 => id,
            result => {
                let e = match result {
                    Err(e) => e,
                    Ok(id) => PersistError::InvalidId(id),
                };
                CrawlStats::bump(&self.stats.persist_failures);
                error!(worker = self.id, handle = %item.key, error = %e, "failed to store identity");
                return;
            }
        };
        CrawlStats::bump(&self.stats.persisted);

        if item.depth >= self.max_depth {
            return;
        }

        let targets = match self.fetcher.fetch_edges(&item.key).await {
            Ok(targets) => targets,
            Err(e) => {
                CrawlStats::bump(&self.stats.fetch_failures);
                warn!(worker = self.id, handle = %item.key, error = %e, "failed to fetch follows");
                return;
            }
        };
        CrawlStats::bump(&self.stats.explored);

        match self.sink.persist_edges(source_id, &targets).await {
            Ok(()) => CrawlStats::add(&self.stats.edges_recorded, targets.len()),
            Err(e) => {
                // The edges are still explored; only the record is missing.
                CrawlStats::bump(&self.stats.persist_failures);
                error!(worker = self.id, handle = %item.key, error = %e, "failed to store follows");
            }
        }

        if targets.is_empty() {
            return;
        }

        // The strong sender is alive while this item is counted.
        let Some(results) = self.results.upgrade() else {
            error!(worker = self.id, handle = %item.key, "result channel closed with work outstanding");
            return;
        };
        let batch = EdgeBatch {
            source_id,
            parent_depth: item.depth,
            targets,
            pending: item.pending,
        };
        if results.send(batch).await.is_err() {
            error!(worker = self.id, handle = %item.key, "edge aggregator is gone");
        }
    }
}

struct Aggregator {
    results: mpsc::Receiver<EdgeBatch>,
    frontier: mpsc::WeakSender<WorkItem>,
    visited: Arc<VisitedSet>,
    tracker: Arc<CompletionTracker>,
    stats: Arc<CrawlStats>,
}

impl Aggregator {
    /// Receives batches and feeds admitted children into the frontier.
    ///
    /// Children wait in `overflow` until the frontier has room. The loop keeps
    /// receiving batches while it waits, so a worker blocked on a full result
    /// channel is always released and can go back to draining the frontier.
    async fn run(mut self) {
        let mut overflow: VecDeque<WorkItem> = VecDeque::new();

        loop {
            if overflow.is_empty() {
                match self.results.recv().await {
                    Some(batch) => self.admit(batch, &mut overflow),
                    None => break,
                }
                continue;
            }

            // Overflow items are counted, so the coordinator still holds the
            // strong sender.
            let Some(frontier) = self.frontier.upgrade() else {
                error!(pending = overflow.len(), "frontier closed with work outstanding");
                overflow.clear();
                continue;
            };

            tokio::select! {
                permit = frontier.reserve() => match permit {
                    Ok(permit) => {
                        if let Some(item) = overflow.pop_front() {
                            permit.send(item);
                        }
                    }
                    Err(_) => {
                        // Dropping the items releases their guards.
                        error!(pending = overflow.len(), "no workers left to take new items");
                        overflow.clear();
                    }
                },
                batch = self.results.recv() => match batch {
                    Some(batch) => self.admit(batch, &mut overflow),
                    None => break,
                },
            }
        }
        debug!("edge aggregator exiting");
    }

    /// Queues every target not seen before at parent depth + 1. The batch
    /// (and with it the parent's completion guard) is dropped only after all
    /// children have been counted.
    fn admit(&self, batch: EdgeBatch, overflow: &mut VecDeque<WorkItem>) {
        let depth = batch.parent_depth + 1;
        let mut admitted = 0usize;
        for target in &batch.targets {
            if !self.visited.admit(target) {
                continue;
            }
            admitted += 1;
            CrawlStats::bump(&self.stats.admitted);
            overflow.push_back(WorkItem::new(target.clone(), depth, self.tracker.begin()));
        }

        debug!(
            source_id = batch.source_id,
            candidates = batch.targets.len(),
            admitted,
            depth,
            waiting = overflow.len(),
            "edges aggregated"
        );
    }
}
