// src/crawl/visited.rs
// =============================================================================
// The visited set: every identity ever admitted to the frontier.
//
// A key enters the set the moment it is chosen for enqueueing (the root, or
// a target that survives dedup), never when it is fetched. That ordering is
// what guarantees each identity is enqueued at most once per run.
//
// DashSet is a sharded concurrent hash set, so `admit` is a single atomic
// test-and-insert without any lock held by the caller.
// =============================================================================

use crate::model::IdentityKey;
use dashmap::DashSet;

#[derive(Debug, Default)]
pub struct VisitedSet {
    keys: DashSet<IdentityKey>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `key`; returns true iff it was not already present.
    pub fn admit(&self, key: &IdentityKey) -> bool {
        // Check first so repeated targets (the common case in a follow graph)
        // do not clone the key.
        if self.keys.contains(key) {
            return false;
        }
        self.keys.insert(key.clone())
    }

    pub fn contains(&self, key: &IdentityKey) -> bool {
        self.keys.contains(key)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
