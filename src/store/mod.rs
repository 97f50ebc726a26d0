// src/store/mod.rs
// =============================================================================
// The persistence sink: where discovered people and follow edges end up.
//
// Submodules:
// - sqlite: durable storage in a SQLite database (people + follows tables)
// - memory: in-process storage for dry runs and tests
//
// The crawl engine talks to storage only through the PersistenceSink trait.
// Failures are returned as PersistError and the engine logs and continues.
// =============================================================================

mod memory;
mod sqlite;

pub use memory::MemorySink;
pub use sqlite::SqliteStore;

use crate::error::PersistError;
use crate::model::{IdentityKey, PlanTier, ProfileAttributes};
use async_trait::async_trait;
use serde::Serialize;

/// Records crawl results.
#[async_trait]
pub trait PersistenceSink: Send + Sync {
    /// Stores (or updates) the person for `key` and returns its internal id.
    ///
    /// Ids are always non-negative; the engine treats a negative id like an
    /// error.
    async fn persist_identity(
        &self,
        key: &IdentityKey,
        attrs: &ProfileAttributes,
    ) -> Result<i64, PersistError>;

    /// Records that `source_id` follows every handle in `targets`.
    async fn persist_edges(&self, source_id: i64, targets: &[IdentityKey]) -> Result<(), PersistError>;
}

/// A stored person, as read back from a store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Person {
    pub id: i64,
    pub handle: IdentityKey,
    pub name: String,
    pub image_url: String,
    pub verified: bool,
    pub plan: PlanTier,
    pub track_count: i64,
}

impl Person {
    pub(crate) fn from_attrs(id: i64, handle: &IdentityKey, attrs: &ProfileAttributes) -> Self {
        Self {
            id,
            handle: handle.clone(),
            name: attrs.display_name.clone(),
            image_url: attrs.image_url.clone(),
            verified: attrs.verified,
            plan: attrs.plan_tier,
            track_count: attrs.content_count,
        }
    }
}
