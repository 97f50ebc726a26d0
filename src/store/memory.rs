// src/store/memory.rs
// =============================================================================
// PersistenceSink that keeps everything in memory.
//
// Used by `crawl --dry-run` and by the engine tests. It mirrors the SQLite
// store's semantics: persisting the same handle twice keeps the same id and
// updates the attributes, and follow edges are a set per follower.
// =============================================================================

use super::{PersistenceSink, Person};
use crate::error::PersistError;
use crate::model::{IdentityKey, ProfileAttributes};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Default)]
struct Inner {
    people: Vec<Person>,
    by_handle: HashMap<IdentityKey, usize>,
    follows: HashMap<i64, Vec<IdentityKey>>,
    // Handles in the order persist_identity was called, duplicates included.
    persist_log: Vec<IdentityKey>,
}

#[derive(Default)]
pub struct MemorySink {
    inner: Mutex<Inner>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // A panic while holding the lock leaves the maps consistent (each
        // operation is a handful of inserts), so poisoning is ignored.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn person_by_handle(&self, handle: &IdentityKey) -> Option<Person> {
        let inner = self.lock();
        inner.by_handle.get(handle).map(|&idx| inner.people[idx].clone())
    }

    pub fn people(&self) -> Vec<Person> {
        self.lock().people.clone()
    }

    /// Handles the given person follows, in the order they were recorded.
    pub fn follows_of(&self, id: i64) -> Vec<IdentityKey> {
        self.lock()
            .follows
            .get(&id)
            .cloned()
            .unwrap_or_default()
    }

    /// Handles passed to persist_identity, in call order.
    pub fn persist_log(&self) -> Vec<IdentityKey> {
        self.lock().persist_log.clone()
    }
}

#[async_trait]
impl PersistenceSink for MemorySink {
    async fn persist_identity(
        &self,
        key: &IdentityKey,
        attrs: &ProfileAttributes,
    ) -> Result<i64, PersistError> {
        let mut inner = self.lock();
        inner.persist_log.push(key.clone());

        if let Some(&idx) = inner.by_handle.get(key) {
            let id = inner.people[idx].id;
            inner.people[idx] = Person::from_attrs(id, key, attrs);
            return Ok(id);
        }

        let id = inner.people.len() as i64 + 1;
        inner.people.push(Person::from_attrs(id, key, attrs));
        let idx = inner.people.len() - 1;
        inner.by_handle.insert(key.clone(), idx);
        Ok(id)
    }

    async fn persist_edges(&self, source_id: i64, targets: &[IdentityKey]) -> Result<(), PersistError> {
        let mut inner = self.lock();
        if source_id < 1 || source_id as usize > inner.people.len() {
            return Err(PersistError::UnknownId(source_id));
        }
        let list = inner.follows.entry(source_id).or_default();
        for target in targets {
            if !list.contains(target) {
                list.push(target.clone());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(name: &str) -> ProfileAttributes {
        ProfileAttributes {
            display_name: name.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_persist_is_upsert_by_handle() {
        let sink = MemorySink::new();
        let key = IdentityKey::from("alice");

        let first = sink.persist_identity(&key, &attrs("Alice")).await.unwrap();
        let second = sink.persist_identity(&key, &attrs("Alice B")).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(sink.people().len(), 1);
        assert_eq!(sink.person_by_handle(&key).unwrap().name, "Alice B");
        assert_eq!(sink.persist_log().len(), 2);
    }

    #[tokio::test]
    async fn test_edges_are_a_set() {
        let sink = MemorySink::new();
        let id = sink
            .persist_identity(&IdentityKey::from("alice"), &attrs("Alice"))
            .await
            .unwrap();

        let targets = vec![IdentityKey::from("carol"), IdentityKey::from("bob")];
        sink.persist_edges(id, &targets).await.unwrap();
        sink.persist_edges(id, &targets[..1]).await.unwrap();

        assert_eq!(
            sink.follows_of(id),
            vec![IdentityKey::from("carol"), IdentityKey::from("bob")]
        );
    }

    #[tokio::test]
    async fn test_edges_for_unknown_id_fail() {
        let sink = MemorySink::new();
        let err = sink.persist_edges(7, &[]).await.unwrap_err();
        assert!(matches!(err, PersistError::UnknownId(7)));
    }
}
