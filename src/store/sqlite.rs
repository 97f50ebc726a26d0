// src/store/sqlite.rs
// =============================================================================
// PersistenceSink backed by a SQLite database.
//
// Schema:
//   people  - one row per handle; persisting a handle again updates the row
//             and keeps its id
//   follows - (follower_id, followee_handle) pairs; the followee is stored by
//             handle because it may not have been crawled (yet, or ever)
//
// rusqlite is a blocking API, so every call hops onto tokio's blocking pool
// with spawn_blocking. The connection lives behind a std Mutex; SQLite
// serializes writers anyway.
// =============================================================================

use super::{PersistenceSink, Person};
use crate::error::PersistError;
use crate::model::{IdentityKey, PlanTier, ProfileAttributes};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::debug;

const SCHEMA: &str = "
    PRAGMA foreign_keys = ON;

    CREATE TABLE IF NOT EXISTS people (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        handle      TEXT NOT NULL UNIQUE,
        name        TEXT NOT NULL,
        image_url   TEXT NOT NULL,
        verified    INTEGER NOT NULL,
        plan        TEXT NOT NULL,
        track_count INTEGER NOT NULL
    );

    CREATE TABLE IF NOT EXISTS follows (
        follower_id     INTEGER NOT NULL REFERENCES people(id),
        followee_handle TEXT NOT NULL,
        PRIMARY KEY (follower_id, followee_handle)
    );
";

const PERSON_COLUMNS: &str = "id, handle, name, image_url, verified, plan, track_count";

#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Opens (creating if needed) the database file and applies the schema.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, PersistError> {
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, PersistError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, PersistError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Runs `f` with the connection on the blocking thread pool.
    async fn with_conn<T, F>(&self, f: F) -> Result<T, PersistError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T, PersistError> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut conn = conn
                .lock()
                .map_err(|_| PersistError::TaskFailed("connection mutex poisoned".to_string()))?;
            f(&mut conn)
        })
        .await?
    }

    pub async fn person_by_handle(&self, handle: &IdentityKey) -> Result<Option<Person>, PersistError> {
        let handle = handle.as_str().to_string();
        self.with_conn(move |conn| {
            let sql = format!("SELECT {PERSON_COLUMNS} FROM people WHERE handle = ?1");
            Ok(conn.query_row(&sql, params![handle], person_from_row).optional()?)
        })
        .await
    }

    pub async fn person_by_id(&self, id: i64) -> Result<Option<Person>, PersistError> {
        self.with_conn(move |conn| {
            let sql = format!("SELECT {PERSON_COLUMNS} FROM people WHERE id = ?1");
            Ok(conn.query_row(&sql, params![id], person_from_row).optional()?)
        })
        .await
    }

    /// Handles followed by the person with `id`, in the order they were recorded.
    pub async fn follows_of(&self, id: i64) -> Result<Vec<IdentityKey>, PersistError> {
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT followee_handle FROM follows WHERE follower_id = ?1 ORDER BY rowid",
            )?;
            let handles = stmt
                .query_map(params![id], |row| row.get::<_, String>(0))?
                .map(|handle| handle.map(IdentityKey::from))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(handles)
        })
        .await
    }

    pub async fn count_people(&self) -> Result<i64, PersistError> {
        self.with_conn(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM people", [], |row| row.get(0))?))
            .await
    }
}

fn person_from_row(row: &Row<'_>) -> rusqlite::Result<Person> {
    Ok(Person {
        id: row.get(0)?,
        handle: IdentityKey::from(row.get::<_, String>(1)?),
        name: row.get(2)?,
        image_url: row.get(3)?,
        verified: row.get(4)?,
        plan: PlanTier::from_db(&row.get::<_, String>(5)?),
        track_count: row.get(6)?,
    })
}

#[async_trait]
impl PersistenceSink for SqliteStore {
    async fn persist_identity(
        &self,
        key: &IdentityKey,
        attrs: &ProfileAttributes,
    ) -> Result<i64, PersistError> {
        let handle = key.as_str().to_string();
        let attrs = attrs.clone();
        let id = self
            .with_conn(move |conn| {
                let id = conn.query_row(
                    "INSERT INTO people (handle, name, image_url, verified, plan, track_count)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                     ON CONFLICT(handle) DO UPDATE SET
                         name = excluded.name,
                         image_url = excluded.image_url,
                         verified = excluded.verified,
                         plan = excluded.plan,
                         track_count = excluded.track_count
                     RETURNING id",
                    params![
                        handle,
                        attrs.display_name,
                        attrs.image_url,
                        attrs.verified,
                        attrs.plan_tier.as_str(),
                        attrs.content_count,
                    ],
                    |row| row.get::<_, i64>(0),
                )?;
                Ok(id)
            })
            .await?;
        debug!(handle = %key, id, "person stored");
        Ok(id)
    }

    async fn persist_edges(&self, source_id: i64, targets: &[IdentityKey]) -> Result<(), PersistError> {
        let targets: Vec<String> = targets.iter().map(|t| t.as_str().to_string()).collect();
        self.with_conn(move |conn| {
            let tx = conn.transaction()?;
            {
                let mut stmt = tx.prepare(
                    "INSERT OR IGNORE INTO follows (follower_id, followee_handle) VALUES (?1, ?2)",
                )?;
                for target in &targets {
                    stmt.execute(params![source_id, target])?;
                }
            }
            tx.commit()?;
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(name: &str, count: i64) -> ProfileAttributes {
        ProfileAttributes {
            display_name: name.to_string(),
            image_url: format!("https://img.example/{name}.jpg"),
            verified: count > 10,
            plan_tier: PlanTier::Basic,
            content_count: count,
        }
    }

    #[tokio::test]
    async fn test_persist_and_read_back() {
        let store = SqliteStore::open_in_memory().unwrap();
        let key = IdentityKey::from("alice");

        let id = store.persist_identity(&key, &attrs("Alice", 42)).await.unwrap();
        assert!(id > 0);

        let person = store.person_by_handle(&key).await.unwrap().unwrap();
        assert_eq!(person.id, id);
        assert_eq!(person.name, "Alice");
        assert!(person.verified);
        assert_eq!(person.plan, PlanTier::Basic);
        assert_eq!(person.track_count, 42);

        assert_eq!(store.person_by_id(id).await.unwrap(), Some(person));
        assert_eq!(store.person_by_id(id + 100).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_persist_same_handle_keeps_id() {
        let store = SqliteStore::open_in_memory().unwrap();
        let key = IdentityKey::from("alice");

        let first = store.persist_identity(&key, &attrs("Alice", 1)).await.unwrap();
        let second = store.persist_identity(&key, &attrs("Alice 2", 2)).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(store.count_people().await.unwrap(), 1);
        let person = store.person_by_handle(&key).await.unwrap().unwrap();
        assert_eq!(person.name, "Alice 2");
    }

    #[tokio::test]
    async fn test_follows_are_deduplicated() {
        let store = SqliteStore::open_in_memory().unwrap();
        let id = store
            .persist_identity(&IdentityKey::from("alice"), &attrs("Alice", 1))
            .await
            .unwrap();

        let targets = vec![
            IdentityKey::from("carol"),
            IdentityKey::from("bob"),
            IdentityKey::from("carol"),
        ];
        store.persist_edges(id, &targets).await.unwrap();
        store.persist_edges(id, &targets[1..2]).await.unwrap();

        assert_eq!(
            store.follows_of(id).await.unwrap(),
            vec![IdentityKey::from("carol"), IdentityKey::from("bob")]
        );
    }

    #[tokio::test]
    async fn test_follows_for_unknown_person_fail() {
        let store = SqliteStore::open_in_memory().unwrap();
        let result = store.persist_edges(99, &[IdentityKey::from("bob")]).await;
        assert!(matches!(result, Err(PersistError::Database(_))));
    }

    #[tokio::test]
    async fn test_data_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph.db");

        {
            let store = SqliteStore::open(&path).unwrap();
            store
                .persist_identity(&IdentityKey::from("alice"), &attrs("Alice", 3))
                .await
                .unwrap();
        }

        let store = SqliteStore::open(&path).unwrap();
        let person = store
            .person_by_handle(&IdentityKey::from("alice"))
            .await
            .unwrap();
        assert_eq!(person.map(|p| p.track_count), Some(3));
    }
}
