// src/config.rs
// =============================================================================
// Settings read from the environment (and an optional .env file).
//
//   SOUNDCLOUD_URL      base URL of the platform    (https://soundcloud.com)
//   DATABASE_PATH       SQLite file                 (follow-graph.db)
//   HTTP_TIMEOUT_SECS   per-request timeout         (30)
//   FRONTIER_CAPACITY   pending work items          (10000)
//   RESULT_CAPACITY     pending edge batches        (1000)
//
// Everything has a default, so a bare `follow-graph crawl <handle>` works.
// Values that are present but malformed are errors rather than silently
// falling back.
// =============================================================================

use crate::crawl::{DEFAULT_FRONTIER_CAPACITY, DEFAULT_RESULT_CAPACITY};
use anyhow::{Context, Result};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://soundcloud.com";
pub const DEFAULT_DATABASE_PATH: &str = "follow-graph.db";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub base_url: String,
    pub database_path: PathBuf,
    pub http_timeout: Duration,
    pub frontier_capacity: usize,
    pub result_capacity: usize,
}

impl AppConfig {
    /// Loads `.env` (if there is one) and reads the process environment.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key/value source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let timeout_secs: u64 = parse_or(&lookup, "HTTP_TIMEOUT_SECS", DEFAULT_HTTP_TIMEOUT_SECS)?;

        Ok(Self {
            base_url: lookup("SOUNDCLOUD_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            database_path: lookup("DATABASE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE_PATH)),
            http_timeout: Duration::from_secs(timeout_secs),
            frontier_capacity: parse_or(&lookup, "FRONTIER_CAPACITY", DEFAULT_FRONTIER_CAPACITY)?,
            result_capacity: parse_or(&lookup, "RESULT_CAPACITY", DEFAULT_RESULT_CAPACITY)?,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} must be a number, got '{raw}'")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.database_path, PathBuf::from(DEFAULT_DATABASE_PATH));
        assert_eq!(config.http_timeout, Duration::from_secs(30));
        assert_eq!(config.frontier_capacity, 10_000);
        assert_eq!(config.result_capacity, 1_000);
    }

    #[test]
    fn test_overrides() {
        let config = AppConfig::from_lookup(lookup(&[
            ("SOUNDCLOUD_URL", "http://localhost:8080"),
            ("DATABASE_PATH", "/tmp/graph.db"),
            ("HTTP_TIMEOUT_SECS", " 5 "),
            ("FRONTIER_CAPACITY", "64"),
        ]))
        .unwrap();
        assert_eq!(config.base_url, "http://localhost:8080");
        assert_eq!(config.database_path, PathBuf::from("/tmp/graph.db"));
        assert_eq!(config.http_timeout, Duration::from_secs(5));
        assert_eq!(config.frontier_capacity, 64);
    }

    #[test]
    fn test_malformed_number_is_an_error() {
        let err = AppConfig::from_lookup(lookup(&[("RESULT_CAPACITY", "lots")])).unwrap_err();
        assert!(err.to_string().contains("RESULT_CAPACITY"));
    }
}
