// src/error.rs
// =============================================================================
// Error types shared by the crawler library.
//
// The engine itself never fails because of a single identity: fetch and
// persistence errors are logged by the workers and the identity is skipped.
// These types exist so the collaborators (page fetcher, persistence sink) can
// say *why* something failed, and so the engine can report bad configuration.
//
// The binary wraps everything in anyhow::Error; the library keeps typed
// errors built with thiserror.
// =============================================================================

use thiserror::Error;

/// Why a profile or following page could not be turned into data.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("invalid page url for '{handle}': {message}")]
    InvalidUrl { handle: String, message: String },

    #[error("page is missing {0}")]
    MissingElement(&'static str),

    #[error("could not parse {field}: {message}")]
    Parse { field: &'static str, message: String },
}

/// Why the persistence sink could not record an identity or its edges.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("sink returned invalid internal id {0}")]
    InvalidId(i64),

    #[error("unknown internal id {0}")]
    UnknownId(i64),

    #[error("storage task failed: {0}")]
    TaskFailed(String),
}

/// Errors that stop a traversal before or while it runs.
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("invalid crawl configuration: {0}")]
    InvalidConfig(String),

    #[error("crawl task panicked: {0}")]
    TaskPanicked(String),
}

impl From<tokio::task::JoinError> for PersistError {
    fn from(err: tokio::task::JoinError) -> Self {
        PersistError::TaskFailed(err.to_string())
    }
}

impl From<tokio::task::JoinError> for CrawlError {
    fn from(err: tokio::task::JoinError) -> Self {
        CrawlError::TaskPanicked(err.to_string())
    }
}
