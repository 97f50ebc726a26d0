// src/fetch/mod.rs
// =============================================================================
// The page fetcher: turns an identity key into profile data and a follow list.
//
// Submodules:
// - profile: pure HTML parsing (selectors, regex) - easy to unit test
// - http: downloads the pages with reqwest and hands them to the parser
//
// The crawl engine only knows about the PageFetcher trait, so tests can plug
// in a fake graph without touching the network.
// =============================================================================

mod http;
mod profile;

pub use http::HttpFetcher;
pub use profile::{parse_following, parse_profile};

use crate::error::FetchError;
use crate::model::{IdentityKey, ProfileAttributes};
use async_trait::async_trait;

/// Source of profile data and follow edges.
///
/// Implementations must allow concurrent calls for different keys. The crawl
/// engine never asks about the same key twice in one run.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Loads the profile attributes of `key`.
    async fn fetch_profile(&self, key: &IdentityKey) -> Result<ProfileAttributes, FetchError>;

    /// Lists the accounts `key` follows, in page order.
    async fn fetch_edges(&self, key: &IdentityKey) -> Result<Vec<IdentityKey>, FetchError>;
}
