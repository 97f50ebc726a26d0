// src/fetch/http.rs
// =============================================================================
// PageFetcher implementation that downloads profile pages over HTTP.
//
// For a handle "someone" and base URL https://soundcloud.com we load:
//   https://soundcloud.com/someone            -> profile attributes
//   https://soundcloud.com/someone/following  -> follow list
//
// One reqwest::Client is shared by every worker (it pools connections and is
// cheap to clone), so the fetcher itself is Send + Sync.
// =============================================================================

use super::profile::{parse_following, parse_profile};
use super::PageFetcher;
use crate::error::FetchError;
use crate::model::{IdentityKey, ProfileAttributes};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;
use url::Url;

pub struct HttpFetcher {
    client: Client,
    base_url: Url,
}

impl HttpFetcher {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, parse_base(base_url)?))
    }

    pub fn with_client(client: Client, base_url: Url) -> Self {
        Self { client, base_url }
    }

    /// Builds `{base}/{handle}` plus any extra path segments.
    fn page_url(&self, key: &IdentityKey, extra: &[&str]) -> Result<Url, FetchError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| FetchError::InvalidUrl {
                handle: key.to_string(),
                message: format!("{} cannot be a base", self.base_url),
            })?
            .pop_if_empty()
            .push(key.as_str())
            .extend(extra);
        Ok(url)
    }

    async fn fetch_page(&self, url: Url) -> Result<String, FetchError> {
        debug!(url = %url, "fetching page");
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|source| FetchError::Http {
                url: url.to_string(),
                source,
            })?;

        if !response.status().is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        response.text().await.map_err(|source| FetchError::Http {
            url: url.to_string(),
            source,
        })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch_profile(&self, key: &IdentityKey) -> Result<ProfileAttributes, FetchError> {
        let html = self.fetch_page(self.page_url(key, &[])?).await?;
        parse_profile(&html)
    }

    async fn fetch_edges(&self, key: &IdentityKey) -> Result<Vec<IdentityKey>, FetchError> {
        let html = self.fetch_page(self.page_url(key, &["following"])?).await?;
        parse_following(&html)
    }
}

fn parse_base(base_url: &str) -> anyhow::Result<Url> {
    let url = Url::parse(base_url)
        .map_err(|e| anyhow::anyhow!("Invalid base URL '{}': {}", base_url, e))?;
    if url.cannot_be_a_base() {
        anyhow::bail!("Base URL cannot have paths appended: {}", base_url);
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fetcher(base: &str) -> HttpFetcher {
        HttpFetcher::new(base, Duration::from_secs(1)).unwrap()
    }

    #[test]
    fn test_profile_url() {
        let f = fetcher("https://soundcloud.com");
        let url = f.page_url(&IdentityKey::from("dxmfromcvs"), &[]).unwrap();
        assert_eq!(url.as_str(), "https://soundcloud.com/dxmfromcvs");
    }

    #[test]
    fn test_following_url_with_trailing_slash_base() {
        let f = fetcher("https://soundcloud.com/");
        let url = f
            .page_url(&IdentityKey::from("dxmfromcvs"), &["following"])
            .unwrap();
        assert_eq!(url.as_str(), "https://soundcloud.com/dxmfromcvs/following");
    }

    #[test]
    fn test_handle_is_percent_encoded() {
        let f = fetcher("https://soundcloud.com");
        let url = f.page_url(&IdentityKey::from("a b"), &[]).unwrap();
        assert_eq!(url.as_str(), "https://soundcloud.com/a%20b");
    }

    #[test]
    fn test_rejects_non_base_url() {
        assert!(HttpFetcher::new("mailto:someone@example.com", Duration::from_secs(1)).is_err());
        assert!(HttpFetcher::new("not a url", Duration::from_secs(1)).is_err());
    }
}
