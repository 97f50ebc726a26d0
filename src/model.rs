// src/model.rs
// =============================================================================
// Data that flows between the crawler and its collaborators.
//
// - IdentityKey: the platform handle that names a node in the follow graph
// - PlanTier: which paid plan (if any) the account is on
// - ProfileAttributes: what the page fetcher extracts from a profile page
//
// None of these are mutated after they are created; they are moved from the
// fetcher to the worker and from the worker to the persistence sink.
// =============================================================================

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque handle that uniquely identifies an account (e.g. "dxmfromcvs").
///
/// No normalization is applied: two keys are the same node iff the strings
/// are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdentityKey(String);

impl IdentityKey {
    pub fn new(handle: impl Into<String>) -> Self {
        Self(handle.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl From<&str> for IdentityKey {
    fn from(handle: &str) -> Self {
        Self::new(handle)
    }
}

impl From<String> for IdentityKey {
    fn from(handle: String) -> Self {
        Self(handle)
    }
}

/// The creator plan shown as a badge on the profile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanTier {
    #[default]
    None,
    Basic,
    Pro,
}

impl PlanTier {
    /// Maps the badge title from the profile page ("Artist", "Artist Pro").
    pub fn from_badge_title(title: &str) -> Self {
        match title.trim() {
            "Artist" => PlanTier::Basic,
            "Artist Pro" => PlanTier::Pro,
            _ => PlanTier::None,
        }
    }

    /// Value stored in the `plan` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanTier::None => "none",
            PlanTier::Basic => "basic",
            PlanTier::Pro => "pro",
        }
    }

    /// Inverse of `as_str`; unknown values read back as `None`.
    pub fn from_db(value: &str) -> Self {
        match value {
            "basic" => PlanTier::Basic,
            "pro" => PlanTier::Pro,
            _ => PlanTier::None,
        }
    }
}

/// Everything the crawler learns about one account from its profile page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileAttributes {
    pub display_name: String,
    pub image_url: String,
    pub verified: bool,
    pub plan_tier: PlanTier,
    /// Number of tracks the account has published.
    pub content_count: i64,
}
