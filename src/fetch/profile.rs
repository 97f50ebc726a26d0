// src/fetch/profile.rs
// =============================================================================
// Extracts profile attributes and follow lists from profile HTML.
//
// We use the `scraper` crate (CSS selectors over an html5ever DOM) and one
// regex for the avatar, which is only present as an inline
// `background-image: url("...")` style.
//
// Required fields (display name, avatar element, track count) produce a
// FetchError when missing; the worker treats that exactly like a network
// failure and skips the identity.
// =============================================================================

use crate::error::FetchError;
use crate::model::{IdentityKey, PlanTier, ProfileAttributes};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::sync::OnceLock;

const NAME_SELECTOR: &str = "h2.profileHeaderInfo__userName";
const IMAGE_SELECTOR: &str = ".profileHeaderInfo__avatar span.sc-artwork";
const VERIFIED_SELECTOR: &str = "span.verifiedBadge";
const PLAN_SELECTOR: &str = "a.creatorBadge";
const TRACK_COUNT_SELECTOR: &str = "article.infoStats td:nth-child(3) a div";
const FOLLOWING_LINK_SELECTOR: &str = ".userBadgeListItem__title a";

const IMAGE_REGEX: &str = r#"background-image:\s*url\("([^"]+)"\);"#;

// Selectors are compile-time constants, so parse failures are programmer
// errors and are reported as Parse errors instead of panicking.
fn selector(css: &'static str) -> Result<Selector, FetchError> {
    Selector::parse(css).map_err(|e| FetchError::Parse {
        field: css,
        message: e.to_string(),
    })
}

fn image_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(IMAGE_REGEX).expect("avatar regex is valid"))
}

fn first<'a>(document: &'a Html, css: &'static str) -> Result<Option<ElementRef<'a>>, FetchError> {
    Ok(document.select(&selector(css)?).next())
}

/// Parses a profile page into ProfileAttributes.
pub fn parse_profile(html: &str) -> Result<ProfileAttributes, FetchError> {
    let document = Html::parse_document(html);

    let display_name = first(&document, NAME_SELECTOR)?
        .ok_or(FetchError::MissingElement("display name"))?
        .text()
        .collect::<String>()
        .trim()
        .to_string();

    // The avatar element has to exist, but accounts without an uploaded image
    // have no url in the style; that is stored as an empty string.
    let avatar = first(&document, IMAGE_SELECTOR)?.ok_or(FetchError::MissingElement("avatar"))?;
    let image_url = avatar
        .value()
        .attr("style")
        .and_then(|style| image_regex().captures(style))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_default();

    let verified = first(&document, VERIFIED_SELECTOR)?.is_some();

    let plan_tier = first(&document, PLAN_SELECTOR)?
        .and_then(|badge| badge.value().attr("title"))
        .map(PlanTier::from_badge_title)
        .unwrap_or_default();

    let count_text = first(&document, TRACK_COUNT_SELECTOR)?
        .ok_or(FetchError::MissingElement("track count"))?
        .text()
        .collect::<String>();
    let content_count = count_text
        .trim()
        .replace(',', "")
        .parse::<i64>()
        .map_err(|e| FetchError::Parse {
            field: "track count",
            message: format!("'{}': {}", count_text.trim(), e),
        })?;

    Ok(ProfileAttributes {
        display_name,
        image_url,
        verified,
        plan_tier,
        content_count,
    })
}

/// Parses a "following" page into the handles it lists, in page order.
pub fn parse_following(html: &str) -> Result<Vec<IdentityKey>, FetchError> {
    let document = Html::parse_document(html);
    let links = selector(FOLLOWING_LINK_SELECTOR)?;

    Ok(document
        .select(&links)
        .filter_map(|a| a.value().attr("href"))
        .map(|href| href.trim().trim_start_matches('/'))
        .filter(|handle| !handle.is_empty())
        .map(IdentityKey::from)
        .collect())
}
