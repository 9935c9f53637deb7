//! Helper functions for the catalog scraper
//!
//! This module provides small utilities used by the parser and the models:
//! - Slug derivation from detail URLs
//! - Apps/games classification
//! - Character-safe text truncation
//!
//! # Examples
//!
//! ```
//! use rust_catalog_scraper::helpers::{slug_from_url, truncate_chars};
//!
//! let slug = slug_from_url("https://example.com/apps/spotify-premium.html");
//! assert_eq!(slug.as_deref(), Some("spotify-premium"));
//!
//! assert_eq!(truncate_chars("héllo world", 5), "héllo");
//! ```

use crate::models::ItemType;
use url::Url;

/// Title keywords that mark an entry as an app rather than a game
pub const APP_KEYWORDS: &[&str] = &[
    "vpn",
    "browser",
    "messenger",
    "telegram",
    "whatsapp",
    "instagram",
    "tiktok",
    "facebook",
    "youtube",
    "spotify",
    "netflix",
    "editor",
    "camera",
    "photo",
    "gallery",
    "launcher",
    "keyboard",
    "cleaner",
    "manager",
    "downloader",
    "player",
];

/// Last non-empty path segment of a URL, with a trailing `.html` removed.
/// Query strings and fragments are ignored.
pub fn slug_from_url(url: &str) -> Option<String> {
    let segment = match Url::parse(url) {
        Ok(parsed) => parsed
            .path_segments()?
            .filter(|s| !s.is_empty())
            .last()?
            .to_string(),
        Err(_) => {
            let path = url.split(['?', '#']).next().unwrap_or(url);
            path.split('/').filter(|s| !s.is_empty()).last()?.to_string()
        }
    };

    let slug = segment.strip_suffix(".html").unwrap_or(&segment).trim();
    if slug.is_empty() {
        return None;
    }
    Some(slug.to_string())
}

/// Decide between apps and games from the detail URL and title
pub fn classify_item_type(detail_url: &str, title: &str) -> ItemType {
    if detail_url.contains("/apps/") {
        return ItemType::Apps;
    }
    let title = title.to_lowercase();
    if APP_KEYWORDS.iter().any(|k| title.contains(k)) {
        ItemType::Apps
    } else {
        ItemType::Games
    }
}

/// Truncate to at most `max` characters without splitting a code point
pub fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}

/// Collapse runs of whitespace into single spaces and trim
pub fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
