use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::helpers::{classify_item_type, slug_from_url};

pub const MAX_SCREENSHOTS: usize = 5;
pub const DEFAULT_VERSION: &str = "Latest";
pub const DEFAULT_SIZE: &str = "Varies";
pub const DEFAULT_MOD_FEATURES: &str = "Premium Unlocked";

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    Apps,
    Games,
}

/// Raw entry as read off a list page, before validation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingStub {
    pub title: Option<String>,
    pub detail_url: Option<String>,
    pub icon_url: Option<String>,
    pub type_hint: Option<ItemType>,
}

/// Fields read off a detail page. `None` leaves the item's current value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetailFields {
    pub description: Option<String>,
    pub version: Option<String>,
    pub size: Option<String>,
    pub mod_features: Option<String>,
    pub screenshots: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CrawlItem {
    pub slug: String,
    pub title: String,
    pub icon: Option<String>,
    pub detail_url: String,
    #[serde(rename = "type")]
    pub item_type: ItemType,
    pub scraped_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    // Detail fields, placeholders until enriched
    pub description: String,
    pub version: String,
    pub size: String,
    pub mod_features: String,
    pub screenshots: Vec<String>,
}

impl CrawlItem {
    /// Promote a list-page stub to an item.
    ///
    /// Stubs without a title or detail URL (after trimming), or whose URL
    /// yields no slug, are rejected.
    pub fn from_stub(stub: ListingStub) -> Option<Self> {
        let title = stub.title.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())?;
        let detail_url = stub
            .detail_url
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty())?;
        let slug = slug_from_url(&detail_url)?;
        let item_type = stub
            .type_hint
            .unwrap_or_else(|| classify_item_type(&detail_url, &title));

        Some(Self {
            slug,
            title,
            icon: stub.icon_url.filter(|u| !u.trim().is_empty()),
            detail_url,
            item_type,
            scraped_at: Utc::now(),
            updated_at: None,
            description: String::new(),
            version: DEFAULT_VERSION.to_string(),
            size: DEFAULT_SIZE.to_string(),
            mod_features: DEFAULT_MOD_FEATURES.to_string(),
            screenshots: Vec::new(),
        })
    }

    pub fn is_enriched(&self) -> bool {
        self.updated_at.is_some()
    }

    /// Merge detail-page fields into this item in place
    pub fn apply_details(&mut self, details: DetailFields) {
        if let Some(description) = details.description {
            self.description = description;
        }
        if let Some(version) = details.version.filter(|v| !v.is_empty()) {
            self.version = version;
        }
        if let Some(size) = details.size.filter(|s| !s.is_empty()) {
            self.size = size;
        }
        if let Some(mod_features) = details.mod_features.filter(|m| !m.is_empty()) {
            self.mod_features = mod_features;
        }
        if !details.screenshots.is_empty() {
            self.screenshots = details.screenshots;
            self.screenshots.truncate(MAX_SCREENSHOTS);
        }
        self.updated_at = Some(Utc::now());
    }
}
