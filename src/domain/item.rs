use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A configured syndication source. `feed_url` is optional; when absent the
/// resolver probes the base URL for a feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedSpec {
    pub name: String,
    pub base_url: String,
    #[serde(default)]
    pub feed_url: Option<String>,
}

/// One normalized piece of content extracted from a feed entry.
///
/// Identity is `canonical_url`; two items that canonicalize identically are
/// the same content regardless of tracking parameters, fragments, or casing
/// in the raw link. Never mutated after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentItem {
    pub title: String,
    pub canonical_url: String,
    pub raw_url: String,
    pub summary: String,
    pub image_url: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub source_name: String,
    pub source_url: String,
}
