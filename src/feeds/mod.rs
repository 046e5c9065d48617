pub mod extractor;
pub mod resolver;
pub mod selector;

use std::collections::HashMap;

use reqwest::blocking::Client;
use tracing::{info, warn};

use crate::domain::{ContentItem, FeedSpec};
use crate::errors::{DigestError, DigestResult};
use crate::net;

pub use extractor::EntryExtractor;
pub use resolver::FeedResolver;
pub use selector::{SelectionParams, filter_source, rank};

/// Fetches configured sources, extracts their entries, and applies
/// selection. A source that fails to resolve, fetch, or parse is skipped
/// with a warning; it never fails the pipeline.
pub struct FeedPipeline {
    resolver: FeedResolver,
    extractor: EntryExtractor,
    client: Client,
}

impl FeedPipeline {
    pub fn new() -> Self {
        Self {
            resolver: FeedResolver::new(),
            extractor: EntryExtractor::new(),
            client: net::primary_client(),
        }
    }

    /// Pipeline variant whose extractor skips article-page image lookups.
    pub fn without_page_fallback() -> Self {
        Self {
            resolver: FeedResolver::new(),
            extractor: EntryExtractor::without_page_fallback(),
            client: net::primary_client(),
        }
    }

    /// Fetch every source and return the merged, ranked selection.
    pub fn fetch_all(
        &self,
        sources: &[FeedSpec],
        sent_urls: &std::collections::HashSet<String>,
        params: &SelectionParams,
    ) -> Vec<ContentItem> {
        let mut merged = Vec::new();
        for spec in sources {
            let items = self.fetch_source(spec, sent_urls, params);
            info!(source = %spec.name, count = items.len(), "collected source");
            merged.extend(items);
        }
        selector::rank(merged, sent_urls, params.max_total)
    }

    fn fetch_source(
        &self,
        spec: &FeedSpec,
        sent_urls: &std::collections::HashSet<String>,
        params: &SelectionParams,
    ) -> Vec<ContentItem> {
        let Some(feed_url) = self.resolver.resolve(spec) else {
            warn!(source = %spec.name, "no feed found, skipping source");
            return Vec::new();
        };

        let feed = match self.fetch_feed(&feed_url) {
            Ok(feed) => feed,
            Err(e) => {
                warn!(source = %spec.name, feed_url, error = %e, "failed to fetch feed, skipping source");
                return Vec::new();
            }
        };

        self.collect_items(&feed, spec, sent_urls, params)
    }

    fn fetch_feed(&self, url: &str) -> DigestResult<feed_rs::model::Feed> {
        let response = self.client.get(url).send()?.error_for_status()?;
        let bytes = response.bytes()?;
        feed_rs::parser::parse(bytes.as_ref()).map_err(|e| DigestError::FeedParse(e.to_string()))
    }

    /// Extract entries from one parsed feed, then run per-source
    /// filtering. Every extracted item counts against the per-source cap,
    /// dropped or kept, so stale backlogs cannot pull deeper entries in;
    /// reading twice the cap compensates only for entries the extractor
    /// rejects outright. Image resolution runs after filtering so dropped
    /// items never trigger page fetches.
    fn collect_items(
        &self,
        feed: &feed_rs::model::Feed,
        spec: &FeedSpec,
        sent_urls: &std::collections::HashSet<String>,
        params: &SelectionParams,
    ) -> Vec<ContentItem> {
        let mut extracted = Vec::new();
        let mut entries_by_url: HashMap<String, &feed_rs::model::Entry> = HashMap::new();
        for entry in feed.entries.iter().take(params.max_per_source * 2) {
            if extracted.len() >= params.max_per_source {
                break;
            }
            let Some(item) = self.extractor.extract(entry, spec) else {
                continue;
            };
            entries_by_url
                .entry(item.canonical_url.clone())
                .or_insert(entry);
            extracted.push(item);
        }

        let mut kept = selector::filter_source(extracted, sent_urls, params);
        for item in &mut kept {
            if let Some(entry) = entries_by_url.get(&item.canonical_url) {
                item.image_url = self.extractor.resolve_image(entry, &item.raw_url);
            }
        }
        kept
    }
}

impl Default for FeedPipeline {
    fn default() -> Self {
        Self::new()
    }
}
