use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use scraper::{Html, Selector};
use tracing::{info, warn};
use url::Url;

use crate::domain::FeedSpec;
use crate::net;

/// Conventional feed locations probed in order during discovery.
const FEED_PATHS: &[&str] = &[
    "/feed/",
    "/feed",
    "/rss/",
    "/rss",
    "/?feed=rss2",
    "/atom/",
    "/atom",
    "/index.xml",
    "/rss.xml",
    "/feed.xml",
    "/atom.xml",
];

/// Discovers a fetchable feed URL for sources that only supply a homepage.
pub struct FeedResolver {
    client: Client,
}

impl FeedResolver {
    pub fn new() -> Self {
        Self {
            client: net::primary_client(),
        }
    }

    /// Resolve the feed URL for a source. An explicit locator in the source
    /// configuration wins without probing; otherwise conventional paths are
    /// probed and finally the base page's alternate links are scanned.
    /// `None` means the source is not discoverable and should be skipped.
    pub fn resolve(&self, spec: &FeedSpec) -> Option<String> {
        if let Some(feed_url) = &spec.feed_url {
            if !feed_url.is_empty() {
                return Some(feed_url.clone());
            }
        }
        self.discover(&spec.base_url)
    }

    fn discover(&self, base_url: &str) -> Option<String> {
        let base = normalize_base(base_url);

        for path in FEED_PATHS {
            let candidate = format!("{}{}", base, path);
            if self.probe(&candidate) {
                info!(feed_url = %candidate, "discovered feed by convention");
                return Some(candidate);
            }
        }

        if let Some(found) = self.scan_alternate_links(&base) {
            info!(feed_url = %found, "discovered feed from HTML alternate link");
            return Some(found);
        }

        warn!(base_url, "could not discover a feed");
        None
    }

    /// Lightweight existence check: success status plus either a
    /// syndication content type or feed markers in the leading body bytes.
    fn probe(&self, candidate: &str) -> bool {
        let response = match self.client.head(candidate).send() {
            Ok(r) if r.status().is_success() => r,
            _ => return false,
        };

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_ascii_lowercase();

        if ["xml", "rss", "atom"].iter().any(|t| content_type.contains(t)) {
            return true;
        }

        self.sniff_body(candidate)
    }

    fn sniff_body(&self, candidate: &str) -> bool {
        let Ok(response) = self.client.get(candidate).send() else {
            return false;
        };
        if !response.status().is_success() {
            return false;
        }
        let Ok(text) = response.text() else {
            return false;
        };

        let head: String = text.chars().take(500).collect();
        let head = head.to_ascii_lowercase();
        head.contains("<rss") || head.contains("<feed") || head.contains("<channel>")
    }

    /// Scan the base page for `<link rel="alternate">` hints pointing at a
    /// syndication format, resolving relative references against the base.
    fn scan_alternate_links(&self, base: &str) -> Option<String> {
        let response = self.client.get(base).send().ok()?;
        if !response.status().is_success() {
            return None;
        }
        let body = response.text().ok()?;

        let document = Html::parse_document(&body);
        let selector = Selector::parse(r#"link[rel="alternate"]"#).ok()?;
        let base_parsed = Url::parse(base).ok()?;

        for link in document.select(&selector) {
            let link_type = link
                .value()
                .attr("type")
                .unwrap_or("")
                .to_ascii_lowercase();
            if !(link_type.contains("rss") || link_type.contains("atom") || link_type.contains("xml"))
            {
                continue;
            }
            if let Some(href) = link.value().attr("href") {
                if let Ok(joined) = base_parsed.join(href) {
                    return Some(joined.to_string());
                }
            }
        }

        None
    }
}

impl Default for FeedResolver {
    fn default() -> Self {
        Self::new()
    }
}

/// Ensure the base URL has a scheme and no trailing slashes before
/// appending probe paths.
fn normalize_base(base_url: &str) -> String {
    let mut base = if base_url.starts_with("http://") || base_url.starts_with("https://") {
        base_url.to_string()
    } else {
        format!("https://{}", base_url)
    };
    while base.ends_with('/') {
        base.pop();
    }
    base
}
