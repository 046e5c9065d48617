use feed_rs::model::Entry;
use reqwest::blocking::Client;
use scraper::{Html, Selector};
use tracing::debug;
use url::Url;

use crate::domain::{ContentItem, FeedSpec};
use crate::net;
use crate::utils::{canonicalize_url, clean_image_url, strip_html, truncate_text};

const SUMMARY_MAX: usize = 200;

/// File extensions treated as image evidence on untyped media URLs.
const IMAGE_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".gif", ".webp"];

/// Turns parsed feed entries into content items.
///
/// Image resolution walks a waterfall of candidates, cheapest first:
/// typed media attachments, media URLs with image extensions, thumbnails,
/// inline `<img>` tags in the body and summary, and finally social-card
/// metadata fetched from the article page itself.
pub struct EntryExtractor {
    page_client: Option<Client>,
}

impl EntryExtractor {
    pub fn new() -> Self {
        Self {
            page_client: Some(net::best_effort_client()),
        }
    }

    /// Extractor that never fetches article pages. Image resolution stops
    /// after the feed-local stages.
    pub fn without_page_fallback() -> Self {
        Self { page_client: None }
    }

    /// Build a content item from an entry, or `None` when the entry lacks
    /// the minimum of a link and a non-empty title.
    pub fn extract(&self, entry: &Entry, source: &FeedSpec) -> Option<ContentItem> {
        let link = entry
            .links
            .first()
            .map(|l| l.href.clone())
            .filter(|href| !href.is_empty())?;

        let title = strip_html(
            entry
                .title
                .as_ref()
                .map(|t| t.content.as_str())
                .unwrap_or(""),
        );
        if title.is_empty() {
            return None;
        }

        let summary = entry
            .summary
            .as_ref()
            .map(|s| truncate_text(&s.content, SUMMARY_MAX))
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| title.clone());

        let published_at = entry.published.or(entry.updated);

        Some(ContentItem {
            title,
            canonical_url: canonicalize_url(&link),
            raw_url: link,
            summary,
            image_url: None,
            published_at,
            source_name: source.name.clone(),
            source_url: source.base_url.clone(),
        })
    }

    /// Walk the image waterfall for an entry. Every stage is best-effort;
    /// `None` means the item ships without an image.
    pub fn resolve_image(&self, entry: &Entry, article_url: &str) -> Option<String> {
        if let Some(url) = typed_media_image(entry) {
            return Some(url);
        }
        if let Some(url) = media_image_by_extension(entry) {
            return Some(url);
        }
        if let Some(url) = thumbnail_image(entry) {
            return Some(url);
        }
        if let Some(body) = entry.content.as_ref().and_then(|c| c.body.as_deref()) {
            if let Some(url) = first_img_src(body) {
                return Some(url);
            }
        }
        if let Some(summary) = entry.summary.as_ref() {
            if let Some(url) = first_img_src(&summary.content) {
                return Some(url);
            }
        }
        self.page_image(article_url)
    }

    /// Last resort: fetch the article page and read its social-card
    /// metadata. Failures are silent by design of the short-timeout client.
    fn page_image(&self, article_url: &str) -> Option<String> {
        let client = self.page_client.as_ref()?;
        let response = client.get(article_url).send().ok()?;
        if !response.status().is_success() {
            return None;
        }
        let body = response.text().ok()?;
        let document = Html::parse_document(&body);

        for css in [
            r#"meta[property="og:image"]"#,
            r#"meta[name="twitter:image"]"#,
        ] {
            let selector = Selector::parse(css).ok()?;
            if let Some(content) = document
                .select(&selector)
                .find_map(|meta| meta.value().attr("content"))
            {
                let absolute = resolve_relative(article_url, content);
                if let Some(url) = clean_image_url(&absolute) {
                    debug!(article_url, "resolved image from article page");
                    return Some(url);
                }
            }
        }
        None
    }
}

impl Default for EntryExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Media attachments declaring an image content type.
fn typed_media_image(entry: &Entry) -> Option<String> {
    for media in &entry.media {
        for content in &media.content {
            let is_image = content
                .content_type
                .as_ref()
                .map(|m| m.to_string().starts_with("image/"))
                .unwrap_or(false);
            if !is_image {
                continue;
            }
            if let Some(url) = content.url.as_ref().and_then(|u| clean_image_url(u.as_str())) {
                return Some(url);
            }
        }
    }
    None
}

/// Untyped media attachments whose URL carries an image extension.
fn media_image_by_extension(entry: &Entry) -> Option<String> {
    for media in &entry.media {
        for content in &media.content {
            let Some(url) = content.url.as_ref() else {
                continue;
            };
            let lower = url.as_str().to_ascii_lowercase();
            if IMAGE_EXTENSIONS.iter().any(|ext| lower.contains(ext)) {
                if let Some(cleaned) = clean_image_url(url.as_str()) {
                    return Some(cleaned);
                }
            }
        }
    }
    None
}

fn thumbnail_image(entry: &Entry) -> Option<String> {
    for media in &entry.media {
        for thumbnail in &media.thumbnails {
            if let Some(url) = clean_image_url(&thumbnail.image.uri) {
                return Some(url);
            }
        }
    }
    None
}

/// First usable `<img src>` in an HTML fragment.
fn first_img_src(html: &str) -> Option<String> {
    if !html.contains("<img") {
        return None;
    }
    let fragment = Html::parse_fragment(html);
    let selector = Selector::parse("img").ok()?;
    fragment
        .select(&selector)
        .filter_map(|img| img.value().attr("src"))
        .find_map(clean_image_url)
}

fn resolve_relative(base: &str, candidate: &str) -> String {
    if candidate.starts_with("http://") || candidate.starts_with("https://") {
        return candidate.to_string();
    }
    Url::parse(base)
        .and_then(|b| b.join(candidate))
        .map(|u| u.to_string())
        .unwrap_or_else(|_| candidate.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use feed_rs::parser;

    fn source() -> FeedSpec {
        FeedSpec {
            name: "Test Source".to_string(),
            base_url: "https://news.example.com".to_string(),
            feed_url: None,
        }
    }

    fn parse_single_entry(xml: &str) -> Entry {
        let feed = parser::parse(xml.as_bytes()).unwrap();
        feed.entries.into_iter().next().unwrap()
    }

    fn rss_item(body: &str) -> String {
        format!(
            r#"<?xml version="1.0"?>
<rss version="2.0" xmlns:media="http://search.yahoo.com/mrss/">
<channel><title>Test</title><link>https://news.example.com</link>
<item>{}</item>
</channel></rss>"#,
            body
        )
    }

    #[test]
    fn test_extract_basic_fields() {
        let entry = parse_single_entry(&rss_item(
            "<title>Big &lt;b&gt;Story&lt;/b&gt;</title>\
             <link>https://news.example.com/story?utm_source=rss</link>\
             <description>Something happened downtown.</description>\
             <pubDate>Mon, 05 Jan 2026 10:00:00 GMT</pubDate>",
        ));

        let extractor = EntryExtractor::without_page_fallback();
        let item = extractor.extract(&entry, &source()).unwrap();

        assert_eq!(item.title, "Big Story");
        assert_eq!(item.raw_url, "https://news.example.com/story?utm_source=rss");
        assert_eq!(item.canonical_url, "https://news.example.com/story");
        assert_eq!(item.summary, "Something happened downtown.");
        assert!(item.published_at.is_some());
        assert_eq!(item.source_name, "Test Source");
    }

    #[test]
    fn test_extract_rejects_missing_title() {
        let entry = parse_single_entry(&rss_item(
            "<link>https://news.example.com/untitled</link>",
        ));

        let extractor = EntryExtractor::without_page_fallback();
        assert!(extractor.extract(&entry, &source()).is_none());
    }

    #[test]
    fn test_extract_summary_falls_back_to_title() {
        let entry = parse_single_entry(&rss_item(
            "<title>Headline Only</title>\
             <link>https://news.example.com/headline</link>",
        ));

        let extractor = EntryExtractor::without_page_fallback();
        let item = extractor.extract(&entry, &source()).unwrap();
        assert_eq!(item.summary, "Headline Only");
    }

    #[test]
    fn test_typed_enclosure_wins_over_body_image() {
        let entry = parse_single_entry(&rss_item(
            "<title>Story</title>\
             <link>https://news.example.com/story</link>\
             <enclosure url=\"https://cdn.example.com/lead.jpg\" type=\"image/jpeg\" length=\"0\"/>\
             <description>&lt;img src=\"https://cdn.example.com/inline.png\"/&gt;</description>",
        ));

        let extractor = EntryExtractor::without_page_fallback();
        let image = extractor.resolve_image(&entry, "https://news.example.com/story");
        assert_eq!(image.as_deref(), Some("https://cdn.example.com/lead.jpg"));
    }

    #[test]
    fn test_media_thumbnail_used_when_no_typed_content() {
        let entry = parse_single_entry(&rss_item(
            "<title>Story</title>\
             <link>https://news.example.com/story</link>\
             <media:thumbnail url=\"https://cdn.example.com/thumb.jpg\"/>",
        ));

        let extractor = EntryExtractor::without_page_fallback();
        let image = extractor.resolve_image(&entry, "https://news.example.com/story");
        assert_eq!(image.as_deref(), Some("https://cdn.example.com/thumb.jpg"));
    }

    #[test]
    fn test_inline_image_from_description() {
        let entry = parse_single_entry(&rss_item(
            "<title>Story</title>\
             <link>https://news.example.com/story</link>\
             <description>Intro text &lt;img src=\"https://cdn.example.com/photo.webp\"&gt; more.</description>",
        ));

        let extractor = EntryExtractor::without_page_fallback();
        let image = extractor.resolve_image(&entry, "https://news.example.com/story");
        assert_eq!(image.as_deref(), Some("https://cdn.example.com/photo.webp"));
    }

    #[test]
    fn test_no_image_is_none_without_page_fallback() {
        let entry = parse_single_entry(&rss_item(
            "<title>Story</title>\
             <link>https://news.example.com/story</link>\
             <description>Plain text only.</description>",
        ));

        let extractor = EntryExtractor::without_page_fallback();
        assert!(extractor
            .resolve_image(&entry, "https://news.example.com/story")
            .is_none());
    }

    #[test]
    fn test_first_img_src_skips_non_http() {
        let html = r#"<img src="data:image/png;base64,xyz"><img src="https://cdn.example.com/a.jpg">"#;
        assert_eq!(
            first_img_src(html).as_deref(),
            Some("https://cdn.example.com/a.jpg")
        );
    }

    #[test]
    fn test_resolve_relative_joins_against_article() {
        assert_eq!(
            resolve_relative("https://news.example.com/story", "/img/card.png"),
            "https://news.example.com/img/card.png"
        );
        assert_eq!(
            resolve_relative("https://news.example.com/story", "https://cdn.example.com/x.jpg"),
            "https://cdn.example.com/x.jpg"
        );
    }
}
