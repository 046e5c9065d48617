use chrono::{DateTime, Utc};
use reqwest::blocking::Client;
use serde::Deserialize;
use tracing::info;

use crate::domain::Headline;
use crate::errors::{DigestError, DigestResult};
use crate::fallback::FallbackChain;
use crate::net;
use crate::utils::strip_html;

const GOOGLE_NEWS_RSS: &str = "https://news.google.com/rss?hl=en-US&gl=US&ceid=US:en";
const NEWS_API_URL: &str = "https://newsapi.org/v2/top-headlines";

pub const DEFAULT_MAX_HEADLINES: usize = 3;

/// Top national headlines: Google News RSS first, NewsAPI as fallback
/// when a key is configured.
pub struct NationalNewsProvider {
    client: Client,
    api_key: Option<String>,
}

impl NationalNewsProvider {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            client: net::primary_client(),
            api_key,
        }
    }

    /// Returns the headlines plus a status message when every source came
    /// up empty.
    pub fn fetch(&self, max_headlines: usize) -> (Vec<Headline>, Option<String>) {
        let headlines = FallbackChain::new("national-news")
            .stage("google-news", || self.fetch_google_news(max_headlines))
            .stage("newsapi", || self.fetch_newsapi(max_headlines))
            .first_success();

        let status = if headlines.is_empty() {
            Some("National headlines are temporarily unavailable.".to_string())
        } else {
            None
        };
        (headlines, status)
    }

    fn fetch_google_news(&self, max_headlines: usize) -> DigestResult<Vec<Headline>> {
        let response = self
            .client
            .get(GOOGLE_NEWS_RSS)
            .send()?
            .error_for_status()?;
        let bytes = response.bytes()?;
        let feed = feed_rs::parser::parse(bytes.as_ref())
            .map_err(|e| DigestError::FeedParse(e.to_string()))?;

        let mut headlines = Vec::new();
        for entry in feed.entries.iter().take(max_headlines) {
            let raw_title = entry
                .title
                .as_ref()
                .map(|t| strip_html(&t.content))
                .unwrap_or_default();
            let Some(url) = entry.links.first().map(|l| l.href.clone()) else {
                continue;
            };
            if raw_title.is_empty() || url.is_empty() {
                continue;
            }

            let (title, source) = split_source_suffix(&raw_title);
            headlines.push(Headline {
                title,
                url,
                source,
                published_at: entry.published.or(entry.updated),
            });
        }

        info!(count = headlines.len(), "fetched headlines from Google News");
        Ok(headlines)
    }

    fn fetch_newsapi(&self, max_headlines: usize) -> DigestResult<Vec<Headline>> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(DigestError::MissingEnvVar("NEWS_API_KEY".to_string()));
        };

        let response = self
            .client
            .get(NEWS_API_URL)
            .query(&[
                ("country", "us"),
                ("pageSize", &max_headlines.to_string()),
                ("apiKey", api_key),
            ])
            .send()?
            .error_for_status()?;

        let body: NewsApiResponse = response.json()?;
        if body.status != "ok" {
            return Err(DigestError::Upstream(
                body.message.unwrap_or_else(|| "NewsAPI error".to_string()),
            ));
        }

        let headlines: Vec<Headline> = body
            .articles
            .into_iter()
            .filter_map(|article| {
                let title = article.title.filter(|t| !t.is_empty())?;
                let url = article.url.filter(|u| !u.is_empty())?;
                Some(Headline {
                    title: strip_html(&title),
                    url,
                    source: article
                        .source
                        .and_then(|s| s.name)
                        .unwrap_or_else(|| "Unknown".to_string()),
                    published_at: article.published_at,
                })
            })
            .take(max_headlines)
            .collect();

        info!(count = headlines.len(), "fetched headlines from NewsAPI");
        Ok(headlines)
    }
}

/// Google News encodes the outlet in the title as "Title - Source".
/// Split on the last separator so titles containing dashes survive.
fn split_source_suffix(raw_title: &str) -> (String, String) {
    if let Some(idx) = raw_title.rfind(" - ") {
        let title = raw_title[..idx].trim();
        let source = raw_title[idx + 3..].trim();
        if !title.is_empty() && !source.is_empty() {
            return (title.to_string(), source.to_string());
        }
    }
    (raw_title.to_string(), "Google News".to_string())
}

#[derive(Deserialize)]
struct NewsApiResponse {
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    articles: Vec<NewsApiArticle>,
}

#[derive(Deserialize)]
struct NewsApiArticle {
    title: Option<String>,
    url: Option<String>,
    #[serde(default)]
    source: Option<NewsApiSource>,
    #[serde(rename = "publishedAt")]
    published_at: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
struct NewsApiSource {
    name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_source_suffix() {
        let (title, source) = split_source_suffix("Senate passes budget bill - The Daily Ledger");
        assert_eq!(title, "Senate passes budget bill");
        assert_eq!(source, "The Daily Ledger");
    }

    #[test]
    fn test_split_source_suffix_uses_last_separator() {
        let (title, source) = split_source_suffix("Storm - and flooding - hit the coast - Wire Service");
        assert_eq!(title, "Storm - and flooding - hit the coast");
        assert_eq!(source, "Wire Service");
    }

    #[test]
    fn test_split_source_suffix_without_separator() {
        let (title, source) = split_source_suffix("Plain headline");
        assert_eq!(title, "Plain headline");
        assert_eq!(source, "Google News");
    }

    #[test]
    fn test_newsapi_requires_key() {
        let provider = NationalNewsProvider::new(None);
        assert!(matches!(
            provider.fetch_newsapi(3),
            Err(DigestError::MissingEnvVar(_))
        ));
    }

    #[test]
    fn test_newsapi_response_parsing() {
        let json = r#"{
            "status": "ok",
            "articles": [
                {"title": "Headline", "url": "https://example.com/a",
                 "source": {"name": "Example Wire"},
                 "publishedAt": "2026-01-05T12:00:00Z"}
            ]
        }"#;
        let parsed: NewsApiResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.status, "ok");
        assert_eq!(parsed.articles.len(), 1);
        assert_eq!(
            parsed.articles[0].source.as_ref().unwrap().name.as_deref(),
            Some("Example Wire")
        );
        assert!(parsed.articles[0].published_at.is_some());
    }
}
