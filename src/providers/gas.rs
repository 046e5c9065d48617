use reqwest::blocking::Client;
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::domain::{GasPrice, GasReport};
use crate::errors::DigestResult;
use crate::net;
use crate::storage::TtlCache;

const AAA_STATE_URL: &str = "https://gasprices.aaa.com/?state=MS";
const STATE_AVERAGE_LABEL: &str = "Mississippi (State Average)";

/// Plausibility window for a US retail gas price, dollars per gallon.
const PRICE_MIN: f64 = 1.5;
const PRICE_MAX: f64 = 8.0;

#[derive(Serialize, Deserialize)]
struct CachedGasReport {
    prices: Vec<GasPrice>,
    status_message: String,
}

/// Gas prices with an on-disk cache so repeated runs within a few hours
/// do not re-scrape AAA.
pub struct GasProvider {
    client: Client,
    cache: TtlCache,
    api_key: Option<String>,
}

impl GasProvider {
    pub fn new(cache: TtlCache, api_key: Option<String>) -> Self {
        Self {
            client: net::primary_client(),
            cache,
            api_key,
        }
    }

    /// City names are configuration for a future city-level source; today
    /// every report carries the statewide average.
    pub fn fetch(&self, cities: &[String]) -> GasReport {
        debug!(cities = cities.len(), "gas price lookup");

        if let Some(cached) = self.cached_report() {
            info!("using cached gas prices");
            return GasReport {
                prices: cached.prices,
                status_message: cached.status_message,
                source_url: AAA_STATE_URL.to_string(),
            };
        }

        if self.api_key.is_some() {
            // No city-level price API is integrated yet; the key is accepted
            // so configuration does not need to change when one lands.
            debug!("gas API key configured but unused, falling through to AAA");
        }

        let report = match self.scrape_state_average() {
            Ok(Some(price)) => GasReport {
                prices: vec![price],
                status_message: "City-level gas prices are not available. \
                                 Showing Mississippi statewide average from AAA."
                    .to_string(),
                source_url: AAA_STATE_URL.to_string(),
            },
            Ok(None) | Err(_) => GasReport {
                prices: vec![GasPrice {
                    location: STATE_AVERAGE_LABEL.to_string(),
                    regular: None,
                    midgrade: None,
                    premium: None,
                    diesel: None,
                }],
                status_message: "Gas price data temporarily unavailable. \
                                 Visit AAA for current prices."
                    .to_string(),
                source_url: AAA_STATE_URL.to_string(),
            },
        };

        let cached = CachedGasReport {
            prices: report.prices.clone(),
            status_message: report.status_message.clone(),
        };
        if let Err(e) = self.cache.save(&cached) {
            error!(error = %e, "failed to save gas price cache");
        }

        report
    }

    /// A fresh cached report with at least one price row. An envelope
    /// holding no prices does not short-circuit the fetch.
    fn cached_report(&self) -> Option<CachedGasReport> {
        self.cache
            .load::<CachedGasReport>()
            .filter(|cached| !cached.prices.is_empty())
    }

    fn scrape_state_average(&self) -> DigestResult<Option<GasPrice>> {
        let body = self
            .client
            .get(AAA_STATE_URL)
            .send()?
            .error_for_status()?
            .text()?;

        Ok(extract_state_average(&body))
    }
}

/// Pull the statewide regular price out of the AAA page. The markup is not
/// stable, so price-classed elements are tried first and any short
/// dollar-prefixed text node second.
fn extract_state_average(body: &str) -> Option<GasPrice> {
    let document = Html::parse_document(body);

    let mut regular = None;
    if let Ok(selector) =
        Selector::parse(r#"span[class*="price"], div[class*="price"], td[class*="price"]"#)
    {
        regular = document
            .select(&selector)
            .filter_map(|el| parse_price(&el.text().collect::<String>()))
            .next();
    }

    if regular.is_none() {
        regular = document
            .root_element()
            .text()
            .map(str::trim)
            .filter(|t| t.starts_with('$') && t.len() < 10)
            .filter_map(parse_price)
            .next();
    }

    regular.map(|price| GasPrice {
        location: STATE_AVERAGE_LABEL.to_string(),
        regular: Some(price),
        midgrade: None,
        premium: None,
        diesel: None,
    })
}

/// Parse "$3.05" style text into a price, rejecting values outside the
/// plausible range so page furniture like "$0" or "$2024" never wins.
fn parse_price(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    let stripped = trimmed.strip_prefix('$')?;
    let price: f64 = stripped.replace(',', "").parse().ok()?;
    if price > PRICE_MIN && price < PRICE_MAX {
        Some(price)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_price_in_range() {
        assert_eq!(parse_price("$3.05"), Some(3.05));
        assert_eq!(parse_price(" $2.899 "), Some(2.899));
    }

    #[test]
    fn test_parse_price_rejects_out_of_range() {
        assert!(parse_price("$0.99").is_none());
        assert!(parse_price("$2024").is_none());
        assert!(parse_price("$1,200.00").is_none());
    }

    #[test]
    fn test_parse_price_rejects_non_prices() {
        assert!(parse_price("3.05").is_none());
        assert!(parse_price("$abc").is_none());
        assert!(parse_price("").is_none());
    }

    #[test]
    fn test_extract_from_price_classed_element() {
        let html = r#"<html><body>
            <div class="average-price">$2.95</div>
        </body></html>"#;

        let price = extract_state_average(html).unwrap();
        assert_eq!(price.regular, Some(2.95));
        assert_eq!(price.location, STATE_AVERAGE_LABEL);
    }

    #[test]
    fn test_extract_falls_back_to_text_scan() {
        let html = r#"<html><body>
            <p>Current average: <b>$3.15</b> per gallon</p>
        </body></html>"#;

        let price = extract_state_average(html).unwrap();
        assert_eq!(price.regular, Some(3.15));
    }

    #[test]
    fn test_extract_none_when_no_plausible_price() {
        let html = "<html><body><p>$99,000 grand prize!</p></body></html>";
        assert!(extract_state_average(html).is_none());
    }

    #[test]
    fn test_cache_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let cache = TtlCache::new(dir.path().join("gas.json"), 4);
        let provider = GasProvider::new(cache, None);

        let report = CachedGasReport {
            prices: vec![GasPrice {
                location: STATE_AVERAGE_LABEL.to_string(),
                regular: Some(3.01),
                midgrade: None,
                premium: None,
                diesel: None,
            }],
            status_message: "from cache".to_string(),
        };
        provider.cache.save(&report).unwrap();

        let result = provider.fetch(&["Tupelo, MS".to_string()]);
        assert_eq!(result.status_message, "from cache");
        assert_eq!(result.prices[0].regular, Some(3.01));
    }

    #[test]
    fn test_cached_report_ignores_empty_prices() {
        let dir = tempfile::tempdir().unwrap();
        let cache = TtlCache::new(dir.path().join("gas.json"), 4);
        let provider = GasProvider::new(cache, None);

        let report = CachedGasReport {
            prices: Vec::new(),
            status_message: "nothing captured".to_string(),
        };
        provider.cache.save(&report).unwrap();

        assert!(provider.cached_report().is_none());
    }
}
