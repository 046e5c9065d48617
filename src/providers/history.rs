use chrono::{Datelike, NaiveDate};
use regex::Regex;
use reqwest::blocking::Client;
use scraper::{Html, Selector};
use serde::Deserialize;
use std::sync::OnceLock;
use tracing::info;

use crate::domain::{HistoricalEvent, HistoryReport};
use crate::errors::{DigestError, DigestResult};
use crate::fallback::FallbackChain;
use crate::net;

const WIKIPEDIA_API: &str = "https://en.wikipedia.org/api/rest_v1";

pub const DEFAULT_MAX_EVENTS: usize = 8;

/// "This day in history" events from Wikipedia: the On This Day REST API
/// first, a scrape of the day page as fallback.
pub struct HistoryProvider {
    client: Client,
}

impl HistoryProvider {
    pub fn new() -> Self {
        Self {
            client: net::primary_client(),
        }
    }

    pub fn fetch(&self, target_date: NaiveDate, max_events: usize) -> HistoryReport {
        let source_url = day_page_url(target_date);

        let events = FallbackChain::new("history")
            .stage("onthisday-api", || self.fetch_api(target_date, max_events))
            .stage("page-scrape", || self.scrape_day_page(target_date, max_events))
            .first_success();

        HistoryReport {
            events,
            date_label: target_date.format("%B %d").to_string(),
            source_url,
        }
    }

    fn fetch_api(
        &self,
        target_date: NaiveDate,
        max_events: usize,
    ) -> DigestResult<Vec<HistoricalEvent>> {
        let url = format!(
            "{}/feed/onthisday/events/{}/{}",
            WIKIPEDIA_API,
            target_date.month(),
            target_date.day()
        );

        let body: OnThisDayResponse = self
            .client
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()?
            .error_for_status()?
            .json()?;

        let raw: Vec<(i64, String)> = body
            .events
            .into_iter()
            .filter_map(|event| {
                let year = event.year?;
                let text = event.text.filter(|t| !t.is_empty())?;
                Some((year, text))
            })
            .collect();

        let events = balance_eras(raw, max_events);
        info!(
            count = events.len(),
            month = target_date.month(),
            day = target_date.day(),
            "fetched historical events"
        );
        Ok(events)
    }

    /// Scrape the Events section of the Wikipedia day page. List items read
    /// "Year – Description" with one of several dash characters.
    fn scrape_day_page(
        &self,
        target_date: NaiveDate,
        max_events: usize,
    ) -> DigestResult<Vec<HistoricalEvent>> {
        let url = day_page_url(target_date);
        let body = self.client.get(&url).send()?.error_for_status()?.text()?;

        let document = Html::parse_document(&body);
        let heading_selector = Selector::parse("h2")
            .map_err(|e| DigestError::Upstream(e.to_string()))?;
        let item_selector = Selector::parse("li")
            .map_err(|e| DigestError::Upstream(e.to_string()))?;

        let heading = document
            .select(&heading_selector)
            .find(|h| h.text().collect::<String>().contains("Events"))
            .ok_or_else(|| DigestError::Upstream("no Events section on day page".to_string()))?;

        // Headings are wrapped in a container div on current page markup, so
        // walk siblings of the wrapper when there is one.
        let start = heading
            .parent()
            .and_then(scraper::ElementRef::wrap)
            .filter(|p| p.value().attr("class").unwrap_or("").contains("mw-heading"))
            .unwrap_or(heading);

        let mut events = Vec::new();
        for sibling in start.next_siblings() {
            let Some(element) = scraper::ElementRef::wrap(sibling) else {
                continue;
            };
            let name = element.value().name();
            if name == "h2" || (name == "div" && element.select(&heading_selector).next().is_some())
            {
                break;
            }
            if name != "ul" {
                continue;
            }
            for li in element.select(&item_selector) {
                let text = li.text().collect::<String>();
                if let Some(event) = parse_event_line(text.trim()) {
                    events.push(event);
                    if events.len() >= max_events {
                        return Ok(events);
                    }
                }
            }
        }

        info!(count = events.len(), "scraped historical events");
        Ok(events)
    }
}

impl Default for HistoryProvider {
    fn default() -> Self {
        Self::new()
    }
}

fn day_page_url(target_date: NaiveDate) -> String {
    format!(
        "https://en.wikipedia.org/wiki/{}_{}",
        target_date.format("%B"),
        target_date.day()
    )
}

fn event_line_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d+)\s*[–\-—]\s*(.+)$").unwrap())
}

fn parse_event_line(text: &str) -> Option<HistoricalEvent> {
    let captures = event_line_regex().captures(text)?;
    Some(HistoricalEvent {
        year: captures[1].to_string(),
        text: clip(&captures[2], 200),
    })
}

fn clip(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let clipped: String = text.chars().take(max - 3).collect();
        format!("{}...", clipped.trim_end())
    } else {
        text.to_string()
    }
}

/// Pick a spread of events across eras rather than the newest N. Each era
/// contributes up to its share; leftovers fill from newest to oldest, and
/// the final list reads chronologically.
fn balance_eras(mut raw: Vec<(i64, String)>, max_events: usize) -> Vec<HistoricalEvent> {
    raw.sort_by(|a, b| b.0.cmp(&a.0));

    let mut recent = Vec::new();
    let mut modern = Vec::new();
    let mut mid_century = Vec::new();
    let mut historical = Vec::new();

    for (year, text) in raw {
        let event = HistoricalEvent {
            year: year.to_string(),
            text: clip(&text, 200),
        };
        if year >= 2000 {
            recent.push(event);
        } else if year >= 1950 {
            modern.push(event);
        } else if year >= 1900 {
            mid_century.push(event);
        } else {
            historical.push(event);
        }
    }

    let per_era = std::cmp::max(1, max_events / 4);
    let mut selected: Vec<HistoricalEvent> = Vec::new();
    for era in [&recent, &modern, &mid_century, &historical] {
        selected.extend(era.iter().take(per_era).cloned());
    }

    if selected.len() < max_events {
        for event in recent
            .iter()
            .chain(&modern)
            .chain(&mid_century)
            .chain(&historical)
        {
            if selected.len() >= max_events {
                break;
            }
            if !selected.contains(event) {
                selected.push(event.clone());
            }
        }
    }

    selected.sort_by_key(|e| e.year.parse::<i64>().unwrap_or(0));
    selected.truncate(max_events);
    selected
}

#[derive(Deserialize)]
struct OnThisDayResponse {
    #[serde(default)]
    events: Vec<OnThisDayEvent>,
}

#[derive(Deserialize)]
struct OnThisDayEvent {
    year: Option<i64>,
    text: Option<String>,
}
