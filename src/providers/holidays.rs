use chrono::{Datelike, NaiveDate};
use reqwest::blocking::Client;
use scraper::{ElementRef, Html, Selector};
use serde::Deserialize;
use tracing::{info, warn};

use crate::domain::HolidayReport;
use crate::errors::{DigestError, DigestResult};
use crate::net;

const NAGER_API: &str = "https://date.nager.at/api/v3";
const CALENDARIFIC_API: &str = "https://calendarific.com/api/v2";
const CHECKIDAY_API: &str = "https://www.checkiday.com/api/3";

const MAX_OBSERVANCES: usize = 12;

/// Holidays and observances for a date. Official holidays come from
/// Nager.Date (keyless) plus Calendarific; fun observances come from
/// Calendarific and Checkiday, with the Wikipedia day page as a last
/// resort when both keys are missing or dry.
pub struct HolidayProvider {
    client: Client,
    calendarific_key: Option<String>,
    checkiday_key: Option<String>,
}

impl HolidayProvider {
    pub fn new(calendarific_key: Option<String>, checkiday_key: Option<String>) -> Self {
        Self {
            client: net::primary_client(),
            calendarific_key,
            checkiday_key,
        }
    }

    pub fn fetch(&self, check_date: NaiveDate) -> HolidayReport {
        let mut major_holidays = Vec::new();
        let mut fun_observances = Vec::new();
        let mut source_links = Vec::new();

        match self.fetch_nager(check_date) {
            Ok(holidays) => {
                info!(count = holidays.len(), "official holidays from Nager.Date");
                major_holidays.extend(holidays);
                push_unique(&mut source_links, "https://date.nager.at");
            }
            Err(e) => warn!(error = %e, "Nager.Date lookup failed"),
        }

        if let Some(key) = self.calendarific_key.as_deref() {
            match self.fetch_calendarific(key, check_date) {
                Ok((official, fun)) => {
                    info!(
                        official = official.len(),
                        observances = fun.len(),
                        "holidays from Calendarific"
                    );
                    for name in official {
                        if !contains_ci(&major_holidays, &name) {
                            major_holidays.push(name);
                        }
                    }
                    fun_observances.extend(fun);
                    push_unique(&mut source_links, "https://calendarific.com");
                }
                Err(e) => warn!(error = %e, "Calendarific lookup failed"),
            }
        }

        if let Some(key) = self.checkiday_key.as_deref() {
            match self.fetch_checkiday(key, check_date) {
                Ok(observances) => {
                    info!(count = observances.len(), "observances from Checkiday");
                    fun_observances.extend(observances);
                    push_unique(&mut source_links, "https://www.checkiday.com");
                }
                Err(e) => warn!(error = %e, "Checkiday lookup failed"),
            }
        }

        if fun_observances.is_empty() {
            match self.scrape_wikipedia(check_date) {
                Ok(observances) if !observances.is_empty() => {
                    info!(count = observances.len(), "observances from Wikipedia");
                    push_unique(&mut source_links, &day_page_url(check_date));
                    fun_observances.extend(observances);
                }
                Ok(_) => {}
                Err(e) => warn!(error = %e, "Wikipedia observances scrape failed"),
            }
        }

        let status_message = if self.calendarific_key.is_none() && self.checkiday_key.is_none() {
            warn!("no holiday API keys configured for fun observances");
            Some(
                "Fun observances unavailable today (missing API key or provider error). \
                 Configure CALENDARIFIC_API_KEY or CHECKIDAY_API_KEY to enable."
                    .to_string(),
            )
        } else if fun_observances.is_empty() {
            Some("No fun observances found for today.".to_string())
        } else {
            None
        };

        HolidayReport {
            major_holidays,
            fun_observances: curate_observances(fun_observances, MAX_OBSERVANCES),
            source_links,
            status_message,
        }
    }

    fn fetch_nager(&self, check_date: NaiveDate) -> DigestResult<Vec<String>> {
        let url = format!("{}/PublicHolidays/{}/US", NAGER_API, check_date.year());
        let holidays: Vec<NagerHoliday> = self
            .client
            .get(&url)
            .send()?
            .error_for_status()?
            .json()?;

        let target = check_date.to_string();
        Ok(holidays
            .into_iter()
            .filter(|h| h.date == target)
            .filter_map(|h| h.name.filter(|n| !n.is_empty()))
            .collect())
    }

    fn fetch_calendarific(
        &self,
        api_key: &str,
        check_date: NaiveDate,
    ) -> DigestResult<(Vec<String>, Vec<String>)> {
        let body: CalendarificResponse = self
            .client
            .get(format!("{}/holidays", CALENDARIFIC_API))
            .query(&[
                ("api_key", api_key),
                ("country", "US"),
                ("year", &check_date.year().to_string()),
                ("month", &check_date.month().to_string()),
                ("day", &check_date.day().to_string()),
                ("type", "observance,local,religious,national"),
            ])
            .send()?
            .error_for_status()?
            .json()?;

        if body.meta.code != 200 {
            return Err(DigestError::Upstream(format!(
                "Calendarific returned code {}",
                body.meta.code
            )));
        }

        let mut official = Vec::new();
        let mut fun = Vec::new();
        for holiday in body.response.holidays {
            let Some(name) = holiday.name.filter(|n| !n.is_empty()) else {
                continue;
            };
            let is_official = holiday
                .types
                .iter()
                .any(|t| t == "National holiday" || t == "Federal holiday");
            if is_official {
                if !contains_ci(&official, &name) {
                    official.push(name);
                }
            } else if !contains_ci(&fun, &name) {
                fun.push(name);
            }
        }
        Ok((official, fun))
    }

    fn fetch_checkiday(&self, api_key: &str, check_date: NaiveDate) -> DigestResult<Vec<String>> {
        let body: CheckidayResponse = self
            .client
            .get(format!("{}/", CHECKIDAY_API))
            .query(&[
                ("apiKey", api_key),
                ("date", &check_date.format("%Y-%m-%d").to_string()),
            ])
            .send()?
            .error_for_status()?
            .json()?;

        if !body.ok {
            return Err(DigestError::Upstream(
                body.error.unwrap_or_else(|| "Checkiday error".to_string()),
            ));
        }

        Ok(body
            .holidays
            .into_iter()
            .filter_map(|h| h.name.filter(|n| !n.is_empty()))
            .collect())
    }

    /// Scrape the "Holidays and observances" section of the Wikipedia day
    /// page.
    fn scrape_wikipedia(&self, check_date: NaiveDate) -> DigestResult<Vec<String>> {
        let url = day_page_url(check_date);
        let body = self.client.get(&url).send()?.error_for_status()?.text()?;

        let document = Html::parse_document(&body);
        let heading_selector =
            Selector::parse("h2").map_err(|e| DigestError::Upstream(e.to_string()))?;
        let item_selector =
            Selector::parse("li").map_err(|e| DigestError::Upstream(e.to_string()))?;

        let heading = document
            .select(&heading_selector)
            .find(|h| {
                let text = h.text().collect::<String>().to_lowercase();
                text.contains("observances") || text.contains("holidays")
            })
            .ok_or_else(|| {
                DigestError::Upstream("no observances section on day page".to_string())
            })?;

        let start = heading
            .parent()
            .and_then(ElementRef::wrap)
            .filter(|p| p.value().attr("class").unwrap_or("").contains("mw-heading"))
            .unwrap_or(heading);

        let mut observances = Vec::new();
        for sibling in start.next_siblings() {
            let Some(element) = ElementRef::wrap(sibling) else {
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
                if let Some(text) = clean_observance_line(&li.text().collect::<String>()) {
                    if !contains_ci(&observances, &text) {
                        observances.push(text);
                    }
                }
            }
        }

        observances.truncate(15);
        Ok(observances)
    }
}

#[derive(Deserialize)]
struct NagerHoliday {
    #[serde(default)]
    date: String,
    name: Option<String>,
}

#[derive(Deserialize)]
struct CalendarificResponse {
    meta: CalendarificMeta,
    #[serde(default)]
    response: CalendarificBody,
}

#[derive(Deserialize)]
struct CalendarificMeta {
    #[serde(default)]
    code: i64,
}

#[derive(Deserialize, Default)]
struct CalendarificBody {
    #[serde(default)]
    holidays: Vec<CalendarificHoliday>,
}

#[derive(Deserialize)]
struct CalendarificHoliday {
    name: Option<String>,
    #[serde(rename = "type", default)]
    types: Vec<String>,
}

#[derive(Deserialize)]
struct CheckidayResponse {
    #[serde(default)]
    ok: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    holidays: Vec<CheckidayHoliday>,
}

#[derive(Deserialize)]
struct CheckidayHoliday {
    name: Option<String>,
}

fn day_page_url(check_date: NaiveDate) -> String {
    format!(
        "https://en.wikipedia.org/wiki/{}_{}",
        check_date.format("%B"),
        check_date.day()
    )
}

fn contains_ci(haystack: &[String], needle: &str) -> bool {
    haystack.iter().any(|h| h.eq_ignore_ascii_case(needle))
}

fn push_unique(links: &mut Vec<String>, url: &str) {
    if !links.iter().any(|l| l == url) {
        links.push(url.to_string());
    }
}

/// Tidy a scraped list entry: first line only, citations stripped, plain
/// category headers ("Christian feast day:") and implausible lengths
/// dropped.
fn clean_observance_line(raw: &str) -> Option<String> {
    let text = raw.lines().next().unwrap_or("");
    let text = text.split('[').next().unwrap_or("").trim();
    if text.len() <= 3 || text.len() >= 100 || text.contains(':') {
        return None;
    }
    Some(text.to_string())
}

/// Score observances by how recognizable they read and keep the best.
/// Deduplication is case-insensitive; order among equal scores is the
/// arrival order.
pub fn curate_observances(observances: Vec<String>, max_count: usize) -> Vec<String> {
    const PRIORITY_KEYWORDS: &[&str] = &[
        "national",
        "world",
        "international",
        "day",
        "week",
        "month",
        "awareness",
        "appreciation",
        "celebration",
    ];
    const FILTER_KEYWORDS: &[&str] = &["sponsored", "trademark", "\u{ae}", "\u{2122}"];

    let mut scored: Vec<(i32, String)> = Vec::new();
    for obs in observances {
        let lower = obs.to_lowercase();
        if FILTER_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
            continue;
        }

        let mut score = PRIORITY_KEYWORDS
            .iter()
            .filter(|kw| lower.contains(*kw))
            .count() as i32;
        if lower.contains("national") && lower.contains("day") {
            score += 2;
        }
        scored.push((score, obs));
    }

    scored.sort_by_key(|(score, _)| std::cmp::Reverse(*score));

    let mut seen = std::collections::HashSet::new();
    let mut result = Vec::new();
    for (_, obs) in scored {
        let key = obs.trim().to_lowercase();
        if seen.insert(key) {
            result.push(obs);
            if result.len() >= max_count {
                break;
            }
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_curate_prefers_recognizable_names() {
        let curated = curate_observances(
            strings(&[
                "Obscure Regional Fair",
                "National Pie Day",
                "World Water Day",
            ]),
            2,
        );
        assert_eq!(curated, strings(&["National Pie Day", "World Water Day"]));
    }

    #[test]
    fn test_curate_filters_commercial_entries() {
        let curated = curate_observances(
            strings(&["National Widget Day\u{2122}", "Sponsored Snack Day", "World Kindness Day"]),
            12,
        );
        assert_eq!(curated, strings(&["World Kindness Day"]));
    }

    #[test]
    fn test_curate_dedups_case_insensitively() {
        let curated = curate_observances(
            strings(&["National Pie Day", "NATIONAL PIE DAY", "national pie day"]),
            12,
        );
        assert_eq!(curated.len(), 1);
    }

    #[test]
    fn test_curate_respects_cap() {
        let many: Vec<String> = (0..20).map(|n| format!("National Thing {} Day", n)).collect();
        assert_eq!(curate_observances(many, 12).len(), 12);
    }

    #[test]
    fn test_clean_observance_line() {
        assert_eq!(
            clean_observance_line("Arbor Day[3]\nsecond line"),
            Some("Arbor Day".to_string())
        );
        assert!(clean_observance_line("Christian feast day: Saint X").is_none());
        assert!(clean_observance_line("ab").is_none());
        let long = "x".repeat(120);
        assert!(clean_observance_line(&long).is_none());
    }

    #[test]
    fn test_calendarific_type_categorization() {
        let json = r#"{
            "meta": {"code": 200},
            "response": {"holidays": [
                {"name": "New Year's Day", "type": ["National holiday"]},
                {"name": "Trivia Day", "type": ["Observance"]}
            ]}
        }"#;
        let parsed: CalendarificResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.meta.code, 200);
        assert_eq!(parsed.response.holidays.len(), 2);
        assert!(parsed.response.holidays[0]
            .types
            .iter()
            .any(|t| t == "National holiday"));
    }

    #[test]
    fn test_checkiday_response_parsing() {
        let json = r#"{"ok": true, "holidays": [{"name": "National Bird Day"}]}"#;
        let parsed: CheckidayResponse = serde_json::from_str(json).unwrap();
        assert!(parsed.ok);
        assert_eq!(
            parsed.holidays[0].name.as_deref(),
            Some("National Bird Day")
        );
    }

    #[test]
    fn test_missing_keys_status_message() {
        let provider = HolidayProvider::new(None, None);
        assert!(provider.calendarific_key.is_none());
        assert!(provider.checkiday_key.is_none());
    }
}
