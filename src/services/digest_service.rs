use std::collections::HashSet;
use std::path::PathBuf;

use chrono::{Duration, NaiveDate, Utc};
use tracing::{info, warn};

use crate::config::Config;
use crate::domain::Digest;
use crate::errors::DigestResult;
use crate::feeds::{FeedPipeline, SelectionParams};
use crate::providers::{
    DEFAULT_MAX_EVENTS, DEFAULT_MAX_HEADLINES, GasProvider, HistoryProvider, HolidayProvider,
    NationalNewsProvider, WeatherProvider,
};
use crate::storage::{Ledger, SentRecord, TtlCache};

const GAS_CACHE_HOURS: i64 = 4;

/// Orchestrates one digest run: collect every domain, then persist the
/// outcome. Collection is sequential; a failing domain degrades to its
/// empty or placeholder form instead of failing the run.
pub struct DigestService<L: Ledger> {
    ledger: L,
    pipeline: FeedPipeline,
    national: NationalNewsProvider,
    weather: WeatherProvider,
    gas: GasProvider,
    holidays: HolidayProvider,
    history: HistoryProvider,
    config: Config,
}

impl<L: Ledger> DigestService<L> {
    pub fn new(config: Config, ledger: L) -> Self {
        let gas_cache = TtlCache::new(config.gas_cache_path.clone(), GAS_CACHE_HOURS);
        Self {
            ledger,
            pipeline: FeedPipeline::new(),
            national: NationalNewsProvider::new(config.news_api_key.clone()),
            weather: WeatherProvider::new(),
            gas: GasProvider::new(gas_cache, config.gas_api_key.clone()),
            holidays: HolidayProvider::new(
                config.calendarific_api_key.clone(),
                config.checkiday_api_key.clone(),
            ),
            history: HistoryProvider::new(),
            config,
        }
    }

    /// A run proceeds when forced or when no successful run exists for the
    /// date yet.
    pub fn should_run(&self, date: NaiveDate, force: bool) -> DigestResult<bool> {
        if force {
            return Ok(true);
        }
        let already_ran = self.ledger.already_ran_successfully(date)?;
        if already_ran {
            info!(%date, "already ran successfully today, skipping");
        }
        Ok(!already_ran)
    }

    /// Collect all domains for one digest.
    pub fn collect(&self, date: NaiveDate) -> Digest {
        let sent_urls = self.sent_snapshot();
        let params = SelectionParams {
            window_hours: self.config.window_hours,
            max_per_source: self.config.max_per_source,
            max_total: self.config.max_total,
        };

        let articles = self
            .pipeline
            .fetch_all(&self.config.sources.feeds, &sent_urls, &params);
        info!(count = articles.len(), "selected articles");

        let (headlines, headlines_status) = self.national.fetch(DEFAULT_MAX_HEADLINES);
        let (weather, weather_source_url) =
            self.weather.fetch_all(&self.config.sources.weather_locations);
        let gas = self.gas.fetch(&self.config.sources.gas_cities);
        let holidays = self.holidays.fetch(date);
        // History covers the next day so the digest reads ahead.
        let history = self.history.fetch(date + Duration::days(1), DEFAULT_MAX_EVENTS);

        Digest {
            date,
            articles,
            headlines,
            headlines_status,
            weather,
            weather_source_url,
            gas,
            holidays,
            history,
            generated_at: Utc::now(),
        }
    }

    /// Mark every surfaced article as sent and the run as successful.
    pub fn record_outcome(&self, digest: &Digest) -> DigestResult<()> {
        let records: Vec<SentRecord> = digest
            .articles
            .iter()
            .map(|item| SentRecord {
                canonical_url: item.canonical_url.clone(),
                title: item.title.clone(),
                source_name: item.source_name.clone(),
            })
            .collect();

        self.ledger.record_batch(&records)?;
        self.ledger.record_success(digest.date, digest.articles.len())?;
        Ok(())
    }

    pub fn record_failure(&self, date: NaiveDate, message: &str) -> DigestResult<()> {
        self.ledger.record_failure(date, message)
    }

    pub fn prune(&self, retention_days: u32) -> DigestResult<usize> {
        self.ledger.prune(retention_days)
    }

    /// Write the digest as a JSON draft artifact; returns the path.
    pub fn write_draft(&self, digest: &Digest) -> DigestResult<PathBuf> {
        std::fs::create_dir_all(&self.config.output_dir)?;
        let path = self
            .config
            .output_dir
            .join(format!("digest-{}.json", digest.date));
        let json = serde_json::to_string_pretty(digest)?;
        std::fs::write(&path, json)?;
        info!(path = %path.display(), "wrote digest draft");
        Ok(path)
    }

    /// Previously sent URLs. Failing to read them is survivable: the run
    /// proceeds without dedup rather than not at all.
    fn sent_snapshot(&self) -> HashSet<String> {
        match self.ledger.snapshot_all() {
            Ok(urls) => urls,
            Err(e) => {
                warn!(error = %e, "could not load sent-article snapshot, dedup disabled for this run");
                HashSet::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Sources;
    use crate::storage::traits::MockLedger;

    fn config() -> Config {
        Config {
            db_path: ":memory:".to_string(),
            sources: Sources::default(),
            output_dir: PathBuf::from("output"),
            gas_cache_path: PathBuf::from("data/gas.json"),
            news_api_key: None,
            calendarific_api_key: None,
            checkiday_api_key: None,
            gas_api_key: None,
            window_hours: 24,
            max_per_source: 6,
            max_total: 24,
            retention_days: 90,
        }
    }

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn test_should_run_skips_completed_date() {
        let mut ledger = MockLedger::new();
        ledger
            .expect_already_ran_successfully()
            .returning(|_| Ok(true));

        let service = DigestService::new(config(), ledger);
        assert!(!service.should_run(date("2026-01-05"), false).unwrap());
    }

    #[test]
    fn test_should_run_allows_fresh_date() {
        let mut ledger = MockLedger::new();
        ledger
            .expect_already_ran_successfully()
            .returning(|_| Ok(false));

        let service = DigestService::new(config(), ledger);
        assert!(service.should_run(date("2026-01-05"), false).unwrap());
    }

    #[test]
    fn test_force_bypasses_run_history() {
        // The ledger is never consulted when forcing
        let ledger = MockLedger::new();
        let service = DigestService::new(config(), ledger);
        assert!(service.should_run(date("2026-01-05"), true).unwrap());
    }

    #[test]
    fn test_sent_snapshot_degrades_on_error() {
        let mut ledger = MockLedger::new();
        ledger.expect_snapshot_all().returning(|| {
            Err(crate::errors::DigestError::Cache("disk gone".to_string()))
        });

        let service = DigestService::new(config(), ledger);
        assert!(service.sent_snapshot().is_empty());
    }

    #[test]
    fn test_record_outcome_writes_batch_and_success() {
        let mut ledger = MockLedger::new();
        ledger
            .expect_record_batch()
            .withf(|records| records.is_empty())
            .times(1)
            .returning(|_| Ok(()));
        ledger
            .expect_record_success()
            .withf(|d, count| *d == NaiveDate::from_ymd_opt(2026, 1, 5).unwrap() && *count == 0)
            .times(1)
            .returning(|_, _| Ok(()));

        let service = DigestService::new(config(), ledger);
        let digest = Digest {
            date: date("2026-01-05"),
            articles: Vec::new(),
            headlines: Vec::new(),
            headlines_status: None,
            weather: Vec::new(),
            weather_source_url: "https://www.weather.gov".to_string(),
            gas: crate::domain::GasReport {
                prices: Vec::new(),
                status_message: String::new(),
                source_url: String::new(),
            },
            holidays: crate::domain::HolidayReport {
                major_holidays: Vec::new(),
                fun_observances: Vec::new(),
                source_links: Vec::new(),
                status_message: None,
            },
            history: crate::domain::HistoryReport {
                events: Vec::new(),
                date_label: "January 06".to_string(),
                source_url: String::new(),
            },
            generated_at: Utc::now(),
        };

        service.record_outcome(&digest).unwrap();
    }
}
