use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::ContentItem;

/// A weather location keyed by coordinates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherLocation {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherForecast {
    pub location_name: String,
    pub high_temp: Option<i64>,
    pub low_temp: Option<i64>,
    pub precip_chance: Option<i64>,
    pub summary: String,
    pub forecast_url: String,
    #[serde(default)]
    pub detailed_forecast: String,
}

impl WeatherForecast {
    /// Placeholder shown when a location's forecast cannot be fetched.
    pub fn unavailable(location_name: &str) -> Self {
        Self {
            location_name: location_name.to_string(),
            high_temp: None,
            low_temp: None,
            precip_chance: None,
            summary: "Forecast temporarily unavailable".to_string(),
            forecast_url: "https://www.weather.gov".to_string(),
            detailed_forecast: String::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GasPrice {
    pub location: String,
    pub regular: Option<f64>,
    #[serde(default)]
    pub midgrade: Option<f64>,
    #[serde(default)]
    pub premium: Option<f64>,
    #[serde(default)]
    pub diesel: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GasReport {
    pub prices: Vec<GasPrice>,
    pub status_message: String,
    pub source_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Headline {
    pub title: String,
    pub url: String,
    pub source: String,
    pub published_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoricalEvent {
    pub year: String,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryReport {
    pub events: Vec<HistoricalEvent>,
    /// Display label for the day the events belong to, e.g. "January 06".
    pub date_label: String,
    pub source_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HolidayReport {
    pub major_holidays: Vec<String>,
    pub fun_observances: Vec<String>,
    pub source_links: Vec<String>,
    pub status_message: Option<String>,
}

/// Everything one run collected, in the order it is presented.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Digest {
    pub date: NaiveDate,
    pub articles: Vec<ContentItem>,
    pub headlines: Vec<Headline>,
    pub headlines_status: Option<String>,
    pub weather: Vec<WeatherForecast>,
    pub weather_source_url: String,
    pub gas: GasReport,
    pub holidays: HolidayReport,
    pub history: HistoryReport,
    pub generated_at: DateTime<Utc>,
}
