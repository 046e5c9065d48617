use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use serde::Deserialize;
use tracing::{error, info, warn};

use crate::domain::{WeatherForecast, WeatherLocation};
use crate::errors::{DigestError, DigestResult};
use crate::net;

const NWS_API_BASE: &str = "https://api.weather.gov";
const WEATHER_HOME: &str = "https://www.weather.gov";
const DETAILED_MAX: usize = 200;

/// National Weather Service forecasts. Every configured location yields a
/// forecast; failures produce a placeholder so the report never has holes.
pub struct WeatherProvider {
    client: Client,
}

impl WeatherProvider {
    pub fn new() -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/geo+json"));
        let client = Client::builder()
            .timeout(net::PRIMARY_TIMEOUT)
            .user_agent(net::USER_AGENT)
            .default_headers(headers)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self { client }
    }

    /// Fetch forecasts for all locations, in configuration order.
    pub fn fetch_all(&self, locations: &[WeatherLocation]) -> (Vec<WeatherForecast>, String) {
        let mut forecasts = Vec::with_capacity(locations.len());
        for location in locations {
            match self.fetch_forecast(location) {
                Ok(forecast) => forecasts.push(forecast),
                Err(e) => {
                    error!(location = %location.name, error = %e, "forecast fetch failed");
                    forecasts.push(WeatherForecast::unavailable(&location.name));
                }
            }
        }
        (forecasts, WEATHER_HOME.to_string())
    }

    fn fetch_forecast(&self, location: &WeatherLocation) -> DigestResult<WeatherForecast> {
        let points_url = format!("{}/points/{},{}", NWS_API_BASE, location.lat, location.lon);
        let point: PointResponse = self
            .client
            .get(&points_url)
            .send()?
            .error_for_status()?
            .json()?;

        let forecast_url = point
            .properties
            .forecast
            .ok_or_else(|| DigestError::Upstream("point metadata has no forecast URL".to_string()))?;

        let forecast: ForecastResponse = self
            .client
            .get(&forecast_url)
            .send()?
            .error_for_status()?
            .json()?;

        let periods = forecast.properties.periods;
        if periods.is_empty() {
            warn!(location = %location.name, "no forecast periods returned");
            return Err(DigestError::Upstream("forecast has no periods".to_string()));
        }

        let mut high_temp = None;
        let mut low_temp = None;
        let mut precip_chance: Option<i64> = None;

        // The first two periods cover today and tonight; day periods carry
        // the high, night periods the low.
        for period in periods.iter().take(2) {
            match (period.is_daytime, period.temperature) {
                (true, Some(t)) => high_temp = Some(t),
                (false, Some(t)) => low_temp = Some(t),
                _ => {}
            }
            if let Some(prob) = period
                .probability_of_precipitation
                .as_ref()
                .and_then(|p| p.value)
            {
                if precip_chance.map(|c| prob > c).unwrap_or(true) {
                    precip_chance = Some(prob);
                }
            }
        }

        // Backfill a missing high or low from the next few periods.
        if high_temp.is_none() {
            high_temp = periods
                .iter()
                .skip(1)
                .take(3)
                .find(|p| p.is_daytime && p.temperature.is_some())
                .and_then(|p| p.temperature);
        }
        if low_temp.is_none() {
            low_temp = periods
                .iter()
                .skip(1)
                .take(3)
                .find(|p| !p.is_daytime && p.temperature.is_some())
                .and_then(|p| p.temperature);
        }

        let first = &periods[0];
        let summary = if first.short_forecast.is_empty() {
            "Forecast unavailable".to_string()
        } else {
            first.short_forecast.clone()
        };

        let mut detailed = first.detailed_forecast.clone();
        if detailed.chars().count() > DETAILED_MAX {
            detailed = detailed.chars().take(DETAILED_MAX - 3).collect::<String>() + "...";
        }

        info!(location = %location.name, "fetched forecast");
        Ok(WeatherForecast {
            location_name: location.name.clone(),
            high_temp,
            low_temp,
            precip_chance,
            summary,
            forecast_url: format!(
                "https://forecast.weather.gov/MapClick.php?lat={}&lon={}",
                location.lat, location.lon
            ),
            detailed_forecast: detailed,
        })
    }
}

impl Default for WeatherProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Deserialize)]
struct PointResponse {
    properties: PointProperties,
}

#[derive(Deserialize)]
struct PointProperties {
    forecast: Option<String>,
}

#[derive(Deserialize)]
struct ForecastResponse {
    properties: ForecastProperties,
}

#[derive(Deserialize)]
struct ForecastProperties {
    #[serde(default)]
    periods: Vec<ForecastPeriod>,
}

#[derive(Deserialize)]
struct ForecastPeriod {
    #[serde(default)]
    temperature: Option<i64>,
    #[serde(rename = "isDaytime", default = "default_daytime")]
    is_daytime: bool,
    #[serde(rename = "probabilityOfPrecipitation", default)]
    probability_of_precipitation: Option<PrecipProbability>,
    #[serde(rename = "shortForecast", default)]
    short_forecast: String,
    #[serde(rename = "detailedForecast", default)]
    detailed_forecast: String,
}

#[derive(Deserialize)]
struct PrecipProbability {
    value: Option<i64>,
}

fn default_daytime() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn period_json(temp: i64, daytime: bool, precip: Option<i64>) -> String {
        let precip_value = precip
            .map(|p| p.to_string())
            .unwrap_or_else(|| "null".to_string());
        format!(
            r#"{{"temperature": {temp}, "isDaytime": {daytime},
                "probabilityOfPrecipitation": {{"value": {precip_value}}},
                "shortForecast": "Partly Cloudy",
                "detailedForecast": "Partly cloudy with light winds."}}"#
        )
    }

    #[test]
    fn test_forecast_response_parsing() {
        let json = format!(
            r#"{{"properties": {{"periods": [{}, {}]}}}}"#,
            period_json(72, true, Some(20)),
            period_json(48, false, Some(60)),
        );

        let parsed: ForecastResponse = serde_json::from_str(&json).unwrap();
        let periods = &parsed.properties.periods;
        assert_eq!(periods.len(), 2);
        assert_eq!(periods[0].temperature, Some(72));
        assert!(periods[0].is_daytime);
        assert!(!periods[1].is_daytime);
        assert_eq!(
            periods[1]
                .probability_of_precipitation
                .as_ref()
                .unwrap()
                .value,
            Some(60)
        );
    }

    #[test]
    fn test_point_response_tolerates_missing_forecast() {
        let parsed: PointResponse = serde_json::from_str(r#"{"properties": {}}"#).unwrap();
        assert!(parsed.properties.forecast.is_none());
    }

    #[test]
    fn test_missing_period_fields_default() {
        let parsed: ForecastResponse =
            serde_json::from_str(r#"{"properties": {"periods": [{}]}}"#).unwrap();
        let period = &parsed.properties.periods[0];
        assert!(period.temperature.is_none());
        assert!(period.is_daytime);
        assert!(period.short_forecast.is_empty());
    }

    #[test]
    fn test_unavailable_placeholder() {
        let placeholder = WeatherForecast::unavailable("Tupelo");
        assert_eq!(placeholder.location_name, "Tupelo");
        assert!(placeholder.high_temp.is_none());
        assert_eq!(placeholder.summary, "Forecast temporarily unavailable");
    }
}
