//! OpenWeatherMap current-weather client.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::debug;

use super::{Weather, WeatherLookup, WeatherReport, title_case};
use crate::error::{ConfigError, WeatherError};

const DEFAULT_BASE_URL: &str = "http://api.openweathermap.org";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

// ── Configuration ───────────────────────────────────────────────────

/// Weather client configuration, built from environment variables.
#[derive(Debug, Clone)]
pub struct WeatherConfig {
    pub api_key: SecretString,
    pub base_url: String,
    pub timeout: Duration,
}

impl WeatherConfig {
    /// Build config from a variable source.
    ///
    /// `WEATHER_API_KEY` is required; its absence is a fatal configuration error.
    pub fn from_vars<F>(var: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = var("WEATHER_API_KEY")
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingRequired {
                key: "WEATHER_API_KEY".into(),
                hint: "Create an OpenWeatherMap API key and export WEATHER_API_KEY".into(),
            })?;

        let base_url = var("WEATHER_API_BASE_URL")
            .map(|s| s.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let timeout_secs = match var("WEATHER_TIMEOUT_SECS") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidValue {
                key: "WEATHER_TIMEOUT_SECS".into(),
                message: format!("expected whole seconds, got {raw:?}"),
            })?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self {
            api_key: SecretString::from(api_key),
            base_url,
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

// ── Client ──────────────────────────────────────────────────────────

/// Looks up current conditions through the OpenWeatherMap REST API.
pub struct OpenWeatherClient {
    config: WeatherConfig,
    client: reqwest::Client,
}

impl OpenWeatherClient {
    pub fn new(config: WeatherConfig) -> Result<Self, ConfigError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ConfigError::InvalidValue {
                key: "WEATHER_TIMEOUT_SECS".into(),
                message: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self { config, client })
    }

    fn endpoint(&self) -> String {
        format!("{}/data/2.5/weather", self.config.base_url)
    }
}

#[async_trait]
impl WeatherLookup for OpenWeatherClient {
    fn name(&self) -> &str {
        "openweathermap"
    }

    async fn lookup(&self, city: &str) -> Result<WeatherReport, WeatherError> {
        debug!(city, "Requesting current weather");

        let response = self
            .client
            .get(self.endpoint())
            .query(&[
                ("q", city),
                ("appid", self.config.api_key.expose_secret()),
                ("units", "metric"),
            ])
            .send()
            .await
            .map_err(|e| WeatherError::Transport {
                city: city.to_string(),
                reason: e.without_url().to_string(),
            })?;

        let status = response.status();
        let body: Value = response
            .json()
            .await
            .map_err(|e| WeatherError::InvalidResponse {
                city: city.to_string(),
                reason: format!("HTTP {status}: body is not JSON ({})", e.without_url()),
            })?;

        let report = parse_current_weather(city, &body)?;
        debug!(city, %status, "OpenWeatherMap response parsed");
        Ok(report)
    }
}

// ── Parsing (public for testing) ────────────────────────────────────

/// Whether the body's `cod` field reports success. The API sends it as either
/// a number or a string.
pub fn is_success_code(body: &Value) -> bool {
    match body.get("cod") {
        Some(Value::Number(n)) => n.as_u64() == Some(200),
        Some(Value::String(s)) => s.trim() == "200",
        _ => false,
    }
}

/// Normalize a current-weather response body.
///
/// A non-200 `cod` yields `NoData`. A 200 body missing a required field is
/// an invalid response.
pub fn parse_current_weather(city: &str, body: &Value) -> Result<WeatherReport, WeatherError> {
    if !is_success_code(body) {
        debug!(
            city,
            cod = %body.get("cod").cloned().unwrap_or(serde_json::Value::Null),
            message = body.get("message").and_then(serde_json::Value::as_str).unwrap_or(""),
            "Weather service returned no data"
        );
        return Ok(WeatherReport::NoData);
    }

    let missing = |field: &str| WeatherError::InvalidResponse {
        city: city.to_string(),
        reason: format!("missing {field}"),
    };

    let description = body
        .pointer("/weather/0/description")
        .and_then(Value::as_str)
        .ok_or_else(|| missing("weather[0].description"))?;
    let temp_c = body
        .pointer("/main/temp")
        .and_then(Value::as_f64)
        .ok_or_else(|| missing("main.temp"))?;
    let humidity = body
        .pointer("/main/humidity")
        .and_then(Value::as_f64)
        .ok_or_else(|| missing("main.humidity"))?;
    let wind = body.pointer("/wind/speed").and_then(Value::as_f64);
    let observed_at = body
        .get("dt")
        .and_then(Value::as_i64)
        .and_then(|ts| chrono::DateTime::from_timestamp(ts, 0));

    Ok(WeatherReport::Observed(Weather {
        city: title_case(city),
        description: description.to_string(),
        temp_c,
        humidity: humidity.round() as u32,
        wind,
        observed_at,
    }))
}
