//! Current-conditions weather lookup.
//!
//! The pipeline only sees [`WeatherLookup`]. A lookup has three outcomes:
//! - `Ok(WeatherReport::Observed(..))`: normalized data
//! - `Ok(WeatherReport::NoData)`: the service answered but has nothing for this city
//! - `Err(WeatherError)`: transport failure or missing configuration; propagates

pub mod openweather;

pub use openweather::{OpenWeatherClient, WeatherConfig};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::WeatherError;

/// Summary used whenever no weather data is available.
pub const NO_WEATHER_DATA: &str = "No weather data.";

/// Normalized current conditions for one city.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Weather {
    /// Title-cased city label.
    pub city: String,
    pub description: String,
    /// Temperature in degrees Celsius.
    pub temp_c: f64,
    /// Relative humidity, percent.
    pub humidity: u32,
    /// Wind speed in m/s, when reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wind: Option<f64>,
    /// Observation time reported by the provider.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_at: Option<DateTime<Utc>>,
}

impl Weather {
    /// Readable one-line summary.
    ///
    /// Clauses are fixed and joined by single spaces; the wind clause only
    /// appears when a wind speed is present.
    pub fn summary(&self) -> String {
        let mut parts = vec![
            format!("The weather in {} is {}.", self.city, self.description),
            format!("Temperature: {}°C.", self.temp_c),
            format!("Humidity: {}%.", self.humidity),
        ];
        if let Some(wind) = self.wind {
            parts.push(format!("Wind: {wind} m/s."));
        }
        parts.join(" ")
    }
}

/// Outcome of a successful lookup round-trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum WeatherReport {
    Observed(Weather),
    NoData,
}

impl WeatherReport {
    pub fn observed(&self) -> Option<&Weather> {
        match self {
            Self::Observed(weather) => Some(weather),
            Self::NoData => None,
        }
    }

    /// Summary text for this report, falling back to [`NO_WEATHER_DATA`].
    pub fn summary(&self) -> String {
        format_weather_text(self.observed())
    }
}

/// Turn normalized weather into readable text.
pub fn format_weather_text(weather: Option<&Weather>) -> String {
    match weather {
        Some(w) => w.summary(),
        None => NO_WEATHER_DATA.to_string(),
    }
}

/// Title-case a string: the first letter after any non-letter is uppercased,
/// every other letter lowercased.
pub fn title_case(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut prev_is_letter = false;
    for ch in input.chars() {
        if ch.is_alphabetic() {
            if prev_is_letter {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            prev_is_letter = true;
        } else {
            out.push(ch);
            prev_is_letter = false;
        }
    }
    out
}

/// A current-conditions weather service.
#[async_trait]
pub trait WeatherLookup: Send + Sync {
    /// Provider name for logging.
    fn name(&self) -> &str;

    /// Look up current conditions for `city` (already trimmed).
    async fn lookup(&self, city: &str) -> Result<WeatherReport, WeatherError>;
}
