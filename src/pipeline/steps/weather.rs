//! Weather step: looks up the city and writes the structured report plus its
//! summary text.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::error::StepError;
use crate::pipeline::record::{Field, Record};
use crate::pipeline::step::Step;
use crate::weather::{WeatherLookup, WeatherReport};

pub struct FetchWeatherStep {
    lookup: Arc<dyn WeatherLookup>,
}

impl FetchWeatherStep {
    pub fn new(lookup: Arc<dyn WeatherLookup>) -> Self {
        Self { lookup }
    }
}

#[async_trait]
impl Step for FetchWeatherStep {
    fn name(&self) -> &str {
        "fetch_weather"
    }

    fn reads(&self) -> &[Field] {
        &[Field::City]
    }

    fn writes(&self) -> &[Field] {
        &[Field::Weather, Field::WeatherText]
    }

    /// An absent or blank city skips the network call and yields no data.
    /// Transport and configuration failures propagate.
    async fn run(&self, record: &Record) -> Result<Record, StepError> {
        let city = record.city.as_deref().unwrap_or_default().trim();

        let report = if city.is_empty() {
            debug!("No city given, skipping lookup");
            WeatherReport::NoData
        } else {
            self.lookup.lookup(city).await?
        };

        let text = report.summary();
        info!(
            city,
            provider = self.lookup.name(),
            found = report.observed().is_some(),
            "Weather lookup complete"
        );

        Ok(Record::new().with_weather(report).with_weather_text(text))
    }
}
