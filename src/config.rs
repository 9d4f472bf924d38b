//! Configuration types.
//!
//! Everything is read from environment variables through a variable-source
//! closure, so tests can supply a map instead of mutating the process
//! environment. `main` pre-loads `.env` with dotenvy.

use std::net::SocketAddr;
use std::sync::Arc;

use crate::error::{ConfigError, Error};
use crate::llm::{LlmConfig, LlmProvider, create_provider};
use crate::notify::{EmailConfig, SmtpEmailSender, TwilioConfig, TwilioSender};
use crate::pipeline::{Pipeline, weather_agent_pipeline};
use crate::weather::{OpenWeatherClient, WeatherConfig};

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8000;

/// HTTP listener settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl ServerConfig {
    pub fn from_vars<F>(var: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = var("WEATHER_AGENT_HOST")
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_HOST.to_string());

        let port = match var("WEATHER_AGENT_PORT") {
            Some(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: "WEATHER_AGENT_PORT".into(),
                message: format!("'{raw}' is not a valid port"),
            })?,
            None => DEFAULT_PORT,
        };

        Ok(Self { host, port })
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| ConfigError::InvalidValue {
                key: "WEATHER_AGENT_HOST".into(),
                message: format!("{e}"),
            })
    }
}

/// Full application configuration.
///
/// Weather and model credentials are required; a missing one fails here,
/// before any pipeline exists. Email and Twilio are optional and a `None`
/// simply disables the channel.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub weather: WeatherConfig,
    pub llm: LlmConfig,
    pub email: Option<EmailConfig>,
    pub twilio: Option<TwilioConfig>,
    pub server: ServerConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    pub fn from_vars<F>(var: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            weather: WeatherConfig::from_vars(&var)?,
            llm: LlmConfig::from_vars(&var)?,
            email: EmailConfig::from_vars(&var),
            twilio: TwilioConfig::from_vars(&var),
            server: ServerConfig::from_vars(&var)?,
        })
    }

    /// Build the production pipeline: OpenWeatherMap, the configured model,
    /// SMTP email and Twilio.
    pub fn build_pipeline(&self) -> Result<Pipeline, Error> {
        let llm = create_provider(&self.llm)?;
        self.build_pipeline_with(llm)
    }

    /// Same as [`AppConfig::build_pipeline`] with a caller-supplied model.
    pub fn build_pipeline_with(&self, llm: Arc<dyn LlmProvider>) -> Result<Pipeline, Error> {
        let weather = Arc::new(OpenWeatherClient::new(self.weather.clone())?);
        let email = Arc::new(SmtpEmailSender::new(self.email.clone()));
        let messenger = Arc::new(TwilioSender::new(self.twilio.clone()));

        tracing::info!(
            model = %self.llm.model,
            email = self.email.is_some(),
            whatsapp = self.twilio.is_some(),
            "Pipeline configured"
        );

        Ok(weather_agent_pipeline(weather, llm, email, messenger)?)
    }
}
