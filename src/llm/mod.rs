//! Language-model access.
//!
//! The reasoning step only sees [`LlmProvider`]. Concrete models come from
//! rig-core (OpenAI by default, Anthropic optionally) wrapped in
//! [`RigAdapter`].

mod costs;
pub mod provider;
mod rig_adapter;

pub use costs::model_cost;
pub use provider::*;
pub use rig_adapter::RigAdapter;

use std::sync::Arc;

use rig::client::CompletionClient;
use secrecy::{ExposeSecret, SecretString};

use crate::error::{ConfigError, LlmError};

/// Which hosted model family answers questions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmBackend {
    Anthropic,
    OpenAi,
}

impl LlmBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Anthropic => "anthropic",
            Self::OpenAi => "openai",
        }
    }

    fn api_key_var(&self) -> &'static str {
        match self {
            Self::Anthropic => "ANTHROPIC_API_KEY",
            Self::OpenAi => "OPENAI_API_KEY",
        }
    }

    fn default_model(&self) -> &'static str {
        match self {
            Self::Anthropic => "claude-3-5-haiku-latest",
            Self::OpenAi => "gpt-4o-mini",
        }
    }
}

impl std::str::FromStr for LlmBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "anthropic" => Ok(Self::Anthropic),
            other => Err(ConfigError::InvalidValue {
                key: "LLM_BACKEND".into(),
                message: format!("unknown backend {other:?} (expected openai or anthropic)"),
            }),
        }
    }
}

/// Model selection plus the credential for its backend.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub backend: LlmBackend,
    pub api_key: SecretString,
    pub model: String,
}

impl LlmConfig {
    /// `LLM_BACKEND` picks the backend (default `openai`) and its `*_API_KEY`
    /// must be set. `LLM_MODEL` replaces the backend's default model.
    pub fn from_vars<F>(var: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let backend = var("LLM_BACKEND")
            .map(|raw| raw.parse::<LlmBackend>())
            .transpose()?
            .unwrap_or(LlmBackend::OpenAi);

        let key_var = backend.api_key_var();
        let api_key = var(key_var)
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar(key_var.to_string()))?;

        let model = var("LLM_MODEL")
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| backend.default_model().to_string());

        Ok(Self {
            backend,
            api_key: SecretString::from(api_key),
            model,
        })
    }
}

/// Build the model client for `config`.
///
/// No request is made here, so a wrong key only shows up on the first call.
pub fn create_provider(config: &LlmConfig) -> Result<Arc<dyn LlmProvider>, LlmError> {
    let key = config.api_key.expose_secret();
    let backend = config.backend.as_str();

    let provider: Arc<dyn LlmProvider> = match config.backend {
        LlmBackend::OpenAi => {
            let client: rig::client::Client<rig::providers::openai::client::OpenAIResponsesExt> =
                rig::providers::openai::Client::new(key).map_err(|e| client_error(backend, e))?;
            Arc::new(RigAdapter::new(
                client.completion_model(&config.model),
                &config.model,
                backend,
            ))
        }
        LlmBackend::Anthropic => {
            let client: rig::client::Client<rig::providers::anthropic::client::AnthropicExt> =
                rig::providers::anthropic::Client::new(key)
                    .map_err(|e| client_error(backend, e))?;
            Arc::new(RigAdapter::new(
                client.completion_model(&config.model),
                &config.model,
                backend,
            ))
        }
    };

    tracing::info!(backend, model = %config.model, "Language model ready");
    Ok(provider)
}

fn client_error(backend: &str, e: impl std::fmt::Display) -> LlmError {
    LlmError::RequestFailed {
        provider: backend.to_string(),
        reason: format!("client setup failed: {e}"),
    }
}
