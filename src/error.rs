//! Error types for the weather agent.

/// Any failure the library can surface to a driver.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Weather error: {0}")]
    Weather(#[from] WeatherError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A driver already reported the failed run; the cause is only logged.
    #[error("Weather agent run failed")]
    RunFailed,
}

/// Configuration-related errors. Always fatal: they abort startup or the run.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} is not set")]
    MissingEnvVar(String),

    #[error("{key} is not set. {hint}")]
    MissingRequired { key: String, hint: String },

    #[error("{key} has an invalid value: {message}")]
    InvalidValue { key: String, message: String },
}

/// Weather lookup errors.
///
/// A lookup that answers but carries no usable data is not an error; it is
/// reported as [`crate::weather::WeatherReport::NoData`].
#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("Weather request for {city} failed: {reason}")]
    Transport { city: String, reason: String },

    #[error("Invalid weather response for {city}: {reason}")]
    InvalidResponse { city: String, reason: String },

    #[error("Weather lookup is not configured: {0}")]
    Config(#[from] ConfigError),
}

/// Language-model errors. Both propagate out of the reasoning step.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("{provider} completion failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("{provider} returned an unusable completion: {reason}")]
    InvalidResponse { provider: String, reason: String },
}

/// Notification delivery errors.
///
/// These never leave the notify step: senders turn them into a `false` result
/// and a log line.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("{channel} is not configured")]
    NotConfigured { channel: String },

    #[error("Failed to send on {channel}: {reason}")]
    SendFailed { channel: String, reason: String },

    #[error("{channel} rejected the message with status {status}: {body}")]
    Rejected {
        channel: String,
        status: u16,
        body: String,
    },
}

/// Error raised by a single pipeline step.
#[derive(Debug, thiserror::Error)]
pub enum StepError {
    #[error(transparent)]
    Weather(#[from] WeatherError),

    #[error(transparent)]
    Llm(#[from] LlmError),
}

/// Pipeline construction and execution errors.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Pipeline has no steps")]
    Empty,

    #[error("Step name {0} is used more than once")]
    DuplicateStep(String),

    #[error("Step {step} reads {field} before any earlier step writes it")]
    UnsatisfiedRead { step: String, field: String },

    #[error("Field {field} is written by both {first} and {second}")]
    FieldWrittenTwice {
        field: String,
        first: String,
        second: String,
    },

    #[error("Step {step} wrote undeclared field {field}")]
    UndeclaredWrite { step: String, field: String },

    #[error("Step {step} failed: {source}")]
    Step {
        step: String,
        #[source]
        source: StepError,
    },
}

impl PipelineError {
    /// Whether this failure comes from missing or invalid configuration
    /// rather than from a transport or model call.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::Step {
                source: StepError::Weather(WeatherError::Config(_)),
                ..
            }
        )
    }
}

/// Shorthand for results carrying [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
