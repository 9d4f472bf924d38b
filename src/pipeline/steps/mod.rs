//! The weather agent's three steps and their canonical wiring.

mod notify;
mod reason;
mod weather;

pub use notify::NotifyStep;
pub use reason::{DEFAULT_QUESTION, REASON_TEMPERATURE, ReasonStep, build_prompt};
pub use weather::FetchWeatherStep;

use std::sync::Arc;

use crate::error::PipelineError;
use crate::llm::LlmProvider;
use crate::notify::{EmailSender, MessageSender};
use crate::pipeline::runner::Pipeline;
use crate::weather::WeatherLookup;

/// Wire weather → reason → notify around the given collaborators.
pub fn weather_agent_pipeline(
    weather: Arc<dyn WeatherLookup>,
    llm: Arc<dyn LlmProvider>,
    email: Arc<dyn EmailSender>,
    messenger: Arc<dyn MessageSender>,
) -> Result<Pipeline, PipelineError> {
    Pipeline::builder()
        .add_step(FetchWeatherStep::new(weather))
        .add_step(ReasonStep::new(llm))
        .add_step(NotifyStep::new(email, messenger))
        .build()
}
