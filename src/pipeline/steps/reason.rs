//! Reasoning step: asks the model to answer the user's question from the
//! weather summary.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::error::StepError;
use crate::llm::{ChatMessage, CompletionRequest, LlmProvider, estimate_cost};
use crate::pipeline::record::{Field, Record};
use crate::pipeline::step::Step;
use crate::weather::NO_WEATHER_DATA;

/// Question used when the record carries none.
pub const DEFAULT_QUESTION: &str = "Give a helpful weather summary.";

/// Moderate sampling temperature for a short conversational answer.
pub const REASON_TEMPERATURE: f64 = 0.4;

/// Answers are one or two sentences.
const REASON_MAX_TOKENS: u32 = 256;

/// Build the prompt sent to the model.
pub fn build_prompt(weather_text: &str, question: &str) -> String {
    format!(
        "You are a concise, friendly weather assistant.\n\
         Use the provided weather info to answer in 1-2 sentences.\n\
         Weather info: {weather_text}\n\
         User question: {question}\n"
    )
}

pub struct ReasonStep {
    llm: Arc<dyn LlmProvider>,
}

impl ReasonStep {
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl Step for ReasonStep {
    fn name(&self) -> &str {
        "reason"
    }

    fn reads(&self) -> &[Field] {
        &[Field::Question, Field::WeatherText]
    }

    fn writes(&self) -> &[Field] {
        &[Field::Answer]
    }

    async fn run(&self, record: &Record) -> Result<Record, StepError> {
        let question = record.question.as_deref().unwrap_or(DEFAULT_QUESTION);
        let weather_text = record.weather_text.as_deref().unwrap_or(NO_WEATHER_DATA);

        let request = CompletionRequest::new(vec![ChatMessage::user(build_prompt(
            weather_text,
            question,
        ))])
        .with_temperature(REASON_TEMPERATURE)
        .with_max_tokens(REASON_MAX_TOKENS);

        let response = self.llm.complete(request).await?;

        info!(
            model = self.llm.model_name(),
            input_tokens = response.input_tokens,
            output_tokens = response.output_tokens,
            cost_usd = %estimate_cost(self.llm.as_ref(), &response),
            "Answer generated"
        );

        Ok(Record::new().with_answer(response.content.trim()))
    }
}
