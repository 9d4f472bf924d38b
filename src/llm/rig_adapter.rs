//! Bridges rig's `CompletionModel` to our [`LlmProvider`] trait.

use async_trait::async_trait;
use rig::completion::CompletionModel;
use rig::message::AssistantContent;
use rust_decimal::Decimal;

use crate::error::LlmError;
use crate::llm::costs::model_cost;
use crate::llm::provider::{ChatMessage, CompletionRequest, CompletionResponse, LlmProvider, Role};

/// Wraps any rig completion model as an [`LlmProvider`].
pub struct RigAdapter<M> {
    model: M,
    model_name: String,
    provider: &'static str,
}

impl<M> RigAdapter<M> {
    pub fn new(model: M, model_name: &str, provider: &'static str) -> Self {
        Self {
            model,
            model_name: model_name.to_string(),
            provider,
        }
    }
}

#[async_trait]
impl<M> LlmProvider for RigAdapter<M>
where
    M: CompletionModel + Send + Sync + 'static,
{
    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn cost_per_token(&self) -> (Decimal, Decimal) {
        model_cost(&self.model_name)
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let (preamble, prompt) = split_messages(&request.messages);
        if prompt.is_empty() {
            return Err(LlmError::RequestFailed {
                provider: self.provider.to_string(),
                reason: "completion request has no user content".to_string(),
            });
        }

        let mut builder = self.model.completion_request(prompt);
        if let Some(preamble) = preamble {
            builder = builder.preamble(preamble);
        }
        if let Some(temperature) = request.temperature {
            builder = builder.temperature(temperature);
        }
        if let Some(max_tokens) = request.max_tokens {
            builder = builder.max_tokens(u64::from(max_tokens));
        }

        let response = builder.send().await.map_err(|e| LlmError::RequestFailed {
            provider: self.provider.to_string(),
            reason: e.to_string(),
        })?;

        let content: String = response
            .choice
            .iter()
            .filter_map(|c| match c {
                AssistantContent::Text(text) => Some(text.text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("");

        if content.trim().is_empty() {
            return Err(LlmError::InvalidResponse {
                provider: self.provider.to_string(),
                reason: "response contained no text".to_string(),
            });
        }

        Ok(CompletionResponse {
            content,
            input_tokens: u32::try_from(response.usage.input_tokens).unwrap_or(u32::MAX),
            output_tokens: u32::try_from(response.usage.output_tokens).unwrap_or(u32::MAX),
        })
    }
}

/// Split chat messages into an optional preamble (all system messages) and
/// a single prompt (all other messages, in order).
fn split_messages(messages: &[ChatMessage]) -> (Option<String>, String) {
    let system: Vec<&str> = messages
        .iter()
        .filter(|m| m.role == Role::System)
        .map(|m| m.content.as_str())
        .collect();
    let turns: Vec<&ChatMessage> = messages.iter().filter(|m| m.role != Role::System).collect();

    let preamble = (!system.is_empty()).then(|| system.join("\n\n"));
    let prompt = match turns.as_slice() {
        [only] => only.content.clone(),
        many => many
            .iter()
            .map(|m| match m.role {
                Role::Assistant => format!("Assistant: {}", m.content),
                _ => format!("User: {}", m.content),
            })
            .collect::<Vec<_>>()
            .join("\n"),
    };
    (preamble, prompt)
}
