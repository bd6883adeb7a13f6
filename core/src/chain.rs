use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::config::Settings;
use crate::error::Result;
use crate::llm::{CompletionRequest, LlmProvider, OpenAiProvider};
use crate::registry::TaskDefinition;
use crate::template::Variables;

/// What a chain hands back: a schema-validated object, or raw text when the
/// task declares no schema.
#[derive(Debug, Clone, PartialEq)]
pub enum ChainOutput {
    Structured(Value),
    Text(String),
}

impl ChainOutput {
    /// Serialized form used when this output feeds another prompt.
    pub fn to_prompt_text(&self) -> String {
        match self {
            // Value serialization is infallible.
            ChainOutput::Structured(value) => {
                serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
            }
            ChainOutput::Text(text) => text.clone(),
        }
    }

    pub fn into_value(self) -> Value {
        match self {
            ChainOutput::Structured(value) => value,
            ChainOutput::Text(text) => Value::String(text),
        }
    }
}

/// A task definition bound to a provider.
#[derive(Clone)]
pub struct Chain {
    definition: Arc<TaskDefinition>,
    provider: Arc<dyn LlmProvider>,
}

impl Chain {
    pub fn new(definition: TaskDefinition, provider: Arc<dyn LlmProvider>) -> Self {
        Self {
            definition: Arc::new(definition),
            provider,
        }
    }

    /// Bind to OpenAI. Fails here, not on first use, when the key is missing.
    pub fn from_settings(definition: TaskDefinition, settings: &Settings) -> Result<Self> {
        let provider = OpenAiProvider::new(settings)?;
        Ok(Self::new(definition, Arc::new(provider)))
    }

    pub fn definition(&self) -> &TaskDefinition {
        &self.definition
    }

    /// Render both templates into the request the provider will see.
    pub fn build_request(&self, variables: &Variables) -> Result<CompletionRequest> {
        let task = &self.definition;
        Ok(CompletionRequest {
            system: task.system_instruction().render(variables)?,
            prompt: task.prompt_template().render(variables)?,
            model: task.model_id().to_string(),
            temperature: task.temperature(),
            max_output_tokens: task.max_output_tokens(),
            response_schema: task.output_schema().cloned(),
        })
    }

    pub async fn invoke(&self, variables: &Variables) -> Result<ChainOutput> {
        let request = self.build_request(variables)?;
        debug!(
            task = self.definition.id(),
            prompt_chars = request.prompt.len(),
            "Invoking chain"
        );

        let raw = self.provider.complete(request).await?;

        match self.definition.output_schema() {
            Some(schema) => Ok(ChainOutput::Structured(schema.parse(&raw)?)),
            None => Ok(ChainOutput::Text(raw)),
        }
    }
}
