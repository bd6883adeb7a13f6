use std::time::{Duration, Instant};

use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs, ResponseFormat,
        ResponseFormatJsonSchema,
    },
    Client,
};
use async_trait::async_trait;
use backoff::{ExponentialBackoff, ExponentialBackoffBuilder};
use tracing::{debug, info};

use crate::config::{Settings, API_KEY_VAR};
use crate::error::{CoreError, ProviderError};
use crate::schema::OutputSchema;

/// One fully rendered provider call.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// Role context, sent as the system message.
    pub system: String,
    pub prompt: String,
    pub model: String,
    pub temperature: f32,
    pub max_output_tokens: u32,
    /// When set, generation is constrained to this schema.
    pub response_schema: Option<OutputSchema>,
}

/// The LLM capability: given instructions, a prompt and an optional schema,
/// return the raw response text or fail.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<String, ProviderError>;
}

pub struct OpenAiProvider {
    client: Client<OpenAIConfig>,
}

impl OpenAiProvider {
    pub fn new(settings: &Settings) -> Result<Self, CoreError> {
        let api_key = settings.openai_api_key.trim();
        if api_key.is_empty() {
            return Err(CoreError::MissingCredential(API_KEY_VAR.to_string()));
        }

        let mut config = OpenAIConfig::new().with_api_key(api_key);
        if let Some(base) = &settings.openai_api_base {
            config = config.with_api_base(base.trim_end_matches('/'));
        }
        let client = Client::with_config(config).with_backoff(no_retries());

        info!(
            "OpenAI provider ready. Endpoint: {}",
            settings
                .openai_api_base
                .as_deref()
                .unwrap_or("https://api.openai.com/v1")
        );
        Ok(Self { client })
    }
}

/// The client retries rate limits and 5xx responses on its own by default.
fn no_retries() -> ExponentialBackoff {
    ExponentialBackoffBuilder::new()
        .with_max_elapsed_time(Some(Duration::ZERO))
        .build()
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<String, ProviderError> {
        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(request.system)
                .build()?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(request.prompt)
                .build()?
                .into(),
        ];

        let mut builder = CreateChatCompletionRequestArgs::default();
        builder
            .model(&request.model)
            .messages(messages)
            .temperature(request.temperature)
            .max_completion_tokens(request.max_output_tokens);

        if let Some(schema) = &request.response_schema {
            builder.response_format(ResponseFormat::JsonSchema {
                json_schema: ResponseFormatJsonSchema {
                    name: schema.name().to_string(),
                    description: schema.description().map(str::to_string),
                    schema: Some(schema.to_json_schema()),
                    strict: Some(true),
                },
            });
        }
        let chat_request = builder.build()?;

        debug!(
            model = %request.model,
            structured = request.response_schema.is_some(),
            "Sending chat completion"
        );
        let started = Instant::now();
        let response = self.client.chat().create(chat_request).await?;
        info!(
            model = %request.model,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Chat completion finished"
        );

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or(ProviderError::EmptyResponse)?;

        if let Some(refusal) = choice.message.refusal {
            return Err(ProviderError::Refusal(refusal));
        }

        choice
            .message
            .content
            .filter(|text| !text.trim().is_empty())
            .ok_or(ProviderError::EmptyResponse)
    }
}
