use async_openai::error::OpenAIError;
use thiserror::Error;

/// Failure while parsing or rendering a prompt template.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("template references variable '{0}' which was not supplied")]
    MissingVariable(String),

    #[error("invalid template syntax: {0}")]
    Syntax(String),

    #[error("failed to render template: {0}")]
    Render(String),
}

/// A provider response that does not conform to the declared output schema.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{path}: {reason}")]
pub struct SchemaViolation {
    /// Location of the offending value, rooted at `$`.
    pub path: String,
    pub reason: String,
}

impl SchemaViolation {
    pub fn new(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Failure reported by the LLM capability itself.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Network, timeout, authentication and rate-limit failures all surface here.
    #[error("OpenAI request failed: {0}")]
    Api(#[from] OpenAIError),

    #[error("provider returned an empty response")]
    EmptyResponse,

    #[error("provider refused the request: {0}")]
    Refusal(String),

    #[error("{0}")]
    Other(String),
}

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Template error: {0}")]
    Template(#[from] TemplateError),

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Response does not match output schema at {0}")]
    SchemaViolation(#[from] SchemaViolation),

    #[error("Missing credential: {0} is not set")]
    MissingCredential(String),

    #[error("Unknown task: {0}")]
    UnknownTask(String),

    #[error("Invalid task definition: {0}")]
    InvalidDefinition(String),
}

impl CoreError {
    /// Stable label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            CoreError::Template(_) => "template",
            CoreError::Provider(_) => "provider",
            CoreError::SchemaViolation(_) => "schema_violation",
            CoreError::MissingCredential(_) => "missing_credential",
            CoreError::UnknownTask(_) => "unknown_task",
            CoreError::InvalidDefinition(_) => "invalid_definition",
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_violation_message_carries_path() {
        let err: CoreError = SchemaViolation::new("$.report", "missing required field").into();
        assert_eq!(err.kind(), "schema_violation");
        assert_eq!(
            err.to_string(),
            "Response does not match output schema at $.report: missing required field"
        );
    }

    #[test]
    fn template_error_names_the_variable() {
        let err: CoreError = TemplateError::MissingVariable("transcript".into()).into();
        assert_eq!(err.kind(), "template");
        assert!(err.to_string().contains("'transcript'"));
    }
}
