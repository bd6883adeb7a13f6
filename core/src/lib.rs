//! Two-stage interview analysis: extract structured insights from a
//! transcript, then write a markdown report from the transcript and those
//! insights. Each stage is a single schema-constrained LLM call.

pub mod chain;
pub mod config;
pub mod error;
pub mod llm;
pub mod pipeline;
pub mod registry;
pub mod schema;
pub mod tasks;
pub mod template;

pub use chain::{Chain, ChainOutput};
pub use config::Settings;
pub use error::{CoreError, ProviderError, Result, SchemaViolation, TemplateError};
pub use llm::{CompletionRequest, LlmProvider, OpenAiProvider};
pub use pipeline::{Report, ReportPipeline};
pub use registry::{TaskDefinition, TaskRegistry};
pub use schema::{Field, OutputSchema, Schema};
pub use template::{PromptTemplate, Variables};
