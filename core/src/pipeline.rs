use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::info;

use crate::chain::{Chain, ChainOutput};
use crate::config::Settings;
use crate::error::{Result, SchemaViolation};
use crate::llm::{LlmProvider, OpenAiProvider};
use crate::registry::TaskRegistry;
use crate::tasks::{EXTRACTION_TASK, SUMMARY_TASK};
use crate::template::Variables;

pub const TRANSCRIPT_VAR: &str = "transcript";
pub const INSIGHTS_VAR: &str = "extracted_insights";

/// Composite result of both stages.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub extracted_insights: Value,
    /// Markdown report.
    pub summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_takeaway: Option<String>,
}

/// Extraction followed by summary. Immutable once built and shared across
/// requests.
#[derive(Clone)]
pub struct ReportPipeline {
    extraction: Chain,
    summary: Chain,
}

impl ReportPipeline {
    pub fn new(extraction: Chain, summary: Chain) -> Self {
        Self {
            extraction,
            summary,
        }
    }

    pub fn from_registry(registry: &TaskRegistry, provider: Arc<dyn LlmProvider>) -> Result<Self> {
        let extraction = Chain::new(registry.get(EXTRACTION_TASK)?.clone(), provider.clone());
        let summary = Chain::new(registry.get(SUMMARY_TASK)?.clone(), provider);
        Ok(Self::new(extraction, summary))
    }

    /// Build the built-in pipeline against OpenAI.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let mut registry = TaskRegistry::builtin()?;
        if let Some(model) = &settings.model_override {
            info!("Overriding task model with {}", model);
            registry = registry.with_model_override(model);
        }
        let provider = Arc::new(OpenAiProvider::new(settings)?);
        Self::from_registry(&registry, provider)
    }

    pub fn extraction(&self) -> &Chain {
        &self.extraction
    }

    pub fn summary(&self) -> &Chain {
        &self.summary
    }

    /// Run both stages in order. Any failure aborts the whole run; the
    /// extraction result is never returned on its own.
    pub async fn run(&self, transcript: &str) -> Result<Report> {
        let mut variables = Variables::new();
        variables.insert(TRANSCRIPT_VAR.to_string(), transcript.to_string());

        info!(task = self.extraction.definition().id(), "Running extraction stage");
        let insights = self.extraction.invoke(&variables).await?;

        variables.insert(INSIGHTS_VAR.to_string(), insights.to_prompt_text());

        info!(task = self.summary.definition().id(), "Running summary stage");
        let summary = self.summary.invoke(&variables).await?;
        let (summary, key_takeaway) = split_summary(summary)?;

        Ok(Report {
            extracted_insights: insights.into_value(),
            summary,
            key_takeaway,
        })
    }
}

fn split_summary(output: ChainOutput) -> Result<(String, Option<String>)> {
    match output {
        ChainOutput::Text(text) => Ok((text, None)),
        ChainOutput::Structured(value) => {
            let report = value
                .get("report")
                .and_then(Value::as_str)
                .ok_or_else(|| {
                    SchemaViolation::new("$.report", "summary output has no report text")
                })?
                .to_string();
            let key_takeaway = value
                .get("key_takeaway")
                .and_then(Value::as_str)
                .map(str::to_string);
            Ok((report, key_takeaway))
        }
    }
}
