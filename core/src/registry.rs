use std::collections::BTreeMap;

use tracing::info;

use crate::error::{CoreError, Result, TemplateError};
use crate::schema::OutputSchema;
use crate::template::PromptTemplate;
use crate::tasks;

pub const DEFAULT_MODEL: &str = "gpt-4o";
pub const DEFAULT_TEMPERATURE: f32 = 0.0;
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 1024;

/// Everything needed to turn variables into one provider call.
///
/// Definitions are assembled with the consuming `with_*` methods and are
/// read-only afterwards.
#[derive(Debug, Clone)]
pub struct TaskDefinition {
    id: String,
    system_instruction: PromptTemplate,
    prompt_template: PromptTemplate,
    model_id: String,
    temperature: f32,
    max_output_tokens: u32,
    output_schema: Option<OutputSchema>,
}

impl TaskDefinition {
    pub fn new(
        id: impl Into<String>,
        system_instruction: &str,
        prompt_template: &str,
    ) -> Result<Self> {
        let id = id.into();
        let invalid = |e: TemplateError| CoreError::InvalidDefinition(format!("{id}: {e}"));
        let system_instruction = PromptTemplate::new(system_instruction).map_err(invalid)?;
        let prompt_template = PromptTemplate::new(prompt_template).map_err(invalid)?;

        Ok(Self {
            id,
            system_instruction,
            prompt_template,
            model_id: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
            output_schema: None,
        })
    }

    pub fn with_model(mut self, model_id: impl Into<String>) -> Self {
        self.model_id = model_id.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Result<Self> {
        if !(0.0..=1.0).contains(&temperature) {
            return Err(CoreError::InvalidDefinition(format!(
                "{}: temperature {} is outside [0, 1]",
                self.id, temperature
            )));
        }
        self.temperature = temperature;
        Ok(self)
    }

    pub fn with_max_output_tokens(mut self, max_output_tokens: u32) -> Result<Self> {
        if max_output_tokens == 0 {
            return Err(CoreError::InvalidDefinition(format!(
                "{}: max_output_tokens must be positive",
                self.id
            )));
        }
        self.max_output_tokens = max_output_tokens;
        Ok(self)
    }

    pub fn with_output_schema(mut self, schema: OutputSchema) -> Self {
        self.output_schema = Some(schema);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn system_instruction(&self) -> &PromptTemplate {
        &self.system_instruction
    }

    pub fn prompt_template(&self) -> &PromptTemplate {
        &self.prompt_template
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    pub fn max_output_tokens(&self) -> u32 {
        self.max_output_tokens
    }

    pub fn output_schema(&self) -> Option<&OutputSchema> {
        self.output_schema.as_ref()
    }
}

/// Fixed lookup table of task definitions, built once at startup.
#[derive(Debug, Clone)]
pub struct TaskRegistry {
    tasks: BTreeMap<String, TaskDefinition>,
}

impl TaskRegistry {
    /// The extraction and summary tasks that back the report pipeline.
    pub fn builtin() -> Result<Self> {
        let registry = Self::from_definitions([tasks::extraction()?, tasks::summary()?])?;
        info!("Loaded {} task definitions.", registry.tasks.len());
        Ok(registry)
    }

    pub fn from_definitions<I>(definitions: I) -> Result<Self>
    where
        I: IntoIterator<Item = TaskDefinition>,
    {
        let mut tasks = BTreeMap::new();
        for definition in definitions {
            let id = definition.id().to_string();
            if tasks.insert(id.clone(), definition).is_some() {
                return Err(CoreError::InvalidDefinition(format!("duplicate task id '{id}'")));
            }
        }
        Ok(Self { tasks })
    }

    /// Swap the model on every definition, e.g. from `OPENAI_MODEL`.
    pub fn with_model_override(self, model_id: &str) -> Self {
        let tasks = self
            .tasks
            .into_iter()
            .map(|(id, definition)| (id, definition.with_model(model_id)))
            .collect();
        Self { tasks }
    }

    pub fn get(&self, id: &str) -> Result<&TaskDefinition> {
        self.tasks
            .get(id)
            .ok_or_else(|| CoreError::UnknownTask(id.to_string()))
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.tasks.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::{EXTRACTION_TASK, SUMMARY_TASK};

    #[test]
    fn builtin_registry_has_both_stages() {
        let registry = TaskRegistry::builtin().unwrap();
        let ids: Vec<&str> = registry.ids().collect();
        assert_eq!(ids, vec![EXTRACTION_TASK, SUMMARY_TASK]);
    }

    #[test]
    fn unknown_task_is_not_found() {
        let registry = TaskRegistry::builtin().unwrap();
        let err = registry.get("sentiment").unwrap_err();
        assert!(matches!(err, CoreError::UnknownTask(ref id) if id == "sentiment"));
    }

    #[test]
    fn extraction_definition_matches_canonical_settings() {
        let registry = TaskRegistry::builtin().unwrap();
        let task = registry.get(EXTRACTION_TASK).unwrap();

        assert_eq!(task.model_id(), "gpt-4o-mini");
        assert_eq!(task.temperature(), 0.0);
        assert_eq!(task.max_output_tokens(), 4096);
        assert_eq!(
            task.prompt_template().placeholders().iter().map(String::as_str).collect::<Vec<_>>(),
            vec!["transcript"]
        );
        assert!(task.system_instruction().placeholders().is_empty());
        assert_eq!(
            task.output_schema().map(OutputSchema::name),
            Some(EXTRACTION_TASK)
        );
    }

    #[test]
    fn summary_definition_consumes_extraction_output() {
        let registry = TaskRegistry::builtin().unwrap();
        let task = registry.get(SUMMARY_TASK).unwrap();

        assert_eq!(task.temperature(), 0.2);
        assert_eq!(
            task.prompt_template().placeholders().iter().map(String::as_str).collect::<Vec<_>>(),
            vec!["extracted_insights", "transcript"]
        );
        let schema = task.output_schema().unwrap().to_json_schema();
        assert_eq!(schema["required"], serde_json::json!(["report", "key_takeaway"]));
    }

    #[test]
    fn model_override_applies_to_every_task() {
        let registry = TaskRegistry::builtin().unwrap().with_model_override("gpt-4o");
        for id in [EXTRACTION_TASK, SUMMARY_TASK] {
            assert_eq!(registry.get(id).unwrap().model_id(), "gpt-4o");
        }
    }

    #[test]
    fn defaults_apply_when_not_configured() {
        let task = TaskDefinition::new("plain", "You are terse.", "{{ question }}").unwrap();
        assert_eq!(task.model_id(), DEFAULT_MODEL);
        assert_eq!(task.temperature(), DEFAULT_TEMPERATURE);
        assert_eq!(task.max_output_tokens(), DEFAULT_MAX_OUTPUT_TOKENS);
        assert!(task.output_schema().is_none());
    }

    #[test]
    fn rejects_out_of_range_settings() {
        let task = TaskDefinition::new("plain", "", "{{ question }}").unwrap();
        assert!(task.clone().with_temperature(1.5).is_err());
        assert!(task.clone().with_temperature(-0.1).is_err());
        assert!(task.with_max_output_tokens(0).is_err());
    }

    #[test]
    fn rejects_malformed_template() {
        let err = TaskDefinition::new("broken", "ok", "{{ transcript").unwrap_err();
        assert_eq!(err.kind(), "invalid_definition");
        assert!(err.to_string().contains("broken"));
    }

    #[test]
    fn rejects_duplicate_ids() {
        let a = TaskDefinition::new("same", "", "{{ x }}").unwrap();
        let b = TaskDefinition::new("same", "", "{{ y }}").unwrap();
        assert!(TaskRegistry::from_definitions([a, b]).is_err());
    }
}
