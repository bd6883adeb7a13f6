//! Prompt templates rendered with minijinja.
//!
//! Placeholders use the `{{ name }}` syntax. Undefined variables are an
//! error rather than an empty string, so every placeholder must be supplied.

use std::collections::{BTreeMap, BTreeSet};

use minijinja::{Environment, ErrorKind, UndefinedBehavior};

use crate::error::TemplateError;

/// Variables handed to a chain, keyed by placeholder name.
pub type Variables = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    source: String,
    placeholders: BTreeSet<String>,
}

fn environment<'source>() -> Environment<'source> {
    let mut env = Environment::new();
    env.set_undefined_behavior(UndefinedBehavior::Strict);
    env.set_keep_trailing_newline(true);
    env
}

impl PromptTemplate {
    /// Compile once to reject bad syntax and record the referenced names.
    pub fn new(source: impl Into<String>) -> Result<Self, TemplateError> {
        let source = source.into();
        let placeholders: BTreeSet<String> = {
            let env = environment();
            let template = env
                .template_from_str(&source)
                .map_err(|e| TemplateError::Syntax(e.to_string()))?;
            let names = template.undeclared_variables(false);
            names.into_iter().collect()
        };
        Ok(Self {
            source,
            placeholders,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Names referenced by the template.
    pub fn placeholders(&self) -> &BTreeSet<String> {
        &self.placeholders
    }

    pub fn render(&self, variables: &Variables) -> Result<String, TemplateError> {
        environment()
            .render_str(&self.source, variables)
            .map_err(|e| match e.kind() {
                ErrorKind::UndefinedError => self
                    .placeholders
                    .iter()
                    .find(|name| !variables.contains_key(name.as_str()))
                    .map(|name| TemplateError::MissingVariable(name.clone()))
                    .unwrap_or_else(|| TemplateError::Render(e.to_string())),
                _ => TemplateError::Render(e.to_string()),
            })
    }
}
