use std::fmt;

use crate::error::{CoreError, Result};

/// Address the gateway binds to.
pub const BIND_HOST: &str = "0.0.0.0";
pub const BIND_PORT: u16 = 5010;

pub const API_KEY_VAR: &str = "OPENAI_API_KEY";
pub const API_BASE_VAR: &str = "OPENAI_BASE_URL";
pub const MODEL_VAR: &str = "OPENAI_MODEL";

/// Process-wide settings, read once at startup.
#[derive(Clone)]
pub struct Settings {
    pub openai_api_key: String,
    /// Alternate endpoint (proxy, local mock). Defaults to api.openai.com.
    pub openai_api_base: Option<String>,
    /// Replaces the model of every built-in task when set.
    pub model_override: Option<String>,
}

impl Settings {
    /// Load `.env` if present, then read the process environment.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let openai_api_key =
            non_empty(API_KEY_VAR).ok_or_else(|| CoreError::MissingCredential(API_KEY_VAR.into()))?;

        Ok(Self {
            openai_api_key,
            openai_api_base: non_empty(API_BASE_VAR),
            model_override: non_empty(MODEL_VAR),
        })
    }

    pub fn bind_address() -> String {
        format!("{BIND_HOST}:{BIND_PORT}")
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("openai_api_key", &"<redacted>")
            .field("openai_api_base", &self.openai_api_base)
            .field("model_override", &self.model_override)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn reads_key_and_optional_overrides() {
        let settings = Settings::from_lookup(lookup(&[
            (API_KEY_VAR, " sk-test "),
            (API_BASE_VAR, "http://localhost:8080/v1"),
            (MODEL_VAR, "gpt-4o"),
        ]))
        .unwrap();

        assert_eq!(settings.openai_api_key, "sk-test");
        assert_eq!(settings.openai_api_base.as_deref(), Some("http://localhost:8080/v1"));
        assert_eq!(settings.model_override.as_deref(), Some("gpt-4o"));
    }

    #[test]
    fn missing_key_fails() {
        let err = Settings::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, CoreError::MissingCredential(ref var) if var == API_KEY_VAR));
    }

    #[test]
    fn blank_key_counts_as_missing() {
        let err = Settings::from_lookup(lookup(&[(API_KEY_VAR, "   ")])).unwrap_err();
        assert_eq!(err.kind(), "missing_credential");
    }

    #[test]
    fn debug_output_hides_key() {
        let settings = Settings::from_lookup(lookup(&[(API_KEY_VAR, "sk-secret")])).unwrap();
        assert!(!format!("{settings:?}").contains("sk-secret"));
    }

    #[test]
    fn binds_on_fixed_port() {
        assert_eq!(Settings::bind_address(), "0.0.0.0:5010");
    }
}
