//! Configuration management for the ReAct agent.
//!
//! Values can be passed explicitly through the builder methods; anything left
//! unset is read from environment variables:
//! - `LLM_MODEL_ID` - Required. Model identifier sent to the provider.
//! - `LLM_API_KEY` - Required. Bearer credential for the provider.
//! - `LLM_BASE_URL` - Required. Base URL of an OpenAI-compatible API (e.g. `https://api.openai.com/v1`).
//! - `LLM_TIMEOUT` - Optional. Request timeout in seconds. Defaults to `60`.
//! - `REACT_MAX_STEPS` - Optional. Maximum agent loop iterations. Defaults to `5`.
//!
//! Resolution happens once, at construction time. Nothing downstream reads the
//! environment again.

use thiserror::Error;

/// Default request timeout for the model gateway, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Default step budget for one agent run.
pub const DEFAULT_MAX_STEPS: usize = 5;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required value: {0} (pass it explicitly or set the environment variable)")]
    MissingValue(String),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Model gateway configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LlmConfig {
    /// Model identifier (provider format)
    pub model: String,

    /// API key sent as a bearer token
    pub api_key: String,

    /// Base endpoint, without the `/chat/completions` suffix
    pub base_url: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

/// Explicit overrides for [`LlmConfig`]. Unset fields fall back to the environment.
#[derive(Debug, Clone, Default)]
pub struct LlmConfigBuilder {
    model: Option<String>,
    api_key: Option<String>,
    base_url: Option<String>,
    timeout_secs: Option<u64>,
}

impl LlmConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = Some(timeout_secs);
        self
    }

    /// Resolve against the process environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingValue` if model, key or endpoint are unset
    /// after fallback, and `ConfigError::InvalidValue` for a timeout that is not
    /// a positive whole number of seconds.
    pub fn build(self) -> Result<LlmConfig, ConfigError> {
        self.build_with(|key| std::env::var(key).ok())
    }

    /// Resolve against an arbitrary variable lookup.
    pub fn build_with<F>(self, lookup: F) -> Result<LlmConfig, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let model = required(self.model, "LLM_MODEL_ID", &lookup)?;
        let api_key = required(self.api_key, "LLM_API_KEY", &lookup)?;
        let base_url = required(self.base_url, "LLM_BASE_URL", &lookup)?;

        let timeout_secs = match self.timeout_secs {
            Some(secs) => secs,
            None => match non_empty(lookup("LLM_TIMEOUT")) {
                Some(raw) => raw.trim().parse().map_err(|e| {
                    ConfigError::InvalidValue("LLM_TIMEOUT".to_string(), format!("{}", e))
                })?,
                None => DEFAULT_TIMEOUT_SECS,
            },
        };
        if timeout_secs == 0 {
            return Err(ConfigError::InvalidValue(
                "LLM_TIMEOUT".to_string(),
                "must be greater than zero".to_string(),
            ));
        }

        Ok(LlmConfig {
            model,
            api_key,
            base_url,
            timeout_secs,
        })
    }
}

impl LlmConfig {
    /// Start from explicit values; see [`LlmConfigBuilder`].
    pub fn builder() -> LlmConfigBuilder {
        LlmConfigBuilder::default()
    }

    /// Load configuration entirely from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::builder().build()
    }
}

/// Agent loop configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentConfig {
    /// Maximum loop iterations per run
    pub max_steps: usize,

    /// Sampling temperature passed to the gateway on every step
    pub temperature: f64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_steps: DEFAULT_MAX_STEPS,
            temperature: 0.0,
        }
    }
}

impl AgentConfig {
    /// Load configuration from environment variables, defaulting unset values.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let max_steps = match non_empty(lookup("REACT_MAX_STEPS")) {
            Some(raw) => raw.trim().parse().map_err(|e| {
                ConfigError::InvalidValue("REACT_MAX_STEPS".to_string(), format!("{}", e))
            })?,
            None => DEFAULT_MAX_STEPS,
        };

        Ok(Self {
            max_steps,
            ..Self::default()
        })
    }

    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn required<F>(explicit: Option<String>, var: &str, lookup: &F) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    non_empty(explicit)
        .or_else(|| non_empty(lookup(var)))
        .ok_or_else(|| ConfigError::MissingValue(var.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn resolves_everything_from_env() {
        let config = LlmConfig::builder()
            .build_with(env(&[
                ("LLM_MODEL_ID", "qwen-plus"),
                ("LLM_API_KEY", "sk-test"),
                ("LLM_BASE_URL", "https://example.com/v1"),
                ("LLM_TIMEOUT", "15"),
            ]))
            .unwrap();

        assert_eq!(config.model, "qwen-plus");
        assert_eq!(config.api_key, "sk-test");
        assert_eq!(config.base_url, "https://example.com/v1");
        assert_eq!(config.timeout_secs, 15);
    }

    #[test]
    fn explicit_values_win_over_env() {
        let config = LlmConfig::builder()
            .model("explicit-model")
            .timeout_secs(5)
            .build_with(env(&[
                ("LLM_MODEL_ID", "env-model"),
                ("LLM_API_KEY", "sk-test"),
                ("LLM_BASE_URL", "https://example.com/v1"),
                ("LLM_TIMEOUT", "15"),
            ]))
            .unwrap();

        assert_eq!(config.model, "explicit-model");
        assert_eq!(config.timeout_secs, 5);
    }

    #[test]
    fn timeout_defaults_to_sixty() {
        let config = LlmConfig::builder()
            .build_with(env(&[
                ("LLM_MODEL_ID", "m"),
                ("LLM_API_KEY", "k"),
                ("LLM_BASE_URL", "http://localhost"),
            ]))
            .unwrap();

        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn missing_credentials_fail_fast() {
        let err = LlmConfig::builder()
            .build_with(env(&[("LLM_MODEL_ID", "m"), ("LLM_BASE_URL", "http://localhost")]))
            .unwrap_err();

        assert_eq!(err, ConfigError::MissingValue("LLM_API_KEY".to_string()));
    }

    #[test]
    fn empty_values_count_as_missing() {
        let err = LlmConfig::builder()
            .model("")
            .build_with(env(&[
                ("LLM_MODEL_ID", "  "),
                ("LLM_API_KEY", "k"),
                ("LLM_BASE_URL", "http://localhost"),
            ]))
            .unwrap_err();

        assert_eq!(err, ConfigError::MissingValue("LLM_MODEL_ID".to_string()));
    }

    #[test]
    fn bad_timeout_is_rejected() {
        let err = LlmConfig::builder()
            .build_with(env(&[
                ("LLM_MODEL_ID", "m"),
                ("LLM_API_KEY", "k"),
                ("LLM_BASE_URL", "http://localhost"),
                ("LLM_TIMEOUT", "soon"),
            ]))
            .unwrap_err();

        assert!(matches!(err, ConfigError::InvalidValue(ref name, _) if name == "LLM_TIMEOUT"));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let base = [
            ("LLM_MODEL_ID", "m"),
            ("LLM_API_KEY", "k"),
            ("LLM_BASE_URL", "http://localhost"),
        ];

        let explicit = LlmConfig::builder()
            .timeout_secs(0)
            .build_with(env(&base))
            .unwrap_err();
        assert!(matches!(explicit, ConfigError::InvalidValue(ref name, _) if name == "LLM_TIMEOUT"));

        let mut vars = base.to_vec();
        vars.push(("LLM_TIMEOUT", "0"));
        let from_env = LlmConfig::builder().build_with(env(&vars)).unwrap_err();
        assert!(matches!(from_env, ConfigError::InvalidValue(ref name, _) if name == "LLM_TIMEOUT"));
    }

    #[test]
    fn agent_config_defaults_and_overrides() {
        let defaults = AgentConfig::from_lookup(env(&[])).unwrap();
        assert_eq!(defaults.max_steps, DEFAULT_MAX_STEPS);
        assert_eq!(defaults.temperature, 0.0);

        let custom = AgentConfig::from_lookup(env(&[("REACT_MAX_STEPS", "12")])).unwrap();
        assert_eq!(custom.max_steps, 12);

        assert!(AgentConfig::from_lookup(env(&[("REACT_MAX_STEPS", "-1")])).is_err());
    }
}
