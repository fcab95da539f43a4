//! Configuration management for mini-cursor.
//!
//! Configuration can be set via environment variables (a `.env` file in the
//! current directory is loaded first by the binary):
//! - `OPENAI_API_KEY` - Required. API key for the chat-completions endpoint.
//! - `OPENAI_BASE_URL` - Optional. Endpoint base URL. Defaults to `https://api.openai.com/v1`.
//! - `MODEL_NAME` - Optional. Model identifier. Defaults to `qwen-plus`.
//! - `WORKSPACE_PATH` - Optional. The workspace directory. Defaults to current directory.
//! - `MAX_ITERATIONS` - Optional. Maximum agent loop iterations. Defaults to `30`.
//! - `TEMPERATURE` - Optional. Sampling temperature. Defaults to `0`.
//! - `PARALLEL_TOOL_CALLS` - Optional. Run the tool calls of one turn concurrently. Defaults
//!   to `false`.
//! - `REJECT_CD_WITH_WORKING_DIRECTORY` - Optional. Refuse `cd ...` commands that also pass
//!   `workingDirectory`. Defaults to `false`.

use std::path::PathBuf;
use thiserror::Error;

use crate::tools::TerminalPolicy;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "qwen-plus";
pub const DEFAULT_MAX_ITERATIONS: usize = 30;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Agent configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// API key for the model endpoint
    pub api_key: String,

    /// Base URL of the OpenAI-compatible endpoint
    pub base_url: String,

    /// Model identifier sent with every request
    pub default_model: String,

    /// Workspace directory; relative tool paths resolve against it
    pub workspace_path: PathBuf,

    /// Maximum model invocations per task
    pub max_iterations: usize,

    pub temperature: f32,

    /// Run the tool calls of one assistant turn concurrently
    pub parallel_tool_calls: bool,

    pub terminal: TerminalPolicy,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingEnvVar` if `OPENAI_API_KEY` is not set.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup("OPENAI_API_KEY")
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar("OPENAI_API_KEY".to_string()))?;

        let base_url = lookup("OPENAI_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let default_model = lookup("MODEL_NAME").unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let workspace_path = lookup("WORKSPACE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));

        let max_iterations = lookup("MAX_ITERATIONS")
            .map(|v| {
                v.parse::<usize>().map_err(|e| {
                    ConfigError::InvalidValue("MAX_ITERATIONS".to_string(), format!("{}", e))
                })
            })
            .transpose()?
            .unwrap_or(DEFAULT_MAX_ITERATIONS);

        let temperature = lookup("TEMPERATURE")
            .map(|v| {
                v.parse::<f32>().map_err(|e| {
                    ConfigError::InvalidValue("TEMPERATURE".to_string(), format!("{}", e))
                })
            })
            .transpose()?
            .unwrap_or(0.0);

        let parallel_tool_calls = lookup("PARALLEL_TOOL_CALLS")
            .map(|v| {
                parse_bool(&v)
                    .map_err(|e| ConfigError::InvalidValue("PARALLEL_TOOL_CALLS".to_string(), e))
            })
            .transpose()?
            .unwrap_or(false);

        let reject_cd_with_working_directory = lookup("REJECT_CD_WITH_WORKING_DIRECTORY")
            .map(|v| {
                parse_bool(&v).map_err(|e| {
                    ConfigError::InvalidValue("REJECT_CD_WITH_WORKING_DIRECTORY".to_string(), e)
                })
            })
            .transpose()?
            .unwrap_or(false);

        Ok(Self {
            api_key,
            base_url,
            default_model,
            workspace_path,
            max_iterations,
            temperature,
            parallel_tool_calls,
            terminal: TerminalPolicy {
                reject_cd_with_working_directory,
            },
        })
    }

    /// Create a config with custom values (useful for testing).
    pub fn new(api_key: String, default_model: String, workspace_path: PathBuf) -> Self {
        Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            default_model,
            workspace_path,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            temperature: 0.0,
            parallel_tool_calls: false,
            terminal: TerminalPolicy::default(),
        }
    }
}

fn parse_bool(value: &str) -> Result<bool, String> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "t" | "yes" | "y" | "on" => Ok(true),
        "0" | "false" | "f" | "no" | "n" | "off" => Ok(false),
        other => Err(format!("expected boolean-like value, got: {}", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn api_key_is_required() {
        let err = load(&[]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref v) if v == "OPENAI_API_KEY"));
    }

    #[test]
    fn defaults_apply() {
        let config = load(&[("OPENAI_API_KEY", "sk-test")]).unwrap();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.default_model, DEFAULT_MODEL);
        assert_eq!(config.max_iterations, 30);
        assert_eq!(config.temperature, 0.0);
        assert!(!config.parallel_tool_calls);
        assert!(!config.terminal.reject_cd_with_working_directory);
    }

    #[test]
    fn overrides_are_parsed() {
        let config = load(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("OPENAI_BASE_URL", "https://dashscope.example/compatible-mode/v1"),
            ("MODEL_NAME", "qwen-max"),
            ("WORKSPACE_PATH", "/srv/project"),
            ("MAX_ITERATIONS", "5"),
            ("PARALLEL_TOOL_CALLS", "yes"),
            ("REJECT_CD_WITH_WORKING_DIRECTORY", "on"),
        ])
        .unwrap();
        assert_eq!(config.default_model, "qwen-max");
        assert_eq!(config.workspace_path, PathBuf::from("/srv/project"));
        assert_eq!(config.max_iterations, 5);
        assert!(config.parallel_tool_calls);
        assert!(config.terminal.reject_cd_with_working_directory);
    }

    #[test]
    fn invalid_numbers_and_bools_are_reported() {
        let err = load(&[("OPENAI_API_KEY", "k"), ("MAX_ITERATIONS", "many")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(ref k, _) if k == "MAX_ITERATIONS"));

        let err = load(&[("OPENAI_API_KEY", "k"), ("PARALLEL_TOOL_CALLS", "maybe")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(ref k, _) if k == "PARALLEL_TOOL_CALLS"));
    }
}
