use std::fmt;
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";
pub const DEFAULT_ENDPOINT: &str = "https://api.anthropic.com/v1/messages";
pub const DEFAULT_ANTHROPIC_VERSION: &str = "2023-06-01";
pub const DEFAULT_MAX_TOKENS: u32 = 1024;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

const ENV_API_KEY: &str = "ANTHROPIC_API_KEY";
const ENV_USE_LLM: &str = "CRYPTIC_HINTS_USE_LLM";
const ENV_MODEL: &str = "CRYPTIC_HINTS_MODEL";
const ENV_ENDPOINT: &str = "CRYPTIC_HINTS_ENDPOINT";
const ENV_TIMEOUT_SECS: &str = "CRYPTIC_HINTS_TIMEOUT_SECS";
const ENV_MAX_TOKENS: &str = "CRYPTIC_HINTS_MAX_TOKENS";

/// Settings for the LLM-assisted path.
#[derive(Clone, PartialEq, Eq)]
pub struct LlmConfig {
    pub enabled: bool,
    pub api_key: Option<String>,
    pub model: String,
    pub endpoint: String,
    pub anthropic_version: String,
    pub max_tokens: u32,
    pub timeout: Duration,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            anthropic_version: DEFAULT_ANTHROPIC_VERSION.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmConfig")
            .field("enabled", &self.enabled)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("endpoint", &self.endpoint)
            .field("anthropic_version", &self.anthropic_version)
            .field("max_tokens", &self.max_tokens)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl LlmConfig {
    /// Deterministic path only.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Load configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through `lookup`, which maps a variable name to
    /// its value.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let read = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        config.api_key = read(ENV_API_KEY);
        if let Some(flag) = read(ENV_USE_LLM) {
            config.enabled = !matches!(
                flag.to_ascii_lowercase().as_str(),
                "0" | "false" | "no" | "off"
            );
        }
        if let Some(model) = read(ENV_MODEL) {
            config.model = model;
        }
        if let Some(endpoint) = read(ENV_ENDPOINT) {
            config.endpoint = endpoint;
        }
        if let Some(secs) = read(ENV_TIMEOUT_SECS) {
            match secs.parse::<u64>() {
                Ok(secs) if secs > 0 => config.timeout = Duration::from_secs(secs),
                _ => warn!(value = %secs, var = ENV_TIMEOUT_SECS, "ignoring invalid timeout"),
            }
        }
        if let Some(tokens) = read(ENV_MAX_TOKENS) {
            match tokens.parse::<u32>() {
                Ok(tokens) if tokens > 0 => config.max_tokens = tokens,
                _ => warn!(value = %tokens, var = ENV_MAX_TOKENS, "ignoring invalid max tokens"),
            }
        }
        debug!(
            enabled = config.enabled,
            has_key = config.api_key.is_some(),
            model = %config.model,
            timeout_secs = config.timeout.as_secs(),
            "Loaded LLM configuration"
        );
        config
    }

    pub fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }
}
