use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::completion::{CompletionClient, FallbackMessages, GenerationParams, RetryPolicy};
use crate::constants;
use crate::error::ConfigError;
use crate::gemini::GeminiClient;
use crate::openrouter::OpenRouterClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Backend {
    Gemini,
    #[value(name = "openrouter")]
    OpenRouter,
}

impl Backend {
    pub fn api_key_env(self) -> &'static str {
        match self {
            Backend::Gemini => constants::GEMINI_API_KEY_ENV,
            Backend::OpenRouter => constants::OPENROUTER_API_KEY_ENV,
        }
    }

    /// Defaults for this backend with the given credential.
    pub fn config(self, api_key: impl Into<String>) -> ClientConfig {
        match self {
            Backend::Gemini => ClientConfig::gemini(api_key),
            Backend::OpenRouter => ClientConfig::openrouter(api_key),
        }
    }

    pub fn connect(self, config: ClientConfig) -> Result<Arc<dyn CompletionClient>, ConfigError> {
        Ok(match self {
            Backend::Gemini => Arc::new(GeminiClient::new(config)?),
            Backend::OpenRouter => Arc::new(OpenRouterClient::new(config)?),
        })
    }
}

/// Connection settings shared by all completion backends.
#[derive(Clone)]
pub struct ClientConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub generation: GenerationParams,
    pub timeout: Duration,
    pub retry: RetryPolicy,
    pub fallbacks: FallbackMessages,
}

impl ClientConfig {
    pub fn gemini(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: constants::DEFAULT_GEMINI_API_BASE.to_string(),
            model: constants::DEFAULT_GEMINI_MODEL.to_string(),
            generation: GenerationParams {
                temperature: constants::DEFAULT_TEMPERATURE,
                top_k: Some(constants::DEFAULT_TOP_K),
                top_p: Some(constants::DEFAULT_TOP_P),
                max_output_tokens: constants::DEFAULT_GEMINI_MAX_OUTPUT_TOKENS,
            },
            timeout: Duration::from_secs(constants::DEFAULT_TIMEOUT_SECS),
            retry: RetryPolicy::default(),
            fallbacks: FallbackMessages::default(),
        }
    }

    pub fn openrouter(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: constants::DEFAULT_OPENROUTER_API_BASE.to_string(),
            model: constants::DEFAULT_OPENROUTER_MODEL.to_string(),
            generation: GenerationParams {
                temperature: constants::DEFAULT_TEMPERATURE,
                top_k: None,
                top_p: None,
                max_output_tokens: constants::DEFAULT_OPENROUTER_MAX_TOKENS,
            },
            timeout: Duration::from_secs(constants::DEFAULT_TIMEOUT_SECS),
            retry: RetryPolicy::default(),
            fallbacks: FallbackMessages::default(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_fallbacks(mut self, fallbacks: FallbackMessages) -> Self {
        self.fallbacks = fallbacks;
        self
    }

    /// `base_url` without a trailing slash, ready for path joining.
    pub(crate) fn base(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    pub(crate) fn require_api_key(&self, env_var: &'static str) -> Result<(), ConfigError> {
        if self.api_key.trim().is_empty() {
            return Err(ConfigError::MissingApiKey { env_var });
        }
        Ok(())
    }

    pub(crate) fn http_client(&self) -> Result<reqwest::Client, ConfigError> {
        Ok(reqwest::Client::builder().timeout(self.timeout).build()?)
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("generation", &self.generation)
            .field("timeout", &self.timeout)
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_api_key() {
        let config = ClientConfig::gemini("secret-key-123");
        let printed = format!("{:?}", config);
        assert!(!printed.contains("secret-key-123"));
        assert!(printed.contains("<redacted>"));
    }

    #[test]
    fn test_blank_key_is_rejected() {
        let err = ClientConfig::gemini("   ")
            .require_api_key(constants::GEMINI_API_KEY_ENV)
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingApiKey { env_var: "GEMINI_API_KEY" }));
    }

    #[test]
    fn test_base_strips_trailing_slash() {
        let config = ClientConfig::openrouter("k").with_base_url("http://localhost:8080/");
        assert_eq!(config.base(), "http://localhost:8080");
    }

    #[test]
    fn test_backend_defaults() {
        assert_eq!(Backend::Gemini.config("k").model, "gemini-1.5-flash");
        assert_eq!(Backend::OpenRouter.config("k").generation.max_output_tokens, 500);
        assert_eq!(Backend::OpenRouter.api_key_env(), "OPENROUTER_API_KEY");
    }
}
