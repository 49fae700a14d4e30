use std::time::Duration;

use crate::url::DEFAULT_LITELLM_BASE_URL;

/// Transport configuration for gateway requests.
#[derive(Debug, Clone)]
pub struct LiteLlmConfig {
    /// Base URL for gateway endpoints.
    pub base_url: String,
    /// Optional bearer token passed to `Authorization`.
    pub api_key: Option<String>,
    /// Optional `User-Agent` override.
    pub user_agent: Option<String>,
    /// Optional request timeout.
    ///
    /// Applies to the model-listing call only; streaming responses are
    /// open-ended and bounded by cancellation instead.
    pub timeout: Option<Duration>,
}

impl Default for LiteLlmConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_LITELLM_BASE_URL.to_string(),
            api_key: None,
            user_agent: None,
            timeout: None,
        }
    }
}

impl LiteLlmConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}
