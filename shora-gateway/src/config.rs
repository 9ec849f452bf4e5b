//! Gateway config: main API and bot API base URLs, optional bearer token, request timeout. Loaded from env.

use anyhow::Result;
use std::env;

pub const DEFAULT_API_URL: &str = "http://localhost:3000";
pub const DEFAULT_BOT_API_URL: &str = "http://localhost:3001";
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Where the two backends live and how to talk to them.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// SHORA_API_URL: incidents and admin endpoints
    pub api_url: String,
    /// SHORA_BOT_API_URL: chatbot users, bot replies, reminders
    pub bot_api_url: String,
    /// SHORA_API_TOKEN, sent as bearer token to the main API
    pub api_token: Option<String>,
    /// SHORA_HTTP_TIMEOUT_SECS
    pub timeout_secs: u64,
}

impl GatewayConfig {
    /// Load from environment variables; unset values fall back to the local defaults.
    pub fn from_env() -> Result<Self> {
        let api_url = env::var("SHORA_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        let bot_api_url =
            env::var("SHORA_BOT_API_URL").unwrap_or_else(|_| DEFAULT_BOT_API_URL.to_string());
        let api_token = env::var("SHORA_API_TOKEN")
            .ok()
            .filter(|t| !t.trim().is_empty());
        let timeout_secs = env::var("SHORA_HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        Ok(Self {
            api_url,
            bot_api_url,
            api_token,
            timeout_secs,
        })
    }

    /// Both backends on explicit URLs, no token, default timeout.
    pub fn with_urls(api_url: impl Into<String>, bot_api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            bot_api_url: bot_api_url.into(),
            api_token: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.api_token = token;
        self
    }

    /// Both base URLs must parse.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("SHORA_API_URL", &self.api_url),
            ("SHORA_BOT_API_URL", &self.bot_api_url),
        ] {
            if reqwest::Url::parse(value).is_err() {
                anyhow::bail!("{} is not a valid URL: {}", name, value);
            }
        }
        Ok(())
    }
}
