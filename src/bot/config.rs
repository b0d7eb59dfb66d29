use crate::config::{self, ConfigError};
use reqwest::Url;
use std::time::Duration;

pub const DEFAULT_TELEGRAM_API_URL: &str = "https://api.telegram.org";
pub const DEFAULT_POLL_TIMEOUT_SEC: u64 = 30;

pub const BOT_TOKEN: &str = "BOT_TOKEN";
pub const TELEGRAM_API_URL: &str = "TELEGRAM_API_URL";
pub const POLL_TIMEOUT_SEC: &str = "POLL_TIMEOUT_SEC";

#[derive(Clone, PartialEq, Eq)]
pub struct BotConfig {
    token: String,
    api_url: Url,
    poll_timeout: Duration,
}

impl std::fmt::Debug for BotConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BotConfig")
            .field("token", &"***")
            .field("api_url", &self.api_url.as_str())
            .field("poll_timeout", &self.poll_timeout)
            .finish()
    }
}

impl BotConfig {
    pub fn new(token: impl Into<String>) -> Result<Self, ConfigError> {
        let token = token.into().trim().to_string();
        if token.is_empty() {
            return Err(ConfigError::Missing(BOT_TOKEN));
        }
        Ok(BotConfig {
            token,
            api_url: parse_api_url(DEFAULT_TELEGRAM_API_URL)?,
            poll_timeout: Duration::from_secs(DEFAULT_POLL_TIMEOUT_SEC),
        })
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut bot_config = BotConfig::new(config::required(&lookup, BOT_TOKEN)?)?;
        if let Some(api_url) = config::optional(&lookup, TELEGRAM_API_URL) {
            bot_config.api_url = parse_api_url(&api_url)?;
        }
        // 0 is allowed and means short polling
        bot_config.poll_timeout = Duration::from_secs(config::parse_u64(
            &lookup,
            POLL_TIMEOUT_SEC,
            DEFAULT_POLL_TIMEOUT_SEC,
        )?);
        Ok(bot_config)
    }

    pub fn with_api_url(mut self, api_url: &str) -> Result<Self, ConfigError> {
        self.api_url = parse_api_url(api_url)?;
        Ok(self)
    }

    pub fn with_poll_timeout(mut self, poll_timeout: Duration) -> Self {
        self.poll_timeout = poll_timeout;
        self
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn api_url(&self) -> &Url {
        &self.api_url
    }

    pub fn poll_timeout(&self) -> Duration {
        self.poll_timeout
    }
}

fn parse_api_url(value: &str) -> Result<Url, ConfigError> {
    Url::parse(value)
        .ok()
        .filter(|url| matches!(url.scheme(), "http" | "https") && !url.cannot_be_a_base())
        .ok_or_else(|| ConfigError::InvalidValue {
            name: TELEGRAM_API_URL,
            value: value.to_string(),
            reason: "expected an http(s) url",
        })
}
