//! # Configuration Module
//!
//! Runtime settings read from environment variables (optionally loaded from
//! a `.env` file). A missing token or endpoint aborts startup.

use std::time::Duration;

use reqwest::Url;

use crate::submission::DEFAULT_SUBMIT_TIMEOUT;

pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(600);

/// Path the webhook is served on and registered with Telegram
pub const WEBHOOK_PATH: &str = "/webhook";

/// Configuration errors, all fatal at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A required variable is absent or empty
    Missing(&'static str),
    /// A variable is present but cannot be parsed
    Invalid { name: &'static str, reason: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Missing(name) => write!(f, "{name} is not set in the environment"),
            ConfigError::Invalid { name, reason } => write!(f, "{name} is invalid: {reason}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// How updates reach the bot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// Telegram pushes updates to `<base_url>/webhook`
    Webhook { base_url: Url },
    /// The bot long-polls Telegram
    Polling,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bot_token: String,
    pub submission_url: Url,
    pub delivery: Delivery,
    pub port: u16,
    pub submit_timeout: Duration,
    pub heartbeat_interval: Duration,
}

impl Config {
    /// Read configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read configuration through `lookup`, treating empty values as unset
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let bot_token = get("BOT_TOKEN").ok_or(ConfigError::Missing("BOT_TOKEN"))?;

        let submission_url = get("GSHEETS_URL").ok_or(ConfigError::Missing("GSHEETS_URL"))?;
        let submission_url = parse_url("GSHEETS_URL", &submission_url)?;

        let delivery = match get("WEBHOOK_URL") {
            Some(base) => Delivery::Webhook {
                base_url: parse_url("WEBHOOK_URL", base.trim_end_matches('/'))?,
            },
            None => Delivery::Polling,
        };

        let port = match get("PORT") {
            Some(port) => port.parse::<u16>().map_err(|e| ConfigError::Invalid {
                name: "PORT",
                reason: e.to_string(),
            })?,
            None => DEFAULT_PORT,
        };

        let submit_timeout = parse_secs(get("SUBMIT_TIMEOUT_SECS"), "SUBMIT_TIMEOUT_SECS")?
            .unwrap_or(DEFAULT_SUBMIT_TIMEOUT);
        let heartbeat_interval =
            parse_secs(get("HEARTBEAT_INTERVAL_SECS"), "HEARTBEAT_INTERVAL_SECS")?
                .unwrap_or(DEFAULT_HEARTBEAT_INTERVAL);

        Ok(Self {
            bot_token,
            submission_url,
            delivery,
            port,
            submit_timeout,
            heartbeat_interval,
        })
    }

    /// Public webhook URL, when running in push mode
    pub fn webhook_url(&self) -> Option<String> {
        match &self.delivery {
            Delivery::Webhook { base_url } => Some(join_base(base_url, WEBHOOK_PATH)),
            Delivery::Polling => None,
        }
    }

    /// Public health URL, when running in push mode
    pub fn health_url(&self) -> Option<String> {
        match &self.delivery {
            Delivery::Webhook { base_url } => Some(join_base(base_url, "/health")),
            Delivery::Polling => None,
        }
    }
}

fn join_base(base_url: &Url, path: &str) -> String {
    format!("{}{}", base_url.as_str().trim_end_matches('/'), path)
}

fn parse_url(name: &'static str, value: &str) -> Result<Url, ConfigError> {
    Url::parse(value).map_err(|e| ConfigError::Invalid {
        name,
        reason: e.to_string(),
    })
}

fn parse_secs(value: Option<String>, name: &'static str) -> Result<Option<Duration>, ConfigError> {
    let Some(value) = value else {
        return Ok(None);
    };

    match value.parse::<u64>() {
        Ok(0) => Err(ConfigError::Invalid {
            name,
            reason: "must be greater than zero".to_string(),
        }),
        Ok(secs) => Ok(Some(Duration::from_secs(secs))),
        Err(e) => Err(ConfigError::Invalid {
            name,
            reason: e.to_string(),
        }),
    }
}
