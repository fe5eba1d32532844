use crate::error::{Error, Result};
use std::env;
use std::fmt;
use std::time::Duration;

const YT_API_KEY: &str = "YT_API_KEY";
const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
const EMAIL_USER: &str = "EMAIL_USER";
const EMAIL_PASS: &str = "EMAIL_PASS";
const EMAIL_TO: &str = "EMAIL_TO";

const YT_API_BASE: &str = "YT_API_BASE";
const OPENAI_API_BASE: &str = "OPENAI_API_BASE";

const YT_TIMEOUT_SECS: &str = "YT_TIMEOUT_SECS";
const OPENAI_TIMEOUT_SECS: &str = "OPENAI_TIMEOUT_SECS";
const SMTP_TIMEOUT_SECS: &str = "SMTP_TIMEOUT_SECS";

const DEFAULT_YT_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_OPENAI_TIMEOUT: Duration = Duration::from_secs(120);
const DEFAULT_SMTP_TIMEOUT: Duration = Duration::from_secs(60);

/// Which external services the current command talks to. Credentials are only
/// required for the services in use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Requirements {
    pub generation: bool,
    pub email: bool,
}

impl Requirements {
    pub const FULL: Self = Self {
        generation: true,
        email: true,
    };
    pub const TRENDS_ONLY: Self = Self {
        generation: false,
        email: false,
    };
}

/// Process-wide settings, read once at startup and handed to each component.
#[derive(Clone)]
pub struct Config {
    pub youtube_api_key: String,
    pub youtube_api_base: Option<String>,
    pub openai_api_key: Option<String>,
    pub openai_api_base: Option<String>,
    pub mail: Option<MailConfig>,
    pub timeouts: Timeouts,
}

#[derive(Clone)]
pub struct MailConfig {
    pub username: String,
    pub password: String,
    pub recipient: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub youtube: Duration,
    pub generation: Duration,
    pub smtp: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            youtube: DEFAULT_YT_TIMEOUT,
            generation: DEFAULT_OPENAI_TIMEOUT,
            smtp: DEFAULT_SMTP_TIMEOUT,
        }
    }
}

impl Config {
    pub fn from_env(needs: Requirements) -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok(), needs)
    }

    /// Builds the config from an arbitrary key lookup. Every missing required key is
    /// reported in a single error.
    pub fn from_lookup<F>(lookup: F, needs: Requirements) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let mut missing = Vec::new();
        let mut require = |key: &'static str, needed: bool| {
            if !needed {
                return None;
            }
            let value = get(key);
            if value.is_none() {
                missing.push(key);
            }
            value
        };

        let youtube_api_key = require(YT_API_KEY, true);
        let openai_api_key = require(OPENAI_API_KEY, needs.generation);
        let username = require(EMAIL_USER, needs.email);
        let password = require(EMAIL_PASS, needs.email);

        if !missing.is_empty() {
            return Err(Error::Config { missing });
        }

        let mail = match (username, password) {
            (Some(username), Some(password)) => Some(MailConfig {
                recipient: get(EMAIL_TO).unwrap_or_else(|| username.clone()),
                username,
                password,
            }),
            _ => None,
        };

        let timeouts = Timeouts {
            youtube: parse_timeout(YT_TIMEOUT_SECS, get(YT_TIMEOUT_SECS), DEFAULT_YT_TIMEOUT)?,
            generation: parse_timeout(
                OPENAI_TIMEOUT_SECS,
                get(OPENAI_TIMEOUT_SECS),
                DEFAULT_OPENAI_TIMEOUT,
            )?,
            smtp: parse_timeout(
                SMTP_TIMEOUT_SECS,
                get(SMTP_TIMEOUT_SECS),
                DEFAULT_SMTP_TIMEOUT,
            )?,
        };

        Ok(Self {
            youtube_api_key: youtube_api_key.unwrap_or_default(),
            youtube_api_base: get(YT_API_BASE),
            openai_api_key,
            openai_api_base: get(OPENAI_API_BASE),
            mail,
            timeouts,
        })
    }

    pub fn openai_key(&self) -> Result<&str> {
        self.openai_api_key
            .as_deref()
            .ok_or_else(|| Error::Config {
                missing: vec![OPENAI_API_KEY],
            })
    }

    pub fn mail(&self) -> Result<&MailConfig> {
        self.mail.as_ref().ok_or_else(|| Error::Config {
            missing: vec![EMAIL_USER, EMAIL_PASS],
        })
    }
}

fn parse_timeout(key: &'static str, raw: Option<String>, default: Duration) -> Result<Duration> {
    let Some(raw) = raw else {
        return Ok(default);
    };

    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(Error::InvalidConfig { key, value: raw }),
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("youtube_api_key", &"<redacted>")
            .field("youtube_api_base", &self.youtube_api_base)
            .field("openai_api_key", &self.openai_api_key.as_ref().map(|_| "<redacted>"))
            .field("openai_api_base", &self.openai_api_base)
            .field("mail", &self.mail)
            .field("timeouts", &self.timeouts)
            .finish()
    }
}

impl fmt::Debug for MailConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MailConfig")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("recipient", &self.recipient)
            .finish()
    }
}
