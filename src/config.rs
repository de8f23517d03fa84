//! Runtime configuration: provider settings, credentials and subscriptions.
//!
//! Settings come from an optional YAML file and fall back to built-in
//! defaults. Credentials are read once from the environment (through the
//! CLI layer) and bundled in [`Credentials`]. Subscriptions live in a JSON
//! array file consumed by the job runner.

use crate::error::StartupError;
use crate::models::UserSubscription;
use crate::utils::looks_like_email;
use serde::Deserialize;
use std::fmt;
use std::path::Path;
use std::time::Duration;
use tokio::fs;
use tracing::{error, info, instrument, warn};
use url::Url;

/// Provider endpoints, timeouts and SMTP relay.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub news: NewsSettings,
    pub summarizer: SummarizerSettings,
    pub smtp: SmtpSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NewsSettings {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for NewsSettings {
    fn default() -> Self {
        Self {
            base_url: "https://newsapi.org".to_string(),
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SummarizerSettings {
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
}

impl Default for SummarizerSettings {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            model: "gemini-2.5-flash".to_string(),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub timeout_secs: u64,
}

impl Default for SmtpSettings {
    fn default() -> Self {
        Self {
            host: "smtp.gmail.com".to_string(),
            port: 587,
            timeout_secs: 30,
        }
    }
}

impl NewsSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl SummarizerSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl SmtpSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Settings {
    /// Load settings from `path`, or return the defaults when no path is given.
    ///
    /// Any read or parse failure is fatal: a settings file that was asked for
    /// but cannot be used means the operator's intent is unknown.
    #[instrument(level = "info", skip_all)]
    pub async fn load(path: Option<&Path>) -> Result<Self, StartupError> {
        let settings = match path {
            None => {
                info!("No settings file given; using defaults");
                Settings::default()
            }
            Some(path) => {
                let shown = path.display().to_string();
                let raw = fs::read_to_string(path)
                    .await
                    .map_err(|source| StartupError::SettingsIo {
                        path: shown.clone(),
                        source,
                    })?;
                let settings = Self::from_yaml(&raw).map_err(|source| {
                    StartupError::SettingsParse {
                        path: shown.clone(),
                        source,
                    }
                })?;
                info!(path = %shown, "Loaded settings");
                settings
            }
        };
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_yaml(raw: &str) -> Result<Self, serde_yaml::Error> {
        if raw.trim().is_empty() {
            return Ok(Settings::default());
        }
        serde_yaml::from_str(raw)
    }

    /// Check that both provider base URLs parse.
    pub fn validate(&self) -> Result<(), StartupError> {
        for (name, value) in [
            ("news", &self.news.base_url),
            ("summarizer", &self.summarizer.base_url),
        ] {
            Url::parse(value).map_err(|source| StartupError::BaseUrl {
                name,
                value: value.clone(),
                source,
            })?;
        }
        Ok(())
    }
}

/// API keys and sender credentials, read once at process start.
///
/// Every field is optional: a missing credential degrades the component that
/// needs it instead of stopping the process.
#[derive(Clone, Default)]
pub struct Credentials {
    pub news_api_key: Option<String>,
    pub gemini_api_key: Option<String>,
    pub sender_email: Option<String>,
    pub sender_password: Option<String>,
}

impl Credentials {
    /// Build from raw values, treating blank strings as absent.
    pub fn new(
        news_api_key: Option<String>,
        gemini_api_key: Option<String>,
        sender_email: Option<String>,
        sender_password: Option<String>,
    ) -> Self {
        let present = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
        Self {
            news_api_key: present(news_api_key),
            gemini_api_key: present(gemini_api_key),
            sender_email: present(sender_email),
            sender_password: present(sender_password),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mask = |v: &Option<String>| if v.is_some() { "<set>" } else { "<unset>" };
        f.debug_struct("Credentials")
            .field("news_api_key", &mask(&self.news_api_key))
            .field("gemini_api_key", &mask(&self.gemini_api_key))
            .field("sender_email", &self.sender_email)
            .field("sender_password", &mask(&self.sender_password))
            .finish()
    }
}

/// Read the subscription list from a JSON array file.
///
/// Never fails: an unreadable or malformed file is logged and yields an empty
/// list, which the job runner treats as nothing to do. Email values that are
/// blank or not address-shaped are dropped with a warning.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn load_subscriptions(path: &Path) -> Vec<UserSubscription> {
    let raw = match fs::read_to_string(path).await {
        Ok(raw) => raw,
        Err(e) => {
            error!(error = %e, "Error loading config");
            return Vec::new();
        }
    };

    let subscriptions: Vec<UserSubscription> = match serde_json::from_str(&raw) {
        Ok(subs) => subs,
        Err(e) => {
            error!(error = %e, "Error parsing config");
            return Vec::new();
        }
    };

    let subscriptions: Vec<UserSubscription> = subscriptions
        .into_iter()
        .map(|mut sub| {
            sub.email = sub.email.take().and_then(|email| {
                let email = email.trim().to_string();
                if looks_like_email(&email) {
                    Some(email)
                } else {
                    if !email.is_empty() {
                        warn!(user_id = %sub.user_id, %email, "Ignoring malformed email address");
                    }
                    None
                }
            });
            sub
        })
        .collect();

    info!(count = subscriptions.len(), "Loaded subscriptions");
    subscriptions
}
