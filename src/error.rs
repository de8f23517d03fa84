//! Error taxonomy for the digest pipeline.
//!
//! Each external concern gets its own enum so call sites can branch on the
//! failure kind instead of comparing strings:
//!
//! - [`StartupError`]: fatal, returned to `main` before any work starts
//! - [`FetchError`]: the error arm of a news fetch
//! - [`SummaryError`]: why a summary could not be produced
//! - [`NotifyError`]: email delivery failures (logged, never propagated)

use thiserror::Error;

/// Failures detected while validating configuration at process start.
#[derive(Debug, Error)]
pub enum StartupError {
    /// The settings file could not be read.
    #[error("cannot read settings file {path}: {source}")]
    SettingsIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The settings file is not valid YAML for [`crate::config::Settings`].
    #[error("invalid settings file {path}: {source}")]
    SettingsParse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    /// A provider base URL in the settings does not parse.
    #[error("invalid {name} base URL '{value}': {source}")]
    BaseUrl {
        name: &'static str,
        value: String,
        #[source]
        source: url::ParseError,
    },

    /// The shared HTTP client could not be built (TLS backend, etc.).
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// The web server could not bind its listening socket.
    #[error("cannot bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
}

/// Why a news fetch produced no articles.
///
/// The `Display` output is the message shown to users and written to logs.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("NEWS_API_KEY not found.")]
    MissingCredential,

    /// The provider answered with `status: "error"`.
    #[error("NewsAPI Error: {0}")]
    Provider(String),

    /// Timeouts, DNS failures, bad status codes and malformed bodies alike.
    /// The request URL is stripped before the error is stored.
    #[error("Error: {0}")]
    Transport(reqwest::Error),
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        FetchError::Transport(e.without_url())
    }
}

/// Why a summary could not be generated for an article.
#[derive(Debug, Error)]
pub enum SummaryError {
    /// No credential, or the client failed to initialize at startup.
    #[error("model not initialized")]
    NotInitialized,

    /// The model answered without any candidate text (blocked or empty).
    #[error("model returned no candidate content")]
    Empty,

    /// The provider reported a structured error.
    #[error("model API error: {0}")]
    Api(String),

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
}

/// Email delivery failures.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("invalid address '{address}': {source}")]
    Address {
        address: String,
        #[source]
        source: lettre::address::AddressError,
    },

    #[error("failed to build message: {0}")]
    Message(#[from] lettre::error::Error),

    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),
}
