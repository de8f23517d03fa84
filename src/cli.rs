//! Command-line interface definitions.
//!
//! Credentials are taken from the environment (or the matching flags) once
//! at startup. Their values are hidden from `--help` output.

use crate::config::Credentials;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Command-line arguments for the news digest agent.
///
/// # Examples
///
/// ```sh
/// # One scheduled run over users_config.json
/// news_digest run
///
/// # Interactive page on http://127.0.0.1:8501
/// news_digest serve
///
/// # Print one digest to stdout
/// news_digest digest --topic "Mars rover"
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to a YAML settings file
    #[arg(short, long, global = true)]
    pub settings: Option<PathBuf>,

    /// NewsAPI key
    #[arg(long, env = "NEWS_API_KEY", hide_env_values = true, global = true)]
    pub news_api_key: Option<String>,

    /// Gemini API key
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true, global = true)]
    pub gemini_api_key: Option<String>,

    /// Address digests are sent from (also the SMTP login)
    #[arg(long, env = "SENDER_EMAIL", global = true)]
    pub sender_email: Option<String>,

    /// SMTP password for the sender address
    #[arg(long, env = "SENDER_PASSWORD", hide_env_values = true, global = true)]
    pub sender_password: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Fetch, summarize and email a digest for every configured subscription
    Run {
        /// JSON array of {user_id, topic, email} records
        #[arg(short, long, default_value = "users_config.json")]
        config: PathBuf,
    },
    /// Serve the interactive search page
    Serve {
        /// Address to listen on
        #[arg(short, long, default_value = "127.0.0.1:8501")]
        bind: String,
    },
    /// Print the digest for a single topic to stdout
    Digest {
        /// Topic to search for
        #[arg(short, long)]
        topic: String,
    },
}

impl Cli {
    pub fn credentials(&self) -> Credentials {
        Credentials::new(
            self.news_api_key.clone(),
            self.gemini_api_key.clone(),
            self.sender_email.clone(),
            self.sender_password.clone(),
        )
    }
}
