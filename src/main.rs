//! # News Digest
//!
//! Fetches recent news articles for a topic, summarizes each one in a single
//! sentence with a hosted LLM, and delivers the result either as a scheduled
//! email digest or through an interactive web page.
//!
//! ## Usage
//!
//! ```sh
//! NEWS_API_KEY=.. GEMINI_API_KEY=.. SENDER_EMAIL=.. SENDER_PASSWORD=.. news_digest run
//! news_digest serve --bind 127.0.0.1:8501
//! ```
//!
//! ## Architecture
//!
//! Every mode runs the same one-directional chain:
//! 1. **Fetch**: newest articles for the topic from NewsAPI (at most 5)
//! 2. **Summarize**: one Gemini call per article description
//! 3. **Format**: plain-text digest or HTML sections
//! 4. **Deliver**: SMTP email, the browser, or stdout
//!
//! Provider clients are built once in [`startup`] and passed by reference.

use clap::Parser;
use std::error::Error;
use std::path::Path;
use tracing::{debug, error, info};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod api;
mod cli;
mod config;
mod error;
mod models;
mod news;
mod notify;
mod outputs;
mod runner;
#[cfg(test)]
mod testing;
mod utils;
mod web;

use api::{GeminiSummarizer, Summarize, summarize_articles};
use cli::{Cli, Command};
use config::{Credentials, Settings};
use error::StartupError;
use news::{NewsApiClient, NewsSource};
use notify::EmailNotifier;
use outputs::digest::format_digest;
use runner::JobRunner;
use utils::today;
use web::AppState;

/// Provider handles shared by every mode.
struct Services {
    settings: Settings,
    credentials: Credentials,
    news: NewsApiClient,
    summarizer: GeminiSummarizer,
}

/// Validate configuration and build the provider clients.
///
/// Only problems that make the process unusable are errors; missing
/// credentials degrade the affected component and are logged.
async fn startup(cli: &Cli) -> Result<Services, StartupError> {
    let settings = Settings::load(cli.settings.as_deref()).await?;
    let credentials = cli.credentials();
    debug!(?credentials, "Resolved credentials");

    let news = NewsApiClient::new(&settings.news, credentials.news_api_key.clone())?;
    let summarizer = GeminiSummarizer::init(&settings.summarizer, credentials.gemini_api_key.clone());

    Ok(Services {
        settings,
        credentials,
        news,
        summarizer,
    })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("news_digest starting up");

    let args = Cli::parse();
    debug!(command = ?args.command, settings = ?args.settings, "Parsed CLI arguments");

    let services = match startup(&args).await {
        Ok(services) => services,
        Err(e) => {
            error!(error = %e, "Startup validation failed");
            return Err(e.into());
        }
    };

    match args.command {
        Command::Run { config } => run_job(&services, &config).await,
        Command::Serve { bind } => {
            let listener = web::bind(&bind).await?;
            let state = AppState {
                model_ready: services.summarizer.is_ready(),
                news: services.news,
                summarizer: services.summarizer,
            };
            web::serve(listener, state).await?;
        }
        Command::Digest { topic } => print_digest(&services, &topic).await?,
    }

    let elapsed = start_time.elapsed();
    info!(?elapsed, secs = elapsed.as_secs(), "Execution complete");
    Ok(())
}

async fn run_job(services: &Services, config: &Path) {
    let notifier = EmailNotifier::smtp(&services.settings.smtp, &services.credentials);
    info!(
        email_enabled = notifier.is_configured(),
        model_ready = services.summarizer.is_ready(),
        config = %config.display(),
        "Starting digest job"
    );
    let runner = JobRunner::new(&services.news, &services.summarizer, &notifier);
    runner.run_from_file(config).await;
}

async fn print_digest(services: &Services, topic: &str) -> Result<(), Box<dyn Error>> {
    let fetched = services.news.fetch(topic).await.map_err(|e| {
        error!(error = %e, "Error fetching news");
        e
    })?;
    let entries = summarize_articles(&services.summarizer, fetched.articles).await;
    print!("{}", format_digest(topic, &entries, today()));
    Ok(())
}
