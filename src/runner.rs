//! Scheduled digest job.
//!
//! One run walks the subscription list in order. For each subscription:
//! fetch articles, summarize them, format the digest and email it when an
//! address is configured. A failure for one subscription is logged and the
//! run moves on. Nothing here retries: the external scheduler invokes the
//! next run.

use crate::api::{Summarize, summarize_articles};
use crate::config::load_subscriptions;
use crate::models::UserSubscription;
use crate::news::NewsSource;
use crate::notify::{Delivery, EmailNotifier, Mailer};
use crate::outputs::digest::{email_subject, format_digest};
use crate::utils::{today, truncate_for_log};
use chrono::Local;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, error, info, instrument};

/// Per-run tallies, one bucket per subscription.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunReport {
    pub sent: usize,
    pub skipped: usize,
    pub delivery_failed: usize,
    pub no_email: usize,
    pub fetch_failed: usize,
}

impl RunReport {
    pub fn processed(&self) -> usize {
        self.sent + self.skipped + self.delivery_failed + self.no_email + self.fetch_failed
    }

    fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Delivered(Delivery::Sent) => self.sent += 1,
            Outcome::Delivered(Delivery::Skipped) => self.skipped += 1,
            Outcome::Delivered(Delivery::Failed) => self.delivery_failed += 1,
            Outcome::NoEmail => self.no_email += 1,
            Outcome::FetchFailed => self.fetch_failed += 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Delivered(Delivery),
    NoEmail,
    FetchFailed,
}

/// Runs the fetch → summarize → format → notify chain for each subscription.
pub struct JobRunner<'a, N, S, M> {
    news: &'a N,
    summarizer: &'a S,
    notifier: &'a EmailNotifier<M>,
}

impl<'a, N, S, M> JobRunner<'a, N, S, M>
where
    N: NewsSource,
    S: Summarize,
    M: Mailer,
{
    pub fn new(news: &'a N, summarizer: &'a S, notifier: &'a EmailNotifier<M>) -> Self {
        Self {
            news,
            summarizer,
            notifier,
        }
    }

    /// Load subscriptions from `config_path` and process them.
    ///
    /// # Arguments
    ///
    /// * `config_path` - JSON array of `{user_id, topic, email}` records
    ///
    /// # Returns
    ///
    /// Per-outcome tallies for the run. An unreadable or malformed file yields
    /// an empty report, not an error.
    ///
    /// When the summarizer has no model, nothing is read, fetched or sent.
    pub async fn run_from_file(&self, config_path: &Path) -> RunReport {
        info!(started_at = %Local::now().to_rfc3339(), "Starting scheduled agent run");
        if !self.summarizer.is_ready() {
            error!("Summarization model not initialized; aborting run");
            return RunReport::default();
        }
        let t0 = Instant::now();

        let subscriptions = load_subscriptions(config_path).await;
        if subscriptions.is_empty() {
            info!("No subscriptions to process");
        }
        let report = self.run(&subscriptions).await;

        info!(
            elapsed_ms = t0.elapsed().as_millis(),
            processed = report.processed(),
            sent = report.sent,
            skipped = report.skipped,
            delivery_failed = report.delivery_failed,
            no_email = report.no_email,
            fetch_failed = report.fetch_failed,
            "Run complete"
        );
        report
    }

    /// Process `subscriptions` strictly in order.
    pub async fn run(&self, subscriptions: &[UserSubscription]) -> RunReport {
        let mut report = RunReport::default();
        for subscription in subscriptions {
            let outcome = self.process(subscription).await;
            report.record(outcome);
        }
        report
    }

    #[instrument(level = "info", skip_all, fields(user_id = %sub.user_id, topic = %sub.topic))]
    async fn process(&self, sub: &UserSubscription) -> Outcome {
        info!("Processing task");

        let fetched = match self.news.fetch(&sub.topic).await {
            Ok(fetched) => fetched,
            Err(e) => {
                error!(error = %e, "API Error; skipping subscription");
                return Outcome::FetchFailed;
            }
        };

        let entries = summarize_articles(self.summarizer, fetched.articles).await;
        let body = format_digest(&sub.topic, &entries, today());

        match sub.email.as_deref() {
            Some(email) => {
                let subject = email_subject(&sub.topic);
                Outcome::Delivered(self.notifier.deliver(email, &subject, &body).await)
            }
            None => {
                info!("No email address configured for this user");
                debug!(digest = %truncate_for_log(&body, 2000), "Undelivered digest");
                Outcome::NoEmail
            }
        }
    }
}
