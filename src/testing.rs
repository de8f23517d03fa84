//! In-process fakes for the provider seams, shared by unit tests.

use crate::api::Summarize;
use crate::error::{FetchError, NotifyError};
use crate::models::{Article, FetchedArticles, Summary};
use crate::news::NewsSource;
use crate::notify::Mailer;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub fn article(n: usize) -> Article {
    Article {
        title: format!("Headline {n}"),
        source_name: format!("Source {n}"),
        url: format!("https://news.example.com/{n}"),
        description: Some(format!("Description {n}")),
    }
}

enum Scripted {
    Articles(Vec<Article>, u64),
    MissingKey,
    Provider(String),
}

/// News source answering from a per-topic script; unknown topics yield no articles.
#[derive(Default)]
pub struct FakeNews {
    scripts: HashMap<String, Scripted>,
    calls: Mutex<Vec<String>>,
}

impl FakeNews {
    pub fn with_articles(mut self, topic: &str, articles: Vec<Article>, total: u64) -> Self {
        self.scripts
            .insert(topic.to_string(), Scripted::Articles(articles, total));
        self
    }

    pub fn with_missing_key(mut self, topic: &str) -> Self {
        self.scripts.insert(topic.to_string(), Scripted::MissingKey);
        self
    }

    pub fn with_provider_error(mut self, topic: &str, message: &str) -> Self {
        self.scripts
            .insert(topic.to_string(), Scripted::Provider(message.to_string()));
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl NewsSource for FakeNews {
    async fn fetch(&self, topic: &str) -> Result<FetchedArticles, FetchError> {
        self.calls.lock().unwrap().push(topic.to_string());
        match self.scripts.get(topic) {
            Some(Scripted::Articles(articles, total)) => Ok(FetchedArticles {
                articles: articles.clone(),
                total: *total,
            }),
            Some(Scripted::MissingKey) => Err(FetchError::MissingCredential),
            Some(Scripted::Provider(message)) => Err(FetchError::Provider(message.clone())),
            None => Ok(FetchedArticles::default()),
        }
    }
}

/// Summarizer that echoes the description and counts model calls.
#[derive(Default)]
pub struct CountingSummarizer {
    calls: AtomicUsize,
    unready: bool,
}

impl CountingSummarizer {
    /// A summarizer with no model behind it.
    pub fn unready() -> Self {
        Self {
            unready: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Summarize for CountingSummarizer {
    fn is_ready(&self) -> bool {
        !self.unready
    }

    async fn summarize(&self, description: Option<&str>) -> Summary {
        match description.filter(|d| !d.trim().is_empty()) {
            Some(text) => {
                self.calls.fetch_add(1, Ordering::SeqCst);
                Summary::Generated(format!("Summary of: {text}"))
            }
            None => Summary::NoDescription,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SentMail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Mailer that records messages instead of sending them.
#[derive(Clone, Default)]
pub struct RecordingMailer {
    sent: Arc<Mutex<Vec<SentMail>>>,
    attempts: Arc<AtomicUsize>,
    fail: bool,
}

impl RecordingMailer {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<SentMail> {
        self.sent.lock().unwrap().clone()
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl Mailer for RecordingMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), NotifyError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            // Any NotifyError will do; an unparseable address is the cheapest to build.
            let source = "invalid".parse::<lettre::Address>().unwrap_err();
            return Err(NotifyError::Address {
                address: to.to_string(),
                source,
            });
        }
        self.sent.lock().unwrap().push(SentMail {
            to: to.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }
}
