//! Data models shared across the pipeline.
//!
//! - [`UserSubscription`]: one configured (user, topic, email) record
//! - [`Article`]: a news item as returned by the search provider
//! - [`FetchedArticles`]: the `ok` arm of a fetch, articles plus provider total
//! - [`Summary`]: tagged outcome of summarizing one article
//! - [`DigestEntry`]: an article paired with its summary, ready for output

use crate::error::SummaryError;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// Upper bound on articles kept from a single fetch.
pub const MAX_ARTICLES: usize = 5;

/// A configured subscription driving one iteration of the scheduled job.
///
/// Loaded from the subscriptions JSON file; immutable for the whole run.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct UserSubscription {
    pub user_id: String,
    pub topic: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// A news article reported by the search provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Article {
    pub title: String,
    pub source_name: String,
    /// Empty when the provider did not report a link.
    pub url: String,
    pub description: Option<String>,
}

/// Successful fetch: at most [`MAX_ARTICLES`] articles, newest first, plus the
/// provider's pre-truncation match count.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchedArticles {
    pub articles: Vec<Article>,
    pub total: u64,
}

/// Outcome of summarizing one article description.
#[derive(Debug)]
pub enum Summary {
    /// Text produced by the model.
    Generated(String),
    /// The description was absent or blank, so the model was not called.
    NoDescription,
    /// The model could not produce a summary.
    Failed(SummaryError),
}

impl Summary {
    /// Whether the summary came from the model.
    pub fn is_generated(&self) -> bool {
        matches!(self, Summary::Generated(_))
    }

    /// Reader-facing text, with fixed fallbacks for the non-generated cases.
    pub fn text(&self) -> Cow<'_, str> {
        match self {
            Summary::Generated(text) => Cow::Borrowed(text.as_str()),
            Summary::NoDescription => Cow::Borrowed("No summary available."),
            Summary::Failed(SummaryError::NotInitialized) => {
                Cow::Borrowed("Summary failed: model not initialized.")
            }
            Summary::Failed(SummaryError::Empty) => {
                Cow::Borrowed("Summary generation returned empty.")
            }
            Summary::Failed(_) => Cow::Borrowed("Summary failed to generate."),
        }
    }
}

/// An article with its summary, in provider order.
#[derive(Debug)]
pub struct DigestEntry {
    pub article: Article,
    pub summary: Summary,
}
