//! Plain-text digest rendering.
//!
//! ```text
//! Here is your autonomous news briefing for 2025-05-06.
//!
//! TOPIC: Mars rover
//! ==============================
//!
//! 1. Rover finds lake bed
//!    Source: Example News
//!    Summary: The rover found evidence of an ancient lake.
//!    Link: https://example.com/rover
//!
//! ------------------------------
//!
//! ```

use crate::models::DigestEntry;
use chrono::NaiveDate;
use itertools::Itertools;

/// Marker line written when a fetch returned no articles.
pub const NO_ARTICLES_LINE: &str = "No new articles found today.";

const RULE_WIDTH: usize = 30;

/// Email subject for a topic's digest.
pub fn email_subject(topic: &str) -> String {
    format!("Daily News: {topic}")
}

/// Render the digest for `topic` as of `date`.
///
/// Entries are numbered from 1 in the order given. An empty slice renders the
/// header followed by [`NO_ARTICLES_LINE`].
///
/// # Arguments
///
/// * `topic` - the subscription topic, echoed in the header
/// * `entries` - summarized articles, already in display order
/// * `date` - the briefing date printed as `YYYY-MM-DD`
///
/// # Returns
///
/// The plain-text email body. Articles without a URL get `#` as their link.
pub fn format_digest(topic: &str, entries: &[DigestEntry], date: NaiveDate) -> String {
    let mut body = format!(
        "Here is your autonomous news briefing for {}.\n\nTOPIC: {}\n{}\n\n",
        date.format("%Y-%m-%d"),
        topic,
        "=".repeat(RULE_WIDTH)
    );

    if entries.is_empty() {
        body.push_str(NO_ARTICLES_LINE);
        body.push('\n');
        return body;
    }

    let sections = entries
        .iter()
        .enumerate()
        .map(|(i, entry)| format_section(i + 1, entry))
        .join("");
    body.push_str(&sections);
    body
}

fn format_section(number: usize, entry: &DigestEntry) -> String {
    let article = &entry.article;
    let link = if article.url.is_empty() { "#" } else { article.url.as_str() };
    format!(
        "{number}. {}\n   Source: {}\n   Summary: {}\n   Link: {}\n\n{}\n\n",
        article.title,
        article.source_name,
        entry.summary.text(),
        link,
        "-".repeat(RULE_WIDTH)
    )
}
