//! HTML fragments for the interactive page.
//!
//! The web surface streams a page in pieces: [`page_start`], a busy
//! indicator, banners and one [`article_section`] per summarized article,
//! then [`busy_end`] and [`page_end`]. Every interpolated value is escaped.

use crate::models::DigestEntry;
use crate::utils::escape_html;

const TITLE: &str = "Autonomous News Agent";

const STYLE: &str = "body{font-family:sans-serif;max-width:48rem;margin:2rem auto;padding:0 1rem}\
.banner{padding:.75rem 1rem;border-radius:.4rem;margin:1rem 0}\
.success{background:#e6f4ea}.info{background:#e8f0fe}\
.warning{background:#fef7e0}.error{background:#fce8e6}\
.busy{color:#555;font-style:italic}\
form input{width:70%;padding:.4rem}";

/// Visual weight of a status banner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerKind {
    Success,
    Info,
    Warning,
    Error,
}

impl BannerKind {
    fn class(self) -> &'static str {
        match self {
            BannerKind::Success => "success",
            BannerKind::Info => "info",
            BannerKind::Warning => "warning",
            BannerKind::Error => "error",
        }
    }
}

/// Document head, title and the topic form, prefilled with `topic`.
pub fn page_start(topic: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
<title>{TITLE}</title>\n<style>{STYLE}</style>\n</head>\n<body>\n<main>\n\
<h1>📰 {TITLE}</h1>\n\
<form id=\"search\" method=\"get\" action=\"/search\">\n\
<label for=\"topic\">Enter the news topic you are interested in:</label><br>\n\
<input id=\"topic\" name=\"topic\" type=\"text\" value=\"{}\" \
placeholder=\"e.g., Artificial Intelligence, Tesla, India Elections\">\n\
<button type=\"submit\">Fetch &amp; Summarize News</button>\n</form>\n",
        escape_html(topic)
    )
}

pub fn page_end() -> &'static str {
    "</main>\n</body>\n</html>\n"
}

/// Indicator shown while articles are fetched and summarized.
pub fn busy_start(topic: &str) -> String {
    format!(
        "<div id=\"busy\" class=\"busy\">Fetching articles for \"{}\" and generating summaries...</div>\n",
        escape_html(topic)
    )
}

/// Hides the indicator emitted by [`busy_start`].
pub fn busy_end() -> &'static str {
    "<style>#busy{display:none}</style>\n"
}

pub fn banner(kind: BannerKind, message: &str) -> String {
    format!(
        "<div class=\"banner {}\" role=\"status\">{}</div>\n",
        kind.class(),
        escape_html(message)
    )
}

/// One article: numbered title, source, summary and link.
///
/// Only `http`/`https` links are made clickable.
pub fn article_section(number: usize, entry: &DigestEntry) -> String {
    let article = &entry.article;
    let url = article.url.as_str();
    let link = if url.starts_with("https://") || url.starts_with("http://") {
        let url = escape_html(url);
        format!("<a href=\"{url}\" target=\"_blank\" rel=\"noopener noreferrer\">{url}</a>")
    } else if url.is_empty() {
        "Not available".to_string()
    } else {
        escape_html(url)
    };

    format!(
        "<section class=\"article\">\n<h2>{}. {}</h2>\n\
<p><strong>Source:</strong> {}</p>\n\
<p><strong>Summary:</strong> {}</p>\n\
<p><strong>URL:</strong> {}</p>\n</section>\n<hr>\n",
        number,
        escape_html(&article.title),
        escape_html(&article.source_name),
        escape_html(&entry.summary.text()),
        link
    )
}
