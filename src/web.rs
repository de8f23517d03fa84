//! Interactive web page for ad-hoc topic searches.
//!
//! Routes:
//! - `GET /`: topic form
//! - `GET /search?topic=..`: HTML streamed as work progresses, one article
//!   section per summarized article
//! - `GET /api/search?topic=..`: the same result as JSON

use crate::api::{Summarize, summarize_articles};
use crate::error::StartupError;
use crate::models::{DigestEntry, Summary};
use crate::news::NewsSource;
use crate::outputs::html::{
    BannerKind, article_section, banner, busy_end, busy_start, page_end, page_start,
};
use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::{StatusCode, header};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::{debug, info, instrument};

const EMPTY_TOPIC: &str = "Please enter a topic to search for.";
const MODEL_NOT_READY: &str =
    "The summarization model is not initialized; summaries will be unavailable. Check GEMINI_API_KEY.";

/// Shared handles for the request handlers.
pub struct AppState<N, S> {
    pub news: N,
    pub summarizer: S,
    /// Whether the summarization model initialized at startup.
    pub model_ready: bool,
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    topic: Option<String>,
}

impl SearchQuery {
    fn topic(&self) -> String {
        self.topic.as_deref().unwrap_or_default().trim().to_string()
    }
}

pub fn router<N, S>(state: AppState<N, S>) -> Router
where
    N: NewsSource + 'static,
    S: Summarize + 'static,
{
    Router::new()
        .route("/", get(index::<N, S>))
        .route("/search", get(search::<N, S>))
        .route("/api/search", get(api_search::<N, S>))
        .with_state(Arc::new(state))
}

pub async fn bind(addr: &str) -> Result<TcpListener, StartupError> {
    TcpListener::bind(addr)
        .await
        .map_err(|source| StartupError::Bind {
            addr: addr.to_string(),
            source,
        })
}

/// Serve until Ctrl-C.
pub async fn serve<N, S>(listener: TcpListener, state: AppState<N, S>) -> std::io::Result<()>
where
    N: NewsSource + 'static,
    S: Summarize + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "Serving interactive news page");
    }
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down");
        })
        .await
}

async fn index<N, S>(State(state): State<Arc<AppState<N, S>>>) -> Html<String> {
    let mut page = page_start("");
    if !state.model_ready {
        page.push_str(&banner(BannerKind::Warning, MODEL_NOT_READY));
    }
    page.push_str(page_end());
    Html(page)
}

async fn search<N, S>(
    State(state): State<Arc<AppState<N, S>>>,
    Query(query): Query<SearchQuery>,
) -> Response
where
    N: NewsSource + 'static,
    S: Summarize + 'static,
{
    let topic = query.topic();
    let (tx, rx) = mpsc::channel::<String>(16);
    tokio::spawn(async move {
        if render_search(&state, &topic, &tx).await.is_err() {
            debug!("Client went away before the page was complete");
        }
    });

    let chunks = futures::stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|chunk| (Ok::<_, Infallible>(chunk), rx))
    });
    (
        [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
        Body::from_stream(chunks),
    )
        .into_response()
}

/// Write the search page to `tx` piece by piece.
///
/// The busy indicator spans the fetch and every summary call; each article
/// section is sent as soon as its summary is ready.
#[instrument(level = "info", skip_all, fields(%topic))]
async fn render_search<N, S>(
    state: &AppState<N, S>,
    topic: &str,
    tx: &mpsc::Sender<String>,
) -> Result<(), mpsc::error::SendError<String>>
where
    N: NewsSource,
    S: Summarize,
{
    tx.send(page_start(topic)).await?;
    if !state.model_ready {
        tx.send(banner(BannerKind::Warning, MODEL_NOT_READY)).await?;
    }
    if topic.is_empty() {
        tx.send(banner(BannerKind::Warning, EMPTY_TOPIC)).await?;
        tx.send(page_end().to_string()).await?;
        return Ok(());
    }

    tx.send(busy_start(topic)).await?;
    match state.news.fetch(topic).await {
        Err(e) => {
            info!(error = %e, "Fetch failed");
            let message = format!("Error fetching news: {e}");
            tx.send(banner(BannerKind::Error, &message)).await?;
        }
        Ok(fetched) if fetched.articles.is_empty() => {
            let message = format!(
                "Successfully searched, but no articles were found for '{topic}'. Try a different topic."
            );
            tx.send(banner(BannerKind::Info, &message)).await?;
        }
        Ok(fetched) => {
            let message = format!(
                "Found {} articles. Displaying summaries for the top {}:",
                fetched.total,
                fetched.articles.len()
            );
            tx.send(banner(BannerKind::Success, &message)).await?;
            for (i, article) in fetched.articles.into_iter().enumerate() {
                let summary = state
                    .summarizer
                    .summarize(article.description.as_deref())
                    .await;
                let entry = DigestEntry { article, summary };
                tx.send(article_section(i + 1, &entry)).await?;
            }
        }
    }
    tx.send(busy_end().to_string()).await?;
    tx.send(page_end().to_string()).await?;
    Ok(())
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
enum SearchResponse {
    Ok {
        total: u64,
        articles: Vec<ArticleView>,
    },
    Error {
        message: String,
    },
}

#[derive(Debug, Serialize)]
struct ArticleView {
    title: String,
    source: String,
    url: Option<String>,
    summary: String,
    /// False when `summary` is a fallback rather than model output.
    summary_ok: bool,
}

impl From<DigestEntry> for ArticleView {
    fn from(entry: DigestEntry) -> Self {
        let summary_ok = entry.summary.is_generated();
        let summary = match entry.summary {
            Summary::Generated(text) => text,
            other => other.text().into_owned(),
        };
        let article = entry.article;
        ArticleView {
            title: article.title,
            source: article.source_name,
            url: (!article.url.is_empty()).then_some(article.url),
            summary,
            summary_ok,
        }
    }
}

async fn api_search<N, S>(
    State(state): State<Arc<AppState<N, S>>>,
    Query(query): Query<SearchQuery>,
) -> (StatusCode, Json<SearchResponse>)
where
    N: NewsSource + 'static,
    S: Summarize + 'static,
{
    let topic = query.topic();
    if topic.is_empty() {
        let body = SearchResponse::Error {
            message: EMPTY_TOPIC.to_string(),
        };
        return (StatusCode::BAD_REQUEST, Json(body));
    }

    match state.news.fetch(&topic).await {
        Err(e) => {
            info!(%topic, error = %e, "Fetch failed");
            let body = SearchResponse::Error {
                message: e.to_string(),
            };
            (StatusCode::BAD_GATEWAY, Json(body))
        }
        Ok(fetched) => {
            let entries = summarize_articles(&state.summarizer, fetched.articles).await;
            let body = SearchResponse::Ok {
                total: fetched.total,
                articles: entries.into_iter().map(ArticleView::from).collect(),
            };
            (StatusCode::OK, Json(body))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{CountingSummarizer, FakeNews, article};
    use axum::http::Request;
    use scraper::{Html as Document, Selector};
    use tower::ServiceExt;

    fn app(news: FakeNews, model_ready: bool) -> Router {
        router(AppState {
            news,
            summarizer: CountingSummarizer::default(),
            model_ready,
        })
    }

    async fn get_body(app: Router, uri: &str) -> (StatusCode, String) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    fn count(html: &str, selector: &str) -> usize {
        let doc = Document::parse_document(html);
        let sel = Selector::parse(selector).unwrap();
        doc.select(&sel).count()
    }

    #[tokio::test]
    async fn test_index_shows_form_only() {
        let (status, html) = get_body(app(FakeNews::default(), true), "/").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(count(&html, "form#search input[name=topic]"), 1);
        assert_eq!(count(&html, "div.banner"), 0);
    }

    #[tokio::test]
    async fn test_index_warns_when_model_missing() {
        let (_, html) = get_body(app(FakeNews::default(), false), "/").await;
        assert_eq!(count(&html, "div.banner.warning"), 1);
        assert!(html.contains("GEMINI_API_KEY"));
    }

    #[tokio::test]
    async fn test_search_without_topic_warns() {
        let (status, html) = get_body(app(FakeNews::default(), true), "/search?topic=%20%20").await;
        assert_eq!(status, StatusCode::OK);
        assert!(html.contains(EMPTY_TOPIC));
        assert_eq!(count(&html, "div.banner.warning"), 1);
        assert_eq!(count(&html, "#busy"), 0);
        assert!(html.trim_end().ends_with("</html>"));
    }

    #[tokio::test]
    async fn test_search_streams_articles_in_order() {
        let news = FakeNews::default().with_articles(
            "Mars rover",
            vec![article(1), article(2), article(3)],
            12,
        );
        let (_, html) = get_body(app(news, true), "/search?topic=Mars%20rover").await;

        assert!(html.contains("Found 12 articles. Displaying summaries for the top 3:"));
        assert_eq!(count(&html, "section.article"), 3);
        assert!(html.contains("Summary of: Description 1"));

        let busy = html.find("id=\"busy\"").unwrap();
        let first = html.find("1. Headline 1").unwrap();
        let third = html.find("3. Headline 3").unwrap();
        let hidden = html.find("#busy{display:none}").unwrap();
        assert!(busy < first && first < third && third < hidden);
    }

    #[tokio::test]
    async fn test_search_with_zero_results() {
        let (_, html) = get_body(app(FakeNews::default(), true), "/search?topic=nothing").await;
        assert_eq!(count(&html, "div.banner.info"), 1);
        assert!(html.contains("no articles were found for &#39;nothing&#39;"));
        assert_eq!(count(&html, "section.article"), 0);
        assert!(html.contains("#busy{display:none}"));
    }

    #[tokio::test]
    async fn test_search_with_fetch_error() {
        let news = FakeNews::default().with_missing_key("AI");
        let (_, html) = get_body(app(news, true), "/search?topic=AI").await;
        assert_eq!(count(&html, "div.banner.error"), 1);
        assert!(html.contains("Error fetching news: NEWS_API_KEY not found."));
    }

    #[tokio::test]
    async fn test_api_search_ok() {
        let mut second = article(2);
        second.description = None;
        second.url = String::new();
        let news = FakeNews::default().with_articles("AI", vec![article(1), second], 40);

        let (status, body) = get_body(app(news, true), "/api/search?topic=AI").await;
        assert_eq!(status, StatusCode::OK);

        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["total"], 40);
        assert_eq!(json["articles"][0]["title"], "Headline 1");
        assert_eq!(json["articles"][0]["summary"], "Summary of: Description 1");
        assert_eq!(json["articles"][0]["summary_ok"], true);
        assert_eq!(json["articles"][1]["summary"], "No summary available.");
        assert_eq!(json["articles"][1]["summary_ok"], false);
        assert!(json["articles"][1]["url"].is_null());
    }

    #[tokio::test]
    async fn test_api_search_errors() {
        let (status, body) = get_body(app(FakeNews::default(), true), "/api/search").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.contains(EMPTY_TOPIC));

        let news = FakeNews::default().with_provider_error("AI", "rateLimited");
        let (status, body) = get_body(app(news, true), "/api/search?topic=AI").await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["message"], "NewsAPI Error: rateLimited");
    }
}
