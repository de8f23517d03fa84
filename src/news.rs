//! Article fetching from the NewsAPI `everything` endpoint.
//!
//! One GET per topic, newest first, truncated to [`MAX_ARTICLES`]. Every
//! failure comes back as a [`FetchError`]; nothing is retried.

use crate::config::NewsSettings;
use crate::error::{FetchError, StartupError};
use crate::models::{Article, FetchedArticles, MAX_ARTICLES};
use crate::utils::join_endpoint;
use serde::Deserialize;
use std::future::Future;
use std::time::Instant;
use tracing::{info, instrument, warn};
use url::Url;

const API_KEY_HEADER: &str = "X-Api-Key";

/// Anything that can look up recent articles for a topic.
pub trait NewsSource: Send + Sync {
    fn fetch(&self, topic: &str) -> impl Future<Output = Result<FetchedArticles, FetchError>> + Send;
}

/// Client for `GET /v2/everything`.
#[derive(Debug, Clone)]
pub struct NewsApiClient {
    http: reqwest::Client,
    endpoint: Url,
    api_key: Option<String>,
}

impl NewsApiClient {
    /// Build the client with the configured timeout.
    ///
    /// A missing `api_key` is not an error here; every fetch reports it.
    ///
    /// # Errors
    ///
    /// [`StartupError::BaseUrl`] for an unusable `base_url`, or
    /// [`StartupError::HttpClient`] when reqwest cannot build its client.
    pub fn new(settings: &NewsSettings, api_key: Option<String>) -> Result<Self, StartupError> {
        let http = reqwest::Client::builder()
            .timeout(settings.timeout())
            .build()?;
        let endpoint = join_endpoint(&settings.base_url, "v2/everything")
            .map_err(|source| StartupError::BaseUrl {
                name: "news",
                value: settings.base_url.clone(),
                source,
            })?;
        if api_key.is_none() {
            warn!("NEWS_API_KEY not set; every fetch will fail");
        }
        Ok(Self {
            http,
            endpoint,
            api_key,
        })
    }

    /// The query URL for `topic`. The key travels in a header, never here.
    fn request_url(&self, topic: &str) -> String {
        format!(
            "{}?q={}&sortBy=publishedAt",
            self.endpoint,
            urlencoding::encode(topic)
        )
    }
}

impl NewsSource for NewsApiClient {
    /// Query `/v2/everything` for `topic`, newest first.
    ///
    /// # Arguments
    ///
    /// * `topic` - free-text query, percent-encoded into `q`
    ///
    /// # Returns
    ///
    /// At most [`MAX_ARTICLES`] articles plus the provider's total match count.
    ///
    /// # Errors
    ///
    /// * [`FetchError::MissingCredential`] when no key is configured; no request is made
    /// * [`FetchError::Provider`] when the body carries `status: "error"`
    /// * [`FetchError::Transport`] on network failure, timeout or a non-JSON body
    #[instrument(level = "info", skip_all, fields(%topic))]
    async fn fetch(&self, topic: &str) -> Result<FetchedArticles, FetchError> {
        let api_key = self.api_key.as_deref().ok_or(FetchError::MissingCredential)?;

        let t0 = Instant::now();
        let body: NewsApiResponse = self
            .http
            .get(self.request_url(topic))
            .header(API_KEY_HEADER, api_key)
            .send()
            .await?
            .json()
            .await?;
        let elapsed_ms = t0.elapsed().as_millis();

        if body.status != "ok" {
            let message = body
                .message
                .or(body.code)
                .unwrap_or_else(|| format!("unexpected status '{}'", body.status));
            warn!(elapsed_ms, %message, "News provider reported an error");
            return Err(FetchError::Provider(message));
        }

        let articles: Vec<Article> = body
            .articles
            .into_iter()
            .take(MAX_ARTICLES)
            .map(Article::from)
            .collect();
        info!(
            elapsed_ms,
            total = body.total_results,
            kept = articles.len(),
            "Fetched articles"
        );
        Ok(FetchedArticles {
            articles,
            total: body.total_results,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewsApiResponse {
    status: String,
    #[serde(default)]
    total_results: u64,
    #[serde(default)]
    articles: Vec<NewsApiArticle>,
    code: Option<String>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NewsApiArticle {
    source: Option<NewsApiSource>,
    title: Option<String>,
    url: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NewsApiSource {
    name: Option<String>,
}

impl From<NewsApiArticle> for Article {
    fn from(raw: NewsApiArticle) -> Self {
        Article {
            title: raw.title.unwrap_or_else(|| "No Title".to_string()),
            source_name: raw
                .source
                .and_then(|s| s.name)
                .unwrap_or_else(|| "Unknown".to_string()),
            url: raw.url.unwrap_or_default(),
            description: raw.description,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param, query_param_is_missing};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn settings(server: &MockServer) -> NewsSettings {
        NewsSettings {
            base_url: server.uri(),
            timeout_secs: 1,
        }
    }

    fn article(n: usize) -> serde_json::Value {
        json!({
            "source": {"id": null, "name": format!("Source {n}")},
            "author": "Someone",
            "title": format!("Title {n}"),
            "description": format!("Description {n}"),
            "url": format!("https://news.example.com/{n}"),
            "publishedAt": "2025-05-06T12:00:00Z"
        })
    }

    #[tokio::test]
    async fn test_fetch_truncates_to_five_and_keeps_total() {
        let server = MockServer::start().await;
        let articles: Vec<_> = (1..=8).map(article).collect();
        Mock::given(method("GET"))
            .and(path("/v2/everything"))
            .and(query_param("q", "Mars rover"))
            .and(query_param("sortBy", "publishedAt"))
            .and(header("X-Api-Key", "test-key"))
            .and(query_param_is_missing("apiKey"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "ok",
                "totalResults": 42,
                "articles": articles
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = NewsApiClient::new(&settings(&server), Some("test-key".into())).unwrap();
        let fetched = client.fetch("Mars rover").await.unwrap();

        assert_eq!(fetched.total, 42);
        assert_eq!(fetched.articles.len(), MAX_ARTICLES);
        let titles: Vec<_> = fetched.articles.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, ["Title 1", "Title 2", "Title 3", "Title 4", "Title 5"]);
        assert_eq!(fetched.articles[0].source_name, "Source 1");
        assert_eq!(fetched.articles[0].url, "https://news.example.com/1");
        assert_eq!(fetched.articles[0].description.as_deref(), Some("Description 1"));
    }

    #[tokio::test]
    async fn test_fetch_fewer_than_limit() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/everything"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "ok",
                "totalResults": 2,
                "articles": [article(1), article(2)]
            })))
            .mount(&server)
            .await;

        let client = NewsApiClient::new(&settings(&server), Some("k".into())).unwrap();
        let fetched = client.fetch("AI").await.unwrap();
        assert_eq!(fetched.total, 2);
        assert_eq!(fetched.articles.len(), 2);
    }

    #[tokio::test]
    async fn test_missing_fields_get_defaults() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/everything"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "ok",
                "totalResults": 1,
                "articles": [{"source": {"id": null, "name": null}, "title": null, "description": null, "url": null}]
            })))
            .mount(&server)
            .await;

        let client = NewsApiClient::new(&settings(&server), Some("k".into())).unwrap();
        let fetched = client.fetch("anything").await.unwrap();
        let a = &fetched.articles[0];
        assert_eq!(a.title, "No Title");
        assert_eq!(a.source_name, "Unknown");
        assert_eq!(a.url, "");
        assert_eq!(a.description, None);
    }

    #[tokio::test]
    async fn test_missing_key_makes_no_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let client = NewsApiClient::new(&settings(&server), None).unwrap();
        let err = client.fetch("Mars rover").await.unwrap_err();
        assert!(matches!(err, FetchError::MissingCredential));
        assert!(err.to_string().contains("NEWS_API_KEY"));
    }

    #[tokio::test]
    async fn test_provider_error_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/everything"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "status": "error",
                "code": "apiKeyInvalid",
                "message": "Your API key is invalid or incorrect."
            })))
            .mount(&server)
            .await;

        let client = NewsApiClient::new(&settings(&server), Some("bad".into())).unwrap();
        match client.fetch("AI").await {
            Err(FetchError::Provider(message)) => {
                assert_eq!(message, "Your API key is invalid or incorrect.")
            }
            other => panic!("expected provider error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_malformed_body_is_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"))
            .mount(&server)
            .await;

        let client = NewsApiClient::new(&settings(&server), Some("k".into())).unwrap();
        let err = client.fetch("AI").await.unwrap_err();
        assert!(matches!(err, FetchError::Transport(_)));
    }

    #[tokio::test]
    async fn test_slow_provider_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"status": "ok", "totalResults": 0, "articles": []}))
                    .set_delay(std::time::Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let client = NewsApiClient::new(&settings(&server), Some("k".into())).unwrap();
        let err = client.fetch("AI").await.unwrap_err();
        assert!(matches!(err, FetchError::Transport(_)));
    }

    #[test]
    fn test_request_url_encodes_topic() {
        let settings = NewsSettings {
            base_url: "https://newsapi.org".to_string(),
            timeout_secs: 10,
        };
        let client = NewsApiClient::new(&settings, Some("key".into())).unwrap();
        let url = client.request_url("India Elections & more");
        assert_eq!(
            url,
            "https://newsapi.org/v2/everything?q=India%20Elections%20%26%20more&sortBy=publishedAt"
        );
    }

    #[tokio::test]
    async fn test_unreachable_provider_error_hides_key() {
        // Nothing listens on the discard port.
        let settings = NewsSettings {
            base_url: "http://127.0.0.1:9".to_string(),
            timeout_secs: 2,
        };
        let client = NewsApiClient::new(&settings, Some("SUPERSECRETKEY".into())).unwrap();
        let err = client.fetch("AI").await.unwrap_err();

        assert!(matches!(err, FetchError::Transport(_)));
        assert!(!err.to_string().contains("SUPERSECRETKEY"));
        assert!(!format!("{err:?}").contains("SUPERSECRETKEY"));
    }

    #[tokio::test]
    async fn test_base_url_path_prefix_is_kept() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/newsapi/v2/everything"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "ok",
                "totalResults": 1,
                "articles": [article(1)]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let settings = NewsSettings {
            base_url: format!("{}/newsapi", server.uri()),
            timeout_secs: 1,
        };
        let client = NewsApiClient::new(&settings, Some("k".into())).unwrap();
        let fetched = client.fetch("AI").await.unwrap();
        assert_eq!(fetched.articles.len(), 1);
    }
}
