//! Article summarization through the Gemini `generateContent` API.
//!
//! Layers, bottom up:
//! - [`GeminiClient`]: one HTTP call per prompt, returns text or a [`SummaryError`]
//! - [`GeminiSummarizer`]: owns an optional client and applies the
//!   short-circuit rules (blank description, uninitialized model)
//! - [`Summarize`]: the seam the runner and web surface depend on
//!
//! There is no retry; a failed call yields [`Summary::Failed`] and the
//! caller moves on to the next article.

use crate::config::SummarizerSettings;
use crate::error::{StartupError, SummaryError};
use crate::models::{Article, DigestEntry, Summary};
use crate::utils::{join_endpoint, truncate_for_log};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn};
use url::Url;

/// Harm categories sent with every request, all set to `BLOCK_NONE`.
const SAFETY_CATEGORIES: [&str; 4] = [
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
];

/// Build the one-sentence summary instruction around an article description.
pub fn build_prompt(text: &str) -> String {
    format!(
        "Please summarize this news article description into a single, concise sentence: {}",
        text
    )
}

/// Anything that can turn an article description into a [`Summary`].
///
/// Implementors never fail outright; failures are carried in the returned
/// [`Summary`] so callers can keep going.
pub trait Summarize: Send + Sync {
    fn summarize(&self, description: Option<&str>) -> impl Future<Output = Summary> + Send;

    /// Whether a model is behind this summarizer at all.
    fn is_ready(&self) -> bool {
        true
    }
}

/// HTTP client bound to one Gemini model.
pub struct GeminiClient {
    http: reqwest::Client,
    endpoint: Url,
    model: String,
    api_key: String,
}

impl fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiClient")
            .field("endpoint", &self.endpoint.as_str())
            .field("model", &self.model)
            .finish()
    }
}

impl GeminiClient {
    pub fn new(settings: &SummarizerSettings, api_key: String) -> Result<Self, StartupError> {
        let http = reqwest::Client::builder()
            .timeout(settings.timeout())
            .build()?;
        let path = format!("v1beta/models/{}:generateContent", settings.model);
        let endpoint = join_endpoint(&settings.base_url, &path)
            .map_err(|source| StartupError::BaseUrl {
                name: "summarizer",
                value: settings.base_url.clone(),
                source,
            })?;
        Ok(Self {
            http,
            endpoint,
            model: settings.model.clone(),
            api_key,
        })
    }

    /// Send `prompt` and return the first candidate's text, trimmed.
    #[instrument(level = "info", skip_all, fields(model = %self.model))]
    pub async fn generate(&self, prompt: &str) -> Result<String, SummaryError> {
        let request = GenerateContentRequest::new(prompt);

        let t0 = Instant::now();
        let response = self
            .http
            .post(self.endpoint.clone())
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorEnvelope>(&body)
                .map(|envelope| envelope.error.message)
                .unwrap_or_else(|_| format!("{status}: {}", truncate_for_log(&body, 300)));
            warn!(
                elapsed_ms = t0.elapsed().as_millis(),
                %status,
                %message,
                "Gemini API error"
            );
            return Err(SummaryError::Api(message));
        }

        let body: GenerateContentResponse = response.json().await?;
        let text = body.first_text().ok_or(SummaryError::Empty)?;
        debug!(
            elapsed_ms = t0.elapsed().as_millis(),
            response_preview = %truncate_for_log(&text, 120),
            "Gemini call succeeded"
        );
        Ok(text)
    }
}

/// The summarizer handed to the runner and the web surface.
///
/// Holds `None` when the model could not be initialized; every call then
/// reports [`SummaryError::NotInitialized`] without touching the network.
#[derive(Debug)]
pub struct GeminiSummarizer {
    client: Option<GeminiClient>,
}

impl GeminiSummarizer {
    /// Initialize from settings and the optional credential.
    ///
    /// # Arguments
    ///
    /// * `settings` - endpoint, model name and request timeout
    /// * `api_key` - `GEMINI_API_KEY`, already blank-filtered
    ///
    /// # Returns
    ///
    /// Always a summarizer. Missing credentials or a failed client build are
    /// logged and leave it uninitialized (see [`Summarize::is_ready`]) instead
    /// of failing startup.
    pub fn init(settings: &SummarizerSettings, api_key: Option<String>) -> Self {
        let Some(api_key) = api_key else {
            error!("GEMINI_API_KEY not found in environment variables");
            return Self { client: None };
        };
        match GeminiClient::new(settings, api_key) {
            Ok(client) => {
                info!(model = %settings.model, "Initialized Gemini model");
                Self {
                    client: Some(client),
                }
            }
            Err(e) => {
                error!(error = %e, "Error initializing Gemini client");
                Self { client: None }
            }
        }
    }

}

impl Summarize for GeminiSummarizer {
    fn is_ready(&self) -> bool {
        self.client.is_some()
    }

    async fn summarize(&self, description: Option<&str>) -> Summary {
        let Some(text) = description.filter(|t| !t.trim().is_empty()) else {
            return Summary::NoDescription;
        };
        let Some(client) = &self.client else {
            return Summary::Failed(SummaryError::NotInitialized);
        };
        match client.generate(&build_prompt(text)).await {
            Ok(summary) => Summary::Generated(summary),
            Err(e) => {
                warn!(error = %e, "Error during summarization");
                Summary::Failed(e)
            }
        }
    }
}

/// Summarize each article in order, one call at a time.
#[instrument(level = "info", skip_all, fields(count = articles.len()))]
pub async fn summarize_articles<S: Summarize>(
    summarizer: &S,
    articles: Vec<Article>,
) -> Vec<DigestEntry> {
    let mut entries = Vec::with_capacity(articles.len());
    for article in articles {
        let summary = summarizer.summarize(article.description.as_deref()).await;
        entries.push(DigestEntry { article, summary });
    }
    let failed = entries
        .iter()
        .filter(|e| matches!(e.summary, Summary::Failed(_)))
        .count();
    info!(total = entries.len(), failed, "Summarized articles");
    entries
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<RequestContent<'a>>,
    safety_settings: Vec<SafetySetting>,
}

impl<'a> GenerateContentRequest<'a> {
    fn new(prompt: &'a str) -> Self {
        Self {
            contents: vec![RequestContent {
                role: "user",
                parts: vec![RequestPart { text: prompt }],
            }],
            safety_settings: SAFETY_CATEGORIES
                .into_iter()
                .map(|category| SafetySetting {
                    category,
                    threshold: "BLOCK_NONE",
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    role: &'static str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct SafetySetting {
    category: &'static str,
    threshold: &'static str,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

impl GenerateContentResponse {
    /// Joined text parts of the first candidate, `None` when blank.
    fn first_text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        let text = text.trim();
        (!text.is_empty()).then(|| text.to_string())
    }
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<ResponseContent>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}
