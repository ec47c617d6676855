//! Remote Disease Info Client
//!
//! Given a disease name from the classifier, asks an OpenAI-compatible
//! chat-completion endpoint for a one-line symptom summary and a one-line
//! management summary. The model is instructed to answer with a JSON
//! object, but models drift, so parsing is dual-path: strict JSON first,
//! then a case-insensitive line-pattern fallback, then "Not available"
//! defaults. Parse exhaustion is not an error.
//!
//! No retries, no backoff, no caching: every lookup is a fresh call.

use crate::config::AiConfig;
use crate::errors::{AppError, AppResult};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub const NOT_AVAILABLE: &str = "Not available";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

static SYMPTOMS_RE: OnceLock<Regex> = OnceLock::new();
static MANAGEMENT_RE: OnceLock<Regex> = OnceLock::new();

fn symptoms_re() -> &'static Regex {
    SYMPTOMS_RE.get_or_init(|| {
        Regex::new(r"(?i)symptoms[:\s]+(.+?)\s*(?:management:|\n|$)").expect("valid regex")
    })
}

fn management_re() -> &'static Regex {
    MANAGEMENT_RE
        .get_or_init(|| Regex::new(r"(?i)management[:\s]+(.+?)\s*(?:\n|$)").expect("valid regex"))
}

/// Which parse path produced the [`DiseaseInfo`] fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseSource {
    /// The model answered with a well-formed JSON object.
    Structured,
    /// JSON parsing failed; at least one field came from line-pattern
    /// matching over the freeform text.
    Fallback,
    /// Neither path matched; both fields are defaults.
    Defaults,
}

#[derive(Debug, Clone, Serialize)]
pub struct DiseaseInfo {
    pub symptoms: String,
    pub management: String,
    pub source: ParseSource,
}

// --- OpenAI-compatible serde structs ---

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<ChatMessage>,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: String,
}

/// Client for fetching disease summaries from a chat-completion API.
pub struct AiService {
    client: reqwest::Client,
    config: AiConfig,
}

impl AiService {
    pub fn new(config: AiConfig) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(REQUEST_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &AiConfig {
        &self.config
    }

    /// Fetch symptoms and management for `disease_name`.
    ///
    /// Fails on network errors, non-2xx status (the error names the
    /// status), empty or malformed response envelopes. A response whose
    /// content merely fails to parse still succeeds, with defaults and a
    /// `source` recording the miss.
    pub async fn get_disease_info(&self, disease_name: &str) -> AppResult<DiseaseInfo> {
        self.config.require_configured()?;

        let request = ChatRequest {
            model: self.config.model.clone(),
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: build_prompt(disease_name),
            }],
        };

        let response = self
            .client
            .post(&self.config.api_url)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            log::warn!("Disease info request for '{}' failed: {}", disease_name, status);
            return Err(AppError::RemoteApi {
                status: status.as_u16(),
                message: if body.trim().is_empty() {
                    status
                        .canonical_reason()
                        .unwrap_or("request failed")
                        .to_string()
                } else {
                    body
                },
            });
        }

        if body.trim().is_empty() {
            return Err(AppError::RemoteApi {
                status: status.as_u16(),
                message: "Empty response body".to_string(),
            });
        }

        let envelope: ChatResponse = serde_json::from_str(&body).map_err(|e| {
            AppError::RemoteApi {
                status: status.as_u16(),
                message: format!("Malformed response body: {}", e),
            }
        })?;

        let content = envelope
            .choices
            .first()
            .map(|c| c.message.content.as_str())
            .ok_or_else(|| AppError::RemoteApi {
                status: status.as_u16(),
                message: "Response contained no choices".to_string(),
            })?;

        log::debug!("Raw disease info content: {}", content);

        Ok(parse_disease_info(content))
    }

    /// Like [`get_disease_info`](Self::get_disease_info), but gives up and
    /// returns `Ok(None)` once `cancel` fires. The pending response is
    /// dropped without being delivered.
    pub async fn get_disease_info_cancellable(
        &self,
        disease_name: &str,
        cancel: &CancellationToken,
    ) -> AppResult<Option<DiseaseInfo>> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                log::info!("Disease info lookup for '{}' cancelled", disease_name);
                Ok(None)
            }
            result = self.get_disease_info(disease_name) => result.map(Some),
        }
    }
}

fn build_prompt(disease_name: &str) -> String {
    format!(
        "Give symptoms and management of this plant disease in 1 line each:\n\
         Disease: {}\n\
         Return response as JSON with keys \"symptoms\" and \"management\"",
        disease_name
    )
}

/// Best-effort extraction of symptoms and management from model output.
///
/// Tries a strict JSON object first (missing keys default), then
/// case-insensitive `symptoms:` / `management:` line patterns. Never
/// fails; the returned `source` says which path succeeded.
pub fn parse_disease_info(content: &str) -> DiseaseInfo {
    if let Ok(serde_json::Value::Object(obj)) = serde_json::from_str(content) {
        let field = |key: &str| {
            obj.get(key)
                .and_then(|v| v.as_str())
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .unwrap_or(NOT_AVAILABLE)
                .to_string()
        };
        return DiseaseInfo {
            symptoms: field("symptoms"),
            management: field("management"),
            source: ParseSource::Structured,
        };
    }

    let symptoms = symptoms_re()
        .captures(content)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string());
    let management = management_re()
        .captures(content)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string());

    let source = if symptoms.is_some() || management.is_some() {
        ParseSource::Fallback
    } else {
        ParseSource::Defaults
    };

    DiseaseInfo {
        symptoms: symptoms.unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        management: management.unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        source,
    }
}
