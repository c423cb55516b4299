use crate::error::OptimizeError;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use shared::settings::ModelSettings;
use std::env;
use std::time::Duration;

const MAX_ERROR_BODY_CHARS: usize = 800;
const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InlineData {
    pub mime_type: String,
    pub data: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Part {
    Text(String),
    InlineData(InlineData),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationConfig {
    pub temperature: f32,
}

/// Body of a `generateContent` call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerateRequest {
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>,
    pub generation_config: GenerationConfig,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidatePart {
    text: Option<String>,
    #[serde(default)]
    thought: bool,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidateContent {
    #[serde(default)]
    parts: Vec<GeminiCandidatePart>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: Option<GeminiCandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    prompt_feedback: Option<GeminiPromptFeedback>,
}

/// Something that turns a [`GenerateRequest`] into model text.
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    async fn generate(&self, request: &GenerateRequest) -> Result<String, OptimizeError>;
}

pub struct GeminiClient {
    http: Client,
    auth_token: String,
    model: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(
        model: &str,
        api_key: &str,
        base_url: &str,
        timeout: Duration,
    ) -> Result<Self, OptimizeError> {
        Ok(Self {
            http: Client::builder().timeout(timeout).build()?,
            auth_token: api_key.to_string(),
            model: model.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Key from the settings file, then `GEMINI_API_KEY`, then `API_KEY`.
    pub fn from_settings(settings: &ModelSettings) -> Result<Self, OptimizeError> {
        let auth_token = match &settings.gemini_auth.api_key {
            Some(key) if !key.trim().is_empty() => key.trim().to_string(),
            _ => env::var("GEMINI_API_KEY")
                .or_else(|_| env::var("API_KEY"))
                .ok()
                .filter(|k| !k.trim().is_empty())
                .ok_or(OptimizeError::MissingApiKey)?,
        };
        Self::new(
            &settings.gemini_model,
            &auth_token,
            &settings.base_url,
            Duration::from_secs(settings.timeout_secs),
        )
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

#[async_trait]
impl ContentGenerator for GeminiClient {
    async fn generate(&self, request: &GenerateRequest) -> Result<String, OptimizeError> {
        tracing::debug!(model = %self.model, "sending generateContent request");
        let resp = self
            .http
            .post(self.endpoint())
            .header(API_KEY_HEADER, &self.auth_token)
            .json(request)
            .send()
            .await
            .map_err(|e| OptimizeError::Transport(e.without_url()))?;
        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(OptimizeError::Service {
                status: status.as_u16(),
                body: truncate_chars(body.trim(), MAX_ERROR_BODY_CHARS),
            });
        }
        let body = resp
            .text()
            .await
            .map_err(|e| OptimizeError::Transport(e.without_url()))?;
        response_text(&body)
    }
}

/// Concatenated text of the first candidate, skipping thought parts.
fn response_text(body: &str) -> Result<String, OptimizeError> {
    let parsed: GeminiResponse =
        serde_json::from_str(body).map_err(|e| OptimizeError::Decode(e.to_string()))?;
    let candidate = parsed.candidates.first();
    let text: String = candidate
        .and_then(|c| c.content.as_ref())
        .map(|c| {
            c.parts
                .iter()
                .filter(|p| !p.thought)
                .filter_map(|p| p.text.as_deref())
                .collect()
        })
        .unwrap_or_default();
    if text.is_empty() {
        let reason = parsed
            .prompt_feedback
            .and_then(|f| f.block_reason)
            .or_else(|| candidate.and_then(|c| c.finish_reason.clone()));
        return Err(OptimizeError::EmptyResponse { reason });
    }
    Ok(text)
}

fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
