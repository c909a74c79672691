use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

#[derive(Debug, Error)]
pub enum GeminiError {
    #[error("Gemini API key not configured. Set GEMINI_API_KEY or run `ansible-navigator set-key <KEY>`")]
    MissingApiKey,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Gemini API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Gemini returned no text (finish reason: {0})")]
    EmptyResponse(String),
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing)]
    thought: Option<bool>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    thinking_config: ThinkingConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ThinkingConfig {
    thinking_budget: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

fn text_content(role: Option<&str>, text: &str) -> Content {
    Content {
        role: role.map(str::to_string),
        parts: vec![Part {
            text: Some(text.to_string()),
            thought: None,
        }],
    }
}

fn build_request(
    prompt: &str,
    system_instruction: Option<&str>,
    thinking_budget: Option<u32>,
) -> GenerateContentRequest {
    GenerateContentRequest {
        contents: vec![text_content(Some("user"), prompt)],
        system_instruction: system_instruction.map(|text| text_content(None, text)),
        generation_config: thinking_budget.map(|budget| GenerationConfig {
            thinking_config: ThinkingConfig {
                thinking_budget: budget,
            },
        }),
    }
}

/// Concatenate the non-thought text parts of the first candidate
fn extract_text(response: GenerateContentResponse) -> Result<String, GeminiError> {
    let Some(candidate) = response.candidates.into_iter().next() else {
        return Err(GeminiError::EmptyResponse("no candidates".to_string()));
    };

    let text: String = candidate
        .content
        .map(|content| content.parts)
        .unwrap_or_default()
        .into_iter()
        .filter(|part| part.thought != Some(true))
        .filter_map(|part| part.text)
        .collect();

    if text.is_empty() {
        return Err(GeminiError::EmptyResponse(
            candidate.finish_reason.unwrap_or_else(|| "unknown".to_string()),
        ));
    }
    Ok(text)
}

fn api_error(status: u16, body: &str) -> GeminiError {
    let message = serde_json::from_str::<ErrorResponse>(body)
        .map(|resp| resp.error.message)
        .unwrap_or_else(|_| body.to_string());
    GeminiError::Api { status, message }
}

/// Thin client for the `generateContent` endpoint
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: Option<String>,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: Option<&str>) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(api_key: Option<&str>, base_url: &str) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.map(str::to_string),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, model)
    }

    pub async fn generate(
        &self,
        model: &str,
        prompt: &str,
        system_instruction: Option<&str>,
        thinking_budget: Option<u32>,
    ) -> Result<String, GeminiError> {
        let api_key = self.api_key.as_deref().ok_or(GeminiError::MissingApiKey)?;
        let request = build_request(prompt, system_instruction, thinking_budget);

        debug!(model, prompt_chars = prompt.len(), ?thinking_budget, "calling generateContent");

        let response = self
            .client
            .post(self.endpoint(model))
            .header("x-goog-api-key", api_key)
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(api_error(status, &body));
        }

        let gemini_response: GenerateContentResponse = response.json().await?;
        extract_text(gemini_response)
    }
}
