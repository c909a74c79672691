use async_trait::async_trait;
use tracing::{error, info};

use super::gemini::{GeminiClient, GeminiError};
use crate::config::Config;
use crate::conversation::ANSWER_FALLBACK;
use crate::prompts::{conversation_prompt, topic_prompt, TUTOR_SYSTEM_INSTRUCTION};
use crate::state::Message;
use crate::topic::CONTENT_FALLBACK;

/// The two remote calls the stores depend on.
///
/// Implementations must not fail: any lower-level error is turned into a
/// human-readable apology and returned as the result.
#[async_trait]
pub trait Tutor: Send + Sync {
    /// Markdown lesson for one curriculum subtopic
    async fn fetch_topic_content(&self, topic: &str) -> String;

    /// Answer `query` given the conversation that preceded it
    async fn answer_query(&self, query: &str, history: &[Message], thinking_mode: bool) -> String;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSettings {
    pub content_model: String,
    pub chat_model: String,
    pub thinking_model: String,
    pub thinking_budget: u32,
}

impl ModelSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            content_model: config.content_model().to_string(),
            chat_model: config.chat_model().to_string(),
            thinking_model: config.thinking_model().to_string(),
            thinking_budget: config.thinking_budget(),
        }
    }

    /// Model and thinking budget for a chat query
    pub fn for_query(&self, thinking_mode: bool) -> (&str, Option<u32>) {
        if thinking_mode {
            (self.thinking_model.as_str(), Some(self.thinking_budget))
        } else {
            (self.chat_model.as_str(), None)
        }
    }
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self::from_config(&Config::new())
    }
}

/// [`Tutor`] backed by the Gemini API
#[derive(Clone)]
pub struct GeminiTutor {
    client: GeminiClient,
    models: ModelSettings,
}

impl GeminiTutor {
    pub fn new(client: GeminiClient, models: ModelSettings) -> Self {
        Self { client, models }
    }

    pub fn from_config(config: &Config) -> Self {
        let api_key = config.resolve_api_key();
        let client = GeminiClient::with_base_url(api_key.as_deref(), config.base_url());
        Self::new(client, ModelSettings::from_config(config))
    }

    pub fn models(&self) -> &ModelSettings {
        &self.models
    }

    pub fn has_api_key(&self) -> bool {
        self.client.has_api_key()
    }

    async fn try_fetch_topic_content(&self, topic: &str) -> Result<String, GeminiError> {
        self.client
            .generate(&self.models.content_model, &topic_prompt(topic), None, None)
            .await
    }

    async fn try_answer_query(
        &self,
        query: &str,
        history: &[Message],
        thinking_mode: bool,
    ) -> Result<String, GeminiError> {
        let (model, budget) = self.models.for_query(thinking_mode);
        let prompt = conversation_prompt(history, query);
        self.client
            .generate(model, &prompt, Some(TUTOR_SYSTEM_INSTRUCTION), budget)
            .await
    }
}

#[async_trait]
impl Tutor for GeminiTutor {
    async fn fetch_topic_content(&self, topic: &str) -> String {
        info!(topic, model = %self.models.content_model, "fetching topic content");
        match self.try_fetch_topic_content(topic).await {
            Ok(content) => content,
            Err(e) => {
                error!(topic, error = %e, "error fetching topic content");
                CONTENT_FALLBACK.to_string()
            }
        }
    }

    async fn answer_query(&self, query: &str, history: &[Message], thinking_mode: bool) -> String {
        info!(thinking_mode, history_len = history.len(), "answering query");
        match self.try_answer_query(query, history, thinking_mode).await {
            Ok(answer) => answer,
            Err(e) => {
                error!(error = %e, "error answering query");
                ANSWER_FALLBACK.to_string()
            }
        }
    }
}
