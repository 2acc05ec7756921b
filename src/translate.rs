//! Natural-language to SQL translation through an OpenAI-compatible
//! chat-completions endpoint.

use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::schema;

const SYSTEM_PROMPT: &str = "You are a SQL query generator. Given a database schema and a natural language question, generate a valid SQL query.
Return ONLY the SQL query without any explanations, markdown formatting, or additional text.
If the question cannot be answered with the given schema, return an empty string.";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, thiserror::Error)]
pub enum TranslateError {
    #[error("Request to the completion service failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Completion service returned no choices")]
    NoChoices,

    #[error("The question can't be answered from this database's schema")]
    Empty,
}

#[async_trait]
pub trait Translator: Send + Sync + Debug {
    async fn to_sql(&self, schema_text: &str, question: &str) -> Result<String, TranslateError>;
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f64,
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
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug)]
pub struct ChatCompletionTranslator {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    temperature: f64,
}

impl ChatCompletionTranslator {
    pub fn new(config: &schema::Translator) -> Result<Self, TranslateError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
        })
    }
}

#[async_trait]
impl Translator for ChatCompletionTranslator {
    async fn to_sql(&self, schema_text: &str, question: &str) -> Result<String, TranslateError> {
        let user_message = format!(
            "Database Schema:\n{schema_text}\n\nQuestion: {question}\n\nGenerate a SQL query:"
        );
        let request = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: &user_message,
                },
            ],
            temperature: self.temperature,
        };

        debug!(question, model = %self.model, "Requesting SQL translation");
        let response: ChatResponse = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let content = response
            .choices
            .into_iter()
            .next()
            .ok_or(TranslateError::NoChoices)?
            .message
            .content
            .unwrap_or_default();

        let sql = strip_code_fences(&content);
        if sql.is_empty() {
            return Err(TranslateError::Empty);
        }
        debug!(sql, "Translated question");
        Ok(sql.to_string())
    }
}

/// Models sometimes wrap the query in a Markdown code block despite being
/// told not to.
pub fn strip_code_fences(text: &str) -> &str {
    let text = text.trim();
    let text = text
        .strip_prefix("```sql")
        .or_else(|| text.strip_prefix("```"))
        .unwrap_or(text);
    let text = text.strip_suffix("```").unwrap_or(text);
    text.trim()
}
