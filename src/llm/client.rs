//! OpenAI chat-completions client for feedback classification.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error};

use super::Analyzer;
use crate::models::AnalysisPayload;

/// Default prompt for feedback analysis.
///
/// The response shape is pinned explicitly (top-level `themes` array plus
/// `overall_summary`) so the result can be parsed against a fixed schema
/// instead of structurally guessed at.
pub const DEFAULT_ANALYSIS_PROMPT: &str = r#"You are an expert product analyst. Your job is to analyze raw user feedback and categorize it. Analyze the following text and return a structured JSON object. Your response MUST be a valid JSON object with exactly two top-level fields: "themes" (an array) and "overall_summary" (a string).
First, group all feedback into distinct themes.
For each distinct theme, you must provide:
1. 'category': A clear category (e.g., 'Bug Report', 'Feature Request', 'UI/UX Complaint', 'Positive Feedback').
2. 'sentiment': ('Positive', 'Negative', 'Neutral').
3. 'summary': A concise, one-sentence summary of the theme.
4. 'quote': The single best, most representative user quote for this theme.
5. 'count': An integer representing the number of times this specific theme was mentioned.
6. 'priority': A priority level ('High', 'Medium', or 'Low'). A 'High' priority should be assigned to critical issues like data loss, crashes, security flaws, or features blocking a user's core workflow.
Finally, provide the top-level 'overall_summary' of the key insights."#;

/// Configuration for the classification client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// API base URL (default: https://api.openai.com/v1)
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Model to use (default: gpt-4o)
    #[serde(default = "default_model")]
    pub model: String,
    /// API key. Usually supplied via OPENAI_API_KEY rather than the
    /// config file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Temperature for generation (0.0 - 1.0)
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Custom analysis prompt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis_prompt: Option<String>,
}

fn default_endpoint() -> String {
    "https://api.openai.com/v1".to_string()
}
fn default_model() -> String {
    "gpt-4o".to_string()
}
fn default_temperature() -> f32 {
    0.2
}
fn default_timeout_secs() -> u64 {
    120
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            model: default_model(),
            api_key: None,
            temperature: default_temperature(),
            timeout_secs: default_timeout_secs(),
            analysis_prompt: None,
        }
    }
}

impl LlmConfig {
    /// Get the analysis prompt, using custom or default.
    pub fn get_analysis_prompt(&self) -> &str {
        self.analysis_prompt
            .as_deref()
            .unwrap_or(DEFAULT_ANALYSIS_PROMPT)
    }
}

/// Errors that can occur during classification.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("API key is not configured")]
    MissingApiKey,
    #[error("Connection error: {0}")]
    Connection(String),
    #[error("API error: HTTP {status}: {detail}")]
    Api { status: u16, detail: String },
    #[error("Parse error: {0}")]
    Parse(String),
}

/// OpenAI chat-completions request format.
#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

/// OpenAI chat-completions response format.
#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: String,
}

/// Classification client backed by an OpenAI-compatible API.
pub struct OpenAiClient {
    config: LlmConfig,
    client: Client,
}

impl OpenAiClient {
    /// Create a new client with the given configuration.
    pub fn new(config: LlmConfig) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self { config, client }
    }

    /// Get the config.
    pub fn config(&self) -> &LlmConfig {
        &self.config
    }

    /// Call the chat-completions endpoint and return the message content.
    async fn call_api(&self, text: &str) -> Result<String, AnalysisError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(AnalysisError::MissingApiKey)?;

        let request = ChatRequest {
            model: self.config.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: self.config.get_analysis_prompt().to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: text.to_string(),
                },
            ],
            temperature: self.config.temperature,
            response_format: ResponseFormat {
                format_type: "json_object",
            },
        };

        let url = format!("{}/chat/completions", self.config.endpoint);
        debug!("Requesting analysis from {} ({})", url, self.config.model);

        let resp = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AnalysisError::Connection(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            // Upstream error bodies are logged, never surfaced to callers
            error!("Classification API error: HTTP {}: {}", status, body);
            return Err(AnalysisError::Api {
                status,
                detail: body,
            });
        }

        let chat: ChatResponse = resp
            .json()
            .await
            .map_err(|e| AnalysisError::Parse(e.to_string()))?;

        let content = chat
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| AnalysisError::Parse("response contained no choices".to_string()))?;

        Ok(content)
    }
}

#[async_trait]
impl Analyzer for OpenAiClient {
    async fn analyze(&self, text: &str) -> Result<AnalysisPayload, AnalysisError> {
        let content = self.call_api(text).await?;

        let payload: AnalysisPayload = serde_json::from_str(&content).map_err(|e| {
            error!("Unexpected classification payload shape: {}", e);
            AnalysisError::Parse(e.to_string())
        })?;

        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LlmConfig::default();
        assert_eq!(config.model, "gpt-4o");
        assert!(config.endpoint.starts_with("https://api.openai.com"));
        assert!(config.analysis_prompt.is_none());
        assert!(config.get_analysis_prompt().contains("overall_summary"));
    }

    #[tokio::test]
    async fn test_missing_api_key_fails_before_network() {
        let client = OpenAiClient::new(LlmConfig::default());
        let err = client.analyze("some feedback").await.unwrap_err();
        assert!(matches!(err, AnalysisError::MissingApiKey));
    }

    #[test]
    fn test_chat_response_parses() {
        let body = r#"{
            "id": "chatcmpl-1",
            "choices": [
                {"index": 0, "message": {"role": "assistant", "content": "{}"}}
            ]
        }"#;
        let resp: ChatResponse = serde_json::from_str(body).unwrap();
        assert_eq!(resp.choices.len(), 1);
        assert_eq!(resp.choices[0].message.content, "{}");
    }
}
