use crate::config::Config;
use crate::error::{AssessError, Result};
use crate::judge::CompletionClient;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Request structure for an OpenAI-compatible chat completions API
#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    stream: bool,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

/// Response structure from the chat completions API
#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

/// Judge client for OpenAI-compatible chat completion endpoints (Together, OpenAI, vLLM, ...)
///
/// Sends each prompt as a single user message, non-streaming, at the configured temperature.
/// No retries: a failed request abandons the query that issued it.
pub struct OpenAiJudgeClient {
    client: Client,
    api_key: String,
    endpoint: String,
    model: String,
    temperature: f32,
}

impl OpenAiJudgeClient {
    /// Create a new judge client
    ///
    /// # Arguments
    ///
    /// * `api_key` - Bearer token for the completion API
    /// * `base_url` - API root, e.g. "https://api.together.xyz/v1"
    /// * `model` - Model name (e.g., "meta-llama/Llama-3-70b-chat-hf")
    /// * `temperature` - Sampling temperature; keep low for repeatable verdicts
    /// * `timeout` - Optional per-request timeout (none by default)
    ///
    /// # Panics
    ///
    /// Panics if HTTP client cannot be created (should not happen in normal operation)
    pub fn new(
        api_key: String,
        base_url: &str,
        model: String,
        temperature: f32,
        timeout: Option<Duration>,
    ) -> Self {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().expect("Failed to build HTTP client");

        Self {
            client,
            api_key,
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            model,
            temperature,
        }
    }

    /// Build from config, resolving the API key from the environment.
    pub fn from_config(config: &Config) -> Result<Self> {
        let api_key = config.judge_api_key()?;
        Ok(Self::new(
            api_key,
            &config.judge.base_url,
            config.judge.model.clone(),
            config.judge.temperature,
            config.judge_timeout(),
        ))
    }

    /// Replace the underlying HTTP client.
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl CompletionClient for OpenAiJudgeClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.temperature,
            stream: false,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| AssessError::JudgeApi(format!("Network error: {}", e)))?;

        let status = response.status();

        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());

            return Err(AssessError::JudgeApi(format!(
                "Completion API error {}: {}",
                status, body
            )));
        }

        let result: ChatResponse = response
            .json()
            .await
            .map_err(|e| AssessError::JudgeApi(format!("Failed to parse response: {}", e)))?;

        result
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| AssessError::JudgeApi("Empty response from completion API".to_string()))
    }

    fn has_credentials(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}
