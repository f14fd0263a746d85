//! Chat-completion client — the single outbound seam to the hosted LLM APIs.
//!
//! ARCHITECTURAL RULE: no other module may call a provider directly.
//! Both providers (Groq for the manual analyze flow, Perplexity for the auto
//! research flow) speak the OpenAI-compatible `chat/completions` envelope,
//! so one client covers both; `main` configures an instance per provider.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Groq chat-completions endpoint (manual analyze flow).
pub const GROQ_API_URL: &str = "https://api.groq.com/openai/v1/chat/completions";
/// Perplexity chat-completions endpoint (auto research flow).
pub const PERPLEXITY_API_URL: &str = "https://api.perplexity.ai/chat/completions";

/// Model for the manual analyze flow.
pub const GROQ_MODEL: &str = "llama3-70b-8192";
/// Online research model for the auto flow.
pub const PERPLEXITY_MODEL: &str = "llama-3.1-sonar-large-128k-online";

/// Both flows are extraction, not generation — keep the sampling cold.
pub const TEMPERATURE: f32 = 0.1;
/// Reply budget for the analyze flow; the auto flow uses the provider default.
pub const ANALYZE_MAX_TOKENS: u32 = 4000;

const REQUEST_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("chat reply carried no content")]
    EmptyReply,
}

/// Parameters for a single chat completion: one user message, no history.
#[derive(Debug, Clone)]
pub struct CompletionRequest<'a> {
    pub model: &'a str,
    pub prompt: &'a str,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

impl ChatResponse {
    /// Text of the first choice, if any.
    fn text(self) -> Option<String> {
        self.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.is_empty())
    }
}

/// The outbound chat seam. `ChatClient` is the production implementation;
/// tests substitute a scripted backend.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn complete(&self, request: CompletionRequest<'_>) -> Result<String, LlmError>;
}

/// HTTP client for one OpenAI-compatible chat-completion provider.
#[derive(Clone)]
pub struct ChatClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl ChatClient {
    pub fn new(base_url: impl Into<String>, api_key: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()
                .expect("Failed to build HTTP client"),
            base_url: base_url.into(),
            api_key,
        }
    }
}

#[async_trait]
impl ChatBackend for ChatClient {
    /// Issues a single request. Failures surface to the caller as-is; nothing
    /// is retried — a failed analysis is simply re-submitted by the user.
    async fn complete(&self, request: CompletionRequest<'_>) -> Result<String, LlmError> {
        let body = ChatRequest {
            model: request.model,
            messages: vec![ChatMessage {
                role: "user",
                content: request.prompt,
            }],
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        let response = self
            .client
            .post(&self.base_url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            warn!("chat API returned {status}: {message}");
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let reply: ChatResponse = response.json().await?;
        let text = reply.text().ok_or(LlmError::EmptyReply)?;

        debug!("chat completion succeeded ({} chars)", text.len());

        Ok(text)
    }
}
