//! Chat completion client for an OpenAI-compatible API

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{check_status, JarvisError, Result};
use crate::types::ChatTurn;

/// A completion call: system instruction, prior turns, then the user message
#[derive(Debug, Clone, Default)]
pub struct CompletionRequest {
    pub system: String,
    pub history: Vec<ChatTurn>,
    pub input: String,
}

impl CompletionRequest {
    pub fn new(system: impl Into<String>, input: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            history: Vec::new(),
            input: input.into(),
        }
    }

    pub fn with_history(mut self, history: Vec<ChatTurn>) -> Self {
        self.history = history;
        self
    }
}

/// Generates text from an instruction and a user message
#[async_trait]
pub trait CompletionService: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<String>;
}

// ============================================================================
// Wire Types
// ============================================================================

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
}

#[derive(Serialize)]
struct WireMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize, Debug)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize, Debug)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize, Debug)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

fn build_messages(request: &CompletionRequest) -> Vec<WireMessage<'_>> {
    let mut messages = Vec::with_capacity(request.history.len() + 2);
    messages.push(WireMessage {
        role: "system",
        content: &request.system,
    });
    for turn in &request.history {
        messages.push(WireMessage {
            role: turn.role.as_str(),
            content: &turn.content,
        });
    }
    messages.push(WireMessage {
        role: "user",
        content: &request.input,
    });
    messages
}

/// Extract the first non-empty choice text
fn extract_text(resp: ChatCompletionResponse) -> Result<String> {
    resp.choices
        .into_iter()
        .filter_map(|c| c.message.content)
        .map(|text| text.trim().to_string())
        .find(|text| !text.is_empty())
        .ok_or_else(|| JarvisError::EmptyResult("no text in completion response".to_string()))
}

// ============================================================================
// Client
// ============================================================================

/// `POST {base}/chat/completions` client
pub struct OpenAiChat {
    client: Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl OpenAiChat {
    pub fn new(
        client: Client,
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            model: model.into(),
            api_key,
        }
    }
}

#[async_trait]
impl CompletionService for OpenAiChat {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(JarvisError::ConfigMissing("OPENAI_KEY"))?;

        let body = ChatCompletionRequest {
            model: &self.model,
            messages: build_messages(request),
        };

        tracing::debug!(
            model = %self.model,
            turns = request.history.len(),
            "calling completion API at {}/chat/completions",
            self.base_url
        );

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?;

        let resp: ChatCompletionResponse = check_status("completion API", response)
            .await?
            .json()
            .await?;

        extract_text(resp)
    }
}
