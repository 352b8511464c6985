//! Chat completion backends.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::config::ChatSettings;
use super::conversation::{ChatMessage, Role};
use super::error::ChatError;

/// Request timeout for chat completions.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Longest error body kept in `ChatError::Status`.
const MAX_ERROR_DETAIL: usize = 512;

/// Produces the assistant's reply to a conversation.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Sends the full history and returns the assistant message.
    async fn complete(&self, messages: &[ChatMessage]) -> Result<ChatMessage, ChatError>;
}

// ============================================================================
// OpenAiCompatibleBackend
// ============================================================================

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Backend for OpenAI-compatible `/chat/completions` endpoints.
pub struct OpenAiCompatibleBackend {
    client: reqwest::Client,
    settings: ChatSettings,
}

impl OpenAiCompatibleBackend {
    pub fn new(settings: ChatSettings) -> Self {
        Self::with_client(settings, reqwest::Client::new())
    }

    /// Uses a preconfigured HTTP client.
    pub fn with_client(settings: ChatSettings, client: reqwest::Client) -> Self {
        Self { client, settings }
    }

    pub fn settings(&self) -> &ChatSettings {
        &self.settings
    }
}

#[async_trait]
impl ChatBackend for OpenAiCompatibleBackend {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<ChatMessage, ChatError> {
        let api_key = self.settings.api_key()?;
        let url = self.settings.completions_url();

        tracing::debug!(
            provider = %self.settings.provider,
            model = %self.settings.model,
            messages = messages.len(),
            "Sending chat completion request"
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&CompletionRequest {
                model: &self.settings.model,
                messages,
            })
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), "Chat service returned an error");
            return Err(ChatError::Status {
                status: status.as_u16(),
                detail: error_detail(&body),
            });
        }

        let body: CompletionResponse = response.json().await?;
        let message = body
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message)
            .ok_or_else(|| ChatError::InvalidResponse("response has no choices".to_string()))?;

        if message.role != Role::Assistant {
            tracing::debug!(role = %message.role, "Reply has an unexpected role");
        }
        Ok(message)
    }
}

/// Extracts a readable message from an error body.
fn error_detail(body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        return parsed.error.message;
    }
    let trimmed = body.trim();
    if trimmed.chars().count() > MAX_ERROR_DETAIL {
        trimmed.chars().take(MAX_ERROR_DETAIL).collect()
    } else {
        trimmed.to_string()
    }
}

// ============================================================================
// MockChatBackend
// ============================================================================

/// Scripted backend for tests.
///
/// Replies are returned in order; once the script runs out the backend
/// echoes the last user message.
#[derive(Debug, Default)]
pub struct MockChatBackend {
    replies: Mutex<VecDeque<String>>,
    requests: Mutex<Vec<Vec<ChatMessage>>>,
    should_fail: AtomicBool,
}

impl MockChatBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_replies<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: Mutex::new(replies.into_iter().map(Into::into).collect()),
            ..Self::default()
        }
    }

    pub fn push_reply(&self, reply: impl Into<String>) {
        lock(&self.replies).push_back(reply.into());
    }

    pub fn set_should_fail(&self, should_fail: bool) {
        self.should_fail.store(should_fail, Ordering::SeqCst);
    }

    /// Every history the backend was called with, in order.
    #[must_use]
    pub fn requests(&self) -> Vec<Vec<ChatMessage>> {
        lock(&self.requests).clone()
    }

    #[must_use]
    pub fn request_count(&self) -> usize {
        lock(&self.requests).len()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
}

#[async_trait]
impl ChatBackend for MockChatBackend {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<ChatMessage, ChatError> {
        lock(&self.requests).push(messages.to_vec());

        if self.should_fail.load(Ordering::SeqCst) {
            return Err(ChatError::Status {
                status: 500,
                detail: "Mock failure".to_string(),
            });
        }

        let reply = lock(&self.replies).pop_front().unwrap_or_else(|| {
            messages
                .iter()
                .rev()
                .find(|m| m.role == Role::User)
                .map(|m| format!("echo: {}", m.content))
                .unwrap_or_default()
        });
        Ok(ChatMessage::assistant(reply))
    }
}

// ============================================================================
// Tests
// ============================================================================
