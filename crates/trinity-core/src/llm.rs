//! LLM service boundary
//!
//! Agents talk to text-completion services only through [`LLMProvider`].
//! A call never raises: it yields an [`LLMCallOutcome`] that the caller
//! pattern-matches.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

/// Role-tagged chat message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

/// Completion request
#[derive(Debug, Clone, PartialEq)]
pub struct LLMRequest {
    pub messages: Vec<Message>,
    pub temperature: Option<f64>,
    pub max_tokens: Option<u32>,
}

impl LLMRequest {
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            messages,
            temperature: None,
            max_tokens: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// Token usage
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

impl TokenUsage {
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }
}

impl std::ops::AddAssign for TokenUsage {
    fn add_assign(&mut self, other: Self) {
        self.prompt_tokens += other.prompt_tokens;
        self.completion_tokens += other.completion_tokens;
        self.total_tokens += other.total_tokens;
    }
}

/// Typed failure classes of the completion service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LLMFailureKind {
    Auth,
    RateLimit,
    Timeout,
    InvalidRequest,
    Unavailable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LLMFailure {
    pub kind: LLMFailureKind,
    pub message: String,
}

impl LLMFailure {
    pub fn new(kind: LLMFailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for LLMFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

/// Outcome of one completion call
#[derive(Debug, Clone, PartialEq)]
pub enum LLMCallOutcome {
    Success { text: String, usage: TokenUsage },
    Failure(LLMFailure),
}

impl LLMCallOutcome {
    pub fn success(text: impl Into<String>) -> Self {
        LLMCallOutcome::Success {
            text: text.into(),
            usage: TokenUsage::default(),
        }
    }

    pub fn failure(kind: LLMFailureKind, message: impl Into<String>) -> Self {
        LLMCallOutcome::Failure(LLMFailure::new(kind, message))
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            LLMCallOutcome::Success { text, .. } => Some(text),
            LLMCallOutcome::Failure(_) => None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, LLMCallOutcome::Success { .. })
    }
}

/// Provider trait - implemented by all LLM backends
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Provider name
    fn name(&self) -> &str;

    /// Generate a completion; failures are returned, not raised
    async fn complete(&self, request: LLMRequest) -> LLMCallOutcome;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builder() {
        let request = LLMRequest::new(vec![Message::system("sys"), Message::user("hello")])
            .with_temperature(0.2)
            .with_max_tokens(512);

        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[0].role, MessageRole::System);
        assert_eq!(request.temperature, Some(0.2));
        assert_eq!(request.max_tokens, Some(512));
    }

    #[test]
    fn test_outcome_accessors() {
        let ok = LLMCallOutcome::success("{}");
        assert_eq!(ok.text(), Some("{}"));
        assert!(ok.is_success());

        let failed = LLMCallOutcome::failure(LLMFailureKind::RateLimit, "429");
        assert!(failed.text().is_none());
        assert!(!failed.is_success());
    }

    #[test]
    fn test_usage_accumulates() {
        let mut usage = TokenUsage::new(10, 5);
        usage += TokenUsage::new(3, 2);
        assert_eq!(usage.total_tokens, 20);
    }
}
