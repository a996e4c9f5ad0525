//! HTTP providers - OpenAI-compatible and Anthropic backends
//!
//! All HTTP plumbing lives in [`BaseProvider`]: one shared client, a sliding
//! window rate limiter and exponential backoff on 429 and timeouts. Transport
//! problems never escape as errors; they are classified into
//! [`LLMFailureKind`] and returned as [`LLMCallOutcome::Failure`].

use super::OfflineProvider;
use anyhow::Context;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use trinity_core::config::{LlmSettings, ProviderKind};
use trinity_core::llm::{
    LLMCallOutcome, LLMFailure, LLMFailureKind, LLMProvider, LLMRequest, Message, MessageRole,
    TokenUsage,
};

type CallResult<T> = std::result::Result<T, LLMFailure>;

const OPENAI_URL: &str = "https://api.openai.com/v1";
const OPENROUTER_URL: &str = "https://openrouter.ai/api/v1";
const ANTHROPIC_URL: &str = "https://api.anthropic.com";

/// Provider configuration
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub name: String,
    pub kind: ProviderKind,
    pub api_key: String,
    pub base_url: Option<String>,
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub rate_limit_per_minute: u32,
}

impl ProviderConfig {
    pub fn from_settings(settings: &LlmSettings, api_key: impl Into<String>) -> Self {
        let kind = settings.provider;
        Self {
            name: format!("{:?}", kind).to_lowercase(),
            kind,
            api_key: api_key.into(),
            base_url: settings.base_url.clone(),
            model: settings.model_name(),
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
            timeout_secs: settings.timeout_secs,
            max_retries: settings.max_retries,
            rate_limit_per_minute: settings.rate_limit_per_minute,
        }
    }
}

/// Window after which a spent request slot is returned
const RATE_WINDOW: Duration = Duration::from_secs(60);

/// Sliding-window rate limiter: at most `requests_per_minute` calls start in
/// any 60 second window
#[derive(Debug)]
pub struct RateLimiter {
    semaphore: Arc<Semaphore>,
    requests_per_minute: u32,
}

impl RateLimiter {
    pub fn new(requests_per_minute: u32) -> Self {
        let requests_per_minute = requests_per_minute.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(requests_per_minute as usize)),
            requests_per_minute,
        }
    }

    pub fn requests_per_minute(&self) -> u32 {
        self.requests_per_minute
    }

    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Take a slot; it comes back one window later, not when the call ends
    pub async fn acquire(&self) -> CallResult<()> {
        let permit = self.semaphore.acquire().await.map_err(|e| {
            LLMFailure::new(LLMFailureKind::Unavailable, format!("Rate limiter error: {}", e))
        })?;
        permit.forget();

        let semaphore = Arc::clone(&self.semaphore);
        tokio::spawn(async move {
            tokio::time::sleep(RATE_WINDOW).await;
            semaphore.add_permits(1);
        });
        Ok(())
    }
}

/// Map an HTTP status onto the failure taxonomy
pub fn classify_status(status: StatusCode) -> LLMFailureKind {
    match status.as_u16() {
        401 | 403 => LLMFailureKind::Auth,
        429 => LLMFailureKind::RateLimit,
        400 | 404 | 422 => LLMFailureKind::InvalidRequest,
        408 | 504 => LLMFailureKind::Timeout,
        _ => LLMFailureKind::Unavailable,
    }
}

fn backoff(attempt: u32) -> Duration {
    Duration::from_millis(500 * 2u64.pow(attempt.min(6)))
}

fn role_name(role: MessageRole) -> &'static str {
    match role {
        MessageRole::System => "system",
        MessageRole::User => "user",
        MessageRole::Assistant => "assistant",
    }
}

fn header(value: &str) -> CallResult<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|_| LLMFailure::new(LLMFailureKind::Auth, "API key is not a valid header value"))
}

fn usage_count(value: &Value, pointer: &str) -> u32 {
    value.pointer(pointer).and_then(Value::as_u64).unwrap_or(0) as u32
}

/// Base provider implementation with common functionality
pub struct BaseProvider {
    name: String,
    client: reqwest::Client,
    rate_limiter: RateLimiter,
    config: ProviderConfig,
}

impl BaseProvider {
    pub fn new(config: ProviderConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            name: config.name.clone(),
            client,
            rate_limiter: RateLimiter::new(config.rate_limit_per_minute),
            config,
        })
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    /// Request temperature and token budget, falling back to the configured defaults
    fn params(&self, request: &LLMRequest) -> (f64, u32) {
        (
            request.temperature.unwrap_or(self.config.temperature),
            request.max_tokens.unwrap_or(self.config.max_tokens),
        )
    }

    pub async fn make_request(&self, url: &str, headers: HeaderMap, body: &Value) -> CallResult<Value> {
        self.rate_limiter.acquire().await?;

        let mut retries = 0;
        let max_retries = self.config.max_retries;

        loop {
            let response = self
                .client
                .post(url)
                .headers(headers.clone())
                .json(body)
                .send()
                .await;

            let (kind, message) = match response {
                Ok(resp) => {
                    let status = resp.status();
                    if status.is_success() {
                        return resp.json().await.map_err(|e| {
                            LLMFailure::new(
                                LLMFailureKind::Unavailable,
                                format!("Failed to parse JSON response: {}", e),
                            )
                        });
                    }
                    let error_text = resp.text().await.unwrap_or_default();
                    (classify_status(status), format!("HTTP {}: {}", status, error_text))
                }
                Err(e) if e.is_timeout() => (LLMFailureKind::Timeout, format!("Request timeout: {}", e)),
                Err(e) => (LLMFailureKind::Unavailable, format!("Request failed: {}", e)),
            };

            let retryable = matches!(kind, LLMFailureKind::RateLimit | LLMFailureKind::Timeout);
            if !retryable || retries >= max_retries {
                return Err(LLMFailure::new(kind, message));
            }

            let delay = backoff(retries);
            tracing::warn!(
                provider = %self.name,
                kind = ?kind,
                attempt = retries + 1,
                "Retrying in {:?}",
                delay
            );
            tokio::time::sleep(delay).await;
            retries += 1;
        }
    }

    fn finish(&self, started: Instant, result: CallResult<(String, TokenUsage)>) -> LLMCallOutcome {
        match result {
            Ok((text, usage)) => {
                tracing::debug!(
                    provider = %self.name,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    tokens = usage.total_tokens,
                    "Completion received"
                );
                LLMCallOutcome::Success { text, usage }
            }
            Err(failure) => {
                tracing::warn!(provider = %self.name, kind = ?failure.kind, "Completion failed: {}", failure.message);
                LLMCallOutcome::Failure(failure)
            }
        }
    }
}

/// OpenAI chat-completions wire format; serves OpenAI and OpenRouter
pub struct OpenAICompatibleProvider {
    base: BaseProvider,
}

impl OpenAICompatibleProvider {
    pub fn new(config: ProviderConfig) -> anyhow::Result<Self> {
        Ok(Self {
            base: BaseProvider::new(config)?,
        })
    }

    fn endpoint(&self) -> String {
        let config = &self.base.config;
        let root = config.base_url.as_deref().unwrap_or(match config.kind {
            ProviderKind::OpenRouter => OPENROUTER_URL,
            _ => OPENAI_URL,
        });
        format!("{}/chat/completions", root.trim_end_matches('/'))
    }

    fn build_headers(&self) -> CallResult<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, header(&format!("Bearer {}", self.base.config.api_key))?);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if self.base.config.kind == ProviderKind::OpenRouter {
            headers.insert("HTTP-Referer", HeaderValue::from_static("https://trinity-review.org"));
            headers.insert("X-Title", HeaderValue::from_static("Trinity"));
        }
        Ok(headers)
    }

    fn body(&self, request: &LLMRequest) -> Value {
        let (temperature, max_tokens) = self.base.params(request);
        serde_json::json!({
            "model": self.base.config.model,
            "messages": request.messages.iter().map(|m| {
                serde_json::json!({ "role": role_name(m.role), "content": m.content })
            }).collect::<Vec<_>>(),
            "temperature": temperature,
            "max_tokens": max_tokens,
            "stream": false,
        })
    }

    fn parse(response: &Value) -> CallResult<(String, TokenUsage)> {
        let text = response
            .pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .ok_or_else(|| LLMFailure::new(LLMFailureKind::Unavailable, "Response carried no completion"))?;
        let usage = TokenUsage::new(
            usage_count(response, "/usage/prompt_tokens"),
            usage_count(response, "/usage/completion_tokens"),
        );
        Ok((text.to_string(), usage))
    }

    async fn try_complete(&self, request: &LLMRequest) -> CallResult<(String, TokenUsage)> {
        let headers = self.build_headers()?;
        let response = self.base.make_request(&self.endpoint(), headers, &self.body(request)).await?;
        Self::parse(&response)
    }
}

#[async_trait]
impl LLMProvider for OpenAICompatibleProvider {
    fn name(&self) -> &str {
        &self.base.name
    }

    async fn complete(&self, request: LLMRequest) -> LLMCallOutcome {
        let started = Instant::now();
        let result = self.try_complete(&request).await;
        self.base.finish(started, result)
    }
}

/// Anthropic Provider (messages API)
pub struct AnthropicProvider {
    base: BaseProvider,
}

impl AnthropicProvider {
    pub fn new(config: ProviderConfig) -> anyhow::Result<Self> {
        Ok(Self {
            base: BaseProvider::new(config)?,
        })
    }

    fn endpoint(&self) -> String {
        let root = self.base.config.base_url.as_deref().unwrap_or(ANTHROPIC_URL);
        format!("{}/v1/messages", root.trim_end_matches('/'))
    }

    fn build_headers(&self) -> CallResult<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert("x-api-key", header(&self.base.config.api_key)?);
        headers.insert("anthropic-version", HeaderValue::from_static("2023-06-01"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    /// System prompts travel outside the message list; multiple ones are joined
    fn convert_messages(messages: &[Message]) -> (Option<String>, Vec<Value>) {
        let mut system: Vec<&str> = Vec::new();
        let mut converted = Vec::new();

        for message in messages {
            match message.role {
                MessageRole::System => system.push(&message.content),
                role => converted.push(serde_json::json!({
                    "role": role_name(role),
                    "content": message.content,
                })),
            }
        }

        let system = if system.is_empty() { None } else { Some(system.join("\n\n")) };
        (system, converted)
    }

    fn body(&self, request: &LLMRequest) -> Value {
        let (temperature, max_tokens) = self.base.params(request);
        let (system, messages) = Self::convert_messages(&request.messages);

        let mut body = serde_json::json!({
            "model": self.base.config.model,
            "messages": messages,
            "max_tokens": max_tokens,
            "temperature": temperature,
        });
        if let Some(system) = system {
            body["system"] = Value::String(system);
        }
        body
    }

    fn parse(response: &Value) -> CallResult<(String, TokenUsage)> {
        let text = response
            .pointer("/content/0/text")
            .and_then(Value::as_str)
            .ok_or_else(|| LLMFailure::new(LLMFailureKind::Unavailable, "Response carried no completion"))?;
        let usage = TokenUsage::new(
            usage_count(response, "/usage/input_tokens"),
            usage_count(response, "/usage/output_tokens"),
        );
        Ok((text.to_string(), usage))
    }

    async fn try_complete(&self, request: &LLMRequest) -> CallResult<(String, TokenUsage)> {
        let headers = self.build_headers()?;
        let response = self.base.make_request(&self.endpoint(), headers, &self.body(request)).await?;
        Self::parse(&response)
    }
}

#[async_trait]
impl LLMProvider for AnthropicProvider {
    fn name(&self) -> &str {
        &self.base.name
    }

    async fn complete(&self, request: LLMRequest) -> LLMCallOutcome {
        let started = Instant::now();
        let result = self.try_complete(&request).await;
        self.base.finish(started, result)
    }
}

pub struct ProviderFactory;

impl ProviderFactory {
    pub fn create(config: ProviderConfig) -> anyhow::Result<Arc<dyn LLMProvider>> {
        match config.kind {
            ProviderKind::OpenAI | ProviderKind::OpenRouter => {
                Ok(Arc::new(OpenAICompatibleProvider::new(config)?))
            }
            ProviderKind::Anthropic => Ok(Arc::new(AnthropicProvider::new(config)?)),
            ProviderKind::Offline => Ok(Arc::new(OfflineProvider::new())),
        }
    }

    /// Build the configured provider, reading its key from the environment.
    ///
    /// Falls back to [`OfflineProvider`] when the key is missing or the
    /// client cannot be built.
    pub fn from_settings(settings: &LlmSettings) -> Arc<dyn LLMProvider> {
        let Some(key_var) = settings.provider.api_key_env() else {
            return Arc::new(OfflineProvider::new());
        };

        let api_key = match std::env::var(key_var) {
            Ok(key) if !key.trim().is_empty() => key,
            _ => {
                tracing::warn!(provider = ?settings.provider, "{} is not set, running offline", key_var);
                return Arc::new(OfflineProvider::new());
            }
        };

        match Self::create(ProviderConfig::from_settings(settings, api_key)) {
            Ok(provider) => provider,
            Err(e) => {
                tracing::warn!(provider = ?settings.provider, "Provider unavailable ({:#}), running offline", e);
                Arc::new(OfflineProvider::new())
            }
        }
    }
}
