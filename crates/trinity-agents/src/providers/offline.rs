//! Provider used when no completion service is configured

use async_trait::async_trait;
use trinity_core::llm::{LLMCallOutcome, LLMProvider, LLMRequest};

/// Never touches the network. Its reply carries no structure, so every
/// agent stage falls back to local heuristics.
#[derive(Debug, Clone, Default)]
pub struct OfflineProvider;

impl OfflineProvider {
    pub const REPLY: &'static str =
        "Offline mode: no language model is configured, analysis is derived from local heuristics.";

    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl LLMProvider for OfflineProvider {
    fn name(&self) -> &str {
        "offline"
    }

    async fn complete(&self, _request: LLMRequest) -> LLMCallOutcome {
        LLMCallOutcome::success(Self::REPLY)
    }
}
