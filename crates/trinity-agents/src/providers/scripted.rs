//! Replay provider: hands out canned outcomes in order
//!
//! Used for dry runs and deterministic tests. Once the script is exhausted
//! the fallback outcome is repeated.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use trinity_core::llm::{LLMCallOutcome, LLMFailureKind, LLMProvider, LLMRequest};

pub struct ScriptedProvider {
    script: Mutex<VecDeque<LLMCallOutcome>>,
    fallback: LLMCallOutcome,
    requests: Mutex<Vec<LLMRequest>>,
}

impl ScriptedProvider {
    pub fn new(script: Vec<LLMCallOutcome>, fallback: LLMCallOutcome) -> Self {
        Self {
            script: Mutex::new(script.into()),
            fallback,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Every call succeeds with `text`
    pub fn always(text: impl Into<String>) -> Self {
        Self::new(Vec::new(), LLMCallOutcome::success(text))
    }

    /// Every call fails with `kind`
    pub fn failing(kind: LLMFailureKind) -> Self {
        Self::new(Vec::new(), LLMCallOutcome::failure(kind, "scripted failure"))
    }

    /// Requests seen so far, in call order
    pub fn requests(&self) -> Vec<LLMRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or(0)
    }
}

#[async_trait]
impl LLMProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: LLMRequest) -> LLMCallOutcome {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request);
        }
        self.script
            .lock()
            .ok()
            .and_then(|mut script| script.pop_front())
            .unwrap_or_else(|| self.fallback.clone())
    }
}
