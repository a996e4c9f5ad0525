//! The Trinity agents
//!
//! Exactly three reviewers share one contract, [`Agent::analyze`]:
//!
//! - [`InnovationAgent`] ("X"): five-stage business pipeline
//! - [`EthicsAgent`] ("Z"): framework, child-protection and well-being checks plus red lines
//! - [`SecurityAgent`] ("CS"): threat pattern scans and API-security gaps
//!
//! An agent never fails towards its caller. LLM trouble either falls back to
//! heuristics or yields [`AgentResult::degraded`].

pub mod ethics;
pub mod innovation;
pub mod security;

pub use ethics::EthicsAgent;
pub use innovation::InnovationAgent;
pub use security::SecurityAgent;

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use trinity_core::config::TrinityConfig;
use trinity_core::llm::{LLMCallOutcome, LLMProvider, LLMRequest, Message};
use trinity_core::{AgentId, AgentResult, ConceptInput};

/// One reviewer of the Trinity
#[async_trait]
pub trait Agent: Send + Sync {
    fn id(&self) -> AgentId;

    /// Review a validated concept
    async fn analyze(&self, concept: &ConceptInput) -> AgentResult;
}

/// Generation parameters shared by all agents
#[derive(Debug, Clone, PartialEq)]
pub struct AgentSettings {
    pub temperature: f64,
    pub max_tokens: u32,
    /// Emit one `trinity::audit` entry per call
    pub audit: bool,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            temperature: 0.3,
            max_tokens: 2000,
            audit: true,
        }
    }
}

impl AgentSettings {
    pub fn from_config(config: &TrinityConfig) -> Self {
        Self {
            temperature: config.llm.temperature,
            max_tokens: config.llm.max_tokens,
            audit: config.logging.audit,
        }
    }
}

/// Thin wrapper that turns prompts into completion requests
#[derive(Clone)]
pub struct PromptRunner {
    provider: Arc<dyn LLMProvider>,
    settings: AgentSettings,
}

impl PromptRunner {
    pub fn new(provider: Arc<dyn LLMProvider>, settings: AgentSettings) -> Self {
        Self { provider, settings }
    }

    pub fn settings(&self) -> &AgentSettings {
        &self.settings
    }

    pub async fn ask(&self, system: &str, user: String) -> LLMCallOutcome {
        let request = LLMRequest::new(vec![Message::system(system), Message::user(user)])
            .with_temperature(self.settings.temperature)
            .with_max_tokens(self.settings.max_tokens);
        self.provider.complete(request).await
    }

    /// Record the call on the audit target
    pub fn audit(&self, concept: &ConceptInput, result: &AgentResult) {
        if !self.settings.audit {
            return;
        }
        tracing::info!(
            target: "trinity::audit",
            agent = %result.agent_id,
            concept_id = %concept.id(),
            session_id = %concept.session_id(),
            status = %result.status,
            risk_score = result.risk_score,
            "Agent analysis recorded"
        );
    }
}

/// Lowercased word set of a text; hyphens split words
pub(crate) fn words(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

/// Whole-word match for single words, substring match for phrases
pub(crate) fn mentions(text: &str, words: &HashSet<String>, term: &str) -> bool {
    if term.contains(' ') || term.contains('-') || term.contains('.') {
        text.contains(term)
    } else {
        words.contains(term)
    }
}

pub(crate) fn mentions_any(text: &str, words: &HashSet<String>, terms: &[&str]) -> bool {
    terms.iter().any(|term| mentions(text, words, term))
}

/// First sentence, capped at `max` characters
pub(crate) fn summarize(text: &str, max: usize) -> String {
    let sentence = text
        .split_terminator(['.', '!', '?'])
        .next()
        .unwrap_or(text)
        .trim();
    if sentence.chars().count() <= max {
        sentence.to_string()
    } else {
        let cut: String = sentence.chars().take(max).collect();
        format!("{}...", cut.trim_end())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mentions_whole_words_only() {
        let text = "daily rewards with ai coaching";
        let set = words(text);
        assert!(mentions(text, &set, "ai"));
        assert!(!mentions(text, &set, "dai"));
        assert!(mentions(text, &set, "ai coaching"));

        let text = "my daily planner";
        assert!(!mentions(text, &words(text), "ai"));
    }

    #[test]
    fn test_summarize() {
        assert_eq!(summarize("A grocery app. It syncs lists.", 80), "A grocery app");
        assert_eq!(summarize("abcdefghij", 4), "abcd...");
    }

    #[test]
    fn test_settings_from_config() {
        let mut config = TrinityConfig::default();
        config.logging.audit = false;
        let settings = AgentSettings::from_config(&config);
        assert!(!settings.audit);
        assert_eq!(settings.max_tokens, 2000);
    }
}
