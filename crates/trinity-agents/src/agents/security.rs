//! Security agent ("CS")
//!
//! Three scans run in parallel: intent (prompt injection, malicious goals),
//! code (injection payloads, leaked secrets) and an API-security checklist.
//! Checklist gaps are advisory; the RefleXion generator adds those controls
//! itself, so they never raise the threat level.

use super::{mentions_any, words, Agent, AgentSettings, PromptRunner};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use trinity_core::analysis::{AgentAnalysis, ApiGap, SecurityAnalysis};
use trinity_core::extract::{extract_structured, string_list, StructuredShape};
use trinity_core::llm::{LLMCallOutcome, LLMProvider};
use trinity_core::security::{SecurityScanner, Threat, ThreatLevel};
use trinity_core::{AgentId, AgentResult, AgentStatus, ConceptInput};

const SYSTEM_PROMPT: &str = "You are the Security reviewer of a product board. \
List plausible attack scenarios as JSON: {\"threats\": [str]}";

/// (feature, evidence terms)
const API_CHECKLIST: [(&str, &[&str]); 5] = [
    ("authentication", &["login", "sign in", "auth", "authentication", "accounts", "oauth", "sso"]),
    ("rate limiting", &["rate limit", "rate limiting", "throttling"]),
    ("input validation", &["validation", "validated", "sanitize", "sanitized"]),
    ("transport encryption", &["https", "tls", "encrypted", "encryption"]),
    ("audit logging", &["audit", "logging"]),
];

/// Checklist items the concept never mentions
pub fn api_gaps(concept: &ConceptInput) -> Vec<ApiGap> {
    let text = concept.searchable_text();
    let vocabulary: HashSet<String> = words(&text);
    API_CHECKLIST
        .iter()
        .filter(|(_, evidence)| !mentions_any(&text, &vocabulary, evidence))
        .map(|(feature, _)| ApiGap {
            feature: feature.to_string(),
            advisory: format!("Not mentioned; generated code adds {} automatically", feature),
        })
        .collect()
}

/// Raw text handed to the code scanner: description plus context values
fn code_surface(concept: &ConceptInput) -> String {
    let mut values: Vec<&String> = concept.user_context().values().collect();
    values.sort();
    let mut text = concept.description().to_string();
    for value in values {
        text.push('\n');
        text.push_str(value);
    }
    text
}

fn intent_surface(concept: &ConceptInput) -> String {
    match concept.category() {
        Some(category) => format!("{}\n{}", concept.description(), category),
        None => concept.description().to_string(),
    }
}

pub fn security_status(level: ThreatLevel) -> AgentStatus {
    match level {
        ThreatLevel::Critical => AgentStatus::Blocked,
        ThreatLevel::High | ThreatLevel::Medium => AgentStatus::Warning,
        ThreatLevel::Low => AgentStatus::Success,
    }
}

fn review_notes(shape: Option<StructuredShape>) -> Vec<String> {
    match shape {
        Some(shape) => shape
            .as_json()
            .map(|value| string_list(value, "threats"))
            .filter(|threats| !threats.is_empty())
            .unwrap_or_else(|| shape.items()),
        None => Vec::new(),
    }
}

pub struct SecurityAgent {
    runner: PromptRunner,
}

impl SecurityAgent {
    pub fn new(provider: Arc<dyn LLMProvider>, settings: AgentSettings) -> Self {
        Self {
            runner: PromptRunner::new(provider, settings),
        }
    }

    fn recommendations(analysis: &SecurityAnalysis, notes: Vec<String>) -> Vec<String> {
        let mut out = Vec::new();
        if analysis.auto_block {
            out.push("Blocked: rework the concept before any further review".to_string());
        }
        out.extend(
            analysis
                .threats
                .iter()
                .map(|t| format!("Mitigate {}: {}", t.name, t.description)),
        );
        out.extend(
            analysis
                .api_gaps
                .iter()
                .map(|gap| format!("Plan for {}: {}", gap.feature, gap.advisory)),
        );
        out.extend(notes.into_iter().take(3).map(|note| format!("Reviewer: {}", note)));
        out
    }
}

#[async_trait]
impl Agent for SecurityAgent {
    fn id(&self) -> AgentId {
        AgentId::Security
    }

    async fn analyze(&self, concept: &ConceptInput) -> AgentResult {
        let intent_text = intent_surface(concept);
        let code_text = code_surface(concept);
        let prompt = format!("Concept: {}", concept.description());

        let (intent_threats, code_threats, gaps, review) = tokio::join!(
            async { SecurityScanner::scan_intent(&intent_text) },
            async { SecurityScanner::scan_code(&code_text) },
            async { api_gaps(concept) },
            self.runner.ask(SYSTEM_PROMPT, prompt),
        );

        let threats: Vec<Threat> = intent_threats.into_iter().chain(code_threats).collect();
        let threat_level = ThreatLevel::assess(&threats);
        let auto_block = threat_level == ThreatLevel::Critical;

        let (notes, review_state) = match review {
            LLMCallOutcome::Success { text, .. } => (review_notes(extract_structured(&text)), "completed"),
            LLMCallOutcome::Failure(failure) => {
                if !auto_block {
                    let result = AgentResult::degraded(AgentId::Security, failure.to_string());
                    self.runner.audit(concept, &result);
                    return result;
                }
                tracing::warn!("Security review unavailable, pattern verdict stands: {}", failure);
                (Vec::new(), "failed")
            }
        };

        if auto_block {
            tracing::warn!(
                concept_id = %concept.id(),
                session_id = %concept.session_id(),
                threats = threats.len(),
                "Critical threat detected, auto-block requested"
            );
        }

        let analysis = SecurityAnalysis {
            threats,
            api_gaps: gaps,
            threat_level,
            auto_block,
        };
        let recommendations = Self::recommendations(&analysis, notes);
        let threat_count = analysis.threats.len();

        let result = AgentResult::new(
            AgentId::Security,
            security_status(threat_level),
            AgentAnalysis::Security(analysis),
            recommendations,
            threat_level.risk_score(),
        )
        .with_metadata("threat_count", threat_count.into())
        .with_metadata("auto_block", auto_block.into())
        .with_metadata("llm_review", review_state.into());

        self.runner.audit(concept, &result);
        result
    }
}
