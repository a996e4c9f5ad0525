//! Ethics agent ("Z")
//!
//! Three independent checks run side by side with an LLM expert review:
//! twelve compliance frameworks, seven child-protection principles and four
//! well-being dimensions. Level-1 red lines are scanned on the raw text and
//! reject the concept outright, whatever the scores say.

use super::{mentions_any, words, Agent, AgentSettings, PromptRunner};
use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;
use std::sync::Arc;
use trinity_core::analysis::{
    AgentAnalysis, EthicsAnalysis, FrameworkScore, PrincipleScore, RedLineType, RedLineViolation,
};
use trinity_core::extract::{extract_structured, string_list, StructuredShape};
use trinity_core::llm::{LLMCallOutcome, LLMProvider};
use trinity_core::types::{clamp_score, round2};
use trinity_core::{AgentId, AgentResult, AgentStatus, ConceptInput};

/// Risk at or above which the concept goes back for revision
pub const REVISION_RISK: f64 = 70.0;
/// Risk at or above which the agent warns
pub const WARNING_RISK: f64 = 40.0;

/// Points lost per missing framework requirement
const REQUIREMENT_PENALTY: f64 = 15.0;

const SYSTEM_PROMPT: &str = "You are the Ethics reviewer of a product board. \
List concrete ethical and regulatory concerns as JSON: {\"concerns\": [str]}";

struct Framework {
    name: &'static str,
    /// Empty: always applicable
    applies_when: &'static [&'static str],
    requirements: &'static [(&'static str, &'static [&'static str])],
}

const CHILD_TERMS: &[&str] = &["kids", "children", "child", "teens", "teenagers", "minors", "students"];

const FRAMEWORKS: [Framework; 12] = [
    Framework {
        name: "GDPR",
        applies_when: &[],
        requirements: &[
            ("lawful basis and consent", &["consent", "opt-in"]),
            ("data subject rights", &["data export", "delete account", "erasure", "right to be forgotten"]),
            ("data minimisation", &["anonymous", "anonymised", "anonymized", "no personal data", "minimal data"]),
        ],
    },
    Framework {
        name: "CCPA",
        applies_when: &[],
        requirements: &[
            ("opt-out of data sale", &["do not sell", "opt-out", "opt out"]),
            ("privacy notice", &["privacy policy", "privacy notice"]),
        ],
    },
    Framework {
        name: "COPPA",
        applies_when: CHILD_TERMS,
        requirements: &[
            ("verifiable parental consent", &["parental consent", "parent approval", "parents approve"]),
            ("no behavioural advertising", &["no ads", "ad-free"]),
        ],
    },
    Framework {
        name: "HIPAA",
        applies_when: &["health", "medical", "patient", "patients", "clinic", "clinics", "therapy"],
        requirements: &[
            ("encryption of health data", &["encrypted", "encryption"]),
            ("access controls", &["access control", "role-based", "audit"]),
        ],
    },
    Framework {
        name: "PCI-DSS",
        applies_when: &["payment", "payments", "card", "cards", "checkout", "billing", "wallet"],
        requirements: &[
            ("tokenised card handling", &["stripe", "tokenized", "tokenised", "payment processor"]),
            ("no raw card storage", &["no card data", "never store"]),
        ],
    },
    Framework {
        name: "SOC 2",
        applies_when: &[],
        requirements: &[
            ("audit logging", &["audit", "logging"]),
            ("access controls", &["access control", "role-based", "permissions"]),
        ],
    },
    Framework {
        name: "ISO 27001",
        applies_when: &[],
        requirements: &[
            ("encryption", &["encrypted", "encryption", "tls"]),
            ("incident response", &["incident", "backup", "backups"]),
        ],
    },
    Framework {
        name: "EU AI Act",
        applies_when: &["ai", "machine learning", "model", "algorithm", "recommendations", "recommendation"],
        requirements: &[
            ("transparency of automated decisions", &["explainable", "transparency", "transparent"]),
            ("human oversight", &["human review", "human oversight", "moderator", "moderators"]),
        ],
    },
    Framework {
        name: "WCAG",
        applies_when: &[],
        requirements: &[("accessible interface", &["accessible", "accessibility", "screen reader"])],
    },
    Framework {
        name: "ePrivacy",
        applies_when: &["tracking", "cookies", "analytics", "location", "notifications"],
        requirements: &[("tracking consent", &["cookie consent", "consent"])],
    },
    Framework {
        name: "Age Appropriate Design Code",
        applies_when: CHILD_TERMS,
        requirements: &[
            ("high-privacy defaults", &["privacy by default", "private by default"]),
            ("no nudge techniques", &["no streaks", "no notifications", "break reminders"]),
        ],
    },
    Framework {
        name: "Digital Services Act",
        applies_when: &["marketplace", "social", "community", "user-generated", "posts", "forum", "platform"],
        requirements: &[
            ("notice and action", &["report", "reporting", "moderation"]),
            ("transparent recommender", &["chronological", "transparent"]),
        ],
    },
];

/// (principle, evidence, harm)
type Principle = (&'static str, &'static [&'static str], &'static [&'static str]);

const CHILD_PRINCIPLES: [Principle; 7] = [
    ("Age-appropriate content", &["age-appropriate", "curated", "educational"], &["mature", "violent"]),
    ("Parental controls", &["parental controls", "parents", "parent dashboard"], &[]),
    (
        "No manipulative monetisation",
        &["no in-app purchases", "no purchases"],
        &["loot box", "in-app purchases", "rewards", "coins", "gems"],
    ),
    ("Safe communication", &["no chat", "moderated chat"], &["chat", "messaging", "strangers"]),
    ("Data minimisation for minors", &["no personal data", "anonymous"], &["location", "camera", "contacts"]),
    (
        "Healthy usage limits",
        &["time limits", "screen time", "break reminders"],
        &["infinite scroll", "infinite-scroll", "autoplay", "streaks", "addictive"],
    ),
    ("No targeted advertising", &["no ads", "ad-free"], &["ads", "advertising"]),
];

const HUMANISTIC: [Principle; 4] = [
    (
        "Well-being",
        &["wellbeing", "well-being", "mindful", "break reminders", "healthy"],
        &["addictive", "infinite scroll", "infinite-scroll", "autoplay", "streaks", "compulsive", "fomo"],
    ),
    (
        "Autonomy",
        &["opt-in", "user control", "customizable", "settings"],
        &["dark pattern", "manipulative", "nudges", "hard to cancel"],
    ),
    ("Fairness", &["inclusive", "accessible", "fair"], &["discriminatory", "social scoring", "profiling"]),
    (
        "Transparency",
        &["transparent", "explainable", "open source", "privacy policy"],
        &["hidden fees", "secret", "covert", "covertly"],
    ),
];

lazy_static! {
    static ref RED_LINES: Vec<(RedLineType, Regex)> = vec![
        (
            RedLineType::AddictiveDesign,
            Regex::new(r"(?i)\b(addict\w*|infinite[\s-]?scroll\w*|autoplay\w*|compulsive\w*|endless\s+feed)").unwrap(),
        ),
        (
            RedLineType::ManipulativeDesign,
            Regex::new(r"(?i)\b(dark\s+patterns?|manipulat\w*|confirmshaming|fake\s+(scarcity|urgency|countdown)|hidden\s+(fees|charges|cancellation))").unwrap(),
        ),
        (
            RedLineType::PrivacyViolation,
            Regex::new(r"(?i)\b(sell\w*\s+(user\s+|personal\s+|customer\s+)?data|covert\w*\s+(track|collect|record)\w*|secretly\s+(track|collect|record|monitor)\w*|without\s+(their\s+|user\s+)?(consent|knowledge))").unwrap(),
        ),
        (
            RedLineType::ChildHarm,
            Regex::new(r"(?i)\b(kids|children|minors|child)\b.{0,60}\b(gambling|loot\s*box\w*|targeted\s+ads|contact\s+strangers)|\b(gambling|loot\s*box\w*|targeted\s+ads)\b.{0,60}\b(kids|children|minors)\b").unwrap(),
        ),
    ];
}

/// Lowercased concept text and its word set
struct Lexicon {
    text: String,
    words: HashSet<String>,
}

impl Lexicon {
    fn new(concept: &ConceptInput) -> Self {
        let text = concept.searchable_text();
        let words = words(&text);
        Self { text, words }
    }

    fn any(&self, terms: &[&str]) -> bool {
        mentions_any(&self.text, &self.words, terms)
    }
}

fn mean(scores: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = scores.fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    if count == 0 {
        100.0
    } else {
        round2(sum / count as f64)
    }
}

fn score_frameworks(lexicon: &Lexicon) -> Vec<FrameworkScore> {
    FRAMEWORKS
        .iter()
        .map(|framework| {
            let applicable = framework.applies_when.is_empty() || lexicon.any(framework.applies_when);
            if !applicable {
                return FrameworkScore {
                    framework: framework.name.to_string(),
                    applicable: false,
                    score: 100.0,
                    missing_requirements: Vec::new(),
                };
            }

            let missing: Vec<String> = framework
                .requirements
                .iter()
                .filter(|(_, evidence)| !lexicon.any(evidence))
                .map(|(label, _)| label.to_string())
                .collect();

            FrameworkScore {
                framework: framework.name.to_string(),
                applicable: true,
                score: clamp_score(100.0 - REQUIREMENT_PENALTY * missing.len() as f64),
                missing_requirements: missing,
            }
        })
        .collect()
}

fn score_child_protection(lexicon: &Lexicon) -> Vec<PrincipleScore> {
    let targets_children = lexicon.any(CHILD_TERMS);
    CHILD_PRINCIPLES
        .iter()
        .map(|(principle, evidence, harm)| {
            let score = if !targets_children {
                100.0
            } else {
                let mut score = 60.0;
                if lexicon.any(evidence) {
                    score += 40.0;
                }
                if lexicon.any(harm) {
                    score -= 50.0;
                }
                clamp_score(score)
            };
            PrincipleScore {
                principle: principle.to_string(),
                score,
            }
        })
        .collect()
}

fn score_humanistic(lexicon: &Lexicon) -> Vec<PrincipleScore> {
    HUMANISTIC
        .iter()
        .map(|(principle, evidence, harm)| {
            let mut score = 70.0;
            if lexicon.any(evidence) {
                score += 30.0;
            }
            if lexicon.any(harm) {
                score -= 40.0;
            }
            PrincipleScore {
                principle: principle.to_string(),
                score: clamp_score(score),
            }
        })
        .collect()
}

/// Words that turn a red-line term into its remedy ("fight addiction", "non-manipulative")
const COUNTER_TERMS: &[&str] = &[
    "no", "not", "non", "anti", "never", "without", "free", "fight", "fighting", "combat",
    "combats", "prevent", "prevents", "preventing", "reduce", "reduces", "reducing", "avoid",
    "avoids", "against", "beat", "quit", "overcome", "recover", "recovery",
];

/// True when one of the two words before `start` is a counter term
fn countered(text: &str, start: usize) -> bool {
    text[..start]
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .rev()
        .take(2)
        .any(|w| COUNTER_TERMS.contains(&w.to_lowercase().as_str()))
}

/// Level-1 red lines, at most one entry per type
pub fn detect_red_lines(text: &str) -> Vec<RedLineViolation> {
    RED_LINES
        .iter()
        .filter_map(|(violation_type, regex)| {
            regex
                .find_iter(text)
                .find(|m| !countered(text, m.start()))
                .map(|m| RedLineViolation {
                    violation_type: *violation_type,
                    matched: m.as_str().to_string(),
                })
        })
        .collect()
}

/// `100 - (0.4 * compliance + 0.35 * child + 0.25 * humanistic)`
pub fn ethics_risk(compliance: f64, child_protection: f64, humanistic: f64) -> f64 {
    clamp_score(
        100.0
            - (0.40 * clamp_score(compliance)
                + 0.35 * clamp_score(child_protection)
                + 0.25 * clamp_score(humanistic)),
    )
}

/// Status ladder; red lines win over every score
pub fn ethics_status(risk: f64, red_lines: &[RedLineViolation]) -> AgentStatus {
    if !red_lines.is_empty() {
        AgentStatus::Rejected
    } else if risk >= REVISION_RISK {
        AgentStatus::NeedsRevision
    } else if risk >= WARNING_RISK {
        AgentStatus::Warning
    } else {
        AgentStatus::Approved
    }
}

fn red_line_label(violation_type: RedLineType) -> &'static str {
    match violation_type {
        RedLineType::AddictiveDesign => "addictive design",
        RedLineType::ManipulativeDesign => "manipulative design",
        RedLineType::PrivacyViolation => "privacy violation",
        RedLineType::ChildHarm => "child harm",
    }
}

fn review_notes(shape: Option<StructuredShape>) -> Vec<String> {
    match shape {
        Some(shape) => shape
            .as_json()
            .map(|value| string_list(value, "concerns"))
            .filter(|concerns| !concerns.is_empty())
            .unwrap_or_else(|| shape.items()),
        None => Vec::new(),
    }
}

pub struct EthicsAgent {
    runner: PromptRunner,
}

impl EthicsAgent {
    pub fn new(provider: Arc<dyn LLMProvider>, settings: AgentSettings) -> Self {
        Self {
            runner: PromptRunner::new(provider, settings),
        }
    }

    fn recommendations(analysis: &EthicsAnalysis, notes: Vec<String>) -> Vec<String> {
        let mut out: Vec<String> = analysis
            .red_line_violations
            .iter()
            .map(|v| format!("Remove the {} element (\"{}\")", red_line_label(v.violation_type), v.matched))
            .collect();

        out.extend(
            analysis
                .frameworks
                .iter()
                .filter(|f| !f.missing_requirements.is_empty())
                .map(|f| format!("{}: add {}", f.framework, f.missing_requirements.join(", "))),
        );
        out.extend(
            analysis
                .child_protection
                .iter()
                .chain(analysis.humanistic.iter())
                .filter(|p| p.score < 60.0)
                .map(|p| format!("Strengthen {} ({:.0}/100)", p.principle, p.score)),
        );
        out.extend(notes.into_iter().take(3).map(|note| format!("Reviewer: {}", note)));
        out
    }
}

#[async_trait]
impl Agent for EthicsAgent {
    fn id(&self) -> AgentId {
        AgentId::Ethics
    }

    async fn analyze(&self, concept: &ConceptInput) -> AgentResult {
        let lexicon = Lexicon::new(concept);
        let prompt = format!("Concept: {}", concept.description());

        let (frameworks, child_protection, humanistic, review) = tokio::join!(
            async { score_frameworks(&lexicon) },
            async { score_child_protection(&lexicon) },
            async { score_humanistic(&lexicon) },
            self.runner.ask(SYSTEM_PROMPT, prompt),
        );
        let red_line_violations = detect_red_lines(concept.description());

        let (notes, review_state) = match review {
            LLMCallOutcome::Success { text, .. } => (review_notes(extract_structured(&text)), "completed"),
            LLMCallOutcome::Failure(failure) => {
                if red_line_violations.is_empty() {
                    let result = AgentResult::degraded(AgentId::Ethics, failure.to_string());
                    self.runner.audit(concept, &result);
                    return result;
                }
                tracing::warn!("Ethics review unavailable, red lines still apply: {}", failure);
                (Vec::new(), "failed")
            }
        };

        let compliance_score = mean(frameworks.iter().map(|f| f.score));
        let child_protection_score = mean(child_protection.iter().map(|p| p.score));
        let humanistic_score = mean(humanistic.iter().map(|p| p.score));

        let status = ethics_status(
            ethics_risk(compliance_score, child_protection_score, humanistic_score),
            &red_line_violations,
        );
        let risk = if status == AgentStatus::Rejected {
            100.0
        } else {
            ethics_risk(compliance_score, child_protection_score, humanistic_score)
        };

        let analysis = EthicsAnalysis {
            frameworks,
            compliance_score,
            child_protection,
            child_protection_score,
            humanistic,
            humanistic_score,
            red_line_violations,
        };

        if !analysis.red_line_violations.is_empty() {
            tracing::warn!(
                concept_id = %concept.id(),
                violations = analysis.red_line_violations.len(),
                "Red line crossed, concept rejected"
            );
        }

        let recommendations = Self::recommendations(&analysis, notes);
        let result = AgentResult::new(
            AgentId::Ethics,
            status,
            AgentAnalysis::Ethics(analysis),
            recommendations,
            risk,
        )
        .with_metadata("llm_review", review_state.into());

        self.runner.audit(concept, &result);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{OfflineProvider, ScriptedProvider};
    use proptest::prelude::*;
    use trinity_core::llm::LLMFailureKind;

    fn concept(description: &str) -> ConceptInput {
        ConceptInput::new(description).unwrap()
    }

    fn offline() -> EthicsAgent {
        EthicsAgent::new(Arc::new(OfflineProvider::new()), AgentSettings::default())
    }

    fn analysis(result: &AgentResult) -> &EthicsAnalysis {
        match &result.analysis {
            AgentAnalysis::Ethics(a) => a,
            other => panic!("unexpected analysis {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_addictive_kids_app_is_rejected() {
        let result = offline()
            .analyze(&concept("Addictive infinite-scroll app with autoplay and daily rewards for kids"))
            .await;

        assert_eq!(result.status, AgentStatus::Rejected);
        assert_eq!(result.risk_score, 100.0);
        let analysis = analysis(&result);
        assert!(!analysis.red_line_violations.is_empty());
        assert_eq!(analysis.red_line_violations[0].violation_type, RedLineType::AddictiveDesign);
        assert!(result.recommendations[0].contains("addictive design"));
    }

    #[tokio::test]
    async fn test_plain_concept_is_approved() {
        let result = offline().analyze(&concept("A shared grocery list app for families")).await;
        let analysis = analysis(&result);

        assert_eq!(analysis.frameworks.len(), 12);
        assert_eq!(analysis.child_protection.len(), 7);
        assert_eq!(analysis.humanistic.len(), 4);
        assert!(analysis.red_line_violations.is_empty());
        // always-on frameworks score 55, 70, 70, 70, 85; the other seven are inapplicable
        assert_eq!(analysis.compliance_score, 87.5);
        assert_eq!(analysis.child_protection_score, 100.0);
        assert_eq!(analysis.humanistic_score, 70.0);
        assert_eq!(result.status, AgentStatus::Approved);
        assert_eq!(result.risk_score, 12.5);
    }

    #[tokio::test]
    async fn test_payment_framework_gated_on_keywords() {
        let without = score_frameworks(&Lexicon::new(&concept("A shared grocery list app")));
        let pci = without.iter().find(|f| f.framework == "PCI-DSS").unwrap();
        assert!(!pci.applicable);
        assert_eq!(pci.score, 100.0);

        let with = score_frameworks(&Lexicon::new(&concept("Grocery app with card checkout")));
        let pci = with.iter().find(|f| f.framework == "PCI-DSS").unwrap();
        assert!(pci.applicable);
        assert_eq!(pci.missing_requirements.len(), 2);
    }

    #[tokio::test]
    async fn test_review_failure_degrades_without_red_lines() {
        let agent = EthicsAgent::new(
            Arc::new(ScriptedProvider::failing(LLMFailureKind::RateLimit)),
            AgentSettings::default(),
        );
        let result = agent.analyze(&concept("A shared grocery list app")).await;

        assert_eq!(result.status, AgentStatus::Error);
        assert_eq!(result.risk_score, 100.0);
    }

    #[tokio::test]
    async fn test_review_failure_keeps_red_line_rejection() {
        let agent = EthicsAgent::new(
            Arc::new(ScriptedProvider::failing(LLMFailureKind::Timeout)),
            AgentSettings::default(),
        );
        let result = agent.analyze(&concept("App that secretly tracks employees' location")).await;

        assert_eq!(result.status, AgentStatus::Rejected);
        assert_eq!(result.metadata["llm_review"], "failed");
    }

    #[tokio::test]
    async fn test_review_concerns_become_recommendations() {
        let agent = EthicsAgent::new(
            Arc::new(ScriptedProvider::always(r#"{"concerns": ["Shared lists expose household habits"]}"#)),
            AgentSettings::default(),
        );
        let result = agent.analyze(&concept("A shared grocery list app")).await;

        assert!(result
            .recommendations
            .iter()
            .any(|r| r == "Reviewer: Shared lists expose household habits"));
    }

    #[test]
    fn test_remedial_wording_is_not_a_red_line() {
        assert!(detect_red_lines("Helps teens fight phone addiction with screen-time goals").is_empty());
        assert!(detect_red_lines("Non-manipulative subscription flow with one-click cancel").is_empty());
        assert!(detect_red_lines("Reading app that never sells user data").is_empty());

        // a later, unqualified mention still counts
        let mixed = detect_red_lines("No autoplay on the home screen, but an addictive endless feed");
        assert_eq!(mixed.len(), 1);
        assert_eq!(mixed[0].matched, "addictive");
    }

    #[tokio::test]
    async fn test_wellbeing_concept_is_not_rejected() {
        let result = offline()
            .analyze(&concept("Helps teens fight phone addiction with screen-time goals"))
            .await;

        assert_ne!(result.status, AgentStatus::Rejected);
        assert!(analysis(&result).red_line_violations.is_empty());
    }

    #[test]
    fn test_status_ladder() {
        assert_eq!(ethics_status(75.0, &[]), AgentStatus::NeedsRevision);
        assert_eq!(ethics_status(70.0, &[]), AgentStatus::NeedsRevision);
        assert_eq!(ethics_status(50.0, &[]), AgentStatus::Warning);
        assert_eq!(ethics_status(39.9, &[]), AgentStatus::Approved);
    }

    proptest! {
        #[test]
        fn prop_red_lines_always_reject(
            risk in 0.0f64..=100.0,
            prefix in "[a-z ]{0,20}",
            trigger in prop::sample::select(vec!["infinite scroll", "autoplay", "dark patterns", "sell user data"]),
        ) {
            let text = format!("{} app with {} feature", prefix, trigger);
            let violations = detect_red_lines(&text);
            prop_assert!(!violations.is_empty());
            prop_assert_eq!(ethics_status(risk, &violations), AgentStatus::Rejected);
        }

        #[test]
        fn prop_risk_bounded(c in -500.0f64..500.0, k in -500.0f64..500.0, h in -500.0f64..500.0) {
            let risk = ethics_risk(c, k, h);
            prop_assert!((0.0..=100.0).contains(&risk));
        }
    }
}
