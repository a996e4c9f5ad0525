//! Innovation agent ("X")
//!
//! Five sequential stages, each one LLM call seeded by the previous stage:
//!
//! ```text
//! context -> scrutiny -> challenge -> strategic options -> roadmap
//! ```
//!
//! A stage whose reply cannot be read as the expected structure is rebuilt
//! from heuristics; no single stage can sink the pipeline. Only when every
//! call fails outright does the agent report a degraded result.

use super::{mentions, mentions_any, summarize, words, Agent, AgentSettings, PromptRunner};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use trinity_core::analysis::{
    AgentAnalysis, Challenge, InnovationAnalysis, MarketContext, RiskBreakdown, RoadmapPhase,
    Scrutiny, StageSource, StrategicOption,
};
use trinity_core::extract::{extract_structured, number, string_list, StructuredShape};
use trinity_core::llm::{LLMCallOutcome, LLMProvider, TokenUsage};
use trinity_core::types::{clamp_score, round2};
use trinity_core::{AgentId, AgentResult, AgentStatus, ConceptInput};

/// Risk combiner weights: technical, market, execution, competitive
pub const RISK_WEIGHTS: [f64; 4] = [0.30, 0.30, 0.25, 0.15];

/// Risk at or above which the agent flags a warning
pub const WARNING_RISK: f64 = 70.0;

const SYSTEM_PROMPT: &str = "You are the Innovation reviewer of a product board. \
Answer with a single JSON object and nothing else.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Context,
    Scrutiny,
    Challenge,
    Options,
    Roadmap,
}

impl Stage {
    const ALL: [Stage; 5] = [
        Stage::Context,
        Stage::Scrutiny,
        Stage::Challenge,
        Stage::Options,
        Stage::Roadmap,
    ];

    fn name(self) -> &'static str {
        match self {
            Stage::Context => "context",
            Stage::Scrutiny => "scrutiny",
            Stage::Challenge => "challenge",
            Stage::Options => "options",
            Stage::Roadmap => "roadmap",
        }
    }

    fn instructions(self) -> &'static str {
        match self {
            Stage::Context => {
                r#"Describe the market context: {"summary": str, "target_users": [str], "assumptions": [str]}"#
            }
            Stage::Scrutiny => {
                r#"Score risks 0-100: {"risks": {"technical": n, "market": n, "execution": n, "competitive": n}, "strengths": [str], "weaknesses": [str]}"#
            }
            Stage::Challenge => {
                r#"Play devil's advocate: {"questions": [str], "counterarguments": [str]}"#
            }
            Stage::Options => {
                r#"Propose 3-5 strategic options: {"options": [{"title": str, "rationale": str, "score": 0-10}]}"#
            }
            Stage::Roadmap => {
                r#"Lay out a phased roadmap: {"phases": [{"name": str, "duration_weeks": n, "milestones": [str]}]}"#
            }
        }
    }

    fn prompt(self, concept: &ConceptInput, seed: &str) -> String {
        let mut prompt = format!("Concept: {}\n", concept.description());
        if let Some(category) = concept.category() {
            prompt.push_str(&format!("Category: {}\n", category));
        }
        if !seed.is_empty() {
            prompt.push_str(&format!("Previous findings: {}\n", seed));
        }
        prompt.push_str(self.instructions());
        prompt
    }
}

/// Call bookkeeping across the five stages
#[derive(Debug, Default)]
struct Tally {
    failures: usize,
    last_failure: Option<String>,
    usage: TokenUsage,
}

/// Lowercased concept text with its word set
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

    fn has(&self, term: &str) -> bool {
        mentions(&self.text, &self.words, term)
    }

    fn any(&self, terms: &[&str]) -> bool {
        mentions_any(&self.text, &self.words, terms)
    }

    /// `base` adjusted by every matching `(term, delta)`, clamped
    fn adjusted(&self, base: f64, adjustments: &[(&str, f64)]) -> f64 {
        let total = adjustments
            .iter()
            .filter(|(term, _)| self.has(term))
            .map(|(_, delta)| delta)
            .sum::<f64>();
        clamp_score(base + total)
    }
}

pub struct InnovationAgent {
    runner: PromptRunner,
}

impl InnovationAgent {
    pub fn new(provider: Arc<dyn LLMProvider>, settings: AgentSettings) -> Self {
        Self {
            runner: PromptRunner::new(provider, settings),
        }
    }

    async fn consult(
        &self,
        stage: Stage,
        concept: &ConceptInput,
        seed: &str,
        tally: &mut Tally,
    ) -> Option<StructuredShape> {
        match self.runner.ask(SYSTEM_PROMPT, stage.prompt(concept, seed)).await {
            LLMCallOutcome::Success { text, usage } => {
                tally.usage += usage;
                extract_structured(&text)
            }
            LLMCallOutcome::Failure(failure) => {
                tracing::warn!(stage = stage.name(), "Innovation stage fell back to heuristics: {}", failure);
                tally.failures += 1;
                tally.last_failure = Some(failure.to_string());
                None
            }
        }
    }

    async fn run_pipeline(&self, concept: &ConceptInput) -> (Option<InnovationAnalysis>, Tally) {
        let lexicon = Lexicon::new(concept);
        let mut tally = Tally::default();

        let shape = self.consult(Stage::Context, concept, "", &mut tally).await;
        let context = context_stage(shape.as_ref(), concept, &lexicon);

        let shape = self.consult(Stage::Scrutiny, concept, &context.summary, &mut tally).await;
        let scrutiny = scrutiny_stage(shape.as_ref(), concept, &lexicon);

        let seed = format!(
            "risks technical {:.0}, market {:.0}, execution {:.0}, competitive {:.0}",
            scrutiny.risks.technical, scrutiny.risks.market, scrutiny.risks.execution, scrutiny.risks.competitive
        );
        let shape = self.consult(Stage::Challenge, concept, &seed, &mut tally).await;
        let challenge = challenge_stage(shape.as_ref(), concept, &scrutiny);

        let seed = challenge.questions.join(" / ");
        let shape = self.consult(Stage::Options, concept, &seed, &mut tally).await;
        let risk = combined_risk(&scrutiny.risks);
        let options = options_stage(shape.as_ref(), risk);

        let seed = options.first().map(|o| o.title.clone()).unwrap_or_default();
        let shape = self.consult(Stage::Roadmap, concept, &seed, &mut tally).await;
        let roadmap = roadmap_stage(shape.as_ref(), &options);

        if tally.failures == Stage::ALL.len() {
            return (None, tally);
        }

        let best_option = options.first().map(|o| o.score).unwrap_or(0.0);
        let innovation_score = round2((((100.0 - risk) / 10.0) * 0.5 + best_option * 0.5).clamp(0.0, 10.0));

        (
            Some(InnovationAnalysis {
                context,
                scrutiny,
                challenge,
                options,
                roadmap,
                innovation_score,
            }),
            tally,
        )
    }
}

#[async_trait]
impl Agent for InnovationAgent {
    fn id(&self) -> AgentId {
        AgentId::Innovation
    }

    async fn analyze(&self, concept: &ConceptInput) -> AgentResult {
        let (analysis, tally) = self.run_pipeline(concept).await;

        let result = match analysis {
            None => AgentResult::degraded(
                AgentId::Innovation,
                tally
                    .last_failure
                    .unwrap_or_else(|| "all pipeline stages failed".to_string()),
            ),
            Some(analysis) => {
                let risk = combined_risk(&analysis.scrutiny.risks);
                let status = if risk >= WARNING_RISK {
                    AgentStatus::Warning
                } else {
                    AgentStatus::Success
                };
                let recommendations = recommendations(&analysis);
                let heuristic_stages = analysis.heuristic_stage_count();

                AgentResult::new(
                    AgentId::Innovation,
                    status,
                    AgentAnalysis::Innovation(analysis),
                    recommendations,
                    risk,
                )
                .with_metadata("heuristic_stages", heuristic_stages.into())
                .with_metadata("llm_failures", tally.failures.into())
                .with_metadata("total_tokens", tally.usage.total_tokens.into())
            }
        };

        self.runner.audit(concept, &result);
        result
    }
}

/// Clamped weighted combination of the four sub-scores
pub fn combined_risk(risks: &RiskBreakdown) -> f64 {
    let [technical, market, execution, competitive] = RISK_WEIGHTS;
    clamp_score(
        clamp_score(risks.technical) * technical
            + clamp_score(risks.market) * market
            + clamp_score(risks.execution) * execution
            + clamp_score(risks.competitive) * competitive,
    )
}

fn recommendations(analysis: &InnovationAnalysis) -> Vec<String> {
    let mut out = Vec::new();

    if let Some(best) = analysis.options.first() {
        out.push(format!("Pursue \"{}\" first ({:.1}/10)", best.title, best.score));
    }

    let risks = &analysis.scrutiny.risks;
    let mut dimensions = [
        ("technical", risks.technical),
        ("market", risks.market),
        ("execution", risks.execution),
        ("competitive", risks.competitive),
    ];
    dimensions.sort_by(|a, b| b.1.total_cmp(&a.1));
    for (name, score) in dimensions.iter().filter(|(_, s)| *s >= 60.0) {
        out.push(format!("Reduce {} risk ({:.0}/100) before committing budget", name, score));
    }

    if let Some(question) = analysis.challenge.questions.first() {
        out.push(format!("Answer before building: {}", question));
    }

    if let Some(phase) = analysis.roadmap.first() {
        out.push(format!("Start with {} ({} weeks)", phase.name, phase.duration_weeks));
    }

    out
}

// ---------------------------------------------------------------------------
// Stages
// ---------------------------------------------------------------------------

fn heuristic_items(shape: Option<&StructuredShape>) -> Vec<String> {
    match shape {
        Some(StructuredShape::Heuristic { items, .. }) => items.clone(),
        _ => Vec::new(),
    }
}

fn context_stage(shape: Option<&StructuredShape>, concept: &ConceptInput, lexicon: &Lexicon) -> MarketContext {
    if let Some(json) = shape.and_then(StructuredShape::as_json) {
        let summary = json.get("summary").and_then(Value::as_str).map(str::to_string);
        let target_users = string_list(json, "target_users");
        if summary.is_some() || !target_users.is_empty() {
            return MarketContext {
                summary: summary.unwrap_or_else(|| summarize(concept.description(), 160)),
                target_users,
                assumptions: string_list(json, "assumptions"),
                source: StageSource::Llm,
            };
        }
    }

    let mut target_users = Vec::new();
    if lexicon.any(&["kids", "children", "child", "teens", "minors"]) {
        target_users.push("Children and their parents".to_string());
    }
    if lexicon.any(&["students", "school", "university"]) {
        target_users.push("Students".to_string());
    }
    if lexicon.any(&["team", "teams", "b2b", "enterprise", "business", "companies"]) {
        target_users.push("Business teams".to_string());
    }
    if target_users.is_empty() {
        target_users.push("Early-adopter consumers".to_string());
    }

    let mut assumptions = vec![
        "Target users feel the problem often enough to switch tools".to_string(),
        "The core experience can ship without heavy integrations".to_string(),
    ];
    assumptions.extend(heuristic_items(shape).into_iter().take(3));

    MarketContext {
        summary: summarize(concept.description(), 160),
        target_users,
        assumptions,
        source: StageSource::Heuristic,
    }
}

fn heuristic_risks(concept: &ConceptInput, lexicon: &Lexicon) -> RiskBreakdown {
    let technical = lexicon.adjusted(
        40.0,
        &[
            ("ai", 15.0),
            ("machine learning", 15.0),
            ("blockchain", 20.0),
            ("real-time", 10.0),
            ("hardware", 15.0),
            ("iot", 15.0),
            ("vr", 15.0),
            ("video", 10.0),
            ("simple", -10.0),
            ("list", -5.0),
        ],
    );
    let market = lexicon.adjusted(
        45.0,
        &[
            ("niche", 10.0),
            ("free", 10.0),
            ("b2b", -10.0),
            ("enterprise", -10.0),
            ("subscription", -5.0),
            ("saas", -5.0),
        ],
    );
    let vague = if concept.description().chars().count() < 40 { 10.0 } else { 0.0 };
    let execution = lexicon.adjusted(
        40.0 + vague,
        &[
            ("marketplace", 15.0),
            ("platform", 10.0),
            ("global", 15.0),
            ("two-sided", 15.0),
            ("health", 15.0),
            ("payments", 10.0),
            ("payment", 10.0),
            ("regulated", 15.0),
        ],
    );
    let competitive = lexicon.adjusted(
        45.0,
        &[
            ("social", 15.0),
            ("grocery", 15.0),
            ("todo", 15.0),
            ("to-do", 15.0),
            ("dating", 15.0),
            ("chat", 10.0),
            ("delivery", 10.0),
            ("patent", -10.0),
            ("unique", -5.0),
        ],
    );

    RiskBreakdown {
        technical,
        market,
        execution,
        competitive,
    }
}

fn scrutiny_stage(shape: Option<&StructuredShape>, concept: &ConceptInput, lexicon: &Lexicon) -> Scrutiny {
    let fallback = heuristic_risks(concept, lexicon);

    if let Some(json) = shape.and_then(StructuredShape::as_json) {
        let risks = json.get("risks").unwrap_or(json);
        let read = |key: &str| number(risks, key).or_else(|| number(risks, &format!("{}_risk", key)));
        let parsed = [read("technical"), read("market"), read("execution"), read("competitive")];

        if parsed.iter().any(Option::is_some) {
            return Scrutiny {
                risks: RiskBreakdown {
                    technical: clamp_score(parsed[0].unwrap_or(fallback.technical)),
                    market: clamp_score(parsed[1].unwrap_or(fallback.market)),
                    execution: clamp_score(parsed[2].unwrap_or(fallback.execution)),
                    competitive: clamp_score(parsed[3].unwrap_or(fallback.competitive)),
                },
                strengths: string_list(json, "strengths"),
                weaknesses: string_list(json, "weaknesses"),
                source: StageSource::Llm,
            };
        }
    }

    let mut strengths = Vec::new();
    if concept.description().chars().count() >= 40 {
        strengths.push("Concept is described concretely".to_string());
    }
    if lexicon.any(&["b2b", "enterprise", "subscription", "saas"]) {
        strengths.push("Recurring revenue model".to_string());
    }

    let weaknesses = [
        ("technical", fallback.technical),
        ("market", fallback.market),
        ("execution", fallback.execution),
        ("competitive", fallback.competitive),
    ]
    .iter()
    .filter(|(_, score)| *score >= 60.0)
    .map(|(name, score)| format!("Elevated {} risk ({:.0}/100)", name, score))
    .collect();

    Scrutiny {
        risks: fallback,
        strengths,
        weaknesses,
        source: StageSource::Heuristic,
    }
}

fn challenge_stage(shape: Option<&StructuredShape>, concept: &ConceptInput, scrutiny: &Scrutiny) -> Challenge {
    if let Some(json) = shape.and_then(StructuredShape::as_json) {
        let questions = string_list(json, "questions");
        if !questions.is_empty() {
            return Challenge {
                questions,
                counterarguments: string_list(json, "counterarguments"),
                source: StageSource::Llm,
            };
        }
    }

    let mined = heuristic_items(shape);
    let questions = if mined.is_empty() {
        vec![
            format!("Who pays for \"{}\", and why now?", summarize(concept.description(), 60)),
            "What would make an existing tool good enough instead?".to_string(),
            "Which assumption, if wrong, ends the project?".to_string(),
        ]
    } else {
        mined
    };

    let counterarguments = scrutiny
        .weaknesses
        .iter()
        .map(|w| format!("{} may outweigh the upside", w))
        .collect();

    Challenge {
        questions,
        counterarguments,
        source: StageSource::Heuristic,
    }
}

fn rank(mut options: Vec<StrategicOption>) -> Vec<StrategicOption> {
    options.sort_by(|a, b| b.score.total_cmp(&a.score));
    options.truncate(5);
    for (idx, option) in options.iter_mut().enumerate() {
        option.rank = idx as u8 + 1;
    }
    options
}

fn options_stage(shape: Option<&StructuredShape>, risk: f64) -> Vec<StrategicOption> {
    if let Some(json) = shape.and_then(StructuredShape::as_json) {
        let entries = json
            .get("options")
            .and_then(Value::as_array)
            .or_else(|| json.as_array())
            .cloned()
            .unwrap_or_default();
        let parsed: Vec<StrategicOption> = entries
            .iter()
            .filter_map(|entry| {
                let title = entry.get("title").and_then(Value::as_str)?;
                Some(StrategicOption {
                    rank: 0,
                    title: title.to_string(),
                    rationale: entry
                        .get("rationale")
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_string(),
                    score: round2(number(entry, "score").unwrap_or(5.0).clamp(0.0, 10.0)),
                    source: StageSource::Llm,
                })
            })
            .collect();
        if parsed.len() >= 3 {
            return rank(parsed);
        }
    }

    let headroom = (100.0 - risk) / 10.0;
    let mined = heuristic_items(shape);
    let options = if mined.len() >= 3 {
        mined
            .into_iter()
            .enumerate()
            .map(|(idx, title)| StrategicOption {
                rank: 0,
                title,
                rationale: "Mined from the reviewer's notes".to_string(),
                score: round2((headroom - idx as f64 * 0.5).clamp(0.0, 10.0)),
                source: StageSource::Heuristic,
            })
            .collect()
    } else {
        [
            ("Focused MVP for one segment", "Smallest build that tests the riskiest assumption", 1.0),
            ("Partnership-led launch", "Borrow distribution from an established player", 0.0),
            ("Platform play", "Open the product to third parties once usage is proven", -1.5),
        ]
        .iter()
        .map(|(title, rationale, bias)| StrategicOption {
            rank: 0,
            title: title.to_string(),
            rationale: rationale.to_string(),
            score: round2((headroom + bias).clamp(0.0, 10.0)),
            source: StageSource::Heuristic,
        })
        .collect()
    };
    rank(options)
}

fn roadmap_stage(shape: Option<&StructuredShape>, options: &[StrategicOption]) -> Vec<RoadmapPhase> {
    if let Some(json) = shape.and_then(StructuredShape::as_json) {
        let entries = json
            .get("phases")
            .and_then(Value::as_array)
            .or_else(|| json.as_array())
            .cloned()
            .unwrap_or_default();
        let phases: Vec<RoadmapPhase> = entries
            .iter()
            .enumerate()
            .filter_map(|(idx, entry)| {
                let name = entry.get("name").and_then(Value::as_str)?;
                Some(RoadmapPhase {
                    phase: idx as u8 + 1,
                    name: name.to_string(),
                    duration_weeks: number(entry, "duration_weeks").unwrap_or(4.0).max(1.0) as u32,
                    milestones: string_list(entry, "milestones"),
                    source: StageSource::Llm,
                })
            })
            .collect();
        if !phases.is_empty() {
            return phases;
        }
    }

    let mined = heuristic_items(shape);
    if !mined.is_empty() {
        return mined
            .into_iter()
            .take(5)
            .enumerate()
            .map(|(idx, name)| RoadmapPhase {
                phase: idx as u8 + 1,
                name,
                duration_weeks: 4,
                milestones: Vec::new(),
                source: StageSource::Heuristic,
            })
            .collect();
    }

    let focus = options
        .first()
        .map(|o| o.title.clone())
        .unwrap_or_else(|| "core experience".to_string());
    [
        ("Discovery", 4, vec!["Interview 20 target users".to_string(), "Validate pricing".to_string()]),
        ("MVP", 8, vec![format!("Ship: {}", focus), "Instrument activation".to_string()]),
        ("Launch", 6, vec!["Public release".to_string(), "Retention review".to_string()]),
    ]
    .into_iter()
    .enumerate()
    .map(|(idx, (name, weeks, milestones))| RoadmapPhase {
        phase: idx as u8 + 1,
        name: name.to_string(),
        duration_weeks: weeks,
        milestones,
        source: StageSource::Heuristic,
    })
    .collect()
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

    fn agent(provider: impl LLMProvider + 'static) -> InnovationAgent {
        InnovationAgent::new(Arc::new(provider), AgentSettings::default())
    }

    fn analysis(result: &AgentResult) -> &InnovationAnalysis {
        match &result.analysis {
            AgentAnalysis::Innovation(a) => a,
            other => panic!("unexpected analysis {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_structured_pipeline() {
        let provider = ScriptedProvider::new(
            vec![
                LLMCallOutcome::success(r#"{"summary": "B2B scheduling", "target_users": ["clinics"], "assumptions": []}"#),
                LLMCallOutcome::success("```json\n{\"risks\": {\"technical\": 20, \"market\": 30, \"execution\": 40, \"competitive\": 50}, \"strengths\": [\"niche\"], \"weaknesses\": []}\n```"),
                LLMCallOutcome::success(r#"{"questions": ["Why clinics?"], "counterarguments": []}"#),
                LLMCallOutcome::success(r#"{"options": [{"title": "A", "score": 6}, {"title": "B", "score": 9}, {"title": "C", "score": 3}]}"#),
                LLMCallOutcome::success(r#"{"phases": [{"name": "Pilot", "duration_weeks": 6, "milestones": ["3 clinics"]}]}"#),
            ],
            LLMCallOutcome::failure(LLMFailureKind::Unavailable, "script ended"),
        );
        let result = agent(provider).analyze(&concept("Appointment scheduling for small clinics")).await;

        // 20*0.3 + 30*0.3 + 40*0.25 + 50*0.15
        assert_eq!(result.risk_score, 32.5);
        assert_eq!(result.status, AgentStatus::Success);

        let analysis = analysis(&result);
        assert_eq!(analysis.heuristic_stage_count(), 0);
        assert_eq!(analysis.options[0].title, "B");
        assert_eq!(analysis.options[0].rank, 1);
        assert_eq!(analysis.roadmap[0].duration_weeks, 6);
        assert!(result.recommendations[0].contains("\"B\""));
    }

    #[tokio::test]
    async fn test_offline_runs_on_heuristics() {
        let result = agent(OfflineProvider::new())
            .analyze(&concept("A shared grocery list app for families"))
            .await;

        assert_ne!(result.status, AgentStatus::Error);
        let analysis = analysis(&result);
        assert_eq!(analysis.heuristic_stage_count(), 5);
        assert!((3..=5).contains(&analysis.options.len()));
        assert_eq!(analysis.roadmap.len(), 3);
        assert!(analysis.scrutiny.risks.competitive > 45.0);
    }

    #[tokio::test]
    async fn test_single_stage_failure_is_not_fatal() {
        let provider = ScriptedProvider::new(
            vec![LLMCallOutcome::failure(LLMFailureKind::Timeout, "slow")],
            LLMCallOutcome::success(OfflineProvider::REPLY),
        );
        let result = agent(provider).analyze(&concept("Marketplace for used lab equipment")).await;

        assert_ne!(result.status, AgentStatus::Error);
        assert_eq!(result.metadata["llm_failures"], 1);
    }

    #[tokio::test]
    async fn test_all_stages_failing_degrades() {
        let provider = ScriptedProvider::failing(LLMFailureKind::Auth);
        let result = agent(provider).analyze(&concept("Marketplace for used lab equipment")).await;

        assert_eq!(result.status, AgentStatus::Error);
        assert_eq!(result.risk_score, 100.0);
        assert_eq!(result.recommendations.len(), 1);
        assert!(matches!(result.analysis, AgentAnalysis::Degraded { .. }));
    }

    #[tokio::test]
    async fn test_stages_seed_each_other() {
        let provider = Arc::new(ScriptedProvider::always(OfflineProvider::REPLY));
        let agent = InnovationAgent::new(provider.clone(), AgentSettings::default());
        agent.analyze(&concept("Tutoring marketplace for students")).await;

        let requests = provider.requests();
        assert_eq!(requests.len(), 5);
        assert!(!requests[0].messages[1].content.contains("Previous findings"));
        assert!(requests[2].messages[1].content.contains("risks technical"));
    }

    proptest! {
        #[test]
        fn prop_combined_risk_bounded(
            technical in -1e6f64..1e6,
            market in -1e6f64..1e6,
            execution in -1e6f64..1e6,
            competitive in -1e6f64..1e6,
        ) {
            let risk = combined_risk(&RiskBreakdown { technical, market, execution, competitive });
            prop_assert!((0.0..=100.0).contains(&risk));
        }
    }
}
