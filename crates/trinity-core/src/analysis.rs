//! Agent-specific analysis payloads carried inside [`crate::AgentResult`]

use crate::security::{Threat, ThreatLevel};
use serde::{Deserialize, Serialize};

/// Structured analysis payload; one shape per agent
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum AgentAnalysis {
    Innovation(InnovationAnalysis),
    Ethics(EthicsAnalysis),
    Security(SecurityAnalysis),
    /// The agent could not run; carries the failure description
    Degraded { error: String },
}

/// Where a pipeline stage's content came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageSource {
    /// Parsed from the LLM's structured response
    Llm,
    /// Derived from text mining or keyword heuristics
    Heuristic,
}

// ---------------------------------------------------------------------------
// Innovation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InnovationAnalysis {
    pub context: MarketContext,
    pub scrutiny: Scrutiny,
    pub challenge: Challenge,
    /// 3-5 strategic options, ranked best first
    pub options: Vec<StrategicOption>,
    pub roadmap: Vec<RoadmapPhase>,
    /// Innovation quality score in [0, 10]
    pub innovation_score: f64,
}

impl InnovationAnalysis {
    /// Number of stages that fell back to heuristics
    pub fn heuristic_stage_count(&self) -> usize {
        [
            self.context.source,
            self.scrutiny.source,
            self.challenge.source,
            self.options.first().map(|o| o.source).unwrap_or(StageSource::Heuristic),
            self.roadmap.first().map(|p| p.source).unwrap_or(StageSource::Heuristic),
        ]
        .iter()
        .filter(|s| **s == StageSource::Heuristic)
        .count()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketContext {
    pub summary: String,
    pub target_users: Vec<String>,
    pub assumptions: Vec<String>,
    pub source: StageSource,
}

/// Risk sub-scores, each in [0, 100]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskBreakdown {
    pub technical: f64,
    pub market: f64,
    pub execution: f64,
    pub competitive: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scrutiny {
    pub risks: RiskBreakdown,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub source: StageSource,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Challenge {
    pub questions: Vec<String>,
    pub counterarguments: Vec<String>,
    pub source: StageSource,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategicOption {
    pub rank: u8,
    pub title: String,
    pub rationale: String,
    /// Attractiveness in [0, 10]
    pub score: f64,
    pub source: StageSource,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoadmapPhase {
    pub phase: u8,
    pub name: String,
    pub duration_weeks: u32,
    pub milestones: Vec<String>,
    pub source: StageSource,
}

// ---------------------------------------------------------------------------
// Ethics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EthicsAnalysis {
    pub frameworks: Vec<FrameworkScore>,
    /// Equal-weight average of all framework scores
    pub compliance_score: f64,
    pub child_protection: Vec<PrincipleScore>,
    pub child_protection_score: f64,
    pub humanistic: Vec<PrincipleScore>,
    pub humanistic_score: f64,
    pub red_line_violations: Vec<RedLineViolation>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameworkScore {
    pub framework: String,
    pub applicable: bool,
    pub score: f64,
    pub missing_requirements: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrincipleScore {
    pub principle: String,
    pub score: f64,
}

/// Level-1 red line categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RedLineType {
    AddictiveDesign,
    ManipulativeDesign,
    PrivacyViolation,
    ChildHarm,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedLineViolation {
    #[serde(rename = "type")]
    pub violation_type: RedLineType,
    /// The text fragment that matched
    pub matched: String,
}

// ---------------------------------------------------------------------------
// Security
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityAnalysis {
    pub threats: Vec<Threat>,
    /// Advisory only; never raises severity
    pub api_gaps: Vec<ApiGap>,
    pub threat_level: ThreatLevel,
    pub auto_block: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiGap {
    pub feature: String,
    pub advisory: String,
}
