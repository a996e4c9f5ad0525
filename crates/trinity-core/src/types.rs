//! Core types for Trinity
//!
//! - Concept input (validated on construction)
//! - Agent identifiers and statuses
//! - Agent results and the Trinity slot set
//! - Timestamps

use crate::analysis::AgentAnalysis;
use crate::error::{Result, ValidationError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use uuid::Uuid;

/// Timestamp type alias
pub type Timestamp = DateTime<Utc>;

/// Create a timestamp for the current moment
pub fn now() -> Timestamp {
    Utc::now()
}

/// Minimum accepted length of a concept description, in characters
pub const MIN_DESCRIPTION_LENGTH: usize = 10;

/// A product concept submitted for review. Immutable once built.
///
/// Deserialisation goes through the same length check as the builder.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "RawConceptInput")]
pub struct ConceptInput {
    id: Uuid,
    description: String,
    category: Option<String>,
    user_context: HashMap<String, String>,
    session_id: Uuid,
}

impl ConceptInput {
    /// Create a concept, failing if the description is too short
    pub fn new(description: impl Into<String>) -> Result<Self> {
        Self::builder(description).build()
    }

    pub fn builder(description: impl Into<String>) -> ConceptInputBuilder {
        ConceptInputBuilder {
            description: description.into(),
            category: None,
            user_context: HashMap::new(),
            session_id: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    pub fn user_context(&self) -> &HashMap<String, String> {
        &self.user_context
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Description plus category and context values, lowercased, for keyword scans
    pub fn searchable_text(&self) -> String {
        let mut text = self.description.to_lowercase();
        if let Some(category) = &self.category {
            text.push(' ');
            text.push_str(&category.to_lowercase());
        }
        let mut values: Vec<_> = self.user_context.values().collect();
        values.sort();
        for value in values {
            text.push(' ');
            text.push_str(&value.to_lowercase());
        }
        text
    }
}

/// Builder for [`ConceptInput`]
#[derive(Debug)]
pub struct ConceptInputBuilder {
    description: String,
    category: Option<String>,
    user_context: HashMap<String, String>,
    session_id: Option<Uuid>,
}

impl ConceptInputBuilder {
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.user_context.insert(key.into(), value.into());
        self
    }

    pub fn session_id(mut self, session_id: Uuid) -> Self {
        self.session_id = Some(session_id);
        self
    }

    pub fn build(self) -> Result<ConceptInput> {
        check_description(&self.description)?;

        Ok(ConceptInput {
            id: Uuid::new_v4(),
            description: self.description,
            category: self.category,
            user_context: self.user_context,
            session_id: self.session_id.unwrap_or_else(Uuid::new_v4),
        })
    }
}

fn check_description(description: &str) -> std::result::Result<(), ValidationError> {
    let length = description.trim().chars().count();
    if length < MIN_DESCRIPTION_LENGTH {
        return Err(ValidationError::DescriptionTooShort {
            length,
            minimum: MIN_DESCRIPTION_LENGTH,
        });
    }
    Ok(())
}

/// Wire form of [`ConceptInput`]; missing ids are generated
#[derive(Deserialize)]
struct RawConceptInput {
    id: Option<Uuid>,
    description: String,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    user_context: HashMap<String, String>,
    session_id: Option<Uuid>,
}

impl TryFrom<RawConceptInput> for ConceptInput {
    type Error = ValidationError;

    fn try_from(raw: RawConceptInput) -> std::result::Result<Self, Self::Error> {
        check_description(&raw.description)?;
        Ok(ConceptInput {
            id: raw.id.unwrap_or_else(Uuid::new_v4),
            description: raw.description,
            category: raw.category,
            user_context: raw.user_context,
            session_id: raw.session_id.unwrap_or_else(Uuid::new_v4),
        })
    }
}

/// The three fixed review roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AgentId {
    /// Innovation / business agent
    #[serde(rename = "X")]
    Innovation,
    /// Ethics / compliance agent
    #[serde(rename = "Z")]
    Ethics,
    /// Security agent
    #[serde(rename = "CS")]
    Security,
}

impl AgentId {
    pub const ALL: [AgentId; 3] = [AgentId::Innovation, AgentId::Ethics, AgentId::Security];

    /// Short code used in reports ("X", "Z", "CS")
    pub fn code(self) -> &'static str {
        match self {
            AgentId::Innovation => "X",
            AgentId::Ethics => "Z",
            AgentId::Security => "CS",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            AgentId::Innovation => "Innovation",
            AgentId::Ethics => "Ethics",
            AgentId::Security => "Security",
        }
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Outcome status reported by an agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    Success,
    Warning,
    Error,
    Blocked,
    Rejected,
    Approved,
    NeedsRevision,
}

impl AgentStatus {
    /// Whether the status reflects degraded operation rather than a verdict
    pub fn is_degraded(self) -> bool {
        matches!(self, AgentStatus::Error)
    }
}

impl fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            AgentStatus::Success => "success",
            AgentStatus::Warning => "warning",
            AgentStatus::Error => "error",
            AgentStatus::Blocked => "blocked",
            AgentStatus::Rejected => "rejected",
            AgentStatus::Approved => "approved",
            AgentStatus::NeedsRevision => "needs_revision",
        };
        f.write_str(label)
    }
}

/// Clamp a score into [0, 100]; NaN maps to the worst case
pub fn clamp_score(value: f64) -> f64 {
    if value.is_nan() {
        100.0
    } else {
        value.clamp(0.0, 100.0)
    }
}

/// Round to two decimals
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Result of a single agent invocation. Never mutated after return.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentResult {
    pub agent_id: AgentId,
    pub status: AgentStatus,
    pub analysis: AgentAnalysis,
    pub recommendations: Vec<String>,
    /// Risk score in [0, 100]
    pub risk_score: f64,
    pub metadata: BTreeMap<String, serde_json::Value>,
    pub timestamp: Timestamp,
}

impl AgentResult {
    pub fn new(
        agent_id: AgentId,
        status: AgentStatus,
        analysis: AgentAnalysis,
        recommendations: Vec<String>,
        risk_score: f64,
    ) -> Self {
        Self {
            agent_id,
            status,
            analysis,
            recommendations,
            risk_score: round2(clamp_score(risk_score)),
            metadata: BTreeMap::new(),
            timestamp: now(),
        }
    }

    /// Degraded result used whenever an agent cannot complete its analysis
    pub fn degraded(agent_id: AgentId, error: impl Into<String>) -> Self {
        let error = error.into();
        Self::new(
            agent_id,
            AgentStatus::Error,
            AgentAnalysis::Degraded {
                error: error.clone(),
            },
            vec![format!(
                "{} analysis unavailable ({}); retry once the LLM service is reachable",
                agent_id.display_name(),
                error
            )],
            100.0,
        )
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}

/// The three agent results of one analysis run, in named slots
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrinityResults {
    pub innovation: AgentResult,
    pub ethics: AgentResult,
    pub security: AgentResult,
}

impl TrinityResults {
    pub fn get(&self, agent_id: AgentId) -> &AgentResult {
        match agent_id {
            AgentId::Innovation => &self.innovation,
            AgentId::Ethics => &self.ethics,
            AgentId::Security => &self.security,
        }
    }

    /// `{agent_id: AgentResult}` view of the slots
    pub fn as_map(&self) -> BTreeMap<AgentId, &AgentResult> {
        AgentId::ALL
            .iter()
            .map(|id| (*id, self.get(*id)))
            .collect()
    }

    pub fn degraded_agents(&self) -> Vec<AgentId> {
        AgentId::ALL
            .iter()
            .copied()
            .filter(|id| self.get(*id).status.is_degraded())
            .collect()
    }
}
