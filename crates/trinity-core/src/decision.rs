//! Conflict resolution across the Trinity
//!
//! Fixed-priority veto hierarchy: Security > Ethics > Innovation.
//! Rules are evaluated in order and the first match wins.

use crate::types::{AgentId, TrinityResults};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Security risk at or above this rejects the concept
pub const SECURITY_REJECT_THRESHOLD: f64 = 80.0;
/// Ethics risk at or above this sends the concept back for revision
pub const ETHICS_REVISION_THRESHOLD: f64 = 70.0;
/// Innovation risk at or below this approves the concept
pub const INNOVATION_APPROVAL_THRESHOLD: f64 = 40.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionKind {
    Reject,
    NeedsRevision,
    Approve,
    ReviewRequired,
}

impl fmt::Display for DecisionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DecisionKind::Reject => "reject",
            DecisionKind::NeedsRevision => "needs_revision",
            DecisionKind::Approve => "approve",
            DecisionKind::ReviewRequired => "review_required",
        };
        f.write_str(label)
    }
}

/// Scores echoed back with a decision
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DecisionDetails {
    pub security_risk: f64,
    pub ethics_risk: f64,
    pub innovation_risk: f64,
}

/// Go/no-go verdict for one analysis run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub decision: DecisionKind,
    pub reason: String,
    pub priority_agent: Option<AgentId>,
    pub details: DecisionDetails,
}

/// Apply the veto hierarchy to three agent results
pub fn resolve_conflicts(results: &TrinityResults) -> Decision {
    let details = DecisionDetails {
        security_risk: results.security.risk_score,
        ethics_risk: results.ethics.risk_score,
        innovation_risk: results.innovation.risk_score,
    };

    let (decision, priority_agent, reason) = if details.security_risk >= SECURITY_REJECT_THRESHOLD {
        (
            DecisionKind::Reject,
            Some(AgentId::Security),
            format!("Critical security risk ({:.0}/100)", details.security_risk),
        )
    } else if details.ethics_risk >= ETHICS_REVISION_THRESHOLD {
        (
            DecisionKind::NeedsRevision,
            Some(AgentId::Ethics),
            format!("Compliance or ethical concerns ({:.0}/100)", details.ethics_risk),
        )
    } else if details.innovation_risk <= INNOVATION_APPROVAL_THRESHOLD {
        (
            DecisionKind::Approve,
            Some(AgentId::Innovation),
            "All checks passed with acceptable risk".to_string(),
        )
    } else {
        (
            DecisionKind::ReviewRequired,
            None,
            "Mixed signals - human review required".to_string(),
        )
    };

    Decision {
        decision,
        reason,
        priority_agent,
        details,
    }
}

/// Trinity synthesis score in [0, 10], weighted by the veto hierarchy
pub fn trinity_score(results: &TrinityResults) -> f64 {
    let safety = |risk: f64| 100.0 - risk.clamp(0.0, 100.0);
    let weighted = safety(results.security.risk_score) * 0.40
        + safety(results.ethics.risk_score) * 0.35
        + safety(results.innovation.risk_score) * 0.25;
    ((weighted / 10.0).clamp(0.0, 10.0) * 10.0).round() / 10.0
}
