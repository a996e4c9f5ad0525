//! Trinity Orchestrator - concurrent review and veto resolution
//!
//! Runs the three agents against the same concept at once, then applies the
//! fixed Security > Ethics > Innovation hierarchy.
//!
//! # Orchestration Architecture
//!
//! ```text
//! Concept: "Shared grocery list for families"
//!          │
//!          v
//! ┌─────────────────────────────────────┐
//! │    Validation (fail fast)           │
//! └─────────────────────────────────────┘
//!          │
//!          v
//! ┌────────────────┐  ┌────────────────┐  ┌────────────────┐
//! │ Innovation (X) │  │  Ethics (Z)    │  │ Security (CS)  │
//! │ 5-stage review │  │ checks + lines │  │ threat scans   │
//! └────────────────┘  └────────────────┘  └────────────────┘
//!          │                │                │
//!          v                v                v
//!          └────────────────┴────────────────┘
//!                       │
//!                       v
//! ┌─────────────────────────────────────┐
//! │    Veto hierarchy CS > Z > X        │
//! └─────────────────────────────────────┘
//!          │
//!          v
//!     Decision + Trinity score
//! ```
//!
//! A panicking agent never takes the run down: its slot is filled with a
//! degraded result and the other two are unaffected.

use crate::agents::{Agent, AgentSettings, EthicsAgent, InnovationAgent, SecurityAgent};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinHandle;
use trinity_core::decision::{resolve_conflicts, trinity_score, Decision};
use trinity_core::llm::LLMProvider;
use trinity_core::{AgentId, AgentResult, ConceptInput, Result, TrinityResults, Uuid};

/// Full outcome of one orchestration run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrinityReport {
    pub concept_id: Uuid,
    pub results: TrinityResults,
    pub decision: Decision,
    /// Synthesis score in [0, 10]
    pub trinity_score: f64,
    pub duration_ms: u64,
}

/// Coordinates the three agents
pub struct TrinityOrchestrator {
    innovation: Arc<dyn Agent>,
    ethics: Arc<dyn Agent>,
    security: Arc<dyn Agent>,
}

impl TrinityOrchestrator {
    /// Build the standard agents over one shared provider
    pub fn new(provider: Arc<dyn LLMProvider>, settings: AgentSettings) -> Self {
        tracing::info!("Initializing Trinity Orchestrator with provider '{}'", provider.name());
        Self {
            innovation: Arc::new(InnovationAgent::new(provider.clone(), settings.clone())),
            ethics: Arc::new(EthicsAgent::new(provider.clone(), settings.clone())),
            security: Arc::new(SecurityAgent::new(provider, settings)),
        }
    }

    /// Use caller-supplied agents, one per slot
    pub fn with_agents(
        innovation: Arc<dyn Agent>,
        ethics: Arc<dyn Agent>,
        security: Arc<dyn Agent>,
    ) -> Self {
        Self {
            innovation,
            ethics,
            security,
        }
    }

    /// Run all three agents concurrently and collect every slot
    pub async fn run_full_analysis(&self, concept: &ConceptInput) -> TrinityResults {
        tracing::info!(
            concept_id = %concept.id(),
            session_id = %concept.session_id(),
            "Running Trinity analysis"
        );

        let innovation = Self::spawn(&self.innovation, concept);
        let ethics = Self::spawn(&self.ethics, concept);
        let security = Self::spawn(&self.security, concept);

        let (innovation, ethics, security) = tokio::join!(
            Self::collect(AgentId::Innovation, innovation),
            Self::collect(AgentId::Ethics, ethics),
            Self::collect(AgentId::Security, security),
        );

        TrinityResults {
            innovation,
            ethics,
            security,
        }
    }

    /// Apply the veto hierarchy
    pub fn resolve(&self, results: &TrinityResults) -> Decision {
        let decision = resolve_conflicts(results);
        tracing::info!(
            decision = %decision.decision,
            priority_agent = ?decision.priority_agent,
            security_risk = decision.details.security_risk,
            ethics_risk = decision.details.ethics_risk,
            innovation_risk = decision.details.innovation_risk,
            "Trinity decision: {}",
            decision.reason
        );
        decision
    }

    /// Full pipeline over an already validated concept
    pub async fn analyze_concept(&self, concept: &ConceptInput) -> TrinityReport {
        let started = Instant::now();
        let results = self.run_full_analysis(concept).await;
        let decision = self.resolve(&results);
        let score = trinity_score(&results);

        TrinityReport {
            concept_id: concept.id(),
            results,
            decision,
            trinity_score: score,
            duration_ms: started.elapsed().as_millis() as u64,
        }
    }

    /// Validate a raw description, then run the full pipeline
    pub async fn analyze(&self, description: &str) -> Result<TrinityReport> {
        let concept = ConceptInput::new(description)?;
        Ok(self.analyze_concept(&concept).await)
    }

    fn spawn(agent: &Arc<dyn Agent>, concept: &ConceptInput) -> JoinHandle<AgentResult> {
        let agent = Arc::clone(agent);
        let concept = concept.clone();
        tokio::spawn(async move { agent.analyze(&concept).await })
    }

    async fn collect(agent_id: AgentId, handle: JoinHandle<AgentResult>) -> AgentResult {
        match handle.await {
            Ok(result) if result.agent_id == agent_id => result,
            Ok(result) => {
                tracing::error!(
                    "Agent in slot {} reported as {}, discarding its result",
                    agent_id,
                    result.agent_id
                );
                AgentResult::degraded(agent_id, format!("slot mismatch: {}", result.agent_id))
            }
            Err(err) => {
                tracing::error!("{} agent failed: {}", agent_id.display_name(), err);
                AgentResult::degraded(agent_id, format!("agent task failed: {}", err))
            }
        }
    }
}

#[cfg(test)]
mod tests;
