use super::*;
use crate::providers::ScriptedProvider;
use async_trait::async_trait;
use proptest::prelude::*;
use trinity_core::analysis::AgentAnalysis;
use trinity_core::decision::DecisionKind;
use trinity_core::llm::LLMFailureKind;
use trinity_core::AgentStatus;

/// Agent returning a fixed risk score
struct FixedAgent {
    id: AgentId,
    risk: f64,
}

#[async_trait]
impl Agent for FixedAgent {
    fn id(&self) -> AgentId {
        self.id
    }

    async fn analyze(&self, _concept: &ConceptInput) -> AgentResult {
        AgentResult::new(
            self.id,
            AgentStatus::Success,
            AgentAnalysis::Degraded { error: String::new() },
            vec![],
            self.risk,
        )
    }
}

struct PanickingAgent;

#[async_trait]
impl Agent for PanickingAgent {
    fn id(&self) -> AgentId {
        AgentId::Ethics
    }

    async fn analyze(&self, _concept: &ConceptInput) -> AgentResult {
        panic!("ethics backend exploded")
    }
}

fn fixed(id: AgentId, risk: f64) -> Arc<dyn Agent> {
    Arc::new(FixedAgent { id, risk })
}

fn orchestrator(security: f64, ethics: f64, innovation: f64) -> TrinityOrchestrator {
    TrinityOrchestrator::with_agents(
        fixed(AgentId::Innovation, innovation),
        fixed(AgentId::Ethics, ethics),
        fixed(AgentId::Security, security),
    )
}

fn concept() -> ConceptInput {
    ConceptInput::new("A shared grocery list app for families").unwrap()
}

fn result(agent_id: AgentId, risk: f64) -> AgentResult {
    AgentResult::new(
        agent_id,
        AgentStatus::Success,
        AgentAnalysis::Degraded { error: String::new() },
        vec![],
        risk,
    )
}

#[tokio::test]
async fn test_security_veto_wins() {
    let report = orchestrator(85.0, 10.0, 5.0).analyze_concept(&concept()).await;

    assert_eq!(report.decision.decision, DecisionKind::Reject);
    assert_eq!(report.decision.priority_agent, Some(AgentId::Security));
}

#[tokio::test]
async fn test_ethics_revision() {
    let report = orchestrator(20.0, 75.0, 10.0).analyze_concept(&concept()).await;

    assert_eq!(report.decision.decision, DecisionKind::NeedsRevision);
    assert_eq!(report.decision.priority_agent, Some(AgentId::Ethics));
}

#[tokio::test]
async fn test_low_risk_is_approved() {
    let report = orchestrator(20.0, 30.0, 30.0).analyze_concept(&concept()).await;

    assert_eq!(report.decision.decision, DecisionKind::Approve);
    assert_eq!(report.decision.priority_agent, Some(AgentId::Innovation));
    // (80*0.40 + 70*0.35 + 70*0.25) / 10
    assert_eq!(report.trinity_score, 7.4);
}

#[tokio::test]
async fn test_mixed_signals_need_review() {
    let report = orchestrator(50.0, 50.0, 60.0).analyze_concept(&concept()).await;

    assert_eq!(report.decision.decision, DecisionKind::ReviewRequired);
    assert_eq!(report.decision.priority_agent, None);
}

#[tokio::test]
async fn test_panicking_agent_fills_degraded_slot() {
    let orchestrator = TrinityOrchestrator::with_agents(
        fixed(AgentId::Innovation, 10.0),
        Arc::new(PanickingAgent),
        fixed(AgentId::Security, 20.0),
    );

    let results = orchestrator.run_full_analysis(&concept()).await;

    assert_eq!(results.ethics.status, AgentStatus::Error);
    assert_eq!(results.ethics.risk_score, 100.0);
    assert_eq!(results.innovation.risk_score, 10.0);
    assert_eq!(results.security.risk_score, 20.0);
    assert_eq!(results.degraded_agents(), vec![AgentId::Ethics]);

    // a degraded ethics slot trips the revision threshold
    let decision = orchestrator.resolve(&results);
    assert_eq!(decision.decision, DecisionKind::NeedsRevision);
}

#[tokio::test]
async fn test_misplaced_agent_is_discarded() {
    let orchestrator = TrinityOrchestrator::with_agents(
        fixed(AgentId::Security, 0.0),
        fixed(AgentId::Ethics, 0.0),
        fixed(AgentId::Security, 0.0),
    );

    let results = orchestrator.run_full_analysis(&concept()).await;

    assert_eq!(results.innovation.agent_id, AgentId::Innovation);
    assert_eq!(results.innovation.status, AgentStatus::Error);
}

#[tokio::test]
async fn test_unreachable_llm_degrades_every_agent() {
    let provider = Arc::new(ScriptedProvider::failing(LLMFailureKind::Unavailable));
    let orchestrator = TrinityOrchestrator::new(provider, AgentSettings::default());

    let report = orchestrator.analyze_concept(&concept()).await;

    assert_eq!(report.results.degraded_agents().len(), 3);
    assert_eq!(report.decision.decision, DecisionKind::Reject);
    assert_eq!(report.trinity_score, 0.0);
}

#[tokio::test]
async fn test_short_description_fails_fast() {
    let provider = Arc::new(ScriptedProvider::always("{}"));
    let orchestrator = TrinityOrchestrator::new(provider.clone(), AgentSettings::default());

    assert!(orchestrator.analyze("too short").await.is_err());
    assert_eq!(provider.call_count(), 0);
}

proptest! {
    #[test]
    fn prop_security_veto_is_absolute(
        security in 80.0f64..=100.0,
        ethics in 0.0f64..=100.0,
        innovation in 0.0f64..=100.0,
    ) {
        let orchestrator = orchestrator(0.0, 0.0, 0.0);
        let results = TrinityResults {
            innovation: result(AgentId::Innovation, innovation),
            ethics: result(AgentId::Ethics, ethics),
            security: result(AgentId::Security, security),
        };

        let decision = orchestrator.resolve(&results);
        prop_assert_eq!(decision.decision, DecisionKind::Reject);
        prop_assert_eq!(decision.priority_agent, Some(AgentId::Security));
    }
}
