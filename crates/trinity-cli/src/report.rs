//! Human-readable terminal rendering

use colored::{ColoredString, Colorize};
use std::fmt::Write;
use trinity_agents::TrinityReport;
use trinity_core::{AgentId, DecisionKind, LoopOutcome, LoopState};

fn risk(score: f64) -> ColoredString {
    let text = format!("{:>5.1}", score);
    if score >= 80.0 {
        text.red().bold()
    } else if score >= 40.0 {
        text.yellow()
    } else {
        text.green()
    }
}

fn decision(kind: DecisionKind) -> ColoredString {
    let label = kind.to_string().to_uppercase();
    match kind {
        DecisionKind::Reject => label.red().bold(),
        DecisionKind::NeedsRevision => label.yellow().bold(),
        DecisionKind::Approve => label.green().bold(),
        DecisionKind::ReviewRequired => label.cyan().bold(),
    }
}

fn state(state: LoopState) -> ColoredString {
    let label = state.to_string();
    match state {
        LoopState::Converged => label.green().bold(),
        LoopState::Stuck => label.red().bold(),
        _ => label.yellow().bold(),
    }
}

pub fn render_trinity(report: &TrinityReport) -> String {
    let mut out = String::new();
    let priority = report
        .decision
        .priority_agent
        .map(|id| id.code().to_string())
        .unwrap_or_else(|| "-".to_string());

    let _ = writeln!(out, "{} {}", "DECISION:".bold(), decision(report.decision.decision));
    let _ = writeln!(out, "  reason:   {}", report.decision.reason);
    let _ = writeln!(out, "  priority: {}", priority);
    let _ = writeln!(out, "  trinity:  {:.1}/10", report.trinity_score);
    let _ = writeln!(out);

    for id in AgentId::ALL {
        let result = report.results.get(id);
        let _ = writeln!(
            out,
            "{:<3} {:<11} risk {}  [{}]",
            id.code(),
            id.display_name(),
            risk(result.risk_score),
            result.status
        );
        for recommendation in result.recommendations.iter().take(5) {
            let _ = writeln!(out, "      - {}", recommendation);
        }
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "completed in {} ms", report.duration_ms);
    out
}

pub fn render_outcome(outcome: &LoopOutcome) -> String {
    let mut out = String::new();
    let history = &outcome.history;

    let _ = writeln!(
        out,
        "{} {} after {} iteration(s)",
        "RefleXion:".bold(),
        state(outcome.state),
        outcome.iterations
    );
    let _ = writeln!(
        out,
        "  score {:.2} -> {:.2} ({:+.1}%)",
        history.initial_score, history.final_score, history.improvement_percentage
    );
    if let Some(selected) = &history.selected_version {
        let _ = writeln!(out, "  returned {} ({:.2})", selected, history.selected_score);
    }
    let _ = writeln!(out);

    for version in &history.versions {
        let _ = writeln!(
            out,
            "{:<6} overall {:>6.2}  quality {:>6.2}  security {:>6.2}  compliance {:>6.2}  performance {:>6.2}  files {}",
            version.version,
            version.overall_score,
            version.quality_score,
            version.security_score,
            version.compliance_score,
            version.performance_score,
            version.file_count
        );
    }

    if !outcome.report.improvement_suggestions.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "{}", "Open issues:".bold());
        for suggestion in &outcome.report.improvement_suggestions {
            let _ = writeln!(out, "  {}", suggestion);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use trinity_agents::{AgentSettings, OfflineProvider, TrinityOrchestrator};
    use trinity_core::config::ReflexionSettings;
    use trinity_core::reflexion::TemplateGenerator;
    use trinity_core::{AppSpecification, RefleXionLoop};

    #[tokio::test]
    async fn test_render_trinity_lists_every_agent() {
        colored::control::set_override(false);
        let orchestrator =
            TrinityOrchestrator::new(Arc::new(OfflineProvider::new()), AgentSettings::default());
        let report = orchestrator
            .analyze("Addictive infinite-scroll app with autoplay and daily rewards for kids")
            .await
            .unwrap();

        let text = render_trinity(&report);
        assert!(text.contains("DECISION: REJECT"));
        assert!(text.contains("priority: CS"));
        for id in AgentId::ALL {
            assert!(text.contains(id.display_name()));
        }
    }

    #[tokio::test]
    async fn test_render_outcome_has_one_row_per_version() {
        colored::control::set_override(false);
        let reflexion = RefleXionLoop::new(
            Arc::new(TemplateGenerator::new()),
            ReflexionSettings::default(),
        )
        .unwrap();
        let outcome = reflexion
            .run(AppSpecification::task_manager("tasks", "Task tracker"))
            .await
            .unwrap();

        let text = render_outcome(&outcome);
        assert!(text.contains("converged"));
        assert!(text.contains("v1.0"));
        assert!(text.contains("v1.1"));
        assert!(text.contains("returned v1.1"));
    }
}
