//! Reflection Analyzer - turns an artifact into a [`ReflectionReport`]

use super::analyzers::{
    analyze_best_practices, analyze_compliance, analyze_performance, analyze_quality,
    analyze_security,
};
use super::{CodeIssue, ReflectionReport, ReflectionRubric, ReflectionScores};
use crate::artifact::GeneratedApp;
use crate::config::ReflexionSettings;
use crate::error::{Result, ValidationError};
use crate::types::now;
use std::collections::HashSet;
use std::time::Instant;

/// Maximum number of improvement suggestions kept per report
pub const MAX_SUGGESTIONS: usize = 10;

/// Static self-critique of generated applications
#[derive(Debug, Clone)]
pub struct ReflectionAnalyzer {
    rubric: ReflectionRubric,
    max_iterations: u32,
    quality_threshold: f64,
}

impl ReflectionAnalyzer {
    pub fn new(max_iterations: u32, quality_threshold: f64) -> Result<Self> {
        if max_iterations == 0 {
            return Err(ValidationError::InvalidIterationBudget(max_iterations).into());
        }
        if !(0.0..=100.0).contains(&quality_threshold) {
            return Err(ValidationError::InvalidThreshold(quality_threshold).into());
        }
        Ok(Self {
            rubric: ReflectionRubric::v1(),
            max_iterations,
            quality_threshold,
        })
    }

    pub fn from_settings(settings: &ReflexionSettings) -> Result<Self> {
        Self::new(settings.max_iterations, settings.quality_threshold)
    }

    pub fn max_iterations(&self) -> u32 {
        self.max_iterations
    }

    pub fn quality_threshold(&self) -> f64 {
        self.quality_threshold
    }

    /// Analyze one iteration's artifact against the previous report, if any
    pub fn analyze_generated_code(
        &self,
        app: &GeneratedApp,
        iteration: u32,
        previous: Option<&ReflectionReport>,
    ) -> ReflectionReport {
        let started = Instant::now();

        let security_issues = analyze_security(app);
        let quality_issues = analyze_quality(app);
        let compliance_gaps = analyze_compliance(app);
        let performance_issues = analyze_performance(app);
        let best_practice_violations = analyze_best_practices(app);

        let standard = &self.rubric.standard_deductions;
        let scores = ReflectionScores::new(
            standard.score(quality_issues.iter().chain(&best_practice_violations)),
            self.rubric.security_deductions.score(&security_issues),
            standard.score(&compliance_gaps),
            standard.score(&performance_issues),
        );

        let mut report = ReflectionReport {
            iteration,
            version: ReflectionReport::version_label(iteration),
            scores,
            security_issues,
            quality_issues,
            compliance_gaps,
            performance_issues,
            best_practice_violations,
            improvement_suggestions: Vec::new(),
            improvements_from_previous: Vec::new(),
            analysis_duration_ms: 0,
            should_iterate: false,
            timestamp: now(),
        };

        report.improvement_suggestions = suggestions(&report);
        report.improvements_from_previous = previous
            .map(|prev| resolved_since(prev, &report))
            .unwrap_or_default();
        report.should_iterate = self.should_iterate(&report);
        report.analysis_duration_ms = started.elapsed().as_millis() as u64;

        tracing::debug!(
            iteration,
            overall = report.overall_score(),
            issues = report.issue_count(),
            "Reflection complete"
        );

        report
    }

    /// Stop/iterate decision, first match wins:
    /// iteration cap, critical security issue, score below threshold,
    /// high-severity compliance gap.
    pub fn should_iterate(&self, report: &ReflectionReport) -> bool {
        if report.iteration >= self.max_iterations {
            return false;
        }
        self.needs_iteration(report)
    }

    /// Whether the artifact still needs work, ignoring the iteration cap
    pub fn needs_iteration(&self, report: &ReflectionReport) -> bool {
        report.has_critical_security_issue()
            || report.overall_score() < self.quality_threshold
            || report.has_high_compliance_gap()
    }
}

/// Most severe first, `"[severity] path: fix"`, de-duplicated, capped
fn suggestions(report: &ReflectionReport) -> Vec<String> {
    let mut issues: Vec<&CodeIssue> = report.all_issues().collect();
    issues.sort_by(|a, b| b.severity.cmp(&a.severity));

    let mut seen = HashSet::new();
    issues
        .into_iter()
        .map(CodeIssue::suggestion)
        .filter(|s| seen.insert(s.clone()))
        .take(MAX_SUGGESTIONS)
        .collect()
}

fn resolved_since(previous: &ReflectionReport, current: &ReflectionReport) -> Vec<String> {
    let still_open: HashSet<&str> = current.all_issues().map(|i| i.description.as_str()).collect();
    let mut seen = HashSet::new();
    previous
        .all_issues()
        .map(|i| i.description.as_str())
        .filter(|d| !still_open.contains(d) && seen.insert(*d))
        .map(|d| format!("Resolved: {}", d))
        .collect()
}
