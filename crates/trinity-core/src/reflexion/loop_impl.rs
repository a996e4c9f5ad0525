//! RefleXion Loop - Generate -> Reflect -> Improve -> Iterate
//!
//! Iterations are strictly sequential; iteration N+1 starts from the
//! specification produced by iteration N's reflection.

use super::spec::{apply_improvements, AppSpecification};
use super::AppGenerator;
use crate::artifact::GeneratedApp;
use crate::config::ReflexionSettings;
use crate::error::{Result, ResultExt};
use crate::history::{ImprovementHistory, VersionTracker};
use crate::reflection::{ReflectionAnalyzer, ReflectionReport};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopState {
    Generating,
    Reflecting,
    Iterating,
    /// The artifact no longer needs work
    Converged,
    /// Iteration budget spent
    Exhausted,
    /// Scores stopped moving
    Stuck,
}

impl LoopState {
    pub fn is_terminal(self) -> bool {
        matches!(self, LoopState::Converged | LoopState::Exhausted | LoopState::Stuck)
    }
}

impl fmt::Display for LoopState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            LoopState::Generating => "generating",
            LoopState::Reflecting => "reflecting",
            LoopState::Iterating => "iterating",
            LoopState::Converged => "converged",
            LoopState::Exhausted => "exhausted",
            LoopState::Stuck => "stuck",
        };
        f.write_str(label)
    }
}

/// Result of a complete loop run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoopOutcome {
    /// Always terminal
    pub state: LoopState,
    pub iterations: u32,
    /// Converged: the last artifact. Otherwise the best-scoring one.
    pub app: GeneratedApp,
    /// Report for `app`
    pub report: ReflectionReport,
    pub reports: Vec<ReflectionReport>,
    pub final_spec: AppSpecification,
    pub history: ImprovementHistory,
}

/// Stagnation bookkeeping across iterations
#[derive(Debug, Default)]
struct Safeguards {
    stagnant_iterations: u32,
}

impl Safeguards {
    /// Run the three guards; true when the loop is stuck
    fn check(
        &mut self,
        settings: &ReflexionSettings,
        previous: &ReflectionReport,
        current: &ReflectionReport,
    ) -> bool {
        let delta = current.overall_score() - previous.overall_score();

        if delta.abs() < settings.stagnation_threshold {
            self.stagnant_iterations += 1;
            tracing::debug!(
                iteration = current.iteration,
                delta,
                stagnant = self.stagnant_iterations,
                "Score stagnant"
            );
        } else {
            self.stagnant_iterations = 0;
        }

        if delta < 0.0 {
            tracing::warn!(
                iteration = current.iteration,
                previous = previous.overall_score(),
                current = current.overall_score(),
                "Quality regressed"
            );
        }

        let critical = current.critical_count();
        if critical > 0 && critical >= previous.critical_count() {
            tracing::warn!(
                iteration = current.iteration,
                critical,
                previous = previous.critical_count(),
                "Critical issues persist"
            );
        }

        self.stagnant_iterations >= settings.stagnation_limit
    }
}

/// The iterative generation loop
pub struct RefleXionLoop {
    generator: Arc<dyn AppGenerator>,
    analyzer: ReflectionAnalyzer,
    settings: ReflexionSettings,
}

impl RefleXionLoop {
    pub fn new(generator: Arc<dyn AppGenerator>, settings: ReflexionSettings) -> Result<Self> {
        settings.validate()?;
        let analyzer = ReflectionAnalyzer::from_settings(&settings)?;
        Ok(Self {
            generator,
            analyzer,
            settings,
        })
    }

    pub fn settings(&self) -> &ReflexionSettings {
        &self.settings
    }

    /// Run until Converged, Exhausted or Stuck.
    ///
    /// Only generator and persistence failures are errors; every quality
    /// outcome is a terminal state.
    pub async fn run(&self, initial: AppSpecification) -> Result<LoopOutcome> {
        let max_iterations = self.settings.max_iterations;
        let mut tracker = VersionTracker::new(initial.name.clone());
        let mut safeguards = Safeguards::default();
        let mut spec = initial;
        let mut reports: Vec<ReflectionReport> = Vec::new();
        let mut best: Option<(GeneratedApp, usize)> = None;
        let mut state = LoopState::Generating;

        tracing::info!(app = %spec.name, max_iterations, "Starting RefleXion loop");

        let mut iteration = 0;
        let (app, report_index) = loop {
            iteration += 1;

            tracing::debug!(iteration, state = %state, "Generating");
            let app = self
                .generator
                .generate(&spec, iteration)
                .await
                .with_context(|| format!("generation failed at iteration {}", iteration))?;

            state = LoopState::Reflecting;
            let report = self
                .analyzer
                .analyze_generated_code(&app, iteration, reports.last());
            tracker.record(&app, &report);

            tracing::info!(
                iteration,
                version = %report.version,
                overall = report.overall_score(),
                security = report.scores.security(),
                issues = report.issue_count(),
                "Iteration complete"
            );

            let stuck = match reports.last() {
                Some(previous) => safeguards.check(&self.settings, previous, &report),
                None => false,
            };

            let improves_on_best = best
                .as_ref()
                .map_or(true, |(_, idx)| report.overall_score() >= reports[*idx].overall_score());
            let needs_work = self.analyzer.needs_iteration(&report);
            reports.push(report);
            let index = reports.len() - 1;

            state = if stuck {
                LoopState::Stuck
            } else if !needs_work {
                LoopState::Converged
            } else if iteration >= max_iterations {
                LoopState::Exhausted
            } else {
                LoopState::Iterating
            };

            match state {
                LoopState::Converged => break (app, index),
                LoopState::Stuck | LoopState::Exhausted => {
                    if improves_on_best {
                        break (app, index);
                    }
                    match best.take() {
                        Some(chosen) => break chosen,
                        None => break (app, index),
                    }
                }
                _ => {
                    if improves_on_best {
                        best = Some((app, index));
                    }
                    spec = apply_improvements(&spec, &reports[index]);
                }
            }
        };

        tracker.select(reports[report_index].iteration);

        tracing::info!(
            state = %state,
            iterations = iteration,
            overall = reports[report_index].overall_score(),
            "RefleXion loop finished"
        );

        if let Some(dir) = &self.settings.output_dir {
            tracker.save_json(dir).await?;
        }

        Ok(LoopOutcome {
            state,
            iterations: iteration,
            app,
            report: reports[report_index].clone(),
            reports,
            final_spec: spec,
            history: tracker.history(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TrinityError;
    use crate::reflection::{CodeIssue, IssueCategory, ReflectionScores, Severity};
    use crate::reflexion::TemplateGenerator;
    use crate::types::now;
    use async_trait::async_trait;
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn settings(max_iterations: u32) -> ReflexionSettings {
        ReflexionSettings {
            max_iterations,
            ..ReflexionSettings::default()
        }
    }

    /// Always produces the same artifact
    struct FixedGenerator {
        files: Vec<(&'static str, &'static str)>,
        calls: AtomicU32,
    }

    impl FixedGenerator {
        fn new(files: Vec<(&'static str, &'static str)>) -> Self {
            Self {
                files,
                calls: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl AppGenerator for FixedGenerator {
        async fn generate(&self, spec: &AppSpecification, _iteration: u32) -> Result<GeneratedApp> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let files: BTreeMap<String, String> = self
                .files
                .iter()
                .map(|(p, b)| (p.to_string(), b.to_string()))
                .collect();
            Ok(GeneratedApp::new(spec.name.clone(), files, "", ""))
        }
    }

    struct FailingGenerator;

    #[async_trait]
    impl AppGenerator for FailingGenerator {
        async fn generate(&self, _spec: &AppSpecification, _iteration: u32) -> Result<GeneratedApp> {
            Err(TrinityError::Generation("renderer offline".to_string()))
        }
    }

    fn task_spec() -> AppSpecification {
        AppSpecification::task_manager("taskflow", "Task tracking for small teams")
    }

    #[tokio::test]
    async fn test_template_generator_converges() {
        let reflexion = RefleXionLoop::new(Arc::new(TemplateGenerator::new()), settings(5)).unwrap();
        let outcome = reflexion.run(task_spec()).await.unwrap();

        assert_eq!(outcome.state, LoopState::Converged);
        assert_eq!(outcome.iterations, 2);
        assert_eq!(outcome.report.overall_score(), 100.0);
        assert!(outcome.reports[0].overall_score() < outcome.reports[1].overall_score());
        assert!(outcome.final_spec.has_feature("parameterized_queries"));
        assert_eq!(outcome.history.versions.len(), 2);
        assert!(outcome.history.improvement_percentage > 0.0);
    }

    #[tokio::test]
    async fn test_single_iteration_budget_is_exhausted() {
        let reflexion = RefleXionLoop::new(Arc::new(TemplateGenerator::new()), settings(1)).unwrap();
        let outcome = reflexion.run(task_spec()).await.unwrap();

        assert_eq!(outcome.state, LoopState::Exhausted);
        assert_eq!(outcome.iterations, 1);
        assert!(!outcome.report.should_iterate);
    }

    #[tokio::test]
    async fn test_identical_artifacts_get_stuck() {
        let generator = Arc::new(FixedGenerator::new(vec![(
            "src/config.js",
            "module.exports = { password: 'admin123' };\n",
        )]));
        let reflexion = RefleXionLoop::new(generator.clone(), settings(5)).unwrap();
        let outcome = reflexion.run(task_spec()).await.unwrap();

        assert_eq!(outcome.state, LoopState::Stuck);
        assert_eq!(outcome.iterations, 3);
        assert_eq!(generator.calls.load(Ordering::SeqCst), 3);
        // equal scores resolve to the later iteration
        assert_eq!(outcome.report.iteration, 3);
    }

    #[tokio::test]
    async fn test_generator_failure_propagates() {
        let reflexion = RefleXionLoop::new(Arc::new(FailingGenerator), settings(3)).unwrap();
        let err = reflexion.run(task_spec()).await.unwrap_err();
        assert!(err.to_string().contains("iteration 1"));
    }

    #[tokio::test]
    async fn test_history_written_when_output_dir_set() {
        let dir = tempfile::tempdir().unwrap();
        let settings = ReflexionSettings {
            output_dir: Some(dir.path().to_path_buf()),
            ..ReflexionSettings::default()
        };
        let reflexion = RefleXionLoop::new(Arc::new(TemplateGenerator::new()), settings).unwrap();
        reflexion.run(task_spec()).await.unwrap();

        assert!(dir.path().join("taskflow_history.json").exists());
    }

    #[test]
    fn test_invalid_settings_rejected() {
        assert!(RefleXionLoop::new(Arc::new(TemplateGenerator::new()), settings(0)).is_err());
    }

    fn report(iteration: u32, score: f64, critical: usize) -> ReflectionReport {
        let security_issues = (0..critical)
            .map(|_| {
                CodeIssue::new(
                    Severity::Critical,
                    IssueCategory::Security,
                    "src/db.js",
                    "SQL built by string concatenation",
                    "Use parameterized queries",
                )
            })
            .collect();
        ReflectionReport {
            iteration,
            version: ReflectionReport::version_label(iteration),
            scores: ReflectionScores::new(score, score, score, score),
            security_issues,
            quality_issues: vec![],
            compliance_gaps: vec![],
            performance_issues: vec![],
            best_practice_violations: vec![],
            improvement_suggestions: vec![],
            improvements_from_previous: vec![],
            analysis_duration_ms: 0,
            should_iterate: true,
            timestamp: now(),
        }
    }

    /// Feed consecutive reports through one `Safeguards`, collecting each verdict
    fn verdicts(reports: &[ReflectionReport]) -> Vec<bool> {
        let settings = ReflexionSettings::default();
        let mut safeguards = Safeguards::default();
        reports
            .windows(2)
            .map(|pair| safeguards.check(&settings, &pair[0], &pair[1]))
            .collect()
    }

    #[test]
    fn test_moving_score_resets_stagnation() {
        // stagnant, moving, stagnant
        let reports = [
            report(1, 60.0, 0),
            report(2, 60.5, 0),
            report(3, 70.0, 0),
            report(4, 70.2, 0),
        ];
        assert_eq!(verdicts(&reports), vec![false, false, false]);
    }

    #[test]
    fn test_two_stagnant_deltas_are_stuck() {
        let reports = [report(1, 60.0, 0), report(2, 60.5, 0), report(3, 60.9, 0)];
        assert_eq!(verdicts(&reports), vec![false, true]);
    }

    #[test]
    fn test_regression_is_not_fatal() {
        let reports = [report(1, 80.0, 0), report(2, 65.0, 0), report(3, 50.0, 0)];
        assert_eq!(verdicts(&reports), vec![false, false]);
    }

    #[test]
    fn test_persistent_critical_issues_are_not_fatal() {
        let reports = [report(1, 40.0, 2), report(2, 50.0, 2), report(3, 60.0, 3)];
        assert_eq!(verdicts(&reports), vec![false, false]);
    }

    #[test]
    fn test_zero_stagnation_limit_rejected() {
        let settings = ReflexionSettings {
            stagnation_limit: 0,
            ..ReflexionSettings::default()
        };
        assert!(RefleXionLoop::new(Arc::new(TemplateGenerator::new()), settings).is_err());
    }

    #[test]
    fn test_terminal_states() {
        assert!(LoopState::Stuck.is_terminal());
        assert!(LoopState::Converged.is_terminal());
        assert!(!LoopState::Iterating.is_terminal());
    }
}
