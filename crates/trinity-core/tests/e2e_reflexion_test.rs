//! End-to-end tests for the RefleXion loop

use async_trait::async_trait;
use proptest::prelude::*;
use std::collections::BTreeMap;
use std::sync::Arc;
use trinity_core::config::ReflexionSettings;
use trinity_core::reflexion::{AppGenerator, AppSpecification, LoopState, RefleXionLoop, TemplateGenerator};
use trinity_core::{GeneratedApp, ImprovementHistory, Result};

fn settings(max_iterations: u32) -> ReflexionSettings {
    ReflexionSettings {
        max_iterations,
        ..ReflexionSettings::default()
    }
}

fn task_spec() -> AppSpecification {
    AppSpecification::task_manager("taskflow", "Task tracking for small teams")
}

/// Artifact scoring security 20, compliance 90, quality 100 and
/// performance `100 - 2 * select_star_files`.
fn plateau_app(name: &str, select_star_files: usize) -> GeneratedApp {
    let mut files = BTreeMap::new();
    files.insert(
        "src/config.js".to_string(),
        "module.exports = { password: 'admin123' };\n".to_string(),
    );
    files.insert("src/secrets.js".to_string(), "const token = 'abcdef';\n".to_string());
    files.insert(
        "src/routes/api.js".to_string(),
        "router.post('/tasks', createTask);\nrouter.put('/tasks/:id', updateTask);\n".to_string(),
    );
    files.insert(
        "src/compliance/gdpr.js".to_string(),
        "// consent records, data export and erasure requests\n".to_string(),
    );
    for n in 0..select_star_files {
        files.insert(
            format!("src/queries/q{}.js", n),
            "db.query('SELECT * FROM tasks');\n".to_string(),
        );
    }
    files.insert(".env.example".to_string(), "PORT=3000\n".to_string());
    files.insert("README.md".to_string(), "# taskflow\n".to_string());
    GeneratedApp::new(name, files, "", "")
}

/// Alternates between two nearly identical artifacts: 72.0 on odd
/// iterations, 72.4 on even ones.
struct PlateauGenerator;

#[async_trait]
impl AppGenerator for PlateauGenerator {
    async fn generate(&self, spec: &AppSpecification, iteration: u32) -> Result<GeneratedApp> {
        let select_star_files = if iteration % 2 == 0 { 4 } else { 5 };
        Ok(plateau_app(&spec.name, select_star_files))
    }
}

#[tokio::test]
async fn test_task_manager_converges_on_second_iteration() {
    let reflexion = RefleXionLoop::new(Arc::new(TemplateGenerator::new()), settings(5)).unwrap();
    let outcome = reflexion.run(task_spec()).await.unwrap();

    assert_eq!(outcome.state, LoopState::Converged);
    assert_eq!(outcome.iterations, 2);

    let first = &outcome.reports[0];
    assert!(first.has_critical_security_issue());
    assert!(first.has_high_compliance_gap());
    assert!(first.should_iterate);

    let last = &outcome.report;
    assert_eq!(last.version, "v1.1");
    assert_eq!(last.issue_count(), 0);
    assert!(!last.improvements_from_previous.is_empty());
    assert!(outcome.app.files.contains_key("src/compliance/gdpr.js"));
    assert!(outcome.app.files.contains_key("src/middleware/auth.js"));
}

#[tokio::test]
async fn test_plateau_is_detected_and_best_version_returned() {
    let reflexion = RefleXionLoop::new(Arc::new(PlateauGenerator), settings(5)).unwrap();
    let outcome = reflexion.run(task_spec()).await.unwrap();

    let scores: Vec<f64> = outcome.reports.iter().map(|r| r.overall_score()).collect();
    assert_eq!(scores, vec![72.0, 72.4, 72.0]);

    assert_eq!(outcome.state, LoopState::Stuck);
    assert_eq!(outcome.iterations, 3);
    assert_eq!(outcome.report.iteration, 2);
    assert_eq!(outcome.report.overall_score(), 72.4);
    assert_eq!(outcome.app.file_count(), 10);

    // history keeps the last score but names the returned version
    assert_eq!(outcome.history.final_score, 72.0);
    assert_eq!(outcome.history.selected_version.as_deref(), Some("v1.1"));
    assert_eq!(outcome.history.selected_score, 72.4);
}

#[tokio::test]
async fn test_budget_exhausted_before_plateau() {
    let reflexion = RefleXionLoop::new(Arc::new(PlateauGenerator), settings(2)).unwrap();
    let outcome = reflexion.run(task_spec()).await.unwrap();

    assert_eq!(outcome.state, LoopState::Exhausted);
    assert_eq!(outcome.iterations, 2);
    assert!(!outcome.reports[1].should_iterate);
    assert!(outcome.report.has_critical_security_issue());
}

#[tokio::test]
async fn test_history_file_matches_outcome() {
    let dir = tempfile::tempdir().unwrap();
    let settings = ReflexionSettings {
        output_dir: Some(dir.path().join("history")),
        ..ReflexionSettings::default()
    };
    let reflexion = RefleXionLoop::new(Arc::new(TemplateGenerator::new()), settings).unwrap();
    let outcome = reflexion.run(task_spec()).await.unwrap();

    let raw = std::fs::read_to_string(dir.path().join("history").join("taskflow_history.json")).unwrap();
    let saved: ImprovementHistory = serde_json::from_str(&raw).unwrap();

    assert_eq!(saved.versions.len(), outcome.iterations as usize);
    assert_eq!(saved.final_score, outcome.report.overall_score());
    assert_eq!(saved.selected_version.as_deref(), Some(outcome.report.version.as_str()));
    assert_eq!(saved.versions[0].version, "v1.0");
    assert_eq!(saved.versions[1].content_hash, outcome.app.content_hash);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn prop_loop_always_terminates(max_iterations in 1u32..8, plateau in any::<bool>()) {
        let generator: Arc<dyn AppGenerator> = if plateau {
            Arc::new(PlateauGenerator)
        } else {
            Arc::new(TemplateGenerator::new())
        };
        let reflexion = RefleXionLoop::new(generator, settings(max_iterations)).unwrap();
        let outcome = tokio_test::block_on(reflexion.run(task_spec())).unwrap();

        prop_assert!(outcome.state.is_terminal());
        prop_assert!(outcome.iterations >= 1);
        prop_assert!(outcome.iterations <= max_iterations);
        prop_assert_eq!(outcome.reports.len(), outcome.iterations as usize);
        prop_assert_eq!(outcome.history.versions.len(), outcome.iterations as usize);
    }
}
