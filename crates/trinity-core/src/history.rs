//! Version tracking for the RefleXion loop
//!
//! One append-only snapshot per completed iteration, plus an aggregate
//! improvement summary. Only [`VersionTracker::record`] appends.

use crate::artifact::GeneratedApp;
use crate::error::{Result, ResultExt};
use crate::reflection::ReflectionReport;
use crate::types::{now, round2, Timestamp};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Snapshot of one iteration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionMetadata {
    pub version: String,
    pub iteration: u32,
    pub timestamp: Timestamp,
    pub quality_score: f64,
    pub security_score: f64,
    pub compliance_score: f64,
    pub performance_score: f64,
    pub overall_score: f64,
    pub security_issues: usize,
    /// Quality findings plus best-practice violations
    pub quality_issues: usize,
    pub compliance_gaps: usize,
    pub performance_issues: usize,
    pub improvements: Vec<String>,
    pub file_count: usize,
    pub lines_of_code: usize,
    pub content_hash: String,
}

/// Aggregate record per application
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImprovementHistory {
    pub app_name: String,
    pub versions: Vec<VersionMetadata>,
    pub initial_score: f64,
    /// Score of the last iteration run
    pub final_score: f64,
    /// Version the loop handed back; differs from the last one when a
    /// stuck or exhausted run falls back to an earlier, better artifact
    #[serde(default)]
    pub selected_version: Option<String>,
    #[serde(default)]
    pub selected_score: f64,
    /// `(final - initial) / initial * 100`, 0 when initial is 0
    pub improvement_percentage: f64,
    pub started_at: Timestamp,
    pub finished_at: Timestamp,
    pub total_duration_seconds: f64,
}

/// Records every iteration of one loop run
#[derive(Debug, Clone)]
pub struct VersionTracker {
    app_name: String,
    versions: Vec<VersionMetadata>,
    selected: Option<usize>,
    started_at: Timestamp,
}

impl VersionTracker {
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
            versions: Vec::new(),
            selected: None,
            started_at: now(),
        }
    }

    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    pub fn versions(&self) -> &[VersionMetadata] {
        &self.versions
    }

    /// Append the snapshot for a completed iteration
    pub fn record(&mut self, app: &GeneratedApp, report: &ReflectionReport) -> &VersionMetadata {
        let scores = &report.scores;
        self.versions.push(VersionMetadata {
            version: report.version.clone(),
            iteration: report.iteration,
            timestamp: report.timestamp,
            quality_score: scores.quality(),
            security_score: scores.security(),
            compliance_score: scores.compliance(),
            performance_score: scores.performance(),
            overall_score: scores.overall(),
            security_issues: report.security_issues.len(),
            quality_issues: report.quality_issues.len() + report.best_practice_violations.len(),
            compliance_gaps: report.compliance_gaps.len(),
            performance_issues: report.performance_issues.len(),
            improvements: report.improvements_from_previous.clone(),
            file_count: app.file_count(),
            lines_of_code: app.lines_of_code(),
            content_hash: app.content_hash.clone(),
        });

        let latest = &self.versions[self.versions.len() - 1];
        tracing::debug!(
            app = %self.app_name,
            version = %latest.version,
            overall = latest.overall_score,
            "Version recorded"
        );
        latest
    }

    /// Mark the iteration whose artifact the run returns; unknown iterations are ignored
    pub fn select(&mut self, iteration: u32) {
        if let Some(idx) = self.versions.iter().position(|v| v.iteration == iteration) {
            self.selected = Some(idx);
        }
    }

    pub fn history(&self) -> ImprovementHistory {
        let initial_score = self.versions.first().map(|v| v.overall_score).unwrap_or(0.0);
        let final_score = self.versions.last().map(|v| v.overall_score).unwrap_or(0.0);
        let selected = self
            .selected
            .and_then(|idx| self.versions.get(idx))
            .or_else(|| self.versions.last());
        let improvement_percentage = if initial_score == 0.0 {
            0.0
        } else {
            round2((final_score - initial_score) / initial_score * 100.0)
        };
        let finished_at = self
            .versions
            .last()
            .map(|v| v.timestamp)
            .unwrap_or(self.started_at)
            .max(self.started_at);

        ImprovementHistory {
            app_name: self.app_name.clone(),
            versions: self.versions.clone(),
            initial_score,
            final_score,
            selected_version: selected.map(|v| v.version.clone()),
            selected_score: selected.map(|v| v.overall_score).unwrap_or(0.0),
            improvement_percentage,
            started_at: self.started_at,
            finished_at,
            total_duration_seconds: (finished_at - self.started_at).num_milliseconds() as f64 / 1000.0,
        }
    }

    /// File the history is written to inside `dir`
    pub fn history_path(&self, dir: impl AsRef<Path>) -> PathBuf {
        let stem: String = self
            .app_name
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        dir.as_ref().join(format!("{}_history.json", stem))
    }

    /// Write `<app>_history.json` into `dir`, creating it if needed
    pub async fn save_json(&self, dir: impl AsRef<Path>) -> Result<PathBuf> {
        let dir = dir.as_ref();
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("cannot create {}", dir.display()))?;

        let path = self.history_path(dir);
        let json = serde_json::to_string_pretty(&self.history())?;
        tokio::fs::write(&path, json)
            .await
            .with_context(|| format!("cannot write {}", path.display()))?;

        tracing::info!(path = %path.display(), versions = self.versions.len(), "History saved");
        Ok(path)
    }
}
