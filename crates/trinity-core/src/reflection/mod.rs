//! Reflection Module - static self-critique of generated applications
//!
//! Five independent analyses run over the artifact's file map, each
//! producing typed [`CodeIssue`]s and a sub-score. The sub-scores combine into
//! a fixed weighted overall score carried by [`ReflectionScores`].

pub mod analyzer;
pub mod analyzers;
pub mod rubric;

use crate::types::{round2, Timestamp};
use serde::{Deserialize, Serialize};
use std::fmt;

pub use analyzer::ReflectionAnalyzer;
pub use rubric::ReflectionRubric;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueCategory {
    Security,
    Quality,
    Performance,
    Compliance,
}

/// A single finding in a generated file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeIssue {
    pub severity: Severity,
    pub category: IssueCategory,
    pub file_path: String,
    pub line_number: Option<usize>,
    pub description: String,
    pub suggested_fix: String,
    pub code_snippet: Option<String>,
}

impl CodeIssue {
    pub fn new(
        severity: Severity,
        category: IssueCategory,
        file_path: impl Into<String>,
        description: impl Into<String>,
        suggested_fix: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            category,
            file_path: file_path.into(),
            line_number: None,
            description: description.into(),
            suggested_fix: suggested_fix.into(),
            code_snippet: None,
        }
    }

    /// Attach a 1-based line number and the offending line
    pub fn at_line(mut self, line_number: usize, snippet: &str) -> Self {
        self.line_number = Some(line_number);
        self.code_snippet = Some(snippet.trim().to_string());
        self
    }

    /// `"[severity] path: fix"`
    pub fn suggestion(&self) -> String {
        format!("[{}] {}: {}", self.severity, self.file_path, self.suggested_fix)
    }
}

/// The four sub-scores and their derived overall score.
///
/// Fields are private so the overall score can only come from
/// [`ReflectionScores::new`]; deserialisation recomputes it as well.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "SubScores")]
pub struct ReflectionScores {
    quality: f64,
    security: f64,
    compliance: f64,
    performance: f64,
    overall: f64,
}

#[derive(Deserialize)]
struct SubScores {
    quality: f64,
    security: f64,
    compliance: f64,
    performance: f64,
}

impl From<SubScores> for ReflectionScores {
    fn from(raw: SubScores) -> Self {
        Self::new(raw.quality, raw.security, raw.compliance, raw.performance)
    }
}

impl ReflectionScores {
    /// Clamp each sub-score to [0, 100] (NaN counts as 0), round to 2 decimals and derive overall
    pub fn new(quality: f64, security: f64, compliance: f64, performance: f64) -> Self {
        let bound = |v: f64| if v.is_nan() { 0.0 } else { round2(v.clamp(0.0, 100.0)) };
        let (quality, security, compliance, performance) =
            (bound(quality), bound(security), bound(compliance), bound(performance));
        let overall = ReflectionRubric::v1().overall(quality, security, compliance, performance);

        Self {
            quality,
            security,
            compliance,
            performance,
            overall,
        }
    }

    pub fn quality(&self) -> f64 {
        self.quality
    }

    pub fn security(&self) -> f64 {
        self.security
    }

    pub fn compliance(&self) -> f64 {
        self.compliance
    }

    pub fn performance(&self) -> f64 {
        self.performance
    }

    pub fn overall(&self) -> f64 {
        self.overall
    }
}

/// Result of reflecting on one iteration's artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReflectionReport {
    pub iteration: u32,
    /// `v1.{iteration-1}`
    pub version: String,
    pub scores: ReflectionScores,
    pub security_issues: Vec<CodeIssue>,
    pub quality_issues: Vec<CodeIssue>,
    pub compliance_gaps: Vec<CodeIssue>,
    pub performance_issues: Vec<CodeIssue>,
    pub best_practice_violations: Vec<CodeIssue>,
    /// Top fixes, most severe first
    pub improvement_suggestions: Vec<String>,
    pub improvements_from_previous: Vec<String>,
    pub analysis_duration_ms: u64,
    pub should_iterate: bool,
    pub timestamp: Timestamp,
}

impl ReflectionReport {
    pub fn version_label(iteration: u32) -> String {
        format!("v1.{}", iteration.saturating_sub(1))
    }

    pub fn overall_score(&self) -> f64 {
        self.scores.overall()
    }

    pub fn all_issues(&self) -> impl Iterator<Item = &CodeIssue> {
        self.security_issues
            .iter()
            .chain(&self.quality_issues)
            .chain(&self.compliance_gaps)
            .chain(&self.performance_issues)
            .chain(&self.best_practice_violations)
    }

    pub fn issue_count(&self) -> usize {
        self.all_issues().count()
    }

    /// Critical findings across every list
    pub fn critical_count(&self) -> usize {
        self.all_issues()
            .filter(|i| i.severity == Severity::Critical)
            .count()
    }

    pub fn has_critical_security_issue(&self) -> bool {
        self.security_issues
            .iter()
            .any(|i| i.severity == Severity::Critical)
    }

    pub fn has_high_compliance_gap(&self) -> bool {
        self.compliance_gaps
            .iter()
            .any(|i| i.severity >= Severity::High)
    }
}
