//! Reflection Rubric - weights and deduction tables
//!
//! Each analysis starts from 100 and loses a fixed number of points per
//! finding, by severity. Security findings cost more than the rest.

use super::{CodeIssue, Severity};
use crate::types::round2;
use serde::{Deserialize, Serialize};

/// Points lost per finding, by severity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeductionTable {
    pub critical: f64,
    pub high: f64,
    pub medium: f64,
    pub low: f64,
}

impl DeductionTable {
    pub const SECURITY: DeductionTable = DeductionTable {
        critical: 25.0,
        high: 15.0,
        medium: 8.0,
        low: 3.0,
    };

    pub const STANDARD: DeductionTable = DeductionTable {
        critical: 20.0,
        high: 10.0,
        medium: 5.0,
        low: 2.0,
    };

    pub fn deduction(&self, severity: Severity) -> f64 {
        match severity {
            Severity::Critical => self.critical,
            Severity::High => self.high,
            Severity::Medium => self.medium,
            Severity::Low => self.low,
        }
    }

    /// `max(0, 100 - sum of deductions)`
    pub fn score<'a>(&self, issues: impl IntoIterator<Item = &'a CodeIssue>) -> f64 {
        let lost: f64 = issues
            .into_iter()
            .map(|issue| self.deduction(issue.severity))
            .sum();
        (100.0 - lost).max(0.0)
    }
}

/// Rubric for the overall reflection score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReflectionRubric {
    pub version: String,
    pub quality_weight: f64,
    pub security_weight: f64,
    pub compliance_weight: f64,
    pub performance_weight: f64,
    pub security_deductions: DeductionTable,
    pub standard_deductions: DeductionTable,
}

impl ReflectionRubric {
    /// Rubric v1: 0.3 quality, 0.3 security, 0.2 compliance, 0.2 performance
    pub fn v1() -> Self {
        Self {
            version: "1.0".to_string(),
            quality_weight: 0.3,
            security_weight: 0.3,
            compliance_weight: 0.2,
            performance_weight: 0.2,
            security_deductions: DeductionTable::SECURITY,
            standard_deductions: DeductionTable::STANDARD,
        }
    }

    /// Weighted overall score, rounded to two decimals
    pub fn overall(&self, quality: f64, security: f64, compliance: f64, performance: f64) -> f64 {
        round2(
            quality * self.quality_weight
                + security * self.security_weight
                + compliance * self.compliance_weight
                + performance * self.performance_weight,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflection::IssueCategory;

    fn issue(severity: Severity) -> CodeIssue {
        CodeIssue::new(severity, IssueCategory::Security, "src/app.js", "finding", "fix")
    }

    #[test]
    fn test_weights_sum_to_one() {
        let rubric = ReflectionRubric::v1();
        let total = rubric.quality_weight
            + rubric.security_weight
            + rubric.compliance_weight
            + rubric.performance_weight;
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_security_deductions() {
        let issues = vec![issue(Severity::Critical), issue(Severity::Medium)];
        assert_eq!(DeductionTable::SECURITY.score(&issues), 67.0);
        assert_eq!(DeductionTable::STANDARD.score(&issues), 75.0);
    }

    #[test]
    fn test_score_floors_at_zero() {
        let issues: Vec<_> = (0..6).map(|_| issue(Severity::Critical)).collect();
        assert_eq!(DeductionTable::SECURITY.score(&issues), 0.0);
    }

    #[test]
    fn test_overall_matches_worked_example() {
        assert_eq!(ReflectionRubric::v1().overall(90.0, 40.0, 90.0, 90.0), 75.0);
    }
}
