//! Application specification and its improvement fold
//!
//! `spec_{i+1} = apply_improvements(spec_i, report_i)`: a pure function that
//! adds feature flags and field/endpoint toggles, never removes anything.

use crate::reflection::{CodeIssue, ReflectionReport};
use serde::{Deserialize, Serialize};

pub const STRICT_AUTHENTICATION: &str = "strict_authentication";
pub const BCRYPT_PASSWORD_HASHING: &str = "bcrypt_password_hashing";
pub const PARAMETERIZED_QUERIES: &str = "parameterized_queries";
pub const STRICT_CORS: &str = "strict_cors";
pub const ENVIRONMENT_SECRETS: &str = "environment_secrets";

pub const GDPR_CONSENT_MANAGEMENT: &str = "gdpr_consent_management";
pub const GDPR_DATA_EXPORT: &str = "gdpr_data_export";
pub const GDPR_RIGHT_TO_ERASURE: &str = "gdpr_right_to_erasure";
pub const AUDIT_LOGGING: &str = "audit_logging";

pub const STRUCTURED_ERROR_HANDLING: &str = "structured_error_handling";
pub const STRUCTURED_LOGGING: &str = "structured_logging";
pub const EXPLICIT_COLUMN_SELECTION: &str = "explicit_column_selection";
pub const ENV_EXAMPLE_FILE: &str = "env_example_file";
pub const README_DOCS: &str = "readme_docs";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityField {
    pub name: String,
    /// SQL column type
    pub field_type: String,
    /// Referenced table, when this is a foreign key
    pub foreign_key: Option<String>,
    pub indexed: bool,
}

impl EntityField {
    pub fn new(name: impl Into<String>, field_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field_type: field_type.into(),
            foreign_key: None,
            indexed: false,
        }
    }

    pub fn references(mut self, table: impl Into<String>) -> Self {
        self.foreign_key = Some(table.into());
        self
    }
}

/// A table; `id` is implicit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseEntity {
    pub name: String,
    pub fields: Vec<EntityField>,
}

impl DatabaseEntity {
    pub fn new(name: impl Into<String>, fields: Vec<EntityField>) -> Self {
        Self {
            name: name.into(),
            fields,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiEndpoint {
    /// Upper-case HTTP method
    pub method: String,
    pub path: String,
    pub requires_auth: bool,
    pub pagination: bool,
}

impl ApiEndpoint {
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into().to_uppercase(),
            path: path.into(),
            requires_auth: false,
            pagination: false,
        }
    }

    pub fn is_mutating(&self) -> bool {
        matches!(self.method.as_str(), "POST" | "PUT" | "PATCH" | "DELETE")
    }

    /// GET without path parameters
    pub fn is_collection_read(&self) -> bool {
        self.method == "GET" && !self.path.contains(':')
    }

    /// First path segment, e.g. `tasks` for `/tasks/:id`
    pub fn resource(&self) -> &str {
        self.path
            .trim_start_matches('/')
            .split('/')
            .next()
            .unwrap_or_default()
    }
}

/// Recipe for a generated application
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppSpecification {
    pub name: String,
    pub description: String,
    pub compliance_features: Vec<String>,
    pub security_features: Vec<String>,
    pub quality_features: Vec<String>,
    pub database_entities: Vec<DatabaseEntity>,
    pub api_endpoints: Vec<ApiEndpoint>,
}

impl AppSpecification {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            compliance_features: Vec::new(),
            security_features: Vec::new(),
            quality_features: Vec::new(),
            database_entities: Vec::new(),
            api_endpoints: Vec::new(),
        }
    }

    pub fn with_entity(mut self, entity: DatabaseEntity) -> Self {
        self.database_entities.push(entity);
        self
    }

    pub fn with_endpoint(mut self, method: &str, path: &str) -> Self {
        self.api_endpoints.push(ApiEndpoint::new(method, path));
        self
    }

    /// Users and tasks with full CRUD, no hardening
    pub fn task_manager(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(name, description)
            .with_entity(DatabaseEntity::new(
                "users",
                vec![
                    EntityField::new("email", "TEXT"),
                    EntityField::new("password", "TEXT"),
                ],
            ))
            .with_entity(DatabaseEntity::new(
                "tasks",
                vec![
                    EntityField::new("title", "TEXT"),
                    EntityField::new("status", "TEXT"),
                    EntityField::new("user_id", "INTEGER").references("users"),
                ],
            ))
            .with_endpoint("GET", "/users")
            .with_endpoint("POST", "/users")
            .with_endpoint("GET", "/tasks")
            .with_endpoint("GET", "/tasks/:id")
            .with_endpoint("POST", "/tasks")
            .with_endpoint("PUT", "/tasks/:id")
            .with_endpoint("DELETE", "/tasks/:id")
    }

    pub fn has_feature(&self, feature: &str) -> bool {
        self.compliance_features
            .iter()
            .chain(&self.security_features)
            .chain(&self.quality_features)
            .any(|f| f == feature)
    }
}

fn ensure(list: &mut Vec<String>, feature: &str) {
    if !list.iter().any(|f| f == feature) {
        list.push(feature.to_string());
    }
}

fn mentions(issues: &[CodeIssue], keyword: &str) -> bool {
    issues
        .iter()
        .any(|issue| issue.description.to_lowercase().contains(keyword))
}

/// Derive the next specification from the previous one and its report.
///
/// Additive and idempotent: applying the same report twice yields the same
/// specification as applying it once.
pub fn apply_improvements(spec: &AppSpecification, report: &ReflectionReport) -> AppSpecification {
    let mut next = spec.clone();

    let security = &report.security_issues;
    if mentions(security, "authentication") {
        ensure(&mut next.security_features, STRICT_AUTHENTICATION);
        for endpoint in next.api_endpoints.iter_mut().filter(|e| e.is_mutating()) {
            endpoint.requires_auth = true;
        }
    }
    if mentions(security, "password") {
        ensure(&mut next.security_features, BCRYPT_PASSWORD_HASHING);
    }
    if mentions(security, "sql injection") {
        ensure(&mut next.security_features, PARAMETERIZED_QUERIES);
    }
    if mentions(security, "cors") {
        ensure(&mut next.security_features, STRICT_CORS);
    }
    if mentions(security, "hardcoded") || mentions(security, "credential") {
        ensure(&mut next.security_features, ENVIRONMENT_SECRETS);
    }

    let compliance = &report.compliance_gaps;
    if mentions(compliance, "gdpr") {
        for feature in [GDPR_CONSENT_MANAGEMENT, GDPR_DATA_EXPORT, GDPR_RIGHT_TO_ERASURE] {
            ensure(&mut next.compliance_features, feature);
        }
    }
    if mentions(compliance, "audit") {
        ensure(&mut next.compliance_features, AUDIT_LOGGING);
    }

    let performance = &report.performance_issues;
    if mentions(performance, "index") {
        for field in next
            .database_entities
            .iter_mut()
            .flat_map(|e| e.fields.iter_mut())
            .filter(|f| f.foreign_key.is_some())
        {
            field.indexed = true;
        }
    }
    if mentions(performance, "pagination") {
        paginate(&mut next.api_endpoints, performance);
    }
    if mentions(performance, "select *") {
        ensure(&mut next.quality_features, EXPLICIT_COLUMN_SELECTION);
    }

    let quality = &report.quality_issues;
    if mentions(quality, "error handling") {
        ensure(&mut next.quality_features, STRUCTURED_ERROR_HANDLING);
    }
    if mentions(quality, "debug") {
        ensure(&mut next.quality_features, STRUCTURED_LOGGING);
    }
    if mentions(quality, "hardcoded") {
        ensure(&mut next.security_features, ENVIRONMENT_SECRETS);
    }

    let hygiene = &report.best_practice_violations;
    if mentions(hygiene, ".env.example") {
        ensure(&mut next.quality_features, ENV_EXAMPLE_FILE);
    }
    if mentions(hygiene, "readme") {
        ensure(&mut next.quality_features, README_DOCS);
    }

    next
}

/// Paginate the GET endpoints named in the findings, or every collection
/// read when no finding names one
fn paginate(endpoints: &mut [ApiEndpoint], issues: &[CodeIssue]) {
    let named = |endpoint: &ApiEndpoint| {
        let needle = format!("GET {} ", endpoint.path);
        issues.iter().any(|i| i.description.contains(&needle))
    };

    let any_named = endpoints.iter().any(|e| e.method == "GET" && named(e));
    for endpoint in endpoints.iter_mut() {
        let selected = if any_named {
            endpoint.method == "GET" && named(endpoint)
        } else {
            endpoint.is_collection_read()
        };
        if selected {
            endpoint.pagination = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflection::{IssueCategory, ReflectionScores, Severity};
    use crate::types::now;
    use proptest::prelude::*;

    fn issue(category: IssueCategory, description: &str) -> CodeIssue {
        CodeIssue::new(Severity::High, category, "src/app.js", description, "fix")
    }

    fn report(
        security: Vec<CodeIssue>,
        compliance: Vec<CodeIssue>,
        performance: Vec<CodeIssue>,
        quality: Vec<CodeIssue>,
    ) -> ReflectionReport {
        ReflectionReport {
            iteration: 1,
            version: ReflectionReport::version_label(1),
            scores: ReflectionScores::new(50.0, 50.0, 50.0, 50.0),
            security_issues: security,
            quality_issues: quality,
            compliance_gaps: compliance,
            performance_issues: performance,
            best_practice_violations: vec![],
            improvement_suggestions: vec![],
            improvements_from_previous: vec![],
            analysis_duration_ms: 0,
            should_iterate: true,
            timestamp: now(),
        }
    }

    #[test]
    fn test_security_flags() {
        let spec = AppSpecification::task_manager("demo", "Task tracking for small teams");
        let next = apply_improvements(
            &spec,
            &report(
                vec![
                    issue(IssueCategory::Security, "Mutating route without authentication middleware"),
                    issue(IssueCategory::Security, "Password stored without hashing"),
                    issue(IssueCategory::Security, "Possible SQL injection via string interpolation"),
                ],
                vec![],
                vec![],
                vec![],
            ),
        );

        assert!(next.has_feature(STRICT_AUTHENTICATION));
        assert!(next.has_feature(BCRYPT_PASSWORD_HASHING));
        assert!(next.has_feature(PARAMETERIZED_QUERIES));
        assert!(next
            .api_endpoints
            .iter()
            .filter(|e| e.is_mutating())
            .all(|e| e.requires_auth));
        assert!(!spec.has_feature(STRICT_AUTHENTICATION), "input must not change");
    }

    #[test]
    fn test_gdpr_adds_three_flags() {
        let spec = AppSpecification::new("demo", "demo app");
        let next = apply_improvements(
            &spec,
            &report(vec![], vec![issue(IssueCategory::Compliance, "Missing GDPR controls: consent")], vec![], vec![]),
        );
        assert_eq!(
            next.compliance_features,
            vec![GDPR_CONSENT_MANAGEMENT, GDPR_DATA_EXPORT, GDPR_RIGHT_TO_ERASURE]
        );
    }

    #[test]
    fn test_index_marks_foreign_keys() {
        let spec = AppSpecification::task_manager("demo", "demo app");
        let next = apply_improvements(
            &spec,
            &report(vec![], vec![], vec![issue(IssueCategory::Performance, "Foreign key tasks.user_id has no index")], vec![]),
        );
        let tasks = next.database_entities.iter().find(|e| e.name == "tasks").unwrap();
        let user_id = tasks.fields.iter().find(|f| f.name == "user_id").unwrap();
        assert!(user_id.indexed);
        assert!(tasks.fields.iter().filter(|f| f.foreign_key.is_none()).all(|f| !f.indexed));
    }

    #[test]
    fn test_pagination_targets_named_endpoint() {
        let spec = AppSpecification::task_manager("demo", "demo app");
        let next = apply_improvements(
            &spec,
            &report(
                vec![],
                vec![],
                vec![issue(IssueCategory::Performance, "GET /tasks returns an unbounded list without pagination")],
                vec![],
            ),
        );
        let paginated: Vec<_> = next
            .api_endpoints
            .iter()
            .filter(|e| e.pagination)
            .map(|e| e.path.as_str())
            .collect();
        assert_eq!(paginated, vec!["/tasks"]);
    }

    #[test]
    fn test_pagination_falls_back_to_collection_reads() {
        let spec = AppSpecification::task_manager("demo", "demo app");
        let next = apply_improvements(
            &spec,
            &report(vec![], vec![], vec![issue(IssueCategory::Performance, "List endpoints lack pagination")], vec![]),
        );
        let paginated: Vec<_> = next
            .api_endpoints
            .iter()
            .filter(|e| e.pagination)
            .map(|e| e.path.as_str())
            .collect();
        assert_eq!(paginated, vec!["/users", "/tasks"]);
    }

    #[test]
    fn test_endpoint_helpers() {
        let endpoint = ApiEndpoint::new("delete", "/tasks/:id");
        assert_eq!(endpoint.method, "DELETE");
        assert!(endpoint.is_mutating());
        assert!(!endpoint.is_collection_read());
        assert_eq!(endpoint.resource(), "tasks");
    }

    fn arb_issue(category: IssueCategory) -> impl Strategy<Value = CodeIssue> {
        prop::sample::select(vec![
            "Mutating route without authentication middleware",
            "Password stored without hashing",
            "Possible SQL injection via string interpolation",
            "Permissive CORS policy",
            "Hardcoded credentials in source",
            "Missing GDPR controls: consent, erasure",
            "Missing audit logging",
            "Foreign key tasks.user_id has no index",
            "GET /tasks returns an unbounded list without pagination",
            "SELECT * query fetches unused columns",
            "Missing error handling in async code",
            "Debug print statements left in code",
            "Hardcoded endpoint address",
        ])
        .prop_map(move |d| issue(category, d))
    }

    proptest! {
        #[test]
        fn prop_apply_improvements_is_idempotent(
            security in prop::collection::vec(arb_issue(IssueCategory::Security), 0..6),
            compliance in prop::collection::vec(arb_issue(IssueCategory::Compliance), 0..4),
            performance in prop::collection::vec(arb_issue(IssueCategory::Performance), 0..4),
            quality in prop::collection::vec(arb_issue(IssueCategory::Quality), 0..4),
        ) {
            let spec = AppSpecification::task_manager("demo", "demo app");
            let report = report(security, compliance, performance, quality);

            let once = apply_improvements(&spec, &report);
            let twice = apply_improvements(&once, &report);
            prop_assert_eq!(&once, &twice);

            for list in [&once.security_features, &once.compliance_features, &once.quality_features] {
                let mut sorted = list.clone();
                sorted.sort();
                sorted.dedup();
                prop_assert_eq!(sorted.len(), list.len());
            }
        }
    }
}
