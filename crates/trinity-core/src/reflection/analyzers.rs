//! The five static analyses
//!
//! Every analysis is a pure function of the artifact's file map and is
//! independent of the others, so they can run in any order.

use super::{CodeIssue, IssueCategory, Severity};
use crate::artifact::GeneratedApp;
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;

lazy_static! {
    static ref DEBUG_PRINT: Regex = Regex::new(r"\bconsole\.(log|debug)\s*\(|\bprint\s*\(").unwrap();
    static ref HARDCODED_HOST: Regex = Regex::new(r"\blocalhost\b|\b127\.0\.0\.1\b").unwrap();
    static ref HARDCODED_SECRET: Regex = Regex::new(
        r#"(?i)\b(password|passwd|secret|api_?key|token)\b\s*[:=]\s*['"][^'"]{3,}['"]"#
    ).unwrap();
    static ref INTERPOLATED_SQL: Regex = Regex::new(
        r#"(?i)\b(select|insert|update|delete)\b[^;\n]*(\$\{|['"`]\s*\+)"#
    ).unwrap();
    static ref MUTATING_ROUTE: Regex = Regex::new(r"\b(?:router|app)\.(post|put|patch|delete)\s*\(").unwrap();
    static ref PERMISSIVE_CORS: Regex = Regex::new(r#"cors\(\s*\)|origin\s*:\s*['"]\*['"]"#).unwrap();
    static ref SELECT_STAR: Regex = Regex::new(r"(?i)\bselect\s+\*").unwrap();
    static ref LIST_ROUTE: Regex = Regex::new(r#"\b(?:router|app)\.get\s*\(\s*['"]([^'"]+)['"]"#).unwrap();
    static ref ANY_ROUTE: Regex = Regex::new(r"\b(?:router|app)\.(get|post|put|patch|delete)\s*\(").unwrap();
    static ref CREATE_TABLE: Regex = Regex::new(r"(?i)^\s*CREATE\s+TABLE\s+(?:IF\s+NOT\s+EXISTS\s+)?(\w+)").unwrap();
    static ref FOREIGN_KEY: Regex = Regex::new(r"(?i)^\s*(\w+)\s+\w+[^,\n]*\bREFERENCES\s+(\w+)").unwrap();
    static ref CREATE_INDEX: Regex = Regex::new(
        r"(?i)CREATE\s+(?:UNIQUE\s+)?INDEX\s+(?:IF\s+NOT\s+EXISTS\s+)?\w+\s+ON\s+(\w+)\s*\(\s*(\w+)"
    ).unwrap();
}

/// Keywords a GDPR-ready application must mention somewhere
pub const GDPR_KEYWORDS: [&str; 3] = ["consent", "data export", "erasure"];

/// Docs and env templates are never scanned as code
fn is_source(path: &str) -> bool {
    [".js", ".ts", ".py", ".mjs"].iter().any(|ext| path.ends_with(ext))
}

fn sources(app: &GeneratedApp) -> impl Iterator<Item = (&String, &String)> {
    app.files.iter().filter(|(path, _)| is_source(path))
}

/// Lower-cased code and schema; documentation does not count as evidence
fn corpus(app: &GeneratedApp) -> String {
    let mut text = sources(app).map(|(_, body)| body.as_str()).collect::<Vec<_>>().join("\n");
    text.push('\n');
    text.push_str(&app.schema);
    text.to_lowercase()
}

/// Missing error handling, leftover TODOs, debug output, hardcoded endpoints
pub fn analyze_quality(app: &GeneratedApp) -> Vec<CodeIssue> {
    let mut issues = Vec::new();

    for (path, body) in sources(app) {
        if body.contains("async") && !body.contains("catch") {
            issues.push(CodeIssue::new(
                Severity::Medium,
                IssueCategory::Quality,
                path,
                "Missing error handling in async code",
                "Wrap async handlers in try/catch and forward errors to the error middleware",
            ));
        }

        for (idx, line) in body.lines().enumerate() {
            if line.contains("TODO") {
                issues.push(
                    CodeIssue::new(
                        Severity::Low,
                        IssueCategory::Quality,
                        path,
                        "Leftover TODO marker",
                        "Resolve or remove the TODO before release",
                    )
                    .at_line(idx + 1, line),
                );
            }
        }

        if let Some((idx, line)) = body.lines().enumerate().find(|(_, l)| DEBUG_PRINT.is_match(l)) {
            issues.push(
                CodeIssue::new(
                    Severity::Low,
                    IssueCategory::Quality,
                    path,
                    "Debug print statements left in code",
                    "Replace debug output with a structured logger",
                )
                .at_line(idx + 1, line),
            );
        }

        if let Some((idx, line)) = body.lines().enumerate().find(|(_, l)| HARDCODED_HOST.is_match(l)) {
            issues.push(
                CodeIssue::new(
                    Severity::Medium,
                    IssueCategory::Quality,
                    path,
                    "Hardcoded endpoint address",
                    "Read hosts and ports from environment variables",
                )
                .at_line(idx + 1, line),
            );
        }
    }

    issues
}

/// Credentials, SQL interpolation, unauthenticated writes, plain passwords, CORS
pub fn analyze_security(app: &GeneratedApp) -> Vec<CodeIssue> {
    let mut issues = Vec::new();

    for (path, body) in sources(app) {
        if let Some((idx, line)) = body.lines().enumerate().find(|(_, l)| HARDCODED_SECRET.is_match(l)) {
            issues.push(
                CodeIssue::new(
                    Severity::Critical,
                    IssueCategory::Security,
                    path,
                    "Hardcoded credentials in source",
                    "Load secrets from environment variables",
                )
                .at_line(idx + 1, line),
            );
        }

        if let Some((idx, line)) = body.lines().enumerate().find(|(_, l)| INTERPOLATED_SQL.is_match(l)) {
            issues.push(
                CodeIssue::new(
                    Severity::Critical,
                    IssueCategory::Security,
                    path,
                    "Possible SQL injection via string interpolation",
                    "Use parameterized queries",
                )
                .at_line(idx + 1, line),
            );
        }

        for (idx, line) in body.lines().enumerate() {
            if MUTATING_ROUTE.is_match(line) && !line.contains("authenticate") {
                issues.push(
                    CodeIssue::new(
                        Severity::High,
                        IssueCategory::Security,
                        path,
                        "Mutating route without authentication middleware",
                        "Add the authenticate middleware to every write route",
                    )
                    .at_line(idx + 1, line),
                );
            }
        }

        if path.starts_with("src/models/") {
            let lower = body.to_lowercase();
            if lower.contains("password") && !lower.contains("bcrypt") && !lower.contains("argon2") {
                issues.push(CodeIssue::new(
                    Severity::Critical,
                    IssueCategory::Security,
                    path,
                    "Password stored without hashing",
                    "Hash passwords with bcrypt before storage",
                ));
            }
        }

        if let Some((idx, line)) = body.lines().enumerate().find(|(_, l)| PERMISSIVE_CORS.is_match(l)) {
            issues.push(
                CodeIssue::new(
                    Severity::Medium,
                    IssueCategory::Security,
                    path,
                    "Permissive CORS policy",
                    "Restrict CORS to an explicit list of allowed origins",
                )
                .at_line(idx + 1, line),
            );
        }
    }

    issues
}

/// GDPR controls and audit logging, judged on the whole application
pub fn analyze_compliance(app: &GeneratedApp) -> Vec<CodeIssue> {
    let text = corpus(app);
    let mut issues = Vec::new();

    let missing: Vec<&str> = GDPR_KEYWORDS
        .iter()
        .copied()
        .filter(|keyword| !text.contains(keyword))
        .collect();
    if !missing.is_empty() {
        issues.push(CodeIssue::new(
            Severity::High,
            IssueCategory::Compliance,
            "src/",
            format!("Missing GDPR controls: {}", missing.join(", ")),
            "Add consent management, data export and right-to-erasure endpoints",
        ));
    }

    if !text.contains("audit") {
        issues.push(CodeIssue::new(
            Severity::High,
            IssueCategory::Compliance,
            "src/",
            "Missing audit logging",
            "Record an audit trail for every data-changing operation",
        ));
    }

    issues
}

/// Unindexed foreign keys, `SELECT *`, unbounded list endpoints
pub fn analyze_performance(app: &GeneratedApp) -> Vec<CodeIssue> {
    let mut issues = Vec::new();

    let sql_files: Vec<(&String, &String)> =
        app.files.iter().filter(|(p, _)| p.ends_with(".sql")).collect();
    for (path, body) in &sql_files {
        issues.extend(unindexed_foreign_keys(path, body));
    }
    if !app.schema.is_empty() && !sql_files.iter().any(|(_, body)| **body == app.schema) {
        issues.extend(unindexed_foreign_keys("schema", &app.schema));
    }

    for (path, body) in sources(app) {
        if let Some((idx, line)) = body.lines().enumerate().find(|(_, l)| SELECT_STAR.is_match(l)) {
            issues.push(
                CodeIssue::new(
                    Severity::Low,
                    IssueCategory::Performance,
                    path,
                    "SELECT * query fetches unused columns",
                    "Select explicit columns",
                )
                .at_line(idx + 1, line),
            );
        }

        for caps in LIST_ROUTE.captures_iter(body) {
            let route = &caps[1];
            if route.contains(':') {
                continue;
            }
            let Some(whole) = caps.get(0) else {
                continue;
            };
            let rest = &body[whole.end()..];
            let handler_end = ANY_ROUTE.find(rest).map(|m| m.start()).unwrap_or(rest.len());
            if !rest[..handler_end].contains("limit") {
                issues.push(CodeIssue::new(
                    Severity::Medium,
                    IssueCategory::Performance,
                    path,
                    format!("GET {} returns an unbounded list without pagination", route),
                    "Add limit/offset pagination",
                ));
            }
        }
    }

    issues
}

fn unindexed_foreign_keys(path: &str, sql: &str) -> Vec<CodeIssue> {
    let indexed: HashSet<(String, String)> = CREATE_INDEX
        .captures_iter(sql)
        .map(|c| (c[1].to_lowercase(), c[2].to_lowercase()))
        .collect();

    let mut table = String::new();
    let mut issues = Vec::new();
    for (idx, line) in sql.lines().enumerate() {
        if let Some(c) = CREATE_TABLE.captures(line) {
            table = c[1].to_lowercase();
            continue;
        }
        if let Some(c) = FOREIGN_KEY.captures(line) {
            let column = c[1].to_lowercase();
            if !indexed.contains(&(table.clone(), column.clone())) {
                issues.push(
                    CodeIssue::new(
                        Severity::Medium,
                        IssueCategory::Performance,
                        path,
                        format!("Foreign key {}.{} has no index", table, column),
                        format!("Create an index on {}({})", table, column),
                    )
                    .at_line(idx + 1, line),
                );
            }
        }
    }
    issues
}

/// Repository hygiene: `.env.example` and README
pub fn analyze_best_practices(app: &GeneratedApp) -> Vec<CodeIssue> {
    let mut issues = Vec::new();

    if !app.has_file(|p| p.ends_with(".env.example")) {
        issues.push(CodeIssue::new(
            Severity::Low,
            IssueCategory::Quality,
            ".env.example",
            "Missing .env.example file",
            "Document required environment variables in .env.example",
        ));
    }

    if !app.has_file(|p| p.to_lowercase().ends_with("readme.md")) {
        issues.push(CodeIssue::new(
            Severity::Low,
            IssueCategory::Quality,
            "README.md",
            "Missing README documentation",
            "Add a README with setup and usage instructions",
        ));
    }

    issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn app(entries: &[(&str, &str)]) -> GeneratedApp {
        let files: BTreeMap<String, String> = entries
            .iter()
            .map(|(p, b)| (p.to_string(), b.to_string()))
            .collect();
        GeneratedApp::new("demo", files, "", "")
    }

    #[test]
    fn test_quality_findings() {
        let issues = analyze_quality(&app(&[(
            "src/routes/api.js",
            "router.get('/x', async (req, res) => {\n  // TODO: validate\n  console.log('hit');\n  fetch('http://localhost:3000');\n});\n",
        )]));

        let descriptions: Vec<_> = issues.iter().map(|i| i.description.as_str()).collect();
        assert!(descriptions.contains(&"Missing error handling in async code"));
        assert!(descriptions.contains(&"Leftover TODO marker"));
        assert!(descriptions.contains(&"Debug print statements left in code"));
        assert!(descriptions.contains(&"Hardcoded endpoint address"));

        let todo = issues.iter().find(|i| i.description.contains("TODO")).unwrap();
        assert_eq!(todo.line_number, Some(2));
    }

    #[test]
    fn test_async_with_catch_is_clean() {
        let issues = analyze_quality(&app(&[(
            "src/routes/api.js",
            "router.get('/x', async (req, res, next) => {\n  try { res.json(1); } catch (err) { next(err); }\n});\n",
        )]));
        assert!(issues.is_empty());
    }

    #[test]
    fn test_security_findings() {
        let issues = analyze_security(&app(&[
            ("src/config.js", "module.exports = { password: 'admin123' };\n"),
            ("src/models/users.js", "pool.query(`SELECT id FROM users WHERE email = '${email}'`);\nconst row = { password: data.password };\n"),
            ("src/routes/api.js", "router.post('/users', async (req, res) => {});\nrouter.delete('/users/:id', authenticate, async (req, res) => {});\n"),
            ("src/app.js", "app.use(cors());\n"),
        ]));

        let count = |needle: &str| issues.iter().filter(|i| i.description.contains(needle)).count();
        assert_eq!(count("Hardcoded credentials"), 1);
        assert_eq!(count("SQL injection"), 1);
        assert_eq!(count("authentication"), 1);
        assert_eq!(count("Password stored"), 1);
        assert_eq!(count("CORS"), 1);

        let creds = issues.iter().find(|i| i.description.contains("Hardcoded")).unwrap();
        assert_eq!(creds.severity, Severity::Critical);
    }

    #[test]
    fn test_parameterized_and_hashed_is_clean() {
        let issues = analyze_security(&app(&[
            ("src/config.js", "module.exports = { password: process.env.DB_PASSWORD };\n"),
            ("src/models/users.js", "const bcrypt = require('bcrypt');\npool.query('INSERT INTO users (password) VALUES ($1)', [bcrypt.hashSync(data.password, 12)]);\n"),
            ("src/app.js", "app.use(cors({ origin: allowed }));\n"),
        ]));
        assert!(issues.is_empty(), "unexpected: {:?}", issues);
    }

    #[test]
    fn test_compliance_lists_missing_gdpr_controls() {
        let issues = analyze_compliance(&app(&[("src/gdpr.js", "// consent tracking\n")]));
        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].description, "Missing GDPR controls: data export, erasure");
        assert_eq!(issues[0].severity, Severity::High);
        assert_eq!(issues[1].description, "Missing audit logging");
    }

    #[test]
    fn test_foreign_key_index_detection() {
        let sql = "CREATE TABLE tasks (\n  id SERIAL PRIMARY KEY,\n  user_id INTEGER REFERENCES users(id),\n  project_id INTEGER REFERENCES projects(id)\n);\nCREATE INDEX idx_tasks_user_id ON tasks (user_id);\n";
        let issues = analyze_performance(&app(&[("db/schema.sql", sql)]));
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].description, "Foreign key tasks.project_id has no index");
        assert_eq!(issues[0].line_number, Some(4));
    }

    #[test]
    fn test_schema_blob_is_checked_for_indexes() {
        let sql = "CREATE TABLE tasks (\n  id SERIAL PRIMARY KEY,\n  user_id INTEGER REFERENCES users(id)\n);\n";
        let schema_only = GeneratedApp::new("demo", BTreeMap::new(), sql, "");
        let issues = analyze_performance(&schema_only);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].file_path, "schema");
        assert_eq!(issues[0].description, "Foreign key tasks.user_id has no index");

        // the same text shipped as a file is reported once
        let files: BTreeMap<String, String> =
            [("db/schema.sql".to_string(), sql.to_string())].into_iter().collect();
        let both = GeneratedApp::new("demo", files, sql, "");
        let issues = analyze_performance(&both);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].file_path, "db/schema.sql");
    }

    #[test]
    fn test_pagination_detection() {
        let routes = "router.get('/tasks', async (req, res) => {\n  res.json(await Tasks.listAll());\n});\nrouter.get('/users', async (req, res) => {\n  const limit = 20;\n  res.json(await Users.list(limit, 0));\n});\nrouter.get('/tasks/:id', async (req, res) => {});\n";
        let issues = analyze_performance(&app(&[("src/routes/api.js", routes)]));
        let pagination: Vec<_> = issues
            .iter()
            .filter(|i| i.description.contains("pagination"))
            .collect();
        assert_eq!(pagination.len(), 1);
        assert!(pagination[0].description.starts_with("GET /tasks "));
    }

    #[test]
    fn test_best_practices() {
        assert_eq!(analyze_best_practices(&app(&[("src/app.js", "")])).len(), 2);
        assert!(analyze_best_practices(&app(&[(".env.example", ""), ("README.md", "")])).is_empty());
    }
}
