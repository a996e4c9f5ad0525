//! Scaffold templates and the deterministic template generator
//!
//! Templates use `{{Placeholder}}` substitution. Which hardening each file
//! receives is decided solely by the specification's feature flags.

use super::spec::{self as features, ApiEndpoint, AppSpecification, DatabaseEntity};
use super::AppGenerator;
use crate::artifact::GeneratedApp;
use crate::error::{Result, TrinityError};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};

const PACKAGE_JSON: &str = r#"
{
  "name": "{{AppName}}",
  "version": "{{Version}}",
  "description": "{{Description}}",
  "main": "src/app.js",
  "scripts": {
    "start": "node src/app.js"
  },
  "dependencies": {
{{Dependencies}}
  }
}
"#;

const CONFIG_HARDCODED: &str = r#"
module.exports = {
  port: 3000,
  db: {
    host: 'localhost',
    user: 'admin',
    password: 'admin123',
    database: '{{AppName}}',
  },
  jwtSecret: 'changeme-secret',
  allowedOrigins: ['*'],
};
"#;

const CONFIG_ENV: &str = r#"
require('dotenv').config();

module.exports = {
  port: process.env.PORT || 3000,
  db: {
    host: process.env.DB_HOST,
    user: process.env.DB_USER,
    password: process.env.DB_PASSWORD,
    database: process.env.DB_NAME,
  },
  jwtSecret: process.env.JWT_SECRET,
  allowedOrigins: (process.env.ALLOWED_ORIGINS || '').split(','),
};
"#;

const DB: &str = r#"
const { Pool } = require('pg');
const config = require('./config');

module.exports = new Pool(config.db);
"#;

const APP: &str = r#"
const express = require('express');
const cors = require('cors');
const config = require('./config');
{{LoggerImport}}
const routes = require('./routes/api');

const app = express();
app.use(express.json());
{{CorsSetup}}
app.use('/api', routes);

{{ErrorHandler}}

app.listen(config.port, () => {
  {{StartupLog}}
});

module.exports = app;
"#;

const ERROR_HANDLER: &str = r#"
app.use((err, req, res, next) => {
  {{ErrorLog}}
  res.status(err.status || 500).json({ error: 'Internal server error' });
});
"#;

const LOGGER: &str = r#"
const pino = require('pino');

module.exports = pino({ level: process.env.LOG_LEVEL || 'info' });
"#;

const AUTH_MIDDLEWARE: &str = r#"
const jwt = require('jsonwebtoken');
const config = require('../config');

function authenticate(req, res, next) {
  const header = req.headers.authorization || '';
  const bearer = header.replace(/^Bearer /, '');
  try {
    req.user = jwt.verify(bearer, config.jwtSecret);
    next();
  } catch (err) {
    res.status(401).json({ error: 'Unauthorized' });
  }
}

module.exports = { authenticate };
"#;

const AUDIT: &str = r#"
const pool = require('./db');

function record(req, action) {
  const actor = req.user ? req.user.id : null;
  return pool.query(
    'INSERT INTO audit_log (actor_id, action, created_at) VALUES ($1, $2, NOW())',
    [actor, action],
  );
}

module.exports = { record };
"#;

const MODEL_PARAMETERIZED: &str = r#"
const pool = require('../db');
{{HashImport}}

function listAll() {
  return pool.query('SELECT {{Columns}} FROM {{Table}} ORDER BY id').then((r) => r.rows);
}

function list(limit, offset) {
  return pool.query('SELECT {{Columns}} FROM {{Table}} ORDER BY id LIMIT $1 OFFSET $2', [limit, offset]).then((r) => r.rows);
}

function get(id) {
  return pool.query('SELECT {{Columns}} FROM {{Table}} WHERE id = $1', [id]).then((r) => r.rows[0]);
}

function create(data) {
  return pool.query('INSERT INTO {{Table}} ({{FieldList}}) VALUES ({{Placeholders}}) RETURNING id', [{{Values}}]).then((r) => r.rows[0]);
}

function update(id, data) {
  return pool.query('UPDATE {{Table}} SET {{Assignments}} WHERE id = ${{IdParam}}', [{{Values}}, id]);
}

function remove(id) {
  return pool.query('DELETE FROM {{Table}} WHERE id = $1', [id]);
}

module.exports = { listAll, list, get, create, update, remove };
"#;

const MODEL_INTERPOLATED: &str = r#"
const pool = require('../db');
{{HashImport}}

function listAll() {
  return pool.query(`SELECT {{Columns}} FROM {{Table}} ORDER BY id`).then((r) => r.rows);
}

function list(limit, offset) {
  return pool.query(`SELECT {{Columns}} FROM {{Table}} ORDER BY id LIMIT ${limit} OFFSET ${offset}`).then((r) => r.rows);
}

function get(id) {
  return pool.query(`SELECT {{Columns}} FROM {{Table}} WHERE id = ${id}`).then((r) => r.rows[0]);
}

function create(data) {
  return pool.query(`INSERT INTO {{Table}} ({{FieldList}}) VALUES ({{Values}}) RETURNING id`).then((r) => r.rows[0]);
}

function update(id, data) {
  return pool.query(`UPDATE {{Table}} SET {{Assignments}} WHERE id = ${id}`);
}

function remove(id) {
  return pool.query(`DELETE FROM {{Table}} WHERE id = ${id}`);
}

module.exports = { listAll, list, get, create, update, remove };
"#;

const ROUTES: &str = r#"
const express = require('express');
{{Imports}}

const router = express.Router();

{{Routes}}

module.exports = router;
"#;

const GDPR_CONSENT: &str = r#"
// Consent management
function recordConsent(userId, purpose) {
  return pool.query('INSERT INTO consents (user_id, purpose, granted_at) VALUES ($1, $2, NOW())', [userId, purpose]);
}
"#;

const GDPR_EXPORT: &str = r#"
// Data export (right to portability)
function exportUserData(userId) {
  return pool.query('SELECT row_to_json(u) AS data FROM users u WHERE u.id = $1', [userId]).then((r) => r.rows[0]);
}
"#;

const GDPR_ERASURE: &str = r#"
// Right to erasure
function eraseUserData(userId) {
  return pool.query('DELETE FROM users WHERE id = $1', [userId]);
}
"#;

const ENV_EXAMPLE: &str = r#"
PORT=3000
DB_HOST=localhost
DB_USER=app
DB_PASSWORD=
DB_NAME={{AppName}}
JWT_SECRET=
ALLOWED_ORIGINS=http://localhost:5173
LOG_LEVEL=info
"#;

const README: &str = r#"
# {{AppName}}

{{Description}}

## Setup

```sh
npm install
psql "$DATABASE_URL" < db/schema.sql
npm start
```

{{ApiDocs}}
"#;

/// Named scaffold templates
pub struct TemplateLibrary {
    templates: HashMap<String, String>,
}

impl TemplateLibrary {
    pub fn new() -> Self {
        let templates = [
            ("package_json", PACKAGE_JSON),
            ("config_hardcoded", CONFIG_HARDCODED),
            ("config_env", CONFIG_ENV),
            ("db", DB),
            ("app", APP),
            ("error_handler", ERROR_HANDLER),
            ("logger", LOGGER),
            ("auth_middleware", AUTH_MIDDLEWARE),
            ("audit", AUDIT),
            ("model_parameterized", MODEL_PARAMETERIZED),
            ("model_interpolated", MODEL_INTERPOLATED),
            ("routes", ROUTES),
            ("gdpr_consent", GDPR_CONSENT),
            ("gdpr_export", GDPR_EXPORT),
            ("gdpr_erasure", GDPR_ERASURE),
            ("env_example", ENV_EXAMPLE),
            ("readme", README),
        ]
        .into_iter()
        .map(|(name, body)| (name.to_string(), body.trim_start().to_string()))
        .collect();

        Self { templates }
    }

    pub fn get_template(&self, name: &str) -> Option<&String> {
        self.templates.get(name)
    }

    /// Replace or add a template
    pub fn add_template(&mut self, name: String, template: String) {
        self.templates.insert(name, template);
    }

    /// Render `name` with `{{Key}}` substitutions
    pub fn render(&self, name: &str, vars: &[(&str, String)]) -> Result<String> {
        let template = self
            .get_template(name)
            .ok_or_else(|| TrinityError::Generation(format!("unknown template '{}'", name)))?;

        let mut out = template.clone();
        for (key, value) in vars {
            out = out.replace(&format!("{{{{{}}}}}", key), value);
        }
        Ok(tidy(&out))
    }
}

impl Default for TemplateLibrary {
    fn default() -> Self {
        Self::new()
    }
}

/// Strip trailing whitespace and collapse runs of blank lines
fn tidy(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut previous_blank = false;
    for line in text.lines() {
        let blank = line.trim().is_empty();
        if blank && previous_blank {
            continue;
        }
        previous_blank = blank;
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}

fn model_var(table: &str) -> String {
    let mut chars = table.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Deterministic Express/PostgreSQL scaffold renderer
pub struct TemplateGenerator {
    library: TemplateLibrary,
}

impl TemplateGenerator {
    pub fn new() -> Self {
        Self::with_library(TemplateLibrary::new())
    }

    pub fn with_library(library: TemplateLibrary) -> Self {
        Self { library }
    }

    /// Render every file for `spec`
    pub fn render(&self, spec: &AppSpecification, iteration: u32) -> Result<GeneratedApp> {
        let mut files = BTreeMap::new();
        let auth_guarded = |e: &ApiEndpoint| {
            e.requires_auth || (spec.has_feature(features::STRICT_AUTHENTICATION) && e.is_mutating())
        };
        let uses_auth = spec.api_endpoints.iter().any(|e| auth_guarded(e));
        let audited = spec.has_feature(features::AUDIT_LOGGING);
        let logging = spec.has_feature(features::STRUCTURED_LOGGING);

        files.insert(
            "package.json".to_string(),
            self.library.render(
                "package_json",
                &[
                    ("AppName", spec.name.clone()),
                    ("Version", format!("1.{}.0", iteration.saturating_sub(1))),
                    ("Description", spec.description.replace('"', "'")),
                    ("Dependencies", self.dependencies(spec, uses_auth)),
                ],
            )?,
        );

        let config = if spec.has_feature(features::ENVIRONMENT_SECRETS) {
            "config_env"
        } else {
            "config_hardcoded"
        };
        files.insert(
            "src/config.js".to_string(),
            self.library.render(config, &[("AppName", spec.name.clone())])?,
        );
        files.insert("src/db.js".to_string(), self.library.render("db", &[])?);
        files.insert("src/app.js".to_string(), self.app_js(spec, logging)?);

        if logging {
            files.insert("src/logger.js".to_string(), self.library.render("logger", &[])?);
        }
        if uses_auth {
            files.insert(
                "src/middleware/auth.js".to_string(),
                self.library.render("auth_middleware", &[])?,
            );
        }
        if audited {
            files.insert("src/audit.js".to_string(), self.library.render("audit", &[])?);
        }

        for entity in &spec.database_entities {
            files.insert(
                format!("src/models/{}.js", entity.name),
                self.model_js(spec, entity)?,
            );
        }

        files.insert(
            "src/routes/api.js".to_string(),
            self.routes_js(spec, &auth_guarded, uses_auth, audited)?,
        );

        if let Some(gdpr) = self.gdpr_js(spec)? {
            files.insert("src/compliance/gdpr.js".to_string(), gdpr);
        }

        let schema = self.schema_sql(spec);
        files.insert("db/schema.sql".to_string(), schema.clone());

        let docs = api_docs(&spec.api_endpoints);
        if spec.has_feature(features::ENV_EXAMPLE_FILE) {
            files.insert(
                ".env.example".to_string(),
                self.library.render("env_example", &[("AppName", spec.name.clone())])?,
            );
        }
        if spec.has_feature(features::README_DOCS) {
            files.insert(
                "README.md".to_string(),
                self.library.render(
                    "readme",
                    &[
                        ("AppName", spec.name.clone()),
                        ("Description", spec.description.clone()),
                        ("ApiDocs", docs.clone()),
                    ],
                )?,
            );
        }

        Ok(GeneratedApp::new(spec.name.clone(), files, schema, docs))
    }

    fn dependencies(&self, spec: &AppSpecification, uses_auth: bool) -> String {
        let mut deps = vec![("cors", "^2.8.5"), ("express", "^4.19.2"), ("pg", "^8.11.3")];
        if spec.has_feature(features::BCRYPT_PASSWORD_HASHING) {
            deps.push(("bcrypt", "^5.1.1"));
        }
        if spec.has_feature(features::ENVIRONMENT_SECRETS) {
            deps.push(("dotenv", "^16.4.5"));
        }
        if uses_auth {
            deps.push(("jsonwebtoken", "^9.0.2"));
        }
        if spec.has_feature(features::STRUCTURED_LOGGING) {
            deps.push(("pino", "^9.0.0"));
        }
        deps.sort();
        deps.iter()
            .map(|(name, version)| format!("    \"{}\": \"{}\"", name, version))
            .collect::<Vec<_>>()
            .join(",\n")
    }

    fn app_js(&self, spec: &AppSpecification, logging: bool) -> Result<String> {
        let cors = if spec.has_feature(features::STRICT_CORS) {
            "app.use(cors({ origin: config.allowedOrigins }));"
        } else {
            "app.use(cors());"
        };

        let error_handler = if spec.has_feature(features::STRUCTURED_ERROR_HANDLING) {
            let log = if logging {
                "logger.error({ err }, 'Request failed');"
            } else {
                "console.error(err);"
            };
            self.library.render("error_handler", &[("ErrorLog", log.to_string())])?
        } else {
            String::new()
        };

        let (import, startup) = if logging {
            (
                "const logger = require('./logger');",
                "logger.info({ port: config.port }, 'Server listening');",
            )
        } else {
            ("", "console.log(`Server listening on port ${config.port}`);")
        };

        self.library.render(
            "app",
            &[
                ("LoggerImport", import.to_string()),
                ("CorsSetup", cors.to_string()),
                ("ErrorHandler", error_handler),
                ("StartupLog", startup.to_string()),
            ],
        )
    }

    fn model_js(&self, spec: &AppSpecification, entity: &DatabaseEntity) -> Result<String> {
        let parameterized = spec.has_feature(features::PARAMETERIZED_QUERIES);
        let hashing = spec.has_feature(features::BCRYPT_PASSWORD_HASHING)
            && entity.fields.iter().any(|f| f.name == "password");

        let columns = if spec.has_feature(features::EXPLICIT_COLUMN_SELECTION) {
            std::iter::once("id")
                .chain(entity.fields.iter().map(|f| f.name.as_str()))
                .collect::<Vec<_>>()
                .join(", ")
        } else {
            "*".to_string()
        };

        let value_of = |name: &str| {
            if hashing && name == "password" {
                "bcrypt.hashSync(data.password, 12)".to_string()
            } else {
                format!("data.{}", name)
            }
        };
        let names: Vec<&str> = entity.fields.iter().map(|f| f.name.as_str()).collect();

        let (template, values, assignments) = if parameterized {
            (
                "model_parameterized",
                names.iter().map(|&n| value_of(n)).collect::<Vec<_>>().join(", "),
                names
                    .iter()
                    .enumerate()
                    .map(|(i, n)| format!("{} = ${}", n, i + 1))
                    .collect::<Vec<_>>()
                    .join(", "),
            )
        } else {
            (
                "model_interpolated",
                names
                    .iter()
                    .map(|&n| format!("'${{{}}}'", value_of(n)))
                    .collect::<Vec<_>>()
                    .join(", "),
                names
                    .iter()
                    .map(|&n| format!("{} = '${{{}}}'", n, value_of(n)))
                    .collect::<Vec<_>>()
                    .join(", "),
            )
        };

        let placeholders = (1..=names.len())
            .map(|i| format!("${}", i))
            .collect::<Vec<_>>()
            .join(", ");
        let hash_import = if hashing {
            "const bcrypt = require('bcrypt');"
        } else {
            ""
        };

        self.library.render(
            template,
            &[
                ("HashImport", hash_import.to_string()),
                ("Columns", columns),
                ("Table", entity.name.clone()),
                ("FieldList", names.join(", ")),
                ("Placeholders", placeholders),
                ("Values", values),
                ("Assignments", assignments),
                ("IdParam", (names.len() + 1).to_string()),
            ],
        )
    }

    fn routes_js(
        &self,
        spec: &AppSpecification,
        auth_guarded: &dyn Fn(&ApiEndpoint) -> bool,
        uses_auth: bool,
        audited: bool,
    ) -> Result<String> {
        let known: Vec<&str> = spec.database_entities.iter().map(|e| e.name.as_str()).collect();
        let mut resources: Vec<&str> = spec
            .api_endpoints
            .iter()
            .map(ApiEndpoint::resource)
            .filter(|r| known.contains(r))
            .collect();
        resources.sort_unstable();
        resources.dedup();

        let mut imports: Vec<String> = resources
            .iter()
            .map(|r| format!("const {} = require('../models/{}');", model_var(r), r))
            .collect();
        if uses_auth {
            imports.push("const { authenticate } = require('../middleware/auth');".to_string());
        }
        if audited {
            imports.push("const audit = require('../audit');".to_string());
        }

        let wrap = spec.has_feature(features::STRUCTURED_ERROR_HANDLING);
        let routes = spec
            .api_endpoints
            .iter()
            .map(|endpoint| {
                let model = known
                    .contains(&endpoint.resource())
                    .then(|| model_var(endpoint.resource()));
                route_js(endpoint, model.as_deref(), auth_guarded(endpoint), audited, wrap)
            })
            .collect::<Vec<_>>()
            .join("\n");

        self.library.render(
            "routes",
            &[("Imports", imports.join("\n")), ("Routes", routes)],
        )
    }

    fn gdpr_js(&self, spec: &AppSpecification) -> Result<Option<String>> {
        let sections = [
            (features::GDPR_CONSENT_MANAGEMENT, "gdpr_consent", "recordConsent"),
            (features::GDPR_DATA_EXPORT, "gdpr_export", "exportUserData"),
            (features::GDPR_RIGHT_TO_ERASURE, "gdpr_erasure", "eraseUserData"),
        ];
        let enabled: Vec<_> = sections
            .iter()
            .filter(|(flag, _, _)| spec.has_feature(flag))
            .collect();
        if enabled.is_empty() {
            return Ok(None);
        }

        let mut out = String::from("const pool = require('../db');\n");
        for (_, template, _) in &enabled {
            out.push('\n');
            out.push_str(&self.library.render(template, &[])?);
        }
        let exports: Vec<&str> = enabled.iter().map(|(_, _, f)| *f).collect();
        out.push_str(&format!("\nmodule.exports = {{ {} }};\n", exports.join(", ")));
        Ok(Some(out))
    }

    fn schema_sql(&self, spec: &AppSpecification) -> String {
        let mut tables: Vec<String> = spec.database_entities.iter().map(table_sql).collect();

        if spec.has_feature(features::GDPR_CONSENT_MANAGEMENT) {
            tables.push(
                "CREATE TABLE consents (\n  id SERIAL PRIMARY KEY,\n  user_id INTEGER REFERENCES users(id),\n  purpose TEXT NOT NULL,\n  granted_at TIMESTAMP NOT NULL\n);\nCREATE INDEX idx_consents_user_id ON consents (user_id);\n"
                    .to_string(),
            );
        }
        if spec.has_feature(features::AUDIT_LOGGING) {
            tables.push(
                "CREATE TABLE audit_log (\n  id SERIAL PRIMARY KEY,\n  actor_id INTEGER,\n  action TEXT NOT NULL,\n  created_at TIMESTAMP NOT NULL\n);\n"
                    .to_string(),
            );
        }

        tables.join("\n")
    }
}

impl Default for TemplateGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AppGenerator for TemplateGenerator {
    async fn generate(&self, spec: &AppSpecification, iteration: u32) -> Result<GeneratedApp> {
        self.render(spec, iteration)
    }
}

fn route_js(
    endpoint: &ApiEndpoint,
    model: Option<&str>,
    guarded: bool,
    audited: bool,
    wrap: bool,
) -> String {
    let method = endpoint.method.to_lowercase();
    let middleware = if guarded { "authenticate, " } else { "" };
    let params = if wrap { "req, res, next" } else { "req, res" };

    let mut body: Vec<String> = Vec::new();
    if audited && endpoint.is_mutating() {
        body.push(format!("await audit.record(req, '{} {}');", endpoint.method, endpoint.path));
    }
    match model {
        None => body.push("res.status(501).json({ error: 'Not implemented' });".to_string()),
        Some(model) => match endpoint.method.as_str() {
            "GET" if endpoint.path.contains(':') => {
                body.push(format!("res.json(await {}.get(req.params.id));", model));
            }
            "GET" if endpoint.pagination => {
                body.push("const limit = Math.min(parseInt(req.query.limit, 10) || 20, 100);".to_string());
                body.push("const offset = parseInt(req.query.offset, 10) || 0;".to_string());
                body.push(format!("res.json(await {}.list(limit, offset));", model));
            }
            "GET" => body.push(format!("res.json(await {}.listAll());", model)),
            "POST" => body.push(format!("res.status(201).json(await {}.create(req.body));", model)),
            "PUT" | "PATCH" => {
                body.push(format!("await {}.update(req.params.id, req.body);", model));
                body.push("res.status(204).end();".to_string());
            }
            "DELETE" => {
                body.push(format!("await {}.remove(req.params.id);", model));
                body.push("res.status(204).end();".to_string());
            }
            _ => body.push("res.status(405).end();".to_string()),
        },
    }

    let mut out = format!(
        "router.{}('{}', {}async ({}) => {{\n",
        method, endpoint.path, middleware, params
    );
    if wrap {
        out.push_str("  try {\n");
        for line in &body {
            out.push_str(&format!("    {}\n", line));
        }
        out.push_str("  } catch (err) {\n    next(err);\n  }\n");
    } else {
        for line in &body {
            out.push_str(&format!("  {}\n", line));
        }
    }
    out.push_str("});\n");
    out
}

fn table_sql(entity: &DatabaseEntity) -> String {
    let mut columns = vec!["  id SERIAL PRIMARY KEY".to_string()];
    for field in &entity.fields {
        columns.push(match &field.foreign_key {
            Some(table) => format!("  {} {} REFERENCES {}(id)", field.name, field.field_type, table),
            None => format!("  {} {} NOT NULL", field.name, field.field_type),
        });
    }

    let mut sql = format!("CREATE TABLE {} (\n{}\n);\n", entity.name, columns.join(",\n"));
    for field in entity.fields.iter().filter(|f| f.foreign_key.is_some() && f.indexed) {
        sql.push_str(&format!(
            "CREATE INDEX idx_{table}_{column} ON {table} ({column});\n",
            table = entity.name,
            column = field.name
        ));
    }
    sql
}

fn api_docs(endpoints: &[ApiEndpoint]) -> String {
    let mut docs = String::from("## API\n\n");
    for endpoint in endpoints {
        let mut notes = Vec::new();
        if endpoint.requires_auth {
            notes.push("auth");
        }
        if endpoint.pagination {
            notes.push("paginated");
        }
        let suffix = if notes.is_empty() {
            String::new()
        } else {
            format!(" ({})", notes.join(", "))
        };
        docs.push_str(&format!("- `{} /api{}`{}\n", endpoint.method, endpoint.path, suffix));
    }
    docs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflection::ReflectionAnalyzer;
    use crate::reflexion::spec::apply_improvements;

    fn spec() -> AppSpecification {
        AppSpecification::task_manager("taskflow", "Task tracking for small teams")
    }

    #[test]
    fn test_render_substitutes_placeholders() {
        let library = TemplateLibrary::new();
        let rendered = library
            .render("env_example", &[("AppName", "taskflow".to_string())])
            .unwrap();
        assert!(rendered.contains("DB_NAME=taskflow"));
        assert!(!rendered.contains("{{"));
    }

    #[test]
    fn test_unknown_template_is_generation_error() {
        let err = TemplateLibrary::new().render("missing", &[]).unwrap_err();
        assert!(matches!(err, TrinityError::Generation(_)));
    }

    #[test]
    fn test_baseline_scaffold_has_known_flaws() {
        let app = TemplateGenerator::new().render(&spec(), 1).unwrap();

        assert!(app.files["src/config.js"].contains("password: 'admin123'"));
        assert!(app.files["src/models/tasks.js"].contains("WHERE id = ${id}"));
        assert!(app.files["src/app.js"].contains("app.use(cors());"));
        assert!(!app.files.contains_key("README.md"));
        assert!(!app.files.contains_key("src/middleware/auth.js"));
        assert_eq!(app.schema, app.files["db/schema.sql"]);
        assert!(app.files["package.json"].contains("\"version\": \"1.0.0\""));
    }

    #[test]
    fn test_no_unrendered_placeholders() {
        let analyzer = ReflectionAnalyzer::new(5, 85.0).unwrap();
        let generator = TemplateGenerator::new();
        let baseline = generator.render(&spec(), 1).unwrap();
        let report = analyzer.analyze_generated_code(&baseline, 1, None);
        let hardened = generator.render(&apply_improvements(&spec(), &report), 2).unwrap();

        for app in [&baseline, &hardened] {
            for (path, body) in &app.files {
                assert!(!body.contains("{{"), "placeholder left in {}", path);
            }
        }
    }

    #[test]
    fn test_hardened_scaffold_is_clean() {
        let analyzer = ReflectionAnalyzer::new(5, 85.0).unwrap();
        let generator = TemplateGenerator::new();

        let first = analyzer.analyze_generated_code(&generator.render(&spec(), 1).unwrap(), 1, None);
        assert!(first.should_iterate);
        assert!(first.has_critical_security_issue());

        let improved = apply_improvements(&spec(), &first);
        let app = generator.render(&improved, 2).unwrap();
        let second = analyzer.analyze_generated_code(&app, 2, Some(&first));

        assert_eq!(second.issue_count(), 0, "remaining: {:?}", second.improvement_suggestions);
        assert_eq!(second.overall_score(), 100.0);
        assert!(app.files["src/models/users.js"].contains("bcrypt.hashSync(data.password, 12)"));
        assert!(app.files["src/routes/api.js"].contains("router.post('/tasks', authenticate, async"));
        assert!(app.schema.contains("CREATE INDEX idx_tasks_user_id ON tasks (user_id);"));
    }

    #[test]
    fn test_generation_is_deterministic() {
        let generator = TemplateGenerator::new();
        let a = generator.render(&spec(), 1).unwrap();
        let b = generator.render(&spec(), 1).unwrap();
        assert_eq!(a.content_hash, b.content_hash);
    }
}
