//! Threat pattern catalogue
//!
//! Static scans for prompt injection, malicious intent, code injection and
//! leaked secrets, plus the severity-count ladder that turns a set of threats
//! into a single threat level.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity of a single detected threat
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThreatSeverity {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThreatCategory {
    PromptInjection,
    MaliciousIntent,
    CodeInjection,
    SecretLeak,
}

/// A pattern hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Threat {
    pub name: String,
    pub category: ThreatCategory,
    pub severity: ThreatSeverity,
    pub description: String,
}

/// Aggregate threat level of a concept
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThreatLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl ThreatLevel {
    /// Severity-count ladder, first match wins
    pub fn assess(threats: &[Threat]) -> Self {
        let count = |severity: ThreatSeverity| threats.iter().filter(|t| t.severity == severity).count();
        let critical = count(ThreatSeverity::Critical);
        let high = count(ThreatSeverity::High);
        let medium = count(ThreatSeverity::Medium);

        if critical > 0 || high >= 2 {
            ThreatLevel::Critical
        } else if high >= 1 || medium >= 3 {
            ThreatLevel::High
        } else if medium >= 1 {
            ThreatLevel::Medium
        } else {
            ThreatLevel::Low
        }
    }

    /// Fixed risk table
    pub fn risk_score(self) -> f64 {
        match self {
            ThreatLevel::Critical => 95.0,
            ThreatLevel::High => 75.0,
            ThreatLevel::Medium => 50.0,
            ThreatLevel::Low => 20.0,
        }
    }
}

impl fmt::Display for ThreatLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ThreatLevel::Low => "low",
            ThreatLevel::Medium => "medium",
            ThreatLevel::High => "high",
            ThreatLevel::Critical => "critical",
        };
        f.write_str(label)
    }
}

type PatternTable = Vec<(&'static str, Regex, ThreatSeverity, ThreatCategory)>;

lazy_static! {
    static ref INTENT_PATTERNS: PatternTable = vec![
        (
            "Instruction override",
            Regex::new(r"(?i)ignore\s+(all\s+)?(the\s+)?(previous|prior|above)\s+(instructions|rules|prompts?)").unwrap(),
            ThreatSeverity::Critical,
            ThreatCategory::PromptInjection,
        ),
        (
            "System prompt extraction",
            Regex::new(r"(?i)(reveal|print|show|leak)\s+(me\s+)?(your\s+|the\s+)?system\s+prompt").unwrap(),
            ThreatSeverity::High,
            ThreatCategory::PromptInjection,
        ),
        (
            "Jailbreak attempt",
            Regex::new(r"(?i)\b(jailbreak|dan\s+mode|developer\s+mode\s+enabled)\b").unwrap(),
            ThreatSeverity::High,
            ThreatCategory::PromptInjection,
        ),
        (
            "Role hijack",
            Regex::new(r"(?i)you\s+are\s+now\s+(an?\s+)?(unrestricted|unfiltered|uncensored)").unwrap(),
            ThreatSeverity::High,
            ThreatCategory::PromptInjection,
        ),
        (
            "Malware tooling",
            Regex::new(r"(?i)\b(malware|ransomware|keylogger|botnet|spyware|rootkit)\b").unwrap(),
            ThreatSeverity::Critical,
            ThreatCategory::MaliciousIntent,
        ),
        (
            "Credential theft",
            Regex::new(r"(?i)\b(steal|harvest|exfiltrate)\w*\s+(\w+\s+){0,2}(credentials|passwords|tokens|cookies)").unwrap(),
            ThreatSeverity::Critical,
            ThreatCategory::MaliciousIntent,
        ),
        (
            "Compulsive design aimed at minors",
            Regex::new(r"(?i)(addict\w*|compulsive|infinite[\s-]?scroll|autoplay).{0,80}\b(kids|children|minors|teens)\b|\b(kids|children|minors|teens)\b.{0,80}(addict\w*|compulsive|infinite[\s-]?scroll|autoplay)").unwrap(),
            ThreatSeverity::Critical,
            ThreatCategory::MaliciousIntent,
        ),
        (
            "Phishing",
            Regex::new(r"(?i)\bphishing\b").unwrap(),
            ThreatSeverity::High,
            ThreatCategory::MaliciousIntent,
        ),
        (
            "Security bypass",
            Regex::new(r"(?i)\bbypass\w*\s+(the\s+)?(security|authentication|paywall|drm|2fa)").unwrap(),
            ThreatSeverity::High,
            ThreatCategory::MaliciousIntent,
        ),
        (
            "Covert data collection",
            Regex::new(r"(?i)without\s+(their\s+|the\s+user'?s?\s+|user\s+)?(consent|knowledge|permission)").unwrap(),
            ThreatSeverity::Medium,
            ThreatCategory::MaliciousIntent,
        ),
        (
            "Unauthorised scraping",
            Regex::new(r"(?i)\bscrap\w*\s+(\w+\s+){0,2}(profiles|personal\s+data|contacts)").unwrap(),
            ThreatSeverity::Medium,
            ThreatCategory::MaliciousIntent,
        ),
    ];

    static ref CODE_PATTERNS: PatternTable = vec![
        (
            "AWS key",
            Regex::new(r"AKIA[0-9A-Z]{16}").unwrap(),
            ThreatSeverity::Critical,
            ThreatCategory::SecretLeak,
        ),
        (
            "Private key block",
            Regex::new(r"-----BEGIN (RSA |EC |OPENSSH )?PRIVATE KEY-----").unwrap(),
            ThreatSeverity::Critical,
            ThreatCategory::SecretLeak,
        ),
        (
            "Generic private key",
            Regex::new(r#"(?i)private_key\s*=\s*['"][^'"]+['"]"#).unwrap(),
            ThreatSeverity::Critical,
            ThreatCategory::SecretLeak,
        ),
        (
            "Hardcoded password",
            Regex::new(r#"(?i)password\s*[:=]\s*['"][^'"]+['"]"#).unwrap(),
            ThreatSeverity::High,
            ThreatCategory::SecretLeak,
        ),
        (
            "Embedded API token",
            Regex::new(r#"(?i)(api[_-]?key|secret|token)\s*[:=]\s*['"][A-Za-z0-9_\-]{16,}['"]"#).unwrap(),
            ThreatSeverity::High,
            ThreatCategory::SecretLeak,
        ),
        (
            "Script injection",
            Regex::new(r"(?i)<script\b").unwrap(),
            ThreatSeverity::High,
            ThreatCategory::CodeInjection,
        ),
        (
            "SQL injection payload",
            Regex::new(r"(?i)('\s*or\s+'?1'?\s*=\s*'?1|;\s*drop\s+table|\bunion\s+select\b)").unwrap(),
            ThreatSeverity::High,
            ThreatCategory::CodeInjection,
        ),
        (
            "Shell injection",
            Regex::new(r"(?i)(;\s*rm\s+-rf|\$\(\s*curl|&&\s*wget\s)").unwrap(),
            ThreatSeverity::High,
            ThreatCategory::CodeInjection,
        ),
        (
            "Dynamic evaluation",
            Regex::new(r"(?i)\beval\s*\(").unwrap(),
            ThreatSeverity::Medium,
            ThreatCategory::CodeInjection,
        ),
        (
            "Hardcoded IP address",
            Regex::new(r"\b\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3}\b").unwrap(),
            ThreatSeverity::Low,
            ThreatCategory::SecretLeak,
        ),
    ];
}

/// Stateless pattern scanner
pub struct SecurityScanner;

impl SecurityScanner {
    /// Prompt-injection and malicious-intent scan over free text
    pub fn scan_intent(content: &str) -> Vec<Threat> {
        Self::scan_with(&INTENT_PATTERNS, content)
    }

    /// Code-injection and secret-leak scan
    pub fn scan_code(content: &str) -> Vec<Threat> {
        Self::scan_with(&CODE_PATTERNS, content)
    }

    fn scan_with(patterns: &PatternTable, content: &str) -> Vec<Threat> {
        patterns
            .iter()
            .filter_map(|(name, regex, severity, category)| {
                regex.find(content).map(|m| Threat {
                    name: (*name).to_string(),
                    category: *category,
                    severity: *severity,
                    description: format!("{} detected near \"{}\"", name, excerpt(m.as_str())),
                })
            })
            .collect()
    }
}

fn excerpt(text: &str) -> String {
    const MAX: usize = 60;
    if text.chars().count() <= MAX {
        text.to_string()
    } else {
        let cut: String = text.chars().take(MAX).collect();
        format!("{}...", cut)
    }
}
