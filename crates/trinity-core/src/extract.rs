//! Structured extraction from free-form LLM text
//!
//! Strategies are tried in a fixed order; each either yields a JSON value or
//! falls through. When none succeeds the text is mined for bullet items and
//! numeric scores instead.

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;

/// Ordered extraction strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionStrategy {
    /// ```json fenced block
    FencedJson,
    /// Any fenced block whose body parses as JSON
    AnyFence,
    /// The whole trimmed text is JSON
    WholeText,
    /// First brace-balanced `{...}` span that parses
    BalancedObject,
}

impl ExtractionStrategy {
    pub const ORDER: [ExtractionStrategy; 4] = [
        ExtractionStrategy::FencedJson,
        ExtractionStrategy::AnyFence,
        ExtractionStrategy::WholeText,
        ExtractionStrategy::BalancedObject,
    ];

    fn apply(self, text: &str) -> Option<Value> {
        match self {
            ExtractionStrategy::FencedJson => JSON_FENCE
                .captures_iter(text)
                .find_map(|cap| parse_container(&cap[1])),
            ExtractionStrategy::AnyFence => ANY_FENCE
                .captures_iter(text)
                .find_map(|cap| parse_container(&cap[1])),
            ExtractionStrategy::WholeText => parse_container(text),
            ExtractionStrategy::BalancedObject => balanced_objects(text)
                .into_iter()
                .find_map(parse_container),
        }
    }
}

/// What could be recovered from a response
#[derive(Debug, Clone, PartialEq)]
pub enum StructuredShape {
    Json {
        value: Value,
        strategy: ExtractionStrategy,
    },
    Heuristic {
        /// Bullet and numbered lines, markers stripped
        items: Vec<String>,
        /// Numbers written as `N/100` or `N%`
        scores: Vec<f64>,
    },
}

impl StructuredShape {
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            StructuredShape::Json { value, .. } => Some(value),
            StructuredShape::Heuristic { .. } => None,
        }
    }

    /// Bullet items, or string entries of a JSON array when structured
    pub fn items(&self) -> Vec<String> {
        match self {
            StructuredShape::Json { value, .. } => match value {
                Value::Array(entries) => entries
                    .iter()
                    .filter_map(|e| e.as_str().map(str::to_string))
                    .collect(),
                _ => Vec::new(),
            },
            StructuredShape::Heuristic { items, .. } => items.clone(),
        }
    }
}

lazy_static! {
    static ref JSON_FENCE: Regex = Regex::new(r"(?s)```json\s*\n?(.*?)```").unwrap();
    static ref ANY_FENCE: Regex = Regex::new(r"(?s)```[A-Za-z0-9_-]*\s*\n?(.*?)```").unwrap();
    static ref BULLET: Regex = Regex::new(r"^\s*(?:[-*•]|\d+[.)])\s+(.+?)\s*$").unwrap();
    static ref SCORE: Regex = Regex::new(r"(\d{1,3}(?:\.\d+)?)\s*(?:/\s*100\b|%)").unwrap();
}

/// Recover structure from `text`; `None` only for blank input
pub fn extract_structured(text: &str) -> Option<StructuredShape> {
    if text.trim().is_empty() {
        return None;
    }

    for strategy in ExtractionStrategy::ORDER {
        if let Some(value) = strategy.apply(text) {
            return Some(StructuredShape::Json { value, strategy });
        }
    }

    Some(heuristic_extract(text))
}

/// Terminal text-mining fallback
pub fn heuristic_extract(text: &str) -> StructuredShape {
    let items = text
        .lines()
        .filter_map(|line| BULLET.captures(line).map(|cap| cap[1].to_string()))
        .collect();

    let scores = SCORE
        .captures_iter(text)
        .filter_map(|cap| cap[1].parse::<f64>().ok())
        .filter(|v| (0.0..=100.0).contains(v))
        .collect();

    StructuredShape::Heuristic { items, scores }
}

/// Only objects and arrays count as structure
fn parse_container(candidate: &str) -> Option<Value> {
    match serde_json::from_str::<Value>(candidate.trim()) {
        Ok(value @ (Value::Object(_) | Value::Array(_))) => Some(value),
        _ => None,
    }
}

/// Top-level `{...}` spans, respecting string literals and escapes
fn balanced_objects(text: &str) -> Vec<&str> {
    let mut spans = Vec::new();
    let mut depth = 0usize;
    let mut start = None;
    let mut in_string = false;
    let mut escaped = false;

    for (idx, ch) in text.char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match ch {
            '"' if depth > 0 => in_string = true,
            '{' => {
                if depth == 0 {
                    start = Some(idx);
                }
                depth += 1;
            }
            '}' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    if let Some(begin) = start.take() {
                        spans.push(&text[begin..=idx]);
                    }
                }
            }
            _ => {}
        }
    }

    spans
}

/// String array at `key`, or an empty list
pub fn string_list(value: &Value, key: &str) -> Vec<String> {
    value
        .get(key)
        .and_then(Value::as_array)
        .map(|entries| {
            entries
                .iter()
                .filter_map(|e| match e {
                    Value::String(s) => Some(s.clone()),
                    Value::Object(map) => map
                        .get("title")
                        .or_else(|| map.get("name"))
                        .and_then(Value::as_str)
                        .map(str::to_string),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Numeric field at `key`, accepting numbers or numeric strings
pub fn number(value: &Value, key: &str) -> Option<f64> {
    match value.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
