//! Generated application bundle

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One generated application: file path to literal text, plus schema and docs.
///
/// Paths are opaque strings; the analyzer matches them by prefix, suffix or
/// substring only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedApp {
    pub name: String,
    pub files: BTreeMap<String, String>,
    pub schema: String,
    pub docs: String,
    /// blake3 digest over every path and body, in path order
    pub content_hash: String,
}

impl GeneratedApp {
    pub fn new(
        name: impl Into<String>,
        files: BTreeMap<String, String>,
        schema: impl Into<String>,
        docs: impl Into<String>,
    ) -> Self {
        let content_hash = Self::hash_files(&files);
        Self {
            name: name.into(),
            files,
            schema: schema.into(),
            docs: docs.into(),
            content_hash,
        }
    }

    fn hash_files(files: &BTreeMap<String, String>) -> String {
        let mut hasher = blake3::Hasher::new();
        for (path, body) in files {
            hasher.update(path.as_bytes());
            hasher.update(&[0]);
            hasher.update(body.as_bytes());
            hasher.update(&[0]);
        }
        hasher.finalize().to_hex().to_string()
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    /// Non-blank lines across all files
    pub fn lines_of_code(&self) -> usize {
        self.files
            .values()
            .map(|body| body.lines().filter(|l| !l.trim().is_empty()).count())
            .sum()
    }

    pub fn has_file(&self, predicate: impl Fn(&str) -> bool) -> bool {
        self.files.keys().any(|path| predicate(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn files(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
        entries
            .iter()
            .map(|(p, b)| (p.to_string(), b.to_string()))
            .collect()
    }

    #[test]
    fn test_hash_tracks_content() {
        let a = GeneratedApp::new("demo", files(&[("src/app.js", "a\n")]), "", "");
        let b = GeneratedApp::new("demo", files(&[("src/app.js", "a\n")]), "", "");
        let c = GeneratedApp::new("demo", files(&[("src/app.js", "b\n")]), "", "");

        assert_eq!(a.content_hash, b.content_hash);
        assert_ne!(a.content_hash, c.content_hash);
        assert_eq!(a.content_hash.len(), 64);
    }

    #[test]
    fn test_counts() {
        let app = GeneratedApp::new(
            "demo",
            files(&[("a.js", "one\n\ntwo\n"), ("README.md", "# Demo\n")]),
            "",
            "",
        );
        assert_eq!(app.file_count(), 2);
        assert_eq!(app.lines_of_code(), 3);
        assert!(app.has_file(|p| p.eq_ignore_ascii_case("readme.md")));
    }
}
