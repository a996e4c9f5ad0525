//! Error types for Trinity Core
//!
//! Only input validation, configuration, generation and I/O problems are errors.
//! LLM reachability problems are never errors here: they travel as
//! [`crate::llm::LLMCallOutcome::Failure`] and are absorbed by the agents.

use thiserror::Error;

/// Result type alias for Trinity operations
pub type Result<T> = std::result::Result<T, TrinityError>;

/// Main error type for Trinity operations
#[derive(Error, Debug)]
pub enum TrinityError {
    /// Input rejected before any external call was made
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Configuration could not be loaded or is inconsistent
    #[error("Configuration error: {0}")]
    Config(String),

    /// The artifact generator failed to produce an application
    #[error("Generation error: {0}")]
    Generation(String),

    /// JSON serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        source: Box<TrinityError>,
    },
}

/// Errors raised while validating caller input
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Concept description must be at least {minimum} characters, got {length}")]
    DescriptionTooShort { length: usize, minimum: usize },

    #[error("Threshold must be in range [0.0, 100.0], got {0}")]
    InvalidThreshold(f64),

    #[error("Iteration budget must be at least 1, got {0}")]
    InvalidIterationBudget(u32),

    #[error("Stagnation limit must be at least 1, got {0}")]
    InvalidStagnationLimit(u32),
}

impl TrinityError {
    /// Add context to an error
    pub fn context(self, context: impl Into<String>) -> Self {
        Self::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// True when the error (or its wrapped source) is a validation failure
    pub fn is_validation(&self) -> bool {
        match self {
            Self::Validation(_) => true,
            Self::WithContext { source, .. } => source.is_validation(),
            _ => false,
        }
    }
}

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to a Result
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add lazy context to a Result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E: Into<TrinityError>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| Into::<TrinityError>::into(e).context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| Into::<TrinityError>::into(e).context(f()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_context() {
        let err = TrinityError::from(ValidationError::DescriptionTooShort {
            length: 3,
            minimum: 10,
        });
        let err = err.context("Failed to build concept");

        assert!(err.to_string().contains("Failed to build concept"));
        assert!(err.to_string().contains("at least 10"));
        assert!(err.is_validation());
    }

    #[test]
    fn test_result_ext() {
        let result: Result<()> = Err(TrinityError::Generation("template missing".into()));
        let result = result.with_context(|| "Iteration 2".to_string());

        let err = result.unwrap_err();
        assert!(err.to_string().starts_with("Iteration 2"));
        assert!(!err.is_validation());
    }
}
