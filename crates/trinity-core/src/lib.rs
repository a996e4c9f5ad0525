//! Trinity Core - shared engine for concept review and iterative app generation
//!
//! Trinity Core holds everything the agents and the CLI share: the result
//! model for the three-agent review, the veto hierarchy that turns three
//! verdicts into one decision, and the RefleXion loop that keeps improving a
//! generated application until it is good enough.
//!
//! # Architecture
//!
//! 1. **Review model** (`types`, `analysis`): concept input, agent results, per-agent analyses
//! 2. **Decision** (`decision`): Security > Ethics > Innovation conflict resolution
//! 3. **Threat scanning** (`security`): pattern-based intent and code scanning
//! 4. **LLM seam** (`llm`, `extract`): provider trait, call outcomes, structured extraction
//! 5. **Reflection** (`reflection`): static analysis and scoring of generated code
//! 6. **RefleXion** (`reflexion`, `history`): generate, reflect, improve, iterate
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use trinity_core::config::ReflexionSettings;
//! use trinity_core::reflexion::{AppSpecification, RefleXionLoop, TemplateGenerator};
//!
//! # async fn demo() -> trinity_core::Result<()> {
//! let reflexion = RefleXionLoop::new(
//!     Arc::new(TemplateGenerator::new()),
//!     ReflexionSettings::default(),
//! )?;
//!
//! let outcome = reflexion
//!     .run(AppSpecification::task_manager("taskflow", "Task tracking for small teams"))
//!     .await?;
//!
//! println!("{} after {} iterations: {:.1}", outcome.state, outcome.iterations, outcome.report.overall_score());
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(rust_2018_idioms, clippy::all)]

pub mod analysis;
pub mod artifact;
pub mod config;
pub mod decision;
pub mod error;
pub mod extract;
pub mod history;
pub mod llm;
pub mod reflection;
pub mod reflexion;
pub mod security;
pub mod types;

// Re-export commonly used types for convenience
pub use analysis::AgentAnalysis;
pub use artifact::GeneratedApp;
pub use config::TrinityConfig;
pub use decision::{resolve_conflicts, trinity_score, Decision, DecisionKind};
pub use error::{Result, ResultExt, TrinityError, ValidationError};
pub use history::{ImprovementHistory, VersionMetadata, VersionTracker};
pub use llm::{LLMCallOutcome, LLMProvider, LLMRequest};
pub use reflection::{ReflectionAnalyzer, ReflectionReport};
pub use reflexion::{AppGenerator, AppSpecification, LoopOutcome, LoopState, RefleXionLoop};
pub use types::{AgentId, AgentResult, AgentStatus, ConceptInput, Timestamp, TrinityResults};
pub use uuid::Uuid;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
