//! RefleXion Module - generate, reflect, improve, iterate
//!
//! The loop renders an application from an [`AppSpecification`], reflects on
//! it, folds the findings back into the specification and tries again until
//! the result is good enough, the budget runs out, or progress stalls.

pub mod loop_impl;
pub mod spec;
pub mod templates;

use crate::artifact::GeneratedApp;
use crate::error::Result;
use async_trait::async_trait;

pub use loop_impl::{LoopOutcome, LoopState, RefleXionLoop};
pub use spec::{apply_improvements, ApiEndpoint, AppSpecification, DatabaseEntity, EntityField};
pub use templates::{TemplateGenerator, TemplateLibrary};

/// Renders an application from its specification
#[async_trait]
pub trait AppGenerator: Send + Sync {
    async fn generate(&self, spec: &AppSpecification, iteration: u32) -> Result<GeneratedApp>;
}
