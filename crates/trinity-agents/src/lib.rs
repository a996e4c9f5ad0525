//! Trinity Agents - the three reviewers, their orchestrator and LLM providers
//!
//! # Architecture
//!
//! - [`agents`]: Innovation ("X"), Ethics ("Z") and Security ("CS") behind one
//!   [`Agent`] trait
//! - [`orchestrator`]: concurrent fan-out plus the Security > Ethics > Innovation
//!   veto hierarchy
//! - [`providers`]: HTTP providers with retry and rate limiting, an offline
//!   heuristic-only provider and a scripted provider for dry runs
//!
//! # Quick start
//!
//! ```no_run
//! use trinity_agents::{AgentSettings, ProviderFactory, TrinityOrchestrator};
//! use trinity_core::TrinityConfig;
//!
//! # async fn demo() -> trinity_core::Result<()> {
//! let config = TrinityConfig::default();
//! let provider = ProviderFactory::from_settings(&config.llm);
//! let orchestrator = TrinityOrchestrator::new(provider, AgentSettings::from_config(&config));
//!
//! let report = orchestrator.analyze("A shared grocery list app for families").await?;
//! println!("{} ({:.1}/10)", report.decision.decision, report.trinity_score);
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(rust_2018_idioms, clippy::all)]

pub mod agents;
pub mod orchestrator;
pub mod providers;

pub use agents::{Agent, AgentSettings, EthicsAgent, InnovationAgent, SecurityAgent};
pub use orchestrator::{TrinityOrchestrator, TrinityReport};
pub use providers::{OfflineProvider, ProviderFactory, ScriptedProvider};
