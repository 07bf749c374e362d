//! Adaptive learning coach.
//!
//! The core is three independent components that operate on plain value
//! objects supplied by the caller:
//!
//! - [`graph::KnowledgeGraph`] plans prerequisite-ordered learning paths.
//! - [`scheduler::SpacedRepetitionScheduler`] runs SM-2 review scheduling.
//! - [`weakness::WeaknessAnalyzer`] ranks weak topics and concepts.
//!
//! [`db`], [`plan`] and [`config`] back the `coach` binary.

pub mod config;
pub mod db;
pub mod error;
pub mod graph;
pub mod models;
pub mod plan;
pub mod scheduler;
pub mod shared;
pub mod weakness;

pub use error::{CoachError, Result};
pub use graph::KnowledgeGraph;
pub use scheduler::SpacedRepetitionScheduler;
pub use weakness::WeaknessAnalyzer;
