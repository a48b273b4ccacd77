//! Legacy name reconciliation library - shared by the CLI and integration tests.

pub mod batch;
pub mod config;
pub mod loader;
pub mod matcher;
pub mod models;
pub mod normalize;
pub mod progress;
pub mod report;
pub mod safety;
pub mod scoring;

pub use matcher::{match_name, NameMatcher};
pub use models::{CandidateEntity, ManualOverride, MatchResult, MatchSource, OverrideTable};
