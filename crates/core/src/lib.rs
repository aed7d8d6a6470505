//! Shared types for the stackrun workspace.
//!
//! `stackrun-core` holds everything both the runner binary and its tests
//! need: the TOML configuration with environment overrides, the error
//! taxonomy, and the terminal [`outcome::RunOutcome`] of a run.

pub mod config;
pub mod error;
pub mod outcome;
