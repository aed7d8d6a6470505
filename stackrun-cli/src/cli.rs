//! CLI argument definitions for stackrun.
//!
//! Uses `clap` v4 derive macros. CLI arguments take precedence over both
//! the configuration file and `STACKRUN_*` environment variables.

use std::path::PathBuf;

use clap::Parser;

use stackrun_core::config::RunnerConfig;

/// Default configuration file, resolved relative to the working directory.
pub const DEFAULT_CONFIG: &str = "stackrun.toml";

/// Bring up a compose dependency stack, wait for it to become ready,
/// run a test command, and always tear the stack down afterwards.
#[derive(Parser, Debug)]
#[command(name = "stackrun")]
#[command(version, about, long_about = None)]
pub struct RunnerCli {
    /// Path to the stackrun.toml configuration file.
    ///
    /// If the default file does not exist, built-in defaults plus
    /// STACKRUN_* environment overrides are used instead.
    #[arg(short, long, default_value = DEFAULT_CONFIG)]
    pub config: PathBuf,

    /// Override the compose file path (relative to the project directory).
    #[arg(long)]
    pub compose_file: Option<String>,

    /// Override the project directory used to resolve relative paths.
    #[arg(long)]
    pub project_dir: Option<String>,

    /// Override the readiness-probe base URL.
    #[arg(long)]
    pub probe_url: Option<String>,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Override log format (json, pretty).
    #[arg(long)]
    pub log_format: Option<String>,

    /// Validate configuration and exit without touching the stack.
    #[arg(long)]
    pub validate: bool,

    /// Test command override, e.g. `stackrun -- npx playwright test`.
    #[arg(last = true)]
    pub test_command: Vec<String>,
}

impl RunnerCli {
    /// Apply CLI overrides on top of the file/env configuration.
    pub fn apply_to(&self, config: &mut RunnerConfig) {
        if let Some(compose_file) = &self.compose_file {
            config.stack.compose_file = compose_file.clone();
        }
        if let Some(project_dir) = &self.project_dir {
            config.stack.project_dir = project_dir.clone();
        }
        if let Some(probe_url) = &self.probe_url {
            config.probe.base_url = probe_url.clone();
        }
        if let Some(log_level) = &self.log_level {
            config.general.log_level = log_level.clone();
        }
        if let Some(log_format) = &self.log_format {
            config.general.log_format = log_format.clone();
        }
        if !self.test_command.is_empty() {
            config.tests.command = self.test_command.clone();
        }
    }
}
