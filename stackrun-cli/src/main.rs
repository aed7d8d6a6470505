//! stackrun entry point: configuration resolution, logging, and the
//! mapping from [`RunOutcome`] to the process exit code.

mod cli;
mod logging;
mod orchestrator;
mod probe;
mod stack;
mod status;

use std::path::Path;
use std::process::ExitCode;

use clap::Parser;

use stackrun_core::config::RunnerConfig;
use stackrun_core::error::{ConfigError, StackrunError};
use stackrun_core::outcome::RunOutcome;

use crate::cli::RunnerCli;
use crate::orchestrator::Orchestrator;
use crate::probe::HttpProbe;
use crate::stack::ComposeDriver;

/// Exit code for configuration and environment failures. Matches
/// [`RunOutcome::StackStartFailed`]: nothing external was started.
const EXIT_CONFIG: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = RunnerCli::parse();

    let config = match resolve_config(&cli).await {
        Ok(config) => config,
        Err(e) => {
            status::error(&e.to_string());
            return ExitCode::from(EXIT_CONFIG);
        }
    };

    if let Err(e) = logging::init_tracing(&config.general) {
        status::error(&e.to_string());
        return ExitCode::from(EXIT_CONFIG);
    }

    if cli.validate {
        status::success("configuration is valid");
        return ExitCode::SUCCESS;
    }

    match run(config).await {
        Ok(outcome) => {
            status::banner(outcome);
            ExitCode::from(outcome.exit_code())
        }
        Err(e) => {
            tracing::error!(error = %e, "run aborted before the stack was started");
            status::error(&e.to_string());
            ExitCode::from(EXIT_CONFIG)
        }
    }
}

/// Resolve configuration with the documented precedence:
/// CLI arguments > environment variables > config file > defaults.
///
/// A missing file is only an error when the user named one explicitly;
/// the absent default file falls back to built-in defaults.
async fn resolve_config(cli: &RunnerCli) -> Result<RunnerConfig, StackrunError> {
    let mut config = if cli.config.exists() {
        RunnerConfig::load(&cli.config).await?
    } else if cli.config == Path::new(cli::DEFAULT_CONFIG) {
        let mut config = RunnerConfig::default();
        config.apply_env_overrides();
        config
    } else {
        return Err(ConfigError::FileNotFound {
            path: cli.config.display().to_string(),
        }
        .into());
    };

    cli.apply_to(&mut config);
    config.validate()?;
    Ok(config)
}

async fn run(config: RunnerConfig) -> Result<RunOutcome, StackrunError> {
    let driver = ComposeDriver::detect(&config.stack).await?;
    let check = HttpProbe::new(&config.probe)?;
    let mut orchestrator = Orchestrator::new(config, driver, check);
    orchestrator.run().await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn explicit_missing_config_file_is_an_error() {
        let cli =
            RunnerCli::try_parse_from(["stackrun", "--config", "/nonexistent/stackrun.toml"])
                .unwrap();
        let err = resolve_config(&cli).await.unwrap_err();
        assert!(matches!(
            err,
            StackrunError::Config(ConfigError::FileNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn absent_default_config_falls_back_to_defaults() {
        let cli = RunnerCli::try_parse_from(["stackrun"]).unwrap();
        // the default stackrun.toml does not exist in the test environment
        let config = resolve_config(&cli).await.unwrap();
        assert_eq!(config.probe.base_url, "http://localhost:8081");
    }

    #[tokio::test]
    async fn cli_overrides_win_over_the_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stackrun.toml");
        std::fs::write(&path, "[probe]\nbase_url = \"http://from-file:8081\"\n").unwrap();

        let cli = RunnerCli::try_parse_from([
            "stackrun",
            "--config",
            path.to_str().unwrap(),
            "--probe-url",
            "http://from-cli:8081",
        ])
        .unwrap();

        let config = resolve_config(&cli).await.unwrap();
        assert_eq!(config.probe.base_url, "http://from-cli:8081");
    }

    #[tokio::test]
    async fn cli_override_failing_validation_is_rejected() {
        let cli = RunnerCli::try_parse_from(["stackrun", "--probe-url", "not-a-url"]).unwrap();
        let err = resolve_config(&cli).await.unwrap_err();
        assert!(err.to_string().contains("base_url"));
    }
}
