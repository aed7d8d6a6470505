//! Compose stack driver -- spawns the external start/stop commands.
//!
//! The [`StackDriver`] trait abstracts the compose CLI so orchestrator
//! tests can substitute a fake; [`ComposeDriver`] is the production
//! implementation shelling out to `docker-compose` or the `docker compose`
//! plugin, whichever this host has.
//!
//! The compose file's contents are opaque here: the driver only needs
//! "start" and "stop" with observable exit codes.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, info};

use stackrun_core::config::StackConfig;
use stackrun_core::error::{ConfigError, StackError, StackrunError};

/// Trait abstracting the stack start/stop commands.
///
/// Both operations block until the underlying command exits. A spawn
/// failure ([`StackError::Spawn`]) and a nonzero exit
/// ([`StackError::ExitNonZero`]) are distinct: only the former proves
/// that no stack resources can have been created.
pub trait StackDriver: Send + Sync {
    /// Start the stack detached; resolves when the start command exits.
    fn up(&self) -> impl Future<Output = Result<(), StackError>> + Send;

    /// Stop the stack and release all its resources, including any
    /// processes the run abandoned mid-flight.
    fn down(&self) -> impl Future<Output = Result<(), StackError>> + Send;
}

/// Compose CLI flavor available on this host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ComposeCli {
    /// Legacy standalone `docker-compose`.
    Standalone,
    /// `docker compose` plugin.
    Plugin,
}

impl ComposeCli {
    fn program(self) -> &'static str {
        match self {
            Self::Standalone => "docker-compose",
            Self::Plugin => "docker",
        }
    }

    fn base_args(self) -> &'static [&'static str] {
        match self {
            Self::Standalone => &[],
            Self::Plugin => &["compose"],
        }
    }
}

/// Production stack driver shelling out to the compose CLI.
///
/// The compose file is resolved to an absolute path at construction, so
/// every later command is independent of the current working directory.
#[derive(Debug)]
pub struct ComposeDriver {
    cli: ComposeCli,
    compose_file: PathBuf,
    project_dir: PathBuf,
}

impl ComposeDriver {
    /// Detect the compose CLI and resolve the compose file.
    ///
    /// Fails before anything external is started: a missing project
    /// directory or compose file is a configuration error, and a host
    /// without any compose CLI is [`StackError::CliNotFound`].
    pub async fn detect(config: &StackConfig) -> Result<Self, StackrunError> {
        let project_dir = Path::new(&config.project_dir).canonicalize().map_err(|_| {
            StackrunError::Config(ConfigError::FileNotFound {
                path: config.project_dir.clone(),
            })
        })?;

        let compose_file = project_dir.join(&config.compose_file);
        if !compose_file.is_file() {
            return Err(ConfigError::ComposeFileNotFound {
                path: compose_file.display().to_string(),
            }
            .into());
        }

        let cli = detect_compose_cli().await?;
        info!(
            cli = cli.program(),
            compose_file = %compose_file.display(),
            "compose CLI detected"
        );

        Ok(Self {
            cli,
            compose_file,
            project_dir,
        })
    }

    fn args_for(&self, action: &[&str]) -> Vec<String> {
        let mut args: Vec<String> = self
            .cli
            .base_args()
            .iter()
            .map(|s| (*s).to_owned())
            .collect();
        args.push("-f".to_owned());
        args.push(self.compose_file.display().to_string());
        args.extend(action.iter().map(|s| (*s).to_owned()));
        args
    }

    /// Human-readable command line for logs and error messages.
    fn render_command(&self, args: &[String]) -> String {
        format!("{} {}", self.cli.program(), args.join(" "))
    }

    async fn run(&self, action: &[&str]) -> Result<(), StackError> {
        let args = self.args_for(action);
        let rendered = self.render_command(&args);
        debug!(command = %rendered, "running compose command");

        let status = Command::new(self.cli.program())
            .args(&args)
            .current_dir(&self.project_dir)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await
            .map_err(|e| StackError::Spawn {
                command: rendered.clone(),
                reason: e.to_string(),
            })?;

        if status.success() {
            Ok(())
        } else {
            Err(StackError::ExitNonZero {
                command: rendered,
                code: status.code().unwrap_or(-1),
            })
        }
    }
}

impl StackDriver for ComposeDriver {
    async fn up(&self) -> Result<(), StackError> {
        self.run(&["up", "-d"]).await
    }

    async fn down(&self) -> Result<(), StackError> {
        self.run(&["down"]).await
    }
}

/// Pick the compose CLI: standalone `docker-compose` first, then the
/// `docker compose` plugin, matching what most CI images ship.
async fn detect_compose_cli() -> Result<ComposeCli, StackError> {
    if cli_responds("docker-compose", &["--version"]).await {
        return Ok(ComposeCli::Standalone);
    }
    if cli_responds("docker", &["compose", "version"]).await {
        return Ok(ComposeCli::Plugin);
    }
    Err(StackError::CliNotFound)
}

async fn cli_responds(program: &str, args: &[&str]) -> bool {
    Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
        .map(|status| status.success())
        .unwrap_or(false)
}
