//! Error types for the stackrun workspace.
//!
//! Configuration errors surface before any external process is spawned;
//! stack errors carry the failing command and its exit code so a run can
//! be diagnosed without re-running it. Teardown failures are deliberately
//! *not* an error variant — they are logged warnings that never change
//! the outcome of a run.

/// Top-level stackrun error type.
#[derive(Debug, thiserror::Error)]
pub enum StackrunError {
    /// Configuration loading or validation error.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// Dependency-stack command error.
    #[error("stack error: {0}")]
    Stack(#[from] StackError),

    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Configuration file does not exist.
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// Compose file does not exist at the resolved absolute path.
    #[error("compose file not found: {path}")]
    ComposeFileNotFound { path: String },

    /// Configuration file could not be parsed as TOML.
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// A configuration value failed validation.
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// Dependency-stack errors from the compose start/stop commands.
///
/// [`StackError::Spawn`] and [`StackError::CliNotFound`] prove that no
/// stack command ran, so no stack resources can exist. Once a command
/// actually ran, a nonzero exit is [`StackError::ExitNonZero`] and the
/// stack may hold partially-started resources.
#[derive(Debug, thiserror::Error)]
pub enum StackError {
    /// Neither `docker-compose` nor the `docker compose` plugin is available.
    #[error("no compose CLI found: install docker-compose or the docker compose plugin")]
    CliNotFound,

    /// A compose command could not be launched at all.
    #[error("failed to spawn '{command}': {reason}")]
    Spawn { command: String, reason: String },

    /// A compose command ran but exited nonzero.
    #[error("'{command}' exited with code {code}")]
    ExitNonZero { command: String, code: i32 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_display_includes_path() {
        let err = ConfigError::ComposeFileNotFound {
            path: "/tmp/docker-compose-test.yml".to_owned(),
        };
        assert!(err.to_string().contains("/tmp/docker-compose-test.yml"));
    }

    #[test]
    fn stack_error_display_includes_command_and_code() {
        let err = StackError::ExitNonZero {
            command: "docker compose -f x.yml up -d".to_owned(),
            code: 17,
        };
        let msg = err.to_string();
        assert!(msg.contains("up -d"), "should name the command: {msg}");
        assert!(msg.contains("17"), "should include the exit code: {msg}");
    }

    #[test]
    fn errors_convert_into_top_level() {
        let err: StackrunError = ConfigError::FileNotFound {
            path: "stackrun.toml".to_owned(),
        }
        .into();
        assert!(matches!(
            err,
            StackrunError::Config(ConfigError::FileNotFound { .. })
        ));

        let err: StackrunError = StackError::CliNotFound.into();
        assert!(matches!(err, StackrunError::Stack(StackError::CliNotFound)));
    }
}
