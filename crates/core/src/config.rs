//! Configuration -- `stackrun.toml` parsing and runtime settings.
//!
//! [`RunnerConfig`] is the top-level structure holding every setting the
//! runner needs: logging, the compose stack location, the readiness probe
//! policy, and the test command.
//!
//! # Loading priority
//! 1. CLI arguments (highest)
//! 2. Environment variables (`STACKRUN_PROBE_BASE_URL` style)
//! 3. Configuration file (`stackrun.toml`)
//! 4. Built-in defaults (`Default` impls)
//!
//! # Example
//! ```no_run
//! # async fn example() -> Result<(), stackrun_core::error::StackrunError> {
//! use stackrun_core::config::RunnerConfig;
//!
//! // Load from file and apply environment overrides
//! let config = RunnerConfig::load("stackrun.toml").await?;
//!
//! // Parse directly from a TOML string
//! let config = RunnerConfig::parse("[probe]\nmax_wait_secs = 120")?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, StackrunError};

/// Top-level runner configuration, the shape of `stackrun.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Logging settings.
    #[serde(default)]
    pub general: GeneralConfig,
    /// Dependency-stack location.
    #[serde(default)]
    pub stack: StackConfig,
    /// Readiness probe endpoint and timing policy.
    #[serde(default)]
    pub probe: ProbeConfig,
    /// Test command settings.
    #[serde(default)]
    pub tests: TestConfig,
}

impl RunnerConfig {
    /// Load configuration from a TOML file and apply environment overrides.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, StackrunError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file (no environment overrides).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, StackrunError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StackrunError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                StackrunError::Io(e)
            }
        })?;
        let config = Self::parse(&content)?;
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(toml_str: &str) -> Result<Self, StackrunError> {
        toml::from_str(toml_str).map_err(|e| {
            StackrunError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// Override settings from environment variables.
    ///
    /// Naming convention: `STACKRUN_{SECTION}_{FIELD}`,
    /// e.g. `STACKRUN_PROBE_BASE_URL=http://localhost:8081`.
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "STACKRUN_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "STACKRUN_GENERAL_LOG_FORMAT");

        // Stack
        override_string(&mut self.stack.compose_file, "STACKRUN_STACK_COMPOSE_FILE");
        override_string(&mut self.stack.project_dir, "STACKRUN_STACK_PROJECT_DIR");

        // Probe
        override_string(&mut self.probe.base_url, "STACKRUN_PROBE_BASE_URL");
        override_string(&mut self.probe.check_path, "STACKRUN_PROBE_CHECK_PATH");
        override_u64(
            &mut self.probe.initial_delay_secs,
            "STACKRUN_PROBE_INITIAL_DELAY_SECS",
        );
        override_u64(
            &mut self.probe.retry_interval_secs,
            "STACKRUN_PROBE_RETRY_INTERVAL_SECS",
        );
        override_u64(&mut self.probe.max_wait_secs, "STACKRUN_PROBE_MAX_WAIT_SECS");

        // Tests
        override_csv(&mut self.tests.command, "STACKRUN_TESTS_COMMAND");
    }

    /// Validate configuration values.
    ///
    /// Runs before anything external is spawned, so a bad URL or an empty
    /// test command fails the run immediately with a configuration error.
    pub fn validate(&self) -> Result<(), StackrunError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_level".to_owned(),
                reason: format!("must be one of: {}", valid_levels.join(", ")),
            }
            .into());
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_format".to_owned(),
                reason: format!("must be one of: {}", valid_formats.join(", ")),
            }
            .into());
        }

        if self.stack.compose_file.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "stack.compose_file".to_owned(),
                reason: "compose file path must not be empty".to_owned(),
            }
            .into());
        }

        if !self.probe.base_url.starts_with("http://")
            && !self.probe.base_url.starts_with("https://")
        {
            return Err(ConfigError::InvalidValue {
                field: "probe.base_url".to_owned(),
                reason: "must start with http:// or https://".to_owned(),
            }
            .into());
        }

        if !self.probe.check_path.starts_with('/') {
            return Err(ConfigError::InvalidValue {
                field: "probe.check_path".to_owned(),
                reason: "must start with '/'".to_owned(),
            }
            .into());
        }

        // A zero interval would let the poll loop spin; the deadline timer
        // alone bounds the wait, but the cadence must still be finite.
        if self.probe.retry_interval_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "probe.retry_interval_secs".to_owned(),
                reason: "must be at least 1".to_owned(),
            }
            .into());
        }

        if self.tests.command.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "tests.command".to_owned(),
                reason: "test command must not be empty".to_owned(),
            }
            .into());
        }

        Ok(())
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
    /// Log format (json, pretty).
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            // A human watches this tool run; json is for CI log collectors.
            log_format: "pretty".to_owned(),
        }
    }
}

/// Dependency-stack location.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StackConfig {
    /// Compose file, resolved relative to `project_dir`.
    pub compose_file: String,
    /// Directory the compose and test commands run in.
    pub project_dir: String,
}

impl Default for StackConfig {
    fn default() -> Self {
        Self {
            compose_file: "docker-compose-test.yml".to_owned(),
            project_dir: ".".to_owned(),
        }
    }
}

/// Readiness probe endpoint and timing policy.
///
/// The defaults target a Confluent Schema Registry: its `/subjects`
/// endpoint answers 200 as soon as the registry (and therefore the broker
/// behind it) is usable.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Base URL of the dependency to watch.
    pub base_url: String,
    /// Path appended to the base URL for the readiness check.
    pub check_path: String,
    /// Seconds to wait before the first probe request.
    pub initial_delay_secs: u64,
    /// Seconds between probe retries.
    pub retry_interval_secs: u64,
    /// Maximum seconds to wait for readiness overall.
    pub max_wait_secs: u64,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8081".to_owned(),
            check_path: "/subjects".to_owned(),
            initial_delay_secs: 5,
            retry_interval_secs: 2,
            max_wait_secs: 90,
        }
    }
}

impl ProbeConfig {
    /// Full readiness-check URL: normalized base URL plus check path.
    ///
    /// A trailing slash on the base URL is tolerated and stripped.
    pub fn endpoint(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), self.check_path)
    }

    /// Delay before the first probe request.
    pub fn initial_delay(&self) -> Duration {
        Duration::from_secs(self.initial_delay_secs)
    }

    /// Cadence between probe retries.
    pub fn retry_interval(&self) -> Duration {
        Duration::from_secs(self.retry_interval_secs)
    }

    /// Overall readiness deadline.
    pub fn max_wait(&self) -> Duration {
        Duration::from_secs(self.max_wait_secs)
    }
}

/// Test command settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TestConfig {
    /// Command and arguments, executed with inherited stdio in the
    /// project directory. The exit code is the sole success signal.
    pub command: Vec<String>,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            command: vec![
                "npx".to_owned(),
                "playwright".to_owned(),
                "test".to_owned(),
            ],
        }
    }
}

// --- environment override helpers ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_u64(target: &mut u64, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u64>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u64 from env var, ignoring"
            ),
        }
    }
}

fn override_csv(target: &mut Vec<String>, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val.split(',').map(|s| s.trim().to_owned()).collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn default_config_matches_the_documented_defaults() {
        let config = RunnerConfig::default();
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.general.log_format, "pretty");
        assert_eq!(config.stack.compose_file, "docker-compose-test.yml");
        assert_eq!(config.probe.base_url, "http://localhost:8081");
        assert_eq!(config.probe.check_path, "/subjects");
        assert_eq!(config.probe.initial_delay_secs, 5);
        assert_eq!(config.probe.retry_interval_secs, 2);
        assert_eq!(config.probe.max_wait_secs, 90);
        assert_eq!(config.tests.command, vec!["npx", "playwright", "test"]);
    }

    #[test]
    fn default_config_passes_validation() {
        RunnerConfig::default().validate().unwrap();
    }

    #[test]
    fn parse_empty_toml_uses_defaults() {
        let config = RunnerConfig::parse("").unwrap();
        assert_eq!(config.probe.max_wait_secs, 90);
    }

    #[test]
    fn parse_partial_toml_merges_with_defaults() {
        let toml = r#"
[probe]
base_url = "http://registry:8081"
max_wait_secs = 120

[tests]
command = ["cargo", "test"]
"#;
        let config = RunnerConfig::parse(toml).unwrap();
        assert_eq!(config.probe.base_url, "http://registry:8081");
        assert_eq!(config.probe.max_wait_secs, 120);
        // untouched fields keep their defaults
        assert_eq!(config.probe.retry_interval_secs, 2);
        assert_eq!(config.tests.command, vec!["cargo", "test"]);
        assert_eq!(config.stack.compose_file, "docker-compose-test.yml");
    }

    #[test]
    fn parse_invalid_toml_returns_error() {
        let result = RunnerConfig::parse("probe = [[[oops");
        assert!(matches!(
            result.unwrap_err(),
            StackrunError::Config(ConfigError::ParseFailed { .. })
        ));
    }

    #[test]
    fn endpoint_joins_base_url_and_check_path() {
        let probe = ProbeConfig::default();
        assert_eq!(probe.endpoint(), "http://localhost:8081/subjects");
    }

    #[test]
    fn endpoint_strips_trailing_slash_from_base_url() {
        let probe = ProbeConfig {
            base_url: "http://localhost:8081/".to_owned(),
            ..ProbeConfig::default()
        };
        assert_eq!(probe.endpoint(), "http://localhost:8081/subjects");
    }

    #[test]
    fn validate_rejects_invalid_log_level() {
        let mut config = RunnerConfig::default();
        config.general.log_level = "verbose".to_owned();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("log_level"));
    }

    #[test]
    fn validate_rejects_url_without_scheme() {
        let mut config = RunnerConfig::default();
        config.probe.base_url = "localhost:8081".to_owned();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("base_url"));
    }

    #[test]
    fn validate_rejects_check_path_without_leading_slash() {
        let mut config = RunnerConfig::default();
        config.probe.check_path = "subjects".to_owned();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("check_path"));
    }

    #[test]
    fn validate_rejects_zero_retry_interval() {
        let mut config = RunnerConfig::default();
        config.probe.retry_interval_secs = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("retry_interval_secs"));
    }

    #[test]
    fn validate_rejects_empty_test_command() {
        let mut config = RunnerConfig::default();
        config.tests.command.clear();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("tests.command"));
    }

    #[test]
    fn validate_rejects_empty_compose_file() {
        let mut config = RunnerConfig::default();
        config.stack.compose_file.clear();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("compose_file"));
    }

    #[test]
    #[serial]
    fn env_override_probe_base_url() {
        let mut config = RunnerConfig::default();
        // SAFETY: #[serial] tests do not race other env-mutating tests.
        unsafe { std::env::set_var("STACKRUN_PROBE_BASE_URL", "http://registry:9999") };
        config.apply_env_overrides();
        assert_eq!(config.probe.base_url, "http://registry:9999");
        unsafe { std::env::remove_var("STACKRUN_PROBE_BASE_URL") };
    }

    #[test]
    #[serial]
    fn env_override_u64_invalid_keeps_original() {
        let mut config = RunnerConfig::default();
        // SAFETY: #[serial] tests do not race other env-mutating tests.
        unsafe { std::env::set_var("STACKRUN_PROBE_MAX_WAIT_SECS", "ninety") };
        config.apply_env_overrides();
        assert_eq!(config.probe.max_wait_secs, 90);
        unsafe { std::env::remove_var("STACKRUN_PROBE_MAX_WAIT_SECS") };
    }

    #[test]
    #[serial]
    fn env_override_test_command_is_csv() {
        let mut config = RunnerConfig::default();
        // SAFETY: #[serial] tests do not race other env-mutating tests.
        unsafe { std::env::set_var("STACKRUN_TESTS_COMMAND", "cargo, test, --release") };
        config.apply_env_overrides();
        assert_eq!(config.tests.command, vec!["cargo", "test", "--release"]);
        unsafe { std::env::remove_var("STACKRUN_TESTS_COMMAND") };
    }

    #[test]
    #[serial]
    fn env_override_missing_var_keeps_original() {
        let mut config = RunnerConfig::default();
        config.apply_env_overrides();
        assert_eq!(config.probe.base_url, "http://localhost:8081");
    }

    #[test]
    fn config_serialize_roundtrip() {
        let config = RunnerConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed = RunnerConfig::parse(&toml_str).unwrap();
        assert_eq!(config.probe.base_url, parsed.probe.base_url);
        assert_eq!(config.tests.command, parsed.tests.command);
    }

    #[tokio::test]
    async fn from_file_not_found() {
        let result = RunnerConfig::from_file("/nonexistent/path/stackrun.toml").await;
        assert!(matches!(
            result.unwrap_err(),
            StackrunError::Config(ConfigError::FileNotFound { .. })
        ));
    }

    #[tokio::test]
    #[serial]
    async fn load_reads_file_and_validates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stackrun.toml");
        std::fs::write(&path, "[probe]\nretry_interval_secs = 0\n").unwrap();
        let err = RunnerConfig::load(&path).await.unwrap_err();
        assert!(matches!(
            err,
            StackrunError::Config(ConfigError::InvalidValue { .. })
        ));
    }
}
