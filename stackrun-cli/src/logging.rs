//! Logging initialization for stackrun.
//!
//! Configures `tracing-subscriber` from the `[general]` section of the
//! configuration. The `pretty` format is the default since a human usually
//! watches this tool; `json` is for CI log collectors.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use stackrun_core::config::GeneralConfig;
use stackrun_core::error::{ConfigError, StackrunError};

/// Initialize the global tracing subscriber.
///
/// Must be called exactly once, before any tracing macros are used.
/// `RUST_LOG` takes precedence over the configured log level.
pub fn init_tracing(config: &GeneralConfig) -> Result<(), StackrunError> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let init_result = match config.log_format.as_str() {
        "json" => tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .try_init(),
        "pretty" => tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().pretty())
            .try_init(),
        other => {
            return Err(ConfigError::InvalidValue {
                field: "general.log_format".to_owned(),
                reason: format!("unknown log format '{other}', expected 'json' or 'pretty'"),
            }
            .into());
        }
    };

    init_result.map_err(|e| {
        StackrunError::Config(ConfigError::InvalidValue {
            field: "general".to_owned(),
            reason: format!("failed to initialize tracing subscriber: {e}"),
        })
    })
}
