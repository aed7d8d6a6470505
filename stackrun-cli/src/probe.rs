//! HTTP readiness probe and its bounded wait policy.
//!
//! The wait is a race between a fixed deadline timer and the retry poll
//! loop inside a single `select!`: whichever settles first wins and the
//! loser is dropped, so a late poll result can never override a timeout
//! (and vice versa). The loop always terminates.

use std::future::Future;
use std::time::Duration;

use tracing::debug;

use stackrun_core::config::ProbeConfig;
use stackrun_core::error::{ConfigError, StackrunError};

/// A single readiness check against the watched dependency.
///
/// `true` means usable. Transport failures (connection refused, DNS) are
/// not distinguished from an application-level not-ready response: both
/// are `false` and will be retried.
pub trait ReadinessCheck: Send + Sync {
    fn check(&self) -> impl Future<Output = bool> + Send;
}

/// Timing policy for the readiness wait.
#[derive(Debug, Clone)]
pub struct ProbePolicy {
    /// Delay before the first check.
    pub initial_delay: Duration,
    /// Cadence between retries.
    pub retry_interval: Duration,
    /// Overall deadline, measured from the start of the wait.
    pub max_wait: Duration,
}

impl From<&ProbeConfig> for ProbePolicy {
    fn from(config: &ProbeConfig) -> Self {
        Self {
            initial_delay: config.initial_delay(),
            retry_interval: config.retry_interval(),
            max_wait: config.max_wait(),
        }
    }
}

/// How a readiness wait settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeVerdict {
    /// A check succeeded before the deadline.
    Ready,
    /// The deadline fired first.
    TimedOut,
}

/// Wait for the dependency to become ready within the policy bounds.
///
/// With `max_wait < initial_delay` the deadline fires while the poll loop
/// is still in its initial sleep: the wait times out without a single
/// request having been issued.
pub async fn wait_until_ready<C: ReadinessCheck>(check: &C, policy: &ProbePolicy) -> ProbeVerdict {
    tokio::select! {
        _ = tokio::time::sleep(policy.max_wait) => ProbeVerdict::TimedOut,
        _ = poll_until_ready(check, policy) => ProbeVerdict::Ready,
    }
}

async fn poll_until_ready<C: ReadinessCheck>(check: &C, policy: &ProbePolicy) {
    tokio::time::sleep(policy.initial_delay).await;
    loop {
        if check.check().await {
            return;
        }
        debug!(
            retry_in_secs = policy.retry_interval.as_secs(),
            "dependency not ready yet, retrying"
        );
        tokio::time::sleep(policy.retry_interval).await;
    }
}

/// Readiness check issuing a plain HTTP GET; any 2xx response is ready.
pub struct HttpProbe {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpProbe {
    /// Per-request timeout, so one hung request cannot absorb the whole
    /// retry budget.
    const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

    pub fn new(config: &ProbeConfig) -> Result<Self, StackrunError> {
        let client = reqwest::Client::builder()
            .timeout(Self::REQUEST_TIMEOUT)
            .build()
            .map_err(|e| {
                StackrunError::Config(ConfigError::InvalidValue {
                    field: "probe".to_owned(),
                    reason: format!("failed to build HTTP client: {e}"),
                })
            })?;
        Ok(Self {
            client,
            endpoint: config.endpoint(),
        })
    }
}

impl ReadinessCheck for HttpProbe {
    async fn check(&self) -> bool {
        match self.client.get(&self.endpoint).send().await {
            Ok(response) if response.status().is_success() => true,
            Ok(response) => {
                debug!(status = %response.status(), "readiness endpoint responded not-ready");
                false
            }
            Err(e) => {
                debug!(error = %e, "readiness request failed");
                false
            }
        }
    }
}
