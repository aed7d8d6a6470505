//! Run lifecycle orchestration -- start stack, wait for readiness, run
//! tests, always tear down.
//!
//! The [`Orchestrator`] owns one run end to end. One supervisory
//! `select!` races the normal phase sequence against SIGINT/SIGTERM
//! delivery; both arms fall through to the same guarded teardown, so
//! there is exactly one cleanup path no matter how the run settles.
//!
//! # Cleanup token
//!
//! `stack_started` records whether teardown is owed. It is set before the
//! start command is awaited -- a signal mid-start or a nonzero exit can
//! both leave partially-started services behind -- and cleared only when
//! the start error proves no process was created. [`Orchestrator::teardown`]
//! takes the token, so at most one stop command is spawned per run.

use std::process::Stdio;

use tokio::process::Command;
use tracing::{error, info, warn};

use stackrun_core::config::RunnerConfig;
use stackrun_core::error::{StackError, StackrunError};
use stackrun_core::outcome::RunOutcome;

use crate::probe::{self, ProbePolicy, ProbeVerdict, ReadinessCheck};
use crate::stack::StackDriver;
use crate::status;

/// Orchestrates one full run. Not reentrant: build one per invocation.
pub struct Orchestrator<D, C> {
    config: RunnerConfig,
    driver: D,
    check: C,
    /// Cleanup token: teardown is owed once the start command has run.
    stack_started: bool,
}

impl<D: StackDriver, C: ReadinessCheck> Orchestrator<D, C> {
    pub fn new(config: RunnerConfig, driver: D, check: C) -> Self {
        Self {
            config,
            driver,
            check,
            stack_started: false,
        }
    }

    /// Run the lifecycle to completion or signal-triggered abort.
    ///
    /// Signal streams are created before anything external is started and
    /// dropped when this method returns, so the orchestrator is safely
    /// callable as a library function. On a signal the in-flight phase is
    /// dropped, not awaited; the stop command reclaims whatever child
    /// processes remain.
    ///
    /// # Errors
    ///
    /// Only signal-handler installation can fail here; every later
    /// failure is expressed as a [`RunOutcome`].
    pub async fn run(&mut self) -> Result<RunOutcome, StackrunError> {
        use tokio::signal::unix::{SignalKind, signal};

        // Installed before the stack starts: a signal in the startup
        // window must still reach the teardown path below.
        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigint = signal(SignalKind::interrupt())?;

        let outcome = tokio::select! {
            outcome = self.drive() => outcome,
            name = async {
                tokio::select! {
                    _ = sigterm.recv() => "SIGTERM",
                    _ = sigint.recv() => "SIGINT",
                }
            } => {
                warn!(signal = name, "termination signal received, aborting run");
                status::warn(&format!("received {name}, cleaning up"));
                RunOutcome::Interrupted
            }
        };

        // Single teardown path for clean and dirty shutdown alike. The
        // signal streams above stay installed (but unpolled) until `run`
        // returns, so further signals cannot interrupt the stop command.
        self.teardown().await;

        info!(outcome = %outcome, exit_code = outcome.exit_code(), "run finished");
        Ok(outcome)
    }

    /// The normal phase sequence: start, readiness wait, tests.
    async fn drive(&mut self) -> RunOutcome {
        status::phase("starting dependency stack");
        // The token is set before the await: a signal landing while the
        // start command is in flight drops this future, and teardown must
        // still reclaim whatever the command had created by then. It is
        // cleared only when the error proves no process ever existed.
        self.stack_started = true;
        match self.driver.up().await {
            Ok(()) => status::success("dependency stack started"),
            Err(e @ (StackError::Spawn { .. } | StackError::CliNotFound)) => {
                // Nothing was spawned, so no teardown is owed.
                self.stack_started = false;
                error!(phase = "start", error = %e, "could not launch the stack start command");
                status::error(&e.to_string());
                return RunOutcome::StackStartFailed;
            }
            Err(e) => {
                // The command ran; compose may have partially started
                // services even though it reported failure.
                error!(phase = "start", error = %e, "stack start failed");
                status::error(&e.to_string());
                return RunOutcome::StackStartFailed;
            }
        }

        let endpoint = self.config.probe.endpoint();
        let policy = ProbePolicy::from(&self.config.probe);
        status::phase(&format!("waiting for {endpoint}"));
        info!(
            endpoint = %endpoint,
            initial_delay_secs = policy.initial_delay.as_secs(),
            retry_interval_secs = policy.retry_interval.as_secs(),
            max_wait_secs = policy.max_wait.as_secs(),
            "waiting for dependency readiness"
        );
        match probe::wait_until_ready(&self.check, &policy).await {
            ProbeVerdict::Ready => status::success("dependency is ready"),
            ProbeVerdict::TimedOut => {
                error!(
                    phase = "readiness",
                    endpoint = %endpoint,
                    max_wait_secs = policy.max_wait.as_secs(),
                    "dependency never became ready"
                );
                status::error(&format!(
                    "{endpoint} not ready after {}s",
                    policy.max_wait.as_secs()
                ));
                return RunOutcome::ReadinessTimedOut;
            }
        }

        status::phase("running tests");
        self.run_tests().await
    }

    /// Execute the test command once, stdio inherited, in the project
    /// directory. The exit code is the sole success signal; failures are
    /// never retried.
    async fn run_tests(&self) -> RunOutcome {
        let command = &self.config.tests.command;
        let Some((program, args)) = command.split_first() else {
            // validate() rejects an empty command before a run starts.
            error!(phase = "tests", "test command is empty");
            return RunOutcome::TestsFailed;
        };

        let result = Command::new(program)
            .args(args)
            .current_dir(&self.config.stack.project_dir)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await;

        match result {
            Ok(exit) if exit.success() => RunOutcome::Success,
            Ok(exit) => {
                error!(
                    phase = "tests",
                    command = %program,
                    code = exit.code().unwrap_or(-1),
                    "test command exited nonzero"
                );
                RunOutcome::TestsFailed
            }
            Err(e) => {
                error!(
                    phase = "tests",
                    command = %program,
                    error = %e,
                    "failed to launch test command"
                );
                RunOutcome::TestsFailed
            }
        }
    }

    /// Idempotent teardown: the cleanup token is taken up front, so at
    /// most one stop command is ever spawned per run. A stop failure is
    /// a warning and never overrides the already-determined outcome.
    async fn teardown(&mut self) {
        if !std::mem::take(&mut self.stack_started) {
            return;
        }

        status::phase("stopping dependency stack");
        match self.driver.down().await {
            Ok(()) => status::success("dependency stack stopped"),
            Err(e) => {
                warn!(phase = "teardown", error = %e, "stack stop failed");
                status::warn("stack stop failed; containers may still be running");
            }
        }
    }
}
