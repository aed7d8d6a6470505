//! Terminal result of one orchestrator run.

/// Terminal result of one full run.
///
/// Produced exactly once at the end of a run and immutable afterwards;
/// its only consumer is the process exit status (plus the final banner).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Stack started, dependency became ready, test command exited 0.
    Success,
    /// The stack start command failed.
    StackStartFailed,
    /// The readiness probe never succeeded within the maximum wait.
    ReadinessTimedOut,
    /// The test command exited nonzero or could not be launched.
    TestsFailed,
    /// An interrupt or termination signal aborted the run.
    Interrupted,
}

impl RunOutcome {
    /// Map the outcome to a process exit code.
    ///
    /// | Code | Outcome             |
    /// |------|---------------------|
    /// | 0    | `Success`           |
    /// | 1    | `Interrupted`       |
    /// | 2    | `StackStartFailed`  |
    /// | 3    | `ReadinessTimedOut` |
    /// | 4    | `TestsFailed`       |
    ///
    /// Configuration errors exit with code 2 as well: like a failed start,
    /// nothing external was running when the run ended.
    pub fn exit_code(self) -> u8 {
        match self {
            Self::Success => 0,
            Self::Interrupted => 1,
            Self::StackStartFailed => 2,
            Self::ReadinessTimedOut => 3,
            Self::TestsFailed => 4,
        }
    }

    /// Whether the run succeeded end to end.
    pub fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }
}

impl std::fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let msg = match self {
            Self::Success => "all tests passed",
            Self::StackStartFailed => "dependency stack failed to start",
            Self::ReadinessTimedOut => "dependency never became ready",
            Self::TestsFailed => "tests failed",
            Self::Interrupted => "interrupted by signal",
        };
        f.write_str(msg)
    }
}
