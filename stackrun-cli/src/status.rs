//! Colored per-phase status lines.
//!
//! `tracing` carries the diagnostic detail; these lines are the terse
//! operator-facing progress report, kept on stdout so they survive
//! `RUST_LOG` filtering.

use colored::Colorize;

use stackrun_core::outcome::RunOutcome;

/// A phase is beginning ("starting dependency stack", ...).
pub fn phase(msg: &str) {
    println!("{} {msg}", "==>".blue().bold());
}

/// A phase completed successfully.
pub fn success(msg: &str) {
    println!("{} {msg}", "ok:".green().bold());
}

/// Non-fatal problem (teardown failure, signal received).
pub fn warn(msg: &str) {
    println!("{} {msg}", "warn:".yellow().bold());
}

/// Fatal problem; goes to stderr.
pub fn error(msg: &str) {
    eprintln!("{} {msg}", "error:".red().bold());
}

/// Final banner for the whole run, green on success and red otherwise.
pub fn banner(outcome: RunOutcome) {
    let line = format!("stackrun: {outcome}");
    if outcome.is_success() {
        println!("{}", line.green().bold());
    } else {
        println!("{}", line.red().bold());
    }
}
