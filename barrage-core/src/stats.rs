use crate::RunConfig;
use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// Outcome of a single named check within one iteration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CheckResult {
    pub name: String,
    pub passed: bool,
}

impl CheckResult {
    pub fn new(name: impl Into<String>, passed: bool) -> Self {
        Self {
            name: name.into(),
            passed,
        }
    }
}

/// Pass/fail counts for one check name across a run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CheckSummary {
    pub name: String,
    pub passes: u64,
    pub fails: u64,
}

impl CheckSummary {
    pub fn total(&self) -> u64 {
        self.passes + self.fails
    }
}

/// A distinct scenario error message and how many iterations failed with it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ErrorSummary {
    pub message: String,
    pub count: u64,
}

/// Final statistics for a run. Built once when the run finishes and never modified afterwards.
#[derive(Clone, Debug, Serialize)]
pub struct RunReport {
    pub name: String,
    pub config: RunConfig,
    /// Completed iterations, including failed ones.
    pub iterations: u64,
    /// Iterations whose scenario returned an error or panicked.
    pub failed_iterations: u64,
    /// Per-check counts, in the order each check name was first recorded.
    pub checks: Vec<CheckSummary>,
    pub errors: Vec<ErrorSummary>,
    #[serde(with = "crate::serde_duration")]
    pub elapsed: Duration,
    /// Highest number of scenario invocations observed in flight at once.
    pub max_in_flight: usize,
    #[serde(with = "crate::serde_duration")]
    pub latency_p50: Duration,
    #[serde(with = "crate::serde_duration")]
    pub latency_p90: Duration,
    #[serde(with = "crate::serde_duration")]
    pub latency_p99: Duration,
}

impl RunReport {
    pub fn check(&self, name: &str) -> Option<&CheckSummary> {
        self.checks.iter().find(|c| c.name == name)
    }

    pub fn checks_passed(&self) -> u64 {
        self.checks.iter().map(|c| c.passes).sum()
    }

    pub fn checks_failed(&self) -> u64 {
        self.checks.iter().map(|c| c.fails).sum()
    }

    /// Completed iterations per second over the whole run.
    pub fn actual_rps(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0. {
            self.iterations as f64 / secs
        } else {
            0.
        }
    }

    pub fn error_rate(&self) -> f64 {
        if self.iterations == 0 {
            0.
        } else {
            self.failed_iterations as f64 / self.iterations as f64
        }
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "scenario: {}", self.name)?;
        writeln!(
            f,
            "  vus={}, duration={}, rps={}",
            self.config.virtual_users(),
            humantime::format_duration(self.config.duration()),
            self.config.target_rps(),
        )?;
        writeln!(f)?;

        for check in &self.checks {
            let mark = if check.fails == 0 { '✓' } else { '✗' };
            let rate = check.passes as f64 / check.total().max(1) as f64 * 100.;
            writeln!(
                f,
                "  {mark} {:<32} {:>6.2}% ✓ {} ✗ {}",
                check.name, rate, check.passes, check.fails
            )?;
        }
        if !self.checks.is_empty() {
            writeln!(f)?;
        }

        writeln!(
            f,
            "  checks...........: {} passed, {} failed",
            self.checks_passed(),
            self.checks_failed()
        )?;
        writeln!(
            f,
            "  iterations.......: {} ({:.2}/s), {} failed",
            self.iterations,
            self.actual_rps(),
            self.failed_iterations
        )?;
        writeln!(
            f,
            "  latency..........: p50={:?}, p90={:?}, p99={:?}",
            self.latency_p50, self.latency_p90, self.latency_p99
        )?;
        writeln!(f, "  max in flight....: {}", self.max_in_flight)?;
        write!(
            f,
            "  elapsed..........: {}",
            humantime::format_duration(self.elapsed)
        )?;

        for error in &self.errors {
            write!(f, "\n  error x{}: {}", error.count, error.message)?;
        }

        Ok(())
    }
}
