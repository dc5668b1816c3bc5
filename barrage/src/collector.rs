use crate::error::ScenarioError;
use crate::iteration::Iteration;
use barrage_core::{
    CheckResult, CheckSummary, ErrorSummary, RunConfig, RunReport, MAX_DISTINCT_ERRORS,
};
use hdrhistogram::{CreationError, Histogram};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
#[allow(unused)]
use tracing::{debug, error, info, trace, warn};

const LATENCY_SIGFIGS: u8 = 3;

/// Running totals shared by all virtual users of a run.
///
/// Each completed iteration is folded in under a single lock, so readers never observe a
/// partially applied iteration. Memory is bounded by the number of distinct check names and
/// error messages, not by the length of the run.
pub(crate) struct ReportCollector {
    #[cfg_attr(not(feature = "metrics"), allow(unused))]
    name: String,
    totals: Mutex<Totals>,
    completed: AtomicU64,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

struct Totals {
    iterations: u64,
    failed_iterations: u64,
    checks: Vec<CheckSummary>,
    check_idx: HashMap<String, usize>,
    errors: Vec<ErrorSummary>,
    latency_us: Histogram<u64>,
}

impl Totals {
    fn add_check(&mut self, result: CheckResult) {
        let idx = match self.check_idx.get(&result.name) {
            Some(idx) => *idx,
            None => {
                self.checks.push(CheckSummary {
                    name: result.name.clone(),
                    passes: 0,
                    fails: 0,
                });
                self.check_idx.insert(result.name, self.checks.len() - 1);
                self.checks.len() - 1
            }
        };

        if result.passed {
            self.checks[idx].passes += 1;
        } else {
            self.checks[idx].fails += 1;
        }
    }

    fn add_error(&mut self, err: &ScenarioError) {
        self.failed_iterations += 1;

        let message = err.to_string();
        if let Some(summary) = self.errors.iter_mut().find(|e| e.message == message) {
            summary.count += 1;
        } else if self.errors.len() < MAX_DISTINCT_ERRORS {
            self.errors.push(ErrorSummary { message, count: 1 });
        }
    }

    fn quantile(&self, quantile: f64) -> Duration {
        if self.latency_us.is_empty() {
            Duration::ZERO
        } else {
            Duration::from_micros(self.latency_us.value_at_quantile(quantile))
        }
    }
}

impl ReportCollector {
    pub fn new(name: &str) -> Result<Self, CreationError> {
        Ok(Self {
            name: name.to_string(),
            totals: Mutex::new(Totals {
                iterations: 0,
                failed_iterations: 0,
                checks: vec![],
                check_idx: HashMap::new(),
                errors: vec![],
                latency_us: Histogram::new(LATENCY_SIGFIGS)?,
            }),
            completed: AtomicU64::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        })
    }

    /// Mark a scenario invocation as in flight until the returned guard is dropped.
    pub fn enter(&self) -> InFlightGuard<'_> {
        let now = self.in_flight.fetch_add(1, Ordering::AcqRel) + 1;
        self.max_in_flight.fetch_max(now, Ordering::AcqRel);

        #[cfg(feature = "metrics")]
        self.emit_in_flight(now);

        InFlightGuard { collector: self }
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Number of iterations recorded so far.
    pub fn completed(&self) -> u64 {
        self.completed.load(Ordering::Relaxed)
    }

    pub fn record(&self, latency: Duration, outcome: Result<Iteration, ScenarioError>) {
        let outcome = outcome.map(|iteration| iteration.into_parts().1);

        #[cfg(feature = "metrics")]
        self.emit_metrics(latency, &outcome);

        let micros = u64::try_from(latency.as_micros()).unwrap_or(u64::MAX);
        {
            let mut totals = self.lock();
            totals.iterations += 1;
            if let Err(err) = totals.latency_us.record(micros) {
                warn!("Dropping latency sample of {latency:?}: {err}");
            }

            match outcome {
                Ok(results) => results.into_iter().for_each(|r| totals.add_check(r)),
                Err(err) => totals.add_error(&err),
            }
        }
        self.completed.fetch_add(1, Ordering::Relaxed);
    }

    /// Build the immutable report from everything recorded so far.
    pub fn freeze(&self, name: &str, config: RunConfig, elapsed: Duration) -> RunReport {
        let totals = self.lock();

        RunReport {
            name: name.to_string(),
            config,
            iterations: totals.iterations,
            failed_iterations: totals.failed_iterations,
            checks: totals.checks.clone(),
            errors: totals.errors.clone(),
            elapsed,
            max_in_flight: self.max_in_flight.load(Ordering::Acquire),
            latency_p50: totals.quantile(0.5),
            latency_p90: totals.quantile(0.9),
            latency_p99: totals.quantile(0.99),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Totals> {
        // A panic while holding the lock leaves the totals consistent up to the last iteration.
        self.totals
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    #[cfg(feature = "metrics")]
    fn emit_in_flight(&self, now: usize) {
        metrics::gauge!(barrage_core::METRIC_LABELS.in_flight, "scenario" => self.name.clone())
            .set(now as f64);
    }

    #[cfg(feature = "metrics")]
    fn emit_metrics(&self, latency: Duration, outcome: &Result<Vec<CheckResult>, ScenarioError>) {
        let labels = barrage_core::METRIC_LABELS;
        metrics::counter!(labels.iterations, "scenario" => self.name.clone()).increment(1);
        metrics::histogram!(labels.latency, "scenario" => self.name.clone())
            .record(latency.as_secs_f64());

        match outcome {
            Ok(checks) => {
                for check in checks {
                    let status = if check.passed { "pass" } else { "fail" };
                    metrics::counter!(
                        labels.checks,
                        "scenario" => self.name.clone(),
                        "check" => check.name.clone(),
                        "status" => status
                    )
                    .increment(1);
                }
            }
            Err(_) => {
                metrics::counter!(labels.failed, "scenario" => self.name.clone()).increment(1);
            }
        }
    }
}

pub(crate) struct InFlightGuard<'a> {
    collector: &'a ReportCollector,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        let _now = self.collector.in_flight.fetch_sub(1, Ordering::AcqRel) - 1;

        #[cfg(feature = "metrics")]
        self.collector.emit_in_flight(_now);
    }
}
