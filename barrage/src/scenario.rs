//! Scenario builder and the run loop
use crate::collector::ReportCollector;
use crate::error::SchedulerError;
use crate::iteration::Iteration;
use crate::limiter::Limiter;
use barrage_core::{ConfigError, RunConfig, RunOptions, RunReport, PROGRESS_INTERVAL};
use std::{
    fmt::Display,
    future::Future,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
    time::Duration,
};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
#[allow(unused_imports)]
use tracing::{debug, error, info, instrument, trace, warn, Instrument};

mod gate;
mod state;
mod vu;

use gate::Gate;
use state::RunState;
use vu::VirtualUser;

/// Outcome of awaiting a [`Scenario`].
pub type RunResult = Result<RunReport, SchedulerError>;

/// Load test scenario structure
///
/// Wraps a scenario function and the options it will run with. Awaiting it performs the run. Use
/// the [`#[scenario]`](barrage_macros::scenario) macro to generate one from an `async fn`, or build
/// one directly from a closure:
///
/// ```no_run
/// use barrage::prelude::*;
/// use std::time::Duration;
///
/// # async fn run() -> Result<(), SchedulerError> {
/// let report = Scenario::new("ping", || async {
///     Ok::<_, std::convert::Infallible>(Iteration::new(Response::new(200, "pong")))
/// })
/// .vus(2)
/// .rps(2)
/// .duration(Duration::from_secs(5))
/// .await?;
///
/// println!("{report}");
/// # Ok(())
/// # }
/// ```
pub struct Scenario<T> {
    func: T,
    name: String,
    options: RunOptions,
    runner_fut: Option<Pin<Box<dyn Future<Output = RunResult> + Send>>>,
}

// The scenario function is never pinned; only the boxed runner is polled.
impl<T> Unpin for Scenario<T> {}

impl<T> Scenario<T> {
    pub fn new(name: &str, func: T) -> Self {
        Self {
            func,
            name: name.to_string(),
            options: RunOptions::default(),
            runner_fut: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn run_options(&self) -> &RunOptions {
        &self.options
    }
}

impl<T, F, E> Future for Scenario<T>
where
    T: Fn() -> F + Send + Sync + 'static + Clone,
    F: Future<Output = Result<Iteration, E>> + Send + 'static,
    E: Display + Send + 'static,
{
    type Output = RunResult;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        let runner = this.runner_fut.get_or_insert_with(|| {
            let func = this.func.clone();
            let name = this.name.clone();
            let options = this.options.clone();
            Box::pin(async move { run_scenario(func, name, options, RunState::new()).await })
        });
        runner.as_mut().poll(cx)
    }
}

pub trait ConfigurableScenario<T: Send>: Future<Output = T> + Sized + Send {
    fn vus(self, vus: usize) -> Self;
    fn duration(self, duration: Duration) -> Self;
    fn rps(self, rps: u32) -> Self;
    fn options(self, options: RunOptions) -> Self;
}

impl<T, F, E> ConfigurableScenario<RunResult> for Scenario<T>
where
    T: Fn() -> F + Send + Sync + 'static + Clone,
    F: Future<Output = Result<Iteration, E>> + Send + 'static,
    E: Display + Send + 'static,
{
    /// Number of concurrent virtual users. Defaults to 1.
    ///
    /// # Example
    /// ```no_run
    /// use barrage::prelude::*;
    /// use std::time::Duration;
    ///
    /// #[tokio::main]
    /// async fn main() {
    ///     let _ = my_scenario()
    ///         .vus(10)
    ///         .rps(10)
    ///         .duration(Duration::from_secs(1))
    ///         .await;
    /// }
    ///
    /// #[scenario]
    /// async fn my_scenario() -> Result<Iteration, std::io::Error> {
    ///     Ok(Iteration::new(Response::new(200, "")))
    /// }
    /// ```
    fn vus(mut self, vus: usize) -> Self {
        self.options.vus = Some(vus);
        self
    }

    /// Wall-clock length of the run. Required.
    ///
    /// Once it elapses no new iterations start; in-flight ones are allowed to finish.
    fn duration(mut self, duration: Duration) -> Self {
        self.options.duration = Some(duration);
        self
    }

    /// Ceiling on iterations started per second across all virtual users. Required.
    fn rps(mut self, rps: u32) -> Self {
        self.options.rps = Some(rps);
        self
    }

    /// Overlay a full set of options, e.g. loaded from a file. Fields set in `options` win over
    /// anything configured earlier.
    fn options(mut self, options: RunOptions) -> Self {
        self.options = self.options.merge(options);
        self
    }
}

#[instrument(name = "scenario", skip_all, fields(name = %name))]
pub(crate) async fn run_scenario<T, F, E>(
    scenario: T,
    name: String,
    options: RunOptions,
    state: RunState,
) -> RunResult
where
    T: Fn() -> F + Send + Sync + 'static + Clone,
    F: Future<Output = Result<Iteration, E>> + Send + 'static,
    E: Display + Send + 'static,
{
    let config = RunConfig::try_from(&options)?;
    let handle = Handle::try_current().map_err(|_| SchedulerError::NoRuntime)?;
    info!("Running {name} with config {config:?}");

    let collector = Arc::new(ReportCollector::new(&name)?);

    state.advance();
    let start = Instant::now();
    // NOTE: The limiter is built after `start` so its first token never precedes the run.
    let limiter = Arc::new(Limiter::new(config.target_rps()));
    let Some(gate) = Gate::new(start, &config) else {
        error!("Run deadline is out of range for this platform");
        state.advance();
        state.advance();
        return Err(SchedulerError::Config(ConfigError::DurationTooLong));
    };
    let gate = Arc::new(gate);

    let mut tasks: Vec<JoinHandle<u64>> = (0..config.virtual_users().get())
        .map(|id| {
            let vu = VirtualUser {
                id,
                scenario: scenario.clone(),
                gate: gate.clone(),
                limiter: limiter.clone(),
                collector: collector.clone(),
                phase: state.subscribe(),
            };
            handle.spawn(vu.run().in_current_span())
        })
        .collect();
    debug!(
        "Spawned {} virtual users at {} rps",
        tasks.len(),
        limiter.rps()
    );

    wait_for_deadline(&gate, &collector, start).await;

    state.advance();
    info!(
        "Duration elapsed; draining {} in-flight iterations",
        collector.in_flight()
    );

    let mut lost = None;
    for (vu, task) in tasks.iter_mut().enumerate() {
        match task.await {
            Ok(count) => trace!("Virtual user {vu} ran {count} iterations"),
            Err(source) => {
                error!("Virtual user {vu} was lost: {source}");
                lost = Some(SchedulerError::WorkerLost { vu, source });
                break;
            }
        }
    }

    if let Some(err) = lost {
        for task in &tasks {
            task.abort();
        }
        state.advance();
        return Err(err);
    }

    let report = collector.freeze(&name, config, start.elapsed());
    state.advance();

    info!(
        "Scenario complete: {} iterations, {} checks passed, {} failed",
        report.iterations,
        report.checks_passed(),
        report.checks_failed()
    );

    Ok(report)
}

async fn wait_for_deadline(gate: &Gate, collector: &ReportCollector, start: Instant) {
    let mut progress = tokio::time::interval_at(start + PROGRESS_INTERVAL, PROGRESS_INTERVAL);
    progress.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let deadline = tokio::time::sleep_until(gate.deadline());
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            _ = &mut deadline => break,
            _ = progress.tick() => {
                debug!(
                    "{} elapsed, {} iterations, {} in flight",
                    humantime::format_duration(Duration::from_secs(start.elapsed().as_secs())),
                    collector.completed(),
                    collector.in_flight(),
                );
            }
        }
    }
}
