use super::gate::Gate;
use super::state::RunPhase;
use crate::collector::ReportCollector;
use crate::error::ScenarioError;
use crate::iteration::Iteration;
use crate::limiter::Limiter;
use futures_util::FutureExt;
use std::fmt::Display;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::Instant;
#[allow(unused)]
use tracing::{debug, error, info, instrument, trace, warn};

/// One simulated client: acquire a token, run the scenario, record, repeat.
pub(crate) struct VirtualUser<T> {
    pub id: usize,
    pub scenario: T,
    pub gate: Arc<Gate>,
    pub limiter: Arc<Limiter>,
    pub collector: Arc<ReportCollector>,
    pub phase: watch::Receiver<RunPhase>,
}

impl<T, F, E> VirtualUser<T>
where
    T: Fn() -> F + Send + Sync + 'static,
    F: Future<Output = Result<Iteration, E>> + Send + 'static,
    E: Display + Send + 'static,
{
    #[instrument(name = "vu", skip_all, fields(id = self.id))]
    pub async fn run(mut self) -> u64 {
        let mut iterations = 0;
        loop {
            if !self.gate.is_open(*self.phase.borrow()) {
                break;
            }

            tokio::select! {
                biased;
                _ = self.gate.closed(&mut self.phase) => break,
                _ = self.limiter.acquire() => {}
            }

            // The token may have been granted after the deadline.
            if !self.gate.is_open(*self.phase.borrow()) || !self.gate.claim() {
                break;
            }

            let start = Instant::now();
            let outcome = {
                let _in_flight = self.collector.enter();
                AssertUnwindSafe((self.scenario)()).catch_unwind().await
            };
            let latency = start.elapsed();

            let outcome = match outcome {
                Ok(Ok(iteration)) => Ok(iteration),
                Ok(Err(err)) => {
                    debug!("Scenario error: {err}");
                    Err(ScenarioError::Failed(err.to_string()))
                }
                Err(payload) => {
                    let err = ScenarioError::from_panic(payload);
                    warn!("{err}");
                    Err(err)
                }
            };

            trace!("Iteration {iterations} finished in {latency:?}");
            self.collector.record(latency, outcome);
            iterations += 1;
        }

        trace!("Stopping after {iterations} iterations");
        iterations
    }
}
