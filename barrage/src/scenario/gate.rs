use super::state::RunPhase;
use barrage_core::RunConfig;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::watch;
use tokio::time::Instant;

/// Decides whether a virtual user may start another iteration.
///
/// An iteration may start while the run is `Running`, the deadline has not passed and the
/// run-wide iteration budget (`rps` per started second) is not used up.
#[derive(Debug)]
pub(crate) struct Gate {
    deadline: Instant,
    budget: u64,
    claimed: AtomicU64,
}

impl Gate {
    /// Returns `None` if the deadline is not representable as an `Instant`.
    pub fn new(start: Instant, config: &RunConfig) -> Option<Self> {
        Some(Self {
            deadline: start.checked_add(config.duration())?,
            budget: config.iteration_budget(),
            claimed: AtomicU64::new(0),
        })
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    pub fn is_open(&self, phase: RunPhase) -> bool {
        phase == RunPhase::Running && Instant::now() < self.deadline
    }

    /// Claim one iteration from the budget.
    pub fn claim(&self) -> bool {
        self.claimed.fetch_add(1, Ordering::AcqRel) < self.budget
    }

    /// Resolves once the deadline passes or the run leaves `Running`.
    pub async fn closed(&self, phase: &mut watch::Receiver<RunPhase>) {
        tokio::select! {
            _ = tokio::time::sleep_until(self.deadline) => {}
            _ = wait_not_running(phase) => {}
        }
    }
}

async fn wait_not_running(phase: &mut watch::Receiver<RunPhase>) {
    loop {
        let current = *phase.borrow_and_update();
        if current != RunPhase::Running {
            return;
        }
        if phase.changed().await.is_err() {
            return;
        }
    }
}
