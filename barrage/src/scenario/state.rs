use tokio::sync::watch;
#[allow(unused)]
use tracing::{debug, error, info, trace, warn};

/// Lifecycle of a single run. Phases only ever move forward, one step at a time.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum RunPhase {
    /// Configuration accepted, no virtual users started.
    Idle,
    /// Virtual users active, deadline counting down.
    Running,
    /// Deadline reached; no new iterations start, in-flight ones finish.
    Draining,
    /// Report frozen and returned.
    Finished,
}

impl RunPhase {
    fn next(self) -> Option<RunPhase> {
        match self {
            RunPhase::Idle => Some(RunPhase::Running),
            RunPhase::Running => Some(RunPhase::Draining),
            RunPhase::Draining => Some(RunPhase::Finished),
            RunPhase::Finished => None,
        }
    }
}

pub(crate) struct RunState {
    tx: watch::Sender<RunPhase>,
}

impl RunState {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(RunPhase::Idle);
        Self { tx }
    }

    pub fn subscribe(&self) -> watch::Receiver<RunPhase> {
        self.tx.subscribe()
    }

    /// Move to the next phase and return it. Calling this once `Finished` is a no-op.
    pub fn advance(&self) -> RunPhase {
        let mut moved = None;
        self.tx.send_if_modified(|phase| match phase.next() {
            Some(next) => {
                *phase = next;
                moved = Some(next);
                true
            }
            None => false,
        });

        match moved {
            Some(phase) => {
                debug!("Run phase is now {phase:?}");
                phase
            }
            None => {
                warn!("Run already finished; ignoring phase change.");
                RunPhase::Finished
            }
        }
    }
}
