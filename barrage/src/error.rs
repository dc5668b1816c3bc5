use barrage_core::ConfigError;
use thiserror::Error;

/// Errors that abort a run. A run either returns a complete report or one of these.
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("Invalid run configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("No tokio runtime available to spawn virtual users")]
    NoRuntime,

    #[error("Could not allocate the latency histogram: {0}")]
    Histogram(#[from] hdrhistogram::CreationError),

    #[error("Virtual user {vu} terminated unexpectedly: {source}")]
    WorkerLost {
        vu: usize,
        #[source]
        source: tokio::task::JoinError,
    },
}

/// Failure of a single scenario invocation. Recorded in the report, never propagated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScenarioError {
    #[error("{0}")]
    Failed(String),

    #[error("scenario panicked: {0}")]
    Panicked(String),
}

impl ScenarioError {
    pub(crate) fn from_panic(payload: Box<dyn std::any::Any + Send>) -> Self {
        let msg = if let Some(s) = payload.downcast_ref::<&'static str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic payload".to_string()
        };
        ScenarioError::Panicked(msg)
    }
}
