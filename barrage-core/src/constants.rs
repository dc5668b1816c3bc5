use std::time::Duration;

/// Virtual users used when a run does not set `vus`.
pub const DEFAULT_VIRTUAL_USERS: usize = 1;

/// Most virtual users a single run may spawn.
pub const MAX_VIRTUAL_USERS: usize = 100_000;

/// Longest duration a single run may be configured with.
pub const MAX_RUN_DURATION: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Width of the window the limiter's `rps` ceiling applies to.
pub const RATE_WINDOW: Duration = Duration::from_secs(1);

/// Interval between progress log lines while a run is active.
pub const PROGRESS_INTERVAL: Duration = Duration::from_secs(1);

/// Distinct scenario error messages kept in a report. Further messages are
/// still counted as failed iterations.
pub const MAX_DISTINCT_ERRORS: usize = 16;
