use crate::{DEFAULT_VIRTUAL_USERS, MAX_RUN_DURATION, MAX_VIRTUAL_USERS};
use serde::{Deserialize, Serialize};
use std::num::{NonZeroU32, NonZeroUsize};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("`vus` must be a positive integer")]
    InvalidVirtualUsers,

    #[error("`vus` may not exceed {}", MAX_VIRTUAL_USERS)]
    TooManyVirtualUsers,

    #[error("`rps` must be a positive integer")]
    InvalidRps,

    #[error("`rps` is required")]
    MissingRps,

    #[error("`duration` must be greater than zero")]
    InvalidDuration,

    #[error("`duration` may not exceed one year")]
    DurationTooLong,

    #[error("`duration` is required")]
    MissingDuration,
}

/// Loose run options, as written in a script or options file.
///
/// Field names follow the familiar `{ vus, duration, rps }` shape, with the duration written as a
/// human readable string:
///
/// ```
/// # use barrage_core::RunOptions;
/// let opts: RunOptions = serde_json::from_str(r#"{ "vus": 2, "duration": "5s", "rps": 2 }"#).unwrap();
/// assert_eq!(opts.vus, Some(2));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vus: Option<usize>,
    #[serde(
        default,
        with = "crate::serde_duration::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub duration: Option<Duration>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rps: Option<u32>,
}

impl RunOptions {
    /// Overlay `other` on top of `self`; fields set in `other` win.
    pub fn merge(self, other: RunOptions) -> RunOptions {
        RunOptions {
            vus: other.vus.or(self.vus),
            duration: other.duration.or(self.duration),
            rps: other.rps.or(self.rps),
        }
    }
}

/// Validated, immutable configuration for a single run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct RunConfig {
    virtual_users: NonZeroUsize,
    #[serde(with = "crate::serde_duration")]
    duration: Duration,
    target_rps: NonZeroU32,
}

impl RunConfig {
    pub fn new(virtual_users: usize, duration: Duration, target_rps: u32) -> Result<Self, ConfigError> {
        let virtual_users =
            NonZeroUsize::new(virtual_users).ok_or(ConfigError::InvalidVirtualUsers)?;
        if virtual_users.get() > MAX_VIRTUAL_USERS {
            return Err(ConfigError::TooManyVirtualUsers);
        }
        let target_rps = NonZeroU32::new(target_rps).ok_or(ConfigError::InvalidRps)?;
        if duration.is_zero() {
            return Err(ConfigError::InvalidDuration);
        }
        if duration > MAX_RUN_DURATION {
            return Err(ConfigError::DurationTooLong);
        }

        Ok(Self {
            virtual_users,
            duration,
            target_rps,
        })
    }

    pub fn virtual_users(&self) -> NonZeroUsize {
        self.virtual_users
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn target_rps(&self) -> NonZeroU32 {
        self.target_rps
    }

    /// Upper bound on iterations a run may start: `rps` per started second of `duration`.
    pub fn iteration_budget(&self) -> u64 {
        let per_window = self.target_rps.get() as u128;
        let nanos = self.duration.as_nanos();
        let window = crate::RATE_WINDOW.as_nanos();
        let windows = nanos.div_ceil(window);
        u64::try_from(per_window * windows).unwrap_or(u64::MAX)
    }
}

impl TryFrom<&RunOptions> for RunConfig {
    type Error = ConfigError;

    fn try_from(opts: &RunOptions) -> Result<Self, Self::Error> {
        let duration = opts.duration.ok_or(ConfigError::MissingDuration)?;
        let rps = opts.rps.ok_or(ConfigError::MissingRps)?;
        RunConfig::new(opts.vus.unwrap_or(DEFAULT_VIRTUAL_USERS), duration, rps)
    }
}

impl From<RunConfig> for RunOptions {
    fn from(config: RunConfig) -> Self {
        RunOptions {
            vus: Some(config.virtual_users.get()),
            duration: Some(config.duration),
            rps: Some(config.target_rps.get()),
        }
    }
}
