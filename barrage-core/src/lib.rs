mod config;
mod constants;
mod metrics;
mod serde_duration;
mod stats;

pub use config::*;
pub use constants::*;
pub use metrics::*;
pub use stats::*;
