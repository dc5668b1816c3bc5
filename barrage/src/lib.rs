#![cfg_attr(docsrs, feature(doc_cfg))]
//! Barrage runs a scenario function from a fixed number of virtual users for a fixed duration,
//! throttled to a requests-per-second ceiling, and reports the named checks each iteration
//! recorded.
//!
//! ```no_run
//! use barrage::prelude::*;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() {
//!     let report = status_page()
//!         .vus(2)
//!         .rps(2)
//!         .duration(Duration::from_secs(5))
//!         .await
//!         .expect("scheduler failed");
//!
//!     println!("{report}");
//! }
//!
//! #[scenario]
//! async fn status_page() -> Result<Iteration, reqwest::Error> {
//!     let res = reqwest::get("http://localhost:8080/status").await?;
//!     let response = Response::from_reqwest(res).await?;
//!     Ok(Iteration::new(response).check("status is 200", |r| r.status() == 200))
//! }
//! ```

extern crate self as barrage;

mod collector;
mod error;
#[cfg(feature = "http")]
#[cfg_attr(docsrs, doc(cfg(feature = "http")))]
mod http;
mod iteration;
mod limiter;
pub mod scenario;

pub use barrage_core as core;
pub use barrage_core::{
    CheckResult, CheckSummary, ConfigError, ErrorSummary, RunConfig, RunOptions, RunReport,
};
pub use barrage_macros::scenario;
pub use error::{ScenarioError, SchedulerError};
pub use iteration::{Iteration, Response};
pub use scenario::{ConfigurableScenario, RunResult, Scenario};

pub mod prelude {
    pub use crate::scenario::{ConfigurableScenario, RunResult, Scenario};
    pub use crate::{Iteration, Response, SchedulerError};
    pub use barrage_core::{RunOptions, RunReport};
    pub use barrage_macros::scenario;
}
