//! Shared command line handling for the load test binaries.
use anyhow::Context;
use barrage::{Response, RunOptions, RunReport};
use clap::Args;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Base URL of the service under test
    #[arg(long, default_value = "http://localhost:8080")]
    pub base_url: String,

    /// Number of virtual users
    #[arg(long)]
    pub vus: Option<usize>,

    /// Run duration, e.g. "5s" or "1m30s"
    #[arg(long, value_parser = humantime::parse_duration)]
    pub duration: Option<Duration>,

    /// Requests per second ceiling across all virtual users
    #[arg(long)]
    pub rps: Option<u32>,

    /// JSON file with `{ "vus": .., "duration": "..", "rps": .. }`
    #[arg(long)]
    pub options: Option<PathBuf>,

    /// Print the report as JSON instead of a summary
    #[arg(long)]
    pub json: bool,

    /// Per-request timeout
    #[arg(long, default_value = "60s", value_parser = humantime::parse_duration)]
    pub timeout: Duration,
}

impl RunArgs {
    /// Resolve run options: command line flags over the options file over `defaults`.
    pub fn run_options(&self, defaults: RunOptions) -> anyhow::Result<RunOptions> {
        let file = match &self.options {
            Some(path) => load_options(path)?,
            None => RunOptions::default(),
        };

        let flags = RunOptions {
            vus: self.vus,
            duration: self.duration,
            rps: self.rps,
        };

        Ok(defaults.merge(file).merge(flags))
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url.trim_end_matches('/'))
    }

    pub fn http_client(&self) -> anyhow::Result<reqwest::Client> {
        Ok(reqwest::Client::builder().timeout(self.timeout).build()?)
    }
}

pub fn load_options(path: &Path) -> anyhow::Result<RunOptions> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading options file {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing options file {}", path.display()))
}

pub fn init_tracing() {
    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("barrage=info,demos=info")),
        )
        .init();
}

/// Log the status and body of every response at debug level.
pub fn log_response(response: &Response) {
    debug!("Response {}: {}", response.status(), response.text());
}

pub fn print_report(report: &RunReport, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        println!("{report}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::io::Write;

    #[derive(Parser)]
    struct Cli {
        #[command(flatten)]
        run: RunArgs,
    }

    fn defaults() -> RunOptions {
        RunOptions {
            vus: Some(2),
            duration: Some(Duration::from_secs(5)),
            rps: Some(2),
        }
    }

    #[test]
    fn defaults_apply_without_flags() {
        let cli = Cli::parse_from(["demo"]);
        assert_eq!(cli.run.run_options(defaults()).unwrap(), defaults());
        assert_eq!(cli.run.timeout, Duration::from_secs(60));
        assert_eq!(
            cli.run.url("/api/v1/coupons/apply"),
            "http://localhost:8080/api/v1/coupons/apply"
        );
    }

    #[test]
    fn flags_override_file_override_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "duration": "30s", "rps": 50 }}"#).unwrap();

        let path = file.path().to_str().unwrap();
        let cli = Cli::parse_from(["demo", "--options", path, "--rps", "7"]);
        let opts = cli.run.run_options(defaults()).unwrap();

        assert_eq!(opts.vus, Some(2));
        assert_eq!(opts.duration, Some(Duration::from_secs(30)));
        assert_eq!(opts.rps, Some(7));
    }

    #[tracing_test::traced_test]
    #[test]
    fn response_body_is_logged() {
        log_response(&Response::new(200, r#"{"data":{"key":"large_data_50mb"}}"#));
        assert!(logs_contain("Response 200"));
        assert!(logs_contain("large_data_50mb"));
    }

    #[test]
    fn unknown_option_keys_are_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "iterations": 10 }}"#).unwrap();
        assert!(load_options(file.path()).is_err());
    }

    #[test]
    fn duration_flag_parses_human_strings() {
        let cli = Cli::parse_from(["demo", "--duration", "1m30s", "--base-url", "http://x:1/"]);
        assert_eq!(cli.run.duration, Some(Duration::from_secs(90)));
        assert_eq!(cli.run.url("/a"), "http://x:1/a");
    }
}
