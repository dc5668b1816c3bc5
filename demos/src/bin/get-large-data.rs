use anyhow::Context;
use barrage::prelude::*;
use clap::Parser;
use demos::{init_tracing, log_response, print_report, RunArgs};
use std::sync::OnceLock;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(version, about = "Fetch a large cached payload under load")]
struct Cli {
    #[command(flatten)]
    run: RunArgs,

    /// Payload size in megabytes
    #[arg(long, default_value_t = 50)]
    size: u32,
}

static CLIENT: OnceLock<reqwest::Client> = OnceLock::new();
static URL: OnceLock<String> = OnceLock::new();

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let options = cli.run.run_options(RunOptions {
        vus: Some(10),
        duration: Some(Duration::from_secs(1)),
        rps: Some(10),
    })?;

    let _ = CLIENT.set(cli.run.http_client()?);
    URL.get_or_init(|| {
        cli.run
            .url(&format!("/api/v1/redis-data/get-large-data/{}", cli.size))
    });

    let report = get_large_data().options(options).await?;
    print_report(&report, cli.run.json)
}

#[scenario]
async fn get_large_data() -> anyhow::Result<Iteration> {
    let client = CLIENT.get().context("http client not configured")?;
    let url = URL.get().context("url not configured")?;

    let res = client.get(url).send().await?;
    let response = Response::from_reqwest(res).await?;
    log_response(&response);

    Ok(Iteration::new(response).check("status is 200", |r| r.status() == 200))
}
