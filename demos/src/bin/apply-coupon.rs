use anyhow::Context;
use barrage::prelude::*;
use clap::Parser;
use demos::{init_tracing, log_response, print_report, RunArgs};
use serde_json::json;
use std::sync::OnceLock;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(version, about = "Apply a coupon under load")]
struct Cli {
    #[command(flatten)]
    run: RunArgs,

    #[arg(long, default_value = "COUP838")]
    coupon_code: String,

    #[arg(long, default_value_t = 200_000)]
    order_amount: i64,
}

static CLIENT: OnceLock<reqwest::Client> = OnceLock::new();
static REQUEST: OnceLock<(String, serde_json::Value)> = OnceLock::new();

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let options = cli.run.run_options(RunOptions {
        vus: Some(2),
        duration: Some(Duration::from_secs(5)),
        rps: Some(2),
    })?;

    let _ = CLIENT.set(cli.run.http_client()?);
    REQUEST.get_or_init(|| {
        (
            cli.run.url("/api/v1/coupons/apply"),
            json!({ "orderAmount": cli.order_amount, "couponCode": cli.coupon_code }),
        )
    });

    let report = apply_coupon().options(options).await?;
    print_report(&report, cli.run.json)
}

#[scenario]
async fn apply_coupon() -> anyhow::Result<Iteration> {
    let client = CLIENT.get().context("http client not configured")?;
    let (url, body) = REQUEST.get().context("coupon request not configured")?;

    let res = client.post(url.as_str()).json(body).send().await?;
    let response = Response::from_reqwest(res).await?;
    log_response(&response);

    Ok(Iteration::new(response)
        .check("status is 200", |r| r.status() == 200)
        .check("response has data", |r| r.json_path("data").is_some())
        .check("discount amount exists", |r| {
            r.json_path("data.discountAmount").is_some()
        }))
}
