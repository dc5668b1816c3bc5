use clap::Parser;
use mock_service::MockState;
use std::net::SocketAddr;
use std::num::NonZeroU32;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(version, about = "Local stand-in for the coupon service")]
struct Args {
    /// Address to listen on
    #[arg(short, long, default_value = "0.0.0.0:8080")]
    addr: SocketAddr,

    /// Answer with 429 beyond this many requests per second
    #[arg(long)]
    rps_limit: Option<NonZeroU32>,

    /// Artificial latency added to every response, e.g. "10ms"
    #[arg(long, value_parser = humantime::parse_duration)]
    delay: Option<Duration>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let mut state = MockState::new();
    if let Some(rps) = args.rps_limit {
        state = state.with_rate_limit(rps);
    }
    if let Some(delay) = args.delay {
        state = state.with_delay(delay);
    }

    mock_service::run(args.addr, state).await
}
