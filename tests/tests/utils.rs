use barrage::prelude::*;
use mock_service::MockState;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::OnceLock;
use tracing_subscriber::EnvFilter;

#[allow(unused)]
pub fn init() {
    static ONCE_LOCK: OnceLock<()> = OnceLock::new();

    ONCE_LOCK.get_or_init(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| EnvFilter::new("barrage=debug,mock_service=info")),
            )
            .with_test_writer()
            .try_init();
    });
}

#[allow(unused)]
pub async fn mock(state: MockState) -> String {
    let addr: SocketAddr = mock_service::spawn(state).await.unwrap();
    format!("http://{addr}")
}

#[allow(unused)]
pub fn client() -> &'static reqwest::Client {
    static CLIENT: OnceLock<reqwest::Client> = OnceLock::new();
    CLIENT.get_or_init(reqwest::Client::new)
}

/// One coupon application with the three checks the coupon load test records.
#[allow(unused)]
pub async fn apply_coupon(base_url: &str, code: &str) -> Result<Iteration, reqwest::Error> {
    let res = client()
        .post(format!("{base_url}/api/v1/coupons/apply"))
        .json(&json!({ "orderAmount": 200000, "couponCode": code }))
        .send()
        .await?;

    let response = Response::from_reqwest(res).await?;
    Ok(Iteration::new(response)
        .check("status is 200", |r| r.status() == 200)
        .check("response has data", |r| r.json_path("data").is_some())
        .check("discount amount exists", |r| {
            r.json_path("data.discountAmount").is_some()
        }))
}

#[allow(unused)]
pub async fn get_large_data(base_url: &str, size_mb: u32) -> Result<Iteration, reqwest::Error> {
    let res = client()
        .get(format!(
            "{base_url}/api/v1/redis-data/get-large-data/{size_mb}"
        ))
        .send()
        .await?;

    let response = Response::from_reqwest(res).await?;
    Ok(Iteration::new(response).check("status is 200", |r| r.status() == 200))
}
