//! Stand-in for the coupon service endpoints exercised by the load tests.
//!
//! Answers with the same `{ message, success, data }` envelope as the real service but computes
//! discounts from a small fixed table. Not a coupon implementation.
use axum::{
    debug_handler,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use lazy_static::lazy_static;
use metrics::counter;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::{
    num::NonZeroU32,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

const BYTES_IN_MB: u64 = 1024 * 1024;
const MAX_DATA_SIZE_MB: u32 = 500;
const PREVIEW_LEN: usize = 1000;

#[derive(Clone, Default)]
pub struct MockState {
    limiter: Option<Arc<DefaultDirectRateLimiter>>,
    delay: Duration,
    requests: Arc<AtomicU64>,
}

impl MockState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject requests beyond `rps` per second with `429 Too Many Requests`.
    pub fn with_rate_limit(mut self, rps: NonZeroU32) -> Self {
        self.limiter = Some(Arc::new(rate_limiter(rps)));
        self
    }

    /// Sleep this long before answering each request.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Requests received so far, including rejected ones.
    pub fn requests(&self) -> u64 {
        self.requests.load(Ordering::Relaxed)
    }

    async fn admit(&self) -> Result<(), (StatusCode, Json<ApiResponse>)> {
        self.requests.fetch_add(1, Ordering::Relaxed);
        counter!("mock-service.requests").increment(1);

        if let Some(limiter) = &self.limiter {
            if limiter.check().is_err() {
                debug!("MOCK SERVER ___ RATE LIMITED");
                return Err(error(StatusCode::TOO_MANY_REQUESTS, "Too many requests"));
            }
        }

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(())
    }
}

pub fn router(state: MockState) -> Router {
    Router::new()
        .route("/api/v1/coupons/apply", post(apply_coupon))
        .route(
            "/api/v1/redis-data/get-large-data/:size_mb",
            get(get_large_data),
        )
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

pub async fn run(addr: SocketAddr, state: MockState) -> anyhow::Result<()> {
    let listener = TcpListener::bind(&addr).await?;
    info!("Mock service listening on {}", listener.local_addr()?);
    serve(listener, state).await
}

pub async fn serve(listener: TcpListener, state: MockState) -> anyhow::Result<()> {
    axum::serve(listener, router(state)).await?;
    Ok(())
}

/// Bind an ephemeral local port, serve in the background and return the bound address.
pub async fn spawn(state: MockState) -> anyhow::Result<SocketAddr> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        if let Err(err) = serve(listener, state).await {
            tracing::error!("Mock service stopped: {err}");
        }
    });
    Ok(addr)
}

/** Payloads **/

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse {
    pub message: String,
    pub success: bool,
    pub data: Value,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyCouponRequest {
    pub order_amount: i64,
    pub coupon_code: String,
}

#[derive(Clone, Copy, Debug)]
enum Discount {
    Fixed(i64),
    Percent { percent: i64, max: i64 },
}

#[derive(Clone, Copy, Debug)]
struct MockCoupon {
    discount: Discount,
    min_order: i64,
}

impl MockCoupon {
    fn discount_for(&self, order_amount: i64) -> i64 {
        let amount = match self.discount {
            Discount::Fixed(amount) => amount,
            Discount::Percent { percent, max } => (order_amount * percent / 100).min(max),
        };
        amount.min(order_amount)
    }
}

lazy_static! {
    static ref COUPONS: HashMap<&'static str, MockCoupon> = HashMap::from([
        (
            "COUP838",
            MockCoupon {
                discount: Discount::Fixed(20_000),
                min_order: 100_000,
            }
        ),
        (
            "SAVE10",
            MockCoupon {
                discount: Discount::Percent {
                    percent: 10,
                    max: 50_000,
                },
                min_order: 0,
            }
        ),
    ]);
}

/** Handlers **/

type Reply = (StatusCode, Json<ApiResponse>);

#[debug_handler]
pub async fn apply_coupon(
    State(state): State<MockState>,
    Json(req): Json<ApplyCouponRequest>,
) -> Result<Reply, Reply> {
    state.admit().await?;

    if req.order_amount <= 0 {
        return Err(error(
            StatusCode::BAD_REQUEST,
            "Order amount must be greater than 0",
        ));
    }

    let coupon = COUPONS.get(req.coupon_code.as_str()).ok_or_else(|| {
        error(
            StatusCode::NOT_FOUND,
            &format!("Cannot find coupon with code: {}", req.coupon_code),
        )
    })?;

    if coupon.min_order > req.order_amount {
        return Err(error(
            StatusCode::BAD_REQUEST,
            "The minimum order value of the coupon is greater than the order amount",
        ));
    }

    let discount_amount = coupon.discount_for(req.order_amount);
    Ok(success(
        StatusCode::OK,
        "Coupon applied successfully",
        json!({
            "discountAmount": discount_amount,
            "coupon": {
                "code": req.coupon_code,
                "minOrderValue": coupon.min_order,
            },
        }),
    ))
}

#[debug_handler]
pub async fn get_large_data(
    State(state): State<MockState>,
    Path(size_mb): Path<u32>,
) -> Result<Reply, Reply> {
    state.admit().await?;

    if size_mb == 0 {
        return Err(error(
            StatusCode::BAD_REQUEST,
            "Data size must be greater than 0 MB",
        ));
    }
    if size_mb > MAX_DATA_SIZE_MB {
        return Err(error(
            StatusCode::BAD_REQUEST,
            &format!("Data size cannot exceed {MAX_DATA_SIZE_MB} MB"),
        ));
    }

    let key = format!("large_data_{size_mb}mb");
    let preview: String = "This is a test data pattern for Redis storage. | "
        .chars()
        .cycle()
        .take(PREVIEW_LEN)
        .collect();

    Ok(success(
        StatusCode::OK,
        "Large data retrieved",
        json!({
            "key": key,
            "sizeBytes": u64::from(size_mb) * BYTES_IN_MB,
            "preview": preview,
        }),
    ))
}

/** Utils **/

fn success(status: StatusCode, message: &str, data: Value) -> Reply {
    (
        status,
        Json(ApiResponse {
            message: message.to_string(),
            success: true,
            data,
        }),
    )
}

fn error(status: StatusCode, message: &str) -> Reply {
    (
        status,
        Json(ApiResponse {
            message: message.to_string(),
            success: false,
            data: Value::Null,
        }),
    )
}

pub fn rate_limiter(rps: NonZeroU32) -> DefaultDirectRateLimiter {
    RateLimiter::direct(Quota::per_second(rps))
}
