mod utils;
#[allow(unused)]
use utils::*;

use barrage::prelude::*;
use mock_service::MockState;
use std::num::NonZeroU32;
use std::sync::OnceLock;
use std::time::Duration;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ntest::timeout(20_000)]
async fn coupon_load_passes_all_checks() {
    init();
    let base_url = mock(MockState::new()).await;

    let report = Scenario::new("apply_coupon", move || {
        let base_url = base_url.clone();
        async move { apply_coupon(&base_url, "COUP838").await }
    })
    .vus(2)
    .duration(Duration::from_secs(5))
    .rps(2)
    .await
    .unwrap();

    assert!(report.iterations <= 10, "{report}");
    assert!(report.iterations >= 8, "{report}");
    assert_eq!(report.failed_iterations, 0);
    assert!(report.max_in_flight <= 2);

    let names: Vec<_> = report.checks.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(
        names,
        ["status is 200", "response has data", "discount amount exists"]
    );
    for check in &report.checks {
        assert_eq!(check.fails, 0);
        assert_eq!(check.passes, report.iterations);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ntest::timeout(20_000)]
async fn unknown_coupon_fails_checks_without_failing_iterations() {
    init();
    let base_url = mock(MockState::new()).await;

    let report = Scenario::new("unknown_coupon", move || {
        let base_url = base_url.clone();
        async move { apply_coupon(&base_url, "NOT-A-COUPON").await }
    })
    .vus(2)
    .duration(Duration::from_secs(2))
    .rps(4)
    .await
    .unwrap();

    assert!(report.iterations > 0);
    assert!(report.iterations <= 8);
    assert_eq!(report.failed_iterations, 0);
    assert_eq!(report.checks_passed(), 0);
    assert_eq!(report.checks_failed(), report.iterations * 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ntest::timeout(20_000)]
async fn server_rate_limit_shows_as_failed_checks() {
    init();
    let state = MockState::new().with_rate_limit(NonZeroU32::new(5).unwrap());
    let base_url = mock(state.clone()).await;

    let report = Scenario::new("limited", move || {
        let base_url = base_url.clone();
        async move { apply_coupon(&base_url, "COUP838").await }
    })
    .vus(4)
    .duration(Duration::from_secs(2))
    .rps(10)
    .await
    .unwrap();

    let status = report.check("status is 200").unwrap();
    assert!(status.passes > 0, "{report}");
    assert!(status.fails > 0, "{report}");
    assert_eq!(state.requests(), report.iterations);
}

static UNREACHABLE: &str = "http://127.0.0.1:1";

#[scenario]
async fn apply_coupon_unreachable() -> Result<Iteration, reqwest::Error> {
    apply_coupon(UNREACHABLE, "COUP838").await
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ntest::timeout(20_000)]
async fn connection_errors_are_recorded_not_fatal() {
    init();

    let report = apply_coupon_unreachable()
        .vus(2)
        .duration(Duration::from_secs(1))
        .rps(5)
        .await
        .unwrap();

    assert_eq!(report.name, "apply_coupon_unreachable");
    assert!(report.iterations > 0);
    assert!(report.iterations <= 5);
    assert_eq!(report.failed_iterations, report.iterations);
    assert!(report.checks.is_empty());
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].count, report.iterations);
}

static BASE_URL: OnceLock<String> = OnceLock::new();

#[scenario]
async fn apply_coupon_macro() -> Result<Iteration, reqwest::Error> {
    let base_url = BASE_URL.get().map(String::as_str).unwrap_or(UNREACHABLE);
    apply_coupon(base_url, "SAVE10").await
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ntest::timeout(20_000)]
async fn macro_scenario_with_options_overlay() {
    init();
    BASE_URL.set(mock(MockState::new()).await).unwrap();

    let options: RunOptions =
        serde_json::from_str(r#"{ "vus": 3, "duration": "2s", "rps": 3 }"#).unwrap();
    let report = apply_coupon_macro()
        .vus(10)
        .rps(50)
        .options(options)
        .await
        .unwrap();

    assert_eq!(report.name, "apply_coupon_macro");
    assert_eq!(report.config.virtual_users().get(), 3);
    assert_eq!(report.config.target_rps().get(), 3);
    assert!(report.iterations <= 6, "{report}");
    assert!(report.max_in_flight <= 3);
    assert_eq!(report.checks_failed(), 0);
}
