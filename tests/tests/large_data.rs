mod utils;
#[allow(unused)]
use utils::*;

use barrage::prelude::*;
use mock_service::MockState;
use std::time::Duration;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ntest::timeout(20_000)]
async fn ten_users_for_one_second_stay_under_rate() {
    init();
    let state = MockState::new().with_delay(Duration::from_millis(20));
    let base_url = mock(state.clone()).await;

    let report = Scenario::new("get_large_data", move || {
        let base_url = base_url.clone();
        async move { get_large_data(&base_url, 50).await }
    })
    .vus(10)
    .duration(Duration::from_secs(1))
    .rps(10)
    .await
    .unwrap();

    assert!(report.iterations <= 10, "{report}");
    assert!(report.iterations >= 5, "{report}");
    assert_eq!(state.requests(), report.iterations);
    assert_eq!(report.check("status is 200").unwrap().fails, 0);
    assert!(report.latency_p50 >= Duration::from_millis(20));
    assert!(report.elapsed < Duration::from_millis(1_600));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ntest::timeout(20_000)]
async fn oversized_request_fails_check() {
    init();
    let base_url = mock(MockState::new()).await;

    let report = Scenario::new("too_large", move || {
        let base_url = base_url.clone();
        async move { get_large_data(&base_url, 501).await }
    })
    .vus(1)
    .duration(Duration::from_secs(1))
    .rps(3)
    .await
    .unwrap();

    let status = report.check("status is 200").unwrap();
    assert_eq!(status.passes, 0);
    assert_eq!(status.fails, report.iterations);
    assert!(report.iterations <= 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ntest::timeout(20_000)]
async fn slow_server_bounds_concurrency_by_users() {
    init();
    let base_url = mock(MockState::new().with_delay(Duration::from_millis(400))).await;

    let report = Scenario::new("slow", move || {
        let base_url = base_url.clone();
        async move { get_large_data(&base_url, 1).await }
    })
    .vus(2)
    .duration(Duration::from_secs(2))
    .rps(20)
    .await
    .unwrap();

    // Two users with 400ms responses cannot exceed roughly five iterations each.
    assert!(report.max_in_flight <= 2);
    assert!(report.iterations <= 12, "{report}");
    assert!(report.actual_rps() < 20.);
}
