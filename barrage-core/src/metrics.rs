/// Metric names emitted by a run when the `metrics` feature of `barrage` is enabled.
///
/// Every metric carries a `scenario` label with the scenario name.
#[derive(Copy, Clone, Debug)]
pub struct MetricLabels {
    pub iterations: &'static str,
    pub failed: &'static str,
    pub checks: &'static str,
    pub latency: &'static str,
    pub in_flight: &'static str,
}

pub const METRIC_LABELS: MetricLabels = MetricLabels {
    iterations: "barrage.iterations",
    failed: "barrage.iterations.failed",
    checks: "barrage.checks",
    latency: "barrage.latency",
    in_flight: "barrage.in_flight",
};
