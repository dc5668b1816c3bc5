use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use std::num::NonZeroU32;

/// Run-wide token source shared by every virtual user.
///
/// Tokens are spaced evenly at `1 / rps` with a burst of one, so no window of one second ever
/// sees more than `rps` tokens and unused capacity is never carried forward.
pub(crate) struct Limiter {
    inner: DefaultDirectRateLimiter,
    rps: NonZeroU32,
}

impl Limiter {
    pub fn new(rps: NonZeroU32) -> Self {
        Self {
            inner: rate_limiter(rps),
            rps,
        }
    }

    /// Wait until a token is available and take it.
    pub async fn acquire(&self) {
        self.inner.until_ready().await;
    }

    pub fn rps(&self) -> NonZeroU32 {
        self.rps
    }
}

fn rate_limiter(rps: NonZeroU32) -> DefaultDirectRateLimiter {
    RateLimiter::direct(Quota::per_second(rps).allow_burst(NonZeroU32::MIN))
}
