//! Request spacing and retry control for source adapters.
//!
//! Every adapter call in the resolver goes through [`Throttle::call`]. A
//! keyed [`governor`] limiter enforces a minimum delay between consecutive
//! calls to the same source (shared across batch workers, so parallelism
//! never violates a source's pacing), and an explicit [`RetryPolicy`]
//! drives backoff independent of any adapter's control flow.

use std::future::Future;
use std::num::NonZeroU32;
use std::time::Duration;

use governor::clock::DefaultClock;
use governor::state::keyed::DefaultKeyedStateStore;
use governor::{Quota, RateLimiter};
use tracing::warn;

use crate::error::SourceError;
use crate::models::SourceKind;

/// Backoff parameters consumed by the controller.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts allowed when a source keeps signalling rate limits.
    pub max_attempts: u32,
    /// Delay before the first backoff retry.
    pub base_delay: Duration,
    /// Growth factor applied per rate-limit retry.
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Backoff delay before retry number `attempt` (zero-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let millis = self.base_delay.as_millis() as f64 * self.multiplier.powi(attempt as i32);
        Duration::from_millis(millis as u64)
    }
}

type KeyedLimiter = RateLimiter<SourceKind, DefaultKeyedStateStore<SourceKind>, DefaultClock>;

/// Shared pacing and retry wrapper around adapter calls.
pub struct Throttle {
    limiter: KeyedLimiter,
    policy: RetryPolicy,
}

impl Throttle {
    /// `min_delay` is the spacing between consecutive calls to one source.
    pub fn new(min_delay: Duration, policy: RetryPolicy) -> Self {
        let min_delay = min_delay.max(Duration::from_millis(1));
        let quota = Quota::with_period(min_delay)
            .unwrap_or_else(|| Quota::per_second(NonZeroU32::new(1).unwrap()));
        Self {
            limiter: RateLimiter::keyed(quota),
            policy,
        }
    }

    /// Run `op` against `source`, waiting out the per-source spacing first.
    ///
    /// Rate-limit signals back off exponentially (honoring a server-sent
    /// `retry_after`) up to the policy ceiling. A transient failure earns
    /// exactly one extra attempt. Definitive failures surface immediately.
    pub async fn call<T, F, Fut>(&self, source: SourceKind, op: F) -> Result<T, SourceError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, SourceError>>,
    {
        let mut rate_retries = 0u32;
        let mut transient_retried = false;

        loop {
            self.limiter.until_key_ready(&source).await;

            match op().await {
                Ok(value) => return Ok(value),
                Err(SourceError::RateLimited { retry_after })
                    if rate_retries + 1 < self.policy.max_attempts =>
                {
                    let wait = retry_after
                        .map(Duration::from_secs)
                        .unwrap_or_else(|| self.policy.delay_for(rate_retries));
                    warn!(
                        source = %source,
                        retry = rate_retries + 1,
                        wait_ms = wait.as_millis() as u64,
                        "source rate limited, backing off"
                    );
                    tokio::time::sleep(wait).await;
                    rate_retries += 1;
                }
                Err(e) if e.is_transient() && !transient_retried => {
                    warn!(source = %source, error = %e, "transient source failure, retrying once");
                    tokio::time::sleep(self.policy.base_delay).await;
                    transient_retried = true;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
