//! Bounded readiness polling for freshly created indexes.

use std::future::Future;
use std::time::Duration;

use groundwire_config::ReadinessConfig;
use groundwire_core::error::VectorStoreError;
use tracing::{debug, info};

/// How long to wait for an index to report ready.
///
/// The first check happens immediately. After each failed check the delay
/// doubles, starting at `initial_delay` and capped at `max_delay`. After
/// `max_attempts` failed checks the wait gives up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadinessPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl Default for ReadinessPolicy {
    fn default() -> Self {
        Self::from(&ReadinessConfig::default())
    }
}

impl From<&ReadinessConfig> for ReadinessPolicy {
    fn from(config: &ReadinessConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            initial_delay: Duration::from_millis(config.initial_delay_ms),
            max_delay: Duration::from_millis(config.max_delay_ms),
        }
    }
}

impl ReadinessPolicy {
    /// Delay to sleep after the `attempt`-th failed check (1-based).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.initial_delay
            .saturating_mul(1u32 << exponent)
            .min(self.max_delay)
    }

    /// Poll `check` until it reports ready or the attempt ceiling is hit.
    ///
    /// `IndexNotFound` from `check` counts as "not ready yet", since a just
    /// created index can briefly be missing from the control plane. Any other
    /// error ends the wait immediately.
    pub async fn wait_until_ready<F, Fut>(&self, name: &str, mut check: F) -> Result<(), VectorStoreError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<bool, VectorStoreError>>,
    {
        for attempt in 1..=self.max_attempts {
            let ready = match check().await {
                Ok(ready) => ready,
                Err(VectorStoreError::IndexNotFound(_)) => false,
                Err(e) => return Err(e),
            };

            if ready {
                info!(index = name, attempt, "Index is ready");
                return Ok(());
            }

            if attempt < self.max_attempts {
                let delay = self.delay_for_attempt(attempt);
                debug!(index = name, attempt, delay_ms = delay.as_millis() as u64, "Index not ready yet");
                tokio::time::sleep(delay).await;
            }
        }

        Err(VectorStoreError::IndexUnavailable {
            name: name.to_string(),
            attempts: self.max_attempts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn policy(max_attempts: u32, initial_ms: u64, max_ms: u64) -> ReadinessPolicy {
        ReadinessPolicy {
            max_attempts,
            initial_delay: Duration::from_millis(initial_ms),
            max_delay: Duration::from_millis(max_ms),
        }
    }

    #[test]
    fn delay_doubles_and_caps() {
        let p = policy(10, 1000, 16_000);
        assert_eq!(p.delay_for_attempt(1), Duration::from_millis(1000));
        assert_eq!(p.delay_for_attempt(2), Duration::from_millis(2000));
        assert_eq!(p.delay_for_attempt(3), Duration::from_millis(4000));
        assert_eq!(p.delay_for_attempt(5), Duration::from_millis(16_000));
        assert_eq!(p.delay_for_attempt(9), Duration::from_millis(16_000));
    }

    #[test]
    fn policy_from_config_never_allows_zero_attempts() {
        let config = ReadinessConfig {
            max_attempts: 0,
            initial_delay_ms: 10,
            max_delay_ms: 20,
        };
        assert_eq!(ReadinessPolicy::from(&config).max_attempts, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn ready_on_first_check_does_not_sleep() {
        let start = tokio::time::Instant::now();
        policy(5, 1000, 8000)
            .wait_until_ready("nyc", || async { Ok(true) })
            .await
            .unwrap();
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn becomes_ready_after_backoff() {
        let calls = Arc::new(AtomicU32::new(0));
        let start = tokio::time::Instant::now();

        let counter = calls.clone();
        policy(5, 1000, 8000)
            .wait_until_ready("nyc", move || {
                let counter = counter.clone();
                async move { Ok(counter.fetch_add(1, Ordering::SeqCst) >= 2) }
            })
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        // 1s after the first miss, 2s after the second
        assert_eq!(start.elapsed(), Duration::from_millis(3000));
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_ceiling() {
        let calls = Arc::new(AtomicU32::new(0));
        let start = tokio::time::Instant::now();

        let counter = calls.clone();
        let err = policy(4, 1000, 3000)
            .wait_until_ready("nyc", move || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(false)
                }
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            VectorStoreError::IndexUnavailable { ref name, attempts: 4 } if name == "nyc"
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        // 1s + 2s + 3s (capped); no sleep after the final check
        assert_eq!(start.elapsed(), Duration::from_millis(6000));
    }

    #[tokio::test(start_paused = true)]
    async fn not_found_counts_as_not_ready() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        policy(3, 10, 10)
            .wait_until_ready("nyc", move || {
                let counter = counter.clone();
                async move {
                    if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                        Err(VectorStoreError::IndexNotFound("nyc".into()))
                    } else {
                        Ok(true)
                    }
                }
            })
            .await
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn transport_error_stops_polling() {
        let err = policy(5, 10, 10)
            .wait_until_ready("nyc", || async {
                Err(VectorStoreError::Network("connection reset".into()))
            })
            .await
            .unwrap_err();
        assert!(matches!(err, VectorStoreError::Network(_)));
    }
}
