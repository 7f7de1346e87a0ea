//! Retry with exponential backoff for mail relay calls.
//!
//! Retries transport errors (connection failures, timeouts) and 5xx
//! responses. A 4xx response means the relay refused the message and is
//! returned immediately.

use std::time::Duration;

/// Retry schedule: `max_retries` further attempts after the first, waiting
/// `base_delay`, then double that, and so on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    /// Three retries at 200ms, 400ms, 800ms.
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(200),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (zero-based).
    pub fn delay(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(attempt))
    }
}

/// Send an HTTP request, retrying per `policy`.
///
/// The closure `f` is called up to `max_retries + 1` times. The last
/// response or error is returned as-is; the caller inspects the status.
pub(crate) async fn retry_send<F, Fut>(
    policy: RetryPolicy,
    f: F,
) -> Result<reqwest::Response, reqwest::Error>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = Result<reqwest::Response, reqwest::Error>>,
{
    for attempt in 0..policy.max_retries {
        let delay = policy.delay(attempt);
        match f().await {
            Ok(resp) if !resp.status().is_server_error() => return Ok(resp),
            Ok(resp) => {
                tracing::warn!(
                    attempt = attempt + 1,
                    max_retries = policy.max_retries,
                    status = resp.status().as_u16(),
                    "mail relay returned server error, retrying in {delay:?}"
                );
            }
            Err(e) => {
                tracing::warn!(
                    attempt = attempt + 1,
                    max_retries = policy.max_retries,
                    "mail relay request failed, retrying in {delay:?}: {e}"
                );
            }
        }
        tokio::time::sleep(delay).await;
    }
    // Final attempt, no more retries.
    f().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn fast() -> RetryPolicy {
        RetryPolicy {
            max_retries: 3,
            base_delay: Duration::from_millis(1),
        }
    }

    #[test]
    fn default_schedule_doubles_from_200ms() {
        let p = RetryPolicy::default();
        assert_eq!(p.delay(0), Duration::from_millis(200));
        assert_eq!(p.delay(1), Duration::from_millis(400));
        assert_eq!(p.delay(2), Duration::from_millis(800));
    }

    #[tokio::test]
    async fn retry_exhausts_all_attempts_on_transport_failure() {
        let call_count = Arc::new(AtomicU32::new(0));
        let cc = call_count.clone();

        let result = retry_send(fast(), || {
            let cc = cc.clone();
            async move {
                cc.fetch_add(1, Ordering::SeqCst);
                // Request to a guaranteed-closed port: connection refused.
                reqwest::Client::builder()
                    .timeout(Duration::from_millis(50))
                    .build()
                    .unwrap()
                    .get("http://127.0.0.1:1/")
                    .send()
                    .await
            }
        })
        .await;

        assert!(result.is_err(), "request to closed port must fail");
        assert_eq!(call_count.load(Ordering::SeqCst), fast().max_retries + 1);
    }

    #[tokio::test]
    async fn zero_retries_means_single_attempt() {
        let call_count = Arc::new(AtomicU32::new(0));
        let cc = call_count.clone();
        let policy = RetryPolicy {
            max_retries: 0,
            base_delay: Duration::from_millis(1),
        };

        let _ = retry_send(policy, || {
            let cc = cc.clone();
            async move {
                cc.fetch_add(1, Ordering::SeqCst);
                reqwest::Client::new().get("http://127.0.0.1:1/").send().await
            }
        })
        .await;

        assert_eq!(call_count.load(Ordering::SeqCst), 1);
    }
}
