// app/src/services/retry.rs

//! Bounded exponential backoff with jitter for outbound HTTP calls.
//!
//! Transport failures, `429 Too Many Requests` and `5xx` responses are
//! retried; anything else is handed back to the caller immediately. The last
//! attempt's outcome is returned as-is once retries are exhausted.

use rand_core::{OsRng, RngCore};
use reqwest::StatusCode;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Upper bound for a single backoff sleep.
const MAX_DELAY: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
  /// Retries after the first attempt.
  pub max_retries: u32,
  pub base_delay: Duration,
}

impl RetryPolicy {
  pub fn new(max_retries: u32, base_delay: Duration) -> Self {
    Self {
      max_retries,
      base_delay,
    }
  }

  /// Delay before retry number `attempt` (0-based).
  ///
  /// The exponential step `base * 2^attempt` is capped at [`MAX_DELAY`]; the
  /// sleep is half of it plus `jitter` (in `[0, 1)`) times the other half.
  pub fn delay_for(&self, attempt: u32, jitter: f64) -> Duration {
    let factor = 2u32.saturating_pow(attempt.min(16));
    let step = self.base_delay.saturating_mul(factor).min(MAX_DELAY);
    let half = step / 2;
    half + half.mul_f64(jitter.clamp(0.0, 1.0))
  }
}

pub fn is_retryable_status(status: StatusCode) -> bool {
  status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

fn random_jitter() -> f64 {
  f64::from(OsRng.next_u32()) / (f64::from(u32::MAX) + 1.0)
}

/// Calls `send` until it yields a non-retryable outcome or the policy is exhausted.
pub async fn send_with_retry<F, Fut>(policy: &RetryPolicy, send: F) -> Result<reqwest::Response, reqwest::Error>
where
  F: Fn() -> Fut,
  Fut: Future<Output = Result<reqwest::Response, reqwest::Error>>,
{
  for attempt in 0..policy.max_retries {
    let reason = match send().await {
      Ok(resp) if !is_retryable_status(resp.status()) => return Ok(resp),
      Ok(resp) => format!("status {}", resp.status()),
      Err(e) if e.is_builder() => return Err(e),
      Err(e) => e.to_string(),
    };
    let delay = policy.delay_for(attempt, random_jitter());
    warn!(
      attempt = attempt + 1,
      max_retries = policy.max_retries,
      delay_ms = delay.as_millis() as u64,
      %reason,
      "Outbound request failed, retrying."
    );
    tokio::time::sleep(delay).await;
  }
  send().await
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::atomic::{AtomicU32, Ordering};
  use std::sync::Arc;

  #[test]
  fn delay_doubles_and_is_capped() {
    let policy = RetryPolicy::new(3, Duration::from_millis(1000));
    assert_eq!(policy.delay_for(0, 0.0), Duration::from_millis(500));
    assert_eq!(policy.delay_for(1, 0.0), Duration::from_millis(1000));
    assert_eq!(policy.delay_for(2, 0.0), Duration::from_millis(2000));
    assert_eq!(policy.delay_for(2, 1.0), Duration::from_millis(4000));
    assert_eq!(policy.delay_for(20, 1.0), MAX_DELAY);
  }

  #[test]
  fn jitter_stays_in_range() {
    for _ in 0..100 {
      let j = random_jitter();
      assert!((0.0..1.0).contains(&j));
    }
  }

  #[test]
  fn only_throttling_and_server_errors_retry() {
    assert!(is_retryable_status(StatusCode::TOO_MANY_REQUESTS));
    assert!(is_retryable_status(StatusCode::SERVICE_UNAVAILABLE));
    assert!(!is_retryable_status(StatusCode::BAD_REQUEST));
    assert!(!is_retryable_status(StatusCode::OK));
  }

  #[tokio::test]
  async fn transport_failures_exhaust_every_attempt() {
    let calls = Arc::new(AtomicU32::new(0));
    let policy = RetryPolicy::new(2, Duration::from_millis(1));
    let client = reqwest::Client::builder()
      .timeout(Duration::from_millis(200))
      .build()
      .unwrap();

    let result = send_with_retry(&policy, || {
      let calls = calls.clone();
      let request = client.get("http://127.0.0.1:1/");
      async move {
        calls.fetch_add(1, Ordering::SeqCst);
        request.send().await
      }
    })
    .await;

    assert!(result.is_err(), "request to closed port must fail");
    assert_eq!(calls.load(Ordering::SeqCst), 3);
  }
}
