//! Bounded retries with exponential backoff.
//!
//! [`RetryPolicy`] is plain data with pure helpers: [`RetryPolicy::allows_retry`] is the
//! attempt counter and [`RetryPolicy::backoff`] the delay function. [`with_retry`] drives an
//! async operation with them, sleeping between attempts unless the run is cancelled.

use rand::Rng;

use super::*;

/// How many times to try an operation and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
  /// Total attempts, including the first one. Always at least 1 in practice.
  pub max_attempts: u32,
  /// Delay after the first failed attempt
  pub base_delay:   Duration,
  /// Multiplier applied to the delay after every further failure
  pub factor:       f64,
  /// Upper bound for a single delay, before jitter
  pub max_delay:    Duration,
  /// Whether to add up to 100% random extra delay
  pub jitter:       bool,
}

impl Default for RetryPolicy {
  fn default() -> Self {
    Self {
      max_attempts: 5,
      base_delay:   Duration::from_secs(4),
      factor:       2.0,
      max_delay:    Duration::from_secs(60),
      jitter:       true,
    }
  }
}

impl RetryPolicy {
  /// A policy that tries exactly once.
  pub fn no_retry() -> Self { Self { max_attempts: 1, ..Self::default() } }

  /// A policy with `max_attempts` attempts and no waiting, mostly useful in tests.
  pub fn immediate(max_attempts: u32) -> Self {
    Self {
      max_attempts,
      base_delay: Duration::ZERO,
      factor: 1.0,
      max_delay: Duration::ZERO,
      jitter: false,
    }
  }

  /// Whether another attempt may follow `attempt` failed attempts.
  pub fn allows_retry(&self, attempt: u32) -> bool { attempt < self.max_attempts }

  /// Delay to wait after the `attempt`-th failure (1-based), without jitter.
  ///
  /// ```
  /// use std::time::Duration;
  ///
  /// use ordl::retry::RetryPolicy;
  ///
  /// let policy = RetryPolicy { jitter: false, ..RetryPolicy::default() };
  /// assert_eq!(policy.backoff(1), Duration::from_secs(4));
  /// assert_eq!(policy.backoff(2), Duration::from_secs(8));
  /// assert_eq!(policy.backoff(10), Duration::from_secs(60));
  /// ```
  pub fn backoff(&self, attempt: u32) -> Duration {
    let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
    let secs = self.base_delay.as_secs_f64() * self.factor.max(1.0).powi(exponent);
    let max = self.max_delay.as_secs_f64();
    if !secs.is_finite() || secs >= max {
      self.max_delay
    } else {
      Duration::from_secs_f64(secs)
    }
  }

  /// [`backoff`](Self::backoff) with jitter applied when enabled.
  pub fn delay(&self, attempt: u32) -> Duration {
    let delay = self.backoff(attempt);
    if self.jitter {
      let extra: f64 = rand::thread_rng().gen_range(0.0..=1.0);
      delay.mul_f64(1.0 + extra)
    } else {
      delay
    }
  }
}

/// Result of driving an operation with [`with_retry`].
#[derive(Debug)]
pub enum Retried<T> {
  /// The operation succeeded.
  Done {
    /// Value returned by the successful attempt
    value:    T,
    /// Attempts made, including the successful one
    attempts: u32,
  },
  /// The operation failed terminally or ran out of attempts.
  Failed {
    /// Error of the last attempt
    error:    OrdlError,
    /// Attempts made
    attempts: u32,
  },
  /// The run was cancelled while waiting to retry.
  Cancelled {
    /// Attempts made before cancellation
    attempts: u32,
  },
}

/// Runs `operation` until it succeeds, fails with a non-retryable error, or `policy` runs out
/// of attempts.
///
/// Only errors for which [`OrdlError::is_retryable`] holds are retried. Cancelling `cancel`
/// interrupts a pending backoff, never a running attempt.
pub async fn with_retry<T, F, Fut>(
  policy: &RetryPolicy,
  cancel: &CancellationToken,
  mut operation: F,
) -> Retried<T>
where
  F: FnMut() -> Fut,
  Fut: std::future::Future<Output = Result<T>>,
{
  let mut attempt = 0;

  loop {
    attempt += 1;
    match operation().await {
      Ok(value) => {
        if attempt > 1 {
          info!(attempts = attempt, "Operation succeeded after retry");
        }
        return Retried::Done { value, attempts: attempt };
      },
      Err(error) if error.is_retryable() && policy.allows_retry(attempt) => {
        let delay = policy.delay(attempt);
        let delay_ms = delay.as_millis() as u64;
        if error.is_rate_limited() {
          warn!(%error, attempt, delay_ms, "Rate limit hit, backing off");
        } else {
          warn!(%error, attempt, delay_ms, "Attempt failed, retrying");
        }

        tokio::select! {
          () = cancel.cancelled() => {
            debug!(attempt, "Cancelled while waiting to retry");
            return Retried::Cancelled { attempts: attempt };
          },
          () = tokio::time::sleep(delay) => {},
        }
      },
      Err(error) => {
        if error.is_retryable() {
          error!(%error, attempts = attempt, "Giving up after exhausting retries");
        } else {
          debug!(%error, attempts = attempt, "Non-retryable failure");
        }
        return Retried::Failed { error, attempts: attempt };
      },
    }
  }
}
