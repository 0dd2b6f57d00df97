//! Bounded, strictly sequential retry of a whole generation attempt.

use std::future::Future;
use std::time::Duration;

use tracing::{error, info, warn};

use crate::error::{QuizError, RetryExhausted};

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_DELAY: Duration = Duration::from_millis(500);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
  pub max_attempts: u32,
  /// Fixed pause between a failed attempt and the next one.
  pub delay: Duration,
}

impl RetryPolicy {
  pub fn new(max_attempts: u32, delay: Duration) -> Self {
    Self { max_attempts: max_attempts.max(1), delay }
  }

  #[cfg(test)]
  pub fn no_delay(max_attempts: u32) -> Self {
    Self::new(max_attempts, Duration::ZERO)
  }
}

impl Default for RetryPolicy {
  fn default() -> Self {
    Self::new(DEFAULT_MAX_ATTEMPTS, DEFAULT_DELAY)
  }
}

#[derive(Debug)]
enum AttemptState<T> {
  Attempting(u32),
  Success(T),
  Fatal(RetryExhausted),
}

/// Run `attempt(n)` for n = 1.. until it succeeds or the policy is exhausted.
/// Attempt n+1 starts only after attempt n has finished.
pub async fn run_with_retry<T, F, Fut>(policy: &RetryPolicy, op: &str, mut attempt: F) -> Result<T, RetryExhausted>
where
  F: FnMut(u32) -> Fut,
  Fut: Future<Output = Result<T, QuizError>>,
{
  let max = policy.max_attempts.max(1);
  let mut state = AttemptState::Attempting(1);
  loop {
    state = match state {
      AttemptState::Attempting(n) => match attempt(n).await {
        Ok(value) => {
          if n > 1 {
            info!(target: "quiz", op, attempt = n, "Attempt succeeded after retry");
          }
          AttemptState::Success(value)
        }
        Err(e) if n < max => {
          warn!(target: "quiz", op, attempt = n, max, kind = e.kind(), error = %e, "Attempt failed; retrying");
          if !policy.delay.is_zero() {
            tokio::time::sleep(policy.delay).await;
          }
          AttemptState::Attempting(n + 1)
        }
        Err(e) => {
          error!(target: "quiz", op, attempt = n, kind = e.kind(), error = %e, "Retry budget exhausted");
          AttemptState::Fatal(RetryExhausted { attempts: n, last: e })
        }
      },
      AttemptState::Success(value) => return Ok(value),
      AttemptState::Fatal(e) => return Err(e),
    };
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::cell::Cell;

  #[tokio::test]
  async fn returns_first_success_without_further_calls() {
    let calls = Cell::new(0u32);
    let out = run_with_retry(&RetryPolicy::no_delay(5), "test", |n| {
      calls.set(calls.get() + 1);
      async move {
        if n == 2 { Ok(n) } else { Err(QuizError::Extraction) }
      }
    })
    .await
    .unwrap();
    assert_eq!(out, 2);
    assert_eq!(calls.get(), 2);
  }

  #[tokio::test]
  async fn calls_at_most_max_attempts_and_keeps_last_error() {
    let calls = Cell::new(0u32);
    let err = run_with_retry::<(), _, _>(&RetryPolicy::no_delay(3), "test", |n| {
      calls.set(calls.get() + 1);
      async move { Err(QuizError::Validation(format!("attempt {n}"))) }
    })
    .await
    .unwrap_err();
    assert_eq!(calls.get(), 3);
    assert_eq!(err.attempts, 3);
    assert!(matches!(err.last, QuizError::Validation(ref m) if m == "attempt 3"));
  }

  #[tokio::test]
  async fn zero_attempts_still_runs_once() {
    let calls = Cell::new(0u32);
    let policy = RetryPolicy { max_attempts: 0, delay: Duration::ZERO };
    let _ = run_with_retry::<(), _, _>(&policy, "test", |_| {
      calls.set(calls.get() + 1);
      async { Err(QuizError::Extraction) }
    })
    .await;
    assert_eq!(calls.get(), 1);
  }

  #[tokio::test(start_paused = true)]
  async fn waits_the_fixed_delay_between_attempts() {
    let start = tokio::time::Instant::now();
    let policy = RetryPolicy::new(3, Duration::from_millis(500));
    let _ = run_with_retry::<(), _, _>(&policy, "test", |_| async { Err(QuizError::Extraction) }).await;
    assert!(start.elapsed() >= Duration::from_millis(1000));
  }
}
