//! Retry loop: run a closure until success or the policy says stop.

use std::fmt;

use super::policy::{ErrorKind, RetryDecision, RetryPolicy};

/// Runs `op` until it succeeds or the retry policy says to stop.
///
/// `classify` maps each error to an [`ErrorKind`]; `ErrorKind::Other`
/// propagates immediately without another attempt. On a retryable failure
/// this logs a warning, sleeps for the backoff duration on the current
/// thread, then tries again. When the budget is spent the last error is
/// returned unchanged. The success value is passed through untouched.
pub fn run_with_retry<T, E, F, C>(
    policy: &RetryPolicy,
    label: &str,
    classify: C,
    mut op: F,
) -> Result<T, E>
where
    F: FnMut() -> Result<T, E>,
    C: Fn(&E) -> ErrorKind,
    E: fmt::Display,
{
    let max_attempts = policy.attempts();
    let mut attempt = 1u32;
    loop {
        match op() {
            Ok(value) => return Ok(value),
            Err(e) => {
                let kind = classify(&e);
                if !kind.is_retryable() {
                    tracing::debug!(label, attempt, error = %e, "non-retryable error");
                    return Err(e);
                }
                match policy.decide(attempt, kind) {
                    RetryDecision::NoRetry => {
                        tracing::error!(
                            label,
                            max_attempts,
                            error = %e,
                            "{}: all {} attempts failed",
                            label,
                            max_attempts
                        );
                        return Err(e);
                    }
                    RetryDecision::RetryAfter(d) => {
                        tracing::warn!(
                            label,
                            attempt,
                            max_attempts,
                            delay_secs = d.as_secs_f64(),
                            error = %e,
                            "{}: attempt {}/{} failed ({:?}), retrying in {:.1}s",
                            label,
                            attempt,
                            max_attempts,
                            kind,
                            d.as_secs_f64()
                        );
                        std::thread::sleep(d);
                        attempt += 1;
                    }
                }
            }
        }
    }
}
