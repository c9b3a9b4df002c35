use rand::Rng;
use std::time::Duration;

/// High-level classification of an error for retry purposes.
///
/// This intentionally stays generic; callers map HTTP status codes,
/// curl errors, or provider failures into these kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Operation timed out (connect/read).
    Timeout,
    /// Server asked us to slow down (429, 503).
    Throttled,
    /// Network-level failure (connection reset, DNS, truncated body, etc.).
    Connection,
    /// HTTP status that is retryable but not strictly throttling.
    Http5xx(u16),
    /// Any other error. Never retried.
    Other,
}

impl ErrorKind {
    pub fn is_retryable(self) -> bool {
        !matches!(self, ErrorKind::Other)
    }
}

/// Decision returned by the retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Do not retry this error.
    NoRetry,
    /// Retry after the given delay.
    RetryAfter(Duration),
}

/// Delay schedule between attempts.
#[derive(Debug, Clone, PartialEq)]
pub enum Backoff {
    /// Delay indexed by attempt number; the last entry repeats once
    /// attempts run past the end of the table.
    Fixed(Vec<Duration>),
    /// `min(base * 2^(attempt-1), max)` scaled by a jitter factor drawn
    /// from `[0.5, 1.5]`.
    Exponential { base: Duration, max: Duration },
}

impl Backoff {
    /// Delay after the failed `attempt` (1-based), using `jitter` as the
    /// exponential scale factor. Fixed schedules ignore `jitter`.
    pub fn delay_for(&self, attempt: u32, jitter: f64) -> Duration {
        let index = attempt.saturating_sub(1);
        match self {
            Backoff::Fixed(delays) => {
                let Some(last) = delays.last() else {
                    return Duration::ZERO;
                };
                delays.get(index as usize).copied().unwrap_or(*last)
            }
            Backoff::Exponential { base, max } => {
                let raw = base.as_secs_f64() * 2f64.powi(index.min(30) as i32);
                let capped = raw.min(max.as_secs_f64());
                Duration::from_secs_f64((capped * jitter).max(0.0))
            }
        }
    }

    fn sample_jitter(&self) -> f64 {
        match self {
            Backoff::Fixed(_) => 1.0,
            Backoff::Exponential { .. } => rand::thread_rng().gen_range(0.5..=1.5),
        }
    }
}

/// Attempt budget plus delay schedule.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the first).
    pub max_attempts: u32,
    pub backoff: Backoff,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::fixed(
            3,
            vec![
                Duration::from_secs(5),
                Duration::from_secs(15),
                Duration::from_secs(30),
            ],
        )
    }
}

impl RetryPolicy {
    pub fn fixed(max_attempts: u32, delays: Vec<Duration>) -> Self {
        Self {
            max_attempts,
            backoff: Backoff::Fixed(delays),
        }
    }

    pub fn exponential(max_attempts: u32, base: Duration, max: Duration) -> Self {
        Self {
            max_attempts,
            backoff: Backoff::Exponential { base, max },
        }
    }

    /// Attempt budget, never less than one.
    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Decide what to do after `attempt` (1-based) failed with `kind`.
    /// Returns `RetryDecision::NoRetry` for fatal errors and once the
    /// attempt budget is spent.
    pub fn decide(&self, attempt: u32, kind: ErrorKind) -> RetryDecision {
        if !kind.is_retryable() || attempt >= self.attempts() {
            return RetryDecision::NoRetry;
        }
        let jitter = self.backoff.sample_jitter();
        RetryDecision::RetryAfter(self.backoff.delay_for(attempt, jitter))
    }
}
