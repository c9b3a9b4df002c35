//! Retry and backoff policy.
//!
//! This module encapsulates error classification (timeouts, throttling,
//! connection failures) and the two delay schedules (fixed table or
//! exponential with jitter) so that the feed fetcher and the background
//! removal adapters share one consistent policy.

mod classify;
mod error;
mod policy;
mod run;

pub use classify::{classify_curl_error, classify_http_status, classify_network, classify_upstream};
pub use error::FetchError;
pub use policy::{Backoff, ErrorKind, RetryDecision, RetryPolicy};
pub use run::run_with_retry;
