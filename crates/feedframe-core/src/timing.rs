//! Stage timing.
//!
//! [`timed`] logs how long a stage took. [`run_recorded`] wraps a whole run
//! and emits a single JSON summary line that log shippers can pick up.

use chrono::Local;
use serde::Serialize;
use std::fmt;
use std::time::Instant;

/// Runs `f` and logs its duration in seconds and minutes.
pub fn timed<T, F>(stage: &str, f: F) -> T
where
    F: FnOnce() -> T,
{
    let started = Instant::now();
    let out = f();
    let secs = round_to(started.elapsed().as_secs_f64(), 3);
    tracing::info!(
        stage,
        elapsed_secs = secs,
        elapsed_mins = round_to(secs / 60.0, 2),
        "stage finished"
    );
    out
}

/// Summary record for one recorded run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct RunRecord {
    pub date: String,
    pub status: RunStatus,
    pub function_name: String,
    /// Seconds, rounded to milliseconds.
    pub execution_time: f64,
    pub error_type: Option<String>,
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    Success,
    Error,
}

impl RunRecord {
    pub fn new<T, E>(date: String, name: &str, secs: f64, outcome: &Result<T, E>) -> Self
    where
        E: fmt::Display + fmt::Debug,
    {
        let (status, error_type, error_message) = match outcome {
            Ok(_) => (RunStatus::Success, None, None),
            Err(e) => (
                RunStatus::Error,
                Some(error_type_name(e)),
                Some(e.to_string()),
            ),
        };
        Self {
            date,
            status,
            function_name: name.to_string(),
            execution_time: round_to(secs, 3),
            error_type,
            error_message,
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| format!("{{\"ERROR\":\"{}\"}}", e))
    }
}

/// Runs `f`, logs start and finish, and emits one JSON [`RunRecord`] at the
/// end whatever the outcome. The result is passed through unchanged.
pub fn run_recorded<T, E, F>(name: &str, f: F) -> Result<T, E>
where
    F: FnOnce() -> Result<T, E>,
    E: fmt::Display + fmt::Debug,
{
    let now = Local::now();
    let date = now.format("%Y-%m-%d").to_string();
    tracing::info!("{} started {} at {}", name, date, now.format("%H:%M:%S"));

    let started = Instant::now();
    let outcome = f();
    let secs = started.elapsed().as_secs_f64();

    tracing::info!(
        "{} finished at {} in {} min",
        name,
        Local::now().format("%H:%M:%S"),
        round_to(secs / 60.0, 2)
    );
    let record = RunRecord::new(date, name, secs, &outcome);
    tracing::info!("{}", record.to_json());
    outcome
}

/// First token of the error's debug form, e.g. `Io` for `Io { .. }`.
fn error_type_name<E: fmt::Debug>(e: &E) -> String {
    let debug = format!("{:?}", e);
    let end = debug
        .find(|c: char| !(c.is_alphanumeric() || c == '_'))
        .unwrap_or(debug.len());
    if end == 0 {
        "Error".to_string()
    } else {
        debug[..end].to_string()
    }
}

fn round_to(value: f64, digits: i32) -> f64 {
    let factor = 10f64.powi(digits);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    enum StageError {
        NoFeeds { dir: String },
    }

    impl fmt::Display for StageError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self {
                StageError::NoFeeds { dir } => write!(f, "no feeds in {}", dir),
            }
        }
    }

    #[test]
    fn success_record_has_null_error_fields() {
        let outcome: Result<u32, StageError> = Ok(3);
        let record = RunRecord::new("2024-01-02".to_string(), "run", 1.23456, &outcome);
        let json: serde_json::Value = serde_json::from_str(&record.to_json()).unwrap();
        assert_eq!(json["DATE"], "2024-01-02");
        assert_eq!(json["STATUS"], "SUCCESS");
        assert_eq!(json["FUNCTION_NAME"], "run");
        assert_eq!(json["EXECUTION_TIME"], 1.235);
        assert!(json["ERROR_TYPE"].is_null());
        assert!(json["ERROR_MESSAGE"].is_null());
    }

    #[test]
    fn error_record_names_the_variant() {
        let outcome: Result<(), StageError> = Err(StageError::NoFeeds {
            dir: "temp_feeds".to_string(),
        });
        let record = RunRecord::new("2024-01-02".to_string(), "run", 0.5, &outcome);
        assert_eq!(record.status, RunStatus::Error);
        assert_eq!(record.error_type.as_deref(), Some("NoFeeds"));
        assert_eq!(record.error_message.as_deref(), Some("no feeds in temp_feeds"));
    }

    #[test]
    fn wrappers_pass_results_through() {
        assert_eq!(timed("stage", || 7), 7);
        let ok: Result<&str, StageError> = run_recorded("run", || Ok("done"));
        assert_eq!(ok.unwrap(), "done");
        let err: Result<(), StageError> = run_recorded("run", || {
            Err(StageError::NoFeeds { dir: "x".to_string() })
        });
        assert!(err.is_err());
    }
}
