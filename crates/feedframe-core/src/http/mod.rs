//! Blocking HTTP exchanges over libcurl easy handles.
//!
//! Every call runs on the current thread and returns the full body in
//! memory; feeds and product images are small enough for that. Errors come
//! back as [`FetchError`] so callers can feed them to the retry policy.

mod headers;

pub use headers::browser_headers;

use crate::retry::FetchError;
use std::time::Duration;

/// Per-request settings.
#[derive(Debug, Clone)]
pub struct RequestOptions {
    /// Extra request headers as (name, value) pairs.
    pub headers: Vec<(String, String)>,
    pub connect_timeout: Duration,
    /// Abort when the transfer stalls (under 1 byte/s) for this long.
    pub read_timeout: Duration,
    /// Hard wall-clock limit for the whole exchange.
    pub total_timeout: Option<Duration>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            headers: Vec::new(),
            connect_timeout: Duration::from_secs(10),
            read_timeout: Duration::from_secs(60),
            total_timeout: None,
        }
    }
}

impl RequestOptions {
    pub fn new(connect_timeout: Duration, read_timeout: Duration) -> Self {
        Self {
            connect_timeout,
            read_timeout,
            ..Self::default()
        }
    }

    pub fn with_total_timeout(mut self, timeout: Duration) -> Self {
        self.total_timeout = Some(timeout);
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_headers<I, K, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.headers
            .extend(headers.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }
}

/// Status and body of a completed exchange.
#[derive(Debug, Clone)]
pub struct Response {
    pub status: u32,
    pub body: Vec<u8>,
}

impl Response {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Turns a non-2xx response into `FetchError::Http`.
    pub fn error_for_status(self) -> Result<Self, FetchError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(FetchError::Http(self.status))
        }
    }
}

/// One field of a multipart/form-data body.
#[derive(Debug, Clone, Copy)]
pub enum Part<'a> {
    Text {
        name: &'a str,
        value: &'a str,
    },
    File {
        name: &'a str,
        filename: &'a str,
        content_type: &'a str,
        data: &'a [u8],
    },
}

/// Performs a GET and returns the response whatever its status.
pub fn get(url: &str, opts: &RequestOptions) -> Result<Response, FetchError> {
    let mut easy = curl::easy::Easy::new();
    configure(&mut easy, url, opts)?;
    easy.get(true)?;
    perform(&mut easy)
}

/// Performs a multipart/form-data POST and returns the response whatever its status.
pub fn post_multipart(
    url: &str,
    parts: &[Part<'_>],
    opts: &RequestOptions,
) -> Result<Response, FetchError> {
    let mut easy = curl::easy::Easy::new();
    configure(&mut easy, url, opts)?;

    let mut form = curl::easy::Form::new();
    for part in parts {
        let added = match *part {
            Part::Text { name, value } => form.part(name).contents(value.as_bytes()).add(),
            Part::File {
                name,
                filename,
                content_type,
                data,
            } => form
                .part(name)
                .buffer(filename, data.to_vec())
                .content_type(content_type)
                .add(),
        };
        added.map_err(|e| FetchError::Request(format!("multipart field: {}", e)))?;
    }
    easy.httppost(form)?;
    perform(&mut easy)
}

fn configure(
    easy: &mut curl::easy::Easy,
    url: &str,
    opts: &RequestOptions,
) -> Result<(), FetchError> {
    easy.url(url)?;
    easy.follow_location(true)?;
    easy.max_redirections(10)?;
    easy.connect_timeout(opts.connect_timeout)?;
    easy.low_speed_limit(1)?;
    easy.low_speed_time(opts.read_timeout)?;
    if let Some(total) = opts.total_timeout {
        easy.timeout(total)?;
    }

    let mut list = curl::easy::List::new();
    for (k, v) in &opts.headers {
        list.append(&format!("{}: {}", k.trim(), v.trim()))?;
    }
    if !opts.headers.is_empty() {
        easy.http_headers(list)?;
    }
    Ok(())
}

fn perform(easy: &mut curl::easy::Easy) -> Result<Response, FetchError> {
    let mut body = Vec::new();
    {
        let mut transfer = easy.transfer();
        transfer.write_function(|data| {
            body.extend_from_slice(data);
            Ok(data.len())
        })?;
        transfer.perform()?;
    }
    let status = easy.response_code()?;
    Ok(Response { status, body })
}
