use std::path::PathBuf;

use crate::error::FailureKind;
use crate::http::{self, RequestOptions};
use crate::naming;
use crate::retry::{classify_network, run_with_retry, FetchError, RetryPolicy};
use crate::xml::{self, XmlError};

/// Why a single feed was not saved.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("feed list is empty")]
    NoFeeds,
    #[error("download of {url} failed: {source}")]
    Download {
        url: String,
        #[source]
        source: FetchError,
    },
    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u32 },
    #[error("feed {url} is not valid XML: {source}")]
    Invalid {
        url: String,
        #[source]
        source: XmlError,
    },
    #[error("saving feed {url} failed: {source}")]
    Save {
        url: String,
        #[source]
        source: XmlError,
    },
}

impl FeedError {
    /// `Fatal` only for local write failures; everything else is per-feed.
    pub fn kind(&self) -> FailureKind {
        match self {
            FeedError::Download { .. } => FailureKind::Transient,
            FeedError::NoFeeds | FeedError::Status { .. } | FeedError::Invalid { .. } => {
                FailureKind::Validation
            }
            FeedError::Save { .. } => FailureKind::Fatal,
        }
    }
}

/// Outcome of one fetch pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchSummary {
    pub attempted: usize,
    pub succeeded: usize,
    /// Files written, in feed order.
    pub saved: Vec<PathBuf>,
}

/// Downloads feeds, validates them and stores them pretty-printed.
#[derive(Debug, Clone)]
pub struct FeedFetcher {
    folder: PathBuf,
    policy: RetryPolicy,
    options: RequestOptions,
}

impl FeedFetcher {
    /// Saves into `folder` using `policy` around each GET (connect 10 s, read 60 s).
    pub fn new(folder: impl Into<PathBuf>, policy: RetryPolicy) -> Self {
        Self {
            folder: folder.into(),
            policy,
            options: RequestOptions::default(),
        }
    }

    pub fn with_options(mut self, options: RequestOptions) -> Self {
        self.options = options;
        self
    }

    /// Fetches every feed in order. A failed feed is logged and skipped;
    /// only an empty list or a local write failure stops the pass.
    pub fn fetch_all(&self, feeds: &[String]) -> Result<FetchSummary, FeedError> {
        if feeds.is_empty() {
            tracing::error!("no feeds configured");
            return Err(FeedError::NoFeeds);
        }
        let mut summary = FetchSummary::default();
        for url in feeds {
            summary.attempted += 1;
            match self.fetch_one(url) {
                Ok(path) => {
                    summary.succeeded += 1;
                    summary.saved.push(path);
                }
                Err(e) if e.kind() == FailureKind::Fatal => {
                    tracing::error!(url = %url, error = %e, "aborting feed fetch");
                    return Err(e);
                }
                Err(e) => {
                    tracing::error!(url = %url, kind = ?e.kind(), error = %e, "skipping feed");
                }
            }
        }
        tracing::info!(
            attempted = summary.attempted,
            succeeded = summary.succeeded,
            "feed fetch finished: {} of {} saved",
            summary.succeeded,
            summary.attempted
        );
        Ok(summary)
    }

    /// Downloads one feed (retrying transport failures), requires HTTP 200
    /// and well-formed XML, then writes it under its derived filename.
    pub fn fetch_one(&self, url: &str) -> Result<PathBuf, FeedError> {
        let response = run_with_retry(&self.policy, url, classify_network, || {
            http::get(url, &self.options)
        })
        .map_err(|source| FeedError::Download {
            url: url.to_string(),
            source,
        })?;

        if response.status != 200 {
            return Err(FeedError::Status {
                url: url.to_string(),
                status: response.status,
            });
        }

        let root = xml::parse_document(&response.body).map_err(|source| FeedError::Invalid {
            url: url.to_string(),
            source,
        })?;

        let file_name = naming::feed_filename(url);
        let path = xml::save_pretty(&root, &self.folder, &file_name).map_err(|source| {
            FeedError::Save {
                url: url.to_string(),
                source,
            }
        })?;
        tracing::info!(url = %url, path = %path.display(), "feed saved");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_feed_list_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = FeedFetcher::new(dir.path(), RetryPolicy::fixed(1, vec![]));
        let err = fetcher.fetch_all(&[]).unwrap_err();
        assert!(matches!(err, FeedError::NoFeeds));
        assert_eq!(err.kind(), FailureKind::Validation);
    }

    #[test]
    fn only_save_failures_are_fatal() {
        let status = FeedError::Status {
            url: "u".to_string(),
            status: 404,
        };
        assert_eq!(status.kind(), FailureKind::Validation);
        let invalid = FeedError::Invalid {
            url: "u".to_string(),
            source: XmlError::Empty,
        };
        assert_eq!(invalid.kind(), FailureKind::Validation);
        let save = FeedError::Save {
            url: "u".to_string(),
            source: XmlError::Write("disk full".to_string()),
        };
        assert_eq!(save.kind(), FailureKind::Fatal);
    }
}
