use serde::Deserialize;
use std::time::Duration;
use url::Url;

use crate::http::{self, Part, RequestOptions};
use crate::retry::{run_with_retry, RetryPolicy};

use super::{BackgroundRemover, RemoveBgError};

/// Rendition slug that carries the background-free image.
pub const NO_BG_SLUG: &str = "no-bg";

/// One entry of the upload response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Rendition {
    pub slug: Option<String>,
    pub path: Option<String>,
}

/// Path of the `no-bg` rendition, if the response has one.
pub fn pick_result_path(renditions: &[Rendition]) -> Option<&str> {
    renditions
        .iter()
        .find(|r| r.slug.as_deref() == Some(NO_BG_SLUG))
        .and_then(|r| r.path.as_deref())
        .filter(|p| !p.is_empty())
}

/// Provider that answers with a JSON list of renditions; the `no-bg` one is
/// downloaded with a second authenticated GET.
#[derive(Debug, Clone)]
pub struct SlugRemover {
    endpoint: String,
    base_url: Url,
    policy: RetryPolicy,
    upload: RequestOptions,
    download: RequestOptions,
    settle_delay: Duration,
}

impl SlugRemover {
    pub fn new(
        endpoint: impl Into<String>,
        base_url: &str,
        key_header: &str,
        api_key: impl Into<String>,
        policy: RetryPolicy,
    ) -> Result<Self, RemoveBgError> {
        let api_key = api_key.into();
        Ok(Self {
            endpoint: endpoint.into(),
            base_url: Url::parse(base_url)?,
            policy,
            upload: RequestOptions::default()
                .with_total_timeout(Duration::from_secs(30))
                .with_header(key_header, api_key.clone()),
            download: RequestOptions::new(Duration::from_secs(10), Duration::from_secs(60))
                .with_header(key_header, api_key),
            settle_delay: Duration::from_secs(1),
        })
    }

    /// Pause between the upload and the rendition download.
    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    fn submit(&self, image: &[u8], file_name: &str) -> Result<Vec<u8>, RemoveBgError> {
        let parts = [Part::File {
            name: "mediaFile",
            filename: file_name,
            content_type: "image/png",
            data: image,
        }];
        let response = http::post_multipart(&self.endpoint, &parts, &self.upload)?.error_for_status()?;
        let renditions: Vec<Rendition> = serde_json::from_slice(&response.body)?;
        let path = pick_result_path(&renditions).ok_or(RemoveBgError::MissingResult)?;
        let result_url = self.base_url.join(path)?;

        if !self.settle_delay.is_zero() {
            std::thread::sleep(self.settle_delay);
        }
        let download = http::get(result_url.as_str(), &self.download)?.error_for_status()?;
        if download.body.is_empty() {
            return Err(RemoveBgError::EmptyBody);
        }
        Ok(download.body)
    }
}

impl BackgroundRemover for SlugRemover {
    fn remove_background(&self, image: &[u8], file_name: &str) -> Result<Vec<u8>, RemoveBgError> {
        let out = run_with_retry(&self.policy, "background removal", RemoveBgError::retry_kind, || {
            self.submit(image, file_name)
        })?;
        tracing::info!(file = file_name, bytes = out.len(), "background removed and result downloaded");
        Ok(out)
    }
}
