use crate::http::{self, Part, RequestOptions};
use crate::retry::{run_with_retry, RetryPolicy};
use std::time::Duration;

use super::{BackgroundRemover, RemoveBgError};

/// Provider whose response body is the processed image.
///
/// Sends `image_file` plus `crop=true` as multipart form data.
#[derive(Debug, Clone)]
pub struct DirectRemover {
    endpoint: String,
    policy: RetryPolicy,
    options: RequestOptions,
}

impl DirectRemover {
    pub fn new(
        endpoint: impl Into<String>,
        key_header: &str,
        api_key: impl Into<String>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            policy,
            options: RequestOptions::default()
                .with_total_timeout(Duration::from_secs(60))
                .with_header(key_header, api_key),
        }
    }

    fn submit(&self, image: &[u8], file_name: &str) -> Result<Vec<u8>, RemoveBgError> {
        let parts = [
            Part::File {
                name: "image_file",
                filename: file_name,
                content_type: "image/png",
                data: image,
            },
            Part::Text {
                name: "crop",
                value: "true",
            },
        ];
        let response = http::post_multipart(&self.endpoint, &parts, &self.options)?.error_for_status()?;
        if response.body.is_empty() {
            return Err(RemoveBgError::EmptyBody);
        }
        Ok(response.body)
    }
}

impl BackgroundRemover for DirectRemover {
    fn remove_background(&self, image: &[u8], file_name: &str) -> Result<Vec<u8>, RemoveBgError> {
        let out = run_with_retry(&self.policy, "background removal", RemoveBgError::retry_kind, || {
            self.submit(image, file_name)
        })?;
        tracing::debug!(file = file_name, bytes = out.len(), "background removed");
        Ok(out)
    }
}
