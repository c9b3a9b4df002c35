use std::time::Duration;

use crate::http::{self, browser_headers, RequestOptions};

/// Total time allowed for one product image.
pub const IMAGE_TIMEOUT: Duration = Duration::from_secs(10);

/// Browser-like request settings for product image hosts.
pub fn image_request_options(referer: Option<&str>) -> RequestOptions {
    RequestOptions::default()
        .with_headers(browser_headers(referer))
        .with_total_timeout(IMAGE_TIMEOUT)
}

/// Fetches one product image. Failures are logged and yield `None`; a 403
/// is reported as access denied. No retries.
pub fn download_image(url: &str, opts: &RequestOptions) -> Option<Vec<u8>> {
    let response = match http::get(url, opts) {
        Ok(r) => r,
        Err(e) => {
            tracing::error!(url = %url, error = %e, "image download failed");
            return None;
        }
    };
    match response.status {
        403 => {
            tracing::warn!(url = %url, "access denied (403) for image");
            None
        }
        status if !response.is_success() => {
            tracing::error!(url = %url, status, "HTTP error while downloading image");
            None
        }
        _ if response.body.is_empty() => {
            tracing::warn!(url = %url, "image response is empty");
            None
        }
        _ => Some(response.body),
    }
}
