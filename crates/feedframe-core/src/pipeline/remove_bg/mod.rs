//! Background-removal providers.
//!
//! Both adapters take the raw image bytes and return the processed image.
//! Each call is wrapped in the exponential backoff policy; only throttling,
//! 5xx and transport failures are retried.

mod direct;
mod slug;

pub use direct::DirectRemover;
pub use slug::{pick_result_path, Rendition, SlugRemover};

use crate::config::{BackgroundConfig, ProviderKind};
use crate::error::FailureKind;
use crate::retry::{classify_upstream, ErrorKind, FetchError};

/// Turns a product photo into one without background.
pub trait BackgroundRemover {
    fn remove_background(&self, image: &[u8], file_name: &str) -> Result<Vec<u8>, RemoveBgError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RemoveBgError {
    #[error("background removal request failed: {0}")]
    Transport(#[from] FetchError),
    #[error("response has no `no-bg` rendition")]
    MissingResult,
    #[error("background removal returned an empty body")]
    EmptyBody,
    #[error("cannot decode background removal response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("invalid result URL: {0}")]
    Url(#[from] url::ParseError),
}

impl RemoveBgError {
    /// Retry classification: HTTP-status aware for transport errors, never
    /// retried otherwise.
    pub fn retry_kind(&self) -> ErrorKind {
        match self {
            RemoveBgError::Transport(e) => classify_upstream(e),
            _ => ErrorKind::Other,
        }
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            RemoveBgError::Transport(e) => e.kind(),
            _ => FailureKind::Fatal,
        }
    }
}

/// Builds the configured provider. Returns `None` (after one warning) when
/// no API key is set, which disables background removal.
pub fn from_config(cfg: &BackgroundConfig) -> Option<Box<dyn BackgroundRemover>> {
    let Some(api_key) = cfg.api_key.clone().filter(|k| !k.is_empty()) else {
        tracing::warn!("RM_BG_API_KEY is not set, background removal disabled");
        return None;
    };
    let remover: Box<dyn BackgroundRemover> = match cfg.provider {
        ProviderKind::Direct => Box::new(DirectRemover::new(
            cfg.endpoint(),
            cfg.api_key_header(),
            api_key,
            cfg.retry.policy(),
        )),
        ProviderKind::Slug => match SlugRemover::new(
            cfg.endpoint(),
            &cfg.base_url,
            cfg.api_key_header(),
            api_key,
            cfg.retry.policy(),
        ) {
            Ok(r) => Box::new(r.with_settle_delay(cfg.settle_delay())),
            Err(e) => {
                tracing::error!(base_url = %cfg.base_url, error = %e, "background removal disabled");
                return None;
            }
        },
    };
    tracing::info!(provider = ?cfg.provider, endpoint = %cfg.endpoint(), "background removal enabled");
    Some(remover)
}
