//! Image pipeline.
//!
//! Pass one ([`ImagePipeline::download_images`]) walks the downloaded feeds,
//! fetches each offer's picture into `old_images/{id}.png` and, when a
//! provider is configured, replaces it with the background-free version.
//! Pass two ([`ImagePipeline::frame_images`]) composites those files onto
//! the template into `new_images/{id}.png`. Both passes skip identifiers
//! already present in their output directory.

pub mod composite;
pub mod download;
pub mod remove_bg;

use std::path::PathBuf;

use crate::cache::ExistingItems;
use crate::config::ProjectPaths;
use crate::error::FailureKind;
use crate::feed;
use crate::http::RequestOptions;
use crate::naming;
use crate::storage::{self, ListError};

use composite::{CompositeError, Layout};
use remove_bg::BackgroundRemover;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Cache(#[from] ListError),
    #[error(transparent)]
    Composite(#[from] CompositeError),
}

impl PipelineError {
    pub fn kind(&self) -> FailureKind {
        match self {
            PipelineError::Cache(e) => e.kind(),
            PipelineError::Composite(e) => e.kind(),
        }
    }
}

/// Counters for the download pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DownloadStats {
    pub feeds: usize,
    pub offers: usize,
    pub offers_with_images: usize,
    pub downloaded: usize,
    pub skipped_cached: usize,
    pub failed: usize,
    pub background_removed: usize,
    pub background_failed: usize,
}

/// Counters for the framing pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub total: usize,
    pub framed: usize,
    pub skipped_cached: usize,
    pub failed: usize,
}

pub struct ImagePipeline {
    feeds_dir: PathBuf,
    raw_dir: PathBuf,
    framed_dir: PathBuf,
    template: PathBuf,
    layout: Layout,
    download: RequestOptions,
    remover: Option<Box<dyn BackgroundRemover>>,
}

impl ImagePipeline {
    pub fn new(paths: &ProjectPaths, layout: Layout) -> Self {
        Self {
            feeds_dir: paths.temp_feeds.clone(),
            raw_dir: paths.old_images.clone(),
            framed_dir: paths.new_images.clone(),
            template: paths.frame_file.clone(),
            layout,
            download: download::image_request_options(None),
            remover: None,
        }
    }

    pub fn with_remover(mut self, remover: Option<Box<dyn BackgroundRemover>>) -> Self {
        self.remover = remover;
        self
    }

    pub fn with_download_options(mut self, options: RequestOptions) -> Self {
        self.download = options;
        self
    }

    /// Downloads (and optionally strips the background of) every offer
    /// picture in `feed_files` whose identifier is not yet in the raw image
    /// directory. Per-offer failures, including unwritable files, are
    /// counted and skipped.
    pub fn download_images(&self, feed_files: &[String]) -> Result<DownloadStats, PipelineError> {
        let mut existing = ExistingItems::scan_or_empty(&self.raw_dir, "image")?;
        let mut stats = DownloadStats::default();

        for file_name in feed_files {
            let root = match feed::load_tree(&self.feeds_dir, file_name) {
                Ok(root) => root,
                Err(e) => {
                    tracing::error!(file = %file_name, kind = ?e.kind(), error = %e, "skipping unreadable feed");
                    continue;
                }
            };
            stats.feeds += 1;
            let scan = feed::extract_offer_images(&root);
            if scan.total_offers == 0 {
                tracing::debug!(file = %file_name, "feed has no offers");
            }
            stats.offers += scan.total_offers;
            stats.offers_with_images += scan.images.len();

            for offer in &scan.images {
                let Some(key) = naming::image_key(&offer.offer_id) else {
                    tracing::warn!(offer = %offer.offer_id, "offer id yields no usable filename");
                    stats.failed += 1;
                    continue;
                };
                if existing.contains(&key) {
                    stats.skipped_cached += 1;
                    continue;
                }
                let Some(bytes) = download::download_image(&offer.image_url, &self.download) else {
                    stats.failed += 1;
                    continue;
                };

                let image_name = format!("{}.{}", key, naming::IMAGE_EXTENSION);
                let path = self.raw_dir.join(&image_name);
                if let Err(e) = storage::write_atomic(&path, &bytes) {
                    tracing::error!(
                        offer = %offer.offer_id,
                        path = %path.display(),
                        error = %e,
                        "cannot save image"
                    );
                    stats.failed += 1;
                    continue;
                }
                existing.insert(key);
                stats.downloaded += 1;
                tracing::debug!(offer = %offer.offer_id, path = %path.display(), "image saved");

                if let Some(remover) = &self.remover {
                    match remover.remove_background(&bytes, &image_name) {
                        Ok(processed) => match storage::write_atomic(&path, &processed) {
                            Ok(()) => stats.background_removed += 1,
                            Err(e) => {
                                tracing::error!(
                                    offer = %offer.offer_id,
                                    path = %path.display(),
                                    error = %e,
                                    "cannot save background-free image, keeping original"
                                );
                                stats.background_failed += 1;
                            }
                        },
                        Err(e) => {
                            tracing::error!(
                                offer = %offer.offer_id,
                                kind = ?e.kind(),
                                error = %e,
                                "background removal failed, keeping original image"
                            );
                            stats.background_failed += 1;
                        }
                    }
                }
            }
        }

        tracing::info!(
            feeds = stats.feeds,
            offers = stats.offers,
            offers_with_images = stats.offers_with_images,
            downloaded = stats.downloaded,
            skipped_cached = stats.skipped_cached,
            failed = stats.failed,
            background_removed = stats.background_removed,
            background_failed = stats.background_failed,
            "image download pass finished"
        );
        Ok(stats)
    }

    /// Composites every file in `images` (names inside the raw image
    /// directory) onto the template, skipping identifiers already framed.
    /// The template itself must load.
    pub fn frame_images(&self, images: &[String]) -> Result<FrameStats, PipelineError> {
        let template = composite::load_template(&self.template)?;
        let mut existing = ExistingItems::scan_or_empty(&self.framed_dir, "framed image")?;
        let mut stats = FrameStats {
            total: images.len(),
            ..FrameStats::default()
        };

        for image_name in images {
            let Some(id) = naming::identifier_of(image_name) else {
                tracing::warn!(image = %image_name, "file name yields no identifier");
                stats.failed += 1;
                continue;
            };
            if existing.contains(id) {
                stats.skipped_cached += 1;
                continue;
            }
            let src = self.raw_dir.join(image_name);
            let dst = self
                .framed_dir
                .join(format!("{}.{}", id, naming::IMAGE_EXTENSION));
            match composite::composite_file(&template, &src, &dst, self.layout) {
                Ok(()) => {
                    existing.insert(id);
                    stats.framed += 1;
                }
                Err(e) if e.kind() == FailureKind::Fatal => return Err(e.into()),
                Err(e) => {
                    tracing::error!(image = %image_name, error = %e, "skipping image");
                    stats.failed += 1;
                }
            }
        }

        tracing::info!(
            total = stats.total,
            framed = stats.framed,
            skipped_cached = stats.skipped_cached,
            failed = stats.failed,
            "framing pass finished"
        );
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FeedframeConfig;
    use image::{Rgba, RgbaImage};
    use std::path::Path;

    fn paths(root: &Path) -> ProjectPaths {
        ProjectPaths::resolve(root, &FeedframeConfig::default())
    }

    #[test]
    fn frame_pass_skips_framed_and_counts_failures() {
        let dir = tempfile::tempdir().unwrap();
        let paths = paths(dir.path());
        std::fs::create_dir_all(&paths.frame_dir).unwrap();
        std::fs::create_dir_all(&paths.old_images).unwrap();
        RgbaImage::from_pixel(60, 60, Rgba([0, 0, 0, 0]))
            .save(&paths.frame_file)
            .unwrap();
        for id in ["1", "2"] {
            RgbaImage::from_pixel(10, 10, Rgba([9, 9, 9, 255]))
                .save(paths.old_images.join(format!("{}.png", id)))
                .unwrap();
        }
        std::fs::write(paths.old_images.join("3.png"), b"broken").unwrap();
        std::fs::create_dir_all(&paths.new_images).unwrap();
        std::fs::write(paths.new_images.join("2.png"), b"already").unwrap();

        let pipeline = ImagePipeline::new(&paths, Layout::default());
        let images = storage::list_files(&paths.old_images).unwrap();
        let stats = pipeline.frame_images(&images).unwrap();
        assert_eq!(
            stats,
            FrameStats {
                total: 3,
                framed: 1,
                skipped_cached: 1,
                failed: 1
            }
        );
        assert!(paths.new_images.join("1.png").exists());
        assert!(!paths.new_images.join("3.png").exists());
    }

    #[test]
    fn frame_pass_counts_nameless_files_as_failed() {
        let dir = tempfile::tempdir().unwrap();
        let paths = paths(dir.path());
        std::fs::create_dir_all(&paths.frame_dir).unwrap();
        RgbaImage::from_pixel(20, 20, Rgba([0, 0, 0, 0]))
            .save(&paths.frame_file)
            .unwrap();

        let pipeline = ImagePipeline::new(&paths, Layout::default());
        let stats = pipeline.frame_images(&[".png".to_string()]).unwrap();
        assert_eq!(
            stats,
            FrameStats {
                total: 1,
                framed: 0,
                skipped_cached: 0,
                failed: 1
            }
        );
    }

    #[test]
    fn frame_pass_without_template_fails() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = ImagePipeline::new(&paths(dir.path()), Layout::default());
        let err = pipeline.frame_images(&["1.png".to_string()]).unwrap_err();
        assert_eq!(err.kind(), FailureKind::Fatal);
    }

    #[test]
    fn download_pass_skips_unreadable_feeds() {
        let dir = tempfile::tempdir().unwrap();
        let paths = paths(dir.path());
        std::fs::create_dir_all(&paths.temp_feeds).unwrap();
        std::fs::write(paths.temp_feeds.join("bad.xml"), b"<offers><offer>").unwrap();
        let pipeline = ImagePipeline::new(&paths, Layout::default());
        let stats = pipeline.download_images(&["bad.xml".to_string()]).unwrap();
        assert_eq!(stats, DownloadStats::default());
        assert!(!paths.old_images.exists());
    }
}
