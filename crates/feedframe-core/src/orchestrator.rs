//! Stage sequencing.
//!
//! `run_all` is fetch → list feeds → download images → list images → frame.
//! An empty feed or image directory after its producing stage aborts the
//! run; every other per-item failure has already been absorbed by the stage.

use std::path::{Path, PathBuf};

use crate::cache;
use crate::config::{FeedframeConfig, ProjectPaths};
use crate::error::FailureKind;
use crate::feed::{FeedError, FeedFetcher, FeedRewriter, FetchSummary, RewriteError};
use crate::pipeline::composite::Layout;
use crate::pipeline::{download, remove_bg, DownloadStats, FrameStats, ImagePipeline, PipelineError};
use crate::storage::{self, ListError};
use crate::timing;

#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error(transparent)]
    Fetch(#[from] FeedError),
    #[error("no feed files to process in {}: {source}", .dir.display())]
    NoFeedFiles {
        dir: PathBuf,
        #[source]
        source: ListError,
    },
    #[error("no images to frame in {}: {source}", .dir.display())]
    NoImages {
        dir: PathBuf,
        #[source]
        source: ListError,
    },
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
    #[error(transparent)]
    Rewrite(#[from] RewriteError),
}

impl RunError {
    pub fn kind(&self) -> FailureKind {
        match self {
            RunError::Fetch(e) => e.kind(),
            RunError::NoFeedFiles { .. } | RunError::NoImages { .. } => FailureKind::Fatal,
            RunError::Pipeline(e) => e.kind(),
            RunError::Rewrite(e) => e.kind(),
        }
    }
}

/// Counters of a full run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub fetch: FetchSummary,
    pub downloads: DownloadStats,
    pub frames: FrameStats,
}

/// Rewrite stage counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RewriteSummary {
    pub feeds: usize,
    pub pictures_replaced: usize,
    pub offers_removed: usize,
    pub saved: Vec<PathBuf>,
}

/// Configuration plus resolved directories for one invocation.
#[derive(Debug, Clone)]
pub struct Project {
    pub config: FeedframeConfig,
    pub paths: ProjectPaths,
}

impl Project {
    pub fn new(root: &Path, config: FeedframeConfig) -> Self {
        let paths = ProjectPaths::resolve(root, &config);
        Self { config, paths }
    }

    pub fn feed_fetcher(&self) -> FeedFetcher {
        FeedFetcher::new(&self.paths.temp_feeds, self.config.feed_retry.policy())
    }

    /// Pipeline with the configured background remover (if any).
    pub fn image_pipeline(&self) -> ImagePipeline {
        ImagePipeline::new(&self.paths, Layout::from(&self.config.composite))
            .with_download_options(download::image_request_options(
                self.config.image_referer.as_deref(),
            ))
            .with_remover(remove_bg::from_config(&self.config.background))
    }
}

/// Downloads every configured feed into the raw feed directory.
pub fn fetch_stage(project: &Project) -> Result<FetchSummary, RunError> {
    timing::timed("fetch", || -> Result<_, RunError> {
        Ok(project.feed_fetcher().fetch_all(&project.config.feeds)?)
    })
}

/// Downloads images for every feed file on disk.
pub fn images_stage(project: &Project) -> Result<DownloadStats, RunError> {
    images_with(project, &project.image_pipeline())
}

/// Frames every raw image on disk.
pub fn frame_stage(project: &Project) -> Result<FrameStats, RunError> {
    frame_with(project, &project.image_pipeline())
}

/// Full run with one shared pipeline.
pub fn run_all(project: &Project) -> Result<RunReport, RunError> {
    let fetch = fetch_stage(project)?;
    let pipeline = project.image_pipeline();
    let downloads = images_with(project, &pipeline)?;
    let frames = frame_with(project, &pipeline)?;
    Ok(RunReport {
        fetch,
        downloads,
        frames,
    })
}

/// Image download pass over the feeds in the raw feed directory, which must
/// not be missing or empty.
pub fn images_with(project: &Project, pipeline: &ImagePipeline) -> Result<DownloadStats, RunError> {
    let dir = &project.paths.temp_feeds;
    let feeds = list_required(dir).map_err(|source| RunError::NoFeedFiles {
        dir: dir.clone(),
        source,
    })?;
    timing::timed("images", || -> Result<_, RunError> {
        Ok(pipeline.download_images(&feeds)?)
    })
}

/// Framing pass over the raw image directory, which must not be missing or
/// empty.
pub fn frame_with(project: &Project, pipeline: &ImagePipeline) -> Result<FrameStats, RunError> {
    let dir = &project.paths.old_images;
    let images = list_required(dir).map_err(|source| RunError::NoImages {
        dir: dir.clone(),
        source,
    })?;
    timing::timed("frame", || -> Result<_, RunError> {
        Ok(pipeline.frame_images(&images)?)
    })
}

/// Points each feed's pictures at the framed images, drops offers with
/// category 0 and saves `{prefix}_{file}` into the new feed directory.
pub fn rewrite_stage(project: &Project) -> Result<RewriteSummary, RunError> {
    let paths = &project.paths;
    let feeds = list_required(&paths.temp_feeds).map_err(|source| RunError::NoFeedFiles {
        dir: paths.temp_feeds.clone(),
        source,
    })?;
    let framed = match cache::files_by_identifier(&paths.new_images) {
        Ok(map) => map,
        Err(e) if e.kind() != FailureKind::Fatal => {
            tracing::warn!(error = %e, "no framed images, pictures stay unchanged");
            Default::default()
        }
        Err(e) => return Err(PipelineError::from(e).into()),
    };

    timing::timed("rewrite", || -> Result<_, RunError> {
        let mut summary = RewriteSummary::default();
        for file_name in &feeds {
            let mut rewriter = match FeedRewriter::load(&paths.temp_feeds, file_name) {
                Ok(r) => r,
                Err(e) if e.kind() == FailureKind::Validation => {
                    tracing::error!(file = %file_name, error = %e, "skipping feed");
                    continue;
                }
                Err(e) => return Err(e.into()),
            };
            summary.feeds += 1;
            summary.pictures_replaced += rewriter
                .replace_images(&framed, &project.config.image_base_url)
                .added;
            summary.offers_removed += rewriter.delete_uncategorized_offers();
            summary
                .saved
                .push(rewriter.save(&paths.new_feeds, &project.config.output_prefix)?);
        }
        Ok(summary)
    })
}

fn list_required(dir: &Path) -> Result<Vec<String>, ListError> {
    storage::list_files(dir).inspect_err(|e| tracing::error!(error = %e, "required directory unusable"))
}
