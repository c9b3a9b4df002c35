//! `feedframe run` – full pipeline: fetch, images, frame.

use anyhow::Result;
use feedframe_core::orchestrator::{self, Project};
use feedframe_core::timing;

pub fn run_pipeline(project: &Project) -> Result<()> {
    let report = timing::run_recorded("run", || orchestrator::run_all(project))?;
    println!(
        "feeds {}/{} saved, images {} downloaded ({} cached, {} failed), {} framed ({} cached, {} failed)",
        report.fetch.succeeded,
        report.fetch.attempted,
        report.downloads.downloaded,
        report.downloads.skipped_cached,
        report.downloads.failed,
        report.frames.framed,
        report.frames.skipped_cached,
        report.frames.failed,
    );
    Ok(())
}
