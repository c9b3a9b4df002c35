//! `feedframe images` – download offer images from saved feeds.

use anyhow::Result;
use feedframe_core::orchestrator::{self, Project};
use feedframe_core::timing;

pub fn run_images(project: &Project) -> Result<()> {
    let stats = timing::run_recorded("images", || orchestrator::images_stage(project))?;
    println!(
        "{} offers in {} feeds: {} downloaded, {} cached, {} failed, {} backgrounds removed",
        stats.offers,
        stats.feeds,
        stats.downloaded,
        stats.skipped_cached,
        stats.failed,
        stats.background_removed
    );
    Ok(())
}
