//! `feedframe frame` – composite downloaded images onto the template.

use anyhow::Result;
use feedframe_core::orchestrator::{self, Project};
use feedframe_core::timing;

pub fn run_frame(project: &Project) -> Result<()> {
    let stats = timing::run_recorded("frame", || orchestrator::frame_stage(project))?;
    println!(
        "{} images: {} framed, {} cached, {} failed",
        stats.total, stats.framed, stats.skipped_cached, stats.failed
    );
    Ok(())
}
