//! `feedframe fetch` – download and validate feeds.

use anyhow::Result;
use feedframe_core::orchestrator::{self, Project};
use feedframe_core::timing;

pub fn run_fetch(project: &Project) -> Result<()> {
    let summary = timing::run_recorded("fetch", || orchestrator::fetch_stage(project))?;
    println!("{} of {} feeds saved", summary.succeeded, summary.attempted);
    for path in &summary.saved {
        println!("  {}", path.display());
    }
    Ok(())
}
