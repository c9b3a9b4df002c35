//! `feedframe rewrite` – point feed pictures at framed images.

use anyhow::Result;
use feedframe_core::orchestrator::{self, Project};
use feedframe_core::timing;

pub fn run_rewrite(project: &Project) -> Result<()> {
    let summary = timing::run_recorded("rewrite", || orchestrator::rewrite_stage(project))?;
    println!(
        "{} feeds rewritten: {} pictures replaced, {} offers removed",
        summary.feeds, summary.pictures_replaced, summary.offers_removed
    );
    for path in &summary.saved {
        println!("  {}", path.display());
    }
    Ok(())
}
