//! CLI command handlers, one stage per file.

mod fetch;
mod frame;
mod images;
mod rewrite;
mod run;

pub use fetch::run_fetch;
pub use frame::run_frame;
pub use images::run_images;
pub use rewrite::run_rewrite;
pub use run::run_pipeline;
