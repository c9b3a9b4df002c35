//! CLI for the feedframe catalog image pipeline.

mod commands;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use feedframe_core::config;
use feedframe_core::orchestrator::Project;
use std::path::PathBuf;

use commands::{run_fetch, run_frame, run_images, run_pipeline, run_rewrite};

/// Top-level CLI for feedframe.
#[derive(Debug, Parser)]
#[command(name = "feedframe")]
#[command(
    about = "feedframe: fetch catalog feeds, remove image backgrounds and frame product photos",
    long_about = None
)]
pub struct Cli {
    /// Project root; all working folders resolve under it (default: current directory).
    #[arg(long, global = true, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Config file to use instead of ~/.config/feedframe/config.toml.
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<CliCommand>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
pub enum CliCommand {
    /// Fetch feeds, download images, then frame them (default).
    Run,
    /// Download and validate the configured feeds only.
    Fetch,
    /// Download offer images (and remove backgrounds) from saved feeds.
    Images,
    /// Composite downloaded images onto the template.
    Frame,
    /// Point feed pictures at framed images and save the rewritten feeds.
    Rewrite,
}

impl Cli {
    pub fn root(&self) -> PathBuf {
        self.root.clone().unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn command(&self) -> CliCommand {
        self.command.unwrap_or(CliCommand::Run)
    }

    pub fn run(&self) -> Result<()> {
        let mut cfg = match &self.config {
            Some(path) => config::load_from(path)?,
            None => config::load_or_init().context("load config")?,
        };
        cfg.apply_process_env();
        tracing::debug!(
            feeds = cfg.feeds.len(),
            provider = ?cfg.background.provider,
            api_key_set = cfg.background.api_key.is_some(),
            "loaded config"
        );

        let project = Project::new(&self.root(), cfg);
        match self.command() {
            CliCommand::Run => run_pipeline(&project),
            CliCommand::Fetch => run_fetch(&project),
            CliCommand::Images => run_images(&project),
            CliCommand::Frame => run_frame(&project),
            CliCommand::Rewrite => run_rewrite(&project),
        }
    }
}

#[cfg(test)]
mod tests;
