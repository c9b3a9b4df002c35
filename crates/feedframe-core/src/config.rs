use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::retry::RetryPolicy;

/// Output and working directories, relative to the project root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FolderConfig {
    /// Raw feeds as downloaded (`FEEDS_FOLDER`).
    pub temp_feeds: String,
    /// Rewritten feeds (`NEW_FEEDS_FOLDER`).
    pub new_feeds: String,
    /// Raw and background-removed images (`IMAGE_FOLDER`).
    pub old_images: String,
    /// Final composited images (`NEW_IMAGE_FOLDER`).
    pub new_images: String,
    /// Template asset (`FRAME_FOLDER`).
    pub frame: String,
}

impl Default for FolderConfig {
    fn default() -> Self {
        Self {
            temp_feeds: "temp_feeds".to_string(),
            new_feeds: "new_feeds".to_string(),
            old_images: "old_images".to_string(),
            new_images: "new_images".to_string(),
            frame: "frame".to_string(),
        }
    }
}

/// Fixed delay table (feed downloads).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FixedRetryConfig {
    /// Maximum number of attempts (including the first).
    pub max_attempts: u32,
    /// Delay in seconds after each failed attempt; the last value repeats.
    pub delays_secs: Vec<f64>,
}

impl Default for FixedRetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delays_secs: vec![2.0, 5.0, 10.0],
        }
    }
}

impl FixedRetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::fixed(
            self.max_attempts,
            self.delays_secs.iter().map(|s| secs(*s)).collect(),
        )
    }
}

/// Exponential backoff with jitter (background-removal API).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackoffRetryConfig {
    pub max_attempts: u32,
    /// Base delay in seconds; doubled after every failed attempt.
    pub base_delay_secs: f64,
    /// Upper bound on the delay before jitter.
    pub max_delay_secs: f64,
}

impl Default for BackoffRetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay_secs: 2.0,
            max_delay_secs: 30.0,
        }
    }
}

impl BackoffRetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::exponential(
            self.max_attempts,
            secs(self.base_delay_secs),
            secs(self.max_delay_secs),
        )
    }
}

/// Background-removal API flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Response body is the processed image.
    Direct,
    /// Response is a JSON list of renditions; the `no-bg` one is fetched separately.
    #[default]
    Slug,
}

/// Background-removal settings. The API key comes from the environment only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackgroundConfig {
    pub provider: ProviderKind,
    /// Upload URL. Defaults depend on `provider`.
    pub endpoint: Option<String>,
    /// Base for relative result paths (`slug` provider).
    pub base_url: String,
    /// Header carrying the API key. Defaults depend on `provider`.
    pub api_key_header: Option<String>,
    /// Pause between upload and result download (`slug` provider).
    pub settle_delay_secs: f64,
    pub retry: BackoffRetryConfig,
    /// `RM_BG_API_KEY`; never written to disk.
    #[serde(skip)]
    pub api_key: Option<String>,
}

impl Default for BackgroundConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::default(),
            endpoint: None,
            base_url: "https://api.ba-la.ru/".to_string(),
            api_key_header: None,
            settle_delay_secs: 1.0,
            retry: BackoffRetryConfig::default(),
            api_key: None,
        }
    }
}

impl BackgroundConfig {
    pub fn endpoint(&self) -> &str {
        match (&self.endpoint, self.provider) {
            (Some(url), _) => url,
            (None, ProviderKind::Direct) => "https://sdk.photoroom.com/v1/segment",
            (None, ProviderKind::Slug) => "https://api.ba-la.ru/api/remove",
        }
    }

    pub fn api_key_header(&self) -> &str {
        match (&self.api_key_header, self.provider) {
            (Some(name), _) => name,
            (None, ProviderKind::Direct) => "x-api-key",
            (None, ProviderKind::Slug) => "api-key",
        }
    }

    pub fn settle_delay(&self) -> Duration {
        secs(self.settle_delay_secs)
    }
}

/// Placement of the product on the template canvas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompositeConfig {
    /// Product height as a fraction of canvas height.
    pub height_fraction: f64,
    /// Vertical centre of the product as a fraction of canvas height.
    pub anchor_y: f64,
}

impl Default for CompositeConfig {
    fn default() -> Self {
        Self {
            height_fraction: 0.6,
            anchor_y: 0.56,
        }
    }
}

/// Global configuration loaded from `~/.config/feedframe/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedframeConfig {
    /// Feed URLs fetched by the `fetch` stage.
    pub feeds: Vec<String>,
    pub folders: FolderConfig,
    /// Template filename inside `folders.frame`.
    pub frame_filename: String,
    /// Prefix of rewritten feed files (`{prefix}_{original}`).
    pub output_prefix: String,
    /// Public URL under which `new_images` is served; used by `rewrite`.
    pub image_base_url: String,
    /// `referer` sent with product image downloads.
    pub image_referer: Option<String>,
    pub feed_retry: FixedRetryConfig,
    pub background: BackgroundConfig,
    pub composite: CompositeConfig,
}

impl Default for FeedframeConfig {
    fn default() -> Self {
        Self {
            feeds: Vec::new(),
            folders: FolderConfig::default(),
            frame_filename: "canvas.png".to_string(),
            output_prefix: "new".to_string(),
            image_base_url: "https://feeds.example.com/new_images".to_string(),
            image_referer: None,
            feed_retry: FixedRetryConfig::default(),
            background: BackgroundConfig::default(),
            composite: CompositeConfig::default(),
        }
    }
}

impl FeedframeConfig {
    /// Applies environment overrides using `lookup` (so tests need not touch
    /// the process environment). Blank values are ignored.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let folders = [
            ("FEEDS_FOLDER", &mut self.folders.temp_feeds),
            ("NEW_FEEDS_FOLDER", &mut self.folders.new_feeds),
            ("IMAGE_FOLDER", &mut self.folders.old_images),
            ("NEW_IMAGE_FOLDER", &mut self.folders.new_images),
            ("FRAME_FOLDER", &mut self.folders.frame),
        ];
        for (name, slot) in folders {
            if let Some(value) = get(name) {
                tracing::debug!(var = name, value = %value, "folder override from environment");
                *slot = value;
            }
        }
        if let Some(key) = get("RM_BG_API_KEY") {
            self.background.api_key = Some(key.trim().to_string());
        }
    }

    pub fn apply_process_env(&mut self) {
        self.apply_env(|name| std::env::var(name).ok());
    }
}

/// Absolute directories for one run, derived from the root and [`FolderConfig`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectPaths {
    pub root: PathBuf,
    pub temp_feeds: PathBuf,
    pub new_feeds: PathBuf,
    pub old_images: PathBuf,
    pub new_images: PathBuf,
    pub frame_dir: PathBuf,
    /// Template image (`frame_dir/frame_filename`).
    pub frame_file: PathBuf,
}

impl ProjectPaths {
    pub fn resolve(root: &Path, cfg: &FeedframeConfig) -> Self {
        let join = |p: &str| root.join(p);
        let frame_dir = join(&cfg.folders.frame);
        Self {
            root: root.to_path_buf(),
            temp_feeds: join(&cfg.folders.temp_feeds),
            new_feeds: join(&cfg.folders.new_feeds),
            old_images: join(&cfg.folders.old_images),
            new_images: join(&cfg.folders.new_images),
            frame_file: frame_dir.join(&cfg.frame_filename),
            frame_dir,
        }
    }
}

fn secs(value: f64) -> Duration {
    Duration::try_from_secs_f64(value).unwrap_or(Duration::ZERO)
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("feedframe")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<FeedframeConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = FeedframeConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }
    load_from(&path)
}

/// Load configuration from an explicit file; it must exist.
pub fn load_from(path: &Path) -> Result<FeedframeConfig> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("read config {}", path.display()))?;
    let cfg: FeedframeConfig =
        toml::from_str(&data).with_context(|| format!("parse config {}", path.display()))?;
    Ok(cfg)
}
