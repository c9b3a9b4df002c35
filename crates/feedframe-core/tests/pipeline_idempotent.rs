//! Re-running the pipeline over unchanged inputs downloads and composites
//! nothing new.

mod common;

use common::feed_server::{Reply, ScriptedServer};
use feedframe_core::config::{FeedframeConfig, ProjectPaths};
use feedframe_core::http::RequestOptions;
use feedframe_core::orchestrator::{self, Project};
use feedframe_core::pipeline::composite::Layout;
use feedframe_core::pipeline::remove_bg::{BackgroundRemover, RemoveBgError};
use feedframe_core::pipeline::ImagePipeline;
use feedframe_core::storage;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::tempdir;

/// Returns the input unchanged and counts calls.
struct CountingRemover(Arc<AtomicUsize>);

impl BackgroundRemover for CountingRemover {
    fn remove_background(&self, image: &[u8], _file_name: &str) -> Result<Vec<u8>, RemoveBgError> {
        self.0.fetch_add(1, Ordering::SeqCst);
        Ok(image.to_vec())
    }
}

fn image_server() -> ScriptedServer {
    ScriptedServer::start(vec![
        ("/img/a.png", vec![Reply::png(common::png_bytes(40, 30, [200, 0, 0, 255]))]),
        ("/img/b.png", vec![Reply::png(common::png_bytes(30, 60, [0, 0, 200, 255]))]),
        ("/img/denied.png", vec![Reply::status(403)]),
    ])
}

fn write_template(paths: &ProjectPaths) {
    std::fs::create_dir_all(&paths.frame_dir).unwrap();
    std::fs::write(&paths.frame_file, common::png_bytes(200, 200, [0, 0, 0, 0])).unwrap();
}

fn write_feed(dir: &Path, name: &str, body: &str) {
    std::fs::create_dir_all(dir).unwrap();
    std::fs::write(dir.join(name), body).unwrap();
}

#[test]
fn second_pass_skips_everything() {
    let server = image_server();
    let root = tempdir().unwrap();
    let paths = ProjectPaths::resolve(root.path(), &FeedframeConfig::default());
    write_template(&paths);
    write_feed(
        &paths.temp_feeds,
        "catalog.xml",
        &common::catalog(&[
            ("A", server.url("/img/a.png").as_str()),
            ("B", server.url("/img/b.png").as_str()),
            ("A", server.url("/img/a.png").as_str()),
            ("C", server.url("/img/denied.png").as_str()),
        ]),
    );

    let calls = Arc::new(AtomicUsize::new(0));
    let pipeline = ImagePipeline::new(&paths, Layout::default())
        .with_download_options(RequestOptions::default())
        .with_remover(Some(Box::new(CountingRemover(Arc::clone(&calls)))));
    let feeds = vec!["catalog.xml".to_string()];

    let first = pipeline.download_images(&feeds).unwrap();
    assert_eq!(first.offers, 4);
    assert_eq!(first.downloaded, 2);
    assert_eq!(first.skipped_cached, 1);
    assert_eq!(first.failed, 1);
    assert_eq!(first.background_removed, 2);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(server.hits("/img/a.png"), 1);

    let raw = storage::list_files(&paths.old_images).unwrap();
    assert_eq!(raw, vec!["A.png".to_string(), "B.png".to_string()]);
    let framed = pipeline.frame_images(&raw).unwrap();
    assert_eq!(framed.framed, 2);
    let out = image::open(paths.new_images.join("A.png")).unwrap();
    assert_eq!((out.width(), out.height()), (200, 200));

    let second = pipeline.download_images(&feeds).unwrap();
    assert_eq!(second.downloaded, 0);
    assert_eq!(second.skipped_cached, 3);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(server.hits("/img/a.png"), 1);
    assert_eq!(server.hits("/img/b.png"), 1);

    let reframed = pipeline.frame_images(&raw).unwrap();
    assert_eq!(reframed.framed, 0);
    assert_eq!(reframed.skipped_cached, 2);
}

#[test]
fn unwritable_image_does_not_stop_later_offers() {
    let server = image_server();
    let root = tempdir().unwrap();
    let paths = ProjectPaths::resolve(root.path(), &FeedframeConfig::default());
    write_feed(
        &paths.temp_feeds,
        "catalog.xml",
        &common::catalog(&[
            ("B", server.url("/img/b.png").as_str()),
            ("A", server.url("/img/a.png").as_str()),
        ]),
    );
    std::fs::create_dir_all(paths.old_images.join("B.png.part")).unwrap();

    let pipeline =
        ImagePipeline::new(&paths, Layout::default()).with_download_options(RequestOptions::default());
    let stats = pipeline.download_images(&["catalog.xml".to_string()]).unwrap();
    assert_eq!(stats.downloaded, 1);
    assert_eq!(stats.failed, 1);
    assert!(paths.old_images.join("A.png").exists());
    assert!(!paths.old_images.join("B.png").exists());
    assert_eq!(server.hits("/img/a.png"), 1);
}

#[test]
fn full_run_is_idempotent() {
    let server = ScriptedServer::start(vec![
        ("/img/a.png", vec![Reply::png(common::png_bytes(40, 30, [200, 0, 0, 255]))]),
        ("/img/b.png", vec![Reply::png(common::png_bytes(30, 60, [0, 0, 200, 255]))]),
    ]);
    let feed_body = common::catalog(&[
        ("A", server.url("/img/a.png").as_str()),
        ("B", server.url("/img/b.png").as_str()),
    ]);
    let feed_server = ScriptedServer::start(vec![("/export/shop.xml", vec![Reply::xml(feed_body)])]);

    let root = tempdir().unwrap();
    let mut config = FeedframeConfig::default();
    config.feeds = vec![feed_server.url("/export/shop.xml")];
    let project = Project::new(root.path(), config);
    write_template(&project.paths);

    let first = orchestrator::run_all(&project).unwrap();
    assert_eq!(first.fetch.succeeded, 1);
    assert_eq!(first.downloads.downloaded, 2);
    assert_eq!(first.frames.framed, 2);

    let second = orchestrator::run_all(&project).unwrap();
    assert_eq!(second.fetch.succeeded, 1);
    assert_eq!(second.downloads.downloaded, 0);
    assert_eq!(second.downloads.skipped_cached, 2);
    assert_eq!(second.frames.framed, 0);
    assert_eq!(second.frames.skipped_cached, 2);
    assert_eq!(server.hits("/img/a.png"), 1);
    assert_eq!(feed_server.hits("/export/shop.xml"), 2);
}

#[test]
fn run_aborts_when_no_feed_was_saved() {
    let feed_server = ScriptedServer::start(vec![("/export/shop.xml", vec![Reply::xml("<offers>")])]);
    let root = tempdir().unwrap();
    let mut config = FeedframeConfig::default();
    config.feeds = vec![feed_server.url("/export/shop.xml")];
    let project = Project::new(root.path(), config);

    let err = orchestrator::run_all(&project).unwrap_err();
    assert!(matches!(err, orchestrator::RunError::NoFeedFiles { .. }), "got {:?}", err);
}
