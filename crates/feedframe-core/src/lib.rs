//! feedframe core: catalog feed fetching, offer image download, background
//! removal and compositing, with filename-based caching between runs.

pub mod cache;
pub mod config;
pub mod error;
pub mod feed;
pub mod http;
pub mod logging;
pub mod naming;
pub mod orchestrator;
pub mod pipeline;
pub mod retry;
pub mod storage;
pub mod timing;
pub mod xml;

pub use error::FailureKind;
