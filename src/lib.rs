//! TrustFlash dashboard backend
//!
//! Retrieval layer for the market dashboard: each dataset (VIX, GEX) is
//! fetched through an ordered source chain with a bundled static fallback,
//! validated, provenance-tagged, and memoized for the configured TTL. The
//! JSON API is the render trigger; it never re-fetches inside the window.

use std::sync::Arc;
use std::time::Duration;

pub mod api;
pub mod cache;
pub mod datasets;
pub mod models;
pub mod sanitize;

use cache::TtlCache;
use datasets::SeriesTable;
use models::Config;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub http: reqwest::Client,
    pub cache: Arc<TtlCache<SeriesTable>>,
}

impl AppState {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .build()?;

        Ok(Self {
            config,
            http,
            cache: Arc::new(TtlCache::new()),
        })
    }
}
