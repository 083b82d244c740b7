//! Process configuration.

use std::env;
use std::path::PathBuf;

const DEFAULT_VIX_PRIMARY: &str = "https://stooq.com/q/d/l/?s=%5Evix&i=d";
const DEFAULT_VIX_MIRROR: &str = "https://stooq.pl/q/d/l/?s=%5Evix&i=d";
const DEFAULT_GEX_PRIMARY: &str =
    "https://raw.githubusercontent.com/SqueezeMetrics/legacy-data/master/spy_gex.csv";
const DEFAULT_GEX_MIRROR: &str =
    "https://cdn.jsdelivr.net/gh/SqueezeMetrics/legacy-data@master/spy_gex.csv";

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub data_dir: PathBuf,
    /// Cache time-to-live; the dashboard advertises 15-minute refresh.
    pub cache_ttl_secs: i64,
    /// Bound on every remote source attempt, mirrors included.
    pub http_timeout_secs: u64,
    pub vix_primary_url: String,
    pub vix_mirror_url: String,
    pub gex_primary_url: String,
    pub gex_mirror_url: String,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();

        let port = env::var("PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .unwrap_or(8080);

        let data_dir = env::var("DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./data"));

        let cache_ttl_secs = env::var("CACHE_TTL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|&v| v > 0)
            .unwrap_or(900);

        let http_timeout_secs = env::var("HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|&v| v > 0)
            .unwrap_or(10);

        Self {
            port,
            data_dir,
            cache_ttl_secs,
            http_timeout_secs,
            vix_primary_url: env::var("VIX_PRIMARY_URL")
                .unwrap_or_else(|_| DEFAULT_VIX_PRIMARY.to_string()),
            vix_mirror_url: env::var("VIX_MIRROR_URL")
                .unwrap_or_else(|_| DEFAULT_VIX_MIRROR.to_string()),
            gex_primary_url: env::var("GEX_PRIMARY_URL")
                .unwrap_or_else(|_| DEFAULT_GEX_PRIMARY.to_string()),
            gex_mirror_url: env::var("GEX_MIRROR_URL")
                .unwrap_or_else(|_| DEFAULT_GEX_MIRROR.to_string()),
        }
    }
}
