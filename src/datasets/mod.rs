//! Dataset registry and the fetch chain behind the dashboard
//!
//! Two datasets today: the VIX volatility index and SPX gamma exposure.
//! Each is an ordered list of candidate sources ending in a bundled sample
//! file, plus its acceptance and windowing parameters.

pub mod chain;
pub mod source;
pub mod table;

pub use chain::{fetch_series, DatasetError};
pub use source::{Source, SourceError, SourceKind};
pub use table::{Provenance, SeriesPoint, SeriesTable, LOCAL_SAMPLE};

use crate::models::Config;

/// One named time series and how to retrieve it.
#[derive(Debug, Clone)]
pub struct DatasetSpec {
    pub name: &'static str,
    /// Priority order; the local static sample is always last.
    pub sources: Vec<Source>,
    /// Rows required before a source's series is accepted.
    pub min_rows: usize,
    /// Rolling-mean window derived after acceptance, before trimming.
    pub ma_window: Option<usize>,
    /// Trailing rows retained after validation.
    pub window: usize,
    pub ttl_secs: i64,
}

/// Daily VIX closes: needs a 20-day moving-average warm-up, so a source must
/// carry at least 30 rows to be worth accepting.
pub fn vix_spec(config: &Config) -> DatasetSpec {
    DatasetSpec {
        name: "vix",
        sources: vec![
            Source::remote(
                SourceKind::RemotePrimary,
                config.vix_primary_url.clone(),
                "Date",
                "Close",
            ),
            Source::remote(
                SourceKind::RemoteMirror,
                config.vix_mirror_url.clone(),
                "Date",
                "Close",
            ),
            Source::local(config.data_dir.join("sample_vix.csv"), "Date", "Close"),
        ],
        min_rows: 30,
        ma_window: Some(20),
        window: 90,
        ttl_secs: config.cache_ttl_secs,
    }
}

/// SPX gamma exposure: non-empty with the `GEX` column present is enough.
pub fn gex_spec(config: &Config) -> DatasetSpec {
    DatasetSpec {
        name: "gex",
        sources: vec![
            Source::remote(
                SourceKind::RemotePrimary,
                config.gex_primary_url.clone(),
                "date",
                "GEX",
            ),
            Source::remote(
                SourceKind::RemoteMirror,
                config.gex_mirror_url.clone(),
                "date",
                "GEX",
            ),
            Source::local(config.data_dir.join("sample_gex.csv"), "date", "GEX"),
        ],
        min_rows: 1,
        ma_window: None,
        window: 60,
        ttl_secs: config.cache_ttl_secs,
    }
}
