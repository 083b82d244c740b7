//! Ordered fallback across a dataset's sources
//!
//! Sources are tried strictly in configured priority order; the first one
//! producing a structurally valid series wins and nothing after it is
//! contacted. Only when every source — the bundled sample included — has
//! failed does a terminal error reach the caller.

use thiserror::Error;
use tracing::{debug, warn};

use super::source::SourceError;
use super::table::SeriesTable;
use super::DatasetSpec;

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("insufficient {dataset} data")]
    InsufficientHistory { dataset: String },
    #[error("all sources exhausted for {dataset}: {reasons}")]
    Exhausted { dataset: String, reasons: String },
}

/// Fetch one dataset through its source chain.
///
/// On acceptance the series is provenance-tagged, the optional rolling mean
/// is derived over the full history, and only then is the trailing window
/// applied. Validation always runs against the untrimmed series.
pub async fn fetch_series(
    http: &reqwest::Client,
    spec: &DatasetSpec,
) -> Result<SeriesTable, DatasetError> {
    let mut failures: Vec<(String, SourceError)> = Vec::new();

    for source in &spec.sources {
        match source.load_points(http).await.and_then(|points| {
            if points.len() < spec.min_rows {
                Err(SourceError::InsufficientHistory {
                    got: points.len(),
                    need: spec.min_rows,
                })
            } else {
                Ok(points)
            }
        }) {
            Ok(points) => {
                debug!(
                    dataset = spec.name,
                    source = %source.locator,
                    rows = points.len(),
                    "source accepted"
                );
                let mut table = SeriesTable::new(points, source.provenance());
                if let Some(window) = spec.ma_window {
                    table.apply_moving_average(window);
                }
                table.tail(spec.window);
                return Ok(table);
            }
            Err(err) => {
                warn!(
                    dataset = spec.name,
                    source = %source.locator,
                    error = %err,
                    "source failed, falling through"
                );
                failures.push((source.locator.clone(), err));
            }
        }
    }

    // Every source failed. If history length was the only problem, say so;
    // otherwise report the full exhaustion trail.
    if !failures.is_empty() && failures.iter().all(|(_, e)| e.is_insufficient_history()) {
        return Err(DatasetError::InsufficientHistory {
            dataset: spec.name.to_string(),
        });
    }

    let reasons = failures
        .iter()
        .map(|(locator, err)| format!("{locator}: {err}"))
        .collect::<Vec<_>>()
        .join("; ");
    Err(DatasetError::Exhausted {
        dataset: spec.name.to_string(),
        reasons,
    })
}
