//! Single-source retrieval and CSV parsing
//!
//! A `Source` is one candidate origin for a dataset: a remote CSV endpoint,
//! a mirror of it, or the bundled sample file. Every way a source can fail
//! is a recoverable `SourceError`; the chain absorbs them and moves on.

use chrono::NaiveDate;
use std::path::PathBuf;
use thiserror::Error;
use tracing::debug;

use super::table::{Provenance, SeriesPoint};

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("read failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv parse failed: {0}")]
    Csv(#[from] csv::Error),
    #[error("malformed field {column:?} at row {row}: {detail}")]
    Malformed {
        column: String,
        row: usize,
        detail: String,
    },
    #[error("missing required column: {0}")]
    MissingColumn(String),
    #[error("empty series")]
    Empty,
    #[error("insufficient history: {got} rows, need {need}")]
    InsufficientHistory { got: usize, need: usize },
}

impl SourceError {
    pub fn is_insufficient_history(&self) -> bool {
        matches!(self, SourceError::InsufficientHistory { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    RemotePrimary,
    RemoteMirror,
    LocalStatic,
}

/// One configured origin plus its CSV parse rules.
#[derive(Debug, Clone)]
pub struct Source {
    pub kind: SourceKind,
    pub locator: String,
    pub date_column: String,
    pub value_column: String,
}

impl Source {
    pub fn remote(kind: SourceKind, url: impl Into<String>, date: &str, value: &str) -> Self {
        Self {
            kind,
            locator: url.into(),
            date_column: date.to_string(),
            value_column: value.to_string(),
        }
    }

    pub fn local(path: PathBuf, date: &str, value: &str) -> Self {
        Self {
            kind: SourceKind::LocalStatic,
            locator: path.to_string_lossy().into_owned(),
            date_column: date.to_string(),
            value_column: value.to_string(),
        }
    }

    pub fn provenance(&self) -> Provenance {
        match self.kind {
            SourceKind::LocalStatic => Provenance::LocalSample,
            _ => Provenance::Remote(self.locator.clone()),
        }
    }

    /// Retrieve and parse this source into date-ordered points.
    ///
    /// Remote kinds go through the shared client, which carries the bounded
    /// request timeout; a hanging endpoint cannot stall the chain.
    pub async fn load_points(&self, http: &reqwest::Client) -> Result<Vec<SeriesPoint>, SourceError> {
        let body = match self.kind {
            SourceKind::LocalStatic => std::fs::read_to_string(&self.locator)?,
            _ => {
                http.get(&self.locator)
                    .send()
                    .await?
                    .error_for_status()?
                    .text()
                    .await?
            }
        };
        debug!(source = %self.locator, bytes = body.len(), "source payload received");
        self.parse_csv(&body)
    }

    fn parse_csv(&self, body: &str) -> Result<Vec<SeriesPoint>, SourceError> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(body.as_bytes());

        let headers = rdr.headers()?.clone();
        let date_idx = column_index(&headers, &self.date_column)
            .ok_or_else(|| SourceError::MissingColumn(self.date_column.clone()))?;
        let value_idx = column_index(&headers, &self.value_column)
            .ok_or_else(|| SourceError::MissingColumn(self.value_column.clone()))?;

        let mut points = Vec::new();
        for (row, record) in rdr.records().enumerate() {
            let record = record?;
            let date_raw = record.get(date_idx).unwrap_or_default();
            let value_raw = record.get(value_idx).unwrap_or_default();

            let date = parse_date(date_raw).ok_or_else(|| SourceError::Malformed {
                column: self.date_column.clone(),
                row,
                detail: format!("bad date {date_raw:?}"),
            })?;
            let value = value_raw
                .parse::<f64>()
                .map_err(|e| SourceError::Malformed {
                    column: self.value_column.clone(),
                    row,
                    detail: e.to_string(),
                })?;

            points.push(SeriesPoint {
                date,
                value,
                ma: None,
            });
        }

        if points.is_empty() {
            return Err(SourceError::Empty);
        }
        Ok(points)
    }
}

fn column_index(headers: &csv::StringRecord, name: &str) -> Option<usize> {
    headers.iter().position(|h| h.eq_ignore_ascii_case(name))
}

/// Dates arrive as `2025-06-30` or as full timestamps; take the date part.
fn parse_date(raw: &str) -> Option<NaiveDate> {
    let head = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(head, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%m/%d/%Y"))
        .ok()
}
