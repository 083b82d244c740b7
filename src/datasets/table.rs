//! Validated series tables handed to the presentation layer.

use chrono::NaiveDate;
use serde::{Serialize, Serializer};
use std::fmt;

/// Sentinel recorded when the bundled sample file served a request.
pub const LOCAL_SAMPLE: &str = "local_sample";

/// Which source produced a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Provenance {
    /// A remote endpoint, identified by its URL.
    Remote(String),
    /// The bundled static sample file.
    LocalSample,
}

impl Provenance {
    pub fn is_sample(&self) -> bool {
        matches!(self, Provenance::LocalSample)
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provenance::Remote(url) => f.write_str(url),
            Provenance::LocalSample => f.write_str(LOCAL_SAMPLE),
        }
    }
}

impl Serialize for Provenance {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// One observation: a date, the raw value, and (for VIX) the rolling mean.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ma: Option<f64>,
}

/// An ordered, validated series with its provenance tag.
#[derive(Debug, Clone, Serialize)]
pub struct SeriesTable {
    pub points: Vec<SeriesPoint>,
    pub provenance: Provenance,
}

impl SeriesTable {
    pub fn new(points: Vec<SeriesPoint>, provenance: Provenance) -> Self {
        Self { points, provenance }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn last(&self) -> Option<&SeriesPoint> {
        self.points.last()
    }

    /// Keep only the most recent `n` points, original order preserved.
    pub fn tail(&mut self, n: usize) {
        let len = self.points.len();
        if len > n {
            self.points.drain(..len - n);
        }
    }

    /// Fill each point's `ma` with the trailing `window`-period mean of the
    /// value column. Points inside the warm-up stay `None`.
    pub fn apply_moving_average(&mut self, window: usize) {
        if window == 0 {
            return;
        }
        let values: Vec<f64> = self.points.iter().map(|p| p.value).collect();
        let mut running = 0.0;
        for (i, point) in self.points.iter_mut().enumerate() {
            running += values[i];
            if i + 1 >= window {
                if i + 1 > window {
                    running -= values[i - window];
                }
                point.ma = Some(running / window as f64);
            }
        }
    }
}
