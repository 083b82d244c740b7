//! Value sanitizing for display
//!
//! The dashboard formats the most recent observation of each series into a
//! metric widget. Column access can hand back a bare number, a one-element
//! column slice, raw text, or nothing at all; everything funnels through
//! `to_finite` so the formatting layer only ever sees `Option<f64>`.

/// A scalar-ish value as it comes off a series column.
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarLike {
    Missing,
    Value(f64),
    Text(String),
    /// A column slice; only the first element is meaningful.
    Column(Vec<f64>),
}

impl From<f64> for ScalarLike {
    fn from(v: f64) -> Self {
        ScalarLike::Value(v)
    }
}

impl From<Option<f64>> for ScalarLike {
    fn from(v: Option<f64>) -> Self {
        match v {
            Some(v) => ScalarLike::Value(v),
            None => ScalarLike::Missing,
        }
    }
}

impl From<&str> for ScalarLike {
    fn from(s: &str) -> Self {
        ScalarLike::Text(s.to_string())
    }
}

impl From<Vec<f64>> for ScalarLike {
    fn from(v: Vec<f64>) -> Self {
        ScalarLike::Column(v)
    }
}

/// Collapse a scalar-like value to a finite float, or `None`.
///
/// NaN, infinities, empty columns, and unparseable text all map to `None`;
/// no conversion failure escapes as an error.
pub fn to_finite(value: impl Into<ScalarLike>) -> Option<f64> {
    let out = match value.into() {
        ScalarLike::Missing => return None,
        ScalarLike::Value(v) => v,
        ScalarLike::Text(s) => s.trim().parse::<f64>().ok()?,
        ScalarLike::Column(col) => *col.first()?,
    };
    out.is_finite().then_some(out)
}
