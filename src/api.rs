//! JSON API for the dashboard front end
//!
//! One route per dataset. A dataset that is fully unavailable answers 503
//! with its reason; the other dataset keeps serving, so the page degrades
//! per section instead of failing whole.

use axum::{extract::State, http::StatusCode, response::Json, routing::get, Router};
use serde::Serialize;
use tracing::error;

use crate::datasets::{self, DatasetError, SeriesPoint, SeriesTable};
use crate::sanitize::to_finite;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct VixResponse {
    pub points: Vec<SeriesPoint>,
    pub provenance: datasets::Provenance,
    /// Latest close, sanitized for display.
    pub current: Option<f64>,
    /// Latest 20-day moving average, sanitized for display.
    pub ma20: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct GexResponse {
    pub points: Vec<SeriesPoint>,
    pub provenance: datasets::Provenance,
    /// True when the bundled sample served this response.
    pub sampled: bool,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/vix", get(get_vix))
        .route("/api/gex", get(get_gex))
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn get_vix(
    State(state): State<AppState>,
) -> Result<Json<VixResponse>, (StatusCode, Json<ErrorResponse>)> {
    let spec = datasets::vix_spec(&state.config);
    let table = state
        .cache
        .get_or_fetch(spec.name, spec.ttl_secs, || {
            datasets::fetch_series(&state.http, &spec)
        })
        .await
        .map_err(unavailable)?;

    let current = table.last().map(|p| p.value).and_then(to_finite);
    let ma20 = table.last().and_then(|p| p.ma).and_then(to_finite);

    Ok(Json(VixResponse {
        provenance: table.provenance.clone(),
        points: table.points,
        current,
        ma20,
    }))
}

async fn get_gex(
    State(state): State<AppState>,
) -> Result<Json<GexResponse>, (StatusCode, Json<ErrorResponse>)> {
    let spec = datasets::gex_spec(&state.config);
    let table: SeriesTable = state
        .cache
        .get_or_fetch(spec.name, spec.ttl_secs, || {
            datasets::fetch_series(&state.http, &spec)
        })
        .await
        .map_err(unavailable)?;

    Ok(Json(GexResponse {
        sampled: table.provenance.is_sample(),
        provenance: table.provenance.clone(),
        points: table.points,
    }))
}

fn unavailable(err: DatasetError) -> (StatusCode, Json<ErrorResponse>) {
    error!(error = %err, "dataset unavailable");
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
}
