//! Admin source status endpoint
//!
//! GET /api/sources?year=2023&countries=US,FI
//!
//! Aggregates every catalog metric for the given countries and reports, per
//! registered source, its display name, categories and coverage ratio.
//! Omitted parameters fall back to the `[defaults]` config section.

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::aggregation::{source_status, SourceStatus};
use crate::error::{ApiError, ApiResult};
use crate::types::CountryId;
use crate::AppState;

/// Query parameters for GET /api/sources
#[derive(Debug, Default, Deserialize)]
pub struct SourcesQuery {
    pub year: Option<i32>,
    /// Comma-separated country ids
    pub countries: Option<String>,
}

/// GET /api/sources
pub async fn list_sources(
    State(state): State<AppState>,
    Query(query): Query<SourcesQuery>,
) -> ApiResult<Json<Vec<SourceStatus>>> {
    let year = query.year.unwrap_or(state.defaults.year);
    let countries: Vec<CountryId> = match query.countries.as_deref() {
        Some(list) => list
            .split(',')
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .collect(),
        None => state.defaults.countries.clone(),
    };

    if countries.is_empty() {
        return Err(ApiError::BadRequest("countries must not be empty".to_string()));
    }

    let metrics = state.catalog.metric_names();
    let result = state.engine.aggregate(&countries, &metrics, year).await?;

    Ok(Json(source_status(&result, &state.catalog)))
}

/// Build source status routes
pub fn source_routes() -> Router<AppState> {
    Router::new().route("/api/sources", get(list_sources))
}
