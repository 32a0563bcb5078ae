//! Aggregation endpoint
//!
//! POST /api/aggregate with `{countries, metrics, year}`.

use axum::{extract::State, routing::post, Json, Router};
use tracing::warn;

use crate::error::ApiResult;
use crate::types::{AggregationRequest, AggregationResult};
use crate::AppState;

/// POST /api/aggregate
pub async fn aggregate(
    State(state): State<AppState>,
    Json(request): Json<AggregationRequest>,
) -> ApiResult<Json<AggregationResult>> {
    let result = match state.engine.aggregate_request(&request).await {
        Ok(result) => result,
        Err(e) => {
            warn!(error = %e, "Aggregation request rejected");
            return Err(e.into());
        }
    };

    if !result.metadata.degraded_sources.is_empty() {
        let degraded: Vec<&str> = result
            .metadata
            .degraded_sources
            .iter()
            .map(|d| d.source.as_str())
            .collect();
        state
            .record_error(format!("Degraded sources: {}", degraded.join(", ")))
            .await;
    }

    Ok(Json(result))
}

/// Build aggregation routes
pub fn aggregate_routes() -> Router<AppState> {
    Router::new().route("/api/aggregate", post(aggregate))
}
