//! wellness-agg library interface
//!
//! Multi-source wellness metric aggregation: source catalog, validity
//! marker, catalog-driven fetchers and the concurrent merge engine, plus the
//! HTTP adapter used by the `wellness-agg` binary.

pub mod aggregation;
pub mod api;
pub mod catalog;
pub mod config;
pub mod error;
pub mod fetchers;
pub mod types;
pub mod validity;

pub use crate::aggregation::{AggregationEngine, EngineOptions};
pub use crate::catalog::{Catalog, SourceConfig};
pub use crate::error::{AggregationError, ApiError, ApiResult};
pub use crate::validity::ValidityMarker;

use axum::Router;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;
use wellness_common::config::DefaultsConfig;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Engine with every source registered; read-only once serving
    pub engine: Arc<AggregationEngine>,
    /// Catalog the engine was built from (admin view metadata)
    pub catalog: Arc<Catalog>,
    /// Request defaults for the admin view
    pub defaults: DefaultsConfig,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
    /// Last aggregation problem for diagnostic purposes
    pub last_error: Arc<RwLock<Option<String>>>,
}

impl AppState {
    pub fn new(engine: AggregationEngine, catalog: Catalog, defaults: DefaultsConfig) -> Self {
        Self {
            engine: Arc::new(engine),
            catalog: Arc::new(catalog),
            defaults,
            startup_time: Utc::now(),
            last_error: Arc::new(RwLock::new(None)),
        }
    }

    pub async fn record_error(&self, message: String) {
        *self.last_error.write().await = Some(message);
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::health_routes())
        .merge(api::aggregate_routes())
        .merge(api::source_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
