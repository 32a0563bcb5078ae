//! HTTP API handlers for wellness-agg

pub mod aggregate;
pub mod health;
pub mod sources;

pub use aggregate::aggregate_routes;
pub use health::health_routes;
pub use sources::source_routes;
