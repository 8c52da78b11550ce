//! Read-only administrative routes.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::admission::Resource;
use crate::cluster::ReplicaRecord;

use super::server::AppState;

/// Current capacity configuration and live computation inputs.
#[derive(Debug, Serialize)]
pub struct CapacityResponse {
    pub base_units_per_replica: u64,
    pub max_global_limit: u64,
    pub dynamic_scaling_enabled: bool,
    pub fallback_replica_count: u32,
    pub live_replica_count: u32,
    pub discovery_available: bool,
    pub current_max_active: u64,
}

/// Per-resource occupancy.
#[derive(Debug, Serialize)]
pub struct ResourceCountsResponse {
    pub resource_type: String,
    pub resource_id: String,
    pub active_count: u64,
    pub waiting_count: u64,
}

/// Partitioning and replica status.
#[derive(Debug, Serialize)]
pub struct ClusterResponse {
    pub replica_id: String,
    pub strategy: &'static str,
    pub replicas: Vec<ReplicaRecord>,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// Build the admin router. Every endpoint is read-only.
pub fn admin_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/capacity", get(capacity_handler))
        .route(
            "/resources/:resource_type/:resource_id",
            get(resource_handler),
        )
        .route("/metrics", get(metrics_handler))
        .route("/cluster", get(cluster_handler))
        .with_state(state)
}

/// Health route, mounted at the server root.
pub fn health_routes() -> Router {
    Router::new().route("/health", get(health_handler))
}

async fn health_handler() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok",
            version: env!("CARGO_PKG_VERSION"),
        }),
    )
}

async fn capacity_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let config = state.calculator.config();
    let live = state.calculator.effective_replica_count().await;
    let response = CapacityResponse {
        base_units_per_replica: config.base_units_per_replica,
        max_global_limit: config.max_global_limit,
        dynamic_scaling_enabled: config.dynamic_scaling_enabled,
        fallback_replica_count: config.fallback_replica_count,
        live_replica_count: live,
        discovery_available: state.discovery_available().await,
        current_max_active: state.calculator.max_active().await,
    };
    (StatusCode::OK, Json(response))
}

async fn resource_handler(
    State(state): State<Arc<AppState>>,
    Path((resource_type, resource_id)): Path<(String, String)>,
) -> impl IntoResponse {
    let resource = Resource::new(resource_type.clone(), resource_id.clone());
    let active_count = state.admission.active_size(&resource).await.unwrap_or(0);
    let waiting_count = state.admission.queue_len(&resource).await.unwrap_or(0);
    (
        StatusCode::OK,
        Json(ResourceCountsResponse {
            resource_type,
            resource_id,
            active_count,
            waiting_count,
        }),
    )
}

async fn metrics_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    (StatusCode::OK, Json(state.aggregator.snapshot()))
}

async fn cluster_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let replicas = state.tracker.live_replicas().await.unwrap_or_default();
    (
        StatusCode::OK,
        Json(ClusterResponse {
            replica_id: state.tracker.replica_id().to_string(),
            strategy: state.partitioner.strategy().as_str(),
            replicas,
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_response_serialization() {
        let json = serde_json::to_value(HealthResponse {
            status: "ok",
            version: "0.1.0",
        })
        .unwrap();
        assert_eq!(json["status"], "ok");
    }
}
