//! HTTP server assembly.

use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

use crate::admission::{AdmissionGate, AdmissionStore};
use crate::capacity::{CapacityCalculator, ReplicaDiscovery};
use crate::cluster::{Partitioner, ReplicaLoadTracker};
use crate::metrics::MetricsAggregator;
use crate::observability::Logger;

use super::admin_routes::{admin_routes, health_routes};
use super::admission_routes::admission_routes;
use super::config::HttpServerConfig;

/// Shared handles every route uses.
pub struct AppState {
    pub gate: Arc<AdmissionGate>,
    pub admission: Arc<AdmissionStore>,
    pub calculator: Arc<CapacityCalculator>,
    pub aggregator: Arc<MetricsAggregator>,
    pub tracker: Arc<ReplicaLoadTracker>,
    pub partitioner: Arc<Partitioner>,
}

impl AppState {
    pub async fn discovery_available(&self) -> bool {
        self.tracker.is_available().await
    }
}

/// Combined HTTP server for the admission and admin APIs.
pub struct HttpServer {
    config: HttpServerConfig,
    router: Router,
}

impl HttpServer {
    pub fn new(config: HttpServerConfig, state: Arc<AppState>) -> Self {
        let router = Self::build_router(&config, state);
        Self { config, router }
    }

    fn build_router(config: &HttpServerConfig, state: Arc<AppState>) -> Router {
        let cors = if config.cors_origins.is_empty() {
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        } else {
            use tower_http::cors::AllowOrigin;
            let origins: Vec<_> = config
                .cors_origins
                .iter()
                .filter_map(|origin| origin.parse().ok())
                .collect();
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(origins))
                .allow_methods(Any)
                .allow_headers(Any)
        };

        Router::new()
            .merge(health_routes())
            .nest("/admission", admission_routes(state.clone()))
            .nest("/admin", admin_routes(state))
            .layer(cors)
    }

    /// Serve until the listener errors or the process shuts down.
    pub async fn run(self) -> std::io::Result<()> {
        let addr = self.config.socket_addr();
        let listener = TcpListener::bind(&addr).await?;
        Logger::info("http.listening", &[("addr", addr.as_str())]);
        axum::serve(listener, self.router).await
    }

    /// The assembled router, for in-process tests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }
}
