//! # HTTP Server
//!
//! Axum server exposing the inbound admission API (enter/leave) and the
//! read-only administrative API (capacity, per-resource counts, metrics
//! snapshot, cluster status).

pub mod admin_routes;
pub mod admission_routes;
pub mod config;
pub mod server;

pub use config::HttpServerConfig;
pub use server::{AppState, HttpServer};
