//! Route definitions and router setup
//!
//! Configures all API routes and middleware.

mod analysis;
mod domain;
mod policy;

use crate::config::Settings;
use crate::state::SharedState;
use axum::{
    http::{header, Method},
    routing::{get, post},
    Router,
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    request_id::MakeRequestUuid,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
    ServiceBuilderExt,
};
use tracing::Level;

/// Create the application router with all routes and middleware
pub fn create_router(state: SharedState, settings: &Settings) -> Router {
    let cors = build_cors_layer(settings);

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_request(DefaultOnRequest::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    let middleware = ServiceBuilder::new()
        .set_x_request_id(MakeRequestUuid)
        .layer(trace_layer)
        .layer(CompressionLayer::new())
        .layer(cors)
        .propagate_x_request_id();

    Router::new()
        // Health check
        .route("/health", get(health_check))

        // Catalog and domain routes
        .route("/api/transforms", get(domain::list_transforms))
        .route("/api/domains", get(domain::list_domains))
        .route("/api/domains/{name}", get(domain::get_domain))
        .route("/api/domains/{name}/transforms", get(domain::domain_transforms))
        .route("/api/domains/{name}/check", post(domain::check_transform))

        // Policy routes
        .route("/api/policies", post(policy::commit_policy).get(policy::list_policies))
        .route("/api/policies/enforce", post(policy::enforce_policy))
        .route("/api/policies/validate", post(policy::validate_policy))
        .route("/api/policies/export", post(policy::export_policy))
        .route("/api/policies/import", post(policy::import_policy))
        .route("/api/policies/{name}/history", get(policy::policy_history))
        .route("/api/policies/{name}/diff", get(policy::diff_versions))
        .route("/api/diff", post(policy::diff_policies))

        // Analysis routes
        .route("/api/ablation", post(analysis::run_ablation))
        .route("/api/curriculum", post(analysis::build_curriculum))
        .route("/api/shift", post(analysis::simulate_shift))
        .route("/api/shift/types", get(analysis::list_shift_types))

        // Apply middleware and state
        .layer(middleware)
        .with_state(state)
}

/// Build CORS layer from settings
fn build_cors_layer(settings: &Settings) -> CorsLayer {
    let origins: Vec<_> = settings
        .cors
        .allowed_origins
        .iter()
        .filter_map(|s| s.parse().ok())
        .collect();

    let layer = if origins.is_empty() {
        CorsLayer::new().allow_origin(Any)
    } else {
        CorsLayer::new().allow_origin(origins)
    };
    layer
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .max_age(Duration::from_secs(3600))
}

/// Health check endpoint
async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "success": true,
        "message": "Server is running fine.",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION")
    }))
}
