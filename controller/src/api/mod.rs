pub mod instances;
pub mod nodes;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::instances::Instances;
use crate::types::HealthResponse;

pub struct AppState {
    pub instances: Instances,
}

/// Handler error: status plus a plain-text message
pub type ApiError = (StatusCode, String);

pub(crate) fn api_error(e: crate::error::Error) -> ApiError {
    (e.status_code(), e.to_string())
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health))
        // Lookups by node
        .route("/api/v1/nodes/:name/addresses", get(nodes::node_addresses))
        .route("/api/v1/nodes/:name/instance-id", get(nodes::instance_id))
        .route("/api/v1/nodes/:name/instance-type", get(nodes::instance_type))
        .route("/api/v1/nodes/exists", post(nodes::instance_exists))
        .route("/api/v1/nodes/shutdown", post(nodes::instance_shutdown))
        .route("/api/v1/nodes/metadata", post(nodes::instance_metadata))
        .route("/api/v1/hostnames/:hostname/node-name", get(nodes::current_node_name))
        // Lookups by provider ID
        .route("/api/v1/instances/addresses", get(instances::node_addresses))
        .route("/api/v1/instances/type", get(instances::instance_type))
        .route("/api/v1/instances/exists", get(instances::instance_exists))
        .route("/api/v1/instances/shutdown", get(instances::instance_shutdown))
        // Unsupported capabilities
        .route("/api/v1/ssh-keys", post(nodes::add_ssh_key))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /health - Health check endpoint
async fn health(State(state): State<Arc<AppState>>) -> (StatusCode, Json<HealthResponse>) {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok".to_string(),
            provider: state.instances.provider_name().to_string(),
            tracked_instances: state.instances.liveness().len(),
        }),
    )
}
