use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;
use tracing::info;

use super::{api_error, ApiError, AppState};
use crate::types::{
    AddSshKeyRequest, AddressesResponse, ExistsResponse, InstanceIdResponse, InstanceMetadata,
    InstanceTypeResponse, NodeIdentity, NodeNameResponse, ShutdownResponse,
};

/// GET /api/v1/nodes/:name/addresses - Addresses of the node's instance
pub async fn node_addresses(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<AddressesResponse>, ApiError> {
    let addresses = state
        .instances
        .node_addresses(&name)
        .await
        .map_err(api_error)?;

    Ok(Json(AddressesResponse { addresses }))
}

/// GET /api/v1/nodes/:name/instance-id - Instance ID of the node
pub async fn instance_id(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<InstanceIdResponse>, ApiError> {
    let instance_id = state.instances.instance_id(&name).await.map_err(api_error)?;

    Ok(Json(InstanceIdResponse { instance_id }))
}

/// GET /api/v1/nodes/:name/instance-type - Instance type of the node
pub async fn instance_type(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<InstanceTypeResponse>, ApiError> {
    let instance_type = state
        .instances
        .instance_type(&name)
        .await
        .map_err(api_error)?;

    Ok(Json(InstanceTypeResponse { instance_type }))
}

/// POST /api/v1/nodes/exists - Whether the node's instance still exists
pub async fn instance_exists(
    State(state): State<Arc<AppState>>,
    Json(node): Json<NodeIdentity>,
) -> Result<Json<ExistsResponse>, ApiError> {
    let exists = state
        .instances
        .instance_exists(&node)
        .await
        .map_err(api_error)?;

    Ok(Json(ExistsResponse { exists }))
}

/// POST /api/v1/nodes/shutdown - Whether the node's instance is powered off
pub async fn instance_shutdown(
    State(state): State<Arc<AppState>>,
    Json(node): Json<NodeIdentity>,
) -> Result<Json<ShutdownResponse>, ApiError> {
    let shutdown = state
        .instances
        .instance_shutdown(&node)
        .await
        .map_err(api_error)?;

    Ok(Json(ShutdownResponse { shutdown }))
}

/// POST /api/v1/nodes/metadata - Provider ID, type, region, addresses and labels
pub async fn instance_metadata(
    State(state): State<Arc<AppState>>,
    Json(node): Json<NodeIdentity>,
) -> Result<Json<InstanceMetadata>, ApiError> {
    let metadata = state
        .instances
        .instance_metadata(&node)
        .await
        .map_err(api_error)?;

    Ok(Json(metadata))
}

/// GET /api/v1/hostnames/:hostname/node-name - Node name for a hostname
pub async fn current_node_name(
    State(state): State<Arc<AppState>>,
    Path(hostname): Path<String>,
) -> Json<NodeNameResponse> {
    Json(NodeNameResponse {
        node_name: state.instances.current_node_name(&hostname),
    })
}

/// POST /api/v1/ssh-keys - Not supported by this provider
pub async fn add_ssh_key(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AddSshKeyRequest>,
) -> ApiError {
    info!("Rejecting SSH key injection for user {}", req.user);
    api_error(
        state
            .instances
            .add_ssh_key_to_all_instances(&req.user, req.key_data.as_bytes()),
    )
}
