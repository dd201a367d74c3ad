use axum::{
    extract::{Query, State},
    Json,
};
use std::sync::Arc;

use super::{api_error, ApiError, AppState};
use crate::types::{
    AddressesResponse, ExistsResponse, InstanceTypeResponse, ProviderIdQuery, ShutdownResponse,
};

/// GET /api/v1/instances/addresses?provider_id= - Addresses of an instance
pub async fn node_addresses(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ProviderIdQuery>,
) -> Result<Json<AddressesResponse>, ApiError> {
    let addresses = state
        .instances
        .node_addresses_by_provider_id(&query.provider_id)
        .await
        .map_err(api_error)?;

    Ok(Json(AddressesResponse { addresses }))
}

/// GET /api/v1/instances/type?provider_id= - Instance type
pub async fn instance_type(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ProviderIdQuery>,
) -> Result<Json<InstanceTypeResponse>, ApiError> {
    let instance_type = state
        .instances
        .instance_type_by_provider_id(&query.provider_id)
        .await
        .map_err(api_error)?;

    Ok(Json(InstanceTypeResponse { instance_type }))
}

/// GET /api/v1/instances/exists?provider_id= - Whether the instance still exists
pub async fn instance_exists(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ProviderIdQuery>,
) -> Result<Json<ExistsResponse>, ApiError> {
    let exists = state
        .instances
        .instance_exists_by_provider_id(&query.provider_id)
        .await
        .map_err(api_error)?;

    Ok(Json(ExistsResponse { exists }))
}

/// GET /api/v1/instances/shutdown?provider_id= - Whether the instance is powered off
pub async fn instance_shutdown(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ProviderIdQuery>,
) -> Result<Json<ShutdownResponse>, ApiError> {
    let shutdown = state
        .instances
        .instance_shutdown_by_provider_id(&query.provider_id)
        .await
        .map_err(api_error)?;

    Ok(Json(ShutdownResponse { shutdown }))
}
