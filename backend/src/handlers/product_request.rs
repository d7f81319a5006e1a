//! HTTP handlers for product catalog request endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::product_request::{
    CreateProductRequestInput, ProductRequestFilter, ProductRequestService,
    RejectProductRequestInput,
};
use crate::AppState;
use shared::ProductRequest;

/// File a new product request
pub async fn create_request(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateProductRequestInput>,
) -> AppResult<Json<ProductRequest>> {
    let service = ProductRequestService::new(state.db);
    let request = service
        .create_request(current_user.0.user_id, input)
        .await?;
    Ok(Json(request))
}

/// Approve a pending request, creating the catalog product
pub async fn approve_request(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(request_id): Path<Uuid>,
) -> AppResult<Json<ProductRequest>> {
    let service = ProductRequestService::new(state.db);
    let request = service
        .approve_request(current_user.0.user_id, request_id)
        .await?;
    Ok(Json(request))
}

/// Reject a pending request
pub async fn reject_request(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(request_id): Path<Uuid>,
    Json(input): Json<RejectProductRequestInput>,
) -> AppResult<Json<ProductRequest>> {
    let service = ProductRequestService::new(state.db);
    let request = service
        .reject_request(current_user.0.user_id, request_id, input)
        .await?;
    Ok(Json(request))
}

/// Get a single request
pub async fn get_request(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(request_id): Path<Uuid>,
) -> AppResult<Json<ProductRequest>> {
    let service = ProductRequestService::new(state.db);
    let request = service.get_request(request_id).await?;
    Ok(Json(request))
}

/// List requests
pub async fn list_requests(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(filter): Query<ProductRequestFilter>,
) -> AppResult<Json<Vec<ProductRequest>>> {
    let service = ProductRequestService::new(state.db);
    let requests = service.list_requests(filter).await?;
    Ok(Json(requests))
}
