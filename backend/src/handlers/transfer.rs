//! HTTP handlers for transfer workflow endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::transfer::{
    CreateTransferInput, ItemQuantitiesInput, RejectTransferInput, TransferFilter,
    TransferService, TransferWithItems,
};
use crate::AppState;
use shared::Transfer;

/// Create a transfer request
pub async fn create_transfer(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateTransferInput>,
) -> AppResult<Json<TransferWithItems>> {
    let service = TransferService::new(state.db, state.config.stock.clone());
    let transfer = service
        .create_transfer(current_user.0.user_id, input)
        .await?;
    Ok(Json(transfer))
}

/// Approve a pending transfer
pub async fn approve_transfer(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(transfer_id): Path<Uuid>,
) -> AppResult<Json<TransferWithItems>> {
    let service = TransferService::new(state.db, state.config.stock.clone());
    let transfer = service
        .approve_transfer(current_user.0.user_id, transfer_id)
        .await?;
    Ok(Json(transfer))
}

/// Reject a pending transfer
pub async fn reject_transfer(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(transfer_id): Path<Uuid>,
    Json(input): Json<RejectTransferInput>,
) -> AppResult<Json<TransferWithItems>> {
    let service = TransferService::new(state.db, state.config.stock.clone());
    let transfer = service
        .reject_transfer(current_user.0.user_id, transfer_id, input)
        .await?;
    Ok(Json(transfer))
}

/// Send an approved transfer
pub async fn send_transfer(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(transfer_id): Path<Uuid>,
    Json(input): Json<ItemQuantitiesInput>,
) -> AppResult<Json<TransferWithItems>> {
    let service = TransferService::new(state.db, state.config.stock.clone());
    let transfer = service
        .send_transfer(current_user.0.user_id, transfer_id, input)
        .await?;
    Ok(Json(transfer))
}

/// Receive a sent transfer
pub async fn receive_transfer(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(transfer_id): Path<Uuid>,
    Json(input): Json<ItemQuantitiesInput>,
) -> AppResult<Json<TransferWithItems>> {
    let service = TransferService::new(state.db, state.config.stock.clone());
    let transfer = service
        .receive_transfer(current_user.0.user_id, transfer_id, input)
        .await?;
    Ok(Json(transfer))
}

/// Delete a pending transfer
pub async fn delete_transfer(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(transfer_id): Path<Uuid>,
) -> AppResult<Json<()>> {
    let service = TransferService::new(state.db, state.config.stock.clone());
    service.delete_transfer(transfer_id).await?;
    Ok(Json(()))
}

/// Get a transfer with its items
pub async fn get_transfer(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(transfer_id): Path<Uuid>,
) -> AppResult<Json<TransferWithItems>> {
    let service = TransferService::new(state.db, state.config.stock.clone());
    let transfer = service.get_transfer(transfer_id).await?;
    Ok(Json(transfer))
}

/// List transfers
pub async fn list_transfers(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(filter): Query<TransferFilter>,
) -> AppResult<Json<Vec<Transfer>>> {
    let service = TransferService::new(state.db, state.config.stock.clone());
    let transfers = service.list_transfers(filter).await?;
    Ok(Json(transfers))
}
