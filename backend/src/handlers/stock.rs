//! HTTP handlers for stock ledger endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::CurrentUser;
use crate::services::stock::{AdjustStockInput, StockAdjustment, StockLevel, StockService};
use crate::AppState;
use shared::{BranchStock, StockMovement};

/// Record a manual stock adjustment
pub async fn record_adjustment(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<AdjustStockInput>,
) -> AppResult<Json<StockAdjustment>> {
    let service = StockService::new(state.db, state.config.stock.clone());
    let adjustment = service
        .record_adjustment(current_user.0.user_id, input)
        .await?;
    Ok(Json(adjustment))
}

/// Get all stock levels for a branch
pub async fn get_branch_stocks(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(branch_id): Path<Uuid>,
) -> AppResult<Json<Vec<StockLevel>>> {
    let service = StockService::new(state.db, state.config.stock.clone());
    let stocks = service.get_branch_stocks(branch_id).await?;
    Ok(Json(stocks))
}

/// Get a single branch-product stock row
pub async fn get_branch_stock(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path((branch_id, product_id)): Path<(Uuid, Uuid)>,
) -> AppResult<Json<BranchStock>> {
    let service = StockService::new(state.db, state.config.stock.clone());
    let stock = service
        .get_branch_stock(branch_id, product_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Branch stock".to_string()))?;
    Ok(Json(stock))
}

/// Get the movement history for a branch-product pair
pub async fn get_movements(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path((branch_id, product_id)): Path<(Uuid, Uuid)>,
) -> AppResult<Json<Vec<StockMovement>>> {
    let service = StockService::new(state.db, state.config.stock.clone());
    let movements = service.get_movements(branch_id, product_id).await?;
    Ok(Json(movements))
}

#[derive(Debug, Deserialize)]
pub struct LowStockQuery {
    pub branch_id: Option<Uuid>,
}

/// List stock rows below their minimum level
pub async fn get_low_stock(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(query): Query<LowStockQuery>,
) -> AppResult<Json<Vec<StockLevel>>> {
    let service = StockService::new(state.db, state.config.stock.clone());
    let stocks = service.get_low_stock(query.branch_id).await?;
    Ok(Json(stocks))
}

#[derive(Debug, Deserialize)]
pub struct SetMinStockInput {
    pub min_stock: i64,
}

/// Set the minimum stock level for a branch-product pair
pub async fn set_min_stock(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path((branch_id, product_id)): Path<(Uuid, Uuid)>,
    Json(input): Json<SetMinStockInput>,
) -> AppResult<Json<BranchStock>> {
    let service = StockService::new(state.db, state.config.stock.clone());
    let stock = service
        .set_min_stock(branch_id, product_id, input.min_stock)
        .await?;
    Ok(Json(stock))
}
