//! HTTP handlers for sale endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::sale::{CreateSaleInput, SaleFilter, SaleService, SaleWithItems};
use crate::AppState;
use shared::{PaginatedResponse, Sale};

/// Create a sale
pub async fn create_sale(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateSaleInput>,
) -> AppResult<Json<SaleWithItems>> {
    let service = SaleService::new(state.db, state.config.stock.clone());
    let sale = service.create_sale(current_user.0.user_id, input).await?;
    Ok(Json(sale))
}

/// Cancel a same-day sale
pub async fn cancel_sale(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(sale_id): Path<Uuid>,
) -> AppResult<Json<()>> {
    let service = SaleService::new(state.db, state.config.stock.clone());
    service.cancel_sale(sale_id).await?;
    Ok(Json(()))
}

/// Get a sale with its lines
pub async fn get_sale(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(sale_id): Path<Uuid>,
) -> AppResult<Json<SaleWithItems>> {
    let service = SaleService::new(state.db, state.config.stock.clone());
    let sale = service.get_sale(sale_id).await?;
    Ok(Json(sale))
}

/// List sales
pub async fn list_sales(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(filter): Query<SaleFilter>,
) -> AppResult<Json<PaginatedResponse<Sale>>> {
    let service = SaleService::new(state.db, state.config.stock.clone());
    let sales = service.list_sales(filter).await?;
    Ok(Json(sales))
}
