//! HTTP handlers for branch endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::branch::{BranchService, CreateBranchInput};
use crate::AppState;
use shared::Branch;

/// Register a branch
pub async fn create_branch(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Json(input): Json<CreateBranchInput>,
) -> AppResult<Json<Branch>> {
    let service = BranchService::new(state.db);
    let branch = service.create_branch(input).await?;
    Ok(Json(branch))
}

/// Get a branch by id
pub async fn get_branch(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(branch_id): Path<Uuid>,
) -> AppResult<Json<Branch>> {
    let service = BranchService::new(state.db);
    let branch = service.get_branch(branch_id).await?;
    Ok(Json(branch))
}

/// List all branches
pub async fn list_branches(
    State(state): State<AppState>,
    _current_user: CurrentUser,
) -> AppResult<Json<Vec<Branch>>> {
    let service = BranchService::new(state.db);
    let branches = service.list_branches().await?;
    Ok(Json(branches))
}
