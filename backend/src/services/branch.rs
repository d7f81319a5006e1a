//! Branch management service

use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use shared::{validate_branch_code, Branch};

/// Branch management service
#[derive(Clone)]
pub struct BranchService {
    db: PgPool,
}

#[derive(Debug, FromRow)]
struct BranchRow {
    id: Uuid,
    code: String,
    name: String,
    address: Option<String>,
    phone: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<BranchRow> for Branch {
    fn from(row: BranchRow) -> Self {
        Branch {
            id: row.id,
            code: row.code,
            name: row.name,
            address: row.address,
            phone: row.phone,
            created_at: row.created_at,
        }
    }
}

/// Input for creating a branch
#[derive(Debug, Deserialize)]
pub struct CreateBranchInput {
    pub code: String,
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
}

impl BranchService {
    /// Create a new BranchService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Register a branch. The code becomes part of every document
    /// number the branch issues and cannot change afterwards.
    pub async fn create_branch(&self, input: CreateBranchInput) -> AppResult<Branch> {
        let code = input.code.trim().to_uppercase();
        validate_branch_code(&code).map_err(|msg| AppError::validation("code", msg))?;
        if input.name.trim().is_empty() {
            return Err(AppError::validation("name", "Branch name is required"));
        }

        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM branches WHERE code = $1)")
                .bind(&code)
                .fetch_one(&self.db)
                .await?;
        if exists {
            return Err(AppError::DuplicateEntry(format!(
                "Branch code {} already exists",
                code
            )));
        }

        let row = sqlx::query_as::<_, BranchRow>(
            r#"
            INSERT INTO branches (code, name, address, phone)
            VALUES ($1, $2, $3, $4)
            RETURNING id, code, name, address, phone, created_at
            "#,
        )
        .bind(&code)
        .bind(input.name.trim())
        .bind(&input.address)
        .bind(&input.phone)
        .fetch_one(&self.db)
        .await?;

        Ok(row.into())
    }

    /// Get a branch by id
    pub async fn get_branch(&self, branch_id: Uuid) -> AppResult<Branch> {
        let row = sqlx::query_as::<_, BranchRow>(
            "SELECT id, code, name, address, phone, created_at FROM branches WHERE id = $1",
        )
        .bind(branch_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Branch".to_string()))?;

        Ok(row.into())
    }

    /// List all branches ordered by code
    pub async fn list_branches(&self) -> AppResult<Vec<Branch>> {
        let rows = sqlx::query_as::<_, BranchRow>(
            "SELECT id, code, name, address, phone, created_at FROM branches ORDER BY code",
        )
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }
}
