//! Product catalog request service
//!
//! Branch staff cannot add products directly; they file a request that
//! head office approves or rejects. Approval creates the catalog
//! product in the same transaction as the status change.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::{FromRow, PgPool};
use tracing::info;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use shared::{validate_unit_price, ProductRequest, RequestStatus};

/// Product catalog request service
#[derive(Clone)]
pub struct ProductRequestService {
    db: PgPool,
}

#[derive(Debug, FromRow)]
struct ProductRequestRow {
    id: Uuid,
    name: String,
    sku: String,
    category: Option<String>,
    unit_price: Decimal,
    status: String,
    requested_by: Uuid,
    requested_at: DateTime<Utc>,
    reviewed_by: Option<Uuid>,
    reviewed_at: Option<DateTime<Utc>>,
    rejection_reason: Option<String>,
    created_product_id: Option<Uuid>,
}

impl TryFrom<ProductRequestRow> for ProductRequest {
    type Error = AppError;

    fn try_from(row: ProductRequestRow) -> Result<Self, Self::Error> {
        let status = RequestStatus::parse(&row.status)
            .ok_or_else(|| AppError::Internal(format!("Unknown request status: {}", row.status)))?;
        Ok(ProductRequest {
            id: row.id,
            name: row.name,
            sku: row.sku,
            category: row.category,
            unit_price: row.unit_price,
            status,
            requested_by: row.requested_by,
            requested_at: row.requested_at,
            reviewed_by: row.reviewed_by,
            reviewed_at: row.reviewed_at,
            rejection_reason: row.rejection_reason,
            created_product_id: row.created_product_id,
        })
    }
}

/// Input for filing a product request
#[derive(Debug, Deserialize)]
pub struct CreateProductRequestInput {
    pub name: String,
    pub sku: String,
    pub category: Option<String>,
    pub unit_price: Decimal,
}

/// Input for rejecting a product request
#[derive(Debug, Deserialize)]
pub struct RejectProductRequestInput {
    pub reason: String,
}

/// Filter for request listings
#[derive(Debug, Default, Deserialize)]
pub struct ProductRequestFilter {
    pub status: Option<RequestStatus>,
}

impl ProductRequestService {
    /// Create a new ProductRequestService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// File a request for a new catalog product
    pub async fn create_request(
        &self,
        actor: Uuid,
        input: CreateProductRequestInput,
    ) -> AppResult<ProductRequest> {
        if input.name.trim().is_empty() {
            return Err(AppError::validation("name", "Product name is required"));
        }
        let sku = input.sku.trim().to_uppercase();
        if sku.is_empty() {
            return Err(AppError::validation("sku", "SKU is required"));
        }
        validate_unit_price(input.unit_price)
            .map_err(|msg| AppError::validation("unit_price", msg))?;

        // A SKU already in the catalog can never be requested again.
        // Pending duplicates are allowed; they fail at approval time.
        let sku_taken =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM products WHERE sku = $1)")
                .bind(&sku)
                .fetch_one(&self.db)
                .await?;
        if sku_taken {
            return Err(AppError::DuplicateEntry(format!(
                "SKU {} already exists in the catalog",
                sku
            )));
        }

        let row = sqlx::query_as::<_, ProductRequestRow>(
            r#"
            INSERT INTO product_requests (name, sku, category, unit_price, status, requested_by)
            VALUES ($1, $2, $3, $4, 'pending', $5)
            RETURNING id, name, sku, category, unit_price, status,
                      requested_by, requested_at, reviewed_by, reviewed_at,
                      rejection_reason, created_product_id
            "#,
        )
        .bind(input.name.trim())
        .bind(&sku)
        .bind(&input.category)
        .bind(input.unit_price)
        .bind(actor)
        .fetch_one(&self.db)
        .await?;

        row.try_into()
    }

    /// Approve a pending request, creating the catalog product
    pub async fn approve_request(&self, actor: Uuid, request_id: Uuid) -> AppResult<ProductRequest> {
        let mut tx = self.db.begin().await?;

        let request = sqlx::query_as::<_, ProductRequestRow>(
            r#"
            SELECT id, name, sku, category, unit_price, status,
                   requested_by, requested_at, reviewed_by, reviewed_at,
                   rejection_reason, created_product_id
            FROM product_requests
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(request_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Product request".to_string()))?;

        let status = RequestStatus::parse(&request.status).ok_or_else(|| {
            AppError::Internal(format!("Unknown request status: {}", request.status))
        })?;
        if !status.is_reviewable() {
            return Err(AppError::InvalidStateTransition(format!(
                "Request has already been {}",
                status.as_str()
            )));
        }

        // The unique index on products.sku backstops the check made at
        // filing time, in case another request with the same SKU was
        // approved in between.
        let sku_taken =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM products WHERE sku = $1)")
                .bind(&request.sku)
                .fetch_one(&mut *tx)
                .await?;
        if sku_taken {
            return Err(AppError::DuplicateEntry(format!(
                "SKU {} already exists in the catalog",
                request.sku
            )));
        }

        let product = sqlx::query_as::<_, (Uuid,)>(
            r#"
            INSERT INTO products (sku, name, category, unit_price)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(&request.sku)
        .bind(&request.name)
        .bind(&request.category)
        .bind(request.unit_price)
        .fetch_one(&mut *tx)
        .await?;

        let row = sqlx::query_as::<_, ProductRequestRow>(
            r#"
            UPDATE product_requests
            SET status = 'approved', reviewed_by = $2, reviewed_at = NOW(),
                created_product_id = $3
            WHERE id = $1
            RETURNING id, name, sku, category, unit_price, status,
                      requested_by, requested_at, reviewed_by, reviewed_at,
                      rejection_reason, created_product_id
            "#,
        )
        .bind(request_id)
        .bind(actor)
        .bind(product.0)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(request_id = %request_id, product_id = %product.0, "Approved product request");

        row.try_into()
    }

    /// Reject a pending request. Terminal.
    pub async fn reject_request(
        &self,
        actor: Uuid,
        request_id: Uuid,
        input: RejectProductRequestInput,
    ) -> AppResult<ProductRequest> {
        if input.reason.trim().is_empty() {
            return Err(AppError::validation(
                "reason",
                "A rejection reason is required",
            ));
        }

        let row = sqlx::query_as::<_, ProductRequestRow>(
            r#"
            UPDATE product_requests
            SET status = 'rejected', reviewed_by = $2, reviewed_at = NOW(),
                rejection_reason = $3
            WHERE id = $1 AND status = 'pending'
            RETURNING id, name, sku, category, unit_price, status,
                      requested_by, requested_at, reviewed_by, reviewed_at,
                      rejection_reason, created_product_id
            "#,
        )
        .bind(request_id)
        .bind(actor)
        .bind(input.reason.trim())
        .fetch_optional(&self.db)
        .await?;

        match row {
            Some(row) => row.try_into(),
            None => {
                let status = sqlx::query_scalar::<_, String>(
                    "SELECT status FROM product_requests WHERE id = $1",
                )
                .bind(request_id)
                .fetch_optional(&self.db)
                .await?;

                Err(match status {
                    None => AppError::NotFound("Product request".to_string()),
                    Some(status) => AppError::InvalidStateTransition(format!(
                        "Request has already been {}",
                        status
                    )),
                })
            }
        }
    }

    /// Get a single request
    pub async fn get_request(&self, request_id: Uuid) -> AppResult<ProductRequest> {
        sqlx::query_as::<_, ProductRequestRow>(
            r#"
            SELECT id, name, sku, category, unit_price, status,
                   requested_by, requested_at, reviewed_by, reviewed_at,
                   rejection_reason, created_product_id
            FROM product_requests
            WHERE id = $1
            "#,
        )
        .bind(request_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Product request".to_string()))?
        .try_into()
    }

    /// List requests, optionally by status, newest first
    pub async fn list_requests(
        &self,
        filter: ProductRequestFilter,
    ) -> AppResult<Vec<ProductRequest>> {
        let rows = sqlx::query_as::<_, ProductRequestRow>(
            r#"
            SELECT id, name, sku, category, unit_price, status,
                   requested_by, requested_at, reviewed_by, reviewed_at,
                   rejection_reason, created_product_id
            FROM product_requests
            WHERE ($1::text IS NULL OR status = $1)
            ORDER BY requested_at DESC
            "#,
        )
        .bind(filter.status.map(|s| s.as_str()))
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(ProductRequest::try_from).collect()
    }
}
