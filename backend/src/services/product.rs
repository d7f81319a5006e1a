//! Product catalog service
//!
//! Head office creates products directly; branch staff go through the
//! product request workflow instead.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use shared::{validate_unit_price, Product};

/// Product catalog service
#[derive(Clone)]
pub struct ProductService {
    db: PgPool,
}

#[derive(Debug, FromRow)]
struct ProductRow {
    id: Uuid,
    sku: String,
    name: String,
    category: Option<String>,
    unit_price: Decimal,
    created_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            id: row.id,
            sku: row.sku,
            name: row.name,
            category: row.category,
            unit_price: row.unit_price,
            created_at: row.created_at,
        }
    }
}

/// Input for creating a product directly
#[derive(Debug, Deserialize)]
pub struct CreateProductInput {
    pub sku: String,
    pub name: String,
    pub category: Option<String>,
    pub unit_price: Decimal,
}

impl ProductService {
    /// Create a new ProductService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Add a product to the catalog
    pub async fn create_product(&self, input: CreateProductInput) -> AppResult<Product> {
        let sku = input.sku.trim().to_uppercase();
        if sku.is_empty() {
            return Err(AppError::validation("sku", "SKU is required"));
        }
        if input.name.trim().is_empty() {
            return Err(AppError::validation("name", "Product name is required"));
        }
        validate_unit_price(input.unit_price)
            .map_err(|msg| AppError::validation("unit_price", msg))?;

        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM products WHERE sku = $1)")
                .bind(&sku)
                .fetch_one(&self.db)
                .await?;
        if exists {
            return Err(AppError::DuplicateEntry(format!("SKU {} already exists", sku)));
        }

        let row = sqlx::query_as::<_, ProductRow>(
            r#"
            INSERT INTO products (sku, name, category, unit_price)
            VALUES ($1, $2, $3, $4)
            RETURNING id, sku, name, category, unit_price, created_at
            "#,
        )
        .bind(&sku)
        .bind(input.name.trim())
        .bind(&input.category)
        .bind(input.unit_price)
        .fetch_one(&self.db)
        .await?;

        Ok(row.into())
    }

    /// Get a product by id
    pub async fn get_product(&self, product_id: Uuid) -> AppResult<Product> {
        let row = sqlx::query_as::<_, ProductRow>(
            "SELECT id, sku, name, category, unit_price, created_at FROM products WHERE id = $1",
        )
        .bind(product_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

        Ok(row.into())
    }

    /// List products, optionally filtered by category, ordered by SKU
    pub async fn list_products(&self, category: Option<String>) -> AppResult<Vec<Product>> {
        let rows = sqlx::query_as::<_, ProductRow>(
            r#"
            SELECT id, sku, name, category, unit_price, created_at
            FROM products
            WHERE ($1::text IS NULL OR category = $1)
            ORDER BY sku
            "#,
        )
        .bind(category)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }
}
