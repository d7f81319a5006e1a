//! Sale transaction service
//!
//! A sale is an atomic unit: invoice number, header, lines, and one OUT
//! ledger movement per line all commit together or not at all.
//! Cancellation is the exact inverse, restricted to the sale's own
//! calendar date, and leaves no residual movements behind.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::{FromRow, PgPool};
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::StockConfig;
use crate::error::{AppError, AppResult};
use crate::services::numbering::next_document_number;
use crate::services::stock::{apply_adjustment, reverse_movements, LedgerEntry, StockService};
use shared::{
    compute_sale_totals, line_subtotal, validate_discount, validate_quantity, DocumentKind,
    MovementDirection, PaginatedResponse, Pagination, PaginationMeta, PaymentMethod,
    ReferenceKind, Sale, SaleItem,
};

/// Sale transaction service
#[derive(Clone)]
pub struct SaleService {
    db: PgPool,
    policy: StockConfig,
}

#[derive(Debug, FromRow)]
struct SaleRow {
    id: Uuid,
    invoice_number: String,
    branch_id: Uuid,
    user_id: Uuid,
    sale_date: NaiveDate,
    customer_name: Option<String>,
    customer_phone: Option<String>,
    subtotal: Decimal,
    discount: Decimal,
    grand_total: Decimal,
    payment_method: String,
    notes: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<SaleRow> for Sale {
    type Error = AppError;

    fn try_from(row: SaleRow) -> Result<Self, Self::Error> {
        let payment_method = PaymentMethod::parse(&row.payment_method).ok_or_else(|| {
            AppError::Internal(format!("Unknown payment method: {}", row.payment_method))
        })?;
        Ok(Sale {
            id: row.id,
            invoice_number: row.invoice_number,
            branch_id: row.branch_id,
            user_id: row.user_id,
            sale_date: row.sale_date,
            customer_name: row.customer_name,
            customer_phone: row.customer_phone,
            subtotal: row.subtotal,
            discount: row.discount,
            grand_total: row.grand_total,
            payment_method,
            notes: row.notes,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct SaleItemRow {
    id: Uuid,
    sale_id: Uuid,
    product_id: Uuid,
    quantity: i64,
    unit_price: Decimal,
    subtotal: Decimal,
}

impl From<SaleItemRow> for SaleItem {
    fn from(row: SaleItemRow) -> Self {
        SaleItem {
            id: row.id,
            sale_id: row.sale_id,
            product_id: row.product_id,
            quantity: row.quantity,
            unit_price: row.unit_price,
            subtotal: row.subtotal,
        }
    }
}

/// One line of a new sale. When `unit_price` is absent the catalog
/// price applies.
#[derive(Debug, Deserialize)]
pub struct SaleItemInput {
    pub product_id: Uuid,
    pub quantity: i64,
    pub unit_price: Option<Decimal>,
}

/// Input for creating a sale
#[derive(Debug, Deserialize)]
pub struct CreateSaleInput {
    pub branch_id: Uuid,
    pub items: Vec<SaleItemInput>,
    #[serde(default)]
    pub discount: Option<Decimal>,
    pub payment_method: PaymentMethod,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub notes: Option<String>,
}

/// A sale with its lines
#[derive(Debug, Clone, serde::Serialize)]
pub struct SaleWithItems {
    #[serde(flatten)]
    pub sale: Sale,
    pub items: Vec<SaleItem>,
}

/// Filter for sale listings
#[derive(Debug, Default, Deserialize)]
pub struct SaleFilter {
    pub branch_id: Option<Uuid>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl SaleFilter {
    fn pagination(&self) -> Pagination {
        let defaults = Pagination::default();
        Pagination {
            page: self.page.unwrap_or(defaults.page).max(1),
            per_page: self.per_page.unwrap_or(defaults.per_page).clamp(1, 100),
        }
    }
}

impl SaleService {
    /// Create a new SaleService instance
    pub fn new(db: PgPool, policy: StockConfig) -> Self {
        Self { db, policy }
    }

    /// Create a sale, deducting stock atomically
    pub async fn create_sale(&self, actor: Uuid, input: CreateSaleInput) -> AppResult<SaleWithItems> {
        if input.items.is_empty() {
            return Err(AppError::validation(
                "items",
                "A sale requires at least one item",
            ));
        }

        let branch_code = sqlx::query_scalar::<_, String>("SELECT code FROM branches WHERE id = $1")
            .bind(input.branch_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Branch".to_string()))?;

        // Resolve each line against the catalog and check availability
        // before opening the transaction. The row lock inside
        // apply_adjustment re-checks under the transaction, so this is
        // only to fail early with a named product.
        let stock_service = StockService::new(self.db.clone(), self.policy.clone());
        let mut lines = Vec::with_capacity(input.items.len());
        for item in &input.items {
            validate_quantity(item.quantity)
                .map_err(|msg| AppError::validation("items", msg))?;

            let product = sqlx::query_as::<_, (String, Decimal)>(
                "SELECT name, unit_price FROM products WHERE id = $1",
            )
            .bind(item.product_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Product {}", item.product_id)))?;

            let (product_name, catalog_price) = product;
            let unit_price = item.unit_price.unwrap_or(catalog_price);
            if unit_price < Decimal::ZERO {
                return Err(AppError::validation(
                    "items",
                    "Unit price cannot be negative",
                ));
            }

            if !self.policy.allow_negative_stock
                && !stock_service
                    .is_available(input.branch_id, item.product_id, item.quantity)
                    .await?
            {
                let available = stock_service
                    .current_quantity(input.branch_id, item.product_id)
                    .await?;
                return Err(AppError::InsufficientStock(format!(
                    "Insufficient stock for {}: available {}, requested {}",
                    product_name, available, item.quantity
                )));
            }

            lines.push((item.product_id, item.quantity, unit_price));
        }

        let discount = input.discount.unwrap_or(Decimal::ZERO);
        let totals = compute_sale_totals(
            &lines
                .iter()
                .map(|(_, qty, price)| (*qty, *price))
                .collect::<Vec<_>>(),
            discount,
        );
        validate_discount(totals.subtotal, discount)
            .map_err(|msg| AppError::validation("discount", msg))?;

        let mut tx = self.db.begin().await?;

        let invoice_number = next_document_number(
            &mut tx,
            input.branch_id,
            &branch_code,
            DocumentKind::SaleInvoice,
        )
        .await?;

        let sale_date = Utc::now().date_naive();

        let header = sqlx::query_as::<_, SaleRow>(
            r#"
            INSERT INTO sales (invoice_number, branch_id, user_id, sale_date,
                               customer_name, customer_phone,
                               subtotal, discount, grand_total, payment_method, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING id, invoice_number, branch_id, user_id, sale_date,
                      customer_name, customer_phone,
                      subtotal, discount, grand_total, payment_method, notes, created_at
            "#,
        )
        .bind(&invoice_number)
        .bind(input.branch_id)
        .bind(actor)
        .bind(sale_date)
        .bind(&input.customer_name)
        .bind(&input.customer_phone)
        .bind(totals.subtotal)
        .bind(totals.discount)
        .bind(totals.grand_total)
        .bind(input.payment_method.as_str())
        .bind(&input.notes)
        .fetch_one(&mut *tx)
        .await?;

        let mut items = Vec::with_capacity(lines.len());
        for (product_id, quantity, unit_price) in &lines {
            let row = sqlx::query_as::<_, SaleItemRow>(
                r#"
                INSERT INTO sale_items (sale_id, product_id, quantity, unit_price, subtotal)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING id, sale_id, product_id, quantity, unit_price, subtotal
                "#,
            )
            .bind(header.id)
            .bind(product_id)
            .bind(quantity)
            .bind(unit_price)
            .bind(line_subtotal(*quantity, *unit_price))
            .fetch_one(&mut *tx)
            .await?;
            items.push(row.into());

            apply_adjustment(
                &mut tx,
                &self.policy,
                &LedgerEntry {
                    branch_id: input.branch_id,
                    product_id: *product_id,
                    quantity: *quantity,
                    direction: MovementDirection::Out,
                    reference_kind: ReferenceKind::Sale,
                    reference_id: Some(header.id),
                    notes: Some(format!("Sale {}", invoice_number)),
                    actor,
                },
            )
            .await?;
        }

        tx.commit().await?;

        info!(invoice_number = %invoice_number, branch_id = %input.branch_id, "Created sale");

        Ok(SaleWithItems {
            sale: header.try_into()?,
            items,
        })
    }

    /// Cancel a sale made today: restore the deducted stock, remove the
    /// sale's movements, and delete the sale. After commit the ledger
    /// holds no trace of the sale.
    ///
    /// The sale row is locked for the whole transaction, so of two
    /// concurrent cancels the second waits, finds the row gone, and
    /// reverses nothing.
    pub async fn cancel_sale(&self, sale_id: Uuid) -> AppResult<()> {
        let mut tx = self.db.begin().await?;

        let sale = sqlx::query_as::<_, SaleRow>(
            r#"
            SELECT id, invoice_number, branch_id, user_id, sale_date,
                   customer_name, customer_phone,
                   subtotal, discount, grand_total, payment_method, notes, created_at
            FROM sales
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(sale_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Sale".to_string()))?;

        let today = Utc::now().date_naive();
        if sale.sale_date != today {
            return Err(AppError::SaleNotCancelable(format!(
                "Sale {} is dated {} and can only be canceled on that day",
                sale.invoice_number, sale.sale_date
            )));
        }

        let reversed = reverse_movements(&mut tx, ReferenceKind::Sale, sale_id).await?;

        sqlx::query("DELETE FROM sale_items WHERE sale_id = $1")
            .bind(sale_id)
            .execute(&mut *tx)
            .await?;

        let deleted = sqlx::query("DELETE FROM sales WHERE id = $1")
            .bind(sale_id)
            .execute(&mut *tx)
            .await?;
        if deleted.rows_affected() == 0 {
            return Err(AppError::NotFound("Sale".to_string()));
        }

        tx.commit().await?;

        debug!(sale_id = %sale_id, movements_reversed = reversed, "Canceled sale");

        Ok(())
    }

    /// Get a sale with its lines
    pub async fn get_sale(&self, sale_id: Uuid) -> AppResult<SaleWithItems> {
        let row = sqlx::query_as::<_, SaleRow>(
            r#"
            SELECT id, invoice_number, branch_id, user_id, sale_date,
                   customer_name, customer_phone,
                   subtotal, discount, grand_total, payment_method, notes, created_at
            FROM sales
            WHERE id = $1
            "#,
        )
        .bind(sale_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Sale".to_string()))?;

        let items = sqlx::query_as::<_, SaleItemRow>(
            r#"
            SELECT id, sale_id, product_id, quantity, unit_price, subtotal
            FROM sale_items
            WHERE sale_id = $1
            ORDER BY id
            "#,
        )
        .bind(sale_id)
        .fetch_all(&self.db)
        .await?;

        Ok(SaleWithItems {
            sale: row.try_into()?,
            items: items.into_iter().map(|r| r.into()).collect(),
        })
    }

    /// List sales, optionally filtered by branch and date range, newest
    /// first, paginated
    pub async fn list_sales(&self, filter: SaleFilter) -> AppResult<PaginatedResponse<Sale>> {
        let pagination = filter.pagination();

        let total = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM sales
            WHERE ($1::uuid IS NULL OR branch_id = $1)
              AND ($2::date IS NULL OR sale_date >= $2)
              AND ($3::date IS NULL OR sale_date <= $3)
            "#,
        )
        .bind(filter.branch_id)
        .bind(filter.date_from)
        .bind(filter.date_to)
        .fetch_one(&self.db)
        .await?;

        let rows = sqlx::query_as::<_, SaleRow>(
            r#"
            SELECT id, invoice_number, branch_id, user_id, sale_date,
                   customer_name, customer_phone,
                   subtotal, discount, grand_total, payment_method, notes, created_at
            FROM sales
            WHERE ($1::uuid IS NULL OR branch_id = $1)
              AND ($2::date IS NULL OR sale_date >= $2)
              AND ($3::date IS NULL OR sale_date <= $3)
            ORDER BY created_at DESC
            LIMIT $4 OFFSET $5
            "#,
        )
        .bind(filter.branch_id)
        .bind(filter.date_from)
        .bind(filter.date_to)
        .bind(pagination.per_page as i64)
        .bind(pagination.offset() as i64)
        .fetch_all(&self.db)
        .await?;

        let data = rows
            .into_iter()
            .map(Sale::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(PaginatedResponse {
            data,
            pagination: PaginationMeta {
                page: pagination.page,
                per_page: pagination.per_page,
                total: total as u64,
            },
        })
    }
}
