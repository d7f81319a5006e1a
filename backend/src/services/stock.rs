//! Stock ledger service
//!
//! The single choke point for all quantity mutation. Every change to a
//! branch's on-hand quantity goes through [`apply_adjustment`], which
//! locks the stock row, captures before/after snapshots, and appends a
//! movement record in the same transaction. The sale and transfer
//! services compose it inside their own transactions; the service
//! methods below wrap it for standalone adjustments and expose the
//! derived reads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use tracing::debug;
use uuid::Uuid;

use crate::config::StockConfig;
use crate::error::{AppError, AppResult};
use shared::{validate_quantity, BranchStock, MovementDirection, ReferenceKind, StockMovement};

/// Stock ledger service
#[derive(Clone)]
pub struct StockService {
    db: PgPool,
    policy: StockConfig,
}

/// Database row for a stock movement
#[derive(Debug, FromRow)]
struct MovementRow {
    id: Uuid,
    branch_id: Uuid,
    product_id: Uuid,
    direction: String,
    quantity: i64,
    stock_before: i64,
    stock_after: i64,
    reference_kind: String,
    reference_id: Option<Uuid>,
    notes: Option<String>,
    created_by: Uuid,
    created_at: DateTime<Utc>,
}

impl TryFrom<MovementRow> for StockMovement {
    type Error = AppError;

    fn try_from(row: MovementRow) -> Result<Self, Self::Error> {
        let direction = MovementDirection::parse(&row.direction)
            .ok_or_else(|| AppError::Internal(format!("Unknown direction: {}", row.direction)))?;
        let reference_kind = ReferenceKind::parse(&row.reference_kind).ok_or_else(|| {
            AppError::Internal(format!("Unknown reference kind: {}", row.reference_kind))
        })?;
        Ok(StockMovement {
            id: row.id,
            branch_id: row.branch_id,
            product_id: row.product_id,
            direction,
            quantity: row.quantity,
            stock_before: row.stock_before,
            stock_after: row.stock_after,
            reference_kind,
            reference_id: row.reference_id,
            notes: row.notes,
            created_by: row.created_by,
            created_at: row.created_at,
        })
    }
}

/// Database row for a branch stock level
#[derive(Debug, FromRow)]
struct BranchStockRow {
    id: Uuid,
    branch_id: Uuid,
    product_id: Uuid,
    quantity: i64,
    min_stock: i64,
    updated_at: DateTime<Utc>,
}

impl From<BranchStockRow> for BranchStock {
    fn from(row: BranchStockRow) -> Self {
        BranchStock {
            id: row.id,
            branch_id: row.branch_id,
            product_id: row.product_id,
            quantity: row.quantity,
            min_stock: row.min_stock,
            updated_at: row.updated_at,
        }
    }
}

/// One ledger entry to apply
#[derive(Debug, Clone)]
pub(crate) struct LedgerEntry {
    pub branch_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i64,
    pub direction: MovementDirection,
    pub reference_kind: ReferenceKind,
    pub reference_id: Option<Uuid>,
    pub notes: Option<String>,
    pub actor: Uuid,
}

/// Input for a manual stock adjustment
#[derive(Debug, Deserialize)]
pub struct AdjustStockInput {
    pub branch_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i64,
    pub direction: MovementDirection,
    pub reference_kind: ReferenceKind,
    pub notes: Option<String>,
}

/// Result of a stock adjustment
#[derive(Debug, Clone, Serialize)]
pub struct StockAdjustment {
    pub new_quantity: i64,
    pub movement: StockMovement,
}

/// A stock level with its product identity, for branch stock listings
#[derive(Debug, Clone, Serialize)]
pub struct StockLevel {
    pub branch_id: Uuid,
    pub product_id: Uuid,
    pub sku: String,
    pub product_name: String,
    pub quantity: i64,
    pub min_stock: i64,
}

/// Row for stock level queries
#[derive(Debug, FromRow)]
struct StockLevelRow {
    branch_id: Uuid,
    product_id: Uuid,
    sku: String,
    product_name: String,
    quantity: i64,
    min_stock: i64,
}

impl From<StockLevelRow> for StockLevel {
    fn from(row: StockLevelRow) -> Self {
        StockLevel {
            branch_id: row.branch_id,
            product_id: row.product_id,
            sku: row.sku,
            product_name: row.product_name,
            quantity: row.quantity,
            min_stock: row.min_stock,
        }
    }
}

impl StockService {
    /// Create a new StockService instance
    pub fn new(db: PgPool, policy: StockConfig) -> Self {
        Self { db, policy }
    }

    /// Record a manual stock adjustment (initial stocking or correction).
    ///
    /// Sale and transfer movements are written by their own services;
    /// this entry point only accepts the manual reference kinds.
    pub async fn record_adjustment(
        &self,
        actor: Uuid,
        input: AdjustStockInput,
    ) -> AppResult<StockAdjustment> {
        if !matches!(
            input.reference_kind,
            ReferenceKind::Adjustment | ReferenceKind::Initial
        ) {
            return Err(AppError::validation(
                "reference_kind",
                "Manual adjustments must use the adjustment or initial kind",
            ));
        }

        let mut tx = self.db.begin().await?;

        let movement = apply_adjustment(
            &mut tx,
            &self.policy,
            &LedgerEntry {
                branch_id: input.branch_id,
                product_id: input.product_id,
                quantity: input.quantity,
                direction: input.direction,
                reference_kind: input.reference_kind,
                reference_id: None,
                notes: input.notes,
                actor,
            },
        )
        .await?;

        tx.commit().await?;

        Ok(StockAdjustment {
            new_quantity: movement.stock_after,
            movement,
        })
    }

    /// Current on-hand quantity, 0 when no stock row exists yet
    pub async fn current_quantity(&self, branch_id: Uuid, product_id: Uuid) -> AppResult<i64> {
        let quantity = sqlx::query_scalar::<_, Option<i64>>(
            "SELECT quantity FROM branch_stocks WHERE branch_id = $1 AND product_id = $2",
        )
        .bind(branch_id)
        .bind(product_id)
        .fetch_optional(&self.db)
        .await?
        .flatten();

        Ok(quantity.unwrap_or(0))
    }

    /// Whether a branch can currently satisfy `requested` units
    pub async fn is_available(
        &self,
        branch_id: Uuid,
        product_id: Uuid,
        requested: i64,
    ) -> AppResult<bool> {
        Ok(self.current_quantity(branch_id, product_id).await? >= requested)
    }

    /// All stock levels at a branch
    pub async fn get_branch_stocks(&self, branch_id: Uuid) -> AppResult<Vec<StockLevel>> {
        self.ensure_branch_exists(branch_id).await?;

        let rows = sqlx::query_as::<_, StockLevelRow>(
            r#"
            SELECT bs.branch_id, bs.product_id, p.sku, p.name AS product_name,
                   bs.quantity, bs.min_stock
            FROM branch_stocks bs
            JOIN products p ON p.id = bs.product_id
            WHERE bs.branch_id = $1
            ORDER BY p.name
            "#,
        )
        .bind(branch_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    /// Stock rows below their min_stock threshold, consumed by the
    /// external low-stock notifier
    pub async fn get_low_stock(&self, branch_id: Option<Uuid>) -> AppResult<Vec<StockLevel>> {
        let rows = sqlx::query_as::<_, StockLevelRow>(
            r#"
            SELECT bs.branch_id, bs.product_id, p.sku, p.name AS product_name,
                   bs.quantity, bs.min_stock
            FROM branch_stocks bs
            JOIN products p ON p.id = bs.product_id
            WHERE bs.quantity < bs.min_stock
              AND ($1::uuid IS NULL OR bs.branch_id = $1)
            ORDER BY bs.quantity - bs.min_stock
            "#,
        )
        .bind(branch_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    /// The stock row for one (branch, product) pair, if any
    pub async fn get_branch_stock(
        &self,
        branch_id: Uuid,
        product_id: Uuid,
    ) -> AppResult<Option<BranchStock>> {
        let row = sqlx::query_as::<_, BranchStockRow>(
            r#"
            SELECT id, branch_id, product_id, quantity, min_stock, updated_at
            FROM branch_stocks
            WHERE branch_id = $1 AND product_id = $2
            "#,
        )
        .bind(branch_id)
        .bind(product_id)
        .fetch_optional(&self.db)
        .await?;

        Ok(row.map(|r| r.into()))
    }

    /// Movement history for a (branch, product) pair, oldest first, so
    /// that consecutive snapshots chain
    pub async fn get_movements(
        &self,
        branch_id: Uuid,
        product_id: Uuid,
    ) -> AppResult<Vec<StockMovement>> {
        let rows = sqlx::query_as::<_, MovementRow>(
            r#"
            SELECT id, branch_id, product_id, direction, quantity, stock_before, stock_after,
                   reference_kind, reference_id, notes, created_by, created_at
            FROM stock_movements
            WHERE branch_id = $1 AND product_id = $2
            ORDER BY created_at, id
            "#,
        )
        .bind(branch_id)
        .bind(product_id)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(StockMovement::try_from).collect()
    }

    /// Set the low-stock threshold for a (branch, product) pair,
    /// creating the stock row at quantity 0 when absent
    pub async fn set_min_stock(
        &self,
        branch_id: Uuid,
        product_id: Uuid,
        min_stock: i64,
    ) -> AppResult<BranchStock> {
        if min_stock < 0 {
            return Err(AppError::validation(
                "min_stock",
                "Minimum stock cannot be negative",
            ));
        }

        self.ensure_branch_exists(branch_id).await?;
        self.ensure_product_exists(product_id).await?;

        let row = sqlx::query_as::<_, BranchStockRow>(
            r#"
            INSERT INTO branch_stocks (branch_id, product_id, quantity, min_stock)
            VALUES ($1, $2, 0, $3)
            ON CONFLICT (branch_id, product_id)
            DO UPDATE SET min_stock = $3, updated_at = NOW()
            RETURNING id, branch_id, product_id, quantity, min_stock, updated_at
            "#,
        )
        .bind(branch_id)
        .bind(product_id)
        .bind(min_stock)
        .fetch_one(&self.db)
        .await?;

        Ok(row.into())
    }

    async fn ensure_branch_exists(&self, branch_id: Uuid) -> AppResult<()> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM branches WHERE id = $1)")
                .bind(branch_id)
                .fetch_one(&self.db)
                .await?;
        if !exists {
            return Err(AppError::NotFound("Branch".to_string()));
        }
        Ok(())
    }

    async fn ensure_product_exists(&self, product_id: Uuid) -> AppResult<()> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM products WHERE id = $1)")
                .bind(product_id)
                .fetch_one(&self.db)
                .await?;
        if !exists {
            return Err(AppError::NotFound("Product".to_string()));
        }
        Ok(())
    }
}

/// Apply one ledger entry inside the caller's transaction.
///
/// Locks (or lazily creates) the branch stock row, captures the
/// before/after snapshots, enforces the non-negativity policy, persists
/// the new quantity, and appends the movement record. Either both
/// writes commit with the caller's transaction or neither does.
///
/// The `FOR UPDATE` row lock serializes concurrent adjustments to the
/// same (branch, product), so two writers can never capture the same
/// `stock_before` snapshot.
pub(crate) async fn apply_adjustment(
    tx: &mut Transaction<'_, Postgres>,
    policy: &StockConfig,
    entry: &LedgerEntry,
) -> AppResult<StockMovement> {
    validate_quantity(entry.quantity).map_err(|msg| AppError::validation("quantity", msg))?;

    let branch_exists =
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM branches WHERE id = $1)")
            .bind(entry.branch_id)
            .fetch_one(&mut **tx)
            .await?;
    if !branch_exists {
        return Err(AppError::NotFound("Branch".to_string()));
    }

    let product_exists =
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM products WHERE id = $1)")
            .bind(entry.product_id)
            .fetch_one(&mut **tx)
            .await?;
    if !product_exists {
        return Err(AppError::NotFound("Product".to_string()));
    }

    // Lazily create the stock row on first movement into this pair
    sqlx::query(
        r#"
        INSERT INTO branch_stocks (branch_id, product_id, quantity, min_stock)
        VALUES ($1, $2, 0, $3)
        ON CONFLICT (branch_id, product_id) DO NOTHING
        "#,
    )
    .bind(entry.branch_id)
    .bind(entry.product_id)
    .bind(policy.default_min_stock)
    .execute(&mut **tx)
    .await?;

    let (stock_id, stock_before) = sqlx::query_as::<_, (Uuid, i64)>(
        r#"
        SELECT id, quantity FROM branch_stocks
        WHERE branch_id = $1 AND product_id = $2
        FOR UPDATE
        "#,
    )
    .bind(entry.branch_id)
    .bind(entry.product_id)
    .fetch_one(&mut **tx)
    .await?;

    let stock_after = entry.direction.apply(stock_before, entry.quantity);

    if stock_after < 0 && !policy.allow_negative_stock {
        return Err(AppError::InsufficientStock(format!(
            "Product {} at branch {}: requested {}, available {}",
            entry.product_id, entry.branch_id, entry.quantity, stock_before
        )));
    }

    sqlx::query("UPDATE branch_stocks SET quantity = $1, updated_at = NOW() WHERE id = $2")
        .bind(stock_after)
        .bind(stock_id)
        .execute(&mut **tx)
        .await?;

    let row = sqlx::query_as::<_, MovementRow>(
        r#"
        INSERT INTO stock_movements (
            branch_id, product_id, direction, quantity, stock_before, stock_after,
            reference_kind, reference_id, notes, created_by
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        RETURNING id, branch_id, product_id, direction, quantity, stock_before, stock_after,
                  reference_kind, reference_id, notes, created_by, created_at
        "#,
    )
    .bind(entry.branch_id)
    .bind(entry.product_id)
    .bind(entry.direction.as_str())
    .bind(entry.quantity)
    .bind(stock_before)
    .bind(stock_after)
    .bind(entry.reference_kind.as_str())
    .bind(entry.reference_id)
    .bind(&entry.notes)
    .bind(entry.actor)
    .fetch_one(&mut **tx)
    .await?;

    debug!(
        branch_id = %entry.branch_id,
        product_id = %entry.product_id,
        direction = entry.direction.as_str(),
        quantity = entry.quantity,
        stock_before,
        stock_after,
        "Applied stock adjustment"
    );

    row.try_into()
}

/// Reverse every movement tied to a reference, restoring the quantities
/// it moved and deleting the movement rows, all inside the caller's
/// transaction. Used by the sale cancellation compensating reversal;
/// the atomic `quantity + delta` update takes the same row lock as
/// [`apply_adjustment`].
pub(crate) async fn reverse_movements(
    tx: &mut Transaction<'_, Postgres>,
    reference_kind: ReferenceKind,
    reference_id: Uuid,
) -> AppResult<usize> {
    let movements = sqlx::query_as::<_, (Uuid, Uuid, String, i64)>(
        r#"
        SELECT branch_id, product_id, direction, quantity
        FROM stock_movements
        WHERE reference_kind = $1 AND reference_id = $2
        "#,
    )
    .bind(reference_kind.as_str())
    .bind(reference_id)
    .fetch_all(&mut **tx)
    .await?;

    for (branch_id, product_id, direction, quantity) in &movements {
        let direction = MovementDirection::parse(direction)
            .ok_or_else(|| AppError::Internal(format!("Unknown direction: {}", direction)))?;
        // Inverse of the original movement
        let delta = match direction {
            MovementDirection::Out => *quantity,
            MovementDirection::In => -quantity,
        };

        sqlx::query(
            r#"
            UPDATE branch_stocks
            SET quantity = quantity + $1, updated_at = NOW()
            WHERE branch_id = $2 AND product_id = $3
            "#,
        )
        .bind(delta)
        .bind(branch_id)
        .bind(product_id)
        .execute(&mut **tx)
        .await?;
    }

    sqlx::query("DELETE FROM stock_movements WHERE reference_kind = $1 AND reference_id = $2")
        .bind(reference_kind.as_str())
        .bind(reference_id)
        .execute(&mut **tx)
        .await?;

    Ok(movements.len())
}
