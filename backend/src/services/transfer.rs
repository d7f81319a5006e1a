//! Inter-branch transfer workflow service
//!
//! Owns the transfer state machine. Stock only moves on the SEND and
//! RECEIVE transitions, via the stock ledger, inside the same
//! transaction as the status change: a transfer can never half-ship.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use tracing::debug;
use uuid::Uuid;

use crate::config::StockConfig;
use crate::error::{AppError, AppResult};
use crate::services::numbering::next_document_number;
use crate::services::stock::{apply_adjustment, LedgerEntry};
use shared::{
    validate_distinct_branches, validate_quantity, DocumentKind, MovementDirection, ReferenceKind,
    Transfer, TransferItem, TransferStatus,
};

/// Transfer workflow service
#[derive(Clone)]
pub struct TransferService {
    db: PgPool,
    policy: StockConfig,
}

/// Database row for a transfer header
#[derive(Debug, FromRow)]
struct TransferRow {
    id: Uuid,
    transfer_number: String,
    from_branch_id: Uuid,
    to_branch_id: Uuid,
    status: String,
    requested_by: Uuid,
    requested_at: DateTime<Utc>,
    approved_by: Option<Uuid>,
    approved_at: Option<DateTime<Utc>>,
    sent_at: Option<DateTime<Utc>>,
    received_at: Option<DateTime<Utc>>,
    delivery_note_number: Option<String>,
    rejection_reason: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<TransferRow> for Transfer {
    type Error = AppError;

    fn try_from(row: TransferRow) -> Result<Self, Self::Error> {
        let status = TransferStatus::parse(&row.status)
            .ok_or_else(|| AppError::Internal(format!("Unknown transfer status: {}", row.status)))?;
        Ok(Transfer {
            id: row.id,
            transfer_number: row.transfer_number,
            from_branch_id: row.from_branch_id,
            to_branch_id: row.to_branch_id,
            status,
            requested_by: row.requested_by,
            requested_at: row.requested_at,
            approved_by: row.approved_by,
            approved_at: row.approved_at,
            sent_at: row.sent_at,
            received_at: row.received_at,
            delivery_note_number: row.delivery_note_number,
            rejection_reason: row.rejection_reason,
            created_at: row.created_at,
        })
    }
}

/// Database row for a transfer item
#[derive(Debug, FromRow)]
struct TransferItemRow {
    id: Uuid,
    transfer_id: Uuid,
    product_id: Uuid,
    quantity_requested: i64,
    quantity_sent: Option<i64>,
    quantity_received: Option<i64>,
}

impl From<TransferItemRow> for TransferItem {
    fn from(row: TransferItemRow) -> Self {
        TransferItem {
            id: row.id,
            transfer_id: row.transfer_id,
            product_id: row.product_id,
            quantity_requested: row.quantity_requested,
            quantity_sent: row.quantity_sent,
            quantity_received: row.quantity_received,
        }
    }
}

/// One requested line of a new transfer
#[derive(Debug, Deserialize)]
pub struct TransferItemInput {
    pub product_id: Uuid,
    pub quantity: i64,
}

/// Input for creating a transfer
#[derive(Debug, Deserialize)]
pub struct CreateTransferInput {
    pub from_branch_id: Uuid,
    pub to_branch_id: Uuid,
    pub items: Vec<TransferItemInput>,
}

/// Input for rejecting a transfer
#[derive(Debug, Deserialize)]
pub struct RejectTransferInput {
    pub reason: String,
}

/// Per-item quantities for the send and receive transitions, keyed by
/// transfer item id. Items absent from the map move zero units; keys
/// that match no item of the transfer are rejected.
#[derive(Debug, Deserialize)]
pub struct ItemQuantitiesInput {
    pub quantities: HashMap<Uuid, i64>,
}

/// A transfer with its items
#[derive(Debug, Clone, serde::Serialize)]
pub struct TransferWithItems {
    #[serde(flatten)]
    pub transfer: Transfer,
    pub items: Vec<TransferItem>,
}

/// Filter for transfer listings
#[derive(Debug, Default, Deserialize)]
pub struct TransferFilter {
    pub branch_id: Option<Uuid>,
    pub status: Option<TransferStatus>,
}

impl TransferService {
    /// Create a new TransferService instance
    pub fn new(db: PgPool, policy: StockConfig) -> Self {
        Self { db, policy }
    }

    /// Create a transfer in the pending state
    pub async fn create_transfer(
        &self,
        actor: Uuid,
        input: CreateTransferInput,
    ) -> AppResult<TransferWithItems> {
        validate_distinct_branches(input.from_branch_id, input.to_branch_id)
            .map_err(|msg| AppError::validation("to_branch_id", msg))?;

        if input.items.is_empty() {
            return Err(AppError::validation(
                "items",
                "A transfer requires at least one item",
            ));
        }

        for item in &input.items {
            validate_quantity(item.quantity)
                .map_err(|msg| AppError::validation("items", msg))?;

            let product_exists = sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS(SELECT 1 FROM products WHERE id = $1)",
            )
            .bind(item.product_id)
            .fetch_one(&self.db)
            .await?;
            if !product_exists {
                return Err(AppError::NotFound(format!("Product {}", item.product_id)));
            }
        }

        let from_code = sqlx::query_scalar::<_, String>("SELECT code FROM branches WHERE id = $1")
            .bind(input.from_branch_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Source branch".to_string()))?;

        let to_exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM branches WHERE id = $1)")
                .bind(input.to_branch_id)
                .fetch_one(&self.db)
                .await?;
        if !to_exists {
            return Err(AppError::NotFound("Destination branch".to_string()));
        }

        let mut tx = self.db.begin().await?;

        let transfer_number = next_document_number(
            &mut tx,
            input.from_branch_id,
            &from_code,
            DocumentKind::Transfer,
        )
        .await?;

        let header = sqlx::query_as::<_, TransferRow>(
            r#"
            INSERT INTO transfers (transfer_number, from_branch_id, to_branch_id, status, requested_by)
            VALUES ($1, $2, $3, 'pending', $4)
            RETURNING id, transfer_number, from_branch_id, to_branch_id, status,
                      requested_by, requested_at, approved_by, approved_at,
                      sent_at, received_at, delivery_note_number, rejection_reason, created_at
            "#,
        )
        .bind(&transfer_number)
        .bind(input.from_branch_id)
        .bind(input.to_branch_id)
        .bind(actor)
        .fetch_one(&mut *tx)
        .await?;

        let mut items = Vec::with_capacity(input.items.len());
        for item in &input.items {
            let row = sqlx::query_as::<_, TransferItemRow>(
                r#"
                INSERT INTO transfer_items (transfer_id, product_id, quantity_requested)
                VALUES ($1, $2, $3)
                RETURNING id, transfer_id, product_id, quantity_requested,
                          quantity_sent, quantity_received
                "#,
            )
            .bind(header.id)
            .bind(item.product_id)
            .bind(item.quantity)
            .fetch_one(&mut *tx)
            .await?;
            items.push(row.into());
        }

        tx.commit().await?;

        debug!(transfer_number = %transfer_number, "Created transfer");

        Ok(TransferWithItems {
            transfer: header.try_into()?,
            items,
        })
    }

    /// Approve a pending transfer. No stock moves.
    ///
    /// The guard and the status write are one statement, so of two
    /// concurrent approve/reject calls only one can see the pending row.
    pub async fn approve_transfer(&self, actor: Uuid, transfer_id: Uuid) -> AppResult<TransferWithItems> {
        let row = sqlx::query_as::<_, TransferRow>(
            r#"
            UPDATE transfers
            SET status = 'approved', approved_by = $2, approved_at = NOW()
            WHERE id = $1 AND status = 'pending'
            RETURNING id, transfer_number, from_branch_id, to_branch_id, status,
                      requested_by, requested_at, approved_by, approved_at,
                      sent_at, received_at, delivery_note_number, rejection_reason, created_at
            "#,
        )
        .bind(transfer_id)
        .bind(actor)
        .fetch_optional(&self.db)
        .await?;

        match row {
            Some(row) => {
                let items = self.load_items(transfer_id).await?;
                Ok(TransferWithItems {
                    transfer: row.try_into()?,
                    items,
                })
            }
            None => Err(self.transition_failure(transfer_id, "approve").await?),
        }
    }

    /// Reject a pending transfer. Terminal; no stock moves.
    pub async fn reject_transfer(
        &self,
        actor: Uuid,
        transfer_id: Uuid,
        input: RejectTransferInput,
    ) -> AppResult<TransferWithItems> {
        if input.reason.trim().is_empty() {
            return Err(AppError::validation(
                "reason",
                "A rejection reason is required",
            ));
        }

        let row = sqlx::query_as::<_, TransferRow>(
            r#"
            UPDATE transfers
            SET status = 'rejected', approved_by = $2, approved_at = NOW(),
                rejection_reason = $3
            WHERE id = $1 AND status = 'pending'
            RETURNING id, transfer_number, from_branch_id, to_branch_id, status,
                      requested_by, requested_at, approved_by, approved_at,
                      sent_at, received_at, delivery_note_number, rejection_reason, created_at
            "#,
        )
        .bind(transfer_id)
        .bind(actor)
        .bind(input.reason.trim())
        .fetch_optional(&self.db)
        .await?;

        match row {
            Some(row) => {
                let items = self.load_items(transfer_id).await?;
                Ok(TransferWithItems {
                    transfer: row.try_into()?,
                    items,
                })
            }
            None => Err(self.transition_failure(transfer_id, "reject").await?),
        }
    }

    /// Send an approved transfer: record sent quantities, deduct them
    /// from the source branch, and assign a delivery note number. One
    /// transaction; if any item fails, no quantity is recorded and no
    /// stock moves.
    pub async fn send_transfer(
        &self,
        actor: Uuid,
        transfer_id: Uuid,
        input: ItemQuantitiesInput,
    ) -> AppResult<TransferWithItems> {
        let mut tx = self.db.begin().await?;

        let transfer = lock_transfer(&mut tx, transfer_id).await?;
        let status = parse_status(&transfer.status)?;
        if !status.can_transition(TransferStatus::Sent) {
            return Err(AppError::InvalidStateTransition(format!(
                "Cannot send a transfer in status {}",
                status.as_str()
            )));
        }

        let items = load_item_rows(&mut tx, transfer_id).await?;
        ensure_known_item_ids(&input.quantities, &items)?;

        for item in &items {
            let sent = input.quantities.get(&item.id).copied().unwrap_or(0);
            if sent < 0 {
                return Err(AppError::validation(
                    "quantities",
                    "Sent quantity cannot be negative",
                ));
            }
            if self.policy.enforce_transfer_quantities && sent > item.quantity_requested {
                return Err(AppError::validation(
                    "quantities",
                    format!(
                        "Sent quantity {} exceeds requested {} for product {}",
                        sent, item.quantity_requested, item.product_id
                    ),
                ));
            }

            sqlx::query("UPDATE transfer_items SET quantity_sent = $1 WHERE id = $2")
                .bind(sent)
                .bind(item.id)
                .execute(&mut *tx)
                .await?;

            if sent > 0 {
                apply_adjustment(
                    &mut tx,
                    &self.policy,
                    &LedgerEntry {
                        branch_id: transfer.from_branch_id,
                        product_id: item.product_id,
                        quantity: sent,
                        direction: MovementDirection::Out,
                        reference_kind: ReferenceKind::TransferOut,
                        reference_id: Some(transfer_id),
                        notes: Some(format!("Transfer {}", transfer.transfer_number)),
                        actor,
                    },
                )
                .await?;
            }
        }

        let from_code = sqlx::query_scalar::<_, String>("SELECT code FROM branches WHERE id = $1")
            .bind(transfer.from_branch_id)
            .fetch_one(&mut *tx)
            .await?;

        let delivery_note = next_document_number(
            &mut tx,
            transfer.from_branch_id,
            &from_code,
            DocumentKind::DeliveryNote,
        )
        .await?;

        let header = sqlx::query_as::<_, TransferRow>(
            r#"
            UPDATE transfers
            SET status = 'sent', sent_at = NOW(), delivery_note_number = $2
            WHERE id = $1
            RETURNING id, transfer_number, from_branch_id, to_branch_id, status,
                      requested_by, requested_at, approved_by, approved_at,
                      sent_at, received_at, delivery_note_number, rejection_reason, created_at
            "#,
        )
        .bind(transfer_id)
        .bind(&delivery_note)
        .fetch_one(&mut *tx)
        .await?;

        let items = load_item_rows(&mut tx, transfer_id).await?;

        tx.commit().await?;

        debug!(transfer_id = %transfer_id, delivery_note = %delivery_note, "Sent transfer");

        Ok(TransferWithItems {
            transfer: header.try_into()?,
            items: items.into_iter().map(|r| r.into()).collect(),
        })
    }

    /// Receive a sent transfer: record received quantities and credit
    /// them to the destination branch, lazily creating stock rows. One
    /// transaction.
    pub async fn receive_transfer(
        &self,
        actor: Uuid,
        transfer_id: Uuid,
        input: ItemQuantitiesInput,
    ) -> AppResult<TransferWithItems> {
        let mut tx = self.db.begin().await?;

        let transfer = lock_transfer(&mut tx, transfer_id).await?;
        let status = parse_status(&transfer.status)?;
        if !status.can_transition(TransferStatus::Received) {
            return Err(AppError::InvalidStateTransition(format!(
                "Cannot receive a transfer in status {}",
                status.as_str()
            )));
        }

        let items = load_item_rows(&mut tx, transfer_id).await?;
        ensure_known_item_ids(&input.quantities, &items)?;

        for item in &items {
            let received = input.quantities.get(&item.id).copied().unwrap_or(0);
            if received < 0 {
                return Err(AppError::validation(
                    "quantities",
                    "Received quantity cannot be negative",
                ));
            }
            if self.policy.enforce_transfer_quantities
                && received > item.quantity_sent.unwrap_or(0)
            {
                return Err(AppError::validation(
                    "quantities",
                    format!(
                        "Received quantity {} exceeds sent {} for product {}",
                        received,
                        item.quantity_sent.unwrap_or(0),
                        item.product_id
                    ),
                ));
            }

            sqlx::query("UPDATE transfer_items SET quantity_received = $1 WHERE id = $2")
                .bind(received)
                .bind(item.id)
                .execute(&mut *tx)
                .await?;

            if received > 0 {
                apply_adjustment(
                    &mut tx,
                    &self.policy,
                    &LedgerEntry {
                        branch_id: transfer.to_branch_id,
                        product_id: item.product_id,
                        quantity: received,
                        direction: MovementDirection::In,
                        reference_kind: ReferenceKind::TransferIn,
                        reference_id: Some(transfer_id),
                        notes: Some(format!("Transfer {}", transfer.transfer_number)),
                        actor,
                    },
                )
                .await?;
            }
        }

        let header = sqlx::query_as::<_, TransferRow>(
            r#"
            UPDATE transfers
            SET status = 'received', received_at = NOW()
            WHERE id = $1
            RETURNING id, transfer_number, from_branch_id, to_branch_id, status,
                      requested_by, requested_at, approved_by, approved_at,
                      sent_at, received_at, delivery_note_number, rejection_reason, created_at
            "#,
        )
        .bind(transfer_id)
        .fetch_one(&mut *tx)
        .await?;

        let items = load_item_rows(&mut tx, transfer_id).await?;

        tx.commit().await?;

        debug!(transfer_id = %transfer_id, "Received transfer");

        Ok(TransferWithItems {
            transfer: header.try_into()?,
            items: items.into_iter().map(|r| r.into()).collect(),
        })
    }

    /// Delete a pending transfer. No stock ever moved, so nothing to
    /// reverse.
    pub async fn delete_transfer(&self, transfer_id: Uuid) -> AppResult<()> {
        let mut tx = self.db.begin().await?;

        let transfer = lock_transfer(&mut tx, transfer_id).await?;
        let status = parse_status(&transfer.status)?;
        if !status.is_deletable() {
            return Err(AppError::InvalidStateTransition(format!(
                "Only pending transfers can be deleted, current status {}",
                status.as_str()
            )));
        }

        sqlx::query("DELETE FROM transfer_items WHERE transfer_id = $1")
            .bind(transfer_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM transfers WHERE id = $1")
            .bind(transfer_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(())
    }

    /// Get a transfer with its items
    pub async fn get_transfer(&self, transfer_id: Uuid) -> AppResult<TransferWithItems> {
        let row = sqlx::query_as::<_, TransferRow>(
            r#"
            SELECT id, transfer_number, from_branch_id, to_branch_id, status,
                   requested_by, requested_at, approved_by, approved_at,
                   sent_at, received_at, delivery_note_number, rejection_reason, created_at
            FROM transfers
            WHERE id = $1
            "#,
        )
        .bind(transfer_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Transfer".to_string()))?;

        let items = self.load_items(transfer_id).await?;

        Ok(TransferWithItems {
            transfer: row.try_into()?,
            items,
        })
    }

    /// List transfers, optionally filtered by branch (either side) and
    /// status, newest first
    pub async fn list_transfers(&self, filter: TransferFilter) -> AppResult<Vec<Transfer>> {
        let rows = sqlx::query_as::<_, TransferRow>(
            r#"
            SELECT id, transfer_number, from_branch_id, to_branch_id, status,
                   requested_by, requested_at, approved_by, approved_at,
                   sent_at, received_at, delivery_note_number, rejection_reason, created_at
            FROM transfers
            WHERE ($1::uuid IS NULL OR from_branch_id = $1 OR to_branch_id = $1)
              AND ($2::text IS NULL OR status = $2)
            ORDER BY requested_at DESC
            "#,
        )
        .bind(filter.branch_id)
        .bind(filter.status.map(|s| s.as_str()))
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(Transfer::try_from).collect()
    }

    async fn load_items(&self, transfer_id: Uuid) -> AppResult<Vec<TransferItem>> {
        let rows = sqlx::query_as::<_, TransferItemRow>(
            r#"
            SELECT id, transfer_id, product_id, quantity_requested,
                   quantity_sent, quantity_received
            FROM transfer_items
            WHERE transfer_id = $1
            ORDER BY id
            "#,
        )
        .bind(transfer_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    /// Build the error for a failed guarded approve/reject: not found
    /// when the transfer does not exist, invalid transition otherwise
    async fn transition_failure(&self, transfer_id: Uuid, operation: &str) -> AppResult<AppError> {
        let status = sqlx::query_scalar::<_, String>("SELECT status FROM transfers WHERE id = $1")
            .bind(transfer_id)
            .fetch_optional(&self.db)
            .await?;

        Ok(match status {
            None => AppError::NotFound("Transfer".to_string()),
            Some(status) => AppError::InvalidStateTransition(format!(
                "Cannot {} a transfer in status {}",
                operation, status
            )),
        })
    }
}

/// Lock the transfer header for the duration of the transaction
async fn lock_transfer(
    tx: &mut Transaction<'_, Postgres>,
    transfer_id: Uuid,
) -> AppResult<TransferRow> {
    sqlx::query_as::<_, TransferRow>(
        r#"
        SELECT id, transfer_number, from_branch_id, to_branch_id, status,
               requested_by, requested_at, approved_by, approved_at,
               sent_at, received_at, delivery_note_number, rejection_reason, created_at
        FROM transfers
        WHERE id = $1
        FOR UPDATE
        "#,
    )
    .bind(transfer_id)
    .fetch_optional(&mut **tx)
    .await?
    .ok_or_else(|| AppError::NotFound("Transfer".to_string()))
}

async fn load_item_rows(
    tx: &mut Transaction<'_, Postgres>,
    transfer_id: Uuid,
) -> AppResult<Vec<TransferItemRow>> {
    Ok(sqlx::query_as::<_, TransferItemRow>(
        r#"
        SELECT id, transfer_id, product_id, quantity_requested,
               quantity_sent, quantity_received
        FROM transfer_items
        WHERE transfer_id = $1
        ORDER BY id
        "#,
    )
    .bind(transfer_id)
    .fetch_all(&mut **tx)
    .await?)
}

fn parse_status(raw: &str) -> AppResult<TransferStatus> {
    TransferStatus::parse(raw)
        .ok_or_else(|| AppError::Internal(format!("Unknown transfer status: {}", raw)))
}

/// Every key in the quantity map must name an item of this transfer. A
/// stray id would otherwise be silently dropped by the per-item lookup,
/// which hides caller mistakes like keying by product id.
fn ensure_known_item_ids(
    quantities: &HashMap<Uuid, i64>,
    items: &[TransferItemRow],
) -> AppResult<()> {
    for id in quantities.keys() {
        if !items.iter().any(|item| item.id == *id) {
            return Err(AppError::validation(
                "quantities",
                format!("{} is not an item of this transfer", id),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: Uuid) -> TransferItemRow {
        TransferItemRow {
            id,
            transfer_id: Uuid::new_v4(),
            product_id: Uuid::new_v4(),
            quantity_requested: 10,
            quantity_sent: None,
            quantity_received: None,
        }
    }

    #[test]
    fn quantity_keys_must_match_transfer_items() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let items = vec![item(a), item(b)];

        let known = HashMap::from([(a, 3i64), (b, 4)]);
        assert!(ensure_known_item_ids(&known, &items).is_ok());

        // Partial maps are fine, the missing item just moves zero units
        let partial = HashMap::from([(a, 3i64)]);
        assert!(ensure_known_item_ids(&partial, &items).is_ok());

        let stray = Uuid::new_v4();
        let unknown = HashMap::from([(a, 3i64), (stray, 4)]);
        let err = ensure_known_item_ids(&unknown, &items).unwrap_err();
        match err {
            AppError::Validation { field, message } => {
                assert_eq!(field, "quantities");
                assert!(message.contains(&stray.to_string()));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }
}
