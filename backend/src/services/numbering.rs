//! Per-branch document number generation
//!
//! Transfer numbers, delivery notes, and sale invoices draw from a
//! per-branch-per-month counter stored in `document_counters`. The
//! counter row is bumped inside the same transaction that creates the
//! document, so numbers are unique by construction and never reused
//! even when the owning transaction retries.

use chrono::{Datelike, Utc};
use sqlx::{Postgres, Transaction};
use uuid::Uuid;

use crate::error::AppResult;
use shared::{format_document_number, DocumentKind};

/// Allocate the next number of `kind` for a branch, e.g.
/// `TRF/JKT/2026/08/0007`.
pub(crate) async fn next_document_number(
    tx: &mut Transaction<'_, Postgres>,
    branch_id: Uuid,
    branch_code: &str,
    kind: DocumentKind,
) -> AppResult<String> {
    let now = Utc::now();
    let year = now.year();
    let month = now.month();

    // The upsert takes a row lock on the counter, serializing concurrent
    // allocations for the same branch and month.
    let sequence = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO document_counters (branch_id, doc_type, year, month, last_value)
        VALUES ($1, $2, $3, $4, 1)
        ON CONFLICT (branch_id, doc_type, year, month)
        DO UPDATE SET last_value = document_counters.last_value + 1
        RETURNING last_value
        "#,
    )
    .bind(branch_id)
    .bind(kind.counter_key())
    .bind(year)
    .bind(month as i32)
    .fetch_one(&mut **tx)
    .await?;

    Ok(format_document_number(kind, branch_code, year, month, sequence))
}
