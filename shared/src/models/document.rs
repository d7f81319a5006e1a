//! Generated document numbers
//!
//! Transfer numbers, delivery notes, and sale invoices share one scheme:
//! `<PREFIX>/<BRANCH-CODE>/<YEAR>/<MONTH>/<sequence>`, with the sequence
//! scoped per branch per month. Uniqueness comes from the per-branch
//! counter bumped inside the same database transaction that creates the
//! document, not from the formatting here.

use serde::{Deserialize, Serialize};

/// Kinds of generated documents
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Transfer,
    DeliveryNote,
    SaleInvoice,
}

impl DocumentKind {
    pub fn prefix(&self) -> &'static str {
        match self {
            DocumentKind::Transfer => "TRF",
            DocumentKind::DeliveryNote => "DN",
            DocumentKind::SaleInvoice => "INV",
        }
    }

    /// Stable key used for the per-branch counter row
    pub fn counter_key(&self) -> &'static str {
        match self {
            DocumentKind::Transfer => "transfer",
            DocumentKind::DeliveryNote => "delivery_note",
            DocumentKind::SaleInvoice => "sale_invoice",
        }
    }
}

/// Format a document number, e.g. `TRF/JKT/2026/08/0007`.
pub fn format_document_number(
    kind: DocumentKind,
    branch_code: &str,
    year: i32,
    month: u32,
    sequence: i64,
) -> String {
    format!(
        "{}/{}/{}/{:02}/{:04}",
        kind.prefix(),
        branch_code,
        year,
        month,
        sequence
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_document_number() {
        assert_eq!(
            format_document_number(DocumentKind::Transfer, "JKT", 2026, 8, 7),
            "TRF/JKT/2026/08/0007"
        );
        assert_eq!(
            format_document_number(DocumentKind::SaleInvoice, "SBY", 2026, 12, 123),
            "INV/SBY/2026/12/0123"
        );
    }

    #[test]
    fn test_sequence_wider_than_padding() {
        assert_eq!(
            format_document_number(DocumentKind::DeliveryNote, "JKT", 2026, 1, 12345),
            "DN/JKT/2026/01/12345"
        );
    }

    #[test]
    fn test_prefixes_are_distinct() {
        let prefixes = [
            DocumentKind::Transfer.prefix(),
            DocumentKind::DeliveryNote.prefix(),
            DocumentKind::SaleInvoice.prefix(),
        ];
        for (i, a) in prefixes.iter().enumerate() {
            for b in &prefixes[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
