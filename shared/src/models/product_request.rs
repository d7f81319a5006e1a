//! Product catalog request models
//!
//! A lighter cousin of the transfer workflow: branch staff request a new
//! catalog product, a reviewer approves or rejects it. Approval creates
//! the product; no stock moves.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Status of a product catalog request
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Approved => "approved",
            RequestStatus::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(RequestStatus::Pending),
            "approved" => Some(RequestStatus::Approved),
            "rejected" => Some(RequestStatus::Rejected),
            _ => None,
        }
    }

    /// Only pending requests may be reviewed; approved and rejected are
    /// terminal.
    pub fn is_reviewable(&self) -> bool {
        matches!(self, RequestStatus::Pending)
    }
}

/// A request to add a product to the catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductRequest {
    pub id: Uuid,
    pub name: String,
    pub sku: String,
    pub category: Option<String>,
    pub unit_price: Decimal,
    pub status: RequestStatus,
    pub requested_by: Uuid,
    pub requested_at: DateTime<Utc>,
    pub reviewed_by: Option<Uuid>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    /// Set when approval creates the catalog product
    pub created_product_id: Option<Uuid>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_pending_is_reviewable() {
        assert!(RequestStatus::Pending.is_reviewable());
        assert!(!RequestStatus::Approved.is_reviewable());
        assert!(!RequestStatus::Rejected.is_reviewable());
    }

    #[test]
    fn test_status_round_trip() {
        for s in [
            RequestStatus::Pending,
            RequestStatus::Approved,
            RequestStatus::Rejected,
        ] {
            assert_eq!(RequestStatus::parse(s.as_str()), Some(s));
        }
    }
}
