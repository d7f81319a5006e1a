//! Stock ledger models
//!
//! Every quantity change at a branch is recorded as a directional,
//! audited movement. The movement log is append-only; replaying all
//! movements for a (branch, product) pair reproduces the current
//! on-hand quantity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Direction of a stock movement
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MovementDirection {
    In,
    Out,
}

impl MovementDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementDirection::In => "in",
            MovementDirection::Out => "out",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "in" => Some(MovementDirection::In),
            "out" => Some(MovementDirection::Out),
            _ => None,
        }
    }

    /// Apply a movement of `quantity` units to `before`, returning the
    /// resulting quantity. `quantity` is always positive; the direction
    /// carries the sign.
    pub fn apply(&self, before: i64, quantity: i64) -> i64 {
        match self {
            MovementDirection::In => before + quantity,
            MovementDirection::Out => before - quantity,
        }
    }
}

/// Business reason for a stock movement
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceKind {
    Sale,
    TransferOut,
    TransferIn,
    Adjustment,
    Initial,
}

impl ReferenceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReferenceKind::Sale => "sale",
            ReferenceKind::TransferOut => "transfer_out",
            ReferenceKind::TransferIn => "transfer_in",
            ReferenceKind::Adjustment => "adjustment",
            ReferenceKind::Initial => "initial",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "sale" => Some(ReferenceKind::Sale),
            "transfer_out" => Some(ReferenceKind::TransferOut),
            "transfer_in" => Some(ReferenceKind::TransferIn),
            "adjustment" => Some(ReferenceKind::Adjustment),
            "initial" => Some(ReferenceKind::Initial),
            _ => None,
        }
    }
}

/// Current quantity of one product at one branch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BranchStock {
    pub id: Uuid,
    pub branch_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i64,
    pub min_stock: i64,
    pub updated_at: DateTime<Utc>,
}

impl BranchStock {
    /// Whether this row should be surfaced by the low-stock notifier
    pub fn is_low(&self) -> bool {
        self.quantity < self.min_stock
    }
}

/// One atomic, audited change to a branch's stock
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockMovement {
    pub id: Uuid,
    pub branch_id: Uuid,
    pub product_id: Uuid,
    pub direction: MovementDirection,
    pub quantity: i64,
    pub stock_before: i64,
    pub stock_after: i64,
    pub reference_kind: ReferenceKind,
    pub reference_id: Option<Uuid>,
    pub notes: Option<String>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

impl StockMovement {
    /// Internal consistency: the snapshots must agree with the
    /// directional delta.
    pub fn is_consistent(&self) -> bool {
        self.quantity > 0
            && self.stock_after == self.direction.apply(self.stock_before, self.quantity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_apply() {
        assert_eq!(MovementDirection::In.apply(10, 4), 14);
        assert_eq!(MovementDirection::Out.apply(10, 4), 6);
        assert_eq!(MovementDirection::Out.apply(0, 3), -3);
    }

    #[test]
    fn test_direction_round_trip() {
        for d in [MovementDirection::In, MovementDirection::Out] {
            assert_eq!(MovementDirection::parse(d.as_str()), Some(d));
        }
        assert_eq!(MovementDirection::parse("sideways"), None);
    }

    #[test]
    fn test_reference_kind_round_trip() {
        for k in [
            ReferenceKind::Sale,
            ReferenceKind::TransferOut,
            ReferenceKind::TransferIn,
            ReferenceKind::Adjustment,
            ReferenceKind::Initial,
        ] {
            assert_eq!(ReferenceKind::parse(k.as_str()), Some(k));
        }
    }
}
