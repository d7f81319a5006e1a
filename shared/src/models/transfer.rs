//! Inter-branch transfer models
//!
//! A transfer moves stock between two branches through a multi-party
//! approval workflow. The status machine is:
//!
//! ```text
//! pending -> approved -> sent -> received
//!    \
//!     -> rejected
//! ```
//!
//! `rejected` and `received` are terminal. No transition skips a stage
//! or moves backward.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Status of an inter-branch transfer
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TransferStatus {
    Pending,
    Approved,
    Rejected,
    Sent,
    Received,
}

impl TransferStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferStatus::Pending => "pending",
            TransferStatus::Approved => "approved",
            TransferStatus::Rejected => "rejected",
            TransferStatus::Sent => "sent",
            TransferStatus::Received => "received",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(TransferStatus::Pending),
            "approved" => Some(TransferStatus::Approved),
            "rejected" => Some(TransferStatus::Rejected),
            "sent" => Some(TransferStatus::Sent),
            "received" => Some(TransferStatus::Received),
            _ => None,
        }
    }

    /// The single source of truth for allowed transitions.
    pub fn can_transition(&self, to: TransferStatus) -> bool {
        matches!(
            (self, to),
            (TransferStatus::Pending, TransferStatus::Approved)
                | (TransferStatus::Pending, TransferStatus::Rejected)
                | (TransferStatus::Approved, TransferStatus::Sent)
                | (TransferStatus::Sent, TransferStatus::Received)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TransferStatus::Rejected | TransferStatus::Received)
    }

    /// Whether a transfer in this status may still be deleted. No stock
    /// has moved yet, so no reversal is needed.
    pub fn is_deletable(&self) -> bool {
        matches!(self, TransferStatus::Pending)
    }
}

/// A request to move stock from one branch to another
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transfer {
    pub id: Uuid,
    /// Human-readable number scoped to the source branch, e.g.
    /// "TRF/JKT/2026/08/0007"
    pub transfer_number: String,
    pub from_branch_id: Uuid,
    pub to_branch_id: Uuid,
    pub status: TransferStatus,
    pub requested_by: Uuid,
    pub requested_at: DateTime<Utc>,
    pub approved_by: Option<Uuid>,
    pub approved_at: Option<DateTime<Utc>>,
    pub sent_at: Option<DateTime<Utc>>,
    pub received_at: Option<DateTime<Utc>>,
    /// Assigned when the transfer is sent
    pub delivery_note_number: Option<String>,
    /// Set only on rejection
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// One line of a transfer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferItem {
    pub id: Uuid,
    pub transfer_id: Uuid,
    pub product_id: Uuid,
    pub quantity_requested: i64,
    pub quantity_sent: Option<i64>,
    pub quantity_received: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [TransferStatus; 5] = [
        TransferStatus::Pending,
        TransferStatus::Approved,
        TransferStatus::Rejected,
        TransferStatus::Sent,
        TransferStatus::Received,
    ];

    #[test]
    fn test_happy_path_transitions() {
        assert!(TransferStatus::Pending.can_transition(TransferStatus::Approved));
        assert!(TransferStatus::Approved.can_transition(TransferStatus::Sent));
        assert!(TransferStatus::Sent.can_transition(TransferStatus::Received));
    }

    #[test]
    fn test_rejection_only_from_pending() {
        assert!(TransferStatus::Pending.can_transition(TransferStatus::Rejected));
        for s in [
            TransferStatus::Approved,
            TransferStatus::Sent,
            TransferStatus::Received,
            TransferStatus::Rejected,
        ] {
            assert!(!s.can_transition(TransferStatus::Rejected));
        }
    }

    #[test]
    fn test_terminal_states_have_no_exits() {
        for from in [TransferStatus::Rejected, TransferStatus::Received] {
            assert!(from.is_terminal());
            for to in ALL {
                assert!(!from.can_transition(to));
            }
        }
    }

    #[test]
    fn test_no_backward_or_skipping_transitions() {
        assert!(!TransferStatus::Pending.can_transition(TransferStatus::Sent));
        assert!(!TransferStatus::Pending.can_transition(TransferStatus::Received));
        assert!(!TransferStatus::Approved.can_transition(TransferStatus::Pending));
        assert!(!TransferStatus::Approved.can_transition(TransferStatus::Received));
        assert!(!TransferStatus::Sent.can_transition(TransferStatus::Approved));
    }

    #[test]
    fn test_status_round_trip() {
        for s in ALL {
            assert_eq!(TransferStatus::parse(s.as_str()), Some(s));
        }
        assert_eq!(TransferStatus::parse("shipped"), None);
    }

    #[test]
    fn test_only_pending_is_deletable() {
        for s in ALL {
            assert_eq!(s.is_deletable(), s == TransferStatus::Pending);
        }
    }
}
