//! Transfer workflow tests
//!
//! Tests for the transfer state machine including:
//! - Legal transition edges and terminal states
//! - Forward-only progression
//! - Document number formatting

use proptest::prelude::*;

use shared::{format_document_number, DocumentKind, TransferStatus};

const ALL_STATUSES: [TransferStatus; 5] = [
    TransferStatus::Pending,
    TransferStatus::Approved,
    TransferStatus::Rejected,
    TransferStatus::Sent,
    TransferStatus::Received,
];

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_legal_transitions() {
        assert!(TransferStatus::Pending.can_transition(TransferStatus::Approved));
        assert!(TransferStatus::Pending.can_transition(TransferStatus::Rejected));
        assert!(TransferStatus::Approved.can_transition(TransferStatus::Sent));
        assert!(TransferStatus::Sent.can_transition(TransferStatus::Received));
    }

    #[test]
    fn test_illegal_transitions() {
        // Skipping approval
        assert!(!TransferStatus::Pending.can_transition(TransferStatus::Sent));
        // Backward
        assert!(!TransferStatus::Sent.can_transition(TransferStatus::Approved));
        assert!(!TransferStatus::Approved.can_transition(TransferStatus::Pending));
        // Rejecting after approval
        assert!(!TransferStatus::Approved.can_transition(TransferStatus::Rejected));
        // Self loop
        for s in ALL_STATUSES {
            assert!(!s.can_transition(s));
        }
    }

    #[test]
    fn test_terminal_states() {
        assert!(TransferStatus::Rejected.is_terminal());
        assert!(TransferStatus::Received.is_terminal());
        assert!(!TransferStatus::Pending.is_terminal());
        assert!(!TransferStatus::Approved.is_terminal());
        assert!(!TransferStatus::Sent.is_terminal());
    }

    #[test]
    fn test_document_number_format() {
        assert_eq!(
            format_document_number(DocumentKind::Transfer, "JKT", 2026, 8, 7),
            "TRF/JKT/2026/08/0007"
        );
        assert_eq!(
            format_document_number(DocumentKind::DeliveryNote, "SBY", 2026, 12, 123),
            "DN/SBY/2026/12/0123"
        );
        assert_eq!(
            format_document_number(DocumentKind::SaleInvoice, "BR01", 2027, 1, 10000),
            "INV/BR01/2027/01/10000"
        );
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    fn status_strategy() -> impl Strategy<Value = TransferStatus> {
        prop_oneof![
            Just(TransferStatus::Pending),
            Just(TransferStatus::Approved),
            Just(TransferStatus::Rejected),
            Just(TransferStatus::Sent),
            Just(TransferStatus::Received),
        ]
    }

    /// Workflow position used to show transitions only move forward
    fn rank(s: TransferStatus) -> u8 {
        match s {
            TransferStatus::Pending => 0,
            TransferStatus::Approved | TransferStatus::Rejected => 1,
            TransferStatus::Sent => 2,
            TransferStatus::Received => 3,
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Every legal transition strictly advances the workflow
        #[test]
        fn prop_transitions_move_forward(
            from in status_strategy(),
            to in status_strategy()
        ) {
            if from.can_transition(to) {
                prop_assert!(rank(to) > rank(from));
            }
        }

        /// Terminal states allow no transitions at all
        #[test]
        fn prop_terminal_states_final(
            from in status_strategy(),
            to in status_strategy()
        ) {
            if from.is_terminal() {
                prop_assert!(!from.can_transition(to));
            }
        }

        /// A random walk through the state machine ends after at most
        /// three transitions
        #[test]
        fn prop_walk_terminates(choices in prop::collection::vec(0usize..2, 0..10)) {
            let mut status = TransferStatus::Pending;
            let mut steps = 0;

            for c in choices {
                let next = ALL_STATUSES
                    .iter()
                    .filter(|to| status.can_transition(**to))
                    .nth(c)
                    .or_else(|| {
                        ALL_STATUSES.iter().find(|to| status.can_transition(**to))
                    });
                match next {
                    Some(next) => {
                        status = *next;
                        steps += 1;
                    }
                    None => break,
                }
            }

            prop_assert!(steps <= 3);
        }

        /// Moved quantities are conserved: what the source branch loses
        /// on send is exactly what the destination gains on receive when
        /// the same quantities are applied
        #[test]
        fn prop_transfer_conserves_stock(
            quantities in prop::collection::vec(1i64..=1000, 1..10),
            source_start in 10_000i64..=20_000
        ) {
            use shared::MovementDirection;

            let mut source = source_start;
            let mut destination = 0i64;

            for q in &quantities {
                source = MovementDirection::Out.apply(source, *q);
            }
            for q in &quantities {
                destination = MovementDirection::In.apply(destination, *q);
            }

            prop_assert_eq!(source + destination, source_start);
        }
    }
}
