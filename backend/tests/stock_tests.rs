//! Stock ledger tests
//!
//! Tests for the movement ledger including:
//! - Snapshot consistency (stock_after = direction applied to stock_before)
//! - Ledger sum accuracy (quantity equals signed sum of movements)
//! - Low stock detection
//! - Reversal symmetry for compensating deletes

use proptest::prelude::*;

use chrono::Utc;
use shared::{BranchStock, MovementDirection, ReferenceKind, StockMovement};
use uuid::Uuid;

fn movement(
    direction: MovementDirection,
    quantity: i64,
    stock_before: i64,
    reference_kind: ReferenceKind,
) -> StockMovement {
    StockMovement {
        id: Uuid::new_v4(),
        branch_id: Uuid::new_v4(),
        product_id: Uuid::new_v4(),
        direction,
        quantity,
        stock_before,
        stock_after: direction.apply(stock_before, quantity),
        reference_kind,
        reference_id: None,
        notes: None,
        created_by: Uuid::new_v4(),
        created_at: Utc::now(),
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_movement_consistency() {
        let m = movement(MovementDirection::In, 7, 3, ReferenceKind::Adjustment);
        assert!(m.is_consistent());
        assert_eq!(m.stock_after, 10);

        let mut bad = movement(MovementDirection::Out, 2, 10, ReferenceKind::Sale);
        bad.stock_after = 99;
        assert!(!bad.is_consistent());
    }

    #[test]
    fn test_low_stock_detection() {
        let stock = BranchStock {
            id: Uuid::new_v4(),
            branch_id: Uuid::new_v4(),
            product_id: Uuid::new_v4(),
            quantity: 3,
            min_stock: 5,
            updated_at: Utc::now(),
        };
        assert!(stock.is_low());

        let ok = BranchStock { quantity: 5, ..stock.clone() };
        assert!(!ok.is_low());
    }

    /// Insufficient stock is detected before the quantity goes negative
    #[test]
    fn test_insufficient_stock_detection() {
        let before = 4;
        let requested = 5;
        let after = MovementDirection::Out.apply(before, requested);
        assert!(after < 0);
    }

    /// Availability is a plain threshold on the current quantity, with
    /// a missing stock row counting as zero units on hand
    #[test]
    fn test_availability_threshold() {
        fn available(on_hand: Option<i64>, requested: i64) -> bool {
            on_hand.unwrap_or(0) >= requested
        }

        assert!(available(Some(10), 10));
        assert!(available(Some(10), 1));
        assert!(!available(Some(10), 11));
        assert!(!available(None, 1));
        assert!(available(None, 0));
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    fn quantity_strategy() -> impl Strategy<Value = i64> {
        1i64..=10_000
    }

    fn direction_strategy() -> impl Strategy<Value = MovementDirection> {
        prop_oneof![Just(MovementDirection::In), Just(MovementDirection::Out)]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Quantity equals the signed sum of all movements applied in
        /// order, starting from zero
        #[test]
        fn prop_ledger_sum_accuracy(
            entries in prop::collection::vec(
                (direction_strategy(), quantity_strategy()),
                1..30
            )
        ) {
            let mut quantity = 0i64;
            let mut signed_sum = 0i64;

            for (direction, qty) in &entries {
                quantity = direction.apply(quantity, *qty);
                signed_sum += match direction {
                    MovementDirection::In => *qty,
                    MovementDirection::Out => -*qty,
                };
            }

            prop_assert_eq!(quantity, signed_sum);
        }

        /// Every movement chains: stock_after of one is stock_before of
        /// the next, and each snapshot pair is internally consistent
        #[test]
        fn prop_snapshot_chaining(
            entries in prop::collection::vec(
                (direction_strategy(), quantity_strategy()),
                1..30
            )
        ) {
            let mut quantity = 0i64;
            let mut movements = Vec::new();

            for (direction, qty) in &entries {
                let m = movement(*direction, *qty, quantity, ReferenceKind::Adjustment);
                quantity = m.stock_after;
                movements.push(m);
            }

            for m in &movements {
                prop_assert!(m.is_consistent());
            }
            for pair in movements.windows(2) {
                prop_assert_eq!(pair[0].stock_after, pair[1].stock_before);
            }
            prop_assert_eq!(movements.last().unwrap().stock_after, quantity);
        }

        /// Reversing a batch of movements restores the starting quantity
        #[test]
        fn prop_reversal_restores_quantity(
            start in 0i64..=10_000,
            entries in prop::collection::vec(
                (direction_strategy(), quantity_strategy()),
                1..20
            )
        ) {
            let mut quantity = start;
            for (direction, qty) in &entries {
                quantity = direction.apply(quantity, *qty);
            }

            // Compensating delta per movement: the inverse of its effect
            for (direction, qty) in &entries {
                quantity += match direction {
                    MovementDirection::In => -*qty,
                    MovementDirection::Out => *qty,
                };
            }

            prop_assert_eq!(quantity, start);
        }

        /// An OUT movement never leaves more stock than it found
        #[test]
        fn prop_out_decreases(
            before in 0i64..=10_000,
            qty in quantity_strategy()
        ) {
            prop_assert!(MovementDirection::Out.apply(before, qty) < before);
            prop_assert!(MovementDirection::In.apply(before, qty) > before);
        }
    }
}
