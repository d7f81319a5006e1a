//! Sale transaction tests
//!
//! Tests for sale totals, discount validation, the same-day
//! cancellation rule, and the cancel round-trip on stock quantities.

use proptest::prelude::*;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use shared::{
    compute_sale_totals, line_subtotal, validate_discount, MovementDirection, PaymentMethod,
};
use std::str::FromStr;

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_line_subtotal() {
        assert_eq!(line_subtotal(3, dec("15000")), dec("45000"));
    }

    #[test]
    fn test_totals_with_discount() {
        let lines = vec![(2, dec("5000")), (1, dec("1250.50"))];
        let totals = compute_sale_totals(&lines, dec("250"));
        assert_eq!(totals.subtotal, dec("11250.50"));
        assert_eq!(totals.grand_total, dec("11000.50"));
    }

    #[test]
    fn test_discount_bounds() {
        assert!(validate_discount(dec("100"), dec("100")).is_ok());
        assert!(validate_discount(dec("100"), dec("100.01")).is_err());
        assert!(validate_discount(dec("100"), dec("-5")).is_err());
    }

    #[test]
    fn test_payment_method_round_trip() {
        for m in [
            PaymentMethod::Cash,
            PaymentMethod::Card,
            PaymentMethod::BankTransfer,
        ] {
            assert_eq!(PaymentMethod::parse(m.as_str()), Some(m));
        }
    }

    /// Cancellation takes effect exactly once: the first cancel removes
    /// the sale and restores stock, a repeat finds no sale and restores
    /// nothing. Models the row lock plus guarded delete in the service,
    /// where the loser of two racing cancels sees the sale already gone.
    #[test]
    fn test_cancel_reverses_stock_exactly_once() {
        struct Shop {
            stock: i64,
            sale: Option<Vec<i64>>,
        }

        fn cancel(shop: &mut Shop) -> Result<(), &'static str> {
            // Taking the sale record and reversing are one atomic step
            let items = shop.sale.take().ok_or("sale not found")?;
            for q in items {
                shop.stock += q;
            }
            Ok(())
        }

        let mut shop = Shop {
            stock: 100,
            sale: None,
        };

        let quantities = vec![3i64, 7];
        for q in &quantities {
            shop.stock = MovementDirection::Out.apply(shop.stock, *q);
        }
        shop.sale = Some(quantities);
        assert_eq!(shop.stock, 90);

        assert!(cancel(&mut shop).is_ok());
        assert_eq!(shop.stock, 100);

        // The second cancel must error without touching stock
        assert!(cancel(&mut shop).is_err());
        assert_eq!(shop.stock, 100);
    }

    /// A sale is cancelable only on its own calendar date
    #[test]
    fn test_same_day_cancel_rule() {
        let sale_date = NaiveDate::from_ymd_opt(2026, 8, 30).unwrap();

        let today = NaiveDate::from_ymd_opt(2026, 8, 30).unwrap();
        assert_eq!(sale_date, today);

        let next_day = NaiveDate::from_ymd_opt(2026, 8, 31).unwrap();
        assert_ne!(sale_date, next_day);
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    fn quantity_strategy() -> impl Strategy<Value = i64> {
        1i64..=1000
    }

    fn price_strategy() -> impl Strategy<Value = Decimal> {
        (1i64..=10_000_000).prop_map(|n| Decimal::new(n, 2))
    }

    fn lines_strategy() -> impl Strategy<Value = Vec<(i64, Decimal)>> {
        prop::collection::vec((quantity_strategy(), price_strategy()), 1..10)
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Subtotal equals the sum of line subtotals
        #[test]
        fn prop_subtotal_is_line_sum(lines in lines_strategy()) {
            let totals = compute_sale_totals(&lines, Decimal::ZERO);
            let expected: Decimal = lines
                .iter()
                .map(|(qty, price)| line_subtotal(*qty, *price))
                .sum();

            prop_assert_eq!(totals.subtotal, expected);
            prop_assert_eq!(totals.grand_total, totals.subtotal);
        }

        /// grand_total = subtotal - discount, always
        #[test]
        fn prop_grand_total_relation(
            lines in lines_strategy(),
            discount_cents in 0i64..=1_000_000
        ) {
            let discount = Decimal::new(discount_cents, 2);
            let totals = compute_sale_totals(&lines, discount);

            prop_assert_eq!(totals.grand_total, totals.subtotal - totals.discount);
        }

        /// A valid discount never produces a negative grand total
        #[test]
        fn prop_valid_discount_nonnegative_total(
            lines in lines_strategy(),
            discount_cents in 0i64..=1_000_000
        ) {
            let discount = Decimal::new(discount_cents, 2);
            let totals = compute_sale_totals(&lines, discount);

            if validate_discount(totals.subtotal, discount).is_ok() {
                prop_assert!(totals.grand_total >= Decimal::ZERO);
            }
        }

        /// Creating a sale and canceling it leaves every product's
        /// quantity exactly where it started
        #[test]
        fn prop_cancel_round_trip(
            quantities in prop::collection::vec(quantity_strategy(), 1..10),
            start in 10_000i64..=100_000
        ) {
            let mut stock = start;

            // Sale: one OUT movement per line
            for q in &quantities {
                stock = MovementDirection::Out.apply(stock, *q);
            }

            // Cancel: each movement's effect is undone
            for q in &quantities {
                stock += *q;
            }

            prop_assert_eq!(stock, start);
        }
    }
}
