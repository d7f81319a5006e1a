//! Validation utilities for the Branch Inventory Management System
//!
//! Pure checks shared by the backend services; each returns a static
//! message suitable for wrapping in the caller's error type.

use rust_decimal::Decimal;
use uuid::Uuid;

/// Movement and item quantities must be strictly positive.
pub fn validate_quantity(quantity: i64) -> Result<(), &'static str> {
    if quantity <= 0 {
        return Err("Quantity must be positive");
    }
    Ok(())
}

/// Discount must be within [0, subtotal].
pub fn validate_discount(subtotal: Decimal, discount: Decimal) -> Result<(), &'static str> {
    if discount < Decimal::ZERO {
        return Err("Discount cannot be negative");
    }
    if discount > subtotal {
        return Err("Discount cannot exceed subtotal");
    }
    Ok(())
}

/// A transfer must move stock between two different branches.
pub fn validate_distinct_branches(from: Uuid, to: Uuid) -> Result<(), &'static str> {
    if from == to {
        return Err("Source and destination branch must differ");
    }
    Ok(())
}

/// Branch codes appear in document numbers: short, uppercase
/// alphanumeric.
pub fn validate_branch_code(code: &str) -> Result<(), &'static str> {
    if code.is_empty() || code.len() > 8 {
        return Err("Branch code must be 1-8 characters");
    }
    if !code.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()) {
        return Err("Branch code must be uppercase alphanumeric");
    }
    Ok(())
}

/// Prices must not be negative.
pub fn validate_unit_price(price: Decimal) -> Result<(), &'static str> {
    if price < Decimal::ZERO {
        return Err("Unit price cannot be negative");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(1000).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-5).is_err());
    }

    #[test]
    fn test_validate_discount() {
        assert!(validate_discount(dec("100"), dec("0")).is_ok());
        assert!(validate_discount(dec("100"), dec("100")).is_ok());
        assert!(validate_discount(dec("100"), dec("100.01")).is_err());
        assert!(validate_discount(dec("100"), dec("-1")).is_err());
    }

    #[test]
    fn test_validate_distinct_branches() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        assert!(validate_distinct_branches(a, b).is_ok());
        assert!(validate_distinct_branches(a, a).is_err());
    }

    #[test]
    fn test_validate_branch_code() {
        assert!(validate_branch_code("JKT").is_ok());
        assert!(validate_branch_code("BR01").is_ok());
        assert!(validate_branch_code("").is_err());
        assert!(validate_branch_code("jkt").is_err());
        assert!(validate_branch_code("TOOLONGCODE").is_err());
    }

    #[test]
    fn test_validate_unit_price() {
        assert!(validate_unit_price(dec("0")).is_ok());
        assert!(validate_unit_price(dec("19.99")).is_ok());
        assert!(validate_unit_price(dec("-0.01")).is_err());
    }
}
