//! Point-of-sale models

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Accepted payment methods
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
    BankTransfer,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
            PaymentMethod::BankTransfer => "bank_transfer",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "cash" => Some(PaymentMethod::Cash),
            "card" => Some(PaymentMethod::Card),
            "bank_transfer" => Some(PaymentMethod::BankTransfer),
            _ => None,
        }
    }
}

/// A completed sale at a branch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sale {
    pub id: Uuid,
    /// e.g. "INV/JKT/2026/08/0123"
    pub invoice_number: String,
    pub branch_id: Uuid,
    /// Cashier who rang up the sale
    pub user_id: Uuid,
    pub sale_date: NaiveDate,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub grand_total: Decimal,
    pub payment_method: PaymentMethod,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// One line of a sale
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleItem {
    pub id: Uuid,
    pub sale_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i64,
    pub unit_price: Decimal,
    pub subtotal: Decimal,
}

/// Line subtotal: quantity x unit price
pub fn line_subtotal(quantity: i64, unit_price: Decimal) -> Decimal {
    Decimal::from(quantity) * unit_price
}

/// Sale totals computed from its lines
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaleTotals {
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub grand_total: Decimal,
}

/// Compute subtotal and grand total for a set of (quantity, unit_price)
/// lines. `grand_total = subtotal - discount`.
pub fn compute_sale_totals(lines: &[(i64, Decimal)], discount: Decimal) -> SaleTotals {
    let subtotal: Decimal = lines
        .iter()
        .map(|(qty, price)| line_subtotal(*qty, *price))
        .sum();
    SaleTotals {
        subtotal,
        discount,
        grand_total: subtotal - discount,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_line_subtotal() {
        assert_eq!(line_subtotal(3, dec("1000")), dec("3000"));
        assert_eq!(line_subtotal(0, dec("99.50")), Decimal::ZERO);
    }

    #[test]
    fn test_compute_sale_totals() {
        let lines = vec![(2, dec("1500")), (1, dec("250.50"))];
        let totals = compute_sale_totals(&lines, dec("100"));
        assert_eq!(totals.subtotal, dec("3250.50"));
        assert_eq!(totals.grand_total, dec("3150.50"));
    }

    #[test]
    fn test_compute_sale_totals_no_discount() {
        let totals = compute_sale_totals(&[(4, dec("25"))], Decimal::ZERO);
        assert_eq!(totals.subtotal, totals.grand_total);
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
}
