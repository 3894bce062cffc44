//! Inventory aggregate tests
//!
//! Models the aggregate-manager rules and checks:
//! - the non-negative stock invariant
//! - low-stock detection and criticality ranking (including min_stock = 0)
//! - total stock value computation
//! - delete preconditions

use proptest::prelude::*;
use rust_decimal::Decimal;
use std::str::FromStr;

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

/// Criticality key used to rank low-stock items: zero-minimum items sort
/// first, everything else by stock-to-min ratio ascending.
fn criticality(current_stock: i32, min_stock: i32) -> Decimal {
    if min_stock == 0 {
        Decimal::ZERO
    } else {
        Decimal::from(current_stock) / Decimal::from(min_stock)
    }
}

fn is_low_stock(current_stock: i32, min_stock: i32) -> bool {
    current_stock <= min_stock
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_low_stock_detection() {
        assert!(is_low_stock(5, 5));
        assert!(is_low_stock(0, 5));
        assert!(!is_low_stock(6, 5));
    }

    #[test]
    fn test_out_of_stock_is_low_stock_with_zero_min() {
        // min_stock = 0, current_stock = 0 must be included, not skipped
        assert!(is_low_stock(0, 0));
    }

    #[test]
    fn test_zero_min_stock_ranks_most_critical() {
        // No division fault, and nothing can rank below it
        let zero_min = criticality(0, 0);
        assert_eq!(zero_min, Decimal::ZERO);

        let almost_out = criticality(1, 100);
        assert!(zero_min <= almost_out);
    }

    #[test]
    fn test_criticality_ordering() {
        // 1/10 is more critical than 5/10 which is more critical than 10/10
        let a = criticality(1, 10);
        let b = criticality(5, 10);
        let c = criticality(10, 10);
        assert!(a < b && b < c);
    }

    #[test]
    fn test_total_stock_value() {
        let items = [(10, dec("2.50")), (4, dec("12.00")), (0, dec("99.99"))];

        let total: Decimal = items
            .iter()
            .map(|(stock, cost)| Decimal::from(*stock) * cost)
            .sum();

        // 25.00 + 48.00 + 0
        assert_eq!(total, dec("73.00"));
    }

    #[test]
    fn test_total_stock_value_empty_inventory() {
        let items: Vec<(i32, Decimal)> = vec![];
        let total: Decimal = items
            .iter()
            .map(|(stock, cost)| Decimal::from(*stock) * cost)
            .sum();

        // Empty inventory is worth zero, not an error
        assert_eq!(total, Decimal::ZERO);
    }

    #[test]
    fn test_delete_blocked_by_current_stock() {
        let can_delete = |current_stock: i32| current_stock == 0;

        assert!(!can_delete(5));
        assert!(can_delete(0));
    }

    #[test]
    fn test_low_stock_summary_ordering() {
        // Categories sort by low-stock count descending
        let mut summary = vec![("Anesthetics", 2i64), ("Gloves", 7), ("Composites", 4)];
        summary.sort_by(|a, b| b.1.cmp(&a.1));

        let names: Vec<&str> = summary.iter().map(|(name, _)| *name).collect();
        assert_eq!(names, ["Gloves", "Composites", "Anesthetics"]);
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Criticality never faults, whatever min_stock is
        #[test]
        fn prop_criticality_total(current in 0i32..10_000, min in 0i32..10_000) {
            let value = criticality(current, min);
            prop_assert!(value >= Decimal::ZERO);
        }

        /// A low-stock item with zero minimum ranks at least as critical
        /// as any other low-stock item
        #[test]
        fn prop_zero_min_is_maximally_critical(current in 0i32..10_000, min in 1i32..10_000) {
            prop_assert!(criticality(0, 0) <= criticality(current, min));
        }

        /// Low-stock membership matches the defining inequality
        #[test]
        fn prop_low_stock_membership(current in 0i32..10_000, min in 0i32..10_000) {
            prop_assert_eq!(is_low_stock(current, min), current <= min);
        }

        /// Total value is monotone in stock quantity
        #[test]
        fn prop_value_monotone_in_stock(
            stock in 0i32..10_000,
            extra in 1i32..1_000,
            cost_cents in 1i64..1_000_000
        ) {
            let cost = Decimal::new(cost_cents, 2);
            let value = Decimal::from(stock) * cost;
            let bigger = Decimal::from(stock + extra) * cost;
            prop_assert!(bigger > value);
        }
    }
}
