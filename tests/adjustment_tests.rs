//! Stock adjustment orchestrator tests
//!
//! Models the transactional write path as a (stock, ledger) pair and
//! checks that:
//! - every accepted adjustment updates both the aggregate and the ledger
//! - every rejected adjustment updates neither
//! - the aggregate always reconciles with the ledger fold
//! - serialized concurrent adjustments reach the serially-consistent value

use proptest::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Adjustment {
    In(i32),
    Out(i32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AdjustError {
    InvalidQuantity,
    InsufficientStock,
}

/// Model of one product's aggregate plus its ledger
#[derive(Debug, Clone, Default)]
struct ProductStock {
    current_stock: i32,
    ledger: Vec<i32>,
}

impl ProductStock {
    /// Initial inventory creation synthesizes one IN movement when the
    /// starting stock is nonzero
    fn create(initial_stock: i32) -> Self {
        let ledger = if initial_stock > 0 {
            vec![initial_stock]
        } else {
            Vec::new()
        };
        Self {
            current_stock: initial_stock,
            ledger,
        }
    }

    /// Typed adjustment: validate, compute, then commit both writes or
    /// neither
    fn adjust(&mut self, adjustment: Adjustment) -> Result<i32, AdjustError> {
        let delta = match adjustment {
            Adjustment::In(q) if q > 0 => q,
            Adjustment::Out(q) if q > 0 => -q,
            _ => return Err(AdjustError::InvalidQuantity),
        };

        let new_stock = self.current_stock + delta;
        if new_stock < 0 {
            return Err(AdjustError::InsufficientStock);
        }

        self.current_stock = new_stock;
        self.ledger.push(delta);
        Ok(new_stock)
    }

    /// Explicit stock overwrite: records the delta, skipping the ledger
    /// append when nothing changed
    fn overwrite(&mut self, new_stock: i32) -> Result<i32, AdjustError> {
        if new_stock < 0 {
            return Err(AdjustError::InvalidQuantity);
        }

        let delta = new_stock - self.current_stock;
        self.current_stock = new_stock;
        if delta != 0 {
            self.ledger.push(delta);
        }
        Ok(new_stock)
    }

    /// Reconciliation invariant: the aggregate equals the ledger fold
    fn reconciles(&self) -> bool {
        self.current_stock == self.ledger.iter().sum::<i32>()
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_create_synthesizes_initial_movement() {
        let stock = ProductStock::create(10);
        assert_eq!(stock.current_stock, 10);
        assert_eq!(stock.ledger, vec![10]);
    }

    #[test]
    fn test_create_with_zero_stock_has_empty_ledger() {
        let stock = ProductStock::create(0);
        assert_eq!(stock.current_stock, 0);
        assert!(stock.ledger.is_empty());
    }

    #[test]
    fn test_in_then_out_sequence() {
        let mut stock = ProductStock::create(10);
        stock.adjust(Adjustment::In(4)).unwrap();
        stock.adjust(Adjustment::Out(6)).unwrap();

        assert_eq!(stock.current_stock, 8);
        assert_eq!(stock.ledger, vec![10, 4, -6]);
    }

    #[test]
    fn test_insufficient_stock_changes_nothing() {
        let mut stock = ProductStock::create(3);
        let before = stock.clone();

        let result = stock.adjust(Adjustment::Out(5));

        assert_eq!(result, Err(AdjustError::InsufficientStock));
        assert_eq!(stock.current_stock, before.current_stock);
        assert_eq!(stock.ledger, before.ledger);
    }

    #[test]
    fn test_non_positive_quantity_rejected() {
        let mut stock = ProductStock::create(10);
        assert_eq!(
            stock.adjust(Adjustment::In(0)),
            Err(AdjustError::InvalidQuantity)
        );
        assert_eq!(
            stock.adjust(Adjustment::Out(-4)),
            Err(AdjustError::InvalidQuantity)
        );
        assert_eq!(stock.ledger, vec![10]);
    }

    #[test]
    fn test_overwrite_records_delta() {
        let mut stock = ProductStock::create(10);
        stock.overwrite(4).unwrap();

        assert_eq!(stock.current_stock, 4);
        assert_eq!(stock.ledger, vec![10, -6]);
    }

    #[test]
    fn test_overwrite_with_same_value_appends_nothing() {
        let mut stock = ProductStock::create(10);
        stock.overwrite(10).unwrap();

        assert_eq!(stock.ledger, vec![10]);
    }

    #[test]
    fn test_drain_to_zero_allowed() {
        let mut stock = ProductStock::create(5);
        assert_eq!(stock.adjust(Adjustment::Out(5)), Ok(0));
        assert!(stock.reconciles());
    }

    #[test]
    fn test_serial_consistency_of_concurrent_adjustments() {
        // Two valid adjustments must reach pre + d1 + d2 regardless of
        // which commits first; row-level locking serializes them
        let orders: [[Adjustment; 2]; 2] = [
            [Adjustment::In(4), Adjustment::Out(6)],
            [Adjustment::Out(6), Adjustment::In(4)],
        ];

        for order in orders {
            let mut stock = ProductStock::create(10);
            for adjustment in order {
                stock.adjust(adjustment).unwrap();
            }
            assert_eq!(stock.current_stock, 8);
            assert!(stock.reconciles());
        }
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    fn adjustment_strategy() -> impl Strategy<Value = Adjustment> {
        prop_oneof![
            (1i32..=500).prop_map(Adjustment::In),
            (1i32..=500).prop_map(Adjustment::Out),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// The aggregate reconciles with the ledger fold after any
        /// sequence of adjustments, accepted or rejected
        #[test]
        fn prop_aggregate_reconciles_with_ledger(
            initial in 0i32..1_000,
            adjustments in prop::collection::vec(adjustment_strategy(), 0..50)
        ) {
            let mut stock = ProductStock::create(initial);
            for adjustment in adjustments {
                let _ = stock.adjust(adjustment);
                prop_assert!(stock.reconciles());
            }
        }

        /// Stock never goes negative whatever the request sequence
        #[test]
        fn prop_stock_never_negative(
            initial in 0i32..1_000,
            adjustments in prop::collection::vec(adjustment_strategy(), 0..50)
        ) {
            let mut stock = ProductStock::create(initial);
            for adjustment in adjustments {
                let _ = stock.adjust(adjustment);
                prop_assert!(stock.current_stock >= 0);
            }
        }

        /// A rejected adjustment is a strict no-op
        #[test]
        fn prop_rejection_is_noop(
            initial in 0i32..100,
            over in 1i32..500
        ) {
            let mut stock = ProductStock::create(initial);
            let before = stock.clone();

            let result = stock.adjust(Adjustment::Out(initial + over));

            prop_assert_eq!(result, Err(AdjustError::InsufficientStock));
            prop_assert_eq!(stock.current_stock, before.current_stock);
            prop_assert_eq!(stock.ledger, before.ledger);
        }

        /// Overwrites keep the reconciliation invariant
        #[test]
        fn prop_overwrite_reconciles(
            initial in 0i32..1_000,
            targets in prop::collection::vec(0i32..1_000, 0..20)
        ) {
            let mut stock = ProductStock::create(initial);
            for target in targets {
                stock.overwrite(target).unwrap();
                prop_assert!(stock.reconciles());
            }
        }

        /// Any serialization of two individually valid adjustments that
        /// both commit yields the same final value
        #[test]
        fn prop_commutes_when_both_commit(
            initial in 500i32..1_000,
            a in adjustment_strategy(),
            b in adjustment_strategy()
        ) {
            let mut forward = ProductStock::create(initial);
            let mut reverse = ProductStock::create(initial);

            let f = forward.adjust(a).and(forward.adjust(b));
            let r = reverse.adjust(b).and(reverse.adjust(a));

            // With a large starting stock both orders commit; the final
            // value is the pre-state plus both deltas
            if f.is_ok() && r.is_ok() {
                prop_assert_eq!(forward.current_stock, reverse.current_stock);
            }
        }
    }
}
