//! # Composition Engine
//!
//! Turns a ranked list of eligible discounts into a final amount.
//!
//! ## Policy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  ranked discounts                                                       │
//! │       │                                                                 │
//! │       ├── first non-stackable ──► reduce(starting_amount)  (at most 1) │
//! │       │                                │                                │
//! │       │                                ▼                                │
//! │       └── every stackable ──────► reduce(running) in ranked order      │
//! │                                        │                                │
//! │                                        ▼                                │
//! │                                   final amount                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Reducers
//! How one discount changes the running amount is a [`DiscountReducer`].
//!
//! - [`LiteralReducer`] (default): quantity-based kinds (BOGO, MultiItem)
//!   recompute the amount from the line and REPLACE the running amount,
//!   discarding earlier steps.
//! - [`CompoundingReducer`]: quantity-based kinds become the ratio
//!   `formula_total / (quantity * unit_price)` applied to the running amount.
//!
//! Amounts are not clamped: a large fixed discount can take the result
//! below zero.

use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::types::{Discount, DiscountKind};

// =============================================================================
// Line Items
// =============================================================================

/// Quantity inputs for the quantity-based kinds.
///
/// A negative quantity counts as zero units in every total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LineItems {
    pub quantity: i64,
    pub unit_price: Money,
}

impl LineItems {
    pub fn new(quantity: i64, unit_price: Money) -> Self {
        LineItems { quantity, unit_price }
    }

    /// `quantity * unit_price`.
    pub fn gross(&self) -> Money {
        self.unit_price.multiply_quantity(self.units())
    }

    fn units(&self) -> i64 {
        self.quantity.max(0)
    }

    /// Buy one, get one: pay for `ceil(quantity / 2)` units.
    ///
    /// ## Example
    /// ```rust
    /// use cartwise_core::{LineItems, Money};
    ///
    /// let line = LineItems::new(4, Money::from_cents(10000));
    /// assert_eq!(line.bogo_total().cents(), 20000);
    /// ```
    pub fn bogo_total(&self) -> Money {
        let paid_units = self.units() / 2 + self.units() % 2;
        self.unit_price.multiply_quantity(paid_units)
    }

    /// Odd units at full price, even units at `ppm` of the unit price.
    ///
    /// The reduced units are priced together and rounded once.
    ///
    /// ## Example
    /// ```rust
    /// use cartwise_core::{LineItems, Money};
    ///
    /// // 3 units at $100, every second one at 50%
    /// let line = LineItems::new(3, Money::from_cents(10000));
    /// assert_eq!(line.multi_item_total(500_000).cents(), 25000);
    /// ```
    pub fn multi_item_total(&self, ppm: u32) -> Money {
        let reduced_units = self.units() / 2;
        let full_units = self.units() - reduced_units;
        let full = self.unit_price.multiply_quantity(full_units);
        let reduced = self.unit_price.scale_ppm(reduced_units, ppm);
        Money::from_cents(full.cents().saturating_add(reduced.cents()))
    }
}

// =============================================================================
// Reducers
// =============================================================================

/// Applies one discount to a running amount.
pub trait DiscountReducer {
    fn reduce(&self, discount: &Discount, amount: Money, line: &LineItems) -> Money;
}

/// Per-kind formulas applied as written; quantity-based kinds overwrite.
#[derive(Debug, Clone, Copy, Default)]
pub struct LiteralReducer;

impl DiscountReducer for LiteralReducer {
    fn reduce(&self, discount: &Discount, amount: Money, line: &LineItems) -> Money {
        match discount.kind {
            DiscountKind::Percentage => amount.apply_percentage_discount(discount.percent_ppm()),
            DiscountKind::Fixed | DiscountKind::Threshold => amount - discount.amount_off(),
            DiscountKind::Bogo => line.bogo_total(),
            DiscountKind::MultiItem => line.multi_item_total(discount.percent_ppm()),
        }
    }
}

/// Like [`LiteralReducer`], but quantity-based kinds scale the running
/// amount instead of replacing it.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompoundingReducer;

impl DiscountReducer for CompoundingReducer {
    fn reduce(&self, discount: &Discount, amount: Money, line: &LineItems) -> Money {
        if !discount.kind.is_quantity_based() {
            return LiteralReducer.reduce(discount, amount, line);
        }
        let formula_total = LiteralReducer.reduce(discount, amount, line);
        // A zero gross gives no ratio; leave the amount alone
        amount
            .scale_ratio(formula_total, line.gross())
            .unwrap_or(amount)
    }
}

// =============================================================================
// Composition
// =============================================================================

/// One applied discount and the running amount around it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompositionStep {
    pub discount_id: i64,
    pub kind: DiscountKind,
    pub before: Money,
    pub after: Money,
}

/// Result of composing a ranked discount list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Composition {
    pub starting_amount: Money,
    pub final_amount: Money,
    /// Ids of the discounts that were applied, in application order.
    pub applied: Vec<i64>,
    pub steps: Vec<CompositionStep>,
}

impl Composition {
    /// `starting_amount - final_amount`.
    pub fn savings(&self) -> Money {
        self.starting_amount - self.final_amount
    }
}

/// Composes with the default [`LiteralReducer`].
pub fn compose(ranked: &[Discount], starting_amount: Money, line: &LineItems) -> Composition {
    compose_with(&LiteralReducer, ranked, starting_amount, line)
}

/// Composes with an explicit reducer.
///
/// `ranked` must already be in [`rank`](crate::ranking::rank) order; the
/// first non-stackable entry is the one applied.
pub fn compose_with<R>(
    reducer: &R,
    ranked: &[Discount],
    starting_amount: Money,
    line: &LineItems,
) -> Composition
where
    R: DiscountReducer + ?Sized,
{
    let best_exclusive = ranked.iter().find(|d| !d.stackable);
    let stackable = ranked.iter().filter(|d| d.stackable);

    let mut running = starting_amount;
    let mut steps = Vec::new();

    for discount in best_exclusive.into_iter().chain(stackable) {
        let after = reducer.reduce(discount, running, line);
        steps.push(CompositionStep {
            discount_id: discount.id,
            kind: discount.kind,
            before: running,
            after,
        });
        running = after;
    }

    Composition {
        starting_amount,
        final_amount: running,
        applied: steps.iter().map(|s| s.discount_id).collect(),
        steps,
    }
}

/// Final amount only, with the default reducer.
///
/// ## Example
/// ```rust
/// use cartwise_core::{apply, DiscountKind, Money, NewDiscount};
/// use chrono::{Duration, Utc};
///
/// let now = Utc::now();
/// let ten_off = NewDiscount::new("10%", DiscountKind::Percentage, 10.0, now, now + Duration::days(1))
///     .into_discount(1, now);
/// let total = apply(&[ten_off], Money::from_cents(20000), 1, Money::from_cents(20000));
/// assert_eq!(total.cents(), 18000);
/// ```
pub fn apply(ranked: &[Discount], starting_amount: Money, quantity: i64, unit_price: Money) -> Money {
    compose(ranked, starting_amount, &LineItems::new(quantity, unit_price)).final_amount
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ranking::rank;
    use crate::types::NewDiscount;
    use chrono::{Duration, Utc};

    fn discount(id: i64, kind: DiscountKind, value: f64, priority: i32, stackable: bool) -> Discount {
        let now = Utc::now();
        NewDiscount::new(format!("Discount {}", id), kind, value, now, now + Duration::days(1))
            .priority(priority)
            .stackable(stackable)
            .into_discount(id, now)
    }

    fn dollars(d: i64) -> Money {
        Money::from_cents(d * 100)
    }

    #[test]
    fn test_percentage() {
        let d = discount(1, DiscountKind::Percentage, 10.0, 1, false);
        assert_eq!(apply(&[d], dollars(200), 1, dollars(200)), dollars(180));
    }

    #[test]
    fn test_fixed() {
        let d = discount(1, DiscountKind::Fixed, 50.0, 1, false);
        assert_eq!(apply(&[d], dollars(200), 1, dollars(200)), dollars(150));
    }

    #[test]
    fn test_threshold() {
        let d = discount(1, DiscountKind::Threshold, 100.0, 1, false);
        assert_eq!(apply(&[d], dollars(1200), 1, dollars(1200)), dollars(1100));
    }

    #[test]
    fn test_bogo_overwrites_amount() {
        let d = discount(1, DiscountKind::Bogo, 1.0, 1, false);
        assert_eq!(apply(&[d.clone()], dollars(400), 4, dollars(100)), dollars(200));
        // Odd quantity pays for the rounded-up half
        assert_eq!(apply(&[d], dollars(500), 5, dollars(100)), dollars(300));
    }

    #[test]
    fn test_multi_item() {
        let d = discount(1, DiscountKind::MultiItem, 50.0, 1, false);
        assert_eq!(apply(&[d], dollars(300), 3, dollars(100)), dollars(250));
    }

    #[test]
    fn test_stacked_scenario() {
        let ranked = rank(vec![
            discount(3, DiscountKind::Fixed, 20.0, 3, true),
            discount(1, DiscountKind::Percentage, 15.0, 1, false),
            discount(2, DiscountKind::Percentage, 10.0, 2, true),
        ]);
        let composition = compose(&ranked, dollars(200), &LineItems::new(1, dollars(200)));

        assert_eq!(composition.final_amount, dollars(133));
        assert_eq!(composition.applied, vec![1, 2, 3]);
        let afters: Vec<i64> = composition.steps.iter().map(|s| s.after.cents()).collect();
        assert_eq!(afters, vec![17000, 15300, 13300]);
        assert_eq!(composition.savings(), dollars(67));
    }

    #[test]
    fn test_only_best_non_stackable_applies() {
        let ranked = rank(vec![
            discount(1, DiscountKind::Percentage, 50.0, 2, false),
            discount(2, DiscountKind::Fixed, 10.0, 1, false),
        ]);
        let composition = compose(&ranked, dollars(100), &LineItems::new(1, dollars(100)));
        assert_eq!(composition.applied, vec![2]);
        assert_eq!(composition.final_amount, dollars(90));
    }

    #[test]
    fn test_no_discounts_leaves_amount() {
        let composition = compose(&[], dollars(75), &LineItems::default());
        assert_eq!(composition.final_amount, dollars(75));
        assert!(composition.applied.is_empty());
        assert!(composition.steps.is_empty());
    }

    #[test]
    fn test_result_is_not_clamped() {
        let d = discount(1, DiscountKind::Fixed, 50.0, 1, false);
        assert_eq!(apply(&[d], dollars(20), 1, dollars(20)), dollars(-30));
    }

    #[test]
    fn test_literal_quantity_kind_discards_earlier_steps() {
        let ranked = rank(vec![
            discount(1, DiscountKind::Percentage, 10.0, 1, false),
            discount(2, DiscountKind::Bogo, 1.0, 2, true),
        ]);
        let line = LineItems::new(4, dollars(100));

        let literal = compose(&ranked, dollars(400), &line);
        assert_eq!(literal.steps[0].after, dollars(360));
        assert_eq!(literal.final_amount, dollars(200));

        let compounding = compose_with(&CompoundingReducer, &ranked, dollars(400), &line);
        assert_eq!(compounding.final_amount, dollars(180));
    }

    #[test]
    fn test_compounding_with_zero_gross_keeps_amount() {
        let d = discount(1, DiscountKind::MultiItem, 50.0, 1, true);
        let composition = compose_with(&CompoundingReducer, &[d], dollars(40), &LineItems::new(0, dollars(10)));
        assert_eq!(composition.final_amount, dollars(40));
    }

    #[test]
    fn test_line_totals() {
        let line = LineItems::new(0, dollars(100));
        assert_eq!(line.bogo_total(), Money::zero());
        assert_eq!(line.multi_item_total(500_000), Money::zero());
        assert_eq!(LineItems::new(1, dollars(100)).bogo_total(), dollars(100));
        assert_eq!(LineItems::new(2, dollars(100)).multi_item_total(250_000), dollars(125));
    }

    #[test]
    fn test_multi_item_rounds_once() {
        // 2 × 333 full + 2 × 333 at 50% = 666 + 333; per-unit rounding would give 1000
        let line = LineItems::new(4, Money::from_cents(333));
        assert_eq!(line.multi_item_total(500_000).cents(), 999);
    }

    #[test]
    fn test_fractional_percentage() {
        let d = discount(1, DiscountKind::Percentage, 12.345, 1, false);
        assert_eq!(apply(&[d], dollars(200), 1, dollars(200)).cents(), 17531);
    }

    #[test]
    fn test_negative_quantity_counts_as_zero() {
        let line = LineItems::new(-3, dollars(100));
        assert_eq!(line.gross(), Money::zero());
        assert_eq!(line.bogo_total(), Money::zero());
        assert_eq!(line.multi_item_total(500_000), Money::zero());

        let bogo = discount(1, DiscountKind::Bogo, 1.0, 1, false);
        let multi = discount(2, DiscountKind::MultiItem, 50.0, 1, false);
        assert_eq!(apply(&[bogo.clone()], dollars(50), -3, dollars(100)), Money::zero());
        assert_eq!(apply(&[multi], dollars(50), -3, dollars(100)), Money::zero());
        // No gross, so compounding leaves the amount alone
        let compounding = compose_with(&CompoundingReducer, &[bogo], dollars(50), &line);
        assert_eq!(compounding.final_amount, dollars(50));
    }

    #[test]
    fn test_huge_quantity_saturates() {
        let line = LineItems::new(i64::MAX, dollars(100));
        assert_eq!(line.gross().cents(), i64::MAX);
        assert_eq!(line.bogo_total().cents(), i64::MAX);
        assert_eq!(line.multi_item_total(500_000).cents(), i64::MAX);
    }
}
