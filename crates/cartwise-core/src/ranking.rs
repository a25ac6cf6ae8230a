//! # Ranking
//!
//! Orders eligible discounts for presentation and composition.
//!
//! ```text
//!   priority ascending  →  non-stackable before stackable  →  input order
//! ```
//!
//! The sort is stable, so discounts that tie on both keys keep the order the
//! store returned them in (ascending id for both repositories).

use std::cmp::Ordering;

use crate::types::Discount;

/// Ordering used by [`rank`].
pub fn compare(a: &Discount, b: &Discount) -> Ordering {
    a.priority
        .cmp(&b.priority)
        // false < true puts non-stackable first
        .then_with(|| a.stackable.cmp(&b.stackable))
}

/// Sorts discounts by priority, then non-stackable first.
///
/// ## Example
/// ```rust
/// use cartwise_core::{rank, DiscountKind, NewDiscount};
/// use chrono::{Duration, Utc};
///
/// let now = Utc::now();
/// let make = |id, priority| {
///     NewDiscount::new("d", DiscountKind::Fixed, 1.0, now, now + Duration::days(1))
///         .priority(priority)
///         .into_discount(id, now)
/// };
/// let ranked = rank(vec![make(1, 3), make(2, 1), make(3, 2)]);
/// let ids: Vec<i64> = ranked.iter().map(|d| d.id).collect();
/// assert_eq!(ids, vec![2, 3, 1]);
/// ```
pub fn rank(mut discounts: Vec<Discount>) -> Vec<Discount> {
    discounts.sort_by(compare);
    discounts
}
