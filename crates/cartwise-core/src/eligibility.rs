//! # Eligibility Filter
//!
//! Decides which discounts a cart qualifies for.
//!
//! ## Predicate Composition
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    EligibilityQuery::for_cart                           │
//! │                                                                         │
//! │  CartContext { user_id, cart_total, product_ids }  + MembershipPolicy  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ActiveAt(now)            ← always                                     │
//! │  Membership(tier)         ← user_id given (tier from policy)           │
//! │  MinimumSpend(total)      ← cart_total given                           │
//! │  ProductScope(ids)        ← product_ids non-empty                      │
//! │  UsageAvailable           ← always                                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  discount qualifies  ⇔  every predicate matches  (logical AND)         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The same predicate list is evaluated in memory by [`find_eligible`] and
//! rendered into SQL clauses by the SQLite repository, so both stores agree.

use chrono::{DateTime, Utc};
use std::collections::HashMap;

use crate::money::Money;
use crate::types::{CartContext, Condition, Discount, MembershipTier};

// =============================================================================
// Membership Policy
// =============================================================================

/// Resolves which tier an identified caller holds.
///
/// Tier resolution belongs to whoever owns customer data; this policy is the
/// configuration handed in by the caller. The default matches every
/// identified user against `GOLD`.
///
/// ## Example
/// ```rust
/// use cartwise_core::{MembershipPolicy, MembershipTier};
///
/// let policy = MembershipPolicy::fixed(MembershipTier::Silver)
///     .with_override(42, MembershipTier::Platinum);
/// assert_eq!(policy.resolve(42), Some(MembershipTier::Platinum));
/// assert_eq!(policy.resolve(7), Some(MembershipTier::Silver));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MembershipPolicy {
    /// Tier assumed for users without an override.
    pub default_tier: Option<MembershipTier>,
    /// Per-user tiers.
    pub overrides: HashMap<i64, MembershipTier>,
}

impl MembershipPolicy {
    /// Every identified user holds `tier`.
    pub fn fixed(tier: MembershipTier) -> Self {
        MembershipPolicy {
            default_tier: Some(tier),
            overrides: HashMap::new(),
        }
    }

    /// Only users with an explicit override hold a tier.
    pub fn overrides_only() -> Self {
        MembershipPolicy {
            default_tier: None,
            overrides: HashMap::new(),
        }
    }

    pub fn with_override(mut self, user_id: i64, tier: MembershipTier) -> Self {
        self.overrides.insert(user_id, tier);
        self
    }

    /// Returns the caller's tier, if any.
    pub fn resolve(&self, user_id: i64) -> Option<MembershipTier> {
        self.overrides
            .get(&user_id)
            .cloned()
            .or_else(|| self.default_tier.clone())
    }
}

impl Default for MembershipPolicy {
    fn default() -> Self {
        MembershipPolicy::fixed(MembershipTier::Gold)
    }
}

// =============================================================================
// Predicates
// =============================================================================

/// One independent eligibility criterion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// `start_date <= now <= end_date`.
    ActiveAt(DateTime<Utc>),
    /// Requires a `MEMBERSHIP_LEVEL` condition naming this tier.
    Membership(MembershipTier),
    /// The caller is identified but the policy gives them no tier.
    /// Matches nothing.
    MembershipUnresolved,
    /// Requires a `CART_TOTAL` condition whose minimum is at most this total.
    MinimumSpend(Money),
    /// Requires the product scope to intersect these ids.
    ProductScope(Vec<i64>),
    /// Drops capped discounts that reached their cap.
    UsageAvailable,
}

impl Predicate {
    /// Evaluates the predicate against one discount.
    pub fn matches(&self, discount: &Discount) -> bool {
        match self {
            Predicate::ActiveAt(now) => discount.is_active_at(*now),
            Predicate::Membership(tier) => discount.conditions.iter().any(|c| {
                matches!(c, Condition::MembershipLevel { tier: required } if required == tier)
            }),
            Predicate::MembershipUnresolved => false,
            Predicate::MinimumSpend(total) => discount.conditions.iter().any(|c| {
                matches!(c, Condition::CartTotal { minimum } if minimum <= total)
            }),
            Predicate::ProductScope(ids) => discount.applies_to_any(ids),
            Predicate::UsageAvailable => discount.has_remaining_usage(),
        }
    }
}

// =============================================================================
// Eligibility Query
// =============================================================================

/// An AND-composed list of predicates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EligibilityQuery {
    predicates: Vec<Predicate>,
}

impl EligibilityQuery {
    /// A query holding only the always-on predicates.
    pub fn new(now: DateTime<Utc>) -> Self {
        EligibilityQuery {
            predicates: vec![Predicate::ActiveAt(now), Predicate::UsageAvailable],
        }
    }

    /// Builds the query for a cart.
    ///
    /// ## Example
    /// ```rust
    /// use cartwise_core::{CartContext, EligibilityQuery, MembershipPolicy, Money, Predicate};
    /// use chrono::Utc;
    ///
    /// let ctx = CartContext::default().with_cart_total(Money::from_cents(15000));
    /// let query = EligibilityQuery::for_cart(&ctx, &MembershipPolicy::default(), Utc::now());
    /// assert!(query
    ///     .predicates()
    ///     .contains(&Predicate::MinimumSpend(Money::from_cents(15000))));
    /// assert_eq!(query.predicates().len(), 3);
    /// ```
    pub fn for_cart(ctx: &CartContext, policy: &MembershipPolicy, now: DateTime<Utc>) -> Self {
        let mut query = EligibilityQuery::new(now);

        if let Some(user_id) = ctx.user_id {
            query.push(match policy.resolve(user_id) {
                Some(tier) => Predicate::Membership(tier),
                None => Predicate::MembershipUnresolved,
            });
        }

        if let Some(total) = ctx.cart_total {
            query.push(Predicate::MinimumSpend(total));
        }

        if !ctx.product_ids.is_empty() {
            query.push(Predicate::ProductScope(ctx.product_ids.clone()));
        }

        query
    }

    /// Adds a predicate (ANDed with the rest).
    pub fn push(&mut self, predicate: Predicate) {
        self.predicates.push(predicate);
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    /// True when every predicate matches.
    pub fn matches(&self, discount: &Discount) -> bool {
        self.predicates.iter().all(|p| p.matches(discount))
    }
}

/// Keeps the discounts that satisfy every predicate, in input order.
pub fn find_eligible<I>(discounts: I, query: &EligibilityQuery) -> Vec<Discount>
where
    I: IntoIterator<Item = Discount>,
{
    discounts.into_iter().filter(|d| query.matches(d)).collect()
}

// =============================================================================
// Unit Tests
// =============================================================================
