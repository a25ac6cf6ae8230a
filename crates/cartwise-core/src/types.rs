//! # Domain Types
//!
//! Core domain types used throughout Cartwise.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Discount     │   │    Condition    │   │   CartContext   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (i64)       │──►│  CartTotal      │   │  user_id?       │       │
//! │  │  kind, value    │   │  Membership     │   │  cart_total?    │       │
//! │  │  window         │   │  Category       │   │  product_ids    │       │
//! │  │  priority       │   │  MinQuantity    │   └─────────────────┘       │
//! │  │  stackable      │   └─────────────────┘                             │
//! │  │  usage / cap    │                                                    │
//! │  │  product_ids    │   ┌─────────────────┐   ┌─────────────────┐       │
//! │  └─────────────────┘   │  DiscountKind   │   │ MembershipTier  │       │
//! │                        │  PERCENTAGE ... │   │  BRONZE ...     │       │
//! │                        └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Persisted Text vs Typed Values
//! Conditions are stored as `(kind, value)` text pairs. They are parsed into
//! [`Condition`] variants once, when a row is loaded, so the rest of the
//! engine never compares strings or casts numbers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::{percent_to_ppm, Money};

// =============================================================================
// Discount Kind
// =============================================================================

/// Determines which formula a discount applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiscountKind {
    /// `value` percent off the running amount.
    Percentage,
    /// Flat `value` off the running amount.
    Fixed,
    /// Flat `value` off once a minimum spend is met.
    Threshold,
    /// Buy one, get one: pay for `ceil(quantity / 2)` units.
    Bogo,
    /// Every second unit costs `value` percent of the unit price.
    MultiItem,
}

impl DiscountKind {
    /// Persisted / wire label.
    pub const fn as_str(&self) -> &'static str {
        match self {
            DiscountKind::Percentage => "PERCENTAGE",
            DiscountKind::Fixed => "FIXED",
            DiscountKind::Threshold => "THRESHOLD",
            DiscountKind::Bogo => "BOGO",
            DiscountKind::MultiItem => "MULTI_ITEM",
        }
    }

    /// Quantity-based kinds recompute the amount from quantity and unit
    /// price instead of reducing the incoming amount.
    pub const fn is_quantity_based(&self) -> bool {
        matches!(self, DiscountKind::Bogo | DiscountKind::MultiItem)
    }
}

impl fmt::Display for DiscountKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DiscountKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PERCENTAGE" => Ok(DiscountKind::Percentage),
            "FIXED" => Ok(DiscountKind::Fixed),
            "THRESHOLD" => Ok(DiscountKind::Threshold),
            "BOGO" => Ok(DiscountKind::Bogo),
            "MULTI_ITEM" => Ok(DiscountKind::MultiItem),
            other => Err(ValidationError::invalid_format(
                "kind",
                format!("unknown discount kind '{}'", other),
            )),
        }
    }
}

// =============================================================================
// Membership Tier
// =============================================================================

/// Customer membership tier named by a `MEMBERSHIP_LEVEL` condition.
///
/// Labels outside the built-in ladder are kept verbatim (upper-cased) so a
/// store can introduce tiers without a code change.
/// Exported to TypeScript as a plain string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum MembershipTier {
    Bronze,
    Silver,
    Gold,
    Platinum,
    Other(String),
}

impl MembershipTier {
    /// Persisted label, e.g. `GOLD`.
    pub fn as_str(&self) -> &str {
        match self {
            MembershipTier::Bronze => "BRONZE",
            MembershipTier::Silver => "SILVER",
            MembershipTier::Gold => "GOLD",
            MembershipTier::Platinum => "PLATINUM",
            MembershipTier::Other(label) => label,
        }
    }
}

impl fmt::Display for MembershipTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<MembershipTier> for String {
    fn from(tier: MembershipTier) -> Self {
        tier.as_str().to_string()
    }
}

impl TryFrom<String> for MembershipTier {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl FromStr for MembershipTier {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let label = s.trim().to_ascii_uppercase();
        match label.as_str() {
            "" => Err(ValidationError::Required {
                field: "membership tier".to_string(),
            }),
            "BRONZE" => Ok(MembershipTier::Bronze),
            "SILVER" => Ok(MembershipTier::Silver),
            "GOLD" => Ok(MembershipTier::Gold),
            "PLATINUM" => Ok(MembershipTier::Platinum),
            _ => Ok(MembershipTier::Other(label)),
        }
    }
}

// =============================================================================
// Condition
// =============================================================================

/// Persisted condition kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConditionKind {
    CartTotal,
    MembershipLevel,
    ProductCategory,
    MinQuantity,
}

impl ConditionKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ConditionKind::CartTotal => "CART_TOTAL",
            ConditionKind::MembershipLevel => "MEMBERSHIP_LEVEL",
            ConditionKind::ProductCategory => "PRODUCT_CATEGORY",
            ConditionKind::MinQuantity => "MIN_QUANTITY",
        }
    }
}

impl FromStr for ConditionKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CART_TOTAL" => Ok(ConditionKind::CartTotal),
            "MEMBERSHIP_LEVEL" => Ok(ConditionKind::MembershipLevel),
            "PRODUCT_CATEGORY" => Ok(ConditionKind::ProductCategory),
            "MIN_QUANTITY" => Ok(ConditionKind::MinQuantity),
            other => Err(ValidationError::invalid_format(
                "condition kind",
                format!("unknown condition kind '{}'", other),
            )),
        }
    }
}

/// A predicate a cart must satisfy for a discount to qualify.
///
/// ## Serialization
/// ```json
/// { "kind": "CART_TOTAL", "minimum": 100000 }
/// { "kind": "MEMBERSHIP_LEVEL", "tier": "GOLD" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Condition {
    /// Cart total must be at least `minimum`.
    CartTotal { minimum: Money },
    /// Caller must hold `tier`.
    MembershipLevel {
        #[ts(as = "String")]
        tier: MembershipTier,
    },
    /// Cart must contain a product of `category`.
    ProductCategory { category: String },
    /// Cart must contain at least `quantity` units.
    MinQuantity { quantity: i64 },
}

impl Condition {
    /// The persisted kind of this condition.
    pub fn kind(&self) -> ConditionKind {
        match self {
            Condition::CartTotal { .. } => ConditionKind::CartTotal,
            Condition::MembershipLevel { .. } => ConditionKind::MembershipLevel,
            Condition::ProductCategory { .. } => ConditionKind::ProductCategory,
            Condition::MinQuantity { .. } => ConditionKind::MinQuantity,
        }
    }

    /// Parses a persisted `(kind, value)` pair.
    ///
    /// ## Example
    /// ```rust
    /// use cartwise_core::{Condition, Money};
    ///
    /// let condition = Condition::parse("CART_TOTAL", "1000").unwrap();
    /// assert_eq!(condition, Condition::CartTotal { minimum: Money::from_cents(100_000) });
    ///
    /// assert!(Condition::parse("MIN_QUANTITY", "two").is_err());
    /// ```
    pub fn parse(kind: &str, value: &str) -> Result<Self, ValidationError> {
        let value = value.trim();
        match kind.parse::<ConditionKind>()? {
            ConditionKind::CartTotal => {
                let amount: f64 = value.parse().map_err(|_| {
                    ValidationError::invalid_format("CART_TOTAL", format!("'{}' is not a number", value))
                })?;
                if !amount.is_finite() {
                    return Err(ValidationError::invalid_format("CART_TOTAL", "must be finite"));
                }
                Ok(Condition::CartTotal {
                    minimum: Money::from_decimal(amount),
                })
            }
            ConditionKind::MembershipLevel => Ok(Condition::MembershipLevel {
                tier: value.parse()?,
            }),
            ConditionKind::ProductCategory => {
                if value.is_empty() {
                    return Err(ValidationError::Required {
                        field: "PRODUCT_CATEGORY".to_string(),
                    });
                }
                Ok(Condition::ProductCategory {
                    category: value.to_string(),
                })
            }
            ConditionKind::MinQuantity => {
                let quantity: i64 = value.parse().map_err(|_| {
                    ValidationError::invalid_format(
                        "MIN_QUANTITY",
                        format!("'{}' is not an integer", value),
                    )
                })?;
                Ok(Condition::MinQuantity { quantity })
            }
        }
    }

    /// Text form written to the `value` column.
    pub fn value_text(&self) -> String {
        match self {
            Condition::CartTotal { minimum } => format!("{:.2}", minimum.to_decimal()),
            Condition::MembershipLevel { tier } => tier.as_str().to_string(),
            Condition::ProductCategory { category } => category.clone(),
            Condition::MinQuantity { quantity } => quantity.to_string(),
        }
    }
}

// =============================================================================
// Discount
// =============================================================================

/// A promotional rule reducing a price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Discount {
    /// Identifier assigned by the repository on creation.
    pub id: i64,

    /// Display label.
    pub name: String,

    /// Which formula applies.
    pub kind: DiscountKind,

    /// Formula parameter; meaning depends on `kind`.
    pub value: f64,

    /// First instant the discount is active.
    #[ts(as = "String")]
    pub start_date: DateTime<Utc>,

    /// Last instant the discount is active.
    #[ts(as = "String")]
    pub end_date: DateTime<Utc>,

    /// Lower value = higher precedence.
    pub priority: i32,

    /// Whether it may combine with other stackable discounts.
    pub stackable: bool,

    /// Usage cap; 0 = unlimited.
    pub max_usage: i64,

    /// Times consumed at checkout.
    pub usage_count: i64,

    pub conditions: Vec<Condition>,

    /// Product scope; empty = unscoped.
    pub product_ids: Vec<i64>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Discount {
    /// `start_date <= now <= end_date`.
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.start_date <= now && now <= self.end_date
    }

    /// False once a capped discount has been consumed `max_usage` times.
    pub fn has_remaining_usage(&self) -> bool {
        self.max_usage == 0 || self.usage_count < self.max_usage
    }

    /// Whether the usage ledger tracks this discount at all.
    #[inline]
    pub fn is_capped(&self) -> bool {
        self.max_usage > 0
    }

    /// Flat amount for Fixed / Threshold discounts.
    pub fn amount_off(&self) -> Money {
        Money::from_decimal(self.value)
    }

    /// Percentage for Percentage / MultiItem discounts, in parts per million.
    pub fn percent_ppm(&self) -> u32 {
        percent_to_ppm(self.value)
    }

    /// Smallest `CartTotal` minimum attached to this discount, if any.
    pub fn minimum_spend(&self) -> Option<Money> {
        self.conditions
            .iter()
            .filter_map(|c| match c {
                Condition::CartTotal { minimum } => Some(*minimum),
                _ => None,
            })
            .min()
    }

    /// Whether the product scope intersects `product_ids`.
    pub fn applies_to_any(&self, product_ids: &[i64]) -> bool {
        self.product_ids.iter().any(|id| product_ids.contains(id))
    }
}

/// Input for creating a discount. Usage starts at zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewDiscount {
    pub name: String,
    pub kind: DiscountKind,
    pub value: f64,
    #[ts(as = "String")]
    pub start_date: DateTime<Utc>,
    #[ts(as = "String")]
    pub end_date: DateTime<Utc>,
    #[serde(default)]
    pub priority: i32,
    #[serde(default)]
    pub stackable: bool,
    #[serde(default)]
    pub max_usage: i64,
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(default)]
    pub product_ids: Vec<i64>,
}

impl NewDiscount {
    /// Starts a discount with the given name, kind, value and window.
    /// Priority defaults to 0, non-stackable, unlimited usage.
    pub fn new(
        name: impl Into<String>,
        kind: DiscountKind,
        value: f64,
        start_date: DateTime<Utc>,
        end_date: DateTime<Utc>,
    ) -> Self {
        NewDiscount {
            name: name.into(),
            kind,
            value,
            start_date,
            end_date,
            priority: 0,
            stackable: false,
            max_usage: 0,
            conditions: Vec::new(),
            product_ids: Vec::new(),
        }
    }

    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn stackable(mut self, stackable: bool) -> Self {
        self.stackable = stackable;
        self
    }

    pub fn max_usage(mut self, max_usage: i64) -> Self {
        self.max_usage = max_usage;
        self
    }

    pub fn condition(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn product(mut self, product_id: i64) -> Self {
        self.product_ids.push(product_id);
        self
    }

    /// Materializes the discount with a repository-assigned id.
    pub fn into_discount(self, id: i64, now: DateTime<Utc>) -> Discount {
        Discount {
            id,
            name: self.name,
            kind: self.kind,
            value: self.value,
            start_date: self.start_date,
            end_date: self.end_date,
            priority: self.priority,
            stackable: self.stackable,
            max_usage: self.max_usage,
            usage_count: 0,
            conditions: self.conditions,
            product_ids: self.product_ids,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update. Only `Some` fields change; `conditions` and
/// `product_ids` replace the existing sets when supplied.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DiscountUpdate {
    pub name: Option<String>,
    pub kind: Option<DiscountKind>,
    pub value: Option<f64>,
    #[ts(as = "Option<String>")]
    pub start_date: Option<DateTime<Utc>>,
    #[ts(as = "Option<String>")]
    pub end_date: Option<DateTime<Utc>>,
    pub priority: Option<i32>,
    pub stackable: Option<bool>,
    pub max_usage: Option<i64>,
    pub conditions: Option<Vec<Condition>>,
    pub product_ids: Option<Vec<i64>>,
}

impl DiscountUpdate {
    /// Returns `current` with this update applied. Usage count and id are
    /// never touched; `updated_at` is stamped with `now`.
    pub fn merge_into(&self, current: &Discount, now: DateTime<Utc>) -> Discount {
        let mut merged = current.clone();
        if let Some(name) = &self.name {
            merged.name = name.clone();
        }
        if let Some(kind) = self.kind {
            merged.kind = kind;
        }
        if let Some(value) = self.value {
            merged.value = value;
        }
        if let Some(start) = self.start_date {
            merged.start_date = start;
        }
        if let Some(end) = self.end_date {
            merged.end_date = end;
        }
        if let Some(priority) = self.priority {
            merged.priority = priority;
        }
        if let Some(stackable) = self.stackable {
            merged.stackable = stackable;
        }
        if let Some(max_usage) = self.max_usage {
            merged.max_usage = max_usage;
        }
        if let Some(conditions) = &self.conditions {
            merged.conditions = conditions.clone();
        }
        if let Some(product_ids) = &self.product_ids {
            merged.product_ids = product_ids.clone();
        }
        merged.updated_at = now;
        merged
    }
}

// =============================================================================
// Cart Context
// =============================================================================

/// What the caller knows about the cart when asking for discounts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartContext {
    /// Identified customer, if any. Zero is read as anonymous.
    #[serde(default, deserialize_with = "deserialize_user_id")]
    pub user_id: Option<i64>,
    /// Current cart total, if the caller wants minimum-spend matching.
    pub cart_total: Option<Money>,
    /// Products in the cart; empty disables product-scope matching.
    #[serde(default)]
    pub product_ids: Vec<i64>,
}

impl CartContext {
    /// Builds a context from raw request values, where a zero user id and a
    /// non-positive total both mean "unspecified".
    ///
    /// ## Example
    /// ```rust
    /// use cartwise_core::{CartContext, Money};
    ///
    /// let ctx = CartContext::from_raw(0, Money::from_cents(15000), vec![]);
    /// assert_eq!(ctx.user_id, None);
    /// assert_eq!(ctx.cart_total, Some(Money::from_cents(15000)));
    ///
    /// let ctx = CartContext::from_raw(42, Money::zero(), vec![4]);
    /// assert_eq!(ctx.user_id, Some(42));
    /// assert_eq!(ctx.cart_total, None);
    /// ```
    pub fn from_raw(user_id: i64, cart_total: Money, product_ids: Vec<i64>) -> Self {
        CartContext {
            user_id: (user_id != 0).then_some(user_id),
            cart_total: cart_total.is_positive().then_some(cart_total),
            product_ids,
        }
    }

    /// Sets the customer; `0` clears it.
    pub fn with_user(mut self, user_id: i64) -> Self {
        self.user_id = (user_id != 0).then_some(user_id);
        self
    }

    pub fn with_cart_total(mut self, total: Money) -> Self {
        self.cart_total = total.is_positive().then_some(total);
        self
    }

    pub fn with_products(mut self, product_ids: Vec<i64>) -> Self {
        self.product_ids = product_ids;
        self
    }
}

fn deserialize_user_id<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let user_id = Option::<i64>::deserialize(deserializer)?;
    Ok(user_id.filter(|&id| id != 0))
}

// =============================================================================
// Unit Tests
// =============================================================================
