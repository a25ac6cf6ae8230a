//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  STACKED DISCOUNTS ON FLOATS                                            │
//! │                                                                         │
//! │    200.0 * 0.85 * 0.90 - 20.0  → 133.00000000000003 on some paths  ❌  │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents                                            │
//! │    20000 → 17000 → 15300 → 13300 cents  (rounded once per step)        │
//! │    rates in parts per million: 12.345% = 123_450 ppm, exact            │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Discount values and condition thresholds arrive as decimals (they are
//! stored as `REAL`/text). They are converted exactly once, at the data-model
//! boundary, through [`Money::from_decimal`] and [`percent_to_ppm`].
//!
//! ## Usage
//! ```rust
//! use cartwise_core::money::Money;
//!
//! let price = Money::from_cents(1099); // $10.99
//! let doubled = price * 2;            // $21.98
//! let total = price + Money::from_cents(500); // $15.99
//! assert_eq!(total.cents(), 1599);
//! assert_eq!(doubled.cents(), 2198);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

/// Parts per million in 100%.
pub const PPM_PER_UNIT: i64 = 1_000_000;

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in the smallest currency unit (cents).
///
/// ## Design Decisions
/// - **i64 (signed)**: composed discounts are not clamped, so a running
///   amount may legitimately drop below zero
/// - **Single field tuple struct**: Zero-cost abstraction over i64
///
/// ## Where Money is Used
/// ```text
/// CartContext.cart_total ──► CartTotal condition check (eligibility)
///
/// starting amount ──► non-stackable step ──► stackable steps ──► final amount
///                     (composition engine, one rounding per step)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    ///
    /// ## Example
    /// ```rust
    /// use cartwise_core::money::Money;
    ///
    /// let price = Money::from_cents(1099); // Represents $10.99
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Converts a decimal amount in major units into Money.
    ///
    /// Rounds half away from zero to the nearest cent. This is the only
    /// place a float becomes Money; use it when reading discount values and
    /// persisted condition thresholds.
    ///
    /// ## Example
    /// ```rust
    /// use cartwise_core::money::Money;
    ///
    /// assert_eq!(Money::from_decimal(50.0).cents(), 5000);
    /// assert_eq!(Money::from_decimal(0.125).cents(), 13);
    /// assert_eq!(Money::from_decimal(-2.5).cents(), -250);
    /// ```
    pub fn from_decimal(amount: f64) -> Self {
        Money((amount * 100.0).round() as i64)
    }

    /// Returns the value in major units as a decimal (for display and
    /// persistence only, never for arithmetic).
    #[inline]
    pub fn to_decimal(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Returns the value in cents (smallest currency unit).
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit (dollars) portion.
    ///
    /// ## Example
    /// ```rust
    /// use cartwise_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(1099).dollars(), 10);
    /// assert_eq!(Money::from_cents(-550).dollars(), -5);
    /// ```
    #[inline]
    pub const fn dollars(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit (cents) portion (always 0-99).
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Multiplies money by a quantity, saturating at the i64 range.
    ///
    /// ## Example
    /// ```rust
    /// use cartwise_core::money::Money;
    ///
    /// let unit_price = Money::from_cents(299); // $2.99
    /// assert_eq!(unit_price.multiply_quantity(3).cents(), 897);
    /// assert_eq!(unit_price.multiply_quantity(i64::MAX).cents(), i64::MAX);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0.saturating_mul(qty))
    }

    /// `units * self * ppm / 1_000_000`, rounded once to the nearest cent.
    ///
    /// Used for "every second item at N%" pricing, where the rate applies
    /// to the sum of the reduced units rather than to each unit.
    ///
    /// ## Example
    /// ```rust
    /// use cartwise_core::money::Money;
    ///
    /// // 3 units of $0.99 at 50%: 148.5 → 149 cents, not 3 × 50
    /// assert_eq!(Money::from_cents(99).scale_ppm(3, 500_000).cents(), 149);
    /// ```
    pub fn scale_ppm(&self, units: i64, ppm: u32) -> Money {
        let num = (self.0 as i128)
            .saturating_mul(units as i128)
            .saturating_mul(ppm as i128);
        Money::from_wide(round_div(num, PPM_PER_UNIT as i128))
    }

    /// Applies a percentage discount and returns the discounted amount.
    ///
    /// ## Arguments
    /// * `discount_ppm` - Discount in parts per million (100_000 = 10%)
    ///
    /// ## Example
    /// ```rust
    /// use cartwise_core::money::Money;
    ///
    /// let subtotal = Money::from_cents(10000); // $100.00
    /// let discounted = subtotal.apply_percentage_discount(100_000); // 10% off
    /// assert_eq!(discounted.cents(), 9000); // $90.00
    /// ```
    pub fn apply_percentage_discount(&self, discount_ppm: u32) -> Money {
        let remaining = PPM_PER_UNIT as i128 - discount_ppm as i128;
        Money::from_wide(round_div(self.0 as i128 * remaining, PPM_PER_UNIT as i128))
    }

    /// Scales the amount by the ratio `numerator / denominator`.
    ///
    /// Returns `None` when the denominator is zero.
    ///
    /// ## Example
    /// ```rust
    /// use cartwise_core::money::Money;
    ///
    /// let running = Money::from_cents(36000);
    /// let scaled = running
    ///     .scale_ratio(Money::from_cents(20000), Money::from_cents(40000))
    ///     .unwrap();
    /// assert_eq!(scaled.cents(), 18000);
    /// ```
    pub fn scale_ratio(&self, numerator: Money, denominator: Money) -> Option<Money> {
        if denominator.is_zero() {
            return None;
        }
        let num = self.0 as i128 * numerator.0 as i128;
        Some(Money::from_wide(round_div(num, denominator.0 as i128)))
    }

    /// Narrows an intermediate i128 result, saturating at the i64 range.
    fn from_wide(cents: i128) -> Money {
        Money(cents.clamp(i64::MIN as i128, i64::MAX as i128) as i64)
    }
}

/// `num / den` rounded half away from zero. `den` must be non-zero.
fn round_div(num: i128, den: i128) -> i128 {
    let half = den.abs() / 2;
    let adjusted = if (num < 0) != (den < 0) {
        num.saturating_sub(half)
    } else {
        num.saturating_add(half)
    };
    adjusted / den
}

/// Converts a decimal percentage (10.0 = 10%) into parts per million.
///
/// Four decimal places of a percentage survive exactly. Negative inputs
/// clamp to zero; validation rejects them earlier.
///
/// ## Example
/// ```rust
/// use cartwise_core::money::percent_to_ppm;
///
/// assert_eq!(percent_to_ppm(10.0), 100_000);
/// assert_eq!(percent_to_ppm(12.345), 123_450);
/// ```
pub fn percent_to_ppm(pct: f64) -> u32 {
    (pct * 10_000.0).round().clamp(0.0, u32::MAX as f64) as u32
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Human-readable form for logs and debugging.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(
            f,
            "{}${}.{:02}",
            sign,
            self.dollars().abs(),
            self.cents_part()
        )
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

/// Multiplication by i64 (for quantity calculations).
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        self.multiply_quantity(qty)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
