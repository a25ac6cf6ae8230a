//! # Validation Module
//!
//! Discount validation rules, applied identically on create and update.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Request layer                                                │
//! │  └── Deserialization (types, enum labels)                              │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: DiscountService                                              │
//! │  └── THIS MODULE: window ordering, value ranges, usage cap             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / CHECK constraints                                      │
//! │  └── Foreign keys (conditions, products → discounts)                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use cartwise_core::validation::validate_date_window;
//! use chrono::{Duration, Utc};
//!
//! let start = Utc::now();
//! assert!(validate_date_window(start, start + Duration::days(1)).is_ok());
//! assert!(validate_date_window(start + Duration::days(1), start).is_err());
//! ```

use chrono::{DateTime, Utc};

use crate::error::ValidationError;
use crate::types::{Condition, Discount, DiscountKind, NewDiscount};
use crate::MAX_DISCOUNT_NAME_LEN;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Field Validators
// =============================================================================

/// Validates the active window.
///
/// ## Rules
/// - `start` must not be after `end` (equal is allowed: a one-instant window)
pub fn validate_date_window(start: DateTime<Utc>, end: DateTime<Utc>) -> ValidationResult<()> {
    if start > end {
        return Err(ValidationError::InvalidDateWindow { start, end });
    }
    Ok(())
}

/// Validates a discount display name.
///
/// ## Rules
/// - Must not be empty after trimming
/// - At most 255 characters
pub fn validate_discount_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.chars().count() > MAX_DISCOUNT_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: MAX_DISCOUNT_NAME_LEN,
        });
    }

    Ok(())
}

/// Validates a discount value against its kind.
///
/// ## Rules
/// - Must be finite and non-negative
/// - Percentage and MultiItem values are percentages: at most 100
pub fn validate_value(kind: DiscountKind, value: f64) -> ValidationResult<()> {
    if !value.is_finite() {
        return Err(ValidationError::invalid_format("value", "must be a finite number"));
    }

    if value < 0.0 {
        return Err(ValidationError::MustBeNonNegative {
            field: "value".to_string(),
        });
    }

    if matches!(kind, DiscountKind::Percentage | DiscountKind::MultiItem) && value > 100.0 {
        return Err(ValidationError::OutOfRange {
            field: "value".to_string(),
            min: 0,
            max: 100,
        });
    }

    Ok(())
}

/// Validates the usage cap (0 = unlimited).
pub fn validate_max_usage(max_usage: i64) -> ValidationResult<()> {
    if max_usage < 0 {
        return Err(ValidationError::MustBeNonNegative {
            field: "max_usage".to_string(),
        });
    }
    Ok(())
}

/// Validates a cap against the uses already consumed.
///
/// ## Rules
/// - A capped discount (`max_usage > 0`) cannot be capped below `usage_count`
pub fn validate_cap_against_usage(max_usage: i64, usage_count: i64) -> ValidationResult<()> {
    if max_usage > 0 && max_usage < usage_count {
        return Err(ValidationError::CapBelowUsage {
            max_usage,
            usage_count,
        });
    }
    Ok(())
}

/// Validates typed conditions.
///
/// ## Rules
/// - Minimum spend and minimum quantity must not be negative
pub fn validate_conditions(conditions: &[Condition]) -> ValidationResult<()> {
    for condition in conditions {
        match condition {
            Condition::CartTotal { minimum } if minimum.is_negative() => {
                return Err(ValidationError::MustBeNonNegative {
                    field: "CART_TOTAL".to_string(),
                });
            }
            Condition::MinQuantity { quantity } if *quantity < 0 => {
                return Err(ValidationError::MustBeNonNegative {
                    field: "MIN_QUANTITY".to_string(),
                });
            }
            _ => {}
        }
    }
    Ok(())
}

// =============================================================================
// Whole-Discount Validators
// =============================================================================

/// Validates a discount before it is created.
pub fn validate_new_discount(discount: &NewDiscount) -> ValidationResult<()> {
    validate_discount_name(&discount.name)?;
    validate_value(discount.kind, discount.value)?;
    validate_date_window(discount.start_date, discount.end_date)?;
    validate_max_usage(discount.max_usage)?;
    validate_conditions(&discount.conditions)?;
    Ok(())
}

/// Validates a discount after an update has been merged into it.
///
/// Same rules as creation, so an update can never produce a discount that
/// could not have been created, plus the cap must still cover recorded usage.
pub fn validate_discount(discount: &Discount) -> ValidationResult<()> {
    validate_discount_name(&discount.name)?;
    validate_value(discount.kind, discount.value)?;
    validate_date_window(discount.start_date, discount.end_date)?;
    validate_max_usage(discount.max_usage)?;
    validate_cap_against_usage(discount.max_usage, discount.usage_count)?;
    validate_conditions(&discount.conditions)?;
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;
    use chrono::Duration;

    #[test]
    fn test_validate_date_window() {
        let now = Utc::now();
        assert!(validate_date_window(now, now).is_ok());
        assert!(validate_date_window(now, now + Duration::hours(24)).is_ok());

        let err = validate_date_window(now + Duration::hours(1), now).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidDateWindow { .. }));
    }

    #[test]
    fn test_validate_discount_name() {
        assert!(validate_discount_name("Summer Sale").is_ok());
        assert!(validate_discount_name("").is_err());
        assert!(validate_discount_name("   ").is_err());
        assert!(validate_discount_name(&"A".repeat(256)).is_err());
        assert!(validate_discount_name(&"A".repeat(255)).is_ok());
    }

    #[test]
    fn test_validate_value() {
        assert!(validate_value(DiscountKind::Percentage, 10.0).is_ok());
        assert!(validate_value(DiscountKind::Percentage, 100.0).is_ok());
        assert!(validate_value(DiscountKind::Percentage, 100.5).is_err());
        assert!(validate_value(DiscountKind::MultiItem, 150.0).is_err());
        assert!(validate_value(DiscountKind::Fixed, 500.0).is_ok());
        assert!(validate_value(DiscountKind::Fixed, -1.0).is_err());
        assert!(validate_value(DiscountKind::Threshold, f64::NAN).is_err());
    }

    #[test]
    fn test_validate_max_usage() {
        assert!(validate_max_usage(0).is_ok());
        assert!(validate_max_usage(100).is_ok());
        assert!(validate_max_usage(-1).is_err());
    }

    #[test]
    fn test_validate_cap_against_usage() {
        assert!(validate_cap_against_usage(0, 40).is_ok());
        assert!(validate_cap_against_usage(5, 5).is_ok());
        assert!(matches!(
            validate_cap_against_usage(4, 5),
            Err(ValidationError::CapBelowUsage { .. })
        ));
    }

    #[test]
    fn test_validate_conditions() {
        assert!(validate_conditions(&[Condition::CartTotal {
            minimum: Money::from_cents(10000)
        }])
        .is_ok());
        assert!(validate_conditions(&[Condition::CartTotal {
            minimum: Money::from_cents(-1)
        }])
        .is_err());
        assert!(validate_conditions(&[Condition::MinQuantity { quantity: -2 }]).is_err());
    }

    #[test]
    fn test_validate_new_discount_rejects_inverted_window() {
        let now = Utc::now();
        let discount = NewDiscount::new(
            "Backwards",
            DiscountKind::Fixed,
            5.0,
            now + Duration::days(2),
            now,
        );
        assert!(matches!(
            validate_new_discount(&discount),
            Err(ValidationError::InvalidDateWindow { .. })
        ));
    }

    #[test]
    fn test_validate_merged_discount() {
        let now = Utc::now();
        let mut discount = NewDiscount::new("Ok", DiscountKind::Fixed, 5.0, now, now + Duration::days(1))
            .into_discount(1, now);
        assert!(validate_discount(&discount).is_ok());

        discount.end_date = now - Duration::days(1);
        assert!(validate_discount(&discount).is_err());
    }
}
