//! # Error Types
//!
//! Domain-specific error types for cartwise-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  cartwise-core errors (this file)                                      │
//! │  ├── CoreError        - Discount domain errors                         │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  cartwise-db errors (separate crate)                                   │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  cartwise-service errors                                               │
//! │  └── ApiError         - What the request layer sees (serialized)       │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → Caller       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core discount errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Discount cannot be found.
    #[error("Discount not found: {0}")]
    DiscountNotFound(i64),

    /// A capped discount has already been consumed `max_usage` times.
    ///
    /// ## When This Occurs
    /// - Recording usage for a discount sitting at its cap
    /// - Two checkouts racing for the last remaining use
    #[error("Discount {id} reached its usage limit of {max_usage}")]
    UsageLimitReached { id: i64, max_usage: i64 },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before anything is persisted, so a failed create or update never
/// leaves partial state behind.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustBeNonNegative { field: String },

    /// Invalid format (e.g. unparsable condition value, unknown kind).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// An update would put the usage cap below the uses already recorded.
    #[error("max_usage {max_usage} is below the current usage count {usage_count}")]
    CapBelowUsage { max_usage: i64, usage_count: i64 },

    /// The active window ends before it starts.
    #[error("start date {start} cannot be after end date {end}")]
    InvalidDateWindow {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

impl ValidationError {
    /// Creates an InvalidFormat error.
    pub fn invalid_format(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::InvalidFormat {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_error_messages() {
        let err = CoreError::UsageLimitReached {
            id: 7,
            max_usage: 5,
        };
        assert_eq!(err.to_string(), "Discount 7 reached its usage limit of 5");
        assert_eq!(CoreError::DiscountNotFound(3).to_string(), "Discount not found: 3");
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "name".to_string(),
        };
        assert_eq!(err.to_string(), "name is required");

        let start = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let err = ValidationError::InvalidDateWindow { start, end };
        assert!(err.to_string().starts_with("start date 2024-02-01"));
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::invalid_format("value", "not a number");
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
