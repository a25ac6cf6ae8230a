//! # Service Error Types
//!
//! [`ServiceError`] is what [`DiscountService`](crate::DiscountService)
//! returns; [`ApiError`] is what a transport layer hands to its caller.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  ValidationError ──┐                                                    │
//! │  CoreError ────────┼──► ServiceError ──► ApiError { code, message }    │
//! │  DbError ──────────┘         │                   │                      │
//! │                              │                   ▼                      │
//! │        UsageLimitReached,    │         { "code": "CONFLICT",            │
//! │        CapBelowUsage and     │           "message": "..." }             │
//! │        NotFound are lifted   ▼                                          │
//! │                        matched by callers                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Storage failures are logged here and replaced by a generic message so
//! SQL text never reaches a client.

use serde::Serialize;
use thiserror::Error;

use cartwise_core::{CoreError, ValidationError};
use cartwise_db::DbError;

// =============================================================================
// Service Error
// =============================================================================

/// Errors returned by discount operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Input rejected before anything was persisted.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// No discount with this id.
    #[error("Discount not found: {0}")]
    NotFound(i64),

    /// A capped discount had no remaining uses; nothing was recorded.
    #[error("Discount {id} reached its usage limit of {max_usage}")]
    UsageLimitReached { id: i64, max_usage: i64 },

    /// Storage failure.
    #[error("Database error: {0}")]
    Db(DbError),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl From<DbError> for ServiceError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::UsageLimitReached { id, max_usage } => {
                ServiceError::UsageLimitReached { id, max_usage }
            }
            DbError::CapBelowUsage {
                max_usage,
                usage_count,
                ..
            } => ServiceError::Validation(ValidationError::CapBelowUsage {
                max_usage,
                usage_count,
            }),
            DbError::NotFound { entity, id } => match id.parse::<i64>() {
                Ok(discount_id) if entity == "Discount" => ServiceError::NotFound(discount_id),
                _ => ServiceError::Db(DbError::NotFound { entity, id }),
            },
            other => ServiceError::Db(other),
        }
    }
}

impl From<CoreError> for ServiceError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::DiscountNotFound(id) => ServiceError::NotFound(id),
            CoreError::UsageLimitReached { id, max_usage } => {
                ServiceError::UsageLimitReached { id, max_usage }
            }
            CoreError::Validation(e) => ServiceError::Validation(e),
        }
    }
}

// =============================================================================
// API Error
// =============================================================================

/// Serializable error handed to callers.
///
/// ## Serialization
/// ```json
/// {
///   "code": "NOT_FOUND",
///   "message": "Discount not found: 42"
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Input validation failed (400)
    ValidationError,

    /// Discount not found (404)
    NotFound,

    /// Usage limit reached (409)
    Conflict,

    /// Database operation failed (500)
    DatabaseError,

    /// Internal server error (500)
    Internal,
}

impl ErrorCode {
    /// Whether the caller can fix the request and retry.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ErrorCode::ValidationError | ErrorCode::NotFound | ErrorCode::Conflict
        )
    }

    /// Suggested HTTP status for transports that speak HTTP.
    pub fn http_status(&self) -> u16 {
        match self {
            ErrorCode::ValidationError => 400,
            ErrorCode::NotFound => 404,
            ErrorCode::Conflict => 409,
            ErrorCode::DatabaseError | ErrorCode::Internal => 500,
        }
    }
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }
}

/// Converts service errors to API errors.
impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Validation(e) => ApiError::validation(e.to_string()),
            ServiceError::NotFound(id) => ApiError::not_found("Discount", &id.to_string()),
            ServiceError::UsageLimitReached { id, max_usage } => ApiError::new(
                ErrorCode::Conflict,
                format!("Discount {} reached its usage limit of {}", id, max_usage),
            ),
            ServiceError::Db(e) => ApiError::from(e),
        }
    }
}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            DbError::CapBelowUsage {
                max_usage,
                usage_count,
                ..
            } => ApiError::validation(
                ValidationError::CapBelowUsage {
                    max_usage,
                    usage_count,
                }
                .to_string(),
            ),
            DbError::UsageLimitReached { id, max_usage } => ApiError::new(
                ErrorCode::Conflict,
                format!("Discount {} reached its usage limit of {}", id, max_usage),
            ),
            DbError::ForeignKeyViolation { message } => {
                tracing::error!("Foreign key violation: {}", message);
                ApiError::validation("Invalid reference")
            }
            DbError::InvalidData(e) => {
                // Stored rows that fail to parse are a data problem, not a caller problem
                tracing::error!("Invalid stored discount data: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Stored discount data is invalid")
            }
            DbError::ConnectionFailed(e) => {
                tracing::error!("Database connection failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database connection failed")
            }
            DbError::MigrationFailed(e) => {
                tracing::error!("Database migration failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database migration failed")
            }
            DbError::QueryFailed(e) => {
                tracing::error!("Database query failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
            DbError::PoolExhausted => {
                ApiError::new(ErrorCode::DatabaseError, "Database pool exhausted")
            }
            DbError::Internal(e) => {
                tracing::error!("Internal database error: {}", e);
                ApiError::new(ErrorCode::Internal, "Internal error")
            }
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_errors_lift_into_service_variants() {
        let err = ServiceError::from(DbError::UsageLimitReached { id: 3, max_usage: 5 });
        assert!(matches!(err, ServiceError::UsageLimitReached { id: 3, max_usage: 5 }));

        let err = ServiceError::from(DbError::not_found("Discount", 9));
        assert!(matches!(err, ServiceError::NotFound(9)));

        let err = ServiceError::from(DbError::QueryFailed("boom".into()));
        assert!(matches!(err, ServiceError::Db(DbError::QueryFailed(_))));

        let err = ServiceError::from(DbError::CapBelowUsage {
            id: 2,
            max_usage: 4,
            usage_count: 5,
        });
        assert!(matches!(
            err,
            ServiceError::Validation(ValidationError::CapBelowUsage {
                max_usage: 4,
                usage_count: 5
            })
        ));
    }

    #[test]
    fn test_core_errors_lift_into_service_variants() {
        assert!(matches!(
            ServiceError::from(CoreError::DiscountNotFound(4)),
            ServiceError::NotFound(4)
        ));
        let validation = ValidationError::Required {
            field: "name".to_string(),
        };
        assert!(matches!(
            ServiceError::from(CoreError::Validation(validation)),
            ServiceError::Validation(ValidationError::Required { .. })
        ));
    }

    #[test]
    fn test_api_error_codes() {
        let cases = [
            (ServiceError::NotFound(1), ErrorCode::NotFound, 404),
            (
                ServiceError::UsageLimitReached { id: 1, max_usage: 2 },
                ErrorCode::Conflict,
                409,
            ),
            (
                ServiceError::Validation(ValidationError::MustBeNonNegative {
                    field: "value".to_string(),
                }),
                ErrorCode::ValidationError,
                400,
            ),
            (
                ServiceError::Db(DbError::QueryFailed("SELECT broke".into())),
                ErrorCode::DatabaseError,
                500,
            ),
            (
                ServiceError::Db(DbError::Internal("decode".into())),
                ErrorCode::Internal,
                500,
            ),
        ];

        for (err, code, status) in cases {
            let api = ApiError::from(err);
            assert_eq!(api.code, code);
            assert_eq!(api.code.http_status(), status);
        }
    }

    #[test]
    fn test_storage_details_are_hidden() {
        let api = ApiError::from(DbError::QueryFailed("no such column: secret".into()));
        assert_eq!(api.message, "Database operation failed");
        assert!(!api.code.is_client_error());

        let api = ApiError::from(DbError::Internal("mismatched types at column 3".into()));
        assert_eq!(api.code, ErrorCode::Internal);
        assert_eq!(api.message, "Internal error");
    }

    #[test]
    fn test_cap_below_usage_is_a_client_error() {
        let api = ApiError::from(DbError::CapBelowUsage {
            id: 2,
            max_usage: 4,
            usage_count: 5,
        });
        assert_eq!(api.code, ErrorCode::ValidationError);
        assert!(api.code.is_client_error());
    }

    #[test]
    fn test_serialization() {
        let api = ApiError::from(ServiceError::NotFound(42));
        let json = serde_json::to_value(&api).unwrap();
        assert_eq!(json["code"], "NOT_FOUND");
        assert_eq!(json["message"], "Discount not found: 42");
        assert_eq!(api.to_string(), "[NotFound] Discount not found: 42");
    }
}
