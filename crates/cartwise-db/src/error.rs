//! # Database Error Types
//!
//! Error types for repository operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  SQLite Error (sqlx::Error)      Stored text that no longer parses     │
//! │       │                                   │                             │
//! │       ▼                                   ▼                             │
//! │  DbError (this module) ← Adds context and categorization               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ServiceError → ApiError (cartwise-service) ← Serialized for callers   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use cartwise_core::ValidationError;
use thiserror::Error;

/// Database operation errors.
///
/// Both repositories report failures through this type, so callers never
/// need to know which store they are talking to.
#[derive(Debug, Error)]
pub enum DbError {
    /// Entity not found in database.
    ///
    /// ## When This Occurs
    /// - Updating or deleting a discount id that does not exist
    /// - A usage batch naming an unknown discount
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Foreign key constraint violation.
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// A capped discount was already consumed `max_usage` times.
    ///
    /// ## When This Occurs
    /// - Recording usage for a discount at its cap
    /// - Losing a race for the last remaining use
    ///
    /// The whole usage batch is rolled back.
    #[error("Discount {id} reached its usage limit of {max_usage}")]
    UsageLimitReached { id: i64, max_usage: i64 },

    /// An update would set a cap below the uses already recorded.
    ///
    /// Compared against the stored count at write time, so it also catches
    /// uses recorded after the caller read the discount.
    #[error("Discount {id}: max usage {max_usage} is below recorded usage {usage_count}")]
    CapBelowUsage { id: i64, max_usage: i64, usage_count: i64 },

    /// A stored row could not be turned back into a domain value.
    ///
    /// ## When This Occurs
    /// - Condition text that no longer parses (e.g. `CART_TOTAL = "abc"`)
    /// - Unknown discount kind label
    #[error("Invalid stored data: {0}")]
    InvalidData(#[from] ValidationError),

    /// Database connection failed.
    ///
    /// ## When This Occurs
    /// - Database file can't be created
    /// - File permissions issue
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Pool exhausted (all connections in use).
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Internal database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl ToString) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::RowNotFound    → DbError::NotFound
/// sqlx::Error::Database       → ForeignKeyViolation or QueryFailed
/// sqlx::Error::PoolTimedOut   → DbError::PoolExhausted
/// Other                       → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::not_found("Record", "unknown"),

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();

                if msg.contains("FOREIGN KEY constraint failed") {
                    DbError::ForeignKeyViolation {
                        message: msg.to_string(),
                    }
                } else {
                    DbError::QueryFailed(msg.to_string())
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        let err: DbError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[test]
    fn test_pool_errors() {
        assert!(matches!(DbError::from(sqlx::Error::PoolTimedOut), DbError::PoolExhausted));
        assert!(matches!(
            DbError::from(sqlx::Error::PoolClosed),
            DbError::ConnectionFailed(_)
        ));
    }

    #[test]
    fn test_messages() {
        assert_eq!(DbError::not_found("Discount", 9).to_string(), "Discount not found: 9");
        let err = DbError::UsageLimitReached { id: 3, max_usage: 5 };
        assert_eq!(err.to_string(), "Discount 3 reached its usage limit of 5");
        let err = DbError::CapBelowUsage {
            id: 3,
            max_usage: 4,
            usage_count: 5,
        };
        assert_eq!(err.to_string(), "Discount 3: max usage 4 is below recorded usage 5");
    }
}
