//! # cartwise-db: Persistence Layer for Cartwise
//!
//! This crate stores the discount catalog and keeps the usage ledger.
//! It uses SQLite with sqlx for async operations, and ships an in-memory
//! store with identical semantics for tests and embedding.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Cartwise Data Flow                               │
//! │                                                                         │
//! │  DiscountService (get_available_discounts, record_usage, ...)          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   cartwise-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────────┐  ┌────────────┐  │   │
//! │  │   │   Database    │    │ DiscountRepository │  │ Migrations │  │   │
//! │  │   │   (pool.rs)   │    │      (trait)       │  │ (embedded) │  │   │
//! │  │   │               │    │   ├── Sqlite...    │  │            │  │   │
//! │  │   │ SqlitePool    │◄───│   └── InMemory...  │  │ 001_...sql │  │   │
//! │  │   └───────────────┘    └────────────────────┘  └────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database file (or a private in-memory database)                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - The repository trait and its implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use cartwise_core::{CartContext, EligibilityQuery, MembershipPolicy};
//! use cartwise_db::{Database, DbConfig, DiscountRepository};
//!
//! let db = Database::new(DbConfig::new("./cartwise.db")).await?;
//! let repo = db.discounts();
//!
//! let query = EligibilityQuery::for_cart(&ctx, &MembershipPolicy::default(), Utc::now());
//! let eligible = repo.find_eligible(&query).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::discount::SqliteDiscountRepository;
pub use repository::memory::InMemoryDiscountRepository;
pub use repository::DiscountRepository;
