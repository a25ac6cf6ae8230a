//! # Repository Module
//!
//! The discount store abstraction and its two implementations.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  DiscountService<R: DiscountRepository>                                │
//! │       │                                                                 │
//! │       │  repo.find_eligible(&query)                                     │
//! │       ▼                                                                 │
//! │  DiscountRepository (trait)                                            │
//! │  ├── create / get_by_id / update / delete / list_all                   │
//! │  ├── find_eligible(&EligibilityQuery)                                  │
//! │  └── record_usage(&[id], now)                                          │
//! │       │                                                                 │
//! │       ├──► SqliteDiscountRepository   predicates → SQL EXISTS clauses  │
//! │       └──► InMemoryDiscountRepository predicates → Predicate::matches  │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Both implementations return discounts in ascending id order and apply the
//! same all-or-nothing usage batch rules:
//!
//! 1. Duplicate ids in one batch count once
//! 2. An unknown id fails the batch with `NotFound`
//! 3. Uncapped discounts (`max_usage == 0`) are skipped
//! 4. A capped discount at its cap fails the batch with `UsageLimitReached`

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use cartwise_core::{Discount, EligibilityQuery, NewDiscount};

use crate::error::DbResult;

pub mod discount;
pub mod memory;

/// Storage capability for discounts.
#[async_trait]
pub trait DiscountRepository: Send + Sync {
    /// Persists a new discount with its conditions and product scope.
    /// Usage starts at zero; `now` stamps both timestamps.
    async fn create(&self, discount: NewDiscount, now: DateTime<Utc>) -> DbResult<Discount>;

    /// Returns `Ok(None)` when the id does not exist.
    async fn get_by_id(&self, id: i64) -> DbResult<Option<Discount>>;

    /// Replaces every editable field of an existing discount, including
    /// its conditions and product scope. `usage_count` is never written.
    async fn update(&self, discount: &Discount) -> DbResult<Discount>;

    /// Removes a discount and cascades to its conditions and products.
    async fn delete(&self, id: i64) -> DbResult<()>;

    /// Discounts satisfying every predicate in `query`, by ascending id.
    async fn find_eligible(&self, query: &EligibilityQuery) -> DbResult<Vec<Discount>>;

    /// Every discount, by ascending id.
    async fn list_all(&self) -> DbResult<Vec<Discount>>;

    /// Atomically consumes one use of each capped discount in `ids`.
    async fn record_usage(&self, ids: &[i64], now: DateTime<Utc>) -> DbResult<()>;
}

/// Sorted, de-duplicated product scope as both stores keep it.
pub(crate) fn normalize_product_ids(ids: &[i64]) -> Vec<i64> {
    let mut ids = ids.to_vec();
    ids.sort_unstable();
    ids.dedup();
    ids
}
