//! # In-Memory Discount Repository
//!
//! A [`DiscountRepository`] over a `BTreeMap`, for tests and embedding.
//! Eligibility runs the same [`Predicate::matches`] logic the SQLite
//! repository mirrors in SQL, so switching stores never changes results.
//!
//! [`Predicate::matches`]: cartwise_core::Predicate::matches

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use cartwise_core::{find_eligible, Discount, EligibilityQuery, NewDiscount};

use super::{normalize_product_ids, DiscountRepository};
use crate::error::{DbError, DbResult};

#[derive(Debug, Default)]
struct Store {
    next_id: i64,
    discounts: BTreeMap<i64, Discount>,
}

/// Cloneable handle to a shared in-memory discount store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDiscountRepository {
    inner: Arc<RwLock<Store>>,
}

impl InMemoryDiscountRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DiscountRepository for InMemoryDiscountRepository {
    async fn create(&self, discount: NewDiscount, now: DateTime<Utc>) -> DbResult<Discount> {
        let mut store = self.inner.write().await;
        store.next_id += 1;
        let id = store.next_id;

        let mut created = discount.into_discount(id, now);
        created.product_ids = normalize_product_ids(&created.product_ids);
        store.discounts.insert(id, created.clone());

        info!(discount_id = id, "Discount created");
        Ok(created)
    }

    async fn get_by_id(&self, id: i64) -> DbResult<Option<Discount>> {
        Ok(self.inner.read().await.discounts.get(&id).cloned())
    }

    async fn update(&self, discount: &Discount) -> DbResult<Discount> {
        let mut store = self.inner.write().await;
        let existing = store
            .discounts
            .get_mut(&discount.id)
            .ok_or_else(|| DbError::not_found("Discount", discount.id))?;

        // Checked against the live count while the write lock is held
        if discount.max_usage > 0 && discount.max_usage < existing.usage_count {
            warn!(discount_id = discount.id, max_usage = discount.max_usage, usage_count = existing.usage_count, "Cap below recorded usage");
            return Err(DbError::CapBelowUsage {
                id: discount.id,
                max_usage: discount.max_usage,
                usage_count: existing.usage_count,
            });
        }

        let usage_count = existing.usage_count;
        let created_at = existing.created_at;
        *existing = discount.clone();
        existing.usage_count = usage_count;
        existing.created_at = created_at;
        existing.product_ids = normalize_product_ids(&discount.product_ids);

        debug!(discount_id = discount.id, "Discount updated");
        Ok(existing.clone())
    }

    async fn delete(&self, id: i64) -> DbResult<()> {
        let removed = self.inner.write().await.discounts.remove(&id);
        if removed.is_none() {
            return Err(DbError::not_found("Discount", id));
        }

        info!(discount_id = id, "Discount deleted");
        Ok(())
    }

    async fn find_eligible(&self, query: &EligibilityQuery) -> DbResult<Vec<Discount>> {
        let store = self.inner.read().await;
        Ok(find_eligible(store.discounts.values().cloned(), query))
    }

    async fn list_all(&self) -> DbResult<Vec<Discount>> {
        Ok(self.inner.read().await.discounts.values().cloned().collect())
    }

    async fn record_usage(&self, ids: &[i64], now: DateTime<Utc>) -> DbResult<()> {
        let ids: BTreeSet<i64> = ids.iter().copied().collect();
        if ids.is_empty() {
            return Ok(());
        }

        let mut store = self.inner.write().await;

        // Check the whole batch before touching anything
        for id in &ids {
            let discount = store
                .discounts
                .get(id)
                .ok_or_else(|| DbError::not_found("Discount", *id))?;
            if discount.is_capped() && !discount.has_remaining_usage() {
                warn!(discount_id = *id, max_usage = discount.max_usage, "Usage limit reached, rejecting batch");
                return Err(DbError::UsageLimitReached {
                    id: *id,
                    max_usage: discount.max_usage,
                });
            }
        }

        for id in &ids {
            if let Some(discount) = store.discounts.get_mut(id) {
                if discount.is_capped() {
                    discount.usage_count += 1;
                    discount.updated_at = now;
                }
            }
        }

        debug!(count = ids.len(), "Usage recorded");
        Ok(())
    }
}
