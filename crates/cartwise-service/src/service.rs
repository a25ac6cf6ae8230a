//! # Discount Service
//!
//! Orchestrates the catalog, eligibility, ranking, composition and usage
//! ledger over an injected [`DiscountRepository`].
//!
//! ## Checkout Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. get_available_discounts(ctx)     eligible + ranked                  │
//! │  2. compose_with(reducer, ...)       best exclusive, then stackables    │
//! │  3. record_usage(applied ids)        one atomic batch                   │
//! │                                                                         │
//! │  If another checkout consumes the last use between 1 and 3, step 3     │
//! │  fails with UsageLimitReached and nothing is recorded. The caller may  │
//! │  simply retry; the exhausted discount will no longer be eligible.      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

use cartwise_core::validation::{validate_discount, validate_new_discount};
use cartwise_core::{
    compose_with, rank, CartContext, CompositionStep, CoreError, Discount, DiscountReducer,
    DiscountUpdate, EligibilityQuery, LineItems, LiteralReducer, MembershipPolicy, Money,
    NewDiscount,
};
use cartwise_db::{Database, DiscountRepository, SqliteDiscountRepository};

use crate::config::ServiceConfig;
use crate::error::{ServiceError, ServiceResult};

// =============================================================================
// Checkout Types
// =============================================================================

/// The amount being discounted and the line it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutLine {
    /// Amount the first discount is applied to.
    pub starting_amount: Money,
    /// Units on the line (BOGO and multi-item formulas).
    pub quantity: i64,
    pub unit_price: Money,
}

impl CheckoutLine {
    /// A single-unit line where the unit price is the whole amount.
    pub fn single(amount: Money) -> Self {
        CheckoutLine {
            starting_amount: amount,
            quantity: 1,
            unit_price: amount,
        }
    }
}

/// Outcome of a checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutReceipt {
    pub original_amount: Money,
    pub final_amount: Money,
    /// Discounts consumed, in application order.
    pub applied_discount_ids: Vec<i64>,
    pub steps: Vec<CompositionStep>,
}

impl CheckoutReceipt {
    pub fn savings(&self) -> Money {
        self.original_amount - self.final_amount
    }
}

// =============================================================================
// Service
// =============================================================================

/// Discount operations over a repository `R`.
#[derive(Clone)]
pub struct DiscountService<R: DiscountRepository> {
    repo: R,
    membership: MembershipPolicy,
    reducer: Arc<dyn DiscountReducer + Send + Sync>,
}

impl DiscountService<SqliteDiscountRepository> {
    /// Opens the SQLite store described by `config` (running migrations)
    /// and builds a service over it.
    pub async fn connect(config: &ServiceConfig) -> ServiceResult<Self> {
        let db = Database::new(config.db_config()).await?;
        Ok(DiscountService::new(db.discounts(), config.membership.clone()))
    }
}

impl<R: DiscountRepository> DiscountService<R> {
    pub fn new(repo: R, membership: MembershipPolicy) -> Self {
        DiscountService {
            repo,
            membership,
            reducer: Arc::new(LiteralReducer),
        }
    }

    /// Replaces the composition strategy used by [`checkout`](Self::checkout).
    pub fn with_reducer<D>(mut self, reducer: D) -> Self
    where
        D: DiscountReducer + Send + Sync + 'static,
    {
        self.reducer = Arc::new(reducer);
        self
    }

    // -------------------------------------------------------------------------
    // Catalog
    // -------------------------------------------------------------------------

    /// Validates and persists a new discount.
    pub async fn create_discount(&self, discount: NewDiscount) -> ServiceResult<Discount> {
        debug!(name = %discount.name, kind = %discount.kind, "Creating discount");

        validate_new_discount(&discount)?;
        let created = self.repo.create(discount, Utc::now()).await?;

        info!(discount_id = created.id, priority = created.priority, "Discount created");
        Ok(created)
    }

    /// Applies a partial update and re-validates the merged discount.
    ///
    /// The cap is checked again by the store against the live usage count,
    /// so uses recorded after the read still count.
    pub async fn update_discount(&self, id: i64, update: DiscountUpdate) -> ServiceResult<Discount> {
        debug!(discount_id = id, "Updating discount");

        let current = self
            .repo
            .get_by_id(id)
            .await?
            .ok_or(CoreError::DiscountNotFound(id))?;

        let merged = update.merge_into(&current, Utc::now());
        validate_discount(&merged)?;
        let updated = self.repo.update(&merged).await?;

        info!(discount_id = id, "Discount updated");
        Ok(updated)
    }

    pub async fn delete_discount(&self, id: i64) -> ServiceResult<()> {
        debug!(discount_id = id, "Deleting discount");
        self.repo.delete(id).await?;
        Ok(())
    }

    pub async fn get_discount(&self, id: i64) -> ServiceResult<Discount> {
        self.repo
            .get_by_id(id)
            .await?
            .ok_or(ServiceError::NotFound(id))
    }

    /// Every stored discount by ascending id.
    pub async fn list_discounts(&self) -> ServiceResult<Vec<Discount>> {
        Ok(self.repo.list_all().await?)
    }

    // -------------------------------------------------------------------------
    // Eligibility and checkout
    // -------------------------------------------------------------------------

    /// Discounts usable for `ctx` right now, in application order.
    pub async fn get_available_discounts(&self, ctx: &CartContext) -> ServiceResult<Vec<Discount>> {
        let query = EligibilityQuery::for_cart(ctx, &self.membership, Utc::now());
        let eligible = self.repo.find_eligible(&query).await?;
        let ranked = rank(eligible);

        debug!(
            user_id = ?ctx.user_id,
            cart_total = ?ctx.cart_total,
            count = ranked.len(),
            "Available discounts resolved"
        );
        Ok(ranked)
    }

    /// Consumes one use of each distinct id, all or nothing.
    pub async fn record_usage(&self, discount_ids: &[i64]) -> ServiceResult<()> {
        debug!(ids = ?discount_ids, "Recording usage");
        self.repo.record_usage(discount_ids, Utc::now()).await?;
        Ok(())
    }

    /// Composes the available discounts over `line` and records usage for
    /// the ones applied.
    pub async fn checkout(&self, ctx: &CartContext, line: CheckoutLine) -> ServiceResult<CheckoutReceipt> {
        let ranked = self.get_available_discounts(ctx).await?;
        let composition = compose_with(
            self.reducer.as_ref(),
            &ranked,
            line.starting_amount,
            &LineItems::new(line.quantity, line.unit_price),
        );

        if let Err(err) = self.record_usage(&composition.applied).await {
            warn!(applied = ?composition.applied, error = %err, "Checkout usage not recorded");
            return Err(err);
        }

        info!(
            original = %composition.starting_amount,
            final_amount = %composition.final_amount,
            applied = composition.applied.len(),
            "Checkout composed"
        );

        Ok(CheckoutReceipt {
            original_amount: composition.starting_amount,
            final_amount: composition.final_amount,
            applied_discount_ids: composition.applied,
            steps: composition.steps,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cartwise_core::{CompoundingReducer, DiscountKind};
    use cartwise_db::InMemoryDiscountRepository;
    use chrono::Duration;

    fn service() -> DiscountService<InMemoryDiscountRepository> {
        DiscountService::new(InMemoryDiscountRepository::new(), MembershipPolicy::default())
    }

    fn active(name: &str, kind: DiscountKind, value: f64) -> NewDiscount {
        let now = Utc::now();
        NewDiscount::new(name, kind, value, now - Duration::hours(1), now + Duration::days(1))
    }

    #[tokio::test]
    async fn test_get_discount_missing() {
        let err = service().get_discount(99).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(99)));
    }

    #[tokio::test]
    async fn test_checkout_without_discounts_keeps_amount() {
        let receipt = service()
            .checkout(&CartContext::default(), CheckoutLine::single(Money::from_cents(20_000)))
            .await
            .unwrap();

        assert_eq!(receipt.final_amount, Money::from_cents(20_000));
        assert!(receipt.applied_discount_ids.is_empty());
        assert!(receipt.savings().is_zero());
    }

    #[tokio::test]
    async fn test_reducer_is_configurable() {
        let literal = service();
        let compounding = service().with_reducer(CompoundingReducer);

        for svc in [&literal, &compounding] {
            svc.create_discount(active("10%", DiscountKind::Percentage, 10.0).priority(1))
                .await
                .unwrap();
            svc.create_discount(
                active("Multi", DiscountKind::MultiItem, 50.0)
                    .priority(2)
                    .stackable(true),
            )
            .await
            .unwrap();
        }

        let line = CheckoutLine {
            starting_amount: Money::from_cents(20_000),
            quantity: 2,
            unit_price: Money::from_cents(10_000),
        };
        let ctx = CartContext::default();

        // 200 → 180, then the multi-item formula on 2 × $100 gives 150
        let a = literal.checkout(&ctx, line).await.unwrap();
        assert_eq!(a.final_amount, Money::from_cents(15_000));

        // 180 scaled by 150/200
        let b = compounding.checkout(&ctx, line).await.unwrap();
        assert_eq!(b.final_amount, Money::from_cents(13_500));
    }

    #[test]
    fn test_receipt_serializes_camel_case() {
        let receipt = CheckoutReceipt {
            original_amount: Money::from_cents(100),
            final_amount: Money::from_cents(90),
            applied_discount_ids: vec![1],
            steps: vec![],
        };
        let json = serde_json::to_value(&receipt).unwrap();
        assert!(json.get("appliedDiscountIds").is_some());
        assert!(json.get("finalAmount").is_some());
    }
}
