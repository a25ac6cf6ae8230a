//! Catalog management and eligibility filtering, run against both repositories.

#[macro_use]
mod common;

use chrono::{Duration, Utc};

use cartwise_core::{
    CartContext, Condition, DiscountKind, DiscountUpdate, MembershipPolicy, MembershipTier, Money,
    ValidationError,
};
use cartwise_db::{DiscountRepository, InMemoryDiscountRepository};
use cartwise_service::{ApiError, DiscountService, ErrorCode, ServiceError};

use common::active;

// =============================================================================
// Create
// =============================================================================

async fn create_stamps_and_persists<R: DiscountRepository>(svc: DiscountService<R>) {
    let created = svc
        .create_discount(
            active("Members only", DiscountKind::Percentage, 20.0)
                .priority(2)
                .max_usage(10)
                .condition(Condition::MembershipLevel {
                    tier: MembershipTier::Gold,
                })
                .product(7)
                .product(3),
        )
        .await
        .unwrap();

    assert!(created.id > 0);
    assert_eq!(created.usage_count, 0);
    assert_eq!(created.created_at, created.updated_at);
    assert_eq!(created.product_ids, vec![3, 7]);

    let stored = svc.get_discount(created.id).await.unwrap();
    assert_eq!(stored.name, "Members only");
    assert_eq!(stored.conditions, created.conditions);
    assert_eq!(svc.list_discounts().await.unwrap().len(), 1);
}
both_stores!(create_stamps_and_persists);

async fn invalid_input_is_not_persisted<R: DiscountRepository>(svc: DiscountService<R>) {
    let now = Utc::now();

    let err = svc
        .create_discount(active("   ", DiscountKind::Fixed, 5.0))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(ValidationError::Required { .. })));

    let backwards = cartwise_core::NewDiscount::new(
        "Backwards",
        DiscountKind::Fixed,
        5.0,
        now,
        now - Duration::days(1),
    );
    let err = svc.create_discount(backwards).await.unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Validation(ValidationError::InvalidDateWindow { .. })
    ));

    let err = svc
        .create_discount(active("Negative", DiscountKind::Fixed, -1.0))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));

    let err = svc
        .create_discount(active("Too much", DiscountKind::Percentage, 150.0))
        .await
        .unwrap_err();
    assert_eq!(ApiError::from(err).code, ErrorCode::ValidationError);

    assert!(svc.list_discounts().await.unwrap().is_empty());
}
both_stores!(invalid_input_is_not_persisted);

// =============================================================================
// Update / delete
// =============================================================================

async fn partial_update<R: DiscountRepository>(svc: DiscountService<R>) {
    let created = svc
        .create_discount(active("Spring", DiscountKind::Fixed, 5.0).max_usage(3).product(1))
        .await
        .unwrap();
    svc.record_usage(&[created.id]).await.unwrap();

    let updated = svc
        .update_discount(
            created.id,
            DiscountUpdate {
                name: Some("Spring Sale".to_string()),
                stackable: Some(true),
                product_ids: Some(vec![4, 2]),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.name, "Spring Sale");
    assert!(updated.stackable);
    assert_eq!(updated.value, 5.0);
    assert_eq!(updated.max_usage, 3);
    assert_eq!(updated.usage_count, 1);
    assert_eq!(updated.product_ids, vec![2, 4]);
    assert!(updated.updated_at >= created.updated_at);
    assert_eq!(svc.get_discount(created.id).await.unwrap(), updated);
}
both_stores!(partial_update);

async fn update_is_revalidated<R: DiscountRepository>(svc: DiscountService<R>) {
    let created = svc
        .create_discount(active("Window", DiscountKind::Fixed, 5.0).max_usage(5))
        .await
        .unwrap();
    svc.record_usage(&[created.id]).await.unwrap();
    svc.record_usage(&[created.id]).await.unwrap();

    let err = svc
        .update_discount(
            created.id,
            DiscountUpdate {
                end_date: Some(created.start_date - Duration::days(1)),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Validation(ValidationError::InvalidDateWindow { .. })
    ));

    let err = svc
        .update_discount(
            created.id,
            DiscountUpdate {
                max_usage: Some(1),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Validation(ValidationError::CapBelowUsage {
            max_usage: 1,
            usage_count: 2
        })
    ));

    let stored = svc.get_discount(created.id).await.unwrap();
    assert_eq!(stored.end_date, created.end_date);
    assert_eq!(stored.max_usage, 5);
    assert_eq!(stored.usage_count, 2);
}
both_stores!(update_is_revalidated);

async fn missing_ids<R: DiscountRepository>(svc: DiscountService<R>) {
    assert!(matches!(svc.get_discount(404).await, Err(ServiceError::NotFound(404))));
    assert!(matches!(svc.delete_discount(404).await, Err(ServiceError::NotFound(404))));
    assert!(matches!(
        svc.update_discount(404, DiscountUpdate::default()).await,
        Err(ServiceError::NotFound(404))
    ));
}
both_stores!(missing_ids);

async fn delete_removes_discount<R: DiscountRepository>(svc: DiscountService<R>) {
    let created = svc
        .create_discount(
            active("Gone", DiscountKind::Fixed, 5.0)
                .condition(Condition::CartTotal {
                    minimum: Money::from_cents(1_000),
                })
                .product(9),
        )
        .await
        .unwrap();

    svc.delete_discount(created.id).await.unwrap();
    assert!(matches!(
        svc.get_discount(created.id).await,
        Err(ServiceError::NotFound(_))
    ));
    assert!(svc.list_discounts().await.unwrap().is_empty());
}
both_stores!(delete_removes_discount);

// =============================================================================
// Eligibility
// =============================================================================

async fn membership_filters<R: DiscountRepository>(svc: DiscountService<R>) {
    let gold = svc
        .create_discount(active("Gold", DiscountKind::Fixed, 5.0).condition(Condition::MembershipLevel {
            tier: MembershipTier::Gold,
        }))
        .await
        .unwrap();
    svc.create_discount(active("Platinum", DiscountKind::Fixed, 5.0).condition(
        Condition::MembershipLevel {
            tier: MembershipTier::Platinum,
        },
    ))
    .await
    .unwrap();

    let member = CartContext::default().with_user(42);
    let available = svc.get_available_discounts(&member).await.unwrap();
    assert_eq!(available.len(), 1);
    assert_eq!(available[0].id, gold.id);

    // Anonymous carts skip the membership filter entirely
    assert_eq!(
        svc.get_available_discounts(&CartContext::default()).await.unwrap().len(),
        2
    );
}
both_stores!(membership_filters);

async fn filters_compose_with_and<R: DiscountRepository>(svc: DiscountService<R>) {
    let both = svc
        .create_discount(
            active("Gold big spender", DiscountKind::Fixed, 10.0)
                .condition(Condition::MembershipLevel {
                    tier: MembershipTier::Gold,
                })
                .condition(Condition::CartTotal {
                    minimum: Money::from_cents(5_000),
                })
                .product(1),
        )
        .await
        .unwrap();
    svc.create_discount(
        active("Big spender", DiscountKind::Fixed, 10.0).condition(Condition::CartTotal {
            minimum: Money::from_cents(5_000),
        }),
    )
    .await
    .unwrap();

    let ctx = CartContext::from_raw(42, Money::from_cents(6_000), vec![1, 2]);
    let available = svc.get_available_discounts(&ctx).await.unwrap();
    assert_eq!(available.len(), 1);
    assert_eq!(available[0].id, both.id);

    let under = CartContext::from_raw(42, Money::from_cents(4_999), vec![1]);
    assert!(svc.get_available_discounts(&under).await.unwrap().is_empty());

    let other_product = CartContext::from_raw(42, Money::from_cents(6_000), vec![3]);
    assert!(svc.get_available_discounts(&other_product).await.unwrap().is_empty());
}
both_stores!(filters_compose_with_and);

#[tokio::test]
async fn unresolved_member_sees_no_discounts() {
    let svc = DiscountService::new(
        InMemoryDiscountRepository::new(),
        MembershipPolicy::overrides_only().with_override(7, MembershipTier::Silver),
    );
    svc.create_discount(active("Open", DiscountKind::Fixed, 5.0)).await.unwrap();
    svc.create_discount(active("Silver", DiscountKind::Fixed, 5.0).condition(
        Condition::MembershipLevel {
            tier: MembershipTier::Silver,
        },
    ))
    .await
    .unwrap();

    let stranger = CartContext::default().with_user(8);
    assert!(svc.get_available_discounts(&stranger).await.unwrap().is_empty());

    let silver = CartContext::default().with_user(7);
    assert_eq!(svc.get_available_discounts(&silver).await.unwrap().len(), 1);
}
