//! Shared fixtures for the service integration tests.

#![allow(dead_code)]

use chrono::{Duration, Utc};
use tempfile::TempDir;

use cartwise_core::{DiscountKind, MembershipPolicy, NewDiscount};
use cartwise_db::{Database, DbConfig, InMemoryDiscountRepository, SqliteDiscountRepository};
use cartwise_service::DiscountService;

pub fn memory_service() -> DiscountService<InMemoryDiscountRepository> {
    DiscountService::new(InMemoryDiscountRepository::new(), MembershipPolicy::default())
}

pub async fn sqlite_service() -> DiscountService<SqliteDiscountRepository> {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    DiscountService::new(db.discounts(), MembershipPolicy::default())
}

/// A store in a temporary file with `connections` pooled connections, so
/// writes really do contend. Keep the directory alive for the test.
pub async fn file_sqlite_service(connections: u32) -> (DiscountService<SqliteDiscountRepository>, TempDir) {
    let dir = TempDir::new().unwrap();
    let config = DbConfig::new(dir.path().join("cartwise.db")).max_connections(connections);
    let db = Database::new(config).await.unwrap();
    (DiscountService::new(db.discounts(), MembershipPolicy::default()), dir)
}

/// Active from an hour ago until tomorrow.
pub fn active(name: &str, kind: DiscountKind, value: f64) -> NewDiscount {
    let now = Utc::now();
    NewDiscount::new(name, kind, value, now - Duration::hours(1), now + Duration::days(1))
}

/// Ended yesterday.
pub fn expired(name: &str, kind: DiscountKind, value: f64) -> NewDiscount {
    let now = Utc::now();
    NewDiscount::new(name, kind, value, now - Duration::days(10), now - Duration::days(1))
}

/// Runs an async scenario against both stores.
macro_rules! both_stores {
    ($scenario:ident) => {
        mod $scenario {
            #[tokio::test]
            async fn in_memory() {
                super::$scenario($crate::common::memory_service()).await;
            }

            #[tokio::test]
            async fn sqlite() {
                super::$scenario($crate::common::sqlite_service().await).await;
            }
        }
    };
}
