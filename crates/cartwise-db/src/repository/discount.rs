//! # SQLite Discount Repository
//!
//! Database operations for discounts, their conditions and product scope.
//!
//! ## Eligibility as SQL
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  EligibilityQuery predicates          rendered clause (ANDed)          │
//! │  ──────────────────────────           ─────────────────────────────    │
//! │  ActiveAt(now)                        julianday(start) <= now <= end   │
//! │  Membership(tier)                     EXISTS condition MEMBERSHIP_LEVEL│
//! │  MembershipUnresolved                 0 = 1                            │
//! │  MinimumSpend(total)                  EXISTS condition CART_TOTAL      │
//! │                                         with minimum (cents) <= total  │
//! │  ProductScope(ids)                    EXISTS discount_products IN ids  │
//! │  UsageAvailable                       max_usage = 0 OR count < max     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each predicate is an independent `EXISTS` test, so a discount with
//! several conditions of the same kind qualifies when any one of them does.
//! This matches [`Predicate::matches`] exactly.
//!
//! ## Row Loading
//! Discount rows are loaded first, then their conditions and products in
//! one batched query each. Condition text is parsed into typed
//! [`Condition`]s here; unparsable text surfaces as [`DbError::InvalidData`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use std::collections::{BTreeSet, HashMap};
use std::str::FromStr;
use tracing::{debug, info, warn};

use cartwise_core::{Condition, Discount, DiscountKind, EligibilityQuery, NewDiscount, Predicate};

use super::{normalize_product_ids, DiscountRepository};
use crate::error::{DbError, DbResult};

/// Columns selected for every discount read, aliased to `d`.
const DISCOUNT_COLUMNS: &str = "d.id, d.name, d.kind, d.value, d.start_date, d.end_date, \
     d.priority, d.stackable, d.max_usage, d.usage_count, d.created_at, d.updated_at";

// =============================================================================
// Row Types
// =============================================================================

#[derive(Debug, FromRow)]
struct DiscountRow {
    id: i64,
    name: String,
    kind: String,
    value: f64,
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
    priority: i32,
    stackable: bool,
    max_usage: i64,
    usage_count: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct ConditionRow {
    discount_id: i64,
    kind: String,
    value: String,
}

#[derive(Debug, FromRow)]
struct ProductRow {
    discount_id: i64,
    product_id: i64,
}

impl DiscountRow {
    fn into_discount(self, conditions: Vec<Condition>, product_ids: Vec<i64>) -> DbResult<Discount> {
        Ok(Discount {
            id: self.id,
            name: self.name,
            kind: DiscountKind::from_str(&self.kind)?,
            value: self.value,
            start_date: self.start_date,
            end_date: self.end_date,
            priority: self.priority,
            stackable: self.stackable,
            max_usage: self.max_usage,
            usage_count: self.usage_count,
            conditions,
            product_ids,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

// =============================================================================
// Repository
// =============================================================================

/// SQLite-backed [`DiscountRepository`].
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.discounts();
///
/// let created = repo.create(new_discount, Utc::now()).await?;
/// let eligible = repo.find_eligible(&query).await?;
/// repo.record_usage(&[created.id], Utc::now()).await?;
/// ```
#[derive(Debug, Clone)]
pub struct SqliteDiscountRepository {
    pool: SqlitePool,
}

impl SqliteDiscountRepository {
    /// Creates a new SqliteDiscountRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SqliteDiscountRepository { pool }
    }

    /// Counts stored discounts.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM discounts")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Loads a discount that must exist.
    async fn fetch_required(&self, id: i64) -> DbResult<Discount> {
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Discount", id))
    }

    /// Attaches conditions and product scope to loaded rows, keeping row order.
    async fn hydrate(&self, rows: Vec<DiscountRow>) -> DbResult<Vec<Discount>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();

        let mut qb = QueryBuilder::<Sqlite>::new(
            "SELECT discount_id, kind, value FROM discount_conditions WHERE discount_id IN (",
        );
        push_id_list(&mut qb, &ids);
        qb.push(") ORDER BY discount_id, position, id");
        let condition_rows: Vec<ConditionRow> = qb.build_query_as().fetch_all(&self.pool).await?;

        let mut qb = QueryBuilder::<Sqlite>::new(
            "SELECT discount_id, product_id FROM discount_products WHERE discount_id IN (",
        );
        push_id_list(&mut qb, &ids);
        qb.push(") ORDER BY discount_id, product_id");
        let product_rows: Vec<ProductRow> = qb.build_query_as().fetch_all(&self.pool).await?;

        let mut conditions: HashMap<i64, Vec<Condition>> = HashMap::new();
        for row in condition_rows {
            let condition = Condition::parse(&row.kind, &row.value).map_err(|e| {
                warn!(discount_id = row.discount_id, kind = %row.kind, value = %row.value, "Unparsable stored condition");
                DbError::InvalidData(e)
            })?;
            conditions.entry(row.discount_id).or_default().push(condition);
        }

        let mut products: HashMap<i64, Vec<i64>> = HashMap::new();
        for row in product_rows {
            products.entry(row.discount_id).or_default().push(row.product_id);
        }

        rows.into_iter()
            .map(|row| {
                let id = row.id;
                row.into_discount(
                    conditions.remove(&id).unwrap_or_default(),
                    products.remove(&id).unwrap_or_default(),
                )
            })
            .collect()
    }
}

#[async_trait]
impl DiscountRepository for SqliteDiscountRepository {
    async fn create(&self, discount: NewDiscount, now: DateTime<Utc>) -> DbResult<Discount> {
        debug!(name = %discount.name, kind = %discount.kind, "Creating discount");

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            INSERT INTO discounts (
                name, kind, value,
                start_date, end_date,
                priority, stackable,
                max_usage, usage_count,
                created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, 0, ?, ?)
            "#,
        )
        .bind(discount.name.as_str())
        .bind(discount.kind.as_str())
        .bind(discount.value)
        .bind(discount.start_date)
        .bind(discount.end_date)
        .bind(discount.priority)
        .bind(discount.stackable)
        .bind(discount.max_usage)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        let id = result.last_insert_rowid();
        insert_children(&mut tx, id, &discount.conditions, &discount.product_ids).await?;

        tx.commit().await?;

        info!(discount_id = id, "Discount created");
        self.fetch_required(id).await
    }

    async fn get_by_id(&self, id: i64) -> DbResult<Option<Discount>> {
        let row: Option<DiscountRow> =
            sqlx::query_as(&format!("SELECT {} FROM discounts d WHERE d.id = ?", DISCOUNT_COLUMNS))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        match row {
            Some(row) => Ok(self.hydrate(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    /// The cap is compared with the stored `usage_count` inside the UPDATE,
    /// so a concurrent `record_usage` cannot slip in between the check and
    /// the write.
    async fn update(&self, discount: &Discount) -> DbResult<Discount> {
        debug!(discount_id = discount.id, "Updating discount");

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE discounts SET
                name = ?,
                kind = ?,
                value = ?,
                start_date = ?,
                end_date = ?,
                priority = ?,
                stackable = ?,
                max_usage = ?,
                updated_at = ?
            WHERE id = ? AND (? = 0 OR usage_count <= ?)
            "#,
        )
        .bind(discount.name.as_str())
        .bind(discount.kind.as_str())
        .bind(discount.value)
        .bind(discount.start_date)
        .bind(discount.end_date)
        .bind(discount.priority)
        .bind(discount.stackable)
        .bind(discount.max_usage)
        .bind(discount.updated_at)
        .bind(discount.id)
        .bind(discount.max_usage)
        .bind(discount.max_usage)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            let usage_count: Option<i64> = sqlx::query_scalar("SELECT usage_count FROM discounts WHERE id = ?")
                .bind(discount.id)
                .fetch_optional(&mut *tx)
                .await?;

            return Err(match usage_count {
                None => DbError::not_found("Discount", discount.id),
                Some(usage_count) => {
                    warn!(discount_id = discount.id, max_usage = discount.max_usage, usage_count, "Cap below recorded usage");
                    DbError::CapBelowUsage {
                        id: discount.id,
                        max_usage: discount.max_usage,
                        usage_count,
                    }
                }
            });
        }

        sqlx::query("DELETE FROM discount_conditions WHERE discount_id = ?")
            .bind(discount.id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM discount_products WHERE discount_id = ?")
            .bind(discount.id)
            .execute(&mut *tx)
            .await?;
        insert_children(&mut tx, discount.id, &discount.conditions, &discount.product_ids).await?;

        tx.commit().await?;

        self.fetch_required(discount.id).await
    }

    async fn delete(&self, id: i64) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM discounts WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Discount", id));
        }

        info!(discount_id = id, "Discount deleted");
        Ok(())
    }

    async fn find_eligible(&self, query: &EligibilityQuery) -> DbResult<Vec<Discount>> {
        let mut qb = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {} FROM discounts d WHERE 1 = 1",
            DISCOUNT_COLUMNS
        ));
        for predicate in query.predicates() {
            push_predicate(&mut qb, predicate);
        }
        qb.push(" ORDER BY d.id");

        let rows: Vec<DiscountRow> = qb.build_query_as().fetch_all(&self.pool).await?;
        let discounts = self.hydrate(rows).await?;

        debug!(
            predicates = query.predicates().len(),
            count = discounts.len(),
            "Eligibility query returned discounts"
        );
        Ok(discounts)
    }

    async fn list_all(&self) -> DbResult<Vec<Discount>> {
        let rows: Vec<DiscountRow> =
            sqlx::query_as(&format!("SELECT {} FROM discounts d ORDER BY d.id", DISCOUNT_COLUMNS))
                .fetch_all(&self.pool)
                .await?;
        self.hydrate(rows).await
    }

    /// ## How It Works
    /// ```text
    /// BEGIN
    ///   for id in ids (deduplicated, ascending):
    ///     UPDATE ... usage_count + 1 WHERE id AND max_usage > 0 AND usage_count < max_usage
    ///     1 row  → consumed
    ///     0 rows → look the discount up:
    ///                missing        → NotFound           (rollback)
    ///                max_usage == 0 → uncapped, skip
    ///                otherwise      → UsageLimitReached  (rollback)
    /// COMMIT
    /// ```
    /// The conditional UPDATE runs first so the transaction takes SQLite's
    /// write lock before reading anything; concurrent batches serialize
    /// instead of both passing a stale check.
    async fn record_usage(&self, ids: &[i64], now: DateTime<Utc>) -> DbResult<()> {
        let ids: BTreeSet<i64> = ids.iter().copied().collect();
        if ids.is_empty() {
            return Ok(());
        }

        debug!(count = ids.len(), "Recording discount usage");

        let mut tx = self.pool.begin().await?;

        for id in ids {
            let result = sqlx::query(
                r#"
                UPDATE discounts SET
                    usage_count = usage_count + 1,
                    updated_at = ?
                WHERE id = ? AND max_usage > 0 AND usage_count < max_usage
                "#,
            )
            .bind(now)
            .bind(id)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 1 {
                debug!(discount_id = id, "Usage recorded");
                continue;
            }

            let max_usage: Option<i64> = sqlx::query_scalar("SELECT max_usage FROM discounts WHERE id = ?")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;

            match max_usage {
                None => return Err(DbError::not_found("Discount", id)),
                Some(0) => continue,
                Some(max_usage) => {
                    warn!(discount_id = id, max_usage, "Usage limit reached, rolling back batch");
                    return Err(DbError::UsageLimitReached { id, max_usage });
                }
            }
        }

        tx.commit().await?;
        Ok(())
    }
}

// =============================================================================
// SQL Helpers
// =============================================================================

fn push_id_list(qb: &mut QueryBuilder<'_, Sqlite>, ids: &[i64]) {
    let mut separated = qb.separated(", ");
    for id in ids {
        separated.push_bind(*id);
    }
}

/// Appends one predicate as an ` AND ...` clause on alias `d`.
fn push_predicate(qb: &mut QueryBuilder<'_, Sqlite>, predicate: &Predicate) {
    match predicate {
        Predicate::ActiveAt(now) => {
            qb.push(" AND julianday(d.start_date) <= julianday(")
                .push_bind(*now)
                .push(") AND julianday(")
                .push_bind(*now)
                .push(") <= julianday(d.end_date)");
        }
        Predicate::Membership(tier) => {
            qb.push(
                " AND EXISTS (SELECT 1 FROM discount_conditions c \
                 WHERE c.discount_id = d.id AND c.kind = 'MEMBERSHIP_LEVEL' \
                 AND UPPER(TRIM(c.value)) = ",
            )
            .push_bind(tier.as_str().to_string())
            .push(")");
        }
        Predicate::MembershipUnresolved => {
            qb.push(" AND 0 = 1");
        }
        Predicate::MinimumSpend(total) => {
            // Same rounding as Money::from_decimal (half away from zero)
            qb.push(
                " AND EXISTS (SELECT 1 FROM discount_conditions c \
                 WHERE c.discount_id = d.id AND c.kind = 'CART_TOTAL' \
                 AND CAST(ROUND(CAST(TRIM(c.value) AS REAL) * 100) AS INTEGER) <= ",
            )
            .push_bind(total.cents())
            .push(")");
        }
        Predicate::ProductScope(ids) if ids.is_empty() => {
            qb.push(" AND 0 = 1");
        }
        Predicate::ProductScope(ids) => {
            qb.push(
                " AND EXISTS (SELECT 1 FROM discount_products p \
                 WHERE p.discount_id = d.id AND p.product_id IN (",
            );
            push_id_list(qb, ids);
            qb.push("))");
        }
        Predicate::UsageAvailable => {
            qb.push(" AND (d.max_usage = 0 OR d.usage_count < d.max_usage)");
        }
    }
}

/// Writes conditions (in order) and the de-duplicated product scope.
async fn insert_children(
    conn: &mut SqliteConnection,
    discount_id: i64,
    conditions: &[Condition],
    product_ids: &[i64],
) -> DbResult<()> {
    for (position, condition) in conditions.iter().enumerate() {
        sqlx::query(
            "INSERT INTO discount_conditions (discount_id, kind, value, position) VALUES (?, ?, ?, ?)",
        )
        .bind(discount_id)
        .bind(condition.kind().as_str())
        .bind(condition.value_text())
        .bind(position as i64)
        .execute(&mut *conn)
        .await?;
    }

    for product_id in normalize_product_ids(product_ids) {
        sqlx::query("INSERT INTO discount_products (discount_id, product_id) VALUES (?, ?)")
            .bind(discount_id)
            .bind(product_id)
            .execute(&mut *conn)
            .await?;
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
