//! PostgreSQL entity store using SeaQuery.
//!
//! Predicates are SeaQuery expressions over the entity table's columns.
//! Case-insensitive comparisons lower-case a text cast of the column, so the
//! same operators work on text, enum-as-text, integer and timestamp columns.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use sea_query::{
    Alias, Asterisk, Cond, Expr, ExprTrait, Func, Order, PostgresQueryBuilder, Query, SimpleExpr,
};
use serde_json::Value;
use sqlx::PgPool;
use tracing::debug;

use super::store::{EntityStore, FetchRequest, PredicateBuilder, Projection, TextMatch};

/// Builds SeaQuery predicates and orderings.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqlPredicates;

impl SqlPredicates {
    fn column(path: &str) -> SimpleExpr {
        Expr::col(Alias::new(path)).into()
    }

    /// `CAST(col AS text)`
    fn text(path: &str) -> SimpleExpr {
        Expr::col(Alias::new(path)).cast_as(Alias::new("text"))
    }

    /// `LOWER(CAST(col AS text))`
    fn lower_text(path: &str) -> SimpleExpr {
        Func::lower(Self::text(path)).into()
    }
}

impl PredicateBuilder for SqlPredicates {
    type Predicate = SimpleExpr;
    type Order = (SimpleExpr, Order);

    fn always(&self) -> SimpleExpr {
        Expr::cust("TRUE")
    }

    fn never(&self) -> SimpleExpr {
        Expr::cust("FALSE")
    }

    fn and(&self, predicates: Vec<SimpleExpr>) -> SimpleExpr {
        if predicates.is_empty() {
            return self.always();
        }
        predicates.into_iter().fold(Cond::all(), Cond::add).into()
    }

    fn or(&self, predicates: Vec<SimpleExpr>) -> SimpleExpr {
        if predicates.is_empty() {
            return self.never();
        }
        predicates.into_iter().fold(Cond::any(), Cond::add).into()
    }

    fn not(&self, predicate: SimpleExpr) -> SimpleExpr {
        predicate.not()
    }

    fn equals_ignore_case(&self, path: &str, value: &str) -> SimpleExpr {
        Self::lower_text(path).eq(value.to_lowercase())
    }

    fn not_equals_ignore_case(&self, path: &str, value: &str) -> SimpleExpr {
        Self::lower_text(path).ne(value.to_lowercase())
    }

    fn matches_ignore_case(&self, path: &str, value: &str, mode: TextMatch) -> SimpleExpr {
        let value = escape_like_wildcards(&value.to_lowercase());
        let pattern = match mode {
            TextMatch::Contains => format!("%{value}%"),
            TextMatch::StartsWith => format!("{value}%"),
            TextMatch::EndsWith => format!("%{value}"),
        };
        Self::lower_text(path).like(pattern)
    }

    fn contains(&self, path: &str, value: &str) -> SimpleExpr {
        Self::text(path).like(format!("%{}%", escape_like_wildcards(value)))
    }

    fn in_ignore_case(&self, path: &str, values: &[String]) -> SimpleExpr {
        Self::lower_text(path).is_in(values.iter().map(|v| v.to_lowercase()))
    }

    fn order_by(&self, path: &str, ascending: bool) -> (SimpleExpr, Order) {
        let order = if ascending { Order::Asc } else { Order::Desc };
        (Self::column(path), order)
    }
}

/// Escape SQL LIKE wildcard characters (`%`, `_`, `\`) in a value.
fn escape_like_wildcards(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Build the SELECT for one fetch.
pub fn select_sql(request: FetchRequest<SimpleExpr, (SimpleExpr, Order)>) -> String {
    let mut query = Query::select();
    query
        .column(Asterisk)
        .from(Alias::new(request.table))
        .and_where(request.predicate);

    for (expr, order) in request.order {
        query.order_by_expr(expr, order);
    }

    query.limit(request.limit);
    query.offset(request.offset);

    query.to_string(PostgresQueryBuilder)
}

/// Build the distinct-values SELECT for one column.
///
/// Orders by the selected expression itself; PostgreSQL rejects
/// `SELECT DISTINCT` ordered by anything else.
pub fn distinct_sql(table: &str, path: &str, projection: Projection, limit: u64) -> String {
    let expr = match projection {
        Projection::Raw => SqlPredicates::column(path),
        Projection::Text => SqlPredicates::text(path),
    };

    let mut query = Query::select();
    query
        .distinct()
        .expr_as(expr.clone(), Alias::new("value"))
        .from(Alias::new(table))
        .and_where(expr.clone().is_not_null())
        .order_by_expr(expr, Order::Asc)
        .limit(limit);

    query.to_string(PostgresQueryBuilder)
}

/// Entity store over a PostgreSQL pool.
pub struct PgEntityStore {
    pool: PgPool,
    statement_timeout: Duration,
    predicates: SqlPredicates,
}

impl PgEntityStore {
    pub fn new(pool: PgPool, statement_timeout: Duration) -> Self {
        Self {
            pool,
            statement_timeout,
            predicates: SqlPredicates,
        }
    }
}

#[async_trait]
impl EntityStore for PgEntityStore {
    type Builder = SqlPredicates;

    fn predicates(&self) -> &SqlPredicates {
        &self.predicates
    }

    async fn fetch(
        &self,
        request: FetchRequest<SimpleExpr, (SimpleExpr, Order)>,
    ) -> Result<Vec<Value>> {
        let table = request.table;
        let sql = select_sql(request);
        debug!(table, %sql, "fetching rows");

        // SET LOCAL only holds inside a transaction and resets on commit/rollback.
        let mut tx = self
            .pool
            .begin()
            .await
            .context("failed to begin transaction")?;

        sqlx::query(&format!(
            "SET LOCAL statement_timeout = '{}ms'",
            self.statement_timeout.as_millis()
        ))
        .execute(&mut *tx)
        .await
        .context("failed to set statement timeout")?;

        let rows: Vec<Value> =
            sqlx::query_scalar(&format!("SELECT row_to_json(t) FROM ({sql}) t"))
                .fetch_all(&mut *tx)
                .await
                .with_context(|| format!("failed to query {table}"))?;

        tx.commit()
            .await
            .context("failed to commit query transaction")?;

        Ok(rows)
    }

    async fn distinct_values(
        &self,
        table: &str,
        path: &str,
        projection: Projection,
        limit: u64,
    ) -> Result<Vec<String>> {
        let sql = distinct_sql(table, path, projection, limit);
        debug!(table, path, %sql, "listing distinct values");

        let values: Vec<Option<String>> = sqlx::query_scalar(&sql)
            .fetch_all(&self.pool)
            .await
            .with_context(|| format!("failed to list values of {table}.{path}"))?;

        Ok(values.into_iter().flatten().collect())
    }

    async fn healthy(&self) -> bool {
        crate::db::check_health(&self.pool).await
    }
}
