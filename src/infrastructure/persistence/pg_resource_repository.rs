//! PostgreSQL implementation of the generic resource store.
//!
//! Statements are assembled with [`QueryBuilder`] from the entity's field
//! catalogue. Column names come only from `'static` field definitions and are
//! always quoted; every client-supplied value is bound as a parameter.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, QueryBuilder, Row};
use std::marker::PhantomData;
use std::sync::Arc;

use super::columns::{self, CREATED_BY, DELETED_AT, DELETED_BY, UPDATED_BY};
use crate::domain::query::{
    Comparison, Entity, FieldKind, FieldValue, Predicate, QueryPlan, Record,
};
use crate::domain::repositories::ResourceRepository;
use crate::error::AppError;

/// PostgreSQL store for any [`Entity`].
///
/// Writes and the count/page pair of [`ResourceRepository::find_many`] run
/// inside a transaction. Dropping the future before commit (client gone,
/// request cancelled) rolls the transaction back.
pub struct PgResourceRepository<E> {
    pool: Arc<PgPool>,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> PgResourceRepository<E> {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self {
            pool,
            _entity: PhantomData,
        }
    }

    fn push_select(builder: &mut QueryBuilder<'_, Postgres>) {
        builder.push("SELECT ");
        Self::push_columns(builder);
        builder.push(" FROM ").push(quoted(E::TABLE));
    }

    fn push_columns(builder: &mut QueryBuilder<'_, Postgres>) {
        let mut separated = builder.separated(", ");
        for field in E::all_fields() {
            separated.push(quoted(field.name));
        }
    }

    fn decode(row: &PgRow) -> Result<E, AppError> {
        let mut record = Record::new();
        for field in E::all_fields() {
            let value = match field.kind {
                FieldKind::Integer => FieldValue::from(row.try_get::<Option<i64>, _>(field.name)?),
                FieldKind::Float => FieldValue::from(row.try_get::<Option<f64>, _>(field.name)?),
                FieldKind::Text => FieldValue::from(row.try_get::<Option<String>, _>(field.name)?),
                FieldKind::Boolean => FieldValue::from(row.try_get::<Option<bool>, _>(field.name)?),
                FieldKind::Timestamp => {
                    FieldValue::from(row.try_get::<Option<DateTime<Utc>>, _>(field.name)?)
                }
            };
            record.set(field.name, value);
        }
        E::from_record(&record)
    }
}

fn quoted(identifier: &str) -> String {
    format!("\"{}\"", identifier.replace('"', "\"\""))
}

/// Escapes LIKE wildcards so client text matches literally.
fn like_escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn push_value(builder: &mut QueryBuilder<'_, Postgres>, value: &FieldValue) {
    match value {
        FieldValue::Null => {
            builder.push("NULL");
        }
        FieldValue::Integer(v) => {
            builder.push_bind(*v);
        }
        FieldValue::Float(v) => {
            builder.push_bind(*v);
        }
        FieldValue::Text(v) => {
            builder.push_bind(v.clone());
        }
        FieldValue::Boolean(v) => {
            builder.push_bind(*v);
        }
        FieldValue::Timestamp(v) => {
            builder.push_bind(*v);
        }
    }
}

fn push_predicate(builder: &mut QueryBuilder<'_, Postgres>, predicate: &Predicate) {
    builder.push(" AND ").push(quoted(predicate.field));

    let (operator, operand) = match &predicate.comparison {
        Comparison::Equals(v) => (" = ", v),
        Comparison::NotEqual(v) => (" <> ", v),
        Comparison::LessThan(v) => (" < ", v),
        Comparison::LessThanOrEqual(v) => (" <= ", v),
        Comparison::GreaterThan(v) => (" > ", v),
        Comparison::GreaterThanOrEqual(v) => (" >= ", v),
        Comparison::InRange(from, to) => {
            builder.push(" BETWEEN ");
            push_value(builder, from);
            builder.push(" AND ");
            push_value(builder, to);
            return;
        }
        Comparison::Contains(p) => {
            builder.push(" ILIKE ").push_bind(format!("%{}%", like_escape(p)));
            return;
        }
        Comparison::NotContains(p) => {
            builder.push(" NOT ILIKE ").push_bind(format!("%{}%", like_escape(p)));
            return;
        }
        Comparison::StartsWith(p) => {
            builder.push(" ILIKE ").push_bind(format!("{}%", like_escape(p)));
            return;
        }
        Comparison::EndsWith(p) => {
            builder.push(" ILIKE ").push_bind(format!("%{}", like_escape(p)));
            return;
        }
    };

    builder.push(operator);
    push_value(builder, operand);
}

fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, plan: &QueryPlan) {
    builder.push(" WHERE ").push(quoted(DELETED_AT)).push(" IS NULL");
    for predicate in &plan.predicates {
        push_predicate(builder, predicate);
    }
}

#[async_trait]
impl<E: Entity> ResourceRepository<E> for PgResourceRepository<E> {
    async fn find_by_id(&self, id: i64) -> Result<Option<E>, AppError> {
        let mut builder = QueryBuilder::new("");
        Self::push_select(&mut builder);
        builder
            .push(" WHERE \"id\" = ")
            .push_bind(id)
            .push(" AND ")
            .push(quoted(DELETED_AT))
            .push(" IS NULL");

        let row = builder.build().fetch_optional(self.pool.as_ref()).await?;

        row.as_ref().map(Self::decode).transpose()
    }

    async fn find_many(&self, plan: &QueryPlan) -> Result<(Vec<E>, i64), AppError> {
        let mut tx = self.pool.begin().await?;
        // Count and page must see the same snapshot.
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ READ ONLY")
            .execute(&mut *tx)
            .await?;

        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM ");
        count.push(quoted(E::TABLE));
        push_filters(&mut count, plan);
        let total: i64 = count.build_query_scalar::<i64>().fetch_one(&mut *tx).await?;

        let mut select = QueryBuilder::new("");
        Self::push_select(&mut select);
        push_filters(&mut select, plan);

        select.push(" ORDER BY ");
        {
            let mut order = select.separated(", ");
            for key in &plan.sort {
                order.push(format!(
                    "{} {}",
                    quoted(key.field),
                    if key.descending { "DESC" } else { "ASC" }
                ));
            }
        }
        select
            .push(" LIMIT ")
            .push_bind(plan.page.limit())
            .push(" OFFSET ")
            .push_bind(plan.page.offset());

        let rows = select.build().fetch_all(&mut *tx).await?;
        tx.commit().await?;

        let items = rows.iter().map(Self::decode).collect::<Result<Vec<_>, _>>()?;
        Ok((items, total))
    }

    async fn insert(&self, record: Record, actor: Option<i64>) -> Result<E, AppError> {
        let columns = columns::writable::<E>(&record)?;

        let mut builder = QueryBuilder::new("INSERT INTO ");
        builder.push(quoted(E::TABLE)).push(" (");
        {
            let mut names = builder.separated(", ");
            for (def, _) in &columns {
                names.push(quoted(def.name));
            }
            names.push(quoted(CREATED_BY));
            names.push(quoted(UPDATED_BY));
        }
        builder.push(") VALUES (");
        for (_, value) in &columns {
            push_value(&mut builder, value);
            builder.push(", ");
        }
        builder
            .push_bind(actor)
            .push(", ")
            .push_bind(actor)
            .push(") RETURNING ");
        Self::push_columns(&mut builder);

        let mut tx = self.pool.begin().await?;
        let row = builder.build().fetch_one(&mut *tx).await?;
        let entity = Self::decode(&row)?;
        tx.commit().await?;

        Ok(entity)
    }

    async fn update_fields(
        &self,
        id: i64,
        changes: Record,
        actor: Option<i64>,
    ) -> Result<Option<E>, AppError> {
        let columns = columns::writable::<E>(&changes)?;

        let mut builder = QueryBuilder::new("UPDATE ");
        builder.push(quoted(E::TABLE)).push(" SET ");
        for (def, value) in &columns {
            builder.push(quoted(def.name)).push(" = ");
            push_value(&mut builder, value);
            builder.push(", ");
        }
        builder
            .push("\"updated_at\" = now(), ")
            .push(quoted(UPDATED_BY))
            .push(" = ")
            .push_bind(actor)
            .push(" WHERE \"id\" = ")
            .push_bind(id)
            .push(" AND ")
            .push(quoted(DELETED_AT))
            .push(" IS NULL RETURNING ");
        Self::push_columns(&mut builder);

        let mut tx = self.pool.begin().await?;
        let row = builder.build().fetch_optional(&mut *tx).await?;
        let entity = row.as_ref().map(Self::decode).transpose()?;
        tx.commit().await?;

        Ok(entity)
    }

    async fn delete(&self, id: i64, actor: Option<i64>) -> Result<bool, AppError> {
        let mut builder = QueryBuilder::new("UPDATE ");
        builder
            .push(quoted(E::TABLE))
            .push(" SET ")
            .push(quoted(DELETED_AT))
            .push(" = now(), ")
            .push(quoted(DELETED_BY))
            .push(" = ")
            .push_bind(actor)
            .push(" WHERE \"id\" = ")
            .push_bind(id)
            .push(" AND ")
            .push(quoted(DELETED_AT))
            .push(" IS NULL");

        let mut tx = self.pool.begin().await?;
        let result = builder.build().execute(&mut *tx).await?;
        tx.commit().await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::Color;
    use crate::domain::query::{FilterCondition, FilterOperator, FilterSpec, PageRequest, SortSpec};

    #[test]
    fn test_like_escape() {
        assert_eq!(like_escape("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(like_escape("plain"), "plain");
    }

    #[test]
    fn test_quoted_identifier() {
        assert_eq!(quoted("hex_code"), "\"hex_code\"");
        assert_eq!(quoted("we\"ird"), "\"we\"\"ird\"");
    }

    #[test]
    fn test_filtered_select_sql() {
        let plan = QueryPlan::build::<Color>(
            &FilterSpec::new()
                .and(FilterCondition::new("name", FilterOperator::StartsWith, "Re"))
                .and(FilterCondition::range("id", 1, 9)),
            &[SortSpec::desc("name")],
            PageRequest::default(),
        )
        .unwrap();

        let mut builder = QueryBuilder::new("");
        PgResourceRepository::<Color>::push_select(&mut builder);
        push_filters(&mut builder, &plan);

        assert_eq!(
            builder.sql(),
            "SELECT \"id\", \"created_at\", \"updated_at\", \"name\", \"hex_code\" FROM \"colors\" \
             WHERE \"deleted_at\" IS NULL AND \"name\" ILIKE $1 AND \"id\" BETWEEN $2 AND $3"
        );
    }
}
