//! In-process implementation of the generic resource store.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::marker::PhantomData;
use tokio::sync::RwLock;

use super::columns::{self, CREATED_BY, DELETED_AT, DELETED_BY, UPDATED_BY};
use crate::domain::query::{Entity, FieldValue, QueryPlan, Record};
use crate::domain::repositories::ResourceRepository;
use crate::error::AppError;

#[derive(Default)]
struct Table {
    last_id: i64,
    rows: BTreeMap<i64, Record>,
}

impl Table {
    fn live(&self) -> impl Iterator<Item = &Record> {
        self.rows.values().filter(|r| is_live(r))
    }

    fn live_mut(&mut self, id: i64) -> Option<&mut Record> {
        self.rows.get_mut(&id).filter(|r| is_live(r))
    }

    /// Rejects values colliding with a unique field of another live row.
    fn check_unique<E: Entity>(&self, candidate: &Record, own_id: Option<i64>) -> Result<(), AppError> {
        for def in E::all_fields().filter(|f| f.unique) {
            let value = match candidate.get(def.name) {
                None | Some(FieldValue::Null) => continue,
                Some(v) => v,
            };

            let taken = self.live().any(|row| {
                row.integer("id").ok() != own_id
                    && row.get(def.name).and_then(|v| v.compare(value)) == Some(Ordering::Equal)
            });

            if taken {
                return Err(AppError::conflict(
                    format!("{} with this {} already exists", E::RESOURCE, def.name),
                    json!({ "field": def.name }),
                ));
            }
        }
        Ok(())
    }
}

fn is_live(record: &Record) -> bool {
    record.get(DELETED_AT).is_none_or(FieldValue::is_null)
}

/// [`ResourceRepository`] backed by a map in process memory.
///
/// Used by tests and local runs without PostgreSQL. It mirrors the SQL store:
/// soft deletes, unique fields enforced among live rows, the same filter and
/// ordering semantics through [`QueryPlan::matches`] and [`QueryPlan::compare`].
/// Each call takes the table lock once, so every operation is atomic.
pub struct InMemoryResourceRepository<E> {
    table: RwLock<Table>,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> InMemoryResourceRepository<E> {
    pub fn new() -> Self {
        Self {
            table: RwLock::new(Table::default()),
            _entity: PhantomData,
        }
    }
}

impl<E: Entity> Default for InMemoryResourceRepository<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<E: Entity> ResourceRepository<E> for InMemoryResourceRepository<E> {
    async fn find_by_id(&self, id: i64) -> Result<Option<E>, AppError> {
        let table = self.table.read().await;
        table
            .rows
            .get(&id)
            .filter(|r| is_live(r))
            .map(E::from_record)
            .transpose()
    }

    async fn find_many(&self, plan: &QueryPlan) -> Result<(Vec<E>, i64), AppError> {
        let table = self.table.read().await;

        let mut matching: Vec<&Record> = table.live().filter(|r| plan.matches(r)).collect();
        matching.sort_by(|a, b| plan.compare(a, b));

        let total = i64::try_from(matching.len()).unwrap_or(i64::MAX);
        let offset = usize::try_from(plan.page.offset()).unwrap_or(usize::MAX);
        let limit = usize::try_from(plan.page.limit()).unwrap_or(usize::MAX);

        let items = matching
            .into_iter()
            .skip(offset)
            .take(limit)
            .map(E::from_record)
            .collect::<Result<Vec<_>, _>>()?;

        Ok((items, total))
    }

    async fn insert(&self, record: Record, actor: Option<i64>) -> Result<E, AppError> {
        columns::writable::<E>(&record)?;

        let mut table = self.table.write().await;
        table.check_unique::<E>(&record, None)?;

        let id = table.last_id + 1;
        let now = Utc::now();

        let mut row = Record::new();
        for def in E::FIELDS {
            row.set(def.name, FieldValue::Null);
        }
        row.apply(&record);
        row.set("id", id);
        row.set("created_at", now);
        row.set("updated_at", now);
        row.set(CREATED_BY, actor);
        row.set(UPDATED_BY, actor);
        row.set(DELETED_AT, FieldValue::Null);
        row.set(DELETED_BY, FieldValue::Null);

        let entity = E::from_record(&row)?;
        table.last_id = id;
        table.rows.insert(id, row);

        Ok(entity)
    }

    async fn update_fields(
        &self,
        id: i64,
        changes: Record,
        actor: Option<i64>,
    ) -> Result<Option<E>, AppError> {
        columns::writable::<E>(&changes)?;

        let mut table = self.table.write().await;
        let mut updated = match table.live_mut(id) {
            Some(row) => row.clone(),
            None => return Ok(None),
        };

        updated.apply(&changes);
        table.check_unique::<E>(&updated, Some(id))?;
        updated.set("updated_at", Utc::now());
        updated.set(UPDATED_BY, actor);

        let entity = E::from_record(&updated)?;
        table.rows.insert(id, updated);

        Ok(Some(entity))
    }

    async fn delete(&self, id: i64, actor: Option<i64>) -> Result<bool, AppError> {
        let mut table = self.table.write().await;
        match table.live_mut(id) {
            Some(row) => {
                row.set(DELETED_AT, Utc::now());
                row.set(DELETED_BY, actor);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::Color;
    use crate::domain::query::{FilterCondition, FilterOperator, FilterSpec, PageRequest, SortSpec};

    fn color(name: &str, hex: &str) -> Record {
        Record::new().with("name", name).with("hex_code", hex)
    }

    async fn seeded() -> InMemoryResourceRepository<Color> {
        let repo = InMemoryResourceRepository::new();
        for (name, hex) in [
            ("Red", "#FF0000"),
            ("Green", "#00FF00"),
            ("Blue", "#0000FF"),
            ("Dark red", "#8B0000"),
            ("Black", "#000000"),
        ] {
            repo.insert(color(name, hex), Some(1)).await.unwrap();
        }
        repo
    }

    fn plan(filter: FilterSpec, page: PageRequest) -> QueryPlan {
        QueryPlan::build::<Color>(&filter, &[SortSpec::asc("id")], page).unwrap()
    }

    #[tokio::test]
    async fn test_insert_assigns_ids_and_timestamps() {
        let repo = InMemoryResourceRepository::<Color>::new();
        let first = repo.insert(color("Red", "#FF0000"), None).await.unwrap();
        let second = repo.insert(color("Blue", "#0000FF"), None).await.unwrap();

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert_eq!(first.created_at, first.updated_at);
    }

    #[tokio::test]
    async fn test_duplicate_unique_field_conflicts() {
        let repo = seeded().await;
        let err = repo.insert(color("Red", "#FF0001"), None).await.unwrap_err();

        assert!(matches!(err, AppError::Conflict { .. }));
    }

    #[tokio::test]
    async fn test_update_keeps_absent_fields() {
        let repo = seeded().await;
        let updated = repo
            .update_fields(1, Record::new().with("name", "Crimson"), Some(2))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.name, "Crimson");
        assert_eq!(updated.hex_code, "#FF0000");
    }

    #[tokio::test]
    async fn test_update_to_own_unique_value_is_allowed() {
        let repo = seeded().await;
        let updated = repo
            .update_fields(1, Record::new().with("name", "Red"), None)
            .await
            .unwrap();

        assert!(updated.is_some());
    }

    #[tokio::test]
    async fn test_soft_delete_hides_row_and_frees_unique_value() {
        let repo = seeded().await;

        assert!(repo.delete(1, Some(1)).await.unwrap());
        assert!(!repo.delete(1, Some(1)).await.unwrap());
        assert!(repo.find_by_id(1).await.unwrap().is_none());
        assert!(repo.update_fields(1, Record::new(), None).await.unwrap().is_none());

        repo.insert(color("Red", "#FF0000"), None).await.unwrap();
    }

    #[tokio::test]
    async fn test_total_counts_filtered_set() {
        let repo = seeded().await;
        let filter =
            FilterSpec::new().and(FilterCondition::new("name", FilterOperator::Contains, "red"));

        let (items, total) = repo
            .find_many(&plan(filter, PageRequest::new(Some(1), Some(1)).unwrap()))
            .await
            .unwrap();

        assert_eq!(total, 2);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "Red");
    }

    #[tokio::test]
    async fn test_pages_cover_every_record_once() {
        let repo = seeded().await;
        let mut seen = Vec::new();

        for number in 1..=3 {
            let page = PageRequest::new(Some(number), Some(2)).unwrap();
            let (items, total) = repo.find_many(&plan(FilterSpec::new(), page)).await.unwrap();
            assert_eq!(total, 5);
            assert!(items.len() <= 2);
            seen.extend(items.into_iter().map(|c| c.id));
        }

        assert_eq!(seen, vec![1, 2, 3, 4, 5]);
    }

    #[tokio::test]
    async fn test_no_match_is_empty() {
        let repo = seeded().await;
        let filter =
            FilterSpec::new().and(FilterCondition::new("name", FilterOperator::Equals, "Purple"));

        let (items, total) = repo
            .find_many(&plan(filter, PageRequest::default()))
            .await
            .unwrap();

        assert!(items.is_empty());
        assert_eq!(total, 0);
    }
}
