//! PostgreSQL-backed store tests.
//!
//! Need a reachable `DATABASE_URL`; run with `cargo test -- --ignored`.

use catalog_api::domain::entities::{Color, DEFAULT_ROLE, NewUser, Property, PropertyCategory};
use catalog_api::domain::query::{
    FilterCondition, FilterOperator, FilterSpec, PageRequest, QueryPlan, Record, SortSpec,
};
use catalog_api::domain::repositories::{ResourceRepository, UserRepository};
use catalog_api::error::AppError;
use catalog_api::infrastructure::persistence::{PgResourceRepository, PgUserRepository};
use sqlx::PgPool;
use std::sync::Arc;

fn color(name: &str, hex: &str) -> Record {
    Record::new().with("name", name).with("hex_code", hex)
}

async fn seed_colors(store: &PgResourceRepository<Color>) {
    for (name, hex) in [
        ("Red", "#FF0000"),
        ("Dark Red", "#8B0000"),
        ("Blue", "#0000FF"),
        ("Redwood", "#A45A52"),
    ] {
        store.insert(color(name, hex), Some(1)).await.unwrap();
    }
}

#[ignore]
#[sqlx::test(migrations = false, fixtures("schema"))]
async fn test_insert_and_find_color(pool: PgPool) {
    let store = PgResourceRepository::<Color>::new(Arc::new(pool));

    let created = store.insert(color("Red", "#FF0000"), Some(1)).await.unwrap();
    assert!(created.id > 0);
    assert_eq!(created.created_at, created.updated_at);

    let found = store.find_by_id(created.id).await.unwrap().unwrap();
    assert_eq!(found, created);
    assert!(store.find_by_id(created.id + 100).await.unwrap().is_none());
}

#[ignore]
#[sqlx::test(migrations = false, fixtures("schema"))]
async fn test_unique_name_conflicts(pool: PgPool) {
    let store = PgResourceRepository::<Color>::new(Arc::new(pool));
    store.insert(color("Red", "#FF0000"), None).await.unwrap();

    let err = store.insert(color("Red", "#EE0000"), None).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict { .. }));
}

#[ignore]
#[sqlx::test(migrations = false, fixtures("schema"))]
async fn test_update_touches_only_given_fields(pool: PgPool) {
    let store = PgResourceRepository::<Color>::new(Arc::new(pool));
    let created = store.insert(color("Red", "#FF0000"), None).await.unwrap();

    let updated = store
        .update_fields(created.id, Record::new().with("hex_code", "#EE0000"), Some(2))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(updated.name, "Red");
    assert_eq!(updated.hex_code, "#EE0000");
    assert!(updated.updated_at >= created.updated_at);
    assert!(store.update_fields(9_999, Record::new(), None).await.unwrap().is_none());
}

#[ignore]
#[sqlx::test(migrations = false, fixtures("schema"))]
async fn test_soft_delete_hides_record_and_frees_name(pool: PgPool) {
    let store = PgResourceRepository::<Color>::new(Arc::new(pool.clone()));
    let created = store.insert(color("Red", "#FF0000"), None).await.unwrap();

    assert!(store.delete(created.id, Some(1)).await.unwrap());
    assert!(!store.delete(created.id, Some(1)).await.unwrap());
    assert!(store.find_by_id(created.id).await.unwrap().is_none());

    let deleted_by: Option<i64> = sqlx::query_scalar("SELECT deleted_by FROM colors WHERE id = $1")
        .bind(created.id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(deleted_by, Some(1));

    store.insert(color("Red", "#FF0000"), None).await.unwrap();
}

#[ignore]
#[sqlx::test(migrations = false, fixtures("schema"))]
async fn test_filter_counts_before_paging(pool: PgPool) {
    let store = PgResourceRepository::<Color>::new(Arc::new(pool));
    seed_colors(&store).await;

    let filter = FilterSpec::new().and(FilterCondition::new(
        "name",
        FilterOperator::Contains,
        "RED",
    ));
    let plan = QueryPlan::build::<Color>(
        &filter,
        &[SortSpec::asc("name")],
        PageRequest::new(Some(1), Some(2)).unwrap(),
    )
    .unwrap();

    let (rows, total) = store.find_many(&plan).await.unwrap();
    assert_eq!(total, 3);
    let names: Vec<_> = rows.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, ["Dark Red", "Red"]);
}

#[ignore]
#[sqlx::test(migrations = false, fixtures("schema"))]
async fn test_filter_excludes_deleted_rows(pool: PgPool) {
    let store = PgResourceRepository::<Color>::new(Arc::new(pool));
    seed_colors(&store).await;
    let blue = store
        .find_many(
            &QueryPlan::build::<Color>(
                &FilterSpec::new().and(FilterCondition::new(
                    "name",
                    FilterOperator::Equals,
                    "Blue",
                )),
                &[],
                PageRequest::new(None, None).unwrap(),
            )
            .unwrap(),
        )
        .await
        .unwrap()
        .0
        .remove(0);
    store.delete(blue.id, None).await.unwrap();

    let plan =
        QueryPlan::build::<Color>(&FilterSpec::new(), &[], PageRequest::new(None, None).unwrap())
            .unwrap();
    let (rows, total) = store.find_many(&plan).await.unwrap();

    assert_eq!(total, 3);
    assert!(rows.iter().all(|c| c.name != "Blue"));
}

#[ignore]
#[sqlx::test(migrations = false, fixtures("schema"))]
async fn test_missing_category_is_bad_request(pool: PgPool) {
    let pool = Arc::new(pool);
    let categories = PgResourceRepository::<PropertyCategory>::new(pool.clone());
    let properties = PgResourceRepository::<Property>::new(pool);

    let category = categories
        .insert(
            Record::new().with("name", "Engine").with("icon", "engine.svg"),
            None,
        )
        .await
        .unwrap();

    let property = |category_id: i64| {
        Record::new()
            .with("name", "Power")
            .with("icon", "bolt.svg")
            .with("unit", "hp")
            .with("data_type", "number")
            .with("category_id", category_id)
    };

    properties.insert(property(category.id), None).await.unwrap();
    let err = properties
        .insert(property(category.id + 50), None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation { .. }));
}

#[ignore]
#[sqlx::test(migrations = false, fixtures("schema"))]
async fn test_user_round_trip(pool: PgPool) {
    let users = PgUserRepository::new(Arc::new(pool));

    let created = users
        .create(NewUser {
            username: "sara.k".to_string(),
            first_name: Some("Sara".to_string()),
            last_name: None,
            email: Some("Sara@Example.com".to_string()),
            mobile_number: Some("09121234567".to_string()),
            password_hash: "hash".to_string(),
            roles: vec![DEFAULT_ROLE.to_string()],
        })
        .await
        .unwrap();

    assert!(users.exists_by_username("sara.k").await.unwrap());
    assert!(users.exists_by_email("sara@example.com").await.unwrap());
    assert_eq!(
        users.find_by_mobile_number("09121234567").await.unwrap().unwrap().id,
        created.id
    );

    users.add_role(created.id, "admin").await.unwrap();
    users.add_role(created.id, "admin").await.unwrap();
    let reloaded = users.find_by_id(created.id).await.unwrap().unwrap();
    assert_eq!(reloaded.roles, vec!["default", "admin"]);
}
