//! Integration tests for the users domain
//!
//! These use real PostgreSQL via testcontainers to check:
//! - column filters and paging against the generated SQL, up to `u64::MAX`
//! - the unique email constraint
//! - case-insensitive name search
//! - absence handling of update and delete

use domain_users::*;
use test_utils::{TestDataBuilder, TestDatabase, assertions::*};

fn input(builder: &TestDataBuilder, local: &str, name: &str) -> CreateUser {
    CreateUser {
        email: builder.email(local),
        name: name.to_string(),
        password: "secret123".to_string(),
        is_active: None,
    }
}

#[tokio::test]
async fn test_create_and_get_user() {
    let db = TestDatabase::new().await;
    let service = UserService::new(PgUserRepository::new(db.connection()));
    let builder = TestDataBuilder::from_test_name("create_and_get");

    let created = service
        .create(input(&builder, "ada", "Ada"))
        .await
        .unwrap();
    let created = assert_some(created, "created user");

    assert!(created.is_active);
    assert_ne!(created.password_hash, "secret123");
    assert!(password::verify_password("secret123", &created.password_hash).unwrap());

    let by_id = assert_some(
        service.get_one_by_id(created.id).await.unwrap(),
        "user by id",
    );
    assert_eq!(by_id.email, created.email);

    let by_email = service.get_one_by_email(&created.email).await.unwrap();
    assert_eq!(by_email.id, created.id);
}

#[tokio::test]
async fn test_missing_lookups() {
    let db = TestDatabase::new().await;
    let service = UserService::new(PgUserRepository::new(db.connection()));

    assert_none(service.get_one_by_id(123_456).await.unwrap(), "user by id");

    let result = service.get_one_by_email("ghost@example.com").await;
    assert!(matches!(result, Err(UserError::EmailNotFound)));
}

#[tokio::test]
async fn test_duplicate_email_constraint() {
    let db = TestDatabase::new().await;
    let repo = PgUserRepository::new(db.connection());
    let builder = TestDataBuilder::from_test_name("duplicate_email");

    repo.create(input(&builder, "dup", "First")).await.unwrap();

    let result = repo.create(input(&builder, "dup", "Second")).await;
    assert!(
        matches!(result, Err(UserError::DuplicateEmail(_))),
        "Expected DuplicateEmail error, got {:?}",
        result
    );
}

#[tokio::test]
async fn test_get_all_filters_and_pages() {
    let db = TestDatabase::new().await;
    let service = UserService::new(PgUserRepository::new(db.connection()));
    let builder = TestDataBuilder::from_test_name("get_all_filters");

    let mut ids = Vec::new();
    for local in ["a", "b", "c"] {
        let user = service
            .create(input(&builder, local, "Paged"))
            .await
            .unwrap()
            .unwrap();
        ids.push(user.id);
    }
    service.deactivate(ids[2]).await.unwrap();

    let active = service
        .get_all(
            UserQuery {
                name: Some("Paged".into()),
                is_active: Some(true),
                ..Default::default()
            }
            .payload(),
            0,
            DEFAULT_LIMIT,
        )
        .await
        .unwrap();
    let active_ids: Vec<i32> = active.iter().map(|u| u.id).collect();
    assert_eq!(active_ids, ids[..2].to_vec());

    let page = service
        .get_all(filter_on("name", "Paged"), 1, 1)
        .await
        .unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].id, ids[1]);

    let all = service
        .get_all(filter_on("name", "Paged"), 0, u64::MAX)
        .await
        .unwrap();
    assert_eq!(all.len(), 3);

    let past_end = service
        .get_all(filter_on("name", "Paged"), u64::MAX, u64::MAX)
        .await
        .unwrap();
    assert!(past_end.is_empty());

    let none = service
        .get_all(filter_on("name", "Nobody"), 0, DEFAULT_LIMIT)
        .await
        .unwrap();
    assert!(none.is_empty());
}

#[tokio::test]
async fn test_filter_by_name_ignores_case_and_wildcards() {
    let db = TestDatabase::new().await;
    let service = UserService::new(PgUserRepository::new(db.connection()));
    let builder = TestDataBuilder::from_test_name("filter_by_name");

    service
        .create(input(&builder, "ada", "Ada Lovelace"))
        .await
        .unwrap();
    service
        .create(input(&builder, "grace", "Grace Hopper"))
        .await
        .unwrap();

    let found = assert_some(
        service.get_filter_by_name("LOVE").await.unwrap(),
        "name match",
    );
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].name, "Ada Lovelace");

    assert_none(service.get_filter_by_name("%").await.unwrap(), "literal %");
    assert_none(service.get_filter_by_name("zzz").await.unwrap(), "no match");
}

#[tokio::test]
async fn test_update_rehashes_only_when_password_given() {
    let db = TestDatabase::new().await;
    let service = UserService::new(PgUserRepository::new(db.connection()));
    let builder = TestDataBuilder::from_test_name("update_rehash");

    let created = service
        .create(input(&builder, "ada", "Ada"))
        .await
        .unwrap()
        .unwrap();

    let renamed = service
        .update(
            created.id,
            UpdateUser {
                name: Some("Ada L.".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(renamed.name, "Ada L.");
    assert_eq!(renamed.password_hash, created.password_hash);
    assert!(renamed.updated_at >= created.updated_at);

    let rehashed = service
        .update(
            created.id,
            UpdateUser {
                password: Some("n3w-pass".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .unwrap();
    assert_ne!(rehashed.password_hash, created.password_hash);
    assert!(password::verify_password("n3w-pass", &rehashed.password_hash).unwrap());

    assert_none(
        service
            .update(987_654, UpdateUser::deactivation())
            .await
            .unwrap(),
        "update of missing id",
    );
}

#[tokio::test]
async fn test_deactivate_and_delete() {
    let db = TestDatabase::new().await;
    let service = UserService::new(PgUserRepository::new(db.connection()));
    let builder = TestDataBuilder::from_test_name("deactivate_delete");

    let created = service
        .create(input(&builder, "ada", "Ada"))
        .await
        .unwrap()
        .unwrap();

    let deactivated = service.deactivate(created.id).await.unwrap().unwrap();
    assert!(!deactivated.is_active);
    assert_eq!(deactivated.name, created.name);

    let deleted = assert_some(service.delete(created.id).await.unwrap(), "first delete");
    assert_eq!(deleted.id, created.id);

    assert_none(service.delete(created.id).await.unwrap(), "second delete");
    assert_none(service.delete(created.id).await.unwrap(), "third delete");
    assert_none(
        service.get_one_by_id(created.id).await.unwrap(),
        "deleted user",
    );
}

#[tokio::test]
async fn test_verify_credentials() {
    let db = TestDatabase::new().await;
    let service = UserService::new(PgUserRepository::new(db.connection()));
    let builder = TestDataBuilder::from_test_name("verify_credentials");

    let created = service
        .create(input(&builder, "ada", "Ada"))
        .await
        .unwrap()
        .unwrap();

    assert!(
        service
            .verify_credentials(&created.email, "secret123")
            .await
            .unwrap()
            .is_some()
    );
    assert_none(
        service
            .verify_credentials(&created.email, "wrong")
            .await
            .unwrap(),
        "wrong password",
    );
}
