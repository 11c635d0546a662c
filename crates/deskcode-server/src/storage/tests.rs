//! Storage layer tests for the `DeskCode` admin server.

use super::db::{AdminDatabase, DatabaseError};
use super::models::{Page, STATUS_DISABLED};
use super::queries_codes::{CodeFilter, NewCodeParams};
use super::queries_profiles::{ProfileDeleteOutcome, ProfileFilter, ProfileParams, ProfileUpdate};
use deskcode_core::db::unix_timestamp;

const FIRST_PAGE: Page = Page { number: 1, size: 20 };

async fn test_db() -> AdminDatabase {
    AdminDatabase::open_in_memory().await.unwrap()
}

fn profile<'a>(name: &'a str, is_default: bool) -> ProfileParams<'a> {
    ProfileParams {
        name,
        description: "",
        region: "eu",
        id_server: "id.example.com",
        relay_server: "relay.example.com",
        api_server: "",
        access_key: "key",
        is_enabled: true,
        is_default,
        priority: 0,
    }
}

async fn seed_admin(db: &AdminDatabase) -> i64 {
    db.create_admin_user("admin", "hash").await.unwrap().id
}

async fn seed_code(db: &AdminDatabase, code: &str, profile_id: i64, created_by: i64) -> i64 {
    db.insert_code(&NewCodeParams {
        code,
        profile_id,
        expires_at: None,
        max_usage: None,
        created_by,
    })
    .await
    .unwrap()
    .id
}

async fn default_ids(db: &AdminDatabase) -> Vec<i64> {
    let filter = ProfileFilter {
        is_default: Some(true),
        ..ProfileFilter::default()
    };
    db.list_profiles(&filter, FIRST_PAGE)
        .await
        .unwrap()
        .into_iter()
        .map(|p| p.id)
        .collect()
}

// === Admin user tests ===

#[tokio::test]
async fn create_and_get_admin_user() {
    let db = test_db().await;
    let user = db.create_admin_user("alice", "hash123").await.unwrap();
    assert_eq!(user.username, "alice");

    let by_name = db.get_admin_user_by_username("alice").await.unwrap();
    assert_eq!(by_name.id, user.id);
    assert!(matches!(
        db.get_admin_user_by_username("bob").await,
        Err(DatabaseError::NotFound(_))
    ));
}

#[tokio::test]
async fn duplicate_username_conflicts() {
    let db = test_db().await;
    db.create_admin_user("alice", "h").await.unwrap();
    assert!(matches!(
        db.create_admin_user("alice", "h").await,
        Err(DatabaseError::Conflict(_))
    ));
}

// === Profile tests ===

#[tokio::test]
async fn create_and_get_profile() {
    let db = test_db().await;
    let created = db.create_profile(&profile("main", false)).await.unwrap();
    let fetched = db.get_profile(created.id).await.unwrap();

    assert_eq!(fetched.name, "main");
    assert_eq!(fetched.id_server, "id.example.com");
    assert!(fetched.is_enabled);
    assert!(!fetched.is_default);
    assert!(fetched.is_available());
}

#[tokio::test]
async fn creating_a_default_replaces_the_previous_one() {
    let db = test_db().await;
    let a = db.create_profile(&profile("a", true)).await.unwrap();
    let b = db.create_profile(&profile("b", true)).await.unwrap();

    assert_eq!(default_ids(&db).await, vec![b.id]);
    assert!(!db.get_profile(a.id).await.unwrap().is_default);
}

#[tokio::test]
async fn set_default_swaps_exactly_one() {
    let db = test_db().await;
    let a = db.create_profile(&profile("a", true)).await.unwrap();
    let b = db.create_profile(&profile("b", false)).await.unwrap();

    db.set_default_profile(b.id).await.unwrap();
    assert_eq!(default_ids(&db).await, vec![b.id]);

    db.set_default_profile(a.id).await.unwrap();
    assert_eq!(default_ids(&db).await, vec![a.id]);
}

#[tokio::test]
async fn set_default_on_missing_profile_keeps_previous_default() {
    let db = test_db().await;
    let a = db.create_profile(&profile("a", true)).await.unwrap();

    assert!(matches!(
        db.set_default_profile(999).await,
        Err(DatabaseError::NotFound(_))
    ));
    assert_eq!(default_ids(&db).await, vec![a.id]);
}

#[tokio::test]
async fn default_profile_must_be_enabled() {
    let db = test_db().await;
    let mut params = profile("a", true);
    params.is_enabled = false;
    db.create_profile(&params).await.unwrap();

    assert!(db.get_default_profile().await.unwrap().is_none());
}

#[tokio::test]
async fn update_merges_absent_flags() {
    let db = test_db().await;
    let created = db.create_profile(&profile("a", true)).await.unwrap();

    let updated = db
        .update_profile(
            created.id,
            &ProfileUpdate {
                name: "renamed",
                description: "d",
                region: "us",
                id_server: "id2",
                relay_server: "relay2",
                api_server: "api2",
                access_key: "k2",
                priority: 5,
                is_enabled: None,
                is_default: None,
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.name, "renamed");
    assert_eq!(updated.priority, 5);
    assert!(updated.is_enabled);
    assert!(updated.is_default);
}

#[tokio::test]
async fn update_to_default_clears_others() {
    let db = test_db().await;
    let a = db.create_profile(&profile("a", true)).await.unwrap();
    let b = db.create_profile(&profile("b", false)).await.unwrap();

    db.update_profile(
        b.id,
        &ProfileUpdate {
            name: "b",
            description: "",
            region: "eu",
            id_server: "id",
            relay_server: "",
            api_server: "",
            access_key: "",
            priority: 0,
            is_enabled: Some(true),
            is_default: Some(true),
        },
    )
    .await
    .unwrap();

    assert_eq!(default_ids(&db).await, vec![b.id]);
    assert!(!db.get_profile(a.id).await.unwrap().is_default);
}

#[tokio::test]
async fn list_profiles_filters_and_orders() {
    let db = test_db().await;
    let mut low = profile("alpha-low", false);
    low.priority = 1;
    let mut high = profile("alpha-high", false);
    high.priority = 9;
    let mut other = profile("beta", false);
    other.region = "us";
    db.create_profile(&low).await.unwrap();
    db.create_profile(&high).await.unwrap();
    db.create_profile(&other).await.unwrap();

    let filter = ProfileFilter {
        name: Some("alpha".to_string()),
        ..ProfileFilter::default()
    };
    let names: Vec<String> = db
        .list_profiles(&filter, FIRST_PAGE)
        .await
        .unwrap()
        .into_iter()
        .map(|p| p.name)
        .collect();
    assert_eq!(names, vec!["alpha-high", "alpha-low"]);
    assert_eq!(db.count_profiles(&filter).await.unwrap(), 2);

    let by_region = ProfileFilter {
        region: Some("us".to_string()),
        ..ProfileFilter::default()
    };
    assert_eq!(db.count_profiles(&by_region).await.unwrap(), 1);

    let second_page = db
        .list_profiles(&ProfileFilter::default(), Page { number: 2, size: 2 })
        .await
        .unwrap();
    assert_eq!(second_page.len(), 1);
}

#[tokio::test]
async fn referenced_profile_cannot_be_deleted() {
    let db = test_db().await;
    let admin = seed_admin(&db).await;
    let used = db.create_profile(&profile("used", false)).await.unwrap();
    let unused = db.create_profile(&profile("unused", false)).await.unwrap();
    seed_code(&db, "KUST-20260101-aa", used.id, admin).await;

    assert_eq!(
        db.delete_profile_if_unreferenced(used.id).await.unwrap(),
        ProfileDeleteOutcome::InUse(1)
    );
    assert!(db.get_profile(used.id).await.is_ok());

    assert_eq!(
        db.delete_profile_if_unreferenced(unused.id).await.unwrap(),
        ProfileDeleteOutcome::Deleted
    );
    assert_eq!(
        db.delete_profile_if_unreferenced(unused.id).await.unwrap(),
        ProfileDeleteOutcome::NotFound
    );
}

// === Code tests ===

#[tokio::test]
async fn duplicate_code_conflicts() {
    let db = test_db().await;
    let admin = seed_admin(&db).await;
    let p = db.create_profile(&profile("p", false)).await.unwrap();
    seed_code(&db, "KUST-20260101-aa", p.id, admin).await;

    let dup = db
        .insert_code(&NewCodeParams {
            code: "KUST-20260101-aa",
            profile_id: p.id,
            expires_at: None,
            max_usage: None,
            created_by: admin,
        })
        .await;
    assert!(matches!(dup, Err(DatabaseError::Conflict(_))));
}

#[tokio::test]
async fn consume_respects_max_usage() {
    let db = test_db().await;
    let admin = seed_admin(&db).await;
    let p = db.create_profile(&profile("p", false)).await.unwrap();
    let code = db
        .insert_code(&NewCodeParams {
            code: "KUST-20260101-bb",
            profile_id: p.id,
            expires_at: None,
            max_usage: Some(2),
            created_by: admin,
        })
        .await
        .unwrap();
    let now = unix_timestamp();

    assert!(db.try_consume_code(code.id, now).await.unwrap());
    assert!(db.try_consume_code(code.id, now).await.unwrap());
    assert!(!db.try_consume_code(code.id, now).await.unwrap());
    assert_eq!(db.get_code(code.id).await.unwrap().usage_count, 2);
}

#[tokio::test]
async fn consume_rejects_expired_and_disabled() {
    let db = test_db().await;
    let admin = seed_admin(&db).await;
    let p = db.create_profile(&profile("p", false)).await.unwrap();
    let now = unix_timestamp();
    let expired = db
        .insert_code(&NewCodeParams {
            code: "KUST-20260101-cc",
            profile_id: p.id,
            expires_at: Some(now - 1),
            max_usage: None,
            created_by: admin,
        })
        .await
        .unwrap();
    let disabled = seed_code(&db, "KUST-20260101-dd", p.id, admin).await;
    assert!(db.set_code_status(disabled, STATUS_DISABLED).await.unwrap());

    assert!(!db.try_consume_code(expired.id, now).await.unwrap());
    assert!(!db.try_consume_code(disabled, now).await.unwrap());
    assert_eq!(db.get_code(expired.id).await.unwrap().usage_count, 0);
}

#[tokio::test]
async fn delete_code_removes_usage_history() {
    let db = test_db().await;
    let admin = seed_admin(&db).await;
    let p = db.create_profile(&profile("p", false)).await.unwrap();
    let code = seed_code(&db, "KUST-20260101-ee", p.id, admin).await;
    let now = unix_timestamp();
    db.append_usage(code, "10.0.0.1", "client/1.0", now).await.unwrap();
    db.append_usage(code, "10.0.0.2", "client/1.0", now).await.unwrap();
    assert_eq!(db.count_usage(code).await.unwrap(), 2);

    assert!(db.delete_code(code).await.unwrap());
    assert_eq!(db.count_usage(code).await.unwrap(), 0);
    assert!(db.find_code("KUST-20260101-ee").await.unwrap().is_none());
    assert!(!db.delete_code(code).await.unwrap());
}

#[tokio::test]
async fn list_codes_joins_profile_and_creator() {
    let db = test_db().await;
    let admin = seed_admin(&db).await;
    let p1 = db.create_profile(&profile("one", false)).await.unwrap();
    let p2 = db.create_profile(&profile("two", false)).await.unwrap();
    seed_code(&db, "KUST-20260101-01", p1.id, admin).await;
    seed_code(&db, "KUST-20260101-02", p2.id, admin).await;
    seed_code(&db, "KUST-20260102-03", p2.id, admin).await;

    let filter = CodeFilter {
        profile_id: Some(p2.id),
        ..CodeFilter::default()
    };
    let rows = db.list_codes(&filter, FIRST_PAGE).await.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].code, "KUST-20260102-03");
    assert_eq!(rows[0].profile_name.as_deref(), Some("two"));
    assert_eq!(rows[0].creator_username.as_deref(), Some("admin"));

    let by_code = CodeFilter {
        code: Some("20260101".to_string()),
        ..CodeFilter::default()
    };
    assert_eq!(db.count_codes(&by_code).await.unwrap(), 2);
}

#[tokio::test]
async fn usage_listing_is_paginated() {
    let db = test_db().await;
    let admin = seed_admin(&db).await;
    let p = db.create_profile(&profile("p", false)).await.unwrap();
    let code = seed_code(&db, "KUST-20260101-ff", p.id, admin).await;
    for i in 0..5 {
        db.append_usage(code, "10.0.0.1", "ua", 1_000 + i).await.unwrap();
    }

    let page = db
        .list_usage(code, Page { number: 1, size: 2 })
        .await
        .unwrap();
    assert_eq!(page.len(), 2);
    assert_eq!(page[0].used_at, 1_004);
    assert_eq!(db.count_usage(code).await.unwrap(), 5);
}

#[tokio::test]
async fn stats_count_active_expired_and_today() {
    let db = test_db().await;
    let admin = seed_admin(&db).await;
    let p = db.create_profile(&profile("p", false)).await.unwrap();
    let now = unix_timestamp();

    let active = seed_code(&db, "KUST-20260101-a1", p.id, admin).await;
    db.insert_code(&NewCodeParams {
        code: "KUST-20260101-a2",
        profile_id: p.id,
        expires_at: Some(now - 10),
        max_usage: None,
        created_by: admin,
    })
    .await
    .unwrap();
    let used_up = db
        .insert_code(&NewCodeParams {
            code: "KUST-20260101-a3",
            profile_id: p.id,
            expires_at: None,
            max_usage: Some(1),
            created_by: admin,
        })
        .await
        .unwrap();
    assert!(db.try_consume_code(used_up.id, now).await.unwrap());

    db.append_usage(active, "a", "b", now).await.unwrap();
    db.append_usage(active, "a", "b", now - 3 * 86_400).await.unwrap();
    db.append_usage(active, "a", "b", now - 20 * 86_400).await.unwrap();
    db.append_usage(active, "a", "b", now - 90 * 86_400).await.unwrap();

    let stats = db.code_stats(now).await.unwrap();
    assert_eq!(stats.total_codes, 3);
    assert_eq!(stats.active_codes, 1);
    assert_eq!(stats.expired_codes, 1);
    // Counter-based: one consume, regardless of the four usage rows.
    assert_eq!(stats.total_usage, 1);
    assert_eq!(stats.today_usage, 1);
    assert_eq!(stats.week_usage, 2);
    assert_eq!(stats.month_usage, 3);
}
