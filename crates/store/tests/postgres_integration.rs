//! PostgreSQL integration tests
//!
//! These tests use a shared PostgreSQL container for efficiency.
//! Run with:
//!
//! ```bash
//! cargo test -p store --test postgres_integration -- --test-threads=1
//! ```

use std::sync::Arc;

use chrono::{DateTime, SubsecRound, Utc};
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::Query;
use sqlx::{FromRow, PgPool, Postgres as Pg, Row};
use store::{
    ConnectionRouter, EntityId, EntityStore, EntityStoreExt, PersistedEntity, PgEntity, PgStore,
    StoreError, Version,
};
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

/// Shared container info - container stays alive for all tests
struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

/// Global shared container
static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();

            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            // Create a temporary pool just for migrations
            let temp_pool = PgPool::connect(&connection_string).await.unwrap();

            // Run migrations using raw_sql to execute multiple statements
            sqlx::raw_sql(include_str!("../../../migrations/001_create_users_table.sql"))
                .execute(&temp_pool)
                .await
                .unwrap();

            temp_pool.close().await;

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

async fn get_test_store() -> PgStore {
    let info = get_container_info().await;
    let pool = PgPool::connect(&info.connection_string).await.unwrap();

    sqlx::query("TRUNCATE TABLE users")
        .execute(&pool)
        .await
        .unwrap();

    PgStore::new(pool)
}

/// Minimal row of the `users` table, independent of any bounded context.
#[derive(Debug, Clone, PartialEq)]
struct Account {
    id: EntityId,
    version: Version,
    created_at: DateTime<Utc>,
    username: String,
    password: String,
    email: String,
}

impl PersistedEntity for Account {
    const ENTITY_TYPE: &'static str = "account";

    fn shell(id: EntityId, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            version: Version::initial(),
            created_at,
            username: String::new(),
            password: String::new(),
            email: String::new(),
        }
    }

    fn id(&self) -> EntityId {
        self.id
    }

    fn version(&self) -> Version {
        self.version
    }

    fn set_version(&mut self, version: Version) {
        self.version = version;
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl<'r> FromRow<'r, PgRow> for Account {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: EntityId::from_uuid(row.try_get("id")?),
            version: Version::new(row.try_get("version")?),
            created_at: row.try_get("created_at")?,
            username: row.try_get("username")?,
            password: row.try_get("password")?,
            email: row.try_get("email")?,
        })
    }
}

impl PgEntity for Account {
    const TABLE: &'static str = "users";
    const FIELDS: &'static [&'static str] = &["username", "password", "email"];

    fn bind_fields<'q>(&'q self, query: Query<'q, Pg, PgArguments>) -> Query<'q, Pg, PgArguments> {
        query
            .bind(&self.username)
            .bind(&self.password)
            .bind(&self.email)
    }
}

async fn fetch_account(store: &PgStore, id: EntityId) -> Option<Account> {
    EntityStore::<Account>::fetch(store, id).await.unwrap()
}

fn account(name: &str) -> Account {
    let mut account = Account::shell(EntityId::new(), Utc::now().trunc_subsecs(6));
    account.username = name.to_string();
    account.password = "secret".to_string();
    account.email = format!("{name}@example.com");
    account
}

#[tokio::test]
async fn insert_and_fetch() {
    let store = get_test_store().await;
    let alice = account("alice");

    store.insert(&alice).await.unwrap();

    assert_eq!(fetch_account(&store, alice.id).await, Some(alice.clone()));
    assert!(EntityStoreExt::<Account>::exists(&store, alice.id).await.unwrap());
}

#[tokio::test]
async fn fetch_missing_returns_none() {
    let store = get_test_store().await;

    assert!(fetch_account(&store, EntityId::new()).await.is_none());
}

#[tokio::test]
async fn fetch_all_orders_by_creation() {
    let store = get_test_store().await;
    let first = account("first");
    let mut second = account("second");
    second.created_at = first.created_at + chrono::Duration::seconds(1);

    // Insert out of order
    store.insert(&second).await.unwrap();
    store.insert(&first).await.unwrap();

    let all = EntityStore::<Account>::fetch_all(&store).await.unwrap();
    let names: Vec<_> = all.iter().map(|a| a.username.as_str()).collect();
    assert_eq!(names, vec!["first", "second"]);
    assert_eq!(EntityStore::<Account>::count(&store).await.unwrap(), 2);
}

#[tokio::test]
async fn versioned_update_applies_once() {
    let store = get_test_store().await;
    let alice = account("alice");
    store.insert(&alice).await.unwrap();

    let mut changed = alice.clone();
    changed.email = "new@example.com".to_string();

    let affected = store
        .update_versioned(&changed, Version::initial())
        .await
        .unwrap();
    assert_eq!(affected, 1);

    // Same observed version again matches nothing
    let affected = store
        .update_versioned(&changed, Version::initial())
        .await
        .unwrap();
    assert_eq!(affected, 0);

    let stored = fetch_account(&store, alice.id).await.unwrap();
    assert_eq!(stored.email, "new@example.com");
    assert_eq!(stored.version, Version::new(1));
    assert_eq!(
        EntityStoreExt::<Account>::current_version(&store, alice.id)
            .await
            .unwrap(),
        Some(Version::new(1))
    );
}

#[tokio::test]
async fn versioned_update_of_deleted_row_affects_nothing() {
    let store = get_test_store().await;
    let alice = account("alice");
    store.insert(&alice).await.unwrap();
    EntityStore::<Account>::delete(&store, alice.id).await.unwrap();

    let affected = store
        .update_versioned(&alice, Version::initial())
        .await
        .unwrap();

    assert_eq!(affected, 0);
}

#[tokio::test]
async fn concurrent_versioned_updates_have_one_winner() {
    let store = get_test_store().await;
    let alice = account("alice");
    store.insert(&alice).await.unwrap();

    let mut a = alice.clone();
    a.username = "alice-a".to_string();
    let mut b = alice.clone();
    b.username = "alice-b".to_string();

    let (ra, rb) = tokio::join!(
        store.update_versioned(&a, Version::initial()),
        store.update_versioned(&b, Version::initial())
    );

    assert_eq!(ra.unwrap() + rb.unwrap(), 1);

    let stored = fetch_account(&store, alice.id).await.unwrap();
    assert_eq!(stored.version, Version::new(1));
    assert!(stored.username == "alice-a" || stored.username == "alice-b");
}

#[tokio::test]
async fn unique_violation_names_constraint() {
    let store = get_test_store().await;
    store.insert(&account("alice")).await.unwrap();

    let mut clash = account("bob");
    clash.username = "alice".to_string();
    let err = store.insert(&clash).await.unwrap_err();

    assert!(err.is_unique_violation());
    match err {
        StoreError::UniqueViolation { constraint } => {
            assert_eq!(constraint, "users_username_key")
        }
        other => panic!("Expected UniqueViolation, got {other:?}"),
    }
}

#[tokio::test]
async fn delete_reports_rows_affected() {
    let store = get_test_store().await;
    let alice = account("alice");
    store.insert(&alice).await.unwrap();

    let first = EntityStore::<Account>::delete(&store, alice.id).await.unwrap();
    let second = EntityStore::<Account>::delete(&store, alice.id).await.unwrap();

    assert_eq!(first, 1);
    assert_eq!(second, 0);
}

#[tokio::test]
async fn router_shares_pool_without_replica() {
    let store = get_test_store().await;
    let router = ConnectionRouter::single(store);
    let alice = account("alice");

    router.read_write().insert(&alice).await.unwrap();

    assert!(fetch_account(router.read_only(), alice.id).await.is_some());
    assert!(!router.has_replica());
}

#[tokio::test]
async fn migrations_are_idempotent() {
    let store = get_test_store().await;

    store.run_migrations().await.unwrap();
    store.run_migrations().await.unwrap();
}
