use async_trait::async_trait;
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::Query;
use sqlx::{FromRow, PgPool, Postgres};

use crate::{EntityId, EntityStore, PersistedEntity, Result, StoreError, Version};

/// Bookkeeping columns every entity table carries, in bind order.
const BOOKKEEPING: [&str; 3] = ["id", "version", "created_at"];

/// Table mapping for an entity stored in PostgreSQL.
///
/// The table must have `id uuid`, `version bigint` and `created_at timestamptz`
/// columns next to the entity's own `FIELDS`.
pub trait PgEntity: PersistedEntity + for<'r> FromRow<'r, PgRow> + Unpin {
    /// Table name.
    const TABLE: &'static str;

    /// Non-bookkeeping columns, in the order `bind_fields` binds them.
    const FIELDS: &'static [&'static str];

    /// Binds the values of `FIELDS`, in order, onto `query`.
    fn bind_fields<'q>(
        &'q self,
        query: Query<'q, Postgres, PgArguments>,
    ) -> Query<'q, Postgres, PgArguments>;
}

/// PostgreSQL-backed entity store.
///
/// Cloning shares the pool, so one `PgStore` per logical connection
/// (read-write, read-only) is enough.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Creates a new PostgreSQL store over an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    fn columns<T: PgEntity>() -> String {
        BOOKKEEPING
            .iter()
            .chain(T::FIELDS.iter())
            .copied()
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn insert_sql<T: PgEntity>() -> String {
        let placeholders = (1..=BOOKKEEPING.len() + T::FIELDS.len())
            .map(|n| format!("${n}"))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "INSERT INTO {} ({}) VALUES ({placeholders})",
            T::TABLE,
            Self::columns::<T>()
        )
    }

    /// `$1` is the id and `$2` the observed version; fields start at `$3`.
    fn update_sql<T: PgEntity>() -> String {
        let assignments = T::FIELDS
            .iter()
            .enumerate()
            .map(|(i, field)| format!("{field} = ${}", i + 3))
            .chain(std::iter::once("version = version + 1".to_string()))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "UPDATE {} SET {assignments} WHERE id = $1 AND version = $2",
            T::TABLE
        )
    }
}

fn map_write_error(e: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return StoreError::UniqueViolation {
            constraint: db_err.constraint().unwrap_or("unknown").to_string(),
        };
    }
    StoreError::Database(e)
}

#[async_trait]
impl<T: PgEntity> EntityStore<T> for PgStore {
    async fn insert(&self, entity: &T) -> Result<()> {
        let sql = Self::insert_sql::<T>();
        let query = sqlx::query(&sql)
            .bind(entity.id().as_uuid())
            .bind(entity.version().as_i64())
            .bind(entity.created_at());

        entity
            .bind_fields(query)
            .execute(&self.pool)
            .await
            .map_err(map_write_error)?;

        Ok(())
    }

    async fn fetch(&self, id: EntityId) -> Result<Option<T>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE id = $1",
            Self::columns::<T>(),
            T::TABLE
        );
        let entity = sqlx::query_as::<_, T>(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        Ok(entity)
    }

    async fn fetch_all(&self) -> Result<Vec<T>> {
        let sql = format!(
            "SELECT {} FROM {} ORDER BY created_at ASC, id ASC",
            Self::columns::<T>(),
            T::TABLE
        );
        let entities = sqlx::query_as::<_, T>(&sql).fetch_all(&self.pool).await?;

        Ok(entities)
    }

    async fn update_versioned(&self, entity: &T, observed: Version) -> Result<u64> {
        let sql = Self::update_sql::<T>();
        let query = sqlx::query(&sql)
            .bind(entity.id().as_uuid())
            .bind(observed.as_i64());

        let result = entity
            .bind_fields(query)
            .execute(&self.pool)
            .await
            .map_err(map_write_error)?;

        Ok(result.rows_affected())
    }

    async fn delete(&self, id: EntityId) -> Result<u64> {
        let sql = format!("DELETE FROM {} WHERE id = $1", T::TABLE);
        let result = sqlx::query(&sql)
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn count(&self) -> Result<u64> {
        let sql = format!("SELECT COUNT(*) FROM {}", T::TABLE);
        let count: i64 = sqlx::query_scalar(&sql).fetch_one(&self.pool).await?;

        Ok(count.max(0) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use sqlx::Row;

    #[derive(Clone)]
    struct Widget {
        id: EntityId,
        version: Version,
        created_at: DateTime<Utc>,
        name: String,
        colour: String,
    }

    impl PersistedEntity for Widget {
        const ENTITY_TYPE: &'static str = "widget";

        fn shell(id: EntityId, created_at: DateTime<Utc>) -> Self {
            Self {
                id,
                version: Version::initial(),
                created_at,
                name: String::new(),
                colour: String::new(),
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

    impl<'r> FromRow<'r, PgRow> for Widget {
        fn from_row(row: &'r PgRow) -> std::result::Result<Self, sqlx::Error> {
            Ok(Self {
                id: EntityId::from_uuid(row.try_get("id")?),
                version: Version::new(row.try_get("version")?),
                created_at: row.try_get("created_at")?,
                name: row.try_get("name")?,
                colour: row.try_get("colour")?,
            })
        }
    }

    impl PgEntity for Widget {
        const TABLE: &'static str = "widgets";
        const FIELDS: &'static [&'static str] = &["name", "colour"];

        fn bind_fields<'q>(
            &'q self,
            query: Query<'q, Postgres, PgArguments>,
        ) -> Query<'q, Postgres, PgArguments> {
            query.bind(&self.name).bind(&self.colour)
        }
    }

    #[test]
    fn insert_sql_lists_bookkeeping_then_fields() {
        assert_eq!(
            PgStore::insert_sql::<Widget>(),
            "INSERT INTO widgets (id, version, created_at, name, colour) VALUES ($1, $2, $3, $4, $5)"
        );
    }

    #[test]
    fn update_sql_is_version_conditioned() {
        assert_eq!(
            PgStore::update_sql::<Widget>(),
            "UPDATE widgets SET name = $3, colour = $4, version = version + 1 \
             WHERE id = $1 AND version = $2"
        );
    }

    #[test]
    fn columns_cover_every_mapped_field() {
        assert_eq!(
            PgStore::columns::<Widget>(),
            "id, version, created_at, name, colour"
        );
    }
}
