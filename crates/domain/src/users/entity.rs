//! The user entity and its table mapping.

use chrono::{DateTime, Utc};
use common::EntityId;
use serde::{Deserialize, Serialize};
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::Query;
use sqlx::{FromRow, Postgres, Row};
use store::{PersistedEntity, PgEntity, Version};
use uuid::Uuid;

/// A registered user, one row of the `users` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: EntityId,
    pub version: Version,
    pub created_at: DateTime<Utc>,
    pub username: String,
    pub password: String,
    pub email: String,
}

impl PersistedEntity for User {
    const ENTITY_TYPE: &'static str = "user";

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

impl<'r> FromRow<'r, PgRow> for User {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: EntityId::from_uuid(row.try_get::<Uuid, _>("id")?),
            version: Version::new(row.try_get("version")?),
            created_at: row.try_get("created_at")?,
            username: row.try_get("username")?,
            password: row.try_get("password")?,
            email: row.try_get("email")?,
        })
    }
}

impl PgEntity for User {
    const TABLE: &'static str = "users";
    const FIELDS: &'static [&'static str] = &["username", "password", "email"];

    fn bind_fields<'q>(
        &'q self,
        query: Query<'q, Postgres, PgArguments>,
    ) -> Query<'q, Postgres, PgArguments> {
        query
            .bind(&self.username)
            .bind(&self.password)
            .bind(&self.email)
    }
}

/// Public view of a user. Never carries the password.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserView {
    pub id: EntityId,
    pub version: Version,
    pub username: String,
    pub email: String,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            version: user.version,
            username: user.username.clone(),
            email: user.email.clone(),
        }
    }
}

impl From<User> for UserView {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            version: user.version,
            username: user.username,
            email: user.email,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shell_starts_blank_at_initial_version() {
        let id = EntityId::new();
        let user = User::shell(id, Utc::now());
        assert_eq!(user.id(), id);
        assert_eq!(user.version(), Version::initial());
        assert!(user.username.is_empty());
    }

    #[test]
    fn view_hides_password() {
        let mut user = User::shell(EntityId::new(), Utc::now());
        user.username = "alice".to_string();
        user.password = "secret".to_string();
        user.email = "a@x.com".to_string();

        let json = serde_json::to_value(UserView::from(&user)).unwrap();
        assert_eq!(json["username"], "alice");
        assert_eq!(json["email"], "a@x.com");
        assert!(json.get("password").is_none());
    }
}
