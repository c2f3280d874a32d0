//! User commands and their handlers.

use common::EntityId;
use store::Version;

use crate::error::DispatchError;
use crate::field::FieldUpdate;
use crate::handler::{CreateHandler, DeleteHandler, UpdateHandler};
use crate::message::{
    CreateCommand, DeleteCommand, DomainCommand, DomainMessage, MessageMeta, UpdateCommand,
};

use super::User;

fn require_non_blank(field: &str, value: String) -> Result<String, DispatchError> {
    if value.trim().is_empty() {
        return Err(DispatchError::invalid(format!("{field} cannot be blank")));
    }
    Ok(value)
}

/// Command to register a new user.
#[derive(Debug, Clone)]
pub struct CreateUser {
    meta: MessageMeta,
    pub username: String,
    pub password: String,
    pub email: String,
}

impl CreateUser {
    /// Creates a new CreateUser command.
    ///
    /// Fails with `InvalidArgument` if any field is blank.
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        email: impl Into<String>,
    ) -> Result<Self, DispatchError> {
        Ok(Self {
            meta: MessageMeta::new(),
            username: require_non_blank("Username", username.into())?,
            password: require_non_blank("Password", password.into())?,
            email: require_non_blank("Email", email.into())?,
        })
    }
}

impl DomainMessage for CreateUser {
    fn meta(&self) -> &MessageMeta {
        &self.meta
    }
}

impl DomainCommand for CreateUser {}
impl CreateCommand for CreateUser {}

/// Command to change some fields of a user.
#[derive(Debug, Clone)]
pub struct UpdateUser {
    meta: MessageMeta,
    pub id: EntityId,
    pub username: FieldUpdate<String>,
    pub password: FieldUpdate<String>,
    pub email: FieldUpdate<String>,
    pub expected_version: Option<Version>,
}

impl UpdateUser {
    /// Creates a new UpdateUser command. Missing or blank values are left unchanged.
    pub fn new(
        id: EntityId,
        username: Option<String>,
        password: Option<String>,
        email: Option<String>,
    ) -> Self {
        Self {
            meta: MessageMeta::new(),
            id,
            username: FieldUpdate::non_blank(username),
            password: FieldUpdate::non_blank(password),
            email: FieldUpdate::non_blank(email),
            expected_version: None,
        }
    }

    /// Pins the write to a version the caller observed earlier.
    pub fn with_expected_version(mut self, version: Version) -> Self {
        self.expected_version = Some(version);
        self
    }
}

impl DomainMessage for UpdateUser {
    fn meta(&self) -> &MessageMeta {
        &self.meta
    }
}

impl DomainCommand for UpdateUser {}

impl UpdateCommand for UpdateUser {
    fn target_id(&self) -> EntityId {
        self.id
    }

    fn expected_version(&self) -> Option<Version> {
        self.expected_version
    }
}

/// Command to remove a user.
#[derive(Debug, Clone)]
pub struct DeleteUser {
    meta: MessageMeta,
    pub id: EntityId,
}

impl DeleteUser {
    pub fn new(id: EntityId) -> Self {
        Self {
            meta: MessageMeta::new(),
            id,
        }
    }
}

impl DomainMessage for DeleteUser {
    fn meta(&self) -> &MessageMeta {
        &self.meta
    }
}

impl DomainCommand for DeleteUser {}

impl DeleteCommand for DeleteUser {
    fn target_id(&self) -> EntityId {
        self.id
    }
}

/// Populates a new user from [`CreateUser`].
#[derive(Debug, Clone, Copy, Default)]
pub struct CreateUserHandler;

impl CreateHandler<User> for CreateUserHandler {
    type Command = CreateUser;

    fn populate(&self, command: &CreateUser, mut shell: User) -> User {
        shell.username = command.username.clone();
        shell.password = command.password.clone();
        shell.email = command.email.clone();
        shell
    }
}

/// Merges [`UpdateUser`] into the stored user.
#[derive(Debug, Clone, Copy, Default)]
pub struct UpdateUserHandler;

impl UpdateHandler<User> for UpdateUserHandler {
    type Command = UpdateUser;

    fn merge(&self, command: &UpdateUser, mut current: User) -> User {
        command.username.clone().apply_to(&mut current.username);
        command.password.clone().apply_to(&mut current.password);
        command.email.clone().apply_to(&mut current.email);
        current
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DeleteUserHandler;

impl DeleteHandler<User> for DeleteUserHandler {
    type Command = DeleteUser;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use store::PersistedEntity;

    #[test]
    fn create_user_rejects_blank_fields() {
        let err = CreateUser::new(" ", "p1", "a@x.com").unwrap_err();
        assert!(
            matches!(err, DispatchError::InvalidArgument(ref msg) if msg.contains("Username"))
        );

        assert!(CreateUser::new("alice", "", "a@x.com").is_err());
        assert!(CreateUser::new("alice", "p1", "\t").is_err());
    }

    #[test]
    fn create_user_handler_copies_fields() {
        let cmd = CreateUser::new("alice", "p1", "a@x.com").unwrap();
        let shell = User::shell(EntityId::new(), Utc::now());

        let user = CreateUserHandler.populate(&cmd, shell.clone());

        assert_eq!(user.id, shell.id);
        assert_eq!(user.username, "alice");
        assert_eq!(user.password, "p1");
        assert_eq!(user.email, "a@x.com");
    }

    #[test]
    fn update_user_treats_blank_as_unchanged() {
        let cmd = UpdateUser::new(
            EntityId::new(),
            Some("alice2".to_string()),
            Some(" ".to_string()),
            None,
        );
        assert_eq!(cmd.username, FieldUpdate::Set("alice2".to_string()));
        assert_eq!(cmd.password, FieldUpdate::Keep);
        assert_eq!(cmd.email, FieldUpdate::Keep);
        assert_eq!(cmd.expected_version(), None);
    }

    #[test]
    fn update_user_handler_only_touches_present_fields() {
        let mut current = User::shell(EntityId::new(), Utc::now());
        current.username = "alice".to_string();
        current.password = "p1".to_string();
        current.email = "a@x.com".to_string();
        current.version = Version::new(4);

        let cmd = UpdateUser::new(current.id, None, None, Some("b@x.com".to_string()));
        let merged = UpdateUserHandler.merge(&cmd, current.clone());

        assert_eq!(merged.username, "alice");
        assert_eq!(merged.password, "p1");
        assert_eq!(merged.email, "b@x.com");
        assert_eq!(merged.version, Version::new(4));
    }

    #[test]
    fn delete_user_handler_targets_command_id() {
        let id = EntityId::new();
        assert_eq!(DeleteUserHandler.target(&DeleteUser::new(id)), id);
    }
}
