use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::EntityId;

/// Version counter of a persisted entity, used for optimistic concurrency control.
///
/// Entities are created at version 0 and every successful update moves
/// the counter forward by exactly one.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Version(i64);

impl Version {
    /// Creates a new version from a raw value.
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// Returns the version every freshly created entity starts at.
    pub fn initial() -> Self {
        Self(0)
    }

    /// Returns the next version.
    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }

    /// Returns the raw version value.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for Version {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<Version> for i64 {
    fn from(version: Version) -> Self {
        version.0
    }
}

/// Minimal shape every entity managed by a bounded context must satisfy.
///
/// The store owns entity state; the dispatcher only ever holds values it has
/// just read or is about to write.
pub trait PersistedEntity: Clone + Send + Sync + 'static {
    /// Entity type name, used for notifications and log fields.
    const ENTITY_TYPE: &'static str;

    /// Returns a blank entity with the given identity, at `Version::initial()`.
    ///
    /// Non-bookkeeping fields hold placeholder values until a create handler fills them.
    fn shell(id: EntityId, created_at: DateTime<Utc>) -> Self;

    fn id(&self) -> EntityId;

    fn version(&self) -> Version;

    /// Sets the version. Only the dispatcher and stores call this.
    fn set_version(&mut self, version: Version);

    fn created_at(&self) -> DateTime<Utc>;
}
