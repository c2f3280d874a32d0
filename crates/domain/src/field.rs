//! Per-field change markers for update commands.

/// Change to a single field: leave it as is, or set it.
///
/// Kept distinct from `Option` so that for an optional column,
/// `Set(None)` (clear it) never collides with `Keep`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldUpdate<V> {
    Keep,
    Set(V),
}

impl<V> FieldUpdate<V> {
    pub fn is_set(&self) -> bool {
        matches!(self, FieldUpdate::Set(_))
    }

    /// Returns the new value, if any.
    pub fn as_set(&self) -> Option<&V> {
        match self {
            FieldUpdate::Keep => None,
            FieldUpdate::Set(value) => Some(value),
        }
    }

    /// Writes the new value into `target`. Returns true if it changed anything.
    pub fn apply_to(self, target: &mut V) -> bool {
        match self {
            FieldUpdate::Keep => false,
            FieldUpdate::Set(value) => {
                *target = value;
                true
            }
        }
    }
}

impl FieldUpdate<String> {
    /// Treats a missing or blank string as `Keep`.
    pub fn non_blank(value: Option<String>) -> Self {
        match value {
            Some(value) if !value.trim().is_empty() => FieldUpdate::Set(value),
            _ => FieldUpdate::Keep,
        }
    }
}

impl<V> Default for FieldUpdate<V> {
    fn default() -> Self {
        FieldUpdate::Keep
    }
}

impl<V> From<Option<V>> for FieldUpdate<V> {
    fn from(value: Option<V>) -> Self {
        match value {
            Some(value) => FieldUpdate::Set(value),
            None => FieldUpdate::Keep,
        }
    }
}
