//! Sync scopes: independently-cursored units of work.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::item::ExternalItem;

/// One independently-cursored unit of sync work, such as a single user's
/// drive, one shared folder, or one project.
///
/// Scopes are created on first encounter and persist for the life of the
/// connector configuration; each holds its own resume cursor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SyncScope {
    /// Connector instance this scope belongs to.
    pub connector_id: Uuid,
    /// Kind of entity the scope enumerates (e.g. `drive`, `shared_folder`,
    /// `project`).
    pub kind: String,
    /// External identifier of the scoped entity.
    pub scope_id: String,
    /// Root path of the scope; items whose parent is this path are
    /// top-level.
    pub root_path: String,
    /// Acting principal for this scope, used as the fail-open permission
    /// owner. Falls back to `scope_id` when unset.
    pub owner_id: Option<String>,
}

impl SyncScope {
    /// Create a scope rooted at `/`.
    pub fn new(connector_id: Uuid, kind: impl Into<String>, scope_id: impl Into<String>) -> Self {
        Self {
            connector_id,
            kind: kind.into(),
            scope_id: scope_id.into(),
            root_path: "/".to_string(),
            owner_id: None,
        }
    }

    /// Set the scope root path.
    #[must_use]
    pub fn with_root_path(mut self, root_path: impl Into<String>) -> Self {
        self.root_path = root_path.into();
        self
    }

    /// Set the acting principal.
    #[must_use]
    pub fn with_owner(mut self, owner_id: impl Into<String>) -> Self {
        self.owner_id = Some(owner_id.into());
        self
    }

    /// Stable key used to persist this scope's sync point.
    #[must_use]
    pub fn key(&self) -> String {
        format!("{}:{}:{}", self.connector_id, self.kind, self.scope_id)
    }

    /// Acting principal id for fail-open permission fallback.
    #[must_use]
    pub fn owner(&self) -> &str {
        self.owner_id.as_deref().unwrap_or(&self.scope_id)
    }

    /// Derive a child scope from a container item (a shared folder inside a
    /// drive becomes its own scope with its own cursor).
    #[must_use]
    pub fn child_for(&self, item: &ExternalItem) -> Self {
        Self {
            connector_id: self.connector_id,
            kind: self.kind.clone(),
            scope_id: item.external_id.clone(),
            root_path: item.path.clone(),
            owner_id: self.owner_id.clone(),
        }
    }
}

impl std::fmt::Display for SyncScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}
