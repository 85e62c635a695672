//! External items as reported by a change feed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One entity reported by the external system during a change listing.
///
/// Transient: an `ExternalItem` exists only for the duration of one
/// reconciliation pass. The source of truth for what was persisted is the
/// record store, never this type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalItem {
    /// The external system's stable identifier for the object.
    pub external_id: String,
    /// Full path of the item within its scope (e.g. `/reports/q3.xlsx`).
    pub path: String,
    /// Display name of the item.
    pub name: String,
    /// Opaque revision marker from the source (content hash, rev id, etag).
    /// Containers usually have none.
    pub revision_tag: Option<String>,
    /// Whether this item can contain children (folder, project, group).
    pub is_container: bool,
    /// Last modification time reported by the source.
    pub modified_at: Option<DateTime<Utc>>,
    /// Size in bytes, where the source reports one.
    pub size_bytes: Option<u64>,
    /// Whether the source reports this item as removed.
    pub deleted: bool,
}

impl ExternalItem {
    /// Create an item for a leaf object (file, ticket, document).
    pub fn file(
        external_id: impl Into<String>,
        path: impl Into<String>,
        revision_tag: impl Into<String>,
    ) -> Self {
        let path = path.into();
        Self {
            external_id: external_id.into(),
            name: name_from_path(&path),
            path,
            revision_tag: Some(revision_tag.into()),
            is_container: false,
            modified_at: None,
            size_bytes: None,
            deleted: false,
        }
    }

    /// Create an item for a container object (folder, project).
    pub fn container(external_id: impl Into<String>, path: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            external_id: external_id.into(),
            name: name_from_path(&path),
            path,
            revision_tag: None,
            is_container: true,
            modified_at: None,
            size_bytes: None,
            deleted: false,
        }
    }

    /// Create a deletion marker for an item.
    pub fn tombstone(external_id: impl Into<String>, path: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            external_id: external_id.into(),
            name: name_from_path(&path),
            path,
            revision_tag: None,
            is_container: false,
            modified_at: None,
            size_bytes: None,
            deleted: true,
        }
    }

    /// Override the display name (when it differs from the path segment).
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the modification timestamp.
    #[must_use]
    pub fn with_modified_at(mut self, modified_at: DateTime<Utc>) -> Self {
        self.modified_at = Some(modified_at);
        self
    }

    /// Set the reported size.
    #[must_use]
    pub fn with_size(mut self, size_bytes: u64) -> Self {
        self.size_bytes = Some(size_bytes);
        self
    }

    /// Path of this item's parent container.
    ///
    /// Returns `None` when the item is the root itself or carries a bare
    /// relative path with no separator.
    #[must_use]
    pub fn parent_path(&self) -> Option<String> {
        let trimmed = self.path.trim_end_matches('/');
        if trimmed.is_empty() {
            return None;
        }
        match trimmed.rsplit_once('/') {
            Some(("", _)) => Some("/".to_string()),
            Some((parent, _)) => Some(parent.to_string()),
            None => None,
        }
    }

    /// Number of path segments; used to order items parent-before-child.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.path.split('/').filter(|s| !s.is_empty()).count()
    }
}

fn name_from_path(path: &str) -> String {
    path.trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(path)
        .to_string()
}
