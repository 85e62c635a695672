//! Persisted records and the Persistence boundary.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use tributary_connector::{Permission, SyncScope};

use crate::error::SyncResult;

/// The last persisted state of one synchronized object.
///
/// Owned exclusively by the Persistence boundary: the engine reads these and
/// proposes updates via [`RecordProposal`], but never mutates one directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedRecord {
    /// Internally owned id, stable across revisions.
    pub id: Uuid,
    /// The external system's identifier.
    pub external_id: String,
    /// External id of the parent container, if resolved.
    pub parent_external_id: Option<String>,
    /// Monotonic version; incremented by exactly 1 on every accepted update.
    pub version: i64,
    /// Revision marker from the source at the time of the last sync.
    pub revision_tag: Option<String>,
    /// Path within the scope at the time of the last sync.
    pub path: String,
    /// Display name at the time of the last sync.
    pub name: String,
}

/// The next state the engine proposes for a record.
///
/// `id` is `None` for brand-new records; Persistence assigns one on accept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordProposal {
    /// Existing record id, or `None` for a new record.
    pub id: Option<Uuid>,
    /// The external system's identifier.
    pub external_id: String,
    /// Resolved parent external id, if any.
    pub parent_external_id: Option<String>,
    /// Proposed version: `0` for new records, else `existing.version + 1`.
    pub version: i64,
    /// Revision marker from the incoming item.
    pub revision_tag: Option<String>,
    /// Current path of the item.
    pub path: String,
    /// Current display name.
    pub name: String,
}

/// Read access to persisted records — the Persistence side of the boundary.
///
/// Implementations wrap their lookups in short-lived transactions; no call
/// here is ever held open across an external API request.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Look up the record for an external id within a scope.
    async fn get_by_external_id(
        &self,
        scope: &SyncScope,
        external_id: &str,
    ) -> SyncResult<Option<PersistedRecord>>;

    /// Look up the record at a path within a scope.
    async fn get_by_path(
        &self,
        scope: &SyncScope,
        path: &str,
    ) -> SyncResult<Option<PersistedRecord>>;

    /// Last persisted permission set for an item; empty for unknown items.
    async fn get_permissions(
        &self,
        scope: &SyncScope,
        external_id: &str,
    ) -> SyncResult<Vec<Permission>>;
}
