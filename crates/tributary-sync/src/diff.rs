//! The record diff engine.
//!
//! [`reconcile`] compares one incoming [`ExternalItem`] against the last
//! persisted state and classifies the change. It is a pure function: the
//! caller performs every lookup and hands the result in, which keeps the
//! classification independently testable.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use tributary_connector::ExternalItem;

use crate::record::{PersistedRecord, RecordProposal};

/// Classified result of reconciling one item against its persisted record.
///
/// At most one of `is_new` / `is_updated` / `is_deleted` is true; all three
/// false means nothing changed. `is_deleted` implies the sub-flags are false
/// and no proposal is carried.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordChange {
    /// No persisted record existed for this external id.
    pub is_new: bool,
    /// The persisted record needs updating.
    pub is_updated: bool,
    /// The source reports the item as removed.
    pub is_deleted: bool,
    /// Name, parent, or path differs from the persisted state.
    pub metadata_changed: bool,
    /// Content must be re-indexed (revision change, or a move that altered
    /// location-dependent context).
    pub content_changed: bool,
    /// The permission set differs from the persisted one.
    pub permissions_changed: bool,
    /// Id of the affected persisted record, when one exists.
    pub record_id: Option<Uuid>,
    /// Proposed next state; absent for deletions.
    pub proposal: Option<RecordProposal>,
}

impl RecordChange {
    /// A deletion for an optionally-known record.
    #[must_use]
    pub fn deleted(record_id: Option<Uuid>) -> Self {
        Self {
            is_new: false,
            is_updated: false,
            is_deleted: true,
            metadata_changed: false,
            content_changed: false,
            permissions_changed: false,
            record_id,
            proposal: None,
        }
    }

    /// Check whether anything at all needs dispatching.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        !self.is_new && !self.is_updated && !self.is_deleted && !self.permissions_changed
    }

    /// Fold in a detected move or rename.
    ///
    /// A parent or path change forces a content re-index because
    /// location-dependent context changed, and upgrades an otherwise
    /// unchanged existing record to an update.
    pub fn mark_moved(&mut self) {
        if self.is_deleted {
            return;
        }
        self.metadata_changed = true;
        self.content_changed = true;
        if !self.is_new {
            self.is_updated = true;
        }
    }

    /// Fold in a permission set difference.
    ///
    /// New records carry their permissions in the creation batch, so the
    /// sub-flag only matters for existing records.
    pub fn mark_permissions_changed(&mut self) {
        if self.is_deleted || self.is_new {
            return;
        }
        self.permissions_changed = true;
    }

    /// Set the resolved parent on the carried proposal.
    pub fn set_parent(&mut self, parent_external_id: Option<String>) {
        if let Some(proposal) = &mut self.proposal {
            proposal.parent_external_id = parent_external_id;
        }
    }
}

/// Compare one incoming item against its optional persisted record.
///
/// Deletions win unconditionally: a deleted item yields
/// `RecordChange::deleted` regardless of persisted state. Otherwise the
/// item is new when no record exists; an existing record is updated when
/// the name differs (metadata) or, for non-containers, the revision tag
/// differs (content). The proposed version is `0` for new records and
/// `existing.version + 1` otherwise.
///
/// Move detection happens after parent resolution, in the caller, via
/// [`RecordChange::mark_moved`].
#[must_use]
pub fn reconcile(item: &ExternalItem, existing: Option<&PersistedRecord>) -> RecordChange {
    if item.deleted {
        return RecordChange::deleted(existing.map(|r| r.id));
    }

    let is_new = existing.is_none();
    let mut metadata_changed = false;
    let mut content_changed = false;

    if let Some(record) = existing {
        metadata_changed = record.name != item.name;
        content_changed =
            !item.is_container && record.revision_tag.as_deref() != item.revision_tag.as_deref();
    }

    let is_updated = !is_new && (metadata_changed || content_changed);

    let proposal = RecordProposal {
        id: existing.map(|r| r.id),
        external_id: item.external_id.clone(),
        // Parent is resolved by the caller after sibling processing.
        parent_external_id: existing.and_then(|r| r.parent_external_id.clone()),
        version: existing.map_or(0, |r| r.version + 1),
        revision_tag: item.revision_tag.clone(),
        path: item.path.clone(),
        name: item.name.clone(),
    };

    RecordChange {
        is_new,
        is_updated,
        is_deleted: false,
        metadata_changed,
        content_changed,
        permissions_changed: false,
        record_id: existing.map(|r| r.id),
        proposal: Some(proposal),
    }
}
