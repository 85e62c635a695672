//! Hierarchical parent resolution.
//!
//! Each item's parent container is resolved to an already-known external id:
//! scope root first, then the in-run path cache, then a persistence lookup.
//! The cache lives for exactly one scope run and is discarded with it, so it
//! never goes stale and needs no locking.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;
use tributary_connector::{ExternalItem, SyncScope};

use crate::error::SyncResult;
use crate::record::RecordStore;

/// In-run map from item path to external id.
///
/// Populated by already-processed siblings, so items presented in
/// parent-before-child order resolve without touching Persistence.
#[derive(Debug, Default)]
pub struct PathCache {
    entries: HashMap<String, String>,
}

impl PathCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an item's own external id under its path.
    pub fn insert(&mut self, path: impl Into<String>, external_id: impl Into<String>) {
        self.entries.insert(path.into(), external_id.into());
    }

    /// Look up the external id cached for a path.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<&str> {
        self.entries.get(path).map(String::as_str)
    }

    /// Number of cached paths.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Resolves an item's parent path to a known external id.
pub struct ParentResolver {
    store: Arc<dyn RecordStore>,
}

impl ParentResolver {
    /// Create a resolver over the given record store.
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Resolve the parent external id for an item.
    ///
    /// Order, first match wins: the scope root (top-level, no parent), the
    /// in-run cache, then a persistence lookup whose hit is cached for
    /// later siblings. A miss leaves the parent unresolved; a later run
    /// picks it up once the parent itself has been synced.
    pub async fn resolve(
        &self,
        scope: &SyncScope,
        item: &ExternalItem,
        cache: &mut PathCache,
    ) -> SyncResult<Option<String>> {
        let parent_path = match item.parent_path() {
            Some(p) => p,
            None => return Ok(None),
        };

        if parent_path == scope.root_path {
            return Ok(None);
        }

        if let Some(external_id) = cache.get(&parent_path) {
            return Ok(Some(external_id.to_string()));
        }

        match self.store.get_by_path(scope, &parent_path).await? {
            Some(record) => {
                cache.insert(parent_path, record.external_id.clone());
                Ok(Some(record.external_id))
            }
            None => {
                debug!(
                    scope = %scope.key(),
                    item = %item.external_id,
                    parent_path = %parent_path,
                    "parent not yet known; leaving unresolved"
                );
                Ok(None)
            }
        }
    }
}

/// Sort items shallowest-first so parents are processed before children.
///
/// This is a performance invariant, not a correctness one: out-of-order
/// items still resolve through the persistence fallback, just slower. The
/// sort is stable, preserving source order within one depth.
pub fn order_by_depth(items: &mut [ExternalItem]) {
    items.sort_by_key(ExternalItem::depth);
}
