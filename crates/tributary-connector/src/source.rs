//! The Change Source trait implemented by every connector.

use async_trait::async_trait;

use crate::error::ConnectorResult;
use crate::item::ExternalItem;
use crate::permission::Permission;
use crate::scope::SyncScope;

/// One page of changes from an external change feed.
#[derive(Debug, Clone)]
pub struct ChangePage {
    /// Changed items in source order.
    pub items: Vec<ExternalItem>,
    /// Cursor to fetch the next page of this run. Persisting it lets a
    /// crashed run resume from the last completed page.
    pub next_cursor: Option<String>,
    /// Resume point for the *next* run; only meaningful on the final page.
    pub delta_link: Option<String>,
    /// Whether further pages remain in this run.
    pub has_more: bool,
}

impl ChangePage {
    /// Create an empty final page.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            next_cursor: None,
            delta_link: None,
            has_more: false,
        }
    }

    /// Create a final page with items.
    #[must_use]
    pub fn with_items(items: Vec<ExternalItem>) -> Self {
        Self {
            items,
            next_cursor: None,
            delta_link: None,
            has_more: false,
        }
    }

    /// Set the next-page cursor and mark the page as non-final.
    pub fn with_next_cursor(mut self, cursor: impl Into<String>) -> Self {
        self.next_cursor = Some(cursor.into());
        self.has_more = true;
        self
    }

    /// Set the delta link handed to the next run.
    pub fn with_delta_link(mut self, delta_link: impl Into<String>) -> Self {
        self.delta_link = Some(delta_link.into());
        self
    }
}

/// A paginated change feed for one connector.
///
/// Implementations wrap a specific external API (Dropbox delta listing,
/// GitLab events, OneDrive delta links, ...) and normalize its output into
/// [`ExternalItem`]s. Everything protocol-specific — authentication, token
/// refresh, field mapping, payload parsing — stays inside the
/// implementation.
///
/// # Cursors
///
/// Cursors are opaque to the engine. `list_changes` with `None` performs a
/// full listing; with a previously returned `next_cursor` or `delta_link`
/// it resumes from that point. Sources that expire cursors should return
/// [`ConnectorError::InvalidCursor`](crate::error::ConnectorError::InvalidCursor)
/// so the engine can fall back to a full sync.
#[async_trait]
pub trait ChangeSource: Send + Sync {
    /// Human-readable name of the backing system, for logs.
    fn source_name(&self) -> &str;

    /// List one page of changed items for a scope.
    ///
    /// `cursor` is `None` for a full listing, otherwise an opaque resume
    /// token from a previous page or run. `batch_size` is a hint; sources
    /// may return fewer items.
    async fn list_changes(
        &self,
        scope: &SyncScope,
        cursor: Option<&str>,
        batch_size: u32,
    ) -> ConnectorResult<ChangePage>;

    /// Fetch the source's current "latest" pointer with a minimal request.
    ///
    /// Used once, after a full sync completes, to anchor the cursor so the
    /// next run can start incrementally.
    async fn latest_cursor(&self, scope: &SyncScope) -> ConnectorResult<String>;

    /// Fetch the current permission set for an item.
    ///
    /// A failure here is not fatal for the item: the engine falls back to
    /// an owner-only permission set.
    async fn fetch_permissions(
        &self,
        scope: &SyncScope,
        item: &ExternalItem,
    ) -> ConnectorResult<Vec<Permission>>;

    /// Optional item fields this source may drop and retry without when the
    /// external API rejects them with a validation error.
    ///
    /// Declared as data so each adapter states its own quirk instead of
    /// duplicating strip-and-retry logic.
    fn droppable_fields(&self) -> &[&str] {
        &[]
    }
}
