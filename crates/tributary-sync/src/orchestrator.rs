//! Scope synchronization orchestrator.
//!
//! Drives one scope end to end: decides full versus incremental mode from
//! the stored sync point, pulls pages from the source, reconciles each item
//! against persisted state, and dispatches the results. The sync point only
//! advances past a page once every change on it has been handed to the sink,
//! so an interrupted run replays at most the in-flight page (at-least-once).

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, instrument, warn};

use tributary_connector::{ChangePage, ChangeSource, ConnectorError, ExternalItem, SyncScope};

use crate::config::SyncConfig;
use crate::diff::reconcile;
use crate::dispatch::{BatchDispatcher, RecordSink};
use crate::error::{SyncError, SyncResult};
use crate::permissions;
use crate::rate_limiter::RateLimiter;
use crate::record::RecordStore;
use crate::resolver::{order_by_depth, ParentResolver, PathCache};
use crate::sync_point::{SyncPoint, SyncPointStore};

/// How a scope run enumerates the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    /// First run for the scope: enumerate everything.
    Full,
    /// Resume from a stored sync point and fetch only changes.
    Incremental,
}

impl RunMode {
    /// Convert to string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            RunMode::Full => "full",
            RunMode::Incremental => "incremental",
        }
    }
}

impl std::fmt::Display for RunMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Counters for one scope run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScopeSummary {
    /// Run mode the scope executed in.
    pub mode: Option<RunMode>,
    /// Pages fetched from the source.
    pub pages: usize,
    /// Newly created records.
    pub created: usize,
    /// Updated records.
    pub updated: usize,
    /// Deleted records.
    pub deleted: usize,
    /// Items whose persisted state already matched.
    pub unchanged: usize,
    /// Items skipped for item-level errors or invalid payloads.
    pub skipped: usize,
    /// Permission-only updates dispatched.
    pub permission_updates: usize,
}

impl ScopeSummary {
    /// Create an empty summary.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Total items examined.
    #[must_use]
    pub fn total(&self) -> usize {
        self.created + self.updated + self.deleted + self.unchanged + self.skipped
    }
}

/// Result of one scope run.
#[derive(Debug, Clone, Default)]
pub struct ScopeOutcome {
    /// Counters for the run.
    pub summary: ScopeSummary,
    /// Container scopes discovered during the run, for the caller to
    /// enqueue as separate runs.
    pub child_scopes: Vec<SyncScope>,
}

/// Per-item processing verdict, folded into the summary.
enum ItemVerdict {
    Created,
    Updated,
    Deleted,
    Unchanged,
    Skipped,
    PermissionsOnly,
}

/// Orchestrates synchronization of one scope at a time.
///
/// Shared across scope workers behind an `Arc`; all mutable run state lives
/// on the stack of [`run_sync`].
///
/// [`run_sync`]: SyncOrchestrator::run_sync
pub struct SyncOrchestrator {
    source: Arc<dyn ChangeSource>,
    store: Arc<dyn RecordStore>,
    sink: Arc<dyn RecordSink>,
    sync_points: Arc<dyn SyncPointStore>,
    limiter: Arc<RateLimiter>,
    resolver: ParentResolver,
    config: SyncConfig,
    cancel: Arc<AtomicBool>,
}

impl SyncOrchestrator {
    /// Create an orchestrator. Fails when the configuration is out of bounds.
    pub fn new(
        source: Arc<dyn ChangeSource>,
        store: Arc<dyn RecordStore>,
        sink: Arc<dyn RecordSink>,
        sync_points: Arc<dyn SyncPointStore>,
        config: SyncConfig,
    ) -> SyncResult<Self> {
        config.validate()?;
        let limiter = Arc::new(RateLimiter::per_second(u64::from(
            config.rate_limit_per_second,
        )));
        let resolver = ParentResolver::new(store.clone());
        Ok(Self {
            source,
            store,
            sink,
            sync_points,
            limiter,
            resolver,
            config,
            cancel: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Handle used to request cancellation of in-flight runs.
    ///
    /// Cancellation is honored between pages: the current page finishes
    /// dispatching and its sync point is saved before the run stops.
    #[must_use]
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        self.cancel.clone()
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Synchronize one scope to completion.
    ///
    /// An expired cursor on an incremental run is not an error: the stale
    /// sync point is discarded and the scope falls back to a full sync.
    #[instrument(skip(self, scope), fields(scope = %scope.key()))]
    pub async fn run_sync(&self, scope: &SyncScope) -> SyncResult<ScopeOutcome> {
        if !self.config.enabled {
            return Err(SyncError::disabled(scope.key()));
        }

        let point = self.sync_points.get(&scope.key()).await?;
        let mode = match &point {
            Some(_) => RunMode::Incremental,
            None => RunMode::Full,
        };
        let resume = point
            .as_ref()
            .and_then(|p| p.resume_cursor())
            .map(str::to_string);

        match self.run_with_mode(scope, mode, resume).await {
            Err(SyncError::Source(ConnectorError::InvalidCursor { .. }))
                if mode == RunMode::Incremental =>
            {
                warn!("stored cursor rejected by source; falling back to full sync");
                self.sync_points.reset(&scope.key()).await?;
                self.run_with_mode(scope, RunMode::Full, None).await
            }
            other => other,
        }
    }

    /// Execute one run in the given mode.
    async fn run_with_mode(
        &self,
        scope: &SyncScope,
        mode: RunMode,
        resume: Option<String>,
    ) -> SyncResult<ScopeOutcome> {
        let mut cursor = resume;

        // A full run enumerates current state; changes made while it walks
        // the pages are caught by the next incremental run, which starts
        // from a cursor anchored before the walk began.
        let full_anchor = if mode == RunMode::Full {
            self.limiter.acquire().await;
            Some(self.source.latest_cursor(scope).await?)
        } else {
            None
        };

        info!(mode = %mode, "starting scope sync");

        let mut outcome = ScopeOutcome {
            summary: ScopeSummary {
                mode: Some(mode),
                ..ScopeSummary::new()
            },
            child_scopes: Vec::new(),
        };
        let mut cache = PathCache::new();
        let mut dispatcher = BatchDispatcher::new(self.sink.clone(), self.config.batch_size);
        let mut last_delta_link: Option<String> = None;

        loop {
            if self.cancel.load(Ordering::SeqCst) {
                warn!(pages = outcome.summary.pages, "scope sync cancelled");
                return Err(SyncError::cancelled(scope.key()));
            }

            self.limiter.acquire().await;
            let page = self
                .source
                .list_changes(scope, cursor.as_deref(), self.config.batch_size as u32)
                .await?;
            outcome.summary.pages += 1;

            self.process_page(scope, &page, &mut cache, &mut dispatcher, &mut outcome)
                .await?;

            // The page is only complete once everything on it reached the
            // sink; persist progress after that, never before.
            dispatcher.finish_page().await?;

            if let Some(delta) = &page.delta_link {
                last_delta_link = Some(delta.clone());
            }

            if !page.has_more {
                break;
            }

            match &page.next_cursor {
                Some(next) => {
                    self.sync_points
                        .save(&SyncPoint::in_progress(scope.key(), next.clone()))
                        .await?;
                    cursor = Some(next.clone());
                }
                None => {
                    return Err(SyncError::sync_point(
                        "source reported more pages without a cursor",
                    ))
                }
            }

            tokio::time::sleep(self.config.page_pause()).await;
        }

        let completed = match mode {
            // The anchor taken before the walk becomes the incremental
            // baseline; a delta link from the source supersedes it.
            RunMode::Full => SyncPoint::completed(scope.key(), full_anchor, last_delta_link),
            RunMode::Incremental => {
                SyncPoint::completed(scope.key(), page_cursor(cursor), last_delta_link)
            }
        };
        self.sync_points.save(&completed).await?;

        info!(
            mode = %mode,
            pages = outcome.summary.pages,
            created = outcome.summary.created,
            updated = outcome.summary.updated,
            deleted = outcome.summary.deleted,
            unchanged = outcome.summary.unchanged,
            skipped = outcome.summary.skipped,
            "scope sync complete"
        );

        Ok(outcome)
    }

    /// Process one page of items.
    async fn process_page(
        &self,
        scope: &SyncScope,
        page: &ChangePage,
        cache: &mut PathCache,
        dispatcher: &mut BatchDispatcher,
        outcome: &mut ScopeOutcome,
    ) -> SyncResult<()> {
        let mut items = page.items.clone();
        order_by_depth(&mut items);

        for item in &items {
            if item.external_id.is_empty() || item.path.is_empty() {
                warn!(
                    external_id = %item.external_id,
                    path = %item.path,
                    "item missing identifier or path; skipping"
                );
                outcome.summary.skipped += 1;
                continue;
            }

            let verdict = match self.process_item(scope, item, cache, dispatcher).await {
                Ok(v) => v,
                Err(e) if e.is_item_level() => {
                    warn!(
                        external_id = %item.external_id,
                        error = %e,
                        "item failed; skipping"
                    );
                    ItemVerdict::Skipped
                }
                Err(e) => return Err(e),
            };

            match verdict {
                ItemVerdict::Created => outcome.summary.created += 1,
                ItemVerdict::Updated => outcome.summary.updated += 1,
                ItemVerdict::Deleted => outcome.summary.deleted += 1,
                ItemVerdict::Unchanged => outcome.summary.unchanged += 1,
                ItemVerdict::Skipped => outcome.summary.skipped += 1,
                ItemVerdict::PermissionsOnly => outcome.summary.permission_updates += 1,
            }

            if self.config.recurse_into_containers && item.is_container && !item.deleted {
                outcome.child_scopes.push(scope.child_for(item));
            }
        }

        Ok(())
    }

    /// Reconcile and dispatch a single item.
    async fn process_item(
        &self,
        scope: &SyncScope,
        item: &ExternalItem,
        cache: &mut PathCache,
        dispatcher: &mut BatchDispatcher,
    ) -> SyncResult<ItemVerdict> {
        let existing = self
            .store
            .get_by_external_id(scope, &item.external_id)
            .await?;

        if item.deleted {
            if existing.is_none() {
                // Tombstone for something never synced.
                return Ok(ItemVerdict::Unchanged);
            }
            let change = reconcile(item, existing.as_ref());
            dispatcher.add(&change, Vec::new()).await?;
            return Ok(ItemVerdict::Deleted);
        }

        let mut change = reconcile(item, existing.as_ref());

        let resolved_parent = self.resolver.resolve(scope, item, cache).await?;
        if let Some(record) = &existing {
            let moved = record.parent_external_id != resolved_parent || record.path != item.path;
            if moved {
                change.mark_moved();
            }
        }
        change.set_parent(resolved_parent);

        // Containers become parents of later items on this and deeper pages.
        if item.is_container {
            cache.insert(item.path.clone(), item.external_id.clone());
        }

        self.limiter.acquire().await;
        let fetched = self.source.fetch_permissions(scope, item).await;
        let current = permissions::resolve_fetched_permissions(fetched, scope, item);

        if existing.is_some() {
            let stored = self.store.get_permissions(scope, &item.external_id).await?;
            let (current, changed) = permissions::reconcile(current, &stored);
            if changed {
                change.mark_permissions_changed();
            }
            if change.is_noop() {
                return Ok(ItemVerdict::Unchanged);
            }
            let permissions_only = !change.is_updated && change.permissions_changed;
            dispatcher.add(&change, current).await?;
            if permissions_only {
                return Ok(ItemVerdict::PermissionsOnly);
            }
            Ok(ItemVerdict::Updated)
        } else {
            dispatcher.add(&change, current).await?;
            Ok(ItemVerdict::Created)
        }
    }
}

/// The cursor to store for a completed incremental run, when the source
/// issued no delta link.
fn page_cursor(cursor: Option<String>) -> Option<String> {
    cursor.filter(|c| !c.is_empty())
}
