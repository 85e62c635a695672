//! Batched dispatch to the downstream sink.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};
use tributary_connector::Permission;
use uuid::Uuid;

use crate::diff::RecordChange;
use crate::error::{SyncError, SyncResult};
use crate::record::RecordProposal;

/// The downstream processor (messaging/indexing pipeline).
///
/// Implementations receive reconciled records keyed by external id, so
/// cross-call ordering between creation batches and immediate updates is
/// not load-bearing.
#[async_trait]
pub trait RecordSink: Send + Sync {
    /// A batch of newly discovered records with their permission sets.
    async fn on_new_records(&self, batch: &[(RecordProposal, Vec<Permission>)]) -> SyncResult<()>;

    /// An existing record whose content must be re-indexed.
    async fn on_record_content_update(&self, record: &RecordProposal) -> SyncResult<()>;

    /// An existing record whose metadata changed without a content change.
    async fn on_record_metadata_update(&self, record: &RecordProposal) -> SyncResult<()>;

    /// A record that was removed at the source.
    async fn on_record_deleted(&self, record_id: Uuid) -> SyncResult<()>;

    /// A record whose permission set changed.
    async fn on_permissions_updated(
        &self,
        record: &RecordProposal,
        permissions: &[Permission],
    ) -> SyncResult<()>;
}

/// Accumulates new records and flushes them in size-bounded batches.
///
/// New records are buffered up to `capacity` and flushed when full or at
/// end-of-page. Deletions and updates are comparatively rare and bypass
/// the buffer entirely.
///
/// A failed flush keeps its buffer for exactly one later retry (triggered
/// by the next add or flush); a second consecutive failure propagates so
/// the page loop aborts without advancing the cursor.
pub struct BatchDispatcher {
    sink: Arc<dyn RecordSink>,
    capacity: usize,
    buffer: Vec<(RecordProposal, Vec<Permission>)>,
    flush_failed: bool,
}

impl BatchDispatcher {
    /// Create a dispatcher with the given batch capacity.
    pub fn new(sink: Arc<dyn RecordSink>, capacity: usize) -> Self {
        Self {
            sink,
            capacity: capacity.max(1),
            buffer: Vec::new(),
            flush_failed: false,
        }
    }

    /// Route one reconciled change to the sink.
    ///
    /// Deletions and updates dispatch immediately; new records are buffered
    /// and flushed once the buffer reaches capacity.
    pub async fn add(&mut self, change: &RecordChange, permissions: Vec<Permission>) -> SyncResult<()> {
        if change.is_deleted {
            match change.record_id {
                Some(record_id) => return self.sink.on_record_deleted(record_id).await,
                None => {
                    debug!("deletion for an unknown record; nothing to dispatch");
                    return Ok(());
                }
            }
        }

        let proposal = match &change.proposal {
            Some(p) => p,
            None => {
                return Err(SyncError::internal(
                    "non-deletion change without a proposal",
                ))
            }
        };

        if change.is_new {
            self.buffer.push((proposal.clone(), permissions));
            if self.buffer.len() >= self.capacity {
                self.flush().await?;
            }
            return Ok(());
        }

        if change.content_changed {
            self.sink.on_record_content_update(proposal).await?;
        } else if change.metadata_changed {
            self.sink.on_record_metadata_update(proposal).await?;
        }

        if change.permissions_changed {
            self.sink
                .on_permissions_updated(proposal, &permissions)
                .await?;
        }

        Ok(())
    }

    /// Flush buffered new records to the sink.
    ///
    /// Clears the buffer only on success. The first failure is retained
    /// (logged, buffer kept) so the next add/flush retries it; failing
    /// again returns the error.
    pub async fn flush(&mut self) -> SyncResult<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }

        match self.sink.on_new_records(&self.buffer).await {
            Ok(()) => {
                debug!(count = self.buffer.len(), "dispatched record batch");
                self.buffer.clear();
                self.flush_failed = false;
                Ok(())
            }
            Err(e) if !self.flush_failed => {
                warn!(
                    count = self.buffer.len(),
                    error = %e,
                    "batch flush failed; retaining buffer for one retry"
                );
                self.flush_failed = true;
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// End-of-page flush: drains the buffer, retrying a previously failed
    /// flush once, and fails if anything remains undelivered.
    ///
    /// Callers must not advance the cursor unless this returns `Ok`.
    pub async fn finish_page(&mut self) -> SyncResult<()> {
        self.flush().await?;
        if !self.buffer.is_empty() {
            // First failure was absorbed above; this retry either delivers
            // or surfaces the sink error.
            self.flush().await?;
        }
        if self.buffer.is_empty() {
            Ok(())
        } else {
            Err(SyncError::sink("batch still undelivered after retry"))
        }
    }

    /// Number of buffered, not yet flushed, new records.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tributary_connector::ExternalItem;

    use crate::diff::reconcile;
    use crate::record::PersistedRecord;

    #[derive(Default)]
    struct RecordingSink {
        batch_sizes: Mutex<Vec<usize>>,
        deletes: Mutex<Vec<Uuid>>,
        content_updates: AtomicUsize,
        metadata_updates: AtomicUsize,
        permission_updates: AtomicUsize,
        fail_flushes: AtomicUsize,
    }

    impl RecordingSink {
        fn failing(times: usize) -> Self {
            let sink = Self::default();
            sink.fail_flushes.store(times, Ordering::SeqCst);
            sink
        }
    }

    #[async_trait]
    impl RecordSink for RecordingSink {
        async fn on_new_records(
            &self,
            batch: &[(RecordProposal, Vec<Permission>)],
        ) -> SyncResult<()> {
            let remaining = self.fail_flushes.load(Ordering::SeqCst);
            if remaining > 0 {
                self.fail_flushes.store(remaining - 1, Ordering::SeqCst);
                return Err(SyncError::sink("injected failure"));
            }
            self.batch_sizes.lock().unwrap().push(batch.len());
            Ok(())
        }

        async fn on_record_content_update(&self, _record: &RecordProposal) -> SyncResult<()> {
            self.content_updates.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn on_record_metadata_update(&self, _record: &RecordProposal) -> SyncResult<()> {
            self.metadata_updates.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn on_record_deleted(&self, record_id: Uuid) -> SyncResult<()> {
            self.deletes.lock().unwrap().push(record_id);
            Ok(())
        }

        async fn on_permissions_updated(
            &self,
            _record: &RecordProposal,
            _permissions: &[Permission],
        ) -> SyncResult<()> {
            self.permission_updates.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn new_change(n: usize) -> RecordChange {
        let item = ExternalItem::file(format!("f{n}"), format!("/f{n}"), "r1");
        reconcile(&item, None)
    }

    fn existing_record(name: &str) -> PersistedRecord {
        PersistedRecord {
            id: Uuid::new_v4(),
            external_id: "f1".to_string(),
            parent_external_id: None,
            version: 1,
            revision_tag: Some("r1".to_string()),
            path: format!("/{name}"),
            name: name.to_string(),
        }
    }

    #[tokio::test]
    async fn test_batch_bound_250_items() {
        let sink = Arc::new(RecordingSink::default());
        let mut dispatcher = BatchDispatcher::new(sink.clone(), 100);

        for n in 0..250 {
            dispatcher.add(&new_change(n), Vec::new()).await.unwrap();
        }
        dispatcher.finish_page().await.unwrap();

        // Exactly two full flushes and one partial flush of 50.
        assert_eq!(*sink.batch_sizes.lock().unwrap(), vec![100, 100, 50]);
        assert_eq!(dispatcher.pending(), 0);
    }

    #[tokio::test]
    async fn test_delete_bypasses_batching() {
        let sink = Arc::new(RecordingSink::default());
        let mut dispatcher = BatchDispatcher::new(sink.clone(), 100);

        let record = existing_record("doomed");
        let item = ExternalItem::tombstone("f1", "/doomed");
        let change = reconcile(&item, Some(&record));

        dispatcher.add(&change, Vec::new()).await.unwrap();

        // Dispatched immediately, nothing buffered.
        assert_eq!(*sink.deletes.lock().unwrap(), vec![record.id]);
        assert_eq!(dispatcher.pending(), 0);
        assert!(sink.batch_sizes.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_of_unknown_record_is_silent() {
        let sink = Arc::new(RecordingSink::default());
        let mut dispatcher = BatchDispatcher::new(sink.clone(), 100);

        let item = ExternalItem::tombstone("ghost", "/ghost");
        let change = reconcile(&item, None);
        dispatcher.add(&change, Vec::new()).await.unwrap();

        assert!(sink.deletes.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_routing() {
        let sink = Arc::new(RecordingSink::default());
        let mut dispatcher = BatchDispatcher::new(sink.clone(), 100);

        // Content change routes to the content callback.
        let record = existing_record("a");
        let item = ExternalItem::file("f1", "/a", "r2");
        dispatcher
            .add(&reconcile(&item, Some(&record)), Vec::new())
            .await
            .unwrap();
        assert_eq!(sink.content_updates.load(Ordering::SeqCst), 1);
        assert_eq!(sink.metadata_updates.load(Ordering::SeqCst), 0);

        // Rename-only routes to the metadata callback.
        let item = ExternalItem::file("f1", "/a", "r1").with_name("a-renamed");
        dispatcher
            .add(&reconcile(&item, Some(&record)), Vec::new())
            .await
            .unwrap();
        assert_eq!(sink.metadata_updates.load(Ordering::SeqCst), 1);

        // Permission-only change routes to the permissions callback.
        let item = ExternalItem::file("f1", "/a", "r1");
        let mut change = reconcile(&item, Some(&record));
        change.mark_permissions_changed();
        dispatcher.add(&change, Vec::new()).await.unwrap();
        assert_eq!(sink.permission_updates.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_flush_retry_once_then_succeed() {
        let sink = Arc::new(RecordingSink::failing(1));
        let mut dispatcher = BatchDispatcher::new(sink.clone(), 10);

        dispatcher.add(&new_change(0), Vec::new()).await.unwrap();

        // First flush fails but is absorbed; buffer retained.
        dispatcher.flush().await.unwrap();
        assert_eq!(dispatcher.pending(), 1);

        // Retry delivers.
        dispatcher.finish_page().await.unwrap();
        assert_eq!(dispatcher.pending(), 0);
        assert_eq!(*sink.batch_sizes.lock().unwrap(), vec![1]);
    }

    #[tokio::test]
    async fn test_flush_fails_twice_propagates() {
        let sink = Arc::new(RecordingSink::failing(2));
        let mut dispatcher = BatchDispatcher::new(sink.clone(), 10);

        dispatcher.add(&new_change(0), Vec::new()).await.unwrap();
        let err = dispatcher.finish_page().await.unwrap_err();
        assert!(matches!(err, SyncError::Sink { .. }));
        // Buffer still held; the page loop aborts without cursor advance.
        assert_eq!(dispatcher.pending(), 1);
    }

    #[tokio::test]
    async fn test_empty_finish_page_is_noop() {
        let sink = Arc::new(RecordingSink::default());
        let mut dispatcher = BatchDispatcher::new(sink.clone(), 10);
        dispatcher.finish_page().await.unwrap();
        assert!(sink.batch_sizes.lock().unwrap().is_empty());
    }
}
