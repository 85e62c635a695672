//! Durable sync points for resumable synchronization.
//!
//! A sync point records how far a scope has been synchronized. During a run
//! it carries the cursor of the last fully dispatched page (`next_link`); at
//! completion it carries the source's incremental marker (`delta_link`).
//! Absence of a sync point means the scope has never been synced and gets a
//! full enumeration.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::instrument;

use crate::error::SyncResult;

/// Persisted progress marker for one scope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncPoint {
    /// The scope this point belongs to, as [`SyncScope::key`] renders it.
    ///
    /// [`SyncScope::key`]: tributary_connector::SyncScope::key
    pub scope_key: String,
    /// Cursor of the last completed run, when the source resumes by cursor.
    pub cursor: Option<String>,
    /// Incremental marker issued by the source at the end of a run.
    pub delta_link: Option<String>,
    /// Mid-run cursor; present only while a run is in flight or was
    /// interrupted before completion.
    pub next_link: Option<String>,
    /// Last time this point was written.
    pub updated_at: DateTime<Utc>,
}

impl SyncPoint {
    /// A mid-run point carrying the cursor of the last dispatched page.
    #[must_use]
    pub fn in_progress(scope_key: impl Into<String>, next_link: impl Into<String>) -> Self {
        Self {
            scope_key: scope_key.into(),
            cursor: None,
            delta_link: None,
            next_link: Some(next_link.into()),
            updated_at: Utc::now(),
        }
    }

    /// A completed point carrying the marker for the next incremental run.
    #[must_use]
    pub fn completed(
        scope_key: impl Into<String>,
        cursor: Option<String>,
        delta_link: Option<String>,
    ) -> Self {
        Self {
            scope_key: scope_key.into(),
            cursor,
            delta_link,
            next_link: None,
            updated_at: Utc::now(),
        }
    }

    /// The cursor an incremental run should resume from.
    ///
    /// An interrupted run resumes mid-enumeration via `next_link`; otherwise
    /// the completed run's `delta_link` wins over the plain cursor.
    #[must_use]
    pub fn resume_cursor(&self) -> Option<&str> {
        self.next_link
            .as_deref()
            .or(self.delta_link.as_deref())
            .or(self.cursor.as_deref())
    }

    /// Whether this point was written mid-run.
    #[must_use]
    pub fn is_in_progress(&self) -> bool {
        self.next_link.is_some()
    }
}

/// Storage for sync points.
#[async_trait]
pub trait SyncPointStore: Send + Sync {
    /// Fetch the point for a scope, if any.
    async fn get(&self, scope_key: &str) -> SyncResult<Option<SyncPoint>>;

    /// Create or replace the point for a scope.
    async fn save(&self, point: &SyncPoint) -> SyncResult<()>;

    /// Delete a scope's point, forcing the next run to be a full sync.
    /// Returns whether a point existed.
    async fn reset(&self, scope_key: &str) -> SyncResult<bool>;
}

/// In-memory store, for tests and single-process deployments.
#[derive(Debug, Default)]
pub struct InMemorySyncPointStore {
    points: RwLock<HashMap<String, SyncPoint>>,
}

impl InMemorySyncPointStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SyncPointStore for InMemorySyncPointStore {
    async fn get(&self, scope_key: &str) -> SyncResult<Option<SyncPoint>> {
        Ok(self.points.read().await.get(scope_key).cloned())
    }

    async fn save(&self, point: &SyncPoint) -> SyncResult<()> {
        self.points
            .write()
            .await
            .insert(point.scope_key.clone(), point.clone());
        Ok(())
    }

    async fn reset(&self, scope_key: &str) -> SyncResult<bool> {
        Ok(self.points.write().await.remove(scope_key).is_some())
    }
}

/// Postgres-backed store, one row per scope key.
#[derive(Debug, Clone)]
pub struct PgSyncPointStore {
    pool: PgPool,
}

impl PgSyncPointStore {
    /// Create a store over an existing pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SyncPointStore for PgSyncPointStore {
    #[instrument(skip(self))]
    async fn get(&self, scope_key: &str) -> SyncResult<Option<SyncPoint>> {
        let result = sqlx::query_as::<_, SyncPointRow>(
            r"
            SELECT scope_key, cursor, delta_link, next_link, updated_at
            FROM sync_points
            WHERE scope_key = $1
            ",
        )
        .bind(scope_key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(result.map(SyncPointRow::into_point))
    }

    #[instrument(skip(self, point), fields(scope_key = %point.scope_key))]
    async fn save(&self, point: &SyncPoint) -> SyncResult<()> {
        sqlx::query(
            r"
            INSERT INTO sync_points (scope_key, cursor, delta_link, next_link, updated_at)
            VALUES ($1, $2, $3, $4, NOW())
            ON CONFLICT (scope_key) DO UPDATE SET
                cursor = EXCLUDED.cursor,
                delta_link = EXCLUDED.delta_link,
                next_link = EXCLUDED.next_link,
                updated_at = NOW()
            ",
        )
        .bind(&point.scope_key)
        .bind(&point.cursor)
        .bind(&point.delta_link)
        .bind(&point.next_link)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn reset(&self, scope_key: &str) -> SyncResult<bool> {
        let result = sqlx::query(
            r"
            DELETE FROM sync_points
            WHERE scope_key = $1
            ",
        )
        .bind(scope_key)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// Database row for a sync point.
#[derive(Debug, sqlx::FromRow)]
struct SyncPointRow {
    scope_key: String,
    cursor: Option<String>,
    delta_link: Option<String>,
    next_link: Option<String>,
    updated_at: DateTime<Utc>,
}

impl SyncPointRow {
    fn into_point(self) -> SyncPoint {
        SyncPoint {
            scope_key: self.scope_key,
            cursor: self.cursor,
            delta_link: self.delta_link,
            next_link: self.next_link,
            updated_at: self.updated_at,
        }
    }
}
