//! Incremental Synchronization Engine
//!
//! Detects and propagates changes from external content sources into the
//! local record store and downstream processing pipeline.
//!
//! ## Key Components
//!
//! - [`SyncOrchestrator`] - Drives one scope through a full or incremental run
//! - [`ScopeRunner`] - Runs many scopes with bounded concurrency
//! - [`reconcile`] - Classifies one incoming item against persisted state
//! - [`ParentResolver`] - Resolves items into the container hierarchy
//! - [`BatchDispatcher`] - Batches new records, dispatches updates immediately
//! - [`SyncPoint`] - Durable progress marker enabling resumable sync
//!
//! ## Synchronization Flow
//!
//! ```text
//! ┌───────────────┐     ┌──────────────────┐     ┌───────────────┐
//! │ Change Source │────►│ Sync Orchestrator│────►│  Record Sink  │
//! │ (SaaS API)    │     │                  │     │               │
//! └───────────────┘     └────────┬─────────┘     └───────────────┘
//!                                │
//!        ┌───────────────────────┼───────────────────────┐
//!        ▼                       ▼                       ▼
//! ┌──────────────┐      ┌────────────────┐      ┌────────────────┐
//! │ Record Diff  │      │ Parent Resolver│      │  Permission    │
//! │              │      │                │      │  Reconciler    │
//! └──────────────┘      └────────────────┘      └────────────────┘
//! ```
//!
//! A run is **full** when no sync point exists for the scope (everything is
//! enumerated) and **incremental** otherwise (only changes since the stored
//! cursor are fetched). Progress persists after every fully dispatched page,
//! so delivery is at-least-once: an interrupted run replays at most the page
//! it was on.
//!
//! ## Example
//!
//! ```ignore
//! use tributary_sync::{SyncConfig, SyncOrchestrator, ScopeRunner};
//!
//! let orchestrator = SyncOrchestrator::new(
//!     source, store, sink, sync_points, SyncConfig::default(),
//! )?;
//!
//! let runner = ScopeRunner::new(Arc::new(orchestrator));
//! let report = runner.run(scopes).await;
//! println!("{} scopes synced", report.completed.len());
//! ```
//!
//! [`SyncOrchestrator`]: orchestrator::SyncOrchestrator
//! [`ScopeRunner`]: runner::ScopeRunner
//! [`reconcile`]: diff::reconcile
//! [`ParentResolver`]: resolver::ParentResolver
//! [`BatchDispatcher`]: dispatch::BatchDispatcher
//! [`SyncPoint`]: sync_point::SyncPoint

pub mod config;
pub mod diff;
pub mod dispatch;
pub mod error;
pub mod orchestrator;
pub mod permissions;
pub mod rate_limiter;
pub mod record;
pub mod resolver;
pub mod runner;
pub mod sync_point;

// Re-exports for convenience
pub use config::SyncConfig;
pub use diff::{reconcile, RecordChange};
pub use dispatch::{BatchDispatcher, RecordSink};
pub use error::{SyncError, SyncResult};
pub use orchestrator::{RunMode, ScopeOutcome, ScopeSummary, SyncOrchestrator};
pub use rate_limiter::RateLimiter;
pub use record::{PersistedRecord, RecordProposal, RecordStore};
pub use resolver::{order_by_depth, ParentResolver, PathCache};
pub use runner::{RunReport, ScopeRunner};
pub use sync_point::{InMemorySyncPointStore, PgSyncPointStore, SyncPoint, SyncPointStore};
