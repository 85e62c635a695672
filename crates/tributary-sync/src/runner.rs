//! Scope Runner
//!
//! Drives many scopes through the orchestrator with bounded concurrency.
//! Handles child scope discovery, failure isolation, and graceful shutdown.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info, instrument, warn};

use tributary_connector::SyncScope;

use crate::orchestrator::{ScopeSummary, SyncOrchestrator};

/// Result of running a set of scopes.
#[derive(Debug, Default)]
pub struct RunReport {
    /// Scopes that synchronized successfully, with their counters.
    pub completed: Vec<(SyncScope, ScopeSummary)>,
    /// Scopes that failed, with the error message.
    pub failed: Vec<(SyncScope, String)>,
}

impl RunReport {
    /// Whether every scope completed.
    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Runs scopes concurrently up to the configured limit.
///
/// Scope failures are isolated: one scope failing never stops the others,
/// it is reported in the [`RunReport`] and the queue keeps draining.
pub struct ScopeRunner {
    orchestrator: Arc<SyncOrchestrator>,
    shutdown: Arc<AtomicBool>,
}

impl ScopeRunner {
    /// Create a runner over a shared orchestrator.
    #[must_use]
    pub fn new(orchestrator: Arc<SyncOrchestrator>) -> Self {
        Self {
            orchestrator,
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Request graceful shutdown: no new scopes start, in-flight scopes
    /// drain to completion.
    pub fn shutdown(&self) {
        info!("Shutdown requested");
        self.shutdown.store(true, Ordering::Relaxed);
    }

    /// Check if shutdown was requested.
    #[must_use]
    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Relaxed)
    }

    /// Synchronize the given scopes, plus any child scopes they discover.
    #[instrument(skip(self, scopes), fields(initial = scopes.len()))]
    pub async fn run(&self, scopes: Vec<SyncScope>) -> RunReport {
        let concurrency = self.orchestrator.config().max_concurrent_scopes as usize;
        info!(concurrency, "starting scope runner");

        let semaphore = Arc::new(Semaphore::new(concurrency));
        let mut queue: VecDeque<SyncScope> = scopes.into();
        let mut tasks = JoinSet::new();
        let mut report = RunReport::default();

        loop {
            // Launch while permits and work are both available.
            while !queue.is_empty() && !self.is_shutdown() {
                let permit = match semaphore.clone().try_acquire_owned() {
                    Ok(p) => p,
                    Err(_) => break,
                };
                let scope = match queue.pop_front() {
                    Some(s) => s,
                    None => break,
                };
                let orchestrator = self.orchestrator.clone();
                tasks.spawn(async move {
                    let _permit = permit;
                    let result = orchestrator.run_sync(&scope).await;
                    (scope, result)
                });
            }

            match tasks.join_next().await {
                Some(Ok((scope, Ok(outcome)))) => {
                    // Discovered containers become their own runs.
                    for child in outcome.child_scopes {
                        queue.push_back(child);
                    }
                    report.completed.push((scope, outcome.summary));
                }
                Some(Ok((scope, Err(e)))) => {
                    warn!(scope = %scope.key(), error = %e, "scope sync failed");
                    report.failed.push((scope, e.to_string()));
                }
                Some(Err(e)) => {
                    error!(error = %e, "scope task panicked");
                }
                None => {
                    if queue.is_empty() || self.is_shutdown() {
                        break;
                    }
                }
            }
        }

        if self.is_shutdown() && !queue.is_empty() {
            warn!(remaining = queue.len(), "shutdown with scopes still queued");
        }
        info!(
            completed = report.completed.len(),
            failed = report.failed.len(),
            "scope runner finished"
        );
        report
    }
}
