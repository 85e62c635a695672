//! Permission set reconciliation.

use std::collections::HashSet;

use tracing::warn;
use tributary_connector::{ConnectorResult, ExternalItem, Permission, SyncScope};

/// Compare two permission lists as sets.
///
/// Order and duplicate entries are insignificant; two lists are equal when
/// they grant the same `(principal_id, principal_kind, level)` tuples.
#[must_use]
pub fn permission_sets_equal(a: &[Permission], b: &[Permission]) -> bool {
    let a: HashSet<&Permission> = a.iter().collect();
    let b: HashSet<&Permission> = b.iter().collect();
    a == b
}

/// Compute an item's current permission set and whether it changed.
///
/// Returns the permissions to persist and a `changed` flag derived from a
/// real set diff against the previously stored entries — a non-empty new
/// list alone is not a change.
#[must_use]
pub fn reconcile(current: Vec<Permission>, existing: &[Permission]) -> (Vec<Permission>, bool) {
    let changed = !permission_sets_equal(&current, existing);
    (current, changed)
}

/// Unwrap a permission fetch, failing open to owner-only on error.
///
/// When the source cannot produce a permission listing for an item
/// (transient fetch failure, no queryable permission model), the item is
/// not failed; it degrades to a single owner-level entry for the scope's
/// acting principal. Deliberate policy, always logged.
pub fn resolve_fetched_permissions(
    fetched: ConnectorResult<Vec<Permission>>,
    scope: &SyncScope,
    item: &ExternalItem,
) -> Vec<Permission> {
    match fetched {
        Ok(permissions) => permissions,
        Err(e) => {
            warn!(
                scope = %scope.key(),
                item = %item.external_id,
                error = %e,
                "permission fetch failed; failing open to owner-only"
            );
            vec![Permission::owner(scope.owner())]
        }
    }
}
