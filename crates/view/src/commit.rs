//! Batch commit of pending changes.
//!
//! The coordinator turns a change report into one remote operation per
//! pending entity, issues them all concurrently in flight, and joins them
//! into a single completion. There is no ordering between or within the
//! create/update/delete categories, no conflict detection, and no rollback:
//! operations that succeed before another fails stay applied, visible through
//! per-entity state afterward.

use crate::report::ChangeReport;
use futures::future::{self, LocalBoxFuture};
use strata_core::{Entity, Error, Result};
use strata_dataset::DataSet;
use tracing::{debug, warn};

/// Replays every pending change of `report` against the remote source.
///
/// Resolves `Ok(())` only when every operation settled successfully. An empty
/// report resolves immediately with zero remote calls. Any failure yields
/// `Error::PartialCommit` carrying counts only; callers re-inspect per-entity
/// state to learn which operations failed and may simply retry, since
/// entities already confirmed produce no further operations.
pub(crate) async fn commit_all<T, S>(set: &S, report: &ChangeReport<T>) -> Result<()>
where
    T: Entity,
    S: DataSet<T>,
{
    let total = report.pending_len();
    if total == 0 {
        debug!("nothing pending, commit settles immediately");
        return Ok(());
    }

    let mut operations: Vec<LocalBoxFuture<'_, Result<()>>> = Vec::with_capacity(total);
    for entity in &report.added {
        operations.push(set.remote_create(entity));
    }
    for entity in &report.modified {
        operations.push(set.remote_update(entity));
    }
    for entity in &report.removed {
        operations.push(set.remote_remove(entity));
    }

    debug!(
        creates = report.added.len(),
        updates = report.modified.len(),
        deletes = report.removed.len(),
        "batch commit issued"
    );

    let settled = future::join_all(operations).await;
    let failed = settled.iter().filter(|result| result.is_err()).count();

    if failed == 0 {
        Ok(())
    } else {
        warn!(failed, total, "batch commit partially failed");
        Err(Error::partial_commit(failed, total))
    }
}
