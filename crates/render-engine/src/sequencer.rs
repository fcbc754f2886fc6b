//! Workspace sequencing.
//!
//! Workspaces are rendered strictly one at a time through a single session.
//! Ids come from the session's enumeration and are consumed by popping from
//! the end, so with [`TraversalOrder::Reverse`] the last-enumerated
//! workspace comes first in the resulting [`SnapshotSequence`]. The first
//! failure aborts the whole sequence; no partial result is returned.

use flowdraw_common::config::TraversalOrder;
use flowdraw_common::error::FlowdrawResult;

use crate::session::RenderSession;
use crate::snapshot::SnapshotSequence;

/// Render every workspace the session enumerates.
pub async fn sequence(
    session: &mut RenderSession,
    order: TraversalOrder,
) -> FlowdrawResult<SnapshotSequence> {
    let mut pending = session.workspace_ids()?;
    if order == TraversalOrder::Declaration {
        pending.reverse();
    }

    let mut snapshots = SnapshotSequence::with_capacity(pending.len());
    while let Some(workspace_id) = pending.pop() {
        tracing::debug!(workspace = %workspace_id, "Rendering workspace");
        let snapshot = session.render_workspace(&workspace_id).await.map_err(|e| {
            tracing::debug!(workspace = %workspace_id, error = %e, "Workspace failed");
            e
        })?;
        snapshots.push(snapshot);
    }

    Ok(snapshots)
}
