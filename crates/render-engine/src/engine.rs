//! Render engine abstraction.
//!
//! A [`RenderEngine`] is a factory for per-file [`RenderBackend`]s. The
//! backend holds whatever mutable drawing state the engine needs and is
//! only ever driven through a [`crate::session::RenderSession`], which
//! enforces the open → import → settle → render → close lifecycle.

use std::sync::Arc;

use flowdraw_common::error::FlowdrawResult;
use flowdraw_flow_model::Flow;

use crate::registry::NodeTypeRegistry;
use crate::snapshot::Snapshot;

/// Trait for per-session render backends (built-in SVG, test doubles, ...).
#[async_trait::async_trait]
pub trait RenderBackend: Send {
    /// Load a flow into the backend. Called at most once per backend.
    async fn import_flow(&mut self, flow: &Flow) -> FlowdrawResult<()>;

    /// Whether the backend can report when layout has finished applying.
    ///
    /// Backends that return `false` get a fixed settle delay instead.
    fn reports_layout_stable(&self) -> bool {
        false
    }

    /// Resolve once layout triggered by the import has been applied.
    async fn wait_for_layout(&mut self) -> FlowdrawResult<()> {
        Ok(())
    }

    /// Ids of the imported flow's workspaces, in the engine's enumeration
    /// order. Empty before import.
    fn workspace_ids(&self) -> Vec<String>;

    /// Draw one workspace and capture it.
    async fn render_workspace(&mut self, workspace_id: &str) -> FlowdrawResult<Snapshot>;

    /// Release everything the backend holds. Must be idempotent.
    fn close(&mut self);
}

/// Trait for render engines.
pub trait RenderEngine: Send + Sync {
    /// Engine name, for logs.
    fn name(&self) -> &str;

    /// Create a fresh backend for one render session.
    fn open_backend(&self, registry: Arc<NodeTypeRegistry>)
        -> FlowdrawResult<Box<dyn RenderBackend>>;
}
