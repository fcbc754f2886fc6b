//! Render session lifecycle.
//!
//! A [`RenderSession`] owns one backend for exactly one input file. The
//! backend is closed when the session is closed or dropped, on every exit
//! path. The session also guarantees that no workspace is rendered before
//! the layout triggered by the import has settled.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use flowdraw_common::config::RenderDefaults;
use flowdraw_common::error::{FlowdrawError, FlowdrawResult};
use flowdraw_flow_model::Flow;

use crate::engine::{RenderBackend, RenderEngine};
use crate::registry::NodeTypeRegistry;
use crate::snapshot::Snapshot;

/// Timing parameters for a render session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    /// Minimum wait between import and first render when the backend
    /// cannot report a stable layout.
    pub settle_delay: Duration,

    /// Upper bound for a single `render_workspace` call.
    pub render_timeout: Duration,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self::from(&RenderDefaults::default())
    }
}

impl From<&RenderDefaults> for SessionOptions {
    fn from(defaults: &RenderDefaults) -> Self {
        Self {
            settle_delay: Duration::from_millis(defaults.settle_delay_ms),
            render_timeout: Duration::from_secs(defaults.render_timeout_secs),
        }
    }
}

/// State of a render session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Backend open, nothing imported.
    Open,
    /// Flow imported, layout may still be applying.
    Imported,
    /// Layout stable, workspaces may be rendered.
    Settled,
    /// Backend released.
    Closed,
}

/// An exclusive, single-use render session.
pub struct RenderSession {
    engine_name: String,
    backend: Box<dyn RenderBackend>,
    options: SessionOptions,
    state: SessionState,
    imported_at: Option<Instant>,
}

impl RenderSession {
    /// Open a fresh backend from `engine`.
    pub fn open(
        engine: &dyn RenderEngine,
        registry: Arc<NodeTypeRegistry>,
        options: SessionOptions,
    ) -> FlowdrawResult<Self> {
        let backend = engine.open_backend(registry)?;
        tracing::debug!(engine = engine.name(), "Opened render session");
        Ok(Self {
            engine_name: engine.name().to_string(),
            backend,
            options,
            state: SessionState::Open,
            imported_at: None,
        })
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Workspace ids as the backend enumerates them.
    pub fn workspace_ids(&self) -> FlowdrawResult<Vec<String>> {
        match self.state {
            SessionState::Open => Err(FlowdrawError::render("No flow imported into session")),
            SessionState::Closed => Err(FlowdrawError::render("Session is closed")),
            SessionState::Imported | SessionState::Settled => Ok(self.backend.workspace_ids()),
        }
    }

    /// Load the flow to render. A session accepts exactly one import.
    pub async fn import_flow(&mut self, flow: &Flow) -> FlowdrawResult<()> {
        if self.state != SessionState::Open {
            return Err(FlowdrawError::import(format!(
                "Session cannot import in state {:?}",
                self.state
            )));
        }

        self.backend.import_flow(flow).await?;
        self.state = SessionState::Imported;
        self.imported_at = Some(Instant::now());
        tracing::debug!(
            nodes = flow.len(),
            workspaces = flow.workspaces().len(),
            "Imported flow"
        );
        Ok(())
    }

    /// Wait until the backend's layout is stable.
    ///
    /// Uses the backend's own signal when it has one; otherwise waits until
    /// `settle_delay` has elapsed since the import. Called implicitly by the
    /// first [`render_workspace`](Self::render_workspace).
    pub async fn settle(&mut self) -> FlowdrawResult<()> {
        match self.state {
            SessionState::Settled => return Ok(()),
            SessionState::Imported => {}
            other => {
                return Err(FlowdrawError::render(format!(
                    "Session cannot settle in state {other:?}"
                )))
            }
        }

        if self.backend.reports_layout_stable() {
            self.backend.wait_for_layout().await?;
        } else if let Some(imported_at) = self.imported_at {
            tokio::time::sleep_until(imported_at + self.options.settle_delay).await;
        }

        self.state = SessionState::Settled;
        Ok(())
    }

    /// Capture one workspace.
    pub async fn render_workspace(&mut self, workspace_id: &str) -> FlowdrawResult<Snapshot> {
        match self.state {
            SessionState::Open => {
                return Err(FlowdrawError::render("No flow imported into session"));
            }
            SessionState::Closed => {
                return Err(FlowdrawError::render("Session is closed"));
            }
            SessionState::Imported => self.settle().await?,
            SessionState::Settled => {}
        }

        let limit = self.options.render_timeout;
        match tokio::time::timeout(limit, self.backend.render_workspace(workspace_id)).await {
            Ok(result) => result,
            Err(_) => Err(FlowdrawError::timeout(format!(
                "Workspace {workspace_id} did not render within {limit:?}"
            ))),
        }
    }

    /// Release the backend.
    pub fn close(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if self.state != SessionState::Closed {
            self.backend.close();
            self.state = SessionState::Closed;
            tracing::debug!(engine = %self.engine_name, "Closed render session");
        }
    }
}

impl Drop for RenderSession {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Shared observations of a [`ScriptedBackend`].
    #[derive(Debug, Default)]
    pub(crate) struct Tally {
        pub opened: AtomicUsize,
        pub closed: AtomicUsize,
        pub rendered: Mutex<Vec<String>>,
        pub imported_at: Mutex<Option<std::time::Instant>>,
        pub first_render_at: Mutex<Option<std::time::Instant>>,
    }

    /// Test engine whose backends record calls and fail on demand.
    #[derive(Clone, Default)]
    pub(crate) struct ScriptedEngine {
        pub tally: Arc<Tally>,
        pub failing_workspace: Option<String>,
        pub hanging_workspace: Option<String>,
        pub layout_signal: bool,
        /// Enumeration reported instead of the flow's own order.
        pub enumeration: Option<Vec<String>>,
    }

    pub(crate) struct ScriptedBackend {
        script: ScriptedEngine,
        workspaces: Vec<String>,
        closed: bool,
    }

    impl RenderEngine for ScriptedEngine {
        fn name(&self) -> &str {
            "scripted"
        }

        fn open_backend(
            &self,
            _registry: Arc<NodeTypeRegistry>,
        ) -> FlowdrawResult<Box<dyn RenderBackend>> {
            self.tally.opened.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(ScriptedBackend {
                script: self.clone(),
                workspaces: Vec::new(),
                closed: false,
            }))
        }
    }

    #[async_trait::async_trait]
    impl RenderBackend for ScriptedBackend {
        async fn import_flow(&mut self, flow: &Flow) -> FlowdrawResult<()> {
            self.workspaces = flow
                .workspace_ids()
                .into_iter()
                .map(str::to_string)
                .collect();
            *self.script.tally.imported_at.lock().unwrap() = Some(std::time::Instant::now());
            Ok(())
        }

        fn reports_layout_stable(&self) -> bool {
            self.script.layout_signal
        }

        fn workspace_ids(&self) -> Vec<String> {
            match &self.script.enumeration {
                Some(ids) => ids.clone(),
                None => self.workspaces.clone(),
            }
        }

        async fn render_workspace(&mut self, workspace_id: &str) -> FlowdrawResult<Snapshot> {
            self.script
                .tally
                .first_render_at
                .lock()
                .unwrap()
                .get_or_insert_with(std::time::Instant::now);

            if !self.workspaces.iter().any(|w| w == workspace_id) {
                return Err(FlowdrawError::render(format!(
                    "Unknown workspace: {workspace_id}"
                )));
            }
            if self.script.hanging_workspace.as_deref() == Some(workspace_id) {
                tokio::time::sleep(Duration::from_secs(3600)).await;
            }
            if self.script.failing_workspace.as_deref() == Some(workspace_id) {
                return Err(FlowdrawError::render(format!(
                    "Engine raised while drawing {workspace_id}"
                )));
            }

            self.script
                .tally
                .rendered
                .lock()
                .unwrap()
                .push(workspace_id.to_string());
            Ok(Snapshot::from_svg(
                workspace_id,
                &format!("<svg><title>{workspace_id}</title></svg>"),
            ))
        }

        fn close(&mut self) {
            if !self.closed {
                self.closed = true;
                self.script.tally.closed.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    pub(crate) fn fast_options() -> SessionOptions {
        SessionOptions {
            settle_delay: Duration::from_millis(1),
            render_timeout: Duration::from_secs(5),
        }
    }

    fn two_tab_flow() -> Flow {
        Flow::parse(br#"[{"id":"tabA","type":"tab"},{"id":"tabB","type":"tab"}]"#).unwrap()
    }

    fn open(engine: &ScriptedEngine, options: SessionOptions) -> RenderSession {
        RenderSession::open(engine, Arc::new(NodeTypeRegistry::new()), options).unwrap()
    }

    #[tokio::test]
    async fn test_lifecycle_states() {
        let engine = ScriptedEngine::default();
        let mut session = open(&engine, fast_options());
        assert_eq!(session.state(), SessionState::Open);

        session.import_flow(&two_tab_flow()).await.unwrap();
        assert_eq!(session.state(), SessionState::Imported);

        session.render_workspace("tabA").await.unwrap();
        assert_eq!(session.state(), SessionState::Settled);

        session.close();
        assert_eq!(engine.tally.opened.load(Ordering::SeqCst), 1);
        assert_eq!(engine.tally.closed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_workspace_ids_require_import() {
        let engine = ScriptedEngine::default();
        let mut session = open(&engine, fast_options());
        assert!(matches!(
            session.workspace_ids(),
            Err(FlowdrawError::Render { .. })
        ));

        session.import_flow(&two_tab_flow()).await.unwrap();
        assert_eq!(session.workspace_ids().unwrap(), vec!["tabA", "tabB"]);
    }

    #[tokio::test]
    async fn test_drop_closes_backend() {
        let engine = ScriptedEngine::default();
        {
            let mut session = open(&engine, fast_options());
            session.import_flow(&two_tab_flow()).await.unwrap();
        }
        assert_eq!(engine.tally.closed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_render_before_import_fails() {
        let engine = ScriptedEngine::default();
        let mut session = open(&engine, fast_options());
        let err = session.render_workspace("tabA").await.unwrap_err();
        assert!(matches!(err, FlowdrawError::Render { .. }));
    }

    #[tokio::test]
    async fn test_second_import_is_rejected() {
        let engine = ScriptedEngine::default();
        let mut session = open(&engine, fast_options());
        session.import_flow(&two_tab_flow()).await.unwrap();
        let err = session.import_flow(&two_tab_flow()).await.unwrap_err();
        assert!(matches!(err, FlowdrawError::Import { .. }));
    }

    #[tokio::test]
    async fn test_settle_delay_precedes_first_render() {
        let engine = ScriptedEngine::default();
        let delay = Duration::from_millis(60);
        let mut session = open(
            &engine,
            SessionOptions {
                settle_delay: delay,
                render_timeout: Duration::from_secs(5),
            },
        );
        session.import_flow(&two_tab_flow()).await.unwrap();
        session.render_workspace("tabB").await.unwrap();

        let imported = engine.tally.imported_at.lock().unwrap().unwrap();
        let rendered = engine.tally.first_render_at.lock().unwrap().unwrap();
        assert!(rendered.duration_since(imported) >= delay);
    }

    #[tokio::test]
    async fn test_layout_signal_replaces_fixed_delay() {
        let engine = ScriptedEngine {
            layout_signal: true,
            ..Default::default()
        };
        let mut session = open(
            &engine,
            SessionOptions {
                settle_delay: Duration::from_secs(3600),
                render_timeout: Duration::from_secs(5),
            },
        );
        session.import_flow(&two_tab_flow()).await.unwrap();
        session.render_workspace("tabA").await.unwrap();
        assert_eq!(session.state(), SessionState::Settled);
    }

    #[tokio::test]
    async fn test_hung_render_times_out() {
        let engine = ScriptedEngine {
            hanging_workspace: Some("tabA".to_string()),
            ..Default::default()
        };
        let mut session = open(
            &engine,
            SessionOptions {
                settle_delay: Duration::from_millis(1),
                render_timeout: Duration::from_millis(50),
            },
        );
        session.import_flow(&two_tab_flow()).await.unwrap();
        let err = session.render_workspace("tabA").await.unwrap_err();
        assert!(matches!(err, FlowdrawError::Timeout { .. }));
    }

    #[test]
    fn test_options_from_config_defaults() {
        let options = SessionOptions::default();
        assert_eq!(options.settle_delay, Duration::from_millis(100));
        assert_eq!(options.render_timeout, Duration::from_secs(30));
    }
}
