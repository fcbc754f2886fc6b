//! Per-file pipeline: parse → open session → import → sequence → export.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use flowdraw_common::config::{AppConfig, ExportFormat, TraversalOrder};
use flowdraw_common::error::{FlowdrawError, FlowdrawResult};
use flowdraw_flow_model::Flow;

use crate::engine::RenderEngine;
use crate::export::{check_destination, export, Artifact, Destination};
use crate::registry::NodeTypeRegistry;
use crate::sequencer::sequence;
use crate::session::{RenderSession, SessionOptions};
use crate::snapshot::SnapshotSequence;

/// Extension of flow definition files.
pub const FLOW_EXTENSION: &str = "json";

/// How each file is rendered and where results go.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Output encoding.
    pub format: ExportFormat,

    /// Directory for written artifacts.
    pub output_dir: PathBuf,

    /// Stream html/json documents to stdout instead of writing files.
    pub stdout: bool,

    /// Workspace traversal order.
    pub order: TraversalOrder,

    /// Render session timing.
    pub session: SessionOptions,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for PipelineOptions {
    fn from(config: &AppConfig) -> Self {
        Self {
            format: config.export.format,
            output_dir: PathBuf::new(),
            stdout: false,
            order: config.render.traversal_order,
            session: SessionOptions::from(&config.render),
        }
    }
}

impl PipelineOptions {
    /// Reject option combinations before any rendering happens.
    pub fn validate(&self) -> FlowdrawResult<()> {
        if self.stdout {
            check_destination(self.format, &Destination::Stdout)?;
        }
        Ok(())
    }
}

/// Runs the full render-and-export pipeline for single files.
pub struct Pipeline {
    engine: Arc<dyn RenderEngine>,
    registry: Arc<NodeTypeRegistry>,
    options: PipelineOptions,
}

impl Pipeline {
    pub fn new(
        engine: Arc<dyn RenderEngine>,
        registry: Arc<NodeTypeRegistry>,
        options: PipelineOptions,
    ) -> FlowdrawResult<Self> {
        options.validate()?;
        Ok(Self {
            engine,
            registry,
            options,
        })
    }

    /// Destination for the artifacts of `input`, placed in `subdir` of the
    /// output directory.
    pub fn destination_for(&self, input: &Path, subdir: &Path) -> Destination {
        if self.options.stdout {
            Destination::Stdout
        } else {
            Destination::File(
                self.options
                    .output_dir
                    .join(subdir)
                    .join(artifact_stem(input)),
            )
        }
    }

    /// Parse and render `input` without exporting.
    pub async fn render_file(&self, input: &Path) -> FlowdrawResult<SnapshotSequence> {
        let raw = tokio::fs::read(input).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                FlowdrawError::FileNotFound {
                    path: input.to_path_buf(),
                }
            } else {
                FlowdrawError::Io(e)
            }
        })?;
        let flow = Flow::parse(&raw).map_err(|e| {
            FlowdrawError::malformed_input(format!("{}: {e}", input.display()))
        })?;

        self.render_flow(&flow).await
    }

    /// Render an already-parsed flow in a fresh session.
    pub async fn render_flow(&self, flow: &Flow) -> FlowdrawResult<SnapshotSequence> {
        let mut session = RenderSession::open(
            self.engine.as_ref(),
            Arc::clone(&self.registry),
            self.options.session,
        )?;
        session.import_flow(flow).await?;
        let snapshots = sequence(&mut session, self.options.order).await?;
        session.close();
        Ok(snapshots)
    }

    /// Render `input` and export the result into the output directory.
    pub async fn process_file(&self, input: &Path) -> FlowdrawResult<Artifact> {
        self.process_file_into(input, Path::new("")).await
    }

    /// Render `input` and export the result into `subdir` of the output
    /// directory, creating it once rendering has succeeded.
    pub async fn process_file_into(&self, input: &Path, subdir: &Path) -> FlowdrawResult<Artifact> {
        tracing::info!(file = %input.display(), format = %self.options.format, "Processing flow");
        let snapshots = self.render_file(input).await?;
        let destination = self.destination_for(input, subdir);
        if let Destination::File(prefix) = &destination {
            if let Some(parent) = prefix.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let artifact = export(&snapshots, self.options.format, &destination).await?;
        tracing::info!(
            file = %input.display(),
            count = snapshots.len(),
            "Exported snapshots"
        );
        Ok(artifact)
    }
}

/// Base name of `input` with a trailing `.json` removed.
pub fn artifact_stem(input: &Path) -> String {
    let name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    match name.strip_suffix(&format!(".{FLOW_EXTENSION}")) {
        Some(stem) => stem.to_string(),
        None => name,
    }
}
