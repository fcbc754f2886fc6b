//! Render a flow file, or every flow file under a directory.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use flowdraw_common::config::{AppConfig, ExportFormat, TraversalOrder};
use flowdraw_common::error::FlowdrawError;
use flowdraw_render_engine::export::Artifact;
use flowdraw_render_engine::{
    process_all, walk, BatchSummary, NodeTypeRegistry, Pipeline, PipelineOptions, SvgEngine,
};

use super::progress;

/// Command-line arguments, before they are checked against the filesystem.
#[derive(Debug, Clone, Default)]
pub struct DrawArgs {
    pub input: PathBuf,
    pub output_dir: Option<PathBuf>,
    pub format: Option<String>,
    pub nodes: Option<PathBuf>,
    pub stdout: bool,
    pub declaration_order: bool,
    pub settle_ms: Option<u64>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    File,
    Directory,
}

/// Validated invocation.
#[derive(Debug)]
pub struct DrawPlan {
    pub input: PathBuf,
    pub kind: InputKind,
    pub nodes_dir: Option<PathBuf>,
    pub options: PipelineOptions,
}

/// Check every argument before anything is rendered.
pub fn plan(args: DrawArgs, config: &AppConfig) -> Result<DrawPlan, FlowdrawError> {
    let format = match args.format.as_deref() {
        Some(name) => ExportFormat::from_str(name)?,
        None => config.export.format,
    };

    let kind = match std::fs::metadata(&args.input) {
        Ok(meta) if meta.is_dir() => InputKind::Directory,
        Ok(meta) if meta.is_file() => InputKind::File,
        Ok(_) => {
            return Err(FlowdrawError::config(format!(
                "Input is neither a file nor a directory: {}",
                args.input.display()
            )))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(FlowdrawError::FileNotFound { path: args.input })
        }
        Err(e) => return Err(e.into()),
    };

    if args.stdout && kind == InputKind::Directory {
        return Err(FlowdrawError::config(
            "Standard output can only be used with a single input file",
        ));
    }

    let nodes_dir = args.nodes.or_else(|| config.render.node_types_dir.clone());
    if let Some(dir) = &nodes_dir {
        if !dir.is_dir() {
            return Err(FlowdrawError::config(format!(
                "Node types directory not found: {}",
                dir.display()
            )));
        }
    }

    let output_dir = match args.output_dir {
        Some(dir) if dir.is_dir() => dir,
        Some(dir) => {
            return Err(FlowdrawError::config(format!(
                "Output directory does not exist: {}",
                dir.display()
            )))
        }
        None => {
            if !args.stdout {
                tracing::warn!("No output directory given, writing to the current directory");
            }
            PathBuf::from(".")
        }
    };

    let mut options = PipelineOptions::from(config);
    options.format = format;
    options.output_dir = output_dir;
    options.stdout = args.stdout;
    if args.declaration_order {
        options.order = TraversalOrder::Declaration;
    }
    if let Some(ms) = args.settle_ms {
        options.session.settle_delay = Duration::from_millis(ms);
    }
    if let Some(secs) = args.timeout_secs {
        options.session.render_timeout = Duration::from_secs(secs);
    }
    options.validate()?;

    Ok(DrawPlan {
        input: args.input,
        kind,
        nodes_dir,
        options,
    })
}

/// Core node types plus any descriptors found in `nodes_dir`.
pub fn build_registry(nodes_dir: Option<&Path>) -> Result<NodeTypeRegistry, FlowdrawError> {
    let mut registry = NodeTypeRegistry::with_core_types();
    if let Some(dir) = nodes_dir {
        let added = registry.load_dir(dir)?;
        tracing::info!(dir = %dir.display(), added, "Loaded node types");
    }
    Ok(registry)
}

pub async fn run(args: DrawArgs, config: &AppConfig) -> anyhow::Result<()> {
    let plan = plan(args, config)?;
    let registry = build_registry(plan.nodes_dir.as_deref())?;
    let pipeline = Pipeline::new(Arc::new(SvgEngine::new()), Arc::new(registry), plan.options)?;

    match plan.kind {
        InputKind::File => {
            let artifact = pipeline
                .process_file(&plan.input)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to render {}: {e}", plan.input.display()))?;
            report_artifact(&artifact);
        }
        InputKind::Directory => {
            let files = walk(&plan.input).await?;
            tracing::info!(dir = %plan.input.display(), entries = files.len(), "Scanned input directory");
            let summary = process_all(
                &pipeline,
                &plan.input,
                files,
                Some(progress::stderr_reporter()),
            )
            .await;
            report_summary(&summary);
        }
    }

    Ok(())
}

fn report_artifact(artifact: &Artifact) {
    match artifact {
        Artifact::Document(path) => println!("Wrote {}", path.display()),
        Artifact::Images(paths) => {
            for path in paths {
                println!("Wrote {}", path.display());
            }
        }
        Artifact::Streamed { .. } => {}
    }
}

fn report_summary(summary: &BatchSummary) {
    println!(
        "Processed {} flow(s), skipped {}, failed {}",
        summary.processed.len(),
        summary.skipped,
        summary.failures.len()
    );
    for (path, error) in &summary.failures {
        println!("  - {}: {error}", path.display());
    }
}
