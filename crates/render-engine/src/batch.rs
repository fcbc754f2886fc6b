//! Batch mode: walk a directory tree and run the pipeline over every flow.
//!
//! Directory listing fans out across tasks; rendering does not. Files are
//! processed one after another, each with its own render session, and a
//! failure in one file is logged and recorded without stopping the rest.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::time::{Duration, Instant};

use tokio::task::JoinSet;

use flowdraw_common::error::{FlowdrawError, FlowdrawResult};

use crate::pipeline::{Pipeline, FLOW_EXTENSION};

/// Progress callback for batch processing.
pub type ProgressCallback = Box<dyn Fn(BatchProgress) + Send>;

/// Batch progress report.
#[derive(Debug, Clone)]
pub struct BatchProgress {
    /// Ticks so far, including the initial one.
    pub completed: usize,

    /// Total ticks: one per discovered file plus the initial one.
    pub total: usize,

    /// Entry just consumed, if any.
    pub path: Option<PathBuf>,

    /// Time since the batch started.
    pub elapsed: Duration,
}

impl BatchProgress {
    /// Progress in `[0.0, 1.0]`.
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.completed as f64 / self.total as f64
        }
    }
}

/// Outcome of a batch run.
#[derive(Debug, Default)]
pub struct BatchSummary {
    /// Files rendered and exported.
    pub processed: Vec<PathBuf>,

    /// Entries skipped for not being flow files.
    pub skipped: usize,

    /// Files that failed, with the error.
    pub failures: Vec<(PathBuf, FlowdrawError)>,
}

type WalkFuture = Pin<Box<dyn Future<Output = FlowdrawResult<Vec<PathBuf>>> + Send>>;

/// Recursively list every regular file under `root`.
///
/// The order of the result is unspecified. Symlinked files are listed,
/// symlinked directories are not followed. Any directory that cannot be
/// listed fails the whole walk.
pub async fn walk(root: &Path) -> FlowdrawResult<Vec<PathBuf>> {
    let root = tokio::fs::canonicalize(root)
        .await
        .map_err(|e| FlowdrawError::walk(root, e))?;
    walk_dir(root).await
}

fn walk_dir(dir: PathBuf) -> WalkFuture {
    Box::pin(async move {
        let (mut files, subdirs) = list_dir(&dir).await?;
        files.extend(walk_subdirs(subdirs).await?);
        Ok(files)
    })
}

/// Walk `subdirs` concurrently; the first failure wins.
async fn walk_subdirs(subdirs: Vec<PathBuf>) -> FlowdrawResult<Vec<PathBuf>> {
    let mut tasks = JoinSet::new();
    for dir in subdirs {
        tasks.spawn(walk_dir(dir));
    }

    let mut files = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        let nested = joined.map_err(|e| FlowdrawError::Other(e.into()))??;
        files.extend(nested);
    }
    Ok(files)
}

/// Split the entries of `dir` into files and subdirectories.
async fn list_dir(dir: &Path) -> FlowdrawResult<(Vec<PathBuf>, Vec<PathBuf>)> {
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .map_err(|e| FlowdrawError::walk(dir, e))?;

    let mut files = Vec::new();
    let mut subdirs = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| FlowdrawError::walk(dir, e))?
    {
        let path = entry.path();
        match tokio::fs::symlink_metadata(&path).await {
            Ok(meta) if meta.file_type().is_symlink() => {
                match tokio::fs::metadata(&path).await {
                    Ok(target) if target.is_file() => files.push(path),
                    Ok(target) if target.is_dir() => {
                        tracing::debug!(path = %path.display(), "Not following symlinked directory");
                    }
                    Ok(_) => {}
                    Err(e) => {
                        tracing::warn!(path = %path.display(), error = %e, "Skipping broken symlink");
                    }
                }
            }
            Ok(meta) if meta.is_dir() => subdirs.push(path),
            Ok(meta) if meta.is_file() => files.push(path),
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Skipping unreadable entry");
            }
        }
    }

    Ok((files, subdirs))
}

/// Directory of `path` relative to whichever of `roots` contains it.
///
/// Empty when `path` sits directly in a root or outside all of them.
fn relative_dir(roots: &[PathBuf], path: &Path) -> PathBuf {
    let Some(parent) = path.parent() else {
        return PathBuf::new();
    };
    roots
        .iter()
        .find_map(|root| parent.strip_prefix(root).ok())
        .map(Path::to_path_buf)
        .unwrap_or_default()
}

/// Whether `path` has the flow definition extension.
pub fn is_flow_file(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == FLOW_EXTENSION)
}

/// Run `pipeline` over `paths`, consuming them from the end.
///
/// Artifacts of a file found in a subdirectory of `root` are written to the
/// same subdirectory of the output directory, so equal file names in
/// different directories do not overwrite each other.
pub async fn process_all(
    pipeline: &Pipeline,
    root: &Path,
    mut paths: Vec<PathBuf>,
    progress: Option<ProgressCallback>,
) -> BatchSummary {
    let started = Instant::now();
    let mut roots = vec![root.to_path_buf()];
    if let Ok(canonical) = tokio::fs::canonicalize(root).await {
        roots.push(canonical);
    }
    let total = paths.len() + 1;
    let mut completed = 0;
    let mut summary = BatchSummary::default();

    let mut tick = |path: Option<PathBuf>| {
        completed += 1;
        if let Some(cb) = &progress {
            cb(BatchProgress {
                completed,
                total,
                path,
                elapsed: started.elapsed(),
            });
        }
    };

    tick(None);
    while let Some(path) = paths.pop() {
        if is_flow_file(&path) {
            let subdir = relative_dir(&roots, &path);
            match pipeline.process_file_into(&path, &subdir).await {
                Ok(_) => summary.processed.push(path.clone()),
                Err(e) => {
                    tracing::error!(file = %path.display(), error = %e, "Failed to process flow");
                    summary.failures.push((path.clone(), e));
                }
            }
        } else {
            tracing::debug!(file = %path.display(), "Skipping non-flow file");
            summary.skipped += 1;
        }
        tick(Some(path));
    }

    tracing::info!(
        processed = summary.processed.len(),
        skipped = summary.skipped,
        failed = summary.failures.len(),
        elapsed_secs = started.elapsed().as_secs_f64(),
        "Batch complete"
    );
    summary
}
