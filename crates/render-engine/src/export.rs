//! Export multiplexer: turns a snapshot sequence into an artifact.
//!
//! | format | artifact                                   | stdout |
//! |--------|--------------------------------------------|--------|
//! | html   | `<prefix>.html`, one `<img>` per snapshot  | yes    |
//! | json   | `<prefix>.json`, pretty-printed URI list   | yes    |
//! | img    | `<prefix>-<index>.<ext>` per snapshot      | no     |

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tokio::io::AsyncWriteExt;

use flowdraw_common::config::ExportFormat;
use flowdraw_common::error::{FlowdrawError, FlowdrawResult};

use crate::snapshot::{DecodedImage, SnapshotSequence};

/// Where an export goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    /// Path prefix; the format decides the suffix.
    File(PathBuf),
    /// Standard output (html and json only).
    Stdout,
}

/// What an export produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Artifact {
    /// A single html or json document on disk.
    Document(PathBuf),
    /// A document written to standard output.
    Streamed { bytes: usize },
    /// One image file per snapshot, in sequence order.
    Images(Vec<PathBuf>),
}

/// Reject destination/format combinations that can never succeed.
pub fn check_destination(format: ExportFormat, destination: &Destination) -> FlowdrawResult<()> {
    if !format.is_document() && *destination == Destination::Stdout {
        return Err(FlowdrawError::config(
            "Standard output isn't supported for the img export format",
        ));
    }
    Ok(())
}

/// Export `snapshots` in `format` to `destination`.
pub async fn export(
    snapshots: &SnapshotSequence,
    format: ExportFormat,
    destination: &Destination,
) -> FlowdrawResult<Artifact> {
    check_destination(format, destination)?;

    match (format, destination) {
        (ExportFormat::Img, Destination::File(prefix)) => {
            export_images(snapshots, prefix).await.map(Artifact::Images)
        }
        (_, Destination::File(prefix)) => {
            let document = render_document(snapshots, format)?;
            let path = with_suffix(prefix, &format!(".{}", format.as_str()));
            tokio::fs::write(&path, document.as_bytes()).await?;
            tracing::debug!(path = %path.display(), count = snapshots.len(), "Wrote document");
            Ok(Artifact::Document(path))
        }
        (_, Destination::Stdout) => {
            let document = render_document(snapshots, format)?;
            let mut stdout = tokio::io::stdout();
            let bytes = write_document(&mut stdout, &document).await?;
            Ok(Artifact::Streamed { bytes })
        }
    }
}

/// Text of an html or json export.
pub fn render_document(snapshots: &SnapshotSequence, format: ExportFormat) -> FlowdrawResult<String> {
    match format {
        ExportFormat::Html => Ok(render_html(snapshots)),
        ExportFormat::Json => render_json(snapshots),
        ExportFormat::Img => Err(FlowdrawError::config(
            "The img export format has no single-document form",
        )),
    }
}

/// One `<img>` element per snapshot, concatenated.
pub fn render_html(snapshots: &SnapshotSequence) -> String {
    snapshots
        .iter()
        .map(|s| format!(r#"<img src="{}"></img>"#, s.uri()))
        .collect()
}

/// The URI list as JSON, indented by four spaces.
pub fn render_json(snapshots: &SnapshotSequence) -> FlowdrawResult<String> {
    let mut buffer = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
    snapshots.uris().serialize(&mut serializer)?;
    String::from_utf8(buffer).map_err(|e| FlowdrawError::Other(e.into()))
}

/// Write a document followed by a newline; returns bytes written.
pub async fn write_document<W>(writer: &mut W, document: &str) -> FlowdrawResult<usize>
where
    W: tokio::io::AsyncWrite + Unpin,
{
    writer.write_all(document.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await?;
    Ok(document.len() + 1)
}

/// Zero-padded index for image `index` of `count`.
///
/// The width is the digit count of `count - 1`, so names sort
/// lexicographically in sequence order.
pub fn padded_index(index: usize, count: usize) -> String {
    let width = count.saturating_sub(1).to_string().len();
    format!("{index:0width$}")
}

/// `<prefix>-<index>.<extension>`
pub fn image_path(prefix: &Path, index: usize, count: usize, extension: &str) -> PathBuf {
    with_suffix(
        prefix,
        &format!("-{}.{extension}", padded_index(index, count)),
    )
}

async fn export_images(snapshots: &SnapshotSequence, prefix: &Path) -> FlowdrawResult<Vec<PathBuf>> {
    // Decode everything first so a bad payload leaves nothing on disk.
    let images: Vec<DecodedImage> = snapshots
        .iter()
        .map(|s| s.decode())
        .collect::<FlowdrawResult<_>>()?;

    let count = images.len();
    let mut written = Vec::with_capacity(count);
    for (index, image) in images.iter().enumerate() {
        let path = image_path(prefix, index, count, &image.extension);
        tokio::fs::write(&path, &image.bytes).await?;
        written.push(path);
    }

    tracing::debug!(prefix = %prefix.display(), count, "Wrote images");
    Ok(written)
}

/// Append `suffix` to the last path component without touching existing
/// dots (`a.b` + `.json` is `a.b.json`, not `a.json`).
fn with_suffix(prefix: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(prefix.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}
