//! Snapshots: one rendered image per workspace, carried as a data URI.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::{Deserialize, Serialize};

use flowdraw_common::error::{FlowdrawError, FlowdrawResult};

/// MIME type of snapshots produced by the built-in SVG engine.
pub const SVG_MIME: &str = "image/svg+xml";

/// One rendered workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Workspace the image was captured from.
    pub workspace_id: String,

    /// `data:<mime>;base64,<payload>`
    uri: String,
}

impl Snapshot {
    /// Wrap an already-formed data URI.
    pub fn from_uri(workspace_id: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            workspace_id: workspace_id.into(),
            uri: uri.into(),
        }
    }

    /// Encode raw image bytes as a base64 data URI.
    pub fn from_bytes(workspace_id: impl Into<String>, mime: &str, bytes: &[u8]) -> Self {
        Self::from_uri(
            workspace_id,
            format!("data:{mime};base64,{}", BASE64.encode(bytes)),
        )
    }

    /// Encode an SVG document.
    pub fn from_svg(workspace_id: impl Into<String>, svg: &str) -> Self {
        Self::from_bytes(workspace_id, SVG_MIME, svg.as_bytes())
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Split the data URI into its parts without decoding the payload.
    pub fn data_uri(&self) -> FlowdrawResult<DataUri<'_>> {
        DataUri::parse(&self.uri)
    }

    /// Decode the embedded image.
    pub fn decode(&self) -> FlowdrawResult<DecodedImage> {
        let parts = self.data_uri()?;
        let bytes = BASE64.decode(parts.payload).map_err(|e| {
            FlowdrawError::decode(format!(
                "Invalid base64 payload for workspace {}: {e}",
                self.workspace_id
            ))
        })?;
        Ok(DecodedImage {
            mime: parts.mime.to_string(),
            extension: parts.extension().to_string(),
            bytes,
        })
    }
}

/// A parsed `data:<type>/<subtype>;base64,<payload>` URI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataUri<'a> {
    pub mime: &'a str,
    pub subtype: &'a str,
    pub payload: &'a str,
}

impl<'a> DataUri<'a> {
    pub fn parse(uri: &'a str) -> FlowdrawResult<Self> {
        let shape_error = || {
            let preview: String = uri.chars().take(32).collect();
            FlowdrawError::decode(format!(
                "Expected data:<mime>;base64,<payload>, found {preview:?}"
            ))
        };

        let rest = uri.strip_prefix("data:").ok_or_else(shape_error)?;
        let (mime, payload) = rest.split_once(";base64,").ok_or_else(shape_error)?;
        // Parameters such as `;charset=utf-8` are not part of the type.
        let essence = mime.split(';').next().unwrap_or(mime).trim();
        let (kind, subtype) = essence.split_once('/').ok_or_else(shape_error)?;
        if kind.is_empty() || subtype.is_empty() {
            return Err(shape_error());
        }

        Ok(Self {
            mime: essence,
            subtype,
            payload,
        })
    }

    /// File extension for the image: the subtype without any `+suffix`.
    pub fn extension(&self) -> &'a str {
        self.subtype.split('+').next().unwrap_or(self.subtype)
    }
}

/// Raw image bytes recovered from a snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub mime: String,
    pub extension: String,
    pub bytes: Vec<u8>,
}

/// Snapshots of one flow, in traversal order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SnapshotSequence(Vec<Snapshot>);

impl SnapshotSequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self(Vec::with_capacity(capacity))
    }

    pub fn push(&mut self, snapshot: Snapshot) {
        self.0.push(snapshot);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Snapshot> {
        self.0.iter()
    }

    pub fn get(&self, index: usize) -> Option<&Snapshot> {
        self.0.get(index)
    }

    /// The image references, in sequence order.
    pub fn uris(&self) -> Vec<&str> {
        self.0.iter().map(Snapshot::uri).collect()
    }

    /// The workspace ids, in sequence order.
    pub fn workspace_ids(&self) -> Vec<&str> {
        self.0.iter().map(|s| s.workspace_id.as_str()).collect()
    }
}

impl From<Vec<Snapshot>> for SnapshotSequence {
    fn from(snapshots: Vec<Snapshot>) -> Self {
        Self(snapshots)
    }
}

impl<'a> IntoIterator for &'a SnapshotSequence {
    type Item = &'a Snapshot;
    type IntoIter = std::slice::Iter<'a, Snapshot>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
