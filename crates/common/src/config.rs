//! Application configuration.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::FlowdrawError;

/// Global application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Render session defaults.
    #[serde(default)]
    pub render: RenderDefaults,

    /// Export defaults.
    #[serde(default)]
    pub export: ExportDefaults,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Default render session parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderDefaults {
    /// Minimum wait between import and the first render, used when the
    /// engine cannot report a stable layout itself.
    pub settle_delay_ms: u64,

    /// Upper bound for rendering a single workspace.
    pub render_timeout_secs: u64,

    /// Order in which workspaces are rendered.
    pub traversal_order: TraversalOrder,

    /// Directory with additional node type descriptors.
    pub node_types_dir: Option<PathBuf>,
}

/// Default export parameters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportDefaults {
    /// Output encoding used when none is given on the command line.
    pub format: ExportFormat,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "flowdraw=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path.
    pub file: Option<PathBuf>,
}

/// Output encoding for a snapshot sequence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// One HTML document embedding every snapshot.
    #[default]
    Html,
    /// Pretty-printed JSON array of data URIs.
    Json,
    /// One decoded image file per snapshot.
    Img,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Html => "html",
            Self::Json => "json",
            Self::Img => "img",
        }
    }

    /// Whether the format produces a single text document.
    pub fn is_document(&self) -> bool {
        !matches!(self, Self::Img)
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportFormat {
    type Err = FlowdrawError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "html" => Ok(Self::Html),
            "json" => Ok(Self::Json),
            "img" => Ok(Self::Img),
            other => Err(FlowdrawError::config(format!(
                "Unknown format: {other}. Use: html, json, img"
            ))),
        }
    }
}

/// Workspace traversal order.
///
/// `Reverse` renders the last-declared workspace first, which is what
/// existing exports were produced with. `Declaration` follows the order the
/// workspaces appear in the flow file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TraversalOrder {
    #[default]
    Reverse,
    Declaration,
}

impl Default for RenderDefaults {
    fn default() -> Self {
        Self {
            settle_delay_ms: 100,
            render_timeout_secs: 30,
            traversal_order: TraversalOrder::Reverse,
            node_types_dir: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        Self::load_from(&config_file_path())
    }

    /// Load config from an explicit path, falling back to defaults.
    pub fn load_from(config_path: &std::path::Path) -> Self {
        if config_path.exists() {
            match std::fs::read_to_string(config_path) {
                Ok(content) => match serde_json::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => {
                        tracing::warn!("Failed to parse config at {:?}: {}", config_path, e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read config at {:?}: {}", config_path, e);
                }
            }
        }
        Self::default()
    }
}

/// Standard config file location.
pub fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("flowdraw").join("config.json")
}
