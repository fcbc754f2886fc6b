//! Node type registry.
//!
//! The registry is plain data: one [`NodeTypeDef`] per node type, giving the
//! colour, default label, and port counts the renderer needs. The core node
//! set is declared statically below. Installed extensions contribute extra
//! definitions as JSON descriptor files, loaded with
//! [`NodeTypeRegistry::load_dir`].

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use flowdraw_common::error::{FlowdrawError, FlowdrawResult};

/// Presentation data for one node type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeTypeDef {
    /// The `type` string nodes of this kind carry.
    #[serde(rename = "type")]
    pub type_name: String,

    /// Palette category.
    #[serde(default = "default_category")]
    pub category: String,

    /// Fill colour (any SVG colour value).
    #[serde(default = "default_color")]
    pub color: String,

    /// Label used when the node has no name.
    #[serde(default)]
    pub label: Option<String>,

    /// Number of input ports (0 or 1).
    #[serde(default)]
    pub inputs: usize,

    /// Default number of output ports, used when a node has no wiring.
    #[serde(default)]
    pub outputs: usize,
}

fn default_category() -> String {
    "custom".to_string()
}

fn default_color() -> String {
    "#ddd".to_string()
}

impl NodeTypeDef {
    pub fn new(
        type_name: &str,
        category: &str,
        color: &str,
        inputs: usize,
        outputs: usize,
    ) -> Self {
        Self {
            type_name: type_name.to_string(),
            category: category.to_string(),
            color: color.to_string(),
            label: None,
            inputs,
            outputs,
        }
    }

    /// Label shown for an unnamed node of this type.
    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.type_name)
    }
}

/// Descriptor files hold either a single definition or a list of them.
#[derive(Deserialize)]
#[serde(untagged)]
enum Descriptor {
    Many(Vec<NodeTypeDef>),
    One(NodeTypeDef),
}

/// Lookup table from node type to presentation data.
#[derive(Debug, Clone, Default)]
pub struct NodeTypeRegistry {
    defs: HashMap<String, NodeTypeDef>,
}

/// `(type, category, colour, inputs, outputs)` for the core node set.
const CORE_TYPES: &[(&str, &str, &str, usize, usize)] = &[
    ("inject", "common", "#a6bbcf", 0, 1),
    ("debug", "common", "#87a980", 1, 0),
    ("complete", "common", "#c0edc0", 0, 1),
    ("catch", "common", "#e49191", 0, 1),
    ("status", "common", "#94c1d0", 0, 1),
    ("link in", "common", "#ddd", 0, 1),
    ("link out", "common", "#ddd", 1, 0),
    ("link call", "common", "#ddd", 1, 1),
    ("comment", "common", "#ffffff", 0, 0),
    ("function", "function", "#fdd0a2", 1, 1),
    ("switch", "function", "#E2D96E", 1, 1),
    ("change", "function", "#E2D96E", 1, 1),
    ("range", "function", "#E2D96E", 1, 1),
    ("template", "function", "rgb(243, 181, 103)", 1, 1),
    ("delay", "function", "#E6E0F8", 1, 1),
    ("trigger", "function", "#E6E0F8", 1, 1),
    ("exec", "function", "darksalmon", 1, 3),
    ("rbe", "function", "#E2D96E", 1, 1),
    ("filter", "function", "#E2D96E", 1, 1),
    ("mqtt in", "network", "#d8bfd8", 0, 1),
    ("mqtt out", "network", "#d8bfd8", 1, 0),
    ("http in", "network", "rgb(231, 231, 174)", 0, 1),
    ("http response", "network", "rgb(231, 231, 174)", 1, 0),
    ("http request", "network", "rgb(231, 231, 174)", 1, 1),
    ("websocket in", "network", "rgb(215, 215, 160)", 0, 1),
    ("websocket out", "network", "rgb(215, 215, 160)", 1, 0),
    ("tcp in", "network", "Silver", 0, 1),
    ("tcp out", "network", "Silver", 1, 0),
    ("tcp request", "network", "Silver", 1, 1),
    ("udp in", "network", "Silver", 0, 1),
    ("udp out", "network", "Silver", 1, 0),
    ("split", "sequence", "#E2D96E", 1, 1),
    ("join", "sequence", "#E2D96E", 1, 1),
    ("sort", "sequence", "#E2D96E", 1, 1),
    ("batch", "sequence", "#E2D96E", 1, 1),
    ("csv", "parser", "#DEBD5C", 1, 1),
    ("html", "parser", "#DEBD5C", 1, 1),
    ("json", "parser", "#DEBD5C", 1, 1),
    ("xml", "parser", "#DEBD5C", 1, 1),
    ("yaml", "parser", "#DEBD5C", 1, 1),
    ("file", "storage", "BurlyWood", 1, 1),
    ("file in", "storage", "BurlyWood", 1, 1),
    ("watch", "storage", "BurlyWood", 0, 1),
];

/// Colour for subflow instances whose template sets none.
pub const SUBFLOW_INSTANCE_COLOR: &str = "#DDAA99";

impl NodeTypeRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry pre-populated with the core node set.
    pub fn with_core_types() -> Self {
        let mut registry = Self::new();
        for &(name, category, color, inputs, outputs) in CORE_TYPES {
            registry.register(NodeTypeDef::new(name, category, color, inputs, outputs));
        }
        registry
    }

    /// Add or replace a definition. Returns the one it replaced.
    pub fn register(&mut self, def: NodeTypeDef) -> Option<NodeTypeDef> {
        self.defs.insert(def.type_name.clone(), def)
    }

    pub fn lookup(&self, type_name: &str) -> Option<&NodeTypeDef> {
        self.defs.get(type_name)
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.defs.contains_key(type_name)
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    /// Load every `*.json` descriptor directly inside `dir`.
    ///
    /// Returns the number of definitions added. Files are read in name
    /// order so that later files deterministically override earlier ones.
    pub fn load_dir(&mut self, dir: &Path) -> FlowdrawResult<usize> {
        if !dir.is_dir() {
            return Err(FlowdrawError::FileNotFound {
                path: dir.to_path_buf(),
            });
        }

        let mut files: Vec<_> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "json"))
            .collect();
        files.sort();

        let mut added = 0;
        for path in files {
            let content = std::fs::read_to_string(&path)?;
            let descriptor: Descriptor = serde_json::from_str(&content).map_err(|e| {
                FlowdrawError::config(format!(
                    "Invalid node type descriptor {}: {e}",
                    path.display()
                ))
            })?;
            let defs = match descriptor {
                Descriptor::Many(defs) => defs,
                Descriptor::One(def) => vec![def],
            };
            for def in defs {
                tracing::debug!(node_type = %def.type_name, file = %path.display(), "Registered node type");
                self.register(def);
                added += 1;
            }
        }

        Ok(added)
    }
}
