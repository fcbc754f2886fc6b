//! Node and workspace records.

use serde::{Deserialize, Deserializer, Serialize};

/// Node type marking a workspace (tab) descriptor.
pub const TAB_TYPE: &str = "tab";

/// Node type marking a subflow template.
pub const SUBFLOW_TYPE: &str = "subflow";

/// Prefix of the type of a node that instantiates a subflow template.
pub const SUBFLOW_INSTANCE_PREFIX: &str = "subflow:";

/// Node type used for editor group frames.
pub const GROUP_TYPE: &str = "group";

/// A single record of a flow definition.
///
/// Only the attributes the renderer cares about are typed; everything else
/// is kept in `extra` so that nothing is lost when a flow is re-serialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Unique identifier within the flow.
    pub id: String,

    /// Node type (`tab`, `subflow`, `inject`, `subflow:<id>`, ...).
    #[serde(rename = "type")]
    pub node_type: String,

    /// Owning workspace or subflow id. Config nodes have none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z: Option<String>,

    /// Target node ids, one list per output port.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub wires: Vec<Vec<String>>,

    /// User-assigned name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Display label (used by tabs).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    /// Centre position on the canvas.
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,

    /// Explicit size (groups and resized nodes).
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub w: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub h: Option<f64>,

    /// Tab-level disable flag.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub disabled: bool,

    /// Node-level disable flag.
    #[serde(default, rename = "d", skip_serializing_if = "std::ops::Not::not")]
    pub deactivated: bool,

    /// Remaining attributes, untouched.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Node {
    /// Create a bare node of the given type.
    pub fn new(id: impl Into<String>, node_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            node_type: node_type.into(),
            z: None,
            wires: Vec::new(),
            name: None,
            label: None,
            x: None,
            y: None,
            w: None,
            h: None,
            disabled: false,
            deactivated: false,
            extra: serde_json::Map::new(),
        }
    }

    pub fn is_workspace(&self) -> bool {
        self.node_type == TAB_TYPE
    }

    pub fn is_subflow(&self) -> bool {
        self.node_type == SUBFLOW_TYPE
    }

    pub fn is_group(&self) -> bool {
        self.node_type == GROUP_TYPE
    }

    /// The template id if this node instantiates a subflow.
    pub fn subflow_instance_of(&self) -> Option<&str> {
        self.node_type.strip_prefix(SUBFLOW_INSTANCE_PREFIX)
    }

    /// Whether the node sits on the canvas (config nodes have no position).
    pub fn has_position(&self) -> bool {
        self.x.is_some() && self.y.is_some()
    }

    /// Whether the node can be drawn inside a workspace.
    pub fn is_drawable(&self) -> bool {
        !self.is_workspace() && !self.is_subflow() && self.has_position()
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled || self.deactivated
    }

    /// Number of output ports declared by the wiring.
    pub fn output_count(&self) -> usize {
        self.wires.len()
    }

    /// `(inputs, outputs)` declared by a subflow template.
    pub fn subflow_ports(&self) -> (usize, usize) {
        let count = |key: &str| {
            self.extra
                .get(key)
                .and_then(serde_json::Value::as_array)
                .map_or(0, Vec::len)
        };
        (count("in"), count("out"))
    }
}

/// A workspace (tab) of a flow: the unit of rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workspace {
    pub id: String,

    /// Display name shown on the tab.
    pub label: String,

    /// Whether the whole tab is disabled.
    pub disabled: bool,

    /// Position among the flow's workspaces, in declaration order.
    pub index: usize,

    /// True when the flow declared no tabs and this one was created to hold
    /// its top-level nodes.
    pub synthetic: bool,
}

/// One resolved connection between two nodes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Wire<'a> {
    pub source: &'a Node,
    pub port: usize,
    pub target: &'a Node,
}

/// Accept numbers and numeric strings; anything else is treated as absent.
fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => n.as_f64(),
        Some(serde_json::Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_deserialization_keeps_unknown_fields() {
        let node: Node = serde_json::from_str(
            r#"{"id":"n1","type":"inject","z":"t1","x":100,"y":"80","wires":[["n2"]],"repeat":"5"}"#,
        )
        .unwrap();
        assert_eq!(node.node_type, "inject");
        assert_eq!(node.z.as_deref(), Some("t1"));
        assert_eq!(node.x, Some(100.0));
        assert_eq!(node.y, Some(80.0));
        assert_eq!(node.wires, vec![vec!["n2".to_string()]]);
        assert_eq!(node.extra.get("repeat"), Some(&serde_json::json!("5")));
        assert!(node.is_drawable());
    }

    #[test]
    fn test_disable_flags() {
        let tab: Node =
            serde_json::from_str(r#"{"id":"t1","type":"tab","disabled":true}"#).unwrap();
        assert!(tab.is_disabled());
        assert!(tab.is_workspace());
        assert!(!tab.is_drawable());

        let node: Node =
            serde_json::from_str(r#"{"id":"n1","type":"debug","d":true,"x":1,"y":2}"#).unwrap();
        assert!(node.is_disabled());
    }

    #[test]
    fn test_subflow_helpers() {
        let template: Node = serde_json::from_str(
            r#"{"id":"sf","type":"subflow","name":"S","in":[{"x":50,"y":30}],"out":[{},{}]}"#,
        )
        .unwrap();
        assert!(template.is_subflow());
        assert_eq!(template.subflow_ports(), (1, 2));

        let instance = Node::new("i1", "subflow:sf");
        assert_eq!(instance.subflow_instance_of(), Some("sf"));
    }

    #[test]
    fn test_config_node_is_not_drawable() {
        let node: Node =
            serde_json::from_str(r#"{"id":"c1","type":"mqtt-broker","broker":"localhost"}"#)
                .unwrap();
        assert!(!node.has_position());
        assert!(!node.is_drawable());
    }
}
