//! Parsed flow definitions.
//!
//! A [`Flow`] is parsed once per input file and never mutated afterwards.
//! Parsing checks document shape and id uniqueness only. A node whose `z`
//! names neither a workspace nor a subflow is kept as-is; rejecting it is
//! left to the render engine at import time (see [`Flow::dangling_nodes`]).

use std::collections::{HashMap, HashSet};

use serde_json::Value;

use crate::node::{Node, Wire, Workspace};

/// Id given to the workspace created for flows that declare no tabs.
pub const DEFAULT_WORKSPACE_ID: &str = "flowdraw:default";

/// Label given to the workspace created for flows that declare no tabs.
pub const DEFAULT_WORKSPACE_LABEL: &str = "Flow 1";

/// An immutable, parsed flow definition.
#[derive(Debug, Clone)]
pub struct Flow {
    nodes: Vec<Node>,
    index: HashMap<String, usize>,
    workspaces: Vec<Workspace>,
}

impl Flow {
    /// Parse raw bytes of a flow file.
    pub fn parse(raw: &[u8]) -> Result<Self, FlowError> {
        let document: Value = serde_json::from_slice(raw)?;

        let entries = match document {
            Value::Array(entries) => entries,
            Value::Object(mut map) => match map.remove("flows") {
                Some(Value::Array(entries)) => entries,
                Some(_) => {
                    return Err(FlowError::Shape {
                        message: "`flows` must be an array".to_string(),
                    })
                }
                None => {
                    return Err(FlowError::Shape {
                        message: "expected an array of nodes or an object with `flows`"
                            .to_string(),
                    })
                }
            },
            other => {
                return Err(FlowError::Shape {
                    message: format!("expected an array of nodes, found {}", kind_of(&other)),
                })
            }
        };

        let mut nodes = Vec::with_capacity(entries.len());
        for (index, entry) in entries.into_iter().enumerate() {
            if !entry.is_object() {
                return Err(FlowError::InvalidNode {
                    index,
                    message: format!("expected an object, found {}", kind_of(&entry)),
                });
            }
            let mut node: Node =
                serde_json::from_value(entry).map_err(|e| FlowError::InvalidNode {
                    index,
                    message: e.to_string(),
                })?;
            if node.z.as_deref() == Some("") {
                node.z = None;
            }
            nodes.push(node);
        }

        Self::from_nodes(nodes)
    }

    /// Build a flow from already-deserialized nodes.
    pub fn from_nodes(nodes: Vec<Node>) -> Result<Self, FlowError> {
        let mut index = HashMap::with_capacity(nodes.len());
        for (i, node) in nodes.iter().enumerate() {
            if index.insert(node.id.clone(), i).is_some() {
                return Err(FlowError::DuplicateId {
                    id: node.id.clone(),
                });
            }
        }

        let mut workspaces: Vec<Workspace> = nodes
            .iter()
            .filter(|n| n.is_workspace())
            .enumerate()
            .map(|(i, n)| Workspace {
                id: n.id.clone(),
                label: n
                    .label
                    .clone()
                    .or_else(|| n.name.clone())
                    .unwrap_or_else(|| n.id.clone()),
                disabled: n.disabled,
                index: i,
                synthetic: false,
            })
            .collect();

        let has_loose_nodes = nodes.iter().any(|n| n.z.is_none() && n.is_drawable());
        if workspaces.is_empty() && has_loose_nodes && !index.contains_key(DEFAULT_WORKSPACE_ID) {
            workspaces.push(Workspace {
                id: DEFAULT_WORKSPACE_ID.to_string(),
                label: DEFAULT_WORKSPACE_LABEL.to_string(),
                disabled: false,
                index: 0,
                synthetic: true,
            });
        }

        Ok(Self {
            nodes,
            index,
            workspaces,
        })
    }

    /// All nodes in file order.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Look up a node by id.
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.index.get(id).map(|&i| &self.nodes[i])
    }

    /// Workspaces in declaration order.
    pub fn workspaces(&self) -> &[Workspace] {
        &self.workspaces
    }

    pub fn workspace(&self, id: &str) -> Option<&Workspace> {
        self.workspaces.iter().find(|w| w.id == id)
    }

    /// Workspace ids in declaration order.
    pub fn workspace_ids(&self) -> Vec<&str> {
        self.workspaces.iter().map(|w| w.id.as_str()).collect()
    }

    /// Subflow templates in file order.
    pub fn subflows(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(|n| n.is_subflow())
    }

    /// Nodes owned by the given workspace, in file order.
    ///
    /// For the synthetic default workspace these are the positioned nodes
    /// without a `z`.
    pub fn nodes_in<'a>(&'a self, workspace_id: &'a str) -> impl Iterator<Item = &'a Node> + 'a {
        let synthetic = self.workspace(workspace_id).is_some_and(|w| w.synthetic);
        self.nodes.iter().filter(move |n| {
            if n.is_workspace() || n.is_subflow() {
                return false;
            }
            if synthetic {
                n.z.is_none() && n.has_position()
            } else {
                n.z.as_deref() == Some(workspace_id)
            }
        })
    }

    /// Nodes whose `z` references neither a workspace nor a subflow.
    pub fn dangling_nodes(&self) -> Vec<&Node> {
        let owners: HashSet<&str> = self
            .nodes
            .iter()
            .filter(|n| n.is_workspace() || n.is_subflow())
            .map(|n| n.id.as_str())
            .collect();
        self.nodes
            .iter()
            .filter(|n| matches!(n.z.as_deref(), Some(z) if !owners.contains(z)))
            .collect()
    }

    /// Outgoing connections of a node. Wires to unknown ids are dropped.
    pub fn wires_from<'a>(&'a self, node: &'a Node) -> Vec<Wire<'a>> {
        node.wires
            .iter()
            .enumerate()
            .flat_map(move |(port, targets)| {
                targets.iter().filter_map(move |target| {
                    self.node(target).map(|target| Wire {
                        source: node,
                        port,
                        target,
                    })
                })
            })
            .collect()
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Errors that can occur when parsing a flow definition.
#[derive(Debug, thiserror::Error)]
pub enum FlowError {
    #[error("Invalid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Unexpected document shape: {message}")]
    Shape { message: String },

    #[error("Invalid node at index {index}: {message}")]
    InvalidNode { index: usize, message: String },

    #[error("Duplicate node id: {id}")]
    DuplicateId { id: String },
}
