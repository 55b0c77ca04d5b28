use ahash::AHashMap;
use serde::{Deserialize, Serialize};

/// Canvas coordinates of a node.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Discriminates what a node stands for in the workflow graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// A plugin invocation; its `config` must carry a plugin id to validate.
    Plugin,
    /// An auxiliary data source (e.g. a literal-content input).
    Auxiliary,
}

/// Per-node execution status. New execution attempts reset to `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeStatus {
    #[default]
    Idle,
    Running,
    Success,
    Error,
}

/// The `config` key that plugin-backed nodes must populate.
pub const CONFIG_PLUGIN_ID: &str = "plugin_id";

/// A single unit of the workflow graph, owned exclusively by the store.
///
/// The canvas never holds authoritative node state, only a rendering
/// projection of this struct.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub kind: NodeKind,
    pub name: String,
    pub position: Position,
    /// Open key-value configuration: command id, parameter values, literal
    /// content for auxiliary nodes.
    #[serde(default)]
    pub config: AHashMap<String, serde_json::Value>,
    #[serde(default)]
    pub inputs: Vec<String>,
    #[serde(default)]
    pub outputs: Vec<String>,
    #[serde(default)]
    pub status: NodeStatus,
}

impl Node {
    /// The configured plugin id, if any non-empty string value is present.
    pub fn plugin_id(&self) -> Option<&str> {
        self.config
            .get(CONFIG_PLUGIN_ID)
            .and_then(|value| value.as_str())
            .filter(|id| !id.is_empty())
    }
}

/// Input to [`GraphStore::add_node`](crate::graph::GraphStore::add_node).
///
/// Everything except `kind` and `name` is optional; the store merges defaults
/// and assigns an id when none is supplied.
#[derive(Debug, Clone)]
pub struct NodeSpec {
    pub id: Option<String>,
    pub kind: NodeKind,
    pub name: String,
    pub position: Option<Position>,
    pub config: AHashMap<String, serde_json::Value>,
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
}

impl NodeSpec {
    pub fn new(kind: NodeKind, name: impl Into<String>) -> Self {
        Self {
            id: None,
            kind,
            name: name.into(),
            position: None,
            config: AHashMap::new(),
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.position = Some(Position::new(x, y));
        self
    }

    pub fn with_config_value(
        mut self,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.config.insert(key.into(), value.into());
        self
    }

    pub fn with_inputs<I, S>(mut self, inputs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inputs = inputs.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_outputs<I, S>(mut self, outputs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.outputs = outputs.into_iter().map(Into::into).collect();
        self
    }
}

/// A shallow-merge update for [`GraphStore::update_node`](crate::graph::GraphStore::update_node).
///
/// Only the populated fields are applied; a provided `config` replaces the
/// node's whole config map. Property edits are not undo-tracked.
#[derive(Debug, Clone, Default)]
pub struct NodePatch {
    pub name: Option<String>,
    pub position: Option<Position>,
    pub config: Option<AHashMap<String, serde_json::Value>>,
    pub inputs: Option<Vec<String>>,
    pub outputs: Option<Vec<String>>,
    pub status: Option<NodeStatus>,
}

impl NodePatch {
    pub(crate) fn apply(self, node: &mut Node) {
        if let Some(name) = self.name {
            node.name = name;
        }
        if let Some(position) = self.position {
            node.position = position;
        }
        if let Some(config) = self.config {
            node.config = config;
        }
        if let Some(inputs) = self.inputs {
            node.inputs = inputs;
        }
        if let Some(outputs) = self.outputs {
            node.outputs = outputs;
        }
        if let Some(status) = self.status {
            node.status = status;
        }
    }
}
