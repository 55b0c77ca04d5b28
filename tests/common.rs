//! Common test utilities for building graphs, documents and manifests.
use flowstate::prelude::*;
use std::cell::RefCell;
use std::rc::Rc;

/// Creates an auxiliary source node spec with a single output port.
#[allow(dead_code)]
pub fn auxiliary_node(name: &str) -> NodeSpec {
    NodeSpec::new(NodeKind::Auxiliary, name).with_outputs(["output"])
}

/// Creates a plugin-backed node spec with a configured plugin id.
#[allow(dead_code)]
pub fn plugin_node(name: &str, plugin_id: &str) -> NodeSpec {
    NodeSpec::new(NodeKind::Plugin, name)
        .with_config_value("plugin_id", plugin_id)
        .with_inputs(["input"])
        .with_outputs(["result", "error"])
}

/// Builds a store holding a linear chain of `count` auxiliary nodes with a
/// connection between each consecutive pair. Generated ids run
/// `node_1..node_count` and `connection_1..`.
#[allow(dead_code)]
pub fn chain_store(count: usize) -> GraphStore {
    let mut store = GraphStore::new();
    let mut previous: Option<Node> = None;
    for index in 0..count {
        let node = store.add_node(auxiliary_node(&format!("N{}", index + 1)), true);
        if let Some(previous) = &previous {
            store.add_connection(
                ConnectionSpec::new(previous.id.as_str(), node.id.as_str()),
                false,
                true,
            );
        }
        previous = Some(node);
    }
    store
}

/// Canvas test double: records every call and serves a mutable edge list.
#[allow(dead_code)]
#[derive(Default)]
pub struct RecordingCanvas {
    pub edges: Vec<CanvasEdge>,
    pub drawn: Vec<String>,
    pub erased: Vec<String>,
    pub restored: Vec<Vec<String>>,
}

#[allow(dead_code)]
impl RecordingCanvas {
    pub fn shared() -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Self::default()))
    }

    /// The ids currently on the surface, sorted.
    pub fn edge_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.edges.iter().filter_map(|e| e.id.clone()).collect();
        ids.sort();
        ids
    }
}

impl CanvasSurface for RecordingCanvas {
    fn all_edges(&self) -> Vec<CanvasEdge> {
        self.edges.clone()
    }

    fn bind_edge_id(&mut self, source_node_id: &str, target_node_id: &str, edge_id: &str) {
        for edge in &mut self.edges {
            if edge.id.is_none()
                && edge.source_node_id == source_node_id
                && edge.target_node_id == target_node_id
            {
                edge.id = Some(edge_id.to_string());
                return;
            }
        }
    }

    fn draw(&mut self, connection: &Connection) {
        self.drawn.push(connection.id.clone());
        if !self
            .edges
            .iter()
            .any(|e| e.id.as_deref() == Some(connection.id.as_str()))
        {
            self.edges.push(
                CanvasEdge::new(
                    connection.source_node_id.as_str(),
                    connection.target_node_id.as_str(),
                )
                .with_id(connection.id.as_str())
                .with_target_param(connection.target_param.as_str()),
            );
        }
    }

    fn erase(&mut self, connection_id: &str) {
        self.erased.push(connection_id.to_string());
        self.edges
            .retain(|e| e.id.as_deref() != Some(connection_id));
    }

    fn restore_all(&mut self, connections: &[Connection]) {
        self.restored
            .push(connections.iter().map(|c| c.id.clone()).collect());
        self.edges = connections
            .iter()
            .map(|connection| {
                CanvasEdge::new(
                    connection.source_node_id.as_str(),
                    connection.target_node_id.as_str(),
                )
                .with_id(connection.id.as_str())
                .with_target_param(connection.target_param.as_str())
            })
            .collect();
    }
}

/// Builds a single-command manifest from raw documentation text.
#[allow(dead_code)]
pub fn manifest_with_command(description: &str, example: &str) -> PluginManifest {
    PluginManifest {
        id: "image-gen".to_string(),
        name: "ImageGen".to_string(),
        capabilities: Capabilities {
            invocation_commands: vec![InvocationCommand {
                command: None,
                name: None,
                description: description.to_string(),
                example: example.to_string(),
            }],
        },
        ..PluginManifest::default()
    }
}
