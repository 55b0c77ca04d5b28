use ahash::{AHashMap, AHashSet};
use itertools::Itertools;
use tracing::{debug, error, warn};

use super::order;
use super::{Connection, ConnectionSpec, Node, NodeKind, NodePatch, NodeSpec, NodeStatus, Position};
use crate::document::{CanvasState, DOCUMENT_VERSION, WorkflowDocument};
use crate::error::ValidationIssue;
use crate::event::{EventBus, GraphEvent, ListenerId};
use crate::graph::history::UndoAction;

/// Workflow name used until the caller supplies one.
pub const DEFAULT_WORKFLOW_NAME: &str = "Untitled workflow";

const MIN_ZOOM: f64 = 0.1;
const MAX_ZOOM: f64 = 3.0;

/// Result of [`GraphStore::validate`]: a report, not an enforced constraint.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
}

/// Node, connection and selection counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GraphStats {
    pub node_count: usize,
    pub connection_count: usize,
    pub selected_node_count: usize,
    pub selected_connection_count: usize,
}

/// Canonical owner of the workflow graph: nodes, connections, selection and
/// the undo/redo log.
///
/// This is the only component permitted to assign canonical ids. All mutation
/// is synchronous and atomic from the caller's point of view: a call either
/// fully applies (maps updated, event emitted, history recorded) or fully
/// rejects with a logged diagnostic and a `None`/`false` return. Nothing in
/// this store performs I/O.
///
/// Construct one per editor and pass references; there is no global instance.
pub struct GraphStore {
    workflow_name: String,
    workflow_id: Option<String>,
    canvas_offset: Position,
    canvas_zoom: f64,
    nodes: AHashMap<String, Node>,
    connections: AHashMap<String, Connection>,
    selected_nodes: AHashSet<String>,
    selected_connections: AHashSet<String>,
    executing: bool,
    undo_stack: Vec<UndoAction>,
    redo_stack: Vec<UndoAction>,
    node_seq: u64,
    connection_seq: u64,
    bus: EventBus,
}

impl Default for GraphStore {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphStore {
    pub fn new() -> Self {
        Self {
            workflow_name: DEFAULT_WORKFLOW_NAME.to_string(),
            workflow_id: None,
            canvas_offset: Position::default(),
            canvas_zoom: 1.0,
            nodes: AHashMap::new(),
            connections: AHashMap::new(),
            selected_nodes: AHashSet::new(),
            selected_connections: AHashSet::new(),
            executing: false,
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            node_seq: 1,
            connection_seq: 1,
            bus: EventBus::new(),
        }
    }

    // --- Event subscription ---

    /// Registers a listener for every store event.
    pub fn on_event<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(&GraphEvent) + 'static,
    {
        self.bus.subscribe(listener)
    }

    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        self.bus.unsubscribe(id)
    }

    fn emit(&mut self, event: GraphEvent) {
        self.bus.emit(&event);
    }

    // --- Node operations ---

    /// Inserts a node, assigning an id when the spec carries none, and
    /// returns the final node object.
    pub fn add_node(&mut self, spec: NodeSpec, record_history: bool) -> Node {
        let node = self.apply_add_node(spec);
        if record_history {
            // The final node (with its generated id) goes into the log so
            // undo can target it unambiguously.
            self.record_action(UndoAction::AddNode { node: node.clone() });
        }
        node
    }

    fn apply_add_node(&mut self, spec: NodeSpec) -> Node {
        let id = match spec.id {
            Some(id) => id,
            None => {
                let id = format!("node_{}", self.node_seq);
                self.node_seq += 1;
                id
            }
        };
        let node = Node {
            id: id.clone(),
            kind: spec.kind,
            name: spec.name,
            position: spec.position.unwrap_or(Position { x: 100.0, y: 100.0 }),
            config: spec.config,
            inputs: spec.inputs,
            outputs: spec.outputs,
            status: NodeStatus::Idle,
        };
        self.nodes.insert(id, node.clone());
        debug!(node_id = %node.id, "node added");
        self.emit(GraphEvent::NodeAdded { node: node.clone() });
        node
    }

    /// Re-inserts a previously removed node exactly as recorded.
    fn restore_node(&mut self, node: Node) {
        self.nodes.insert(node.id.clone(), node.clone());
        self.emit(GraphEvent::NodeAdded { node });
    }

    /// Removes a node and every connection incident to it. Returns `false`
    /// if the node does not exist.
    pub fn remove_node(&mut self, node_id: &str, record_history: bool) -> bool {
        let Some(node) = self.nodes.get(node_id).cloned() else {
            return false;
        };
        if record_history {
            // Collect the cascade payload before deleting anything so undo
            // restores node and edges atomically.
            let connections = self.incident_connections(node_id);
            self.record_action(UndoAction::RemoveNode { node, connections });
        }
        self.apply_remove_node(node_id)
    }

    fn apply_remove_node(&mut self, node_id: &str) -> bool {
        let Some(node) = self.nodes.get(node_id).cloned() else {
            return false;
        };
        let incident: Vec<String> = self
            .incident_connections(node_id)
            .into_iter()
            .map(|connection| connection.id)
            .collect();
        for connection_id in incident {
            // History is subsumed by the parent action.
            self.apply_remove_connection(&connection_id);
        }
        self.nodes.remove(node_id);
        self.selected_nodes.remove(node_id);
        debug!(node_id, "node removed");
        self.emit(GraphEvent::NodeRemoved {
            node_id: node_id.to_string(),
            node,
        });
        true
    }

    fn incident_connections(&self, node_id: &str) -> Vec<Connection> {
        self.connections
            .values()
            .filter(|connection| {
                connection.source_node_id == node_id || connection.target_node_id == node_id
            })
            .cloned()
            .sorted_by(|a, b| a.id.cmp(&b.id))
            .collect()
    }

    /// Shallow-merges a patch into an existing node. Not undo-tracked.
    pub fn update_node(&mut self, node_id: &str, patch: NodePatch) -> bool {
        let Some(node) = self.nodes.get_mut(node_id) else {
            return false;
        };
        patch.apply(node);
        let node = node.clone();
        self.emit(GraphEvent::NodeUpdated {
            node_id: node_id.to_string(),
            node,
        });
        true
    }

    pub fn node(&self, node_id: &str) -> Option<&Node> {
        self.nodes.get(node_id)
    }

    pub fn nodes(&self) -> &AHashMap<String, Node> {
        &self.nodes
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    // --- Connection operations ---

    /// Adds a connection after validating both endpoints.
    ///
    /// Self-loops and missing endpoints are rejected with a logged diagnostic
    /// and `None` — no exception-based control flow. Adding a duplicate
    /// `(source, target, target_param)` triple is idempotent: the existing
    /// connection is returned and nothing is recorded.
    ///
    /// `skip_render` suppresses the `ConnectionAdded` event for callers that
    /// already have the edge drawn.
    pub fn add_connection(
        &mut self,
        spec: ConnectionSpec,
        skip_render: bool,
        record_history: bool,
    ) -> Option<Connection> {
        let (connection, created) = self.apply_add_connection(spec, skip_render)?;
        if record_history && created {
            self.record_action(UndoAction::AddConnection {
                connection: connection.clone(),
                skip_render,
            });
        }
        Some(connection)
    }

    fn apply_add_connection(
        &mut self,
        spec: ConnectionSpec,
        skip_render: bool,
    ) -> Option<(Connection, bool)> {
        if spec.source_node_id == spec.target_node_id {
            error!(node_id = %spec.source_node_id, "self-loop connections are not allowed");
            return None;
        }
        if let Some(existing) = self
            .connections
            .values()
            .find(|connection| connection.routing_key() == spec.routing_key())
        {
            warn!(connection_id = %existing.id, "connection already exists");
            return Some((existing.clone(), false));
        }
        if !self.nodes.contains_key(&spec.source_node_id)
            || !self.nodes.contains_key(&spec.target_node_id)
        {
            error!(
                source = %spec.source_node_id,
                target = %spec.target_node_id,
                "source or target node not found for connection"
            );
            return None;
        }

        let id = match spec.id.clone() {
            Some(id) => id,
            None => {
                let id = format!("connection_{}", self.connection_seq);
                self.connection_seq += 1;
                id
            }
        };
        let connection = spec.into_connection(id);
        self.connections
            .insert(connection.id.clone(), connection.clone());
        debug!(connection_id = %connection.id, "connection added");

        if !skip_render {
            self.emit(GraphEvent::ConnectionAdded {
                connection: connection.clone(),
            });
        }
        Some((connection, true))
    }

    /// Removes a connection by id. Returns `false` for unknown ids.
    pub fn remove_connection(&mut self, connection_id: &str, record_history: bool) -> bool {
        let Some(connection) = self.connections.get(connection_id).cloned() else {
            warn!(connection_id, "connection not found for removal");
            return false;
        };
        if record_history {
            self.record_action(UndoAction::RemoveConnection { connection });
        }
        self.apply_remove_connection(connection_id)
    }

    fn apply_remove_connection(&mut self, connection_id: &str) -> bool {
        let Some(connection) = self.connections.remove(connection_id) else {
            return false;
        };
        self.selected_connections.remove(connection_id);
        debug!(connection_id, "connection removed");
        self.emit(GraphEvent::ConnectionRemoved {
            connection_id: connection_id.to_string(),
            connection,
        });
        true
    }

    /// Raw insert that bypasses id assignment, dedup and history. Used by
    /// the reconciler to fold in canvas edges the store has never seen.
    pub(crate) fn insert_connection_unchecked(&mut self, connection: Connection) {
        debug!(connection_id = %connection.id, "connection force-inserted");
        self.connections
            .insert(connection.id.clone(), connection);
    }

    pub fn connection(&self, connection_id: &str) -> Option<&Connection> {
        self.connections.get(connection_id)
    }

    pub fn connections(&self) -> &AHashMap<String, Connection> {
        &self.connections
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    // --- Selection ---

    pub fn select_node(&mut self, node_id: &str, multi_select: bool) {
        if !multi_select {
            self.selected_nodes.clear();
        }
        self.selected_nodes.insert(node_id.to_string());
        self.emit_selection_changed();
    }

    pub fn deselect_node(&mut self, node_id: &str) {
        self.selected_nodes.remove(node_id);
        self.emit_selection_changed();
    }

    pub fn clear_selection(&mut self) {
        self.selected_nodes.clear();
        self.selected_connections.clear();
        self.emit_selection_changed();
    }

    pub fn selected_nodes(&self) -> Vec<String> {
        self.selected_nodes.iter().cloned().sorted().collect()
    }

    fn emit_selection_changed(&mut self) {
        let selected_nodes = self.selected_nodes();
        let selected_connections: Vec<String> =
            self.selected_connections.iter().cloned().sorted().collect();
        self.emit(GraphEvent::SelectionChanged {
            selected_nodes,
            selected_connections,
        });
    }

    // --- Undo / redo ---

    fn record_action(&mut self, action: UndoAction) {
        self.undo_stack.push(action);
        // Standard linear history: a new action invalidates the redo stack.
        self.redo_stack.clear();
        self.emit_history_changed();
    }

    /// Reverses the most recent recorded action. Returns `false` when the
    /// undo stack is empty.
    pub fn undo(&mut self) -> bool {
        let Some(action) = self.undo_stack.pop() else {
            return false;
        };
        self.redo_stack.push(action.clone());

        match action {
            UndoAction::AddNode { node } => {
                self.apply_remove_node(&node.id);
            }
            UndoAction::RemoveNode { node, connections } => {
                self.restore_node(node);
                for connection in connections {
                    self.apply_add_connection(connection.into(), false);
                }
            }
            UndoAction::AddConnection { connection, .. } => {
                self.apply_remove_connection(&connection.id);
            }
            UndoAction::RemoveConnection { connection } => {
                self.apply_add_connection(connection.into(), false);
            }
        }

        self.emit_history_changed();
        debug!("undo applied");
        true
    }

    /// Re-applies the most recently undone action. Returns `false` when the
    /// redo stack is empty.
    pub fn redo(&mut self) -> bool {
        let Some(action) = self.redo_stack.pop() else {
            return false;
        };
        self.undo_stack.push(action.clone());

        match action {
            UndoAction::AddNode { node } => {
                self.restore_node(node);
            }
            UndoAction::RemoveNode { node, .. } => {
                self.apply_remove_node(&node.id);
            }
            UndoAction::AddConnection {
                connection,
                skip_render,
            } => {
                self.apply_add_connection(connection.into(), skip_render);
            }
            UndoAction::RemoveConnection { connection } => {
                self.apply_remove_connection(&connection.id);
            }
        }

        self.emit_history_changed();
        debug!("redo applied");
        true
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// `(undo depth, redo depth)`.
    pub fn history_depths(&self) -> (usize, usize) {
        (self.undo_stack.len(), self.redo_stack.len())
    }

    fn emit_history_changed(&mut self) {
        let (undo_depth, redo_depth) = self.history_depths();
        self.emit(GraphEvent::HistoryChanged {
            undo_depth,
            redo_depth,
        });
    }

    // --- Workflow identity and viewport ---

    pub fn set_workflow_name(&mut self, name: impl Into<String>) {
        self.workflow_name = name.into();
        let name = self.workflow_name.clone();
        self.emit(GraphEvent::WorkflowRenamed { name });
    }

    pub fn workflow_name(&self) -> &str {
        &self.workflow_name
    }

    pub fn set_workflow_id(&mut self, id: Option<String>) {
        self.workflow_id = id;
    }

    pub fn workflow_id(&self) -> Option<&str> {
        self.workflow_id.as_deref()
    }

    pub fn set_canvas_offset(&mut self, offset: Position) {
        self.canvas_offset = offset;
        self.emit_canvas_view_changed();
    }

    pub fn canvas_offset(&self) -> Position {
        self.canvas_offset
    }

    /// Zoom is clamped to the canvas's usable range.
    pub fn set_canvas_zoom(&mut self, zoom: f64) {
        self.canvas_zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
        self.emit_canvas_view_changed();
    }

    pub fn canvas_zoom(&self) -> f64 {
        self.canvas_zoom
    }

    fn emit_canvas_view_changed(&mut self) {
        let (offset, zoom) = (self.canvas_offset, self.canvas_zoom);
        self.emit(GraphEvent::CanvasViewChanged { offset, zoom });
    }

    // --- Execution state ---

    pub fn set_execution_state(&mut self, executing: bool) {
        self.executing = executing;
        self.emit(GraphEvent::ExecutionStateChanged { executing });
    }

    pub fn is_executing(&self) -> bool {
        self.executing
    }

    pub fn set_node_status(&mut self, node_id: &str, status: NodeStatus) -> bool {
        let Some(node) = self.nodes.get_mut(node_id) else {
            return false;
        };
        node.status = status;
        self.emit(GraphEvent::NodeStatusChanged {
            node_id: node_id.to_string(),
            status,
        });
        true
    }

    // --- Ordering and validation ---

    /// Topological execution order over the connection graph, or `None` when
    /// a cycle makes the order undefined. This is the authoritative cycle
    /// signal.
    pub fn execution_order(&self) -> Option<Vec<String>> {
        order::topological_order(&self.nodes, &self.connections)
    }

    pub fn has_cycle(&self) -> bool {
        !self.nodes.is_empty() && self.execution_order().is_none()
    }

    /// Checks the graph for structural problems without enforcing anything.
    pub fn validate(&self) -> ValidationReport {
        let mut errors = Vec::new();
        let warnings = Vec::new();

        if self.nodes.is_empty() {
            errors.push(ValidationIssue::EmptyWorkflow);
            return ValidationReport {
                valid: false,
                errors,
                warnings,
            };
        }

        for node in self.nodes.values().sorted_by(|a, b| a.id.cmp(&b.id)) {
            if node.name.trim().is_empty() {
                errors.push(ValidationIssue::MissingNodeName {
                    node_id: node.id.clone(),
                });
            }
            if node.kind == NodeKind::Plugin && node.plugin_id().is_none() {
                errors.push(ValidationIssue::MissingPluginId {
                    node_id: node.id.clone(),
                });
            }
        }

        for connection in self.connections.values().sorted_by(|a, b| a.id.cmp(&b.id)) {
            if !self.nodes.contains_key(&connection.source_node_id) {
                errors.push(ValidationIssue::MissingSourceNode {
                    connection_id: connection.id.clone(),
                    node_id: connection.source_node_id.clone(),
                });
            }
            if !self.nodes.contains_key(&connection.target_node_id) {
                errors.push(ValidationIssue::MissingTargetNode {
                    connection_id: connection.id.clone(),
                    node_id: connection.target_node_id.clone(),
                });
            }
        }

        if self.has_cycle() {
            errors.push(ValidationIssue::CircularDependency);
        }

        ValidationReport {
            valid: errors.is_empty(),
            errors,
            warnings,
        }
    }

    // --- Serialization ---

    /// Produces the persistable document form of the current graph. The
    /// caller owns where the document goes from here.
    pub fn serialize(&self) -> WorkflowDocument {
        let now = chrono::Utc::now().to_rfc3339();
        WorkflowDocument {
            version: DOCUMENT_VERSION.to_string(),
            name: self.workflow_name.clone(),
            id: self.workflow_id.clone(),
            canvas: CanvasState {
                offset: self.canvas_offset,
                zoom: self.canvas_zoom,
            },
            nodes: self.nodes.clone(),
            connections: self.connections.clone(),
            created_at: Some(now.clone()),
            updated_at: Some(now),
        }
    }

    /// Full-state replace from a document.
    ///
    /// Loads the raw maps directly — no id reassignment and no history —
    /// then recomputes the id counters from the highest numeric suffix so
    /// future generated ids cannot collide.
    pub fn deserialize(&mut self, document: WorkflowDocument) {
        self.nodes.clear();
        self.connections.clear();
        self.clear_selection();

        self.workflow_name = if document.name.is_empty() {
            DEFAULT_WORKFLOW_NAME.to_string()
        } else {
            document.name
        };
        self.workflow_id = document.id;
        self.canvas_offset = document.canvas.offset;
        self.canvas_zoom = document.canvas.zoom;
        self.nodes = document.nodes;
        self.connections = document.connections;

        self.rebuild_id_counters();

        debug!(
            nodes = self.nodes.len(),
            connections = self.connections.len(),
            "workflow loaded"
        );
        let name = self.workflow_name.clone();
        self.emit(GraphEvent::WorkflowLoaded { name });
    }

    fn rebuild_id_counters(&mut self) {
        let max_node = self
            .nodes
            .keys()
            .filter_map(|id| id.strip_prefix("node_"))
            .filter_map(|suffix| suffix.parse::<u64>().ok())
            .max()
            .unwrap_or(0);
        let max_connection = self
            .connections
            .keys()
            .filter_map(|id| id.strip_prefix("connection_"))
            .filter_map(|suffix| suffix.parse::<u64>().ok())
            .max()
            .unwrap_or(0);
        self.node_seq = max_node + 1;
        self.connection_seq = max_connection + 1;
    }

    // --- Lifecycle ---

    /// Drops every node, connection, selection and history entry and returns
    /// the store to its initial state.
    pub fn reset(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.nodes.clear();
        self.connections.clear();
        self.selected_nodes.clear();
        self.selected_connections.clear();
        self.workflow_name = DEFAULT_WORKFLOW_NAME.to_string();
        self.workflow_id = None;
        self.canvas_offset = Position::default();
        self.canvas_zoom = 1.0;
        self.executing = false;
        self.node_seq = 1;
        self.connection_seq = 1;
        self.emit(GraphEvent::WorkflowReset);
    }

    pub fn stats(&self) -> GraphStats {
        GraphStats {
            node_count: self.nodes.len(),
            connection_count: self.connections.len(),
            selected_node_count: self.selected_nodes.len(),
            selected_connection_count: self.selected_connections.len(),
        }
    }
}
