use ahash::AHashMap;
use itertools::Itertools;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use tracing::{debug, error, warn};

use super::{CanvasEdge, CanvasSurface};
use crate::document::WorkflowDocument;
use crate::event::{GraphEvent, ListenerId};
use crate::graph::{Connection, ConnectionSpec, GraphStore};

/// Per-call suppression flags for the reconciler's unified entry points.
///
/// Each flag skips the propagation of a mutation to one side, which is how
/// canvas-originated and store-originated changes avoid bouncing back to
/// where they came from.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyncOptions {
    pub skip_state: bool,
    pub skip_canvas: bool,
    pub skip_validation: bool,
}

/// Keeps three divergent views of the connection set consistent: the store's
/// canonical map, the canvas surface's live edges, and whatever was last
/// loaded from a document.
///
/// Each view can be mutated independently (the user drags an edge on the
/// canvas, a document load replaces the store, undo fires), so consistency
/// is restored by an explicit, idempotent [`sync`](Self::sync) pass rather
/// than enforced invariants. The merge policy is deliberately asymmetric:
/// a fuller store set beats a stale shadow cache, and canvas edges unknown
/// to everyone are always trusted in — losing a user-drawn edge is worse
/// than tolerating a fuzzy merge.
pub struct ConnectionReconciler<C: CanvasSurface> {
    shadow: Rc<RefCell<AHashMap<String, Connection>>>,
    canvas: Rc<RefCell<C>>,
    bridging_paused: Rc<Cell<bool>>,
    edge_seq: u64,
    listener: Option<ListenerId>,
}

impl<C: CanvasSurface + 'static> ConnectionReconciler<C> {
    pub fn new(canvas: Rc<RefCell<C>>) -> Self {
        Self {
            shadow: Rc::new(RefCell::new(AHashMap::new())),
            canvas,
            bridging_paused: Rc::new(Cell::new(false)),
            edge_seq: 0,
            listener: None,
        }
    }

    // --- Event bridging ---

    /// Subscribes to the store's connection events, mirroring each into the
    /// shadow cache and the canvas. Reconciler-initiated store mutations
    /// pause the bridge so changes do not ping-pong.
    pub fn attach(&mut self, store: &mut GraphStore) {
        if self.listener.is_some() {
            warn!("reconciler is already attached to a store");
            return;
        }
        let shadow = Rc::clone(&self.shadow);
        let canvas = Rc::clone(&self.canvas);
        let paused = Rc::clone(&self.bridging_paused);
        let listener = store.on_event(move |event| {
            if paused.get() {
                return;
            }
            match event {
                GraphEvent::ConnectionAdded { connection } => {
                    let mut shadow = shadow.borrow_mut();
                    if !shadow.contains_key(&connection.id) {
                        shadow.insert(connection.id.clone(), connection.clone());
                        canvas.borrow_mut().draw(connection);
                    }
                }
                GraphEvent::ConnectionRemoved { connection_id, .. } => {
                    if shadow.borrow_mut().remove(connection_id).is_some() {
                        canvas.borrow_mut().erase(connection_id);
                    }
                }
                _ => {}
            }
        });
        self.listener = Some(listener);
    }

    /// Unsubscribes from the store attached via [`attach`](Self::attach).
    pub fn detach(&mut self, store: &mut GraphStore) {
        if let Some(listener) = self.listener.take() {
            store.remove_listener(listener);
        }
    }

    /// Handles the canvas adapter's native connect callback.
    pub fn on_canvas_connected(
        &mut self,
        store: &mut GraphStore,
        edge: CanvasEdge,
    ) -> Option<Connection> {
        let mut spec = ConnectionSpec::new(edge.source_node_id, edge.target_node_id)
            .with_source_port(edge.source_param)
            .with_target_param(edge.target_param);
        if let Some(id) = edge.id {
            spec = spec.with_id(id);
        }
        // The edge is already on the surface; only store and shadow need it.
        self.add_connection(
            store,
            spec,
            SyncOptions {
                skip_canvas: true,
                ..SyncOptions::default()
            },
        )
    }

    /// Handles the canvas adapter's native disconnect callback.
    pub fn on_canvas_detached(&mut self, store: &mut GraphStore, connection_id: &str) -> bool {
        self.remove_connection(
            store,
            connection_id,
            SyncOptions {
                skip_canvas: true,
                ..SyncOptions::default()
            },
        )
    }

    // --- Unified mutation entry points ---

    /// Adds a connection through every non-suppressed side. Id assignment is
    /// delegated to the store, which stays the only canonical-id authority.
    pub fn add_connection(
        &mut self,
        store: &mut GraphStore,
        spec: ConnectionSpec,
        options: SyncOptions,
    ) -> Option<Connection> {
        if !options.skip_validation && !validate_spec(&spec) {
            return None;
        }

        let existing = self
            .shadow
            .borrow()
            .values()
            .find(|connection| connection.routing_key() == spec.routing_key())
            .cloned();
        if let Some(existing) = existing {
            warn!(connection_id = %existing.id, "connection already exists, skipping add");
            return Some(existing);
        }

        self.bridging_paused.set(true);
        let connection = if options.skip_state {
            let id = match spec.id.clone() {
                Some(id) => id,
                None => self.next_edge_id(&spec.source_node_id, &spec.target_node_id),
            };
            spec.into_connection(id)
        } else {
            match store.add_connection(spec, true, false) {
                Some(connection) => connection,
                None => {
                    self.bridging_paused.set(false);
                    return None;
                }
            }
        };

        self.shadow
            .borrow_mut()
            .insert(connection.id.clone(), connection.clone());
        if !options.skip_canvas {
            self.canvas.borrow_mut().draw(&connection);
        }
        self.bridging_paused.set(false);

        debug!(connection_id = %connection.id, "connection added through reconciler");
        Some(connection)
    }

    /// Removes a connection from every non-suppressed side. Returns `false`
    /// for ids the reconciler does not know.
    pub fn remove_connection(
        &mut self,
        store: &mut GraphStore,
        connection_id: &str,
        options: SyncOptions,
    ) -> bool {
        if self.shadow.borrow_mut().remove(connection_id).is_none() {
            warn!(connection_id, "connection not known to reconciler");
            return false;
        }

        self.bridging_paused.set(true);
        if !options.skip_state {
            store.remove_connection(connection_id, false);
        }
        if !options.skip_canvas {
            self.canvas.borrow_mut().erase(connection_id);
        }
        self.bridging_paused.set(false);

        debug!(connection_id, "connection removed through reconciler");
        true
    }

    // --- Reconciliation ---

    /// The three-way merge. Safe to call repeatedly; must be re-run after a
    /// document load, after canvas connect/disconnect events when counts
    /// disagree, and before serialization.
    pub fn sync(&mut self, store: &mut GraphStore) {
        let state: Vec<Connection> = store.connections().values().cloned().collect();
        let canvas_edges = self.normalized_canvas_edges();
        let internal_count = self.shadow.borrow().len();

        debug!(
            internal = internal_count,
            state = state.len(),
            canvas = canvas_edges.len(),
            "reconciling connection sets"
        );

        // A strictly fuller store set means the shadow is stale; overwrite it.
        if state.len() > internal_count {
            let mut shadow = self.shadow.borrow_mut();
            shadow.clear();
            for connection in &state {
                shadow.insert(connection.id.clone(), connection.clone());
            }
        }

        self.bridging_paused.set(true);

        // The canvas may hold edges nobody else has seen yet (freshly drawn,
        // not round-tripped). Always fold those into shadow and store; the
        // store insert bypasses dedup and history on purpose.
        for connection in &canvas_edges {
            {
                let mut shadow = self.shadow.borrow_mut();
                if !shadow.contains_key(&connection.id) {
                    debug!(connection_id = %connection.id, "folding in canvas-only connection");
                    shadow.insert(connection.id.clone(), connection.clone());
                }
            }
            if store.connection(&connection.id).is_none() {
                store.insert_connection_unchecked(connection.clone());
            }
        }

        // The (possibly grown) shadow is the post-reconciliation ground truth.
        let target: Vec<Connection> = self
            .shadow
            .borrow()
            .values()
            .cloned()
            .sorted_by(|a, b| a.id.cmp(&b.id))
            .collect();

        if target.len() > state.len() {
            let existing: Vec<String> = store.connections().keys().cloned().collect();
            for connection_id in existing {
                store.remove_connection(&connection_id, false);
            }
            for connection in &target {
                store.add_connection(connection.clone().into(), true, false);
            }
        }

        // The canvas always gets the full replacement set.
        self.canvas.borrow_mut().restore_all(&target);
        self.bridging_paused.set(false);

        debug!(connections = target.len(), "connection sets reconciled");
    }

    /// Replaces the reconciler's world with a document's connection list,
    /// then reconciles. Documents are trusted: validation is skipped.
    pub fn load_from_document(&mut self, store: &mut GraphStore, document: &WorkflowDocument) {
        self.clear(store);

        self.bridging_paused.set(true);
        for connection in document.connections.values() {
            self.shadow
                .borrow_mut()
                .insert(connection.id.clone(), connection.clone());
            if store.connection(&connection.id).is_none() {
                store.insert_connection_unchecked(connection.clone());
            }
        }
        self.bridging_paused.set(false);

        self.sync(store);
        debug!(
            connections = document.connections.len(),
            "workflow connections loaded"
        );
    }

    /// Removes every connection the reconciler knows about, everywhere.
    pub fn clear(&mut self, store: &mut GraphStore) {
        let ids: Vec<String> = self.shadow.borrow().keys().cloned().collect();
        for connection_id in ids {
            self.remove_connection(store, &connection_id, SyncOptions::default());
        }
    }

    /// The connection list to embed in a saved workflow document.
    pub fn export_connections(&self) -> Vec<Connection> {
        self.shadow
            .borrow()
            .values()
            .cloned()
            .sorted_by(|a, b| a.id.cmp(&b.id))
            .collect()
    }

    pub fn connections(&self) -> Vec<Connection> {
        self.export_connections()
    }

    pub fn connection_count(&self) -> usize {
        self.shadow.borrow().len()
    }

    // --- Canvas normalization ---

    /// Reads the surface's live edges, synthesizing and binding an id for
    /// any edge that lacks one so it stays stable across enumerations.
    fn normalized_canvas_edges(&mut self) -> Vec<Connection> {
        let edges = self.canvas.borrow().all_edges();
        let mut normalized = Vec::with_capacity(edges.len());
        for edge in edges {
            if edge.source_node_id.is_empty() || edge.target_node_id.is_empty() {
                warn!("canvas edge with unresolved endpoints skipped");
                continue;
            }
            let id = match edge.id {
                Some(id) if !id.is_empty() => id,
                _ => {
                    let id = self.next_edge_id(&edge.source_node_id, &edge.target_node_id);
                    debug!(edge_id = %id, "assigned id to unlabeled canvas edge");
                    self.canvas.borrow_mut().bind_edge_id(
                        &edge.source_node_id,
                        &edge.target_node_id,
                        &id,
                    );
                    id
                }
            };
            normalized.push(Connection {
                id,
                source_node_id: edge.source_node_id,
                target_node_id: edge.target_node_id,
                source_port: edge.source_param,
                target_port: edge.target_param.clone(),
                target_param: edge.target_param,
            });
        }
        normalized
    }

    fn next_edge_id(&mut self, source_node_id: &str, target_node_id: &str) -> String {
        self.edge_seq += 1;
        format!("{}_{}_{}", source_node_id, target_node_id, self.edge_seq)
    }
}

fn validate_spec(spec: &ConnectionSpec) -> bool {
    if spec.source_node_id.is_empty() || spec.target_node_id.is_empty() {
        error!("connection is missing a source or target node id");
        return false;
    }
    if spec.source_node_id == spec.target_node_id {
        error!(node_id = %spec.source_node_id, "a node cannot connect to itself");
        return false;
    }
    true
}
