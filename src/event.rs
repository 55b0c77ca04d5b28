use crate::graph::{Connection, Node, NodeStatus, Position};

/// Every observable state change in a [`GraphStore`](crate::graph::GraphStore).
///
/// This is a closed set of variants rather than a string-keyed bus so that
/// listener payloads are checked at compile time.
#[derive(Debug, Clone)]
pub enum GraphEvent {
    NodeAdded {
        node: Node,
    },
    NodeRemoved {
        node_id: String,
        node: Node,
    },
    NodeUpdated {
        node_id: String,
        node: Node,
    },
    NodeStatusChanged {
        node_id: String,
        status: NodeStatus,
    },
    ConnectionAdded {
        connection: Connection,
    },
    ConnectionRemoved {
        connection_id: String,
        connection: Connection,
    },
    SelectionChanged {
        selected_nodes: Vec<String>,
        selected_connections: Vec<String>,
    },
    HistoryChanged {
        undo_depth: usize,
        redo_depth: usize,
    },
    WorkflowRenamed {
        name: String,
    },
    CanvasViewChanged {
        offset: Position,
        zoom: f64,
    },
    ExecutionStateChanged {
        executing: bool,
    },
    WorkflowLoaded {
        name: String,
    },
    WorkflowReset,
}

/// Handle returned by [`EventBus::subscribe`], used to unsubscribe.
pub type ListenerId = u64;

type Listener = Box<dyn FnMut(&GraphEvent)>;

/// A synchronous subscriber registry.
///
/// The core is single-threaded and event-driven: listeners run inline on the
/// mutating call, in subscription order. Listeners must not hold a reference
/// back into the store that emitted the event.
#[derive(Default)]
pub struct EventBus {
    listeners: Vec<(ListenerId, Listener)>,
    next_id: ListenerId,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a listener and returns its handle.
    pub fn subscribe<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(&GraphEvent) + 'static,
    {
        let id = self.next_id;
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Removes a listener. Returns `false` if the handle is unknown.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener_id, _)| *listener_id != id);
        self.listeners.len() != before
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub(crate) fn emit(&mut self, event: &GraphEvent) {
        for (_, listener) in &mut self.listeners {
            listener(event);
        }
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
