use super::{Connection, Node};

/// A reversible mutation recorded on the undo stack.
///
/// Each variant carries a full snapshot sufficient to reverse and re-apply
/// the action. Node and connection snapshots are the FINAL objects
/// (post-id-assignment) so that undo followed by redo reproduces the exact
/// same ids.
#[derive(Debug, Clone)]
pub enum UndoAction {
    AddNode {
        node: Node,
    },
    /// Removal cascades; the incident connections are part of the payload so
    /// undo restores node and edges atomically.
    RemoveNode {
        node: Node,
        connections: Vec<Connection>,
    },
    AddConnection {
        connection: Connection,
        skip_render: bool,
    },
    RemoveConnection {
        connection: Connection,
    },
}
