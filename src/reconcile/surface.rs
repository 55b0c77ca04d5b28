use crate::graph::{Connection, DEFAULT_SOURCE_PORT, DEFAULT_TARGET_PORT};

/// A visual edge as reported by the drawing surface.
///
/// `id` is whatever the adapter stored in the edge's metadata slot; `None`
/// for edges the user just drew that have not been reconciled yet. Resolving
/// the endpoint elements back to node ids is the adapter's obligation —
/// edges it cannot resolve should be reported with empty ids and will be
/// skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanvasEdge {
    pub id: Option<String>,
    pub source_node_id: String,
    pub target_node_id: String,
    pub source_param: String,
    pub target_param: String,
}

impl CanvasEdge {
    pub fn new(source_node_id: impl Into<String>, target_node_id: impl Into<String>) -> Self {
        Self {
            id: None,
            source_node_id: source_node_id.into(),
            target_node_id: target_node_id.into(),
            source_param: DEFAULT_SOURCE_PORT.to_string(),
            target_param: DEFAULT_TARGET_PORT.to_string(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_target_param(mut self, param: impl Into<String>) -> Self {
        self.target_param = param.into();
        self
    }
}

/// Boundary contract for the drawing library that renders edges.
///
/// The reconciler treats implementations as a projection of the store's
/// connection set — with the one exception of freshly user-drawn edges,
/// which [`sync`](crate::reconcile::ConnectionReconciler::sync) folds back
/// in. Adapters wrap whatever concrete canvas library the application uses;
/// nothing in this crate draws.
pub trait CanvasSurface {
    /// Every edge currently on the surface.
    fn all_edges(&self) -> Vec<CanvasEdge>;

    /// Stores `edge_id` in the metadata slot of the matching edge so later
    /// enumerations return it as [`CanvasEdge::id`].
    fn bind_edge_id(&mut self, source_node_id: &str, target_node_id: &str, edge_id: &str);

    /// Renders a single connection.
    fn draw(&mut self, connection: &Connection);

    /// Removes a single rendered connection by id.
    fn erase(&mut self, connection_id: &str);

    /// Replace-all primitive: drop every edge and render exactly this set.
    fn restore_all(&mut self, connections: &[Connection]);
}
