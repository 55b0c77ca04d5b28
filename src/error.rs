use thiserror::Error;

/// A structural problem reported by [`GraphStore::validate`](crate::graph::GraphStore::validate).
///
/// Validation is a query, not an enforced constraint: the store will happily
/// hold an inconsistent graph and only report on demand.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    #[error("workflow contains no nodes")]
    EmptyWorkflow,

    #[error("node '{node_id}' is missing a name")]
    MissingNodeName { node_id: String },

    #[error("plugin node '{node_id}' has no plugin id configured")]
    MissingPluginId { node_id: String },

    #[error("connection '{connection_id}' references a missing source node '{node_id}'")]
    MissingSourceNode {
        connection_id: String,
        node_id: String,
    },

    #[error("connection '{connection_id}' references a missing target node '{node_id}'")]
    MissingTargetNode {
        connection_id: String,
        node_id: String,
    },

    #[error("workflow contains a circular dependency")]
    CircularDependency,
}

/// Errors that can occur when decoding a workflow document from an external
/// representation.
#[derive(Error, Debug, Clone)]
pub enum DocumentError {
    #[error("Failed to parse workflow document JSON: {0}")]
    JsonParse(String),

    #[error("Failed to serialize workflow document to JSON: {0}")]
    JsonEncode(String),
}
