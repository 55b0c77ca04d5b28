use serde::{Deserialize, Serialize};

/// Port name a connection leaves from when none is given.
pub const DEFAULT_SOURCE_PORT: &str = "output";
/// Port name a connection arrives at when none is given.
pub const DEFAULT_TARGET_PORT: &str = "input";

fn default_source_port() -> String {
    DEFAULT_SOURCE_PORT.to_string()
}

fn default_target_port() -> String {
    DEFAULT_TARGET_PORT.to_string()
}

/// A directed edge between two nodes' ports.
///
/// The store is authoritative for these; the canvas surface's edge objects
/// and the persisted document's connection list are projections that get
/// reconciled back to the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub id: String,
    pub source_node_id: String,
    pub target_node_id: String,
    #[serde(default = "default_source_port")]
    pub source_port: String,
    #[serde(default = "default_target_port")]
    pub target_port: String,
    /// The parameter slot on the target node this edge feeds. Part of the
    /// duplicate identity.
    #[serde(default = "default_target_port")]
    pub target_param: String,
}

impl Connection {
    /// No two connections may share this triple; adding a duplicate returns
    /// the existing connection instead.
    pub fn routing_key(&self) -> (&str, &str, &str) {
        (
            &self.source_node_id,
            &self.target_node_id,
            &self.target_param,
        )
    }
}

/// Input to [`GraphStore::add_connection`](crate::graph::GraphStore::add_connection).
#[derive(Debug, Clone, Default)]
pub struct ConnectionSpec {
    pub id: Option<String>,
    pub source_node_id: String,
    pub target_node_id: String,
    pub source_port: Option<String>,
    pub target_port: Option<String>,
    pub target_param: Option<String>,
}

impl ConnectionSpec {
    pub fn new(source_node_id: impl Into<String>, target_node_id: impl Into<String>) -> Self {
        Self {
            source_node_id: source_node_id.into(),
            target_node_id: target_node_id.into(),
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_source_port(mut self, port: impl Into<String>) -> Self {
        self.source_port = Some(port.into());
        self
    }

    pub fn with_target_port(mut self, port: impl Into<String>) -> Self {
        self.target_port = Some(port.into());
        self
    }

    pub fn with_target_param(mut self, param: impl Into<String>) -> Self {
        self.target_param = Some(param.into());
        self
    }

    /// The dedup triple this spec would occupy, with defaults applied.
    pub(crate) fn routing_key(&self) -> (&str, &str, &str) {
        (
            &self.source_node_id,
            &self.target_node_id,
            self.target_param.as_deref().unwrap_or(DEFAULT_TARGET_PORT),
        )
    }

    pub(crate) fn into_connection(self, id: String) -> Connection {
        Connection {
            id,
            source_node_id: self.source_node_id,
            target_node_id: self.target_node_id,
            source_port: self
                .source_port
                .unwrap_or_else(|| DEFAULT_SOURCE_PORT.to_string()),
            target_port: self
                .target_port
                .unwrap_or_else(|| DEFAULT_TARGET_PORT.to_string()),
            target_param: self
                .target_param
                .unwrap_or_else(|| DEFAULT_TARGET_PORT.to_string()),
        }
    }
}

impl From<Connection> for ConnectionSpec {
    fn from(connection: Connection) -> Self {
        Self {
            id: Some(connection.id),
            source_node_id: connection.source_node_id,
            target_node_id: connection.target_node_id,
            source_port: Some(connection.source_port),
            target_port: Some(connection.target_port),
            target_param: Some(connection.target_param),
        }
    }
}
