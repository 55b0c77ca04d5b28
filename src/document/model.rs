use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::error::DocumentError;
use crate::graph::{Connection, Node, Position};

/// Document format version written by [`GraphStore::serialize`](crate::graph::GraphStore::serialize).
pub const DOCUMENT_VERSION: &str = "1.0";

fn default_zoom() -> f64 {
    1.0
}

/// Persisted canvas viewport.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CanvasState {
    #[serde(default)]
    pub offset: Position,
    #[serde(default = "default_zoom")]
    pub zoom: f64,
}

impl Default for CanvasState {
    fn default() -> Self {
        Self {
            offset: Position::default(),
            zoom: 1.0,
        }
    }
}

/// The persistable form of a workflow graph.
///
/// Round-trips through `serialize`/`deserialize` without data loss for every
/// field. The crate never touches storage itself; callers move this document
/// to and from disk, IPC or wherever it lives, verbatim as JSON-compatible
/// data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowDocument {
    pub version: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub canvas: CanvasState,
    #[serde(default)]
    pub nodes: AHashMap<String, Node>,
    #[serde(default)]
    pub connections: AHashMap<String, Connection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl WorkflowDocument {
    /// Parses a document from its JSON text form.
    pub fn from_json_str(json: &str) -> Result<Self, DocumentError> {
        serde_json::from_str(json).map_err(|e| DocumentError::JsonParse(e.to_string()))
    }

    /// Renders the document as pretty-printed JSON for persistence.
    pub fn to_json_string(&self) -> Result<String, DocumentError> {
        serde_json::to_string_pretty(self).map_err(|e| DocumentError::JsonEncode(e.to_string()))
    }
}
