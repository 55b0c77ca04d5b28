//! Prelude module for convenient imports
//!
//! Re-exports the most commonly used types so applications can pull in the
//! core surface with a single `use flowstate::prelude::*;`.

// Graph store and data model
pub use crate::graph::{
    Connection, ConnectionSpec, GraphStats, GraphStore, Node, NodeKind, NodePatch, NodeSpec,
    NodeStatus, Position, UndoAction, ValidationReport,
};

// Events
pub use crate::event::{EventBus, GraphEvent, ListenerId};

// Persisted documents
pub use crate::document::{CanvasState, DOCUMENT_VERSION, WorkflowDocument};

// Canvas reconciliation
pub use crate::reconcile::{CanvasEdge, CanvasSurface, ConnectionReconciler, SyncOptions};

// Plugin command specs
pub use crate::manifest::{
    Capabilities, CommandCatalog, CommandSpec, CommandSpecParser, InvocationCommand, ParamSchema,
    ParamType, PluginManifest,
};

// Error types
pub use crate::error::{DocumentError, ValidationIssue};
