//! # Flowstate - Workflow Graph State Management
//!
//! **Flowstate** is the state-management core of a node-based workflow
//! editor: a canonical graph store with undo/redo and topological execution
//! ordering, a reconciler that keeps the store, the visual canvas and
//! persisted documents consistent, and a heuristic parser that turns plugin
//! invocation documentation into structured command schemas.
//!
//! ## Core Workflow
//!
//! The crate performs no I/O and draws nothing. It is designed to sit
//! between three collaborators the application supplies:
//!
//! 1.  **Mutate the graph** through [`GraphStore`](graph::GraphStore): add
//!     and remove nodes and connections, edit node configuration, undo and
//!     redo. Every mutation emits a typed [`GraphEvent`](event::GraphEvent).
//! 2.  **Bridge the canvas** with a
//!     [`ConnectionReconciler`](reconcile::ConnectionReconciler) wrapped
//!     around your drawing library's [`CanvasSurface`](reconcile::CanvasSurface)
//!     adapter. User-drawn edges flow back into the store; store changes
//!     flow onto the canvas; `sync` reconciles whatever diverged.
//! 3.  **Persist** by moving [`WorkflowDocument`](document::WorkflowDocument)
//!     values to and from storage — the document round-trips the full graph
//!     state without loss.
//! 4.  **Describe plugins** by feeding fetched manifests through the
//!     [`CommandCatalog`](manifest::CommandCatalog), then querying parameter
//!     schemas when configuring plugin-backed nodes.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use flowstate::prelude::*;
//!
//! let mut store = GraphStore::new();
//!
//! // Build a two-node graph.
//! let source = store.add_node(
//!     NodeSpec::new(NodeKind::Auxiliary, "Content").with_outputs(["output"]),
//!     true,
//! );
//! let sink = store.add_node(
//!     NodeSpec::new(NodeKind::Plugin, "Summarize")
//!         .with_config_value("plugin_id", "summarizer")
//!         .with_inputs(["input"]),
//!     true,
//! );
//! store.add_connection(
//!     ConnectionSpec::new(source.id.as_str(), sink.id.as_str()),
//!     false,
//!     true,
//! );
//!
//! // Check structure and compute the execution order.
//! let report = store.validate();
//! assert!(report.valid);
//! let order = store.execution_order().expect("graph is acyclic");
//! assert_eq!(order, vec![source.id.clone(), sink.id.clone()]);
//!
//! // Hand the document to whatever persists it.
//! let document = store.serialize();
//! let json = document.to_json_string().unwrap();
//! # let _ = json;
//! ```

pub mod document;
pub mod error;
pub mod event;
pub mod graph;
pub mod manifest;
pub mod prelude;
pub mod reconcile;
