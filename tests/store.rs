//! Unit tests for the graph store: ids, dedup, cascades, undo/redo,
//! ordering and validation.
mod common;
use common::*;
use flowstate::prelude::*;
use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

#[test]
fn generated_ids_are_pairwise_distinct() {
    let mut store = GraphStore::new();
    let mut node_ids = HashSet::new();
    for index in 0..32 {
        let node = store.add_node(auxiliary_node(&format!("N{index}")), true);
        assert!(node_ids.insert(node.id.clone()), "duplicate id {}", node.id);
    }

    let mut connection_ids = HashSet::new();
    let ordered: Vec<String> = {
        let mut ids: Vec<String> = node_ids.iter().cloned().collect();
        ids.sort();
        ids
    };
    for pair in ordered.windows(2) {
        let connection = store
            .add_connection(
                ConnectionSpec::new(pair[0].as_str(), pair[1].as_str()),
                false,
                true,
            )
            .expect("endpoints exist");
        assert!(
            connection_ids.insert(connection.id.clone()),
            "duplicate id {}",
            connection.id
        );
    }
}

#[test]
fn duplicate_connection_add_is_idempotent() {
    let mut store = chain_store(2);
    assert_eq!(store.connection_count(), 1);

    let existing = store
        .add_connection(ConnectionSpec::new("node_1", "node_2"), false, true)
        .expect("duplicate add returns the existing connection");
    assert_eq!(existing.id, "connection_1");
    assert_eq!(store.connection_count(), 1);

    // A different target_param is a different connection.
    let other = store
        .add_connection(
            ConnectionSpec::new("node_1", "node_2").with_target_param("prompt"),
            false,
            true,
        )
        .expect("distinct triple");
    assert_ne!(other.id, existing.id);
    assert_eq!(store.connection_count(), 2);
}

#[test]
fn self_loop_connection_is_rejected() {
    let mut store = chain_store(1);
    let result = store.add_connection(ConnectionSpec::new("node_1", "node_1"), false, true);
    assert!(result.is_none());
    assert_eq!(store.connection_count(), 0);
}

#[test]
fn connection_with_missing_endpoint_is_rejected() {
    let mut store = chain_store(1);
    let result = store.add_connection(ConnectionSpec::new("node_1", "ghost"), false, true);
    assert!(result.is_none());
    assert_eq!(store.connection_count(), 0);
}

#[test]
fn add_connect_then_remove_node_cascades() {
    let mut store = GraphStore::new();
    store.add_node(auxiliary_node("N1"), true);
    store.add_node(auxiliary_node("N2"), true);
    store
        .add_connection(ConnectionSpec::new("node_1", "node_2"), false, true)
        .expect("valid connection");
    assert_eq!(store.connection_count(), 1);

    assert!(store.remove_node("node_1", true));
    assert_eq!(store.node_count(), 1);
    assert_eq!(store.connection_count(), 0);
}

#[test]
fn remove_node_deletes_every_incident_connection() {
    // Star: hub feeds three spokes, one spoke feeds the hub back on a
    // different param.
    let mut store = GraphStore::new();
    let hub = store.add_node(auxiliary_node("Hub"), true);
    for index in 0..3 {
        let spoke = store.add_node(auxiliary_node(&format!("S{index}")), true);
        store
            .add_connection(
                ConnectionSpec::new(hub.id.as_str(), spoke.id.as_str()),
                false,
                true,
            )
            .expect("valid connection");
    }
    store
        .add_connection(
            ConnectionSpec::new("node_2", hub.id.as_str()).with_target_param("feedback"),
            false,
            true,
        )
        .expect("valid connection");
    assert_eq!(store.connection_count(), 4);

    assert!(store.remove_node(&hub.id, true));
    assert!(
        store
            .connections()
            .values()
            .all(|c| c.source_node_id != hub.id && c.target_node_id != hub.id)
    );
    assert_eq!(store.connection_count(), 0);
}

#[test]
fn undo_redo_round_trips_add_node() {
    let mut store = GraphStore::new();
    store.add_node(auxiliary_node("N1"), true);
    let nodes = store.nodes().clone();

    assert!(store.undo());
    assert_eq!(store.node_count(), 0);
    assert!(store.redo());
    assert_eq!(store.nodes(), &nodes);
}

#[test]
fn undo_redo_round_trips_remove_node() {
    let mut store = chain_store(3);
    store.remove_node("node_2", true);
    let nodes = store.nodes().clone();
    let connections = store.connections().clone();

    assert!(store.undo());
    // Node and both cascade-deleted connections come back with their ids.
    assert_eq!(store.node_count(), 3);
    assert_eq!(store.connection_count(), 2);
    assert!(store.node("node_2").is_some());
    assert!(store.connection("connection_1").is_some());
    assert!(store.connection("connection_2").is_some());

    assert!(store.redo());
    assert_eq!(store.nodes(), &nodes);
    assert_eq!(store.connections(), &connections);
}

#[test]
fn undo_redo_round_trips_add_connection() {
    let mut store = chain_store(2);
    let nodes = store.nodes().clone();
    let connections = store.connections().clone();

    assert!(store.undo());
    assert_eq!(store.connection_count(), 0);
    assert!(store.redo());
    assert_eq!(store.nodes(), &nodes);
    assert_eq!(store.connections(), &connections);
}

#[test]
fn undo_redo_round_trips_remove_connection() {
    let mut store = chain_store(2);
    store.remove_connection("connection_1", true);
    let connections = store.connections().clone();
    assert!(connections.is_empty());

    assert!(store.undo());
    assert_eq!(store.connection_count(), 1);
    assert_eq!(store.connection("connection_1").unwrap().id, "connection_1");

    assert!(store.redo());
    assert_eq!(store.connections(), &connections);
}

#[test]
fn new_action_clears_redo_stack() {
    let mut store = GraphStore::new();
    store.add_node(auxiliary_node("N1"), true);
    store.undo();
    assert!(store.can_redo());

    store.add_node(auxiliary_node("N2"), true);
    assert!(!store.can_redo());
    assert_eq!(store.history_depths(), (1, 0));
}

#[test]
fn undo_on_empty_stack_is_a_no_op() {
    let mut store = GraphStore::new();
    assert!(!store.undo());
    assert!(!store.redo());
}

#[test]
fn cycle_yields_no_execution_order() {
    let mut store = GraphStore::new();
    for name in ["A", "B", "C"] {
        store.add_node(auxiliary_node(name), true);
    }
    store
        .add_connection(ConnectionSpec::new("node_1", "node_2"), false, true)
        .unwrap();
    store
        .add_connection(ConnectionSpec::new("node_2", "node_3"), false, true)
        .unwrap();
    store
        .add_connection(ConnectionSpec::new("node_3", "node_1"), false, true)
        .unwrap();

    assert!(store.execution_order().is_none());
    assert!(store.has_cycle());

    let report = store.validate();
    assert!(!report.valid);
    assert!(report.errors.contains(&ValidationIssue::CircularDependency));
}

#[test]
fn execution_order_respects_every_connection() {
    let mut store = GraphStore::new();
    for name in ["A", "B", "C", "D"] {
        store.add_node(auxiliary_node(name), true);
    }
    // Diamond: 1 -> 2, 1 -> 3, 2 -> 4, 3 -> 4.
    for (source, target) in [
        ("node_1", "node_2"),
        ("node_1", "node_3"),
        ("node_2", "node_4"),
        ("node_3", "node_4"),
    ] {
        store
            .add_connection(ConnectionSpec::new(source, target), false, true)
            .unwrap();
    }

    let order = store.execution_order().expect("acyclic");
    assert_eq!(order.len(), 4);
    let index_of = |id: &str| order.iter().position(|x| x == id).unwrap();
    assert!(index_of("node_1") < index_of("node_2"));
    assert!(index_of("node_1") < index_of("node_3"));
    assert!(index_of("node_2") < index_of("node_4"));
    assert!(index_of("node_3") < index_of("node_4"));
}

#[test]
fn validation_reports_structural_problems() {
    let mut store = GraphStore::new();
    let report = store.validate();
    assert!(!report.valid);
    assert_eq!(report.errors, vec![ValidationIssue::EmptyWorkflow]);

    store.add_node(NodeSpec::new(NodeKind::Auxiliary, "  "), true);
    store.add_node(NodeSpec::new(NodeKind::Plugin, "Summarize"), true);
    let report = store.validate();
    assert!(!report.valid);
    assert!(report.errors.contains(&ValidationIssue::MissingNodeName {
        node_id: "node_1".to_string()
    }));
    assert!(report.errors.contains(&ValidationIssue::MissingPluginId {
        node_id: "node_2".to_string()
    }));
    assert!(report.warnings.is_empty());
}

#[test]
fn update_node_shallow_merges() {
    let mut store = GraphStore::new();
    store.add_node(plugin_node("Summarize", "summarizer"), true);

    assert!(store.update_node(
        "node_1",
        NodePatch {
            name: Some("Condense".to_string()),
            status: Some(NodeStatus::Running),
            ..NodePatch::default()
        }
    ));

    let node = store.node("node_1").unwrap();
    assert_eq!(node.name, "Condense");
    assert_eq!(node.status, NodeStatus::Running);
    // Untouched fields survive the merge.
    assert_eq!(node.plugin_id(), Some("summarizer"));
    assert_eq!(node.inputs, vec!["input".to_string()]);

    assert!(!store.update_node("ghost", NodePatch::default()));
}

#[test]
fn node_status_updates_are_unvalidated_transitions() {
    let mut store = chain_store(1);
    assert_eq!(store.node("node_1").unwrap().status, NodeStatus::Idle);

    // Any transition is accepted, including terminal-to-terminal.
    assert!(store.set_node_status("node_1", NodeStatus::Success));
    assert!(store.set_node_status("node_1", NodeStatus::Error));
    assert!(store.set_node_status("node_1", NodeStatus::Idle));
    assert!(!store.set_node_status("ghost", NodeStatus::Running));
}

#[test]
fn selection_tracks_nodes_and_clears_on_removal() {
    let mut store = chain_store(3);
    store.select_node("node_1", false);
    store.select_node("node_2", true);
    assert_eq!(
        store.selected_nodes(),
        vec!["node_1".to_string(), "node_2".to_string()]
    );

    // Single-select replaces the set.
    store.select_node("node_3", false);
    assert_eq!(store.selected_nodes(), vec!["node_3".to_string()]);

    store.remove_node("node_3", true);
    assert!(store.selected_nodes().is_empty());

    store.select_node("node_1", false);
    store.clear_selection();
    assert!(store.selected_nodes().is_empty());
}

#[test]
fn canvas_zoom_is_clamped() {
    let mut store = GraphStore::new();
    store.set_canvas_zoom(0.01);
    assert_eq!(store.canvas_zoom(), 0.1);
    store.set_canvas_zoom(12.0);
    assert_eq!(store.canvas_zoom(), 3.0);
    store.set_canvas_zoom(1.5);
    assert_eq!(store.canvas_zoom(), 1.5);
}

#[test]
fn explicit_ids_do_not_consume_the_sequence() {
    let mut store = GraphStore::new();
    store.add_node(auxiliary_node("Custom").with_id("ingest"), true);
    let generated = store.add_node(auxiliary_node("Auto"), true);
    assert_eq!(generated.id, "node_1");
}

#[test]
fn events_fire_for_mutations_and_skip_render_suppresses_add() {
    let mut store = GraphStore::new();
    let seen: Rc<RefCell<Vec<String>>> = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    store.on_event(move |event| {
        let tag = match event {
            GraphEvent::NodeAdded { .. } => "node_added",
            GraphEvent::NodeRemoved { .. } => "node_removed",
            GraphEvent::ConnectionAdded { .. } => "connection_added",
            GraphEvent::ConnectionRemoved { .. } => "connection_removed",
            GraphEvent::HistoryChanged { .. } => "history_changed",
            _ => return,
        };
        sink.borrow_mut().push(tag.to_string());
    });

    store.add_node(auxiliary_node("N1"), true);
    store.add_node(auxiliary_node("N2"), true);
    store
        .add_connection(ConnectionSpec::new("node_1", "node_2"), true, false)
        .unwrap();
    assert!(
        !seen.borrow().iter().any(|tag| tag == "connection_added"),
        "skip_render must suppress the add event"
    );

    store.remove_connection("connection_1", false);
    store.remove_node("node_1", false);
    let seen = seen.borrow();
    assert!(seen.contains(&"node_added".to_string()));
    assert!(seen.contains(&"connection_removed".to_string()));
    assert!(seen.contains(&"node_removed".to_string()));
    assert!(seen.contains(&"history_changed".to_string()));
}

#[test]
fn reset_returns_the_store_to_initial_state() {
    let mut store = chain_store(3);
    store.select_node("node_1", false);
    store.set_workflow_name("Pipeline");
    store.set_canvas_zoom(2.0);

    store.reset();
    assert_eq!(store.node_count(), 0);
    assert_eq!(store.connection_count(), 0);
    assert_eq!(store.workflow_name(), "Untitled workflow");
    assert_eq!(store.canvas_zoom(), 1.0);
    assert_eq!(store.history_depths(), (0, 0));

    // Counters restart as well.
    let node = store.add_node(auxiliary_node("Fresh"), true);
    assert_eq!(node.id, "node_1");
}

#[test]
fn stats_reflect_current_counts() {
    let mut store = chain_store(3);
    store.select_node("node_1", false);
    let stats = store.stats();
    assert_eq!(stats.node_count, 3);
    assert_eq!(stats.connection_count, 2);
    assert_eq!(stats.selected_node_count, 1);
    assert_eq!(stats.selected_connection_count, 0);
}

#[test]
fn validation_issue_display_names_the_offender() {
    let issue = ValidationIssue::MissingTargetNode {
        connection_id: "connection_9".to_string(),
        node_id: "node_4".to_string(),
    };
    assert!(issue.to_string().contains("connection_9"));
    assert!(issue.to_string().contains("node_4"));
}
