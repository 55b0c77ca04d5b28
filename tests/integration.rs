//! End-to-end flow: configure nodes from a parsed manifest, draw an edge on
//! the canvas, reconcile, persist, reload and validate.
mod common;
use common::*;
use flowstate::prelude::*;
use std::rc::Rc;

#[test]
fn full_editor_session_round_trip() {
    // Plugin discovery happened somewhere out of scope; we get manifests.
    let mut catalog = CommandCatalog::new();
    catalog.ingest(&[manifest_with_command(
        "- prompt (字符串, 必需): 图像描述",
        "<<<[TOOL_REQUEST]>>>\ncommand: 「始」generate「末」\nprompt: 「始」a fox「末」\n<<<[END_TOOL_REQUEST]>>>",
    )]);

    let canvas = RecordingCanvas::shared();
    let mut store = GraphStore::new();
    let mut reconciler = ConnectionReconciler::new(Rc::clone(&canvas));
    reconciler.attach(&mut store);

    // Build the graph the way the editor would.
    store.set_workflow_name("Fox pipeline");
    let content = store.add_node(auxiliary_node("Content"), true);
    let generate = store.add_node(plugin_node("Generate", "image-gen"), true);

    // The node-configuration form queries the catalog for the command spec
    // and writes the chosen values back into the node config.
    let spec = catalog
        .command("image-gen", "generate")
        .expect("command resolved");
    assert!(spec.needs_command);
    let default_prompt = spec.params["prompt"].default_value.clone();
    assert!(store.update_node(
        &generate.id,
        NodePatch {
            config: Some(
                [
                    ("plugin_id".to_string(), serde_json::json!("image-gen")),
                    ("command".to_string(), serde_json::json!(spec.command)),
                    ("prompt".to_string(), serde_json::json!(default_prompt)),
                ]
                .into_iter()
                .collect()
            ),
            ..NodePatch::default()
        }
    ));

    // The user draws the edge on the canvas; the bridge carries it over.
    let connection = reconciler
        .on_canvas_connected(
            &mut store,
            CanvasEdge::new(content.id.as_str(), generate.id.as_str())
                .with_target_param("prompt"),
        )
        .expect("edge bridges into the store");
    reconciler.sync(&mut store);

    let report = store.validate();
    assert!(report.valid, "unexpected errors: {:?}", report.errors);
    assert_eq!(
        store.execution_order().expect("acyclic"),
        vec![content.id.clone(), generate.id.clone()]
    );

    // Mark an execution pass.
    store.set_execution_state(true);
    store.set_node_status(&content.id, NodeStatus::Success);
    store.set_node_status(&generate.id, NodeStatus::Running);

    // Persist, then load into a fresh editor session.
    let json = store
        .serialize()
        .to_json_string()
        .expect("document serializes");
    let document = WorkflowDocument::from_json_str(&json).expect("document parses");

    let canvas2 = RecordingCanvas::shared();
    let mut restored = GraphStore::new();
    let mut reconciler2 = ConnectionReconciler::new(Rc::clone(&canvas2));
    reconciler2.attach(&mut restored);
    restored.deserialize(document.clone());
    reconciler2.load_from_document(&mut restored, &document);

    assert_eq!(restored.workflow_name(), "Fox pipeline");
    assert_eq!(restored.nodes(), store.nodes());
    assert_eq!(restored.connections(), store.connections());
    assert_eq!(canvas2.borrow().edge_ids(), vec![connection.id.clone()]);
    assert!(restored.validate().valid);

    // Undo still works on the original session: drop the drawn connection.
    // (Canvas-bridged adds skip history, so the last recorded action is the
    // Generate node.)
    assert!(store.undo());
    assert!(store.node(&generate.id).is_none());
    assert_eq!(store.connection_count(), 0);
}
