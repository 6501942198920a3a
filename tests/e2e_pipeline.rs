//! End-to-end pipeline test: Parse → Validate → Lower → IR Validate → Codegen.

use flow_el_compiler::codegen;
use flow_el_compiler::config::{Layout, ValidationMode};
use flow_el_compiler::ir::{Expr, validate_ir};
use flow_el_compiler::lower;
use flow_el_compiler::parse;
use flow_el_compiler::validate;

#[test]
fn end_to_end_order_flow_pipeline() {
    let json = include_str!("fixtures/order_flow.json");
    let (snapshot, graph) = parse::parse_and_build(json).unwrap();

    let result = validate::validate_graph(&snapshot, &graph, ValidationMode::CollectAll);
    assert!(result.is_valid(), "{:?}", result);

    let expr = lower::lower(&graph).unwrap();
    assert!(validate_ir(&expr).is_empty());

    let Expr::Then { items } = &expr else {
        panic!("Expected THEN root, got {:?}", expr);
    };
    let kinds: Vec<&str> = items
        .iter()
        .map(|e| match e {
            Expr::Field(_) => "field",
            Expr::Then { .. } => "then",
            Expr::If { .. } => "if",
            Expr::Switch { .. } => "switch",
            Expr::For { .. } => "for",
            Expr::When { .. } => "when",
        })
        .collect();
    assert_eq!(kinds, vec!["field", "if", "switch", "when", "then"]);

    let compact = codegen::render(&expr, Layout::Compact);
    assert!(compact.starts_with("THEN(loadOrder.data('"));
    assert!(compact.ends_with("archive))"));
    assert_eq!(compact, expr.to_string());
}

#[test]
fn expression_tree_serializes_with_kind_tags() {
    let json = r#"{
        "nodes": [
            {"id": "s", "type": "start"},
            {"id": "f", "type": "when", "data": {"nodeId": "fan"}},
            {"id": "a", "type": "common", "data": {"nodeId": "A"}},
            {"id": "b", "type": "common", "data": {"nodeId": "B"}}
        ],
        "edges": [
            {"source": "s", "target": "f"},
            {"source": "f", "target": "a", "sourceHandle": "parallel"},
            {"source": "f", "target": "b", "sourceHandle": "parallel"}
        ]
    }"#;
    let (_, graph) = parse::parse_and_build(json).unwrap();
    let expr = lower::lower(&graph).unwrap();

    let value = serde_json::to_value(&expr).unwrap();
    assert_eq!(value["kind"], "then");
    assert_eq!(value["items"][0]["kind"], "when");
    assert_eq!(value["items"][0]["branches"][1]["business_id"], "B");
}

#[test]
fn tree_invariants_catch_hand_built_mistakes() {
    let bad = Expr::then(vec![
        Expr::When {
            branches: vec![Expr::field("only")],
        },
        Expr::then(vec![]),
    ]);
    let codes: Vec<_> = validate_ir(&bad).iter().map(|e| e.code).collect();
    assert_eq!(codes, vec!["E002", "E001"]);
}

#[test]
fn diagnostics_display_with_location() {
    let (snapshot, graph) = parse::parse_and_build(
        r#"{
            "nodes": [
                {"id": "s", "type": "start"},
                {"id": "c", "type": "if", "data": {"nodeId": "check"}},
                {"id": "x", "type": "common", "data": {"nodeId": "X"}}
            ],
            "edges": [
                {"id": "e1", "source": "s", "target": "c"},
                {"id": "e2", "source": "c", "target": "x", "sourceHandle": "true"}
            ]
        }"#,
    )
    .unwrap();
    let result = validate::validate_graph(&snapshot, &graph, ValidationMode::CollectAll);
    let rendered: Vec<String> = result.diagnostics().iter().map(|e| e.to_string()).collect();
    assert_eq!(
        rendered,
        vec!["[Validate:V003] Boolean node 'c' is missing its 'false' branch (node 'c')".to_string()]
    );
}
