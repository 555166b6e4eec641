use crate::fixtures::TOKEN;
use serde_json::json;
use solcloak_core::source::SourceBuffer;
use solcloak_core::syntax::json::from_solidity_parser;
use solcloak_core::syntax::{ContractKind, NativeParser, NodeKind, SyntaxProvider, SyntaxTree};

fn parse(src: &str) -> SyntaxTree {
    NativeParser.parse(&SourceBuffer::new(src)).unwrap()
}

#[test]
fn test_native_parser_describes_token() {
    let tree = parse(TOKEN);
    let contract = tree
        .descendants_of(|k| matches!(k, NodeKind::ContractDefinition { .. }))
        .into_iter()
        .next()
        .unwrap();
    assert_eq!(contract.declared_name(), Some("Token"));
    assert!(matches!(
        contract.kind,
        NodeKind::ContractDefinition {
            kind: ContractKind::Contract,
            ..
        }
    ));

    let functions: Vec<_> = tree
        .descendants_of(|k| matches!(k, NodeKind::FunctionDefinition { .. }))
        .into_iter()
        .filter_map(|f| f.declared_name())
        .collect();
    assert_eq!(functions, ["mint", "transfer", "share"]);

    let modifier = tree
        .descendants_of(|k| matches!(k, NodeKind::ModifierDefinition { .. }))
        .into_iter()
        .next()
        .unwrap();
    let body = modifier.body().unwrap();
    assert_eq!(&TOKEN[body.start..body.start + 1], "{");
    assert_eq!(&TOKEN[body.end - 1..body.end], "}");
}

#[test]
fn test_spans_are_exact_byte_ranges() {
    let tree = parse(TOKEN);
    for node in tree.walk() {
        let text = node.text(TOKEN).unwrap();
        match &node.kind {
            NodeKind::Identifier { name } => assert_eq!(text, name),
            NodeKind::StringLiteral { value } => assert_eq!(text, format!("\"{value}\"")),
            NodeKind::BinaryOperation { operator } => assert!(text.contains(operator.as_str())),
            _ => {}
        }
        for child in &node.children {
            assert!(node.span.contains(&child.span), "{} escapes its parent", child.span);
        }
    }
}

#[test]
fn test_tree_is_bound_to_its_buffer() {
    let buffer = SourceBuffer::new("contract A {}");
    let tree = NativeParser.parse(&buffer).unwrap();
    assert!(tree.is_valid_for(&buffer));
    assert!(tree.is_valid_for(&SourceBuffer::new("contract A {}")));
    assert!(!tree.is_valid_for(&SourceBuffer::new("contract A { }")));
}

#[test]
fn test_bodiless_functions_are_declarations() {
    let tree = parse("interface I {\n    function f() external;\n}\nabstract contract B {\n    function g() public virtual;\n    modifier m() virtual;\n}");
    assert!(tree
        .descendants_of(|k| matches!(k, NodeKind::FunctionDefinition { .. }))
        .is_empty());
    assert_eq!(
        tree.descendants_of(|k| matches!(k, NodeKind::FunctionDeclaration { .. }))
            .len(),
        2
    );
    assert_eq!(
        tree.descendants_of(|k| matches!(k, NodeKind::ModifierDeclaration { .. }))
            .len(),
        1
    );
}

#[test]
fn test_syntax_errors_are_reported() {
    assert!(NativeParser
        .parse(&SourceBuffer::new("contract A { function f( }"))
        .is_err());
}

#[test]
fn test_external_parser_json_with_non_ascii_source() {
    // ranges count UTF-16 code units; the comment holds a 3-byte character
    let src = "// ✓\ncontract C { function f() public { g(); } }";
    let at = |needle: &str| src[..src.find(needle).unwrap()].encode_utf16().count();
    let last = src.encode_utf16().count() - 1;
    let f = at("function");
    let body = at("{ g");
    let g = at("g()");
    let document = json!({
        "type": "SourceUnit",
        "range": [0, last],
        "children": [{
            "type": "ContractDefinition",
            "name": "C",
            "kind": "contract",
            "range": [at("contract"), last],
            "subNodes": [{
                "type": "FunctionDefinition",
                "name": "f",
                "range": [f, last - 2],
                "body": {
                    "type": "Block",
                    "range": [body, last - 2],
                    "statements": [{
                        "type": "ExpressionStatement",
                        "range": [g, g + 3],
                        "expression": {
                            "type": "FunctionCall",
                            "range": [g, g + 2],
                            "expression": { "type": "Identifier", "name": "g", "range": [g, g] },
                            "arguments": []
                        }
                    }]
                }
            }]
        }]
    });

    let root = from_solidity_parser(&document, src).unwrap();
    let function = root.children[0].children[0].clone();
    let span = function.body().unwrap();
    assert_eq!(&src[span.start..span.end], "{ g(); }");
    let identifier = function
        .walk()
        .find(|n| matches!(n.kind, NodeKind::Identifier { .. }))
        .unwrap();
    assert_eq!(identifier.text(src), Some("g"));
}
