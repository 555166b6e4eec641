//! Conversion from `@solidity-parser/parser` JSON into [`SyntaxNode`]s.
//!
//! The parser reports `range` as an inclusive pair of UTF-16 code unit
//! indices. Every range is mapped to a half-open byte [`Span`] before it leaves
//! this module.

use super::{ContractKind, NodeKind, SyntaxNode};
use crate::edit::Span;
use serde_json::{Map, Value};
use solcloak_utils::errors::ParseError;

/// Converts a parser JSON document describing `src` into a tree.
pub fn from_solidity_parser(document: &Value, src: &str) -> Result<SyntaxNode, ParseError> {
    if let Some(first) = document
        .get("errors")
        .and_then(Value::as_array)
        .and_then(|errors| errors.first())
    {
        let message = first
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("unknown parser error");
        return Err(ParseError::Provider(message.to_string()));
    }
    let offsets = Utf16Offsets::new(src);
    let object = document
        .as_object()
        .ok_or_else(|| ParseError::Malformed("document is not an object".into()))?;
    convert_node(object, &offsets)
}

/// Maps UTF-16 code unit indices to byte offsets.
#[derive(Debug)]
pub struct Utf16Offsets {
    // One entry per code unit plus a final entry for the end of input.
    map: Vec<usize>,
}

impl Utf16Offsets {
    pub fn new(src: &str) -> Self {
        let mut map = Vec::with_capacity(src.len() + 1);
        for (byte, ch) in src.char_indices() {
            map.extend(std::iter::repeat(byte).take(ch.len_utf16()));
        }
        map.push(src.len());
        Self { map }
    }

    /// Byte span of the code units `[first, past_last)`.
    pub fn span(&self, first: usize, past_last: usize) -> Option<Span> {
        let start = *self.map.get(first)?;
        let end = *self.map.get(past_last)?;
        (start <= end).then_some(Span::new(start, end))
    }
}

fn range_of(object: &Map<String, Value>, offsets: &Utf16Offsets) -> Result<Span, ParseError> {
    let range = object
        .get("range")
        .and_then(Value::as_array)
        .ok_or_else(|| ParseError::Malformed(format!("{} has no range", type_of(object))))?;
    let bound = |i: usize| range.get(i).and_then(Value::as_i64);
    let (Some(first), Some(last)) = (bound(0), bound(1)) else {
        return Err(ParseError::Malformed(format!(
            "{} has an invalid range",
            type_of(object)
        )));
    };
    let first = usize::try_from(first)
        .map_err(|_| ParseError::Malformed(format!("negative range start {first}")))?;
    // empty nodes report `[n, n - 1]`
    let past_last = usize::try_from(last.saturating_add(1)).unwrap_or(0).max(first);
    offsets
        .span(first, past_last)
        .ok_or_else(|| ParseError::Malformed(format!("range [{first}, {last}] outside of source")))
}

fn type_of(object: &Map<String, Value>) -> &str {
    object.get("type").and_then(Value::as_str).unwrap_or("?")
}

fn string_field(object: &Map<String, Value>, key: &str) -> Option<String> {
    object
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn flag(object: &Map<String, Value>, key: &str) -> bool {
    object.get(key).and_then(Value::as_bool).unwrap_or(false)
}

/// Nested objects carrying a `type`, directly or inside arrays.
fn typed_children(object: &Map<String, Value>) -> Vec<&Map<String, Value>> {
    let mut out = Vec::new();
    for (key, value) in object {
        if key == "range" || key == "loc" {
            continue;
        }
        match value {
            Value::Object(child) if child.contains_key("type") => out.push(child),
            Value::Array(items) => out.extend(
                items
                    .iter()
                    .filter_map(Value::as_object)
                    .filter(|child| child.contains_key("type")),
            ),
            _ => {}
        }
    }
    out
}

fn convert_node(
    object: &Map<String, Value>,
    offsets: &Utf16Offsets,
) -> Result<SyntaxNode, ParseError> {
    let span = range_of(object, offsets)?;
    let body = match object.get("body") {
        Some(Value::Object(body)) => Some(range_of(body, offsets)?),
        _ => None,
    };
    let name = || string_field(object, "name");
    let required_name = || {
        name().ok_or_else(|| ParseError::Malformed(format!("{} without a name", type_of(object))))
    };

    let kind = match type_of(object) {
        "SourceUnit" => NodeKind::SourceUnit,
        "ContractDefinition" => {
            let kind = match object.get("kind").and_then(Value::as_str) {
                Some("abstract") => ContractKind::Abstract,
                Some("interface") => ContractKind::Interface,
                Some("library") => ContractKind::Library,
                _ => ContractKind::Contract,
            };
            NodeKind::ContractDefinition {
                name: required_name()?,
                kind,
            }
        }
        "FunctionDefinition" => {
            let special = flag(object, "isConstructor")
                || flag(object, "isFallback")
                || flag(object, "isReceiveEther");
            let name = if special { None } else { name() };
            match body {
                Some(body) => NodeKind::FunctionDefinition { name, body },
                None => NodeKind::FunctionDeclaration { name },
            }
        }
        "ModifierDefinition" => {
            let name = required_name()?;
            match body {
                Some(body) => NodeKind::ModifierDefinition { name, body },
                None => NodeKind::ModifierDeclaration { name },
            }
        }
        "StructDefinition" => NodeKind::StructDefinition {
            name: required_name()?,
        },
        "EnumDefinition" => NodeKind::EnumDefinition {
            name: required_name()?,
        },
        "VariableDeclaration" => NodeKind::VariableDeclaration { name: name() },
        "Block" => NodeKind::Block,
        "ExpressionStatement" => NodeKind::ExpressionStatement,
        "ForStatement" => NodeKind::ForStatement,
        "BinaryOperation" => NodeKind::BinaryOperation {
            operator: string_field(object, "operator").unwrap_or_default(),
        },
        "MemberAccess" => NodeKind::MemberAccess {
            member: string_field(object, "memberName").unwrap_or_default(),
        },
        "Identifier" => NodeKind::Identifier {
            name: required_name()?,
        },
        "UserDefinedTypeName" => NodeKind::UserDefinedTypeName {
            name_path: string_field(object, "namePath").unwrap_or_default(),
        },
        "ModifierInvocation" => NodeKind::ModifierInvocation {
            name: required_name()?,
        },
        "StringLiteral" if flag(object, "isUnicode") => NodeKind::other("UnicodeStringLiteral"),
        "StringLiteral" => NodeKind::StringLiteral {
            value: object
                .get("value")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        },
        "NumberLiteral" => NodeKind::NumberLiteral {
            value: string_field(object, "number").unwrap_or_default(),
        },
        other => NodeKind::other(other),
    };

    let mut children = typed_children(object)
        .into_iter()
        .map(|child| convert_node(child, offsets))
        .collect::<Result<Vec<_>, _>>()?;
    children.sort_by_key(|child| (child.span.start, child.span.end));

    Ok(SyntaxNode::new(kind, span, children))
}
