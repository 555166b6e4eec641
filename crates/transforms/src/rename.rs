//! Identifier renaming.
//!
//! Phase one walks the tree in pre-order, records every name the file
//! declares and asks the registry for an alias, so aliases are drawn from the
//! generator in a fixed order. Each distinct name is selected once, with the
//! pass density; a declined name keeps its spelling everywhere. Phase two
//! pushes one edit per occurrence: definition names (found by a keyword
//! search inside the definition's own header), plain identifiers,
//! user-defined type paths, modifier invocations and member-access chains.
//! A chain is consumed whole from its outermost node, so none of its
//! segments is claimed twice; any other double claim is an overlap error.
//!
//! Names that appear inside inline assembly and the members of interfaces are
//! preserved: the first are invisible to the tree, the second are bound to
//! external selectors.

use crate::registry::RenameConfig;
use crate::{bump, stats, PassConfig, PassResult, PipelineContext, Transform};
use solcloak_core::edit::{Edit, EditSet, Span};
use solcloak_core::scanner::code_words;
use solcloak_core::syntax::{ContractKind, NodeKind, SyntaxNode};
use solcloak_utils::errors::TransformError;
use std::collections::HashSet;
use tracing::debug;

/// Globals whose members are never user-declared.
const CONTEXT_ROOTS: &[&str] = &["msg", "block", "tx", "abi"];

/// Renames declared identifiers to per-file random aliases.
#[derive(Debug, Clone, Default)]
pub struct IdentifierRenaming {
    config: PassConfig,
    rename: RenameConfig,
}

impl IdentifierRenaming {
    pub const fn new(config: PassConfig, rename: RenameConfig) -> Self {
        Self { config, rename }
    }
}

/// Keyword that precedes the declared name of `node`, when it has one.
fn definition_keyword(node: &SyntaxNode) -> Option<&'static str> {
    match &node.kind {
        NodeKind::ContractDefinition { kind, .. } => Some(kind.keyword()),
        NodeKind::FunctionDefinition { name: Some(_), .. }
        | NodeKind::FunctionDeclaration { name: Some(_) } => Some("function"),
        NodeKind::ModifierDefinition { .. } | NodeKind::ModifierDeclaration { .. } => {
            Some("modifier")
        }
        NodeKind::StructDefinition { .. } => Some("struct"),
        NodeKind::EnumDefinition { .. } => Some("enum"),
        _ => None,
    }
}

/// Span of the name following `keyword` in the header of `node`.
///
/// The search stops at the first child, which always starts after the name.
fn definition_name_span(src: &str, node: &SyntaxNode, keyword: &str, name: &str) -> Option<Span> {
    let limit = node.children.first().map_or(node.span.end, |c| c.span.start);
    let words = code_words(src, node.span.start, limit);
    words
        .windows(2)
        .find(|pair| pair[0].1 == keyword && pair[1].1 == name)
        .map(|pair| Span::new(pair[1].0, pair[1].0 + name.len()))
}

/// Span of a variable's name when the provider gave no identifier child for it.
fn variable_name_span(src: &str, node: &SyntaxNode, name: &str) -> Option<Span> {
    let after_type = node.children.first().map_or(node.span.start, |c| c.span.end);
    code_words(src, after_type, node.span.end)
        .into_iter()
        .find(|(_, word)| *word == name)
        .map(|(offset, _)| Span::new(offset, offset + name.len()))
}

fn has_identifier_child(node: &SyntaxNode, name: &str) -> bool {
    node.children
        .iter()
        .any(|c| matches!(&c.kind, NodeKind::Identifier { name: n } if n == name))
}

/// Names declared by the file, split by where they may be referenced.
#[derive(Debug, Default)]
struct Declared {
    /// Every renamed name.
    all: HashSet<String>,
    /// Names that may appear after a `.`: contracts, functions, modifiers,
    /// types, state variables and struct fields.
    members: HashSet<String>,
}

impl Transform for IdentifierRenaming {
    fn name(&self) -> &'static str {
        "IdentifierRenaming"
    }

    fn apply(&self, ctx: &mut PipelineContext) -> Result<PassResult, TransformError> {
        self.config.validate()?;
        let mut stats = stats(["definitions", "occurrences", "reserved", "declined", "skipped"]);
        let tree = ctx.syntax()?;
        let src = ctx.buffer().as_str().to_string();
        ctx.registry.configure(&self.rename);

        // Protect what the tree cannot see or must not change.
        for node in tree.walk() {
            match &node.kind {
                NodeKind::Other { node_type } if node_type == "InlineAssemblyStatement" => {
                    for (_, word) in code_words(&src, node.span.start, node.span.end) {
                        ctx.registry.preserve(word);
                    }
                }
                NodeKind::ContractDefinition {
                    kind: ContractKind::Interface,
                    ..
                } => {
                    for member in &node.children {
                        if let NodeKind::FunctionDeclaration { name: Some(name) } = &member.kind {
                            ctx.registry.preserve(name.clone());
                        }
                    }
                }
                _ => {}
            }
        }

        // Phase one: declared names, aliases issued in pre-order.
        let mut declared = Declared::default();
        let mut declined: HashSet<&str> = HashSet::new();
        let mut stack: Vec<(&SyntaxNode, Option<&SyntaxNode>)> = vec![(tree.root(), None)];
        while let Some((node, parent)) = stack.pop() {
            stack.extend(node.children.iter().rev().map(|c| (c, Some(node))));
            let Some(name) = node.declared_name() else {
                continue;
            };
            let member = match &node.kind {
                NodeKind::VariableDeclaration { .. } => parent.is_some_and(|p| {
                    matches!(
                        p.kind,
                        NodeKind::ContractDefinition { .. } | NodeKind::StructDefinition { .. }
                    )
                }),
                _ => true,
            };
            if ctx.registry.is_protected(name) {
                bump(&mut stats, "reserved");
                continue;
            }
            if declined.contains(name) {
                continue;
            }
            if ctx.registry.get(name).is_none() && !self.config.select(&mut ctx.rng) {
                debug!("keeping `{}`", name);
                declined.insert(name);
                bump(&mut stats, "declined");
                continue;
            }
            ctx.registry.lookup_or_create(name, &mut ctx.rng);
            declared.all.insert(name.to_string());
            if member {
                declared.members.insert(name.to_string());
            }
        }

        // Phase two: one edit per occurrence.
        let mut edits = EditSet::new();
        // member-access nodes and chain roots already handled with their chain
        let mut consumed: HashSet<Span> = HashSet::new();
        let alias_for = |name: &str| -> Option<String> {
            if declared.all.contains(name) {
                ctx.registry.get(name).map(str::to_string)
            } else {
                None
            }
        };

        for node in tree.walk() {
            match &node.kind {
                NodeKind::Identifier { name } => {
                    if consumed.contains(&node.span) {
                        continue;
                    }
                    if let Some(alias) = alias_for(name) {
                        edits.push(Edit::replace(node.span, alias))?;
                    }
                }
                NodeKind::UserDefinedTypeName { .. } => {
                    for (offset, word) in code_words(&src, node.span.start, node.span.end) {
                        if let Some(alias) = alias_for(word) {
                            edits.push(Edit::replace(Span::new(offset, offset + word.len()), alias))?;
                        }
                    }
                }
                NodeKind::ModifierInvocation { name } => {
                    let segments = name.split('.').count();
                    for (offset, word) in code_words(&src, node.span.start, node.span.end)
                        .into_iter()
                        .take(segments)
                    {
                        if let Some(alias) = alias_for(word) {
                            edits.push(Edit::replace(Span::new(offset, offset + word.len()), alias))?;
                        }
                    }
                }
                NodeKind::MemberAccess { .. } => {
                    if consumed.contains(&node.span) {
                        continue;
                    }
                    let mut chain = Vec::new();
                    let mut root = node;
                    while let NodeKind::MemberAccess { member } = &root.kind {
                        consumed.insert(root.span);
                        chain.push((root.span, member));
                        match root.children.first() {
                            Some(inner) => root = inner,
                            None => break,
                        }
                    }
                    // Innermost leaf first, then every `.member` suffix outward.
                    if let NodeKind::Identifier { name } = &root.kind {
                        consumed.insert(root.span);
                        if CONTEXT_ROOTS.contains(&name.as_str()) {
                            continue;
                        }
                        if let Some(alias) = alias_for(name) {
                            edits.push(Edit::replace(root.span, alias))?;
                        }
                    }
                    for (span, member) in chain.into_iter().rev() {
                        if !declared.members.contains(member.as_str()) {
                            continue;
                        }
                        let Some(alias) = alias_for(member) else {
                            continue;
                        };
                        let Some(start) = span.end.checked_sub(member.len()) else {
                            continue;
                        };
                        let suffix = Span::new(start, span.end);
                        if suffix.slice(&src) == Some(member.as_str()) {
                            edits.push(Edit::replace(suffix, alias))?;
                        }
                    }
                }
                NodeKind::VariableDeclaration { name: Some(name) } => {
                    if has_identifier_child(node, name) {
                        continue;
                    }
                    let Some(alias) = alias_for(name) else {
                        continue;
                    };
                    match variable_name_span(&src, node, name) {
                        Some(span) => {
                            edits.push(Edit::replace(span, alias))?;
                            bump(&mut stats, "definitions");
                        }
                        None => bump(&mut stats, "skipped"),
                    }
                }
                _ => {
                    let (Some(keyword), Some(name)) = (definition_keyword(node), node.declared_name())
                    else {
                        continue;
                    };
                    let Some(alias) = alias_for(name) else {
                        continue;
                    };
                    match definition_name_span(&src, node, keyword, name) {
                        Some(span) => {
                            edits.push(Edit::replace(span, alias))?;
                            bump(&mut stats, "definitions");
                        }
                        None => {
                            debug!("could not locate the name of {} `{}`", node.kind.label(), name);
                            bump(&mut stats, "skipped");
                        }
                    }
                }
            }
        }

        for node in tree.walk() {
            if let NodeKind::VariableDeclaration { name: Some(name) } = &node.kind {
                if declared.all.contains(name) && has_identifier_child(node, name) {
                    bump(&mut stats, "definitions");
                }
            }
        }
        let occurrences = edits.len() as u64;
        let definitions = stats.get("definitions").copied().unwrap_or(0);
        stats.insert(
            "occurrences".to_string(),
            occurrences.saturating_sub(definitions),
        );

        ctx.ensure_fresh(&tree)?;
        PassResult::from_edits(ctx.buffer(), &edits, stats)
    }
}
