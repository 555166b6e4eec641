use crate::bitwise::{BitwiseLibrary, BitwiseOp};
use crate::{bump, stats, PassConfig, PassResult, PipelineContext, Transform};
use indexmap::IndexMap;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use solcloak_core::edit::{Edit, EditSet, Span};
use solcloak_core::scanner::code_words;
use solcloak_core::syntax::{ContractKind, NodeKind, SyntaxNode};
use solcloak_utils::errors::TransformError;
use std::collections::HashMap;
use tracing::debug;

/// Knobs of the arithmetic encoding pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArithmeticConfig {
    /// Name of the appended helper library.
    pub library_name: String,
    /// Operand width of the helpers in bits.
    pub width: u32,
}

impl Default for ArithmeticConfig {
    fn default() -> Self {
        Self {
            library_name: "Lib".to_string(),
            width: 256,
        }
    }
}

/// Rewrites `+ - * / %` into calls to a bitwise helper library.
#[derive(Debug, Clone)]
pub struct ArithmeticEncoding {
    config: PassConfig,
    library: BitwiseLibrary,
}

impl ArithmeticEncoding {
    pub fn new(config: PassConfig, arithmetic: ArithmeticConfig) -> Self {
        Self {
            config,
            library: BitwiseLibrary::new(arithmetic.library_name, arithmetic.width),
        }
    }

    fn validate(&self) -> Result<(), TransformError> {
        self.config.validate()?;
        let width = self.library.width;
        if !(8..=256).contains(&width) || width % 8 != 0 {
            return Err(TransformError::InvalidConfig(format!(
                "helper width {width} is not a multiple of 8 in 8..=256"
            )));
        }
        if self.library.name.is_empty() {
            return Err(TransformError::InvalidConfig("empty library name".into()));
        }
        Ok(())
    }
}

fn is_zero_literal(node: &SyntaxNode) -> bool {
    match &node.kind {
        NodeKind::NumberLiteral { value } => {
            let mantissa = match value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
                Some(hex) => hex,
                None => value.split(['e', 'E']).next().unwrap_or(value),
            };
            !mantissa.is_empty() && mantissa.chars().all(|c| c == '0' || c == '_' || c == '.')
        }
        NodeKind::Other { node_type } if node_type == "TupleExpression" => {
            node.children.len() == 1 && is_zero_literal(&node.children[0])
        }
        _ => false,
    }
}

/// Whether `node` is a string, or a `+` chain or parenthesis around one.
fn is_string_operand(node: &SyntaxNode) -> bool {
    match &node.kind {
        NodeKind::StringLiteral { .. } => true,
        NodeKind::Other { node_type } => match node_type.as_str() {
            "UnicodeStringLiteral" | "HexLiteral" => true,
            "TupleExpression" => node.children.len() == 1 && is_string_operand(&node.children[0]),
            _ => false,
        },
        NodeKind::BinaryOperation { operator } if operator == "+" => {
            node.children.iter().any(is_string_operand)
        }
        _ => false,
    }
}

/// Whether a `constant` state variable starts at `node`; its initializer must
/// stay a compile-time expression.
fn is_constant_variable(src: &str, node: &SyntaxNode) -> bool {
    if !matches!(node.kind, NodeKind::VariableDeclaration { .. }) {
        return false;
    }
    let header_end = node
        .children
        .iter()
        .find(|c| matches!(c.kind, NodeKind::Identifier { .. }))
        .map_or(node.span.end, |c| c.span.start);
    code_words(src, node.span.start, header_end)
        .iter()
        .any(|(_, word)| *word == "constant")
}

/// Per-operation decisions, keyed by span.
struct Selection<'a> {
    src: &'a str,
    library: &'a BitwiseLibrary,
    chosen: HashMap<Span, BitwiseOp>,
    stats: IndexMap<String, u64>,
}

impl Selection<'_> {
    /// Walks `node` in pre-order; `frozen` marks subtrees that must stay
    /// constant expressions or belong to the helper library.
    fn visit(&mut self, node: &SyntaxNode, frozen: bool, config: &PassConfig, rng: &mut StdRng) {
        let frozen = frozen
            || is_constant_variable(self.src, node)
            || match &node.kind {
                NodeKind::ContractDefinition { name, kind } => {
                    *kind == ContractKind::Library && *name == self.library.name
                }
                NodeKind::Other { node_type } => node_type == "ArrayTypeName",
                _ => false,
            };

        if let NodeKind::BinaryOperation { operator } = &node.kind {
            if let Some(op) = BitwiseOp::from_operator(operator) {
                self.consider(node, op, frozen, config, rng);
            }
        }
        for child in &node.children {
            self.visit(child, frozen, config, rng);
        }
    }

    fn consider(
        &mut self,
        node: &SyntaxNode,
        op: BitwiseOp,
        frozen: bool,
        config: &PassConfig,
        rng: &mut StdRng,
    ) {
        bump(&mut self.stats, "candidates");
        let [left, right] = node.children.as_slice() else {
            bump(&mut self.stats, "skipped");
            return;
        };
        let unsafe_divisor = op.divides() && is_zero_literal(right);
        let concatenation =
            op == BitwiseOp::Add && (is_string_operand(left) || is_string_operand(right));
        let sliced = left.text(self.src).is_some() && right.text(self.src).is_some();
        if frozen || unsafe_divisor || concatenation || !sliced {
            debug!("not encoding `{}` at {}", node.text(self.src).unwrap_or(""), node.span);
            bump(&mut self.stats, "skipped");
            return;
        }
        if config.select(rng) {
            self.chosen.insert(node.span, op);
        }
    }

    /// Text of `node` with every chosen operation inside it rewritten.
    fn render(&self, node: &SyntaxNode) -> String {
        if let Some(op) = self.chosen_op(node) {
            if let [left, right] = node.children.as_slice() {
                return format!(
                    "({}.{}({}, {}))",
                    self.library.name,
                    op.helper_name(),
                    self.render(left),
                    self.render(right)
                );
            }
        }
        if !self.touches(node) {
            return node.text(self.src).unwrap_or_default().to_string();
        }
        let mut out = String::new();
        let mut cursor = node.span.start;
        for child in &node.children {
            out.push_str(self.src.get(cursor..child.span.start).unwrap_or_default());
            out.push_str(&self.render(child));
            cursor = child.span.end;
        }
        out.push_str(self.src.get(cursor..node.span.end).unwrap_or_default());
        out
    }

    fn chosen_op(&self, node: &SyntaxNode) -> Option<BitwiseOp> {
        match node.kind {
            NodeKind::BinaryOperation { .. } => self.chosen.get(&node.span).copied(),
            _ => None,
        }
    }

    fn touches(&self, node: &SyntaxNode) -> bool {
        node.walk().any(|n| self.chosen_op(n).is_some())
    }

    /// One edit per outermost chosen operation.
    fn collect_edits(&self, node: &SyntaxNode, edits: &mut EditSet) -> Result<(), TransformError> {
        if self.chosen_op(node).is_some() {
            edits.push(Edit::replace(node.span, self.render(node)))?;
            return Ok(());
        }
        for child in &node.children {
            self.collect_edits(child, edits)?;
        }
        Ok(())
    }
}

fn declares_library(src: &str, name: &str) -> bool {
    code_words(src, 0, src.len())
        .windows(2)
        .any(|pair| pair[0].1 == "library" && pair[1].1 == name)
}

impl Transform for ArithmeticEncoding {
    fn name(&self) -> &'static str {
        "ArithmeticEncoding"
    }

    fn apply(&self, ctx: &mut PipelineContext) -> Result<PassResult, TransformError> {
        self.validate()?;
        let tree = ctx.syntax()?;
        let src = ctx.buffer().as_str().to_string();

        let mut selection = Selection {
            src: &src,
            library: &self.library,
            chosen: HashMap::new(),
            stats: stats(["candidates", "skipped", "rewritten", "library"]),
        };
        selection.visit(tree.root(), false, &self.config, &mut ctx.rng);

        let mut edits = EditSet::new();
        selection.collect_edits(tree.root(), &mut edits)?;
        let mut stats = std::mem::take(&mut selection.stats);
        stats.insert("rewritten".to_string(), selection.chosen.len() as u64);

        if !selection.chosen.is_empty() && !declares_library(&src, &self.library.name) {
            let separator = if src.ends_with('\n') { "\n" } else { "\n\n" };
            edits.push(Edit::insert(
                src.len(),
                format!("{separator}{}", self.library.render()),
            ))?;
            bump(&mut stats, "library");
        }

        ctx.ensure_fresh(&tree)?;
        PassResult::from_edits(ctx.buffer(), &edits, stats)
    }
}
