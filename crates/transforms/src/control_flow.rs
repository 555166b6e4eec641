use crate::dead_code::INDENT;
use crate::templates;
use crate::{bump, stats, PassConfig, PassResult, PipelineContext, Transform};
use solcloak_core::edit::{Edit, EditSet, Span};
use solcloak_core::scanner::indentation_at;
use solcloak_core::syntax::{NodeKind, SyntaxNode};
use solcloak_utils::errors::TransformError;
use std::collections::HashSet;
use tracing::debug;

/// Wraps expression statements in an opaque `if`/`else` whose `else` arm never runs.
#[derive(Debug, Clone)]
pub struct ControlFlowWrapping {
    config: PassConfig,
}

impl ControlFlowWrapping {
    pub const fn new(config: PassConfig) -> Self {
        Self { config }
    }
}

/// Spans of `for (init; cond; step)` header parts, which are not standalone statements.
fn loop_headers(body: &SyntaxNode) -> HashSet<Span> {
    body.descendants_of(|k| matches!(k, NodeKind::ForStatement))
        .into_iter()
        .flat_map(|f| {
            let header = f.children.len().saturating_sub(1);
            f.children[..header].iter().map(|c| c.span)
        })
        .collect()
}

fn wrap(statement: &str, condition: &str, dead: &str, indent: &str) -> String {
    format!(
        "if ({condition}) {{\n{indent}{INDENT}{statement}\n{indent}}} else {{\n{indent}{INDENT}{dead}\n{indent}}}"
    )
}

impl Transform for ControlFlowWrapping {
    fn name(&self) -> &'static str {
        "ControlFlowWrapping"
    }

    fn apply(&self, ctx: &mut PipelineContext) -> Result<PassResult, TransformError> {
        self.config.validate()?;
        let mut stats = stats(["candidates", "skipped", "wrapped"]);
        let tree = ctx.syntax()?;
        let src = ctx.buffer().as_str().to_string();
        let mut edits = EditSet::new();

        let functions = tree.descendants_of(|k| matches!(k, NodeKind::FunctionDefinition { .. }));
        for function in functions {
            let headers = loop_headers(function);
            for statement in
                function.descendants_of(|k| matches!(k, NodeKind::ExpressionStatement))
            {
                if headers.contains(&statement.span) {
                    continue;
                }
                bump(&mut stats, "candidates");
                let Some(text) = statement.text(&src).filter(|t| t.ends_with(';')) else {
                    bump(&mut stats, "skipped");
                    continue;
                };
                if !self.config.select(&mut ctx.rng) {
                    continue;
                }
                let condition = templates::opaque_true(&mut ctx.rng);
                let dead = templates::dead_code(&mut ctx.rng);
                let indent = indentation_at(&src, statement.span.start);
                debug!("wrapping `{}` under `{}`", text, condition);
                edits.push(Edit::replace(
                    statement.span,
                    wrap(text, &condition, &dead, indent),
                ))?;
                bump(&mut stats, "wrapped");
            }
        }

        ctx.ensure_fresh(&tree)?;
        PassResult::from_edits(ctx.buffer(), &edits, stats)
    }
}
