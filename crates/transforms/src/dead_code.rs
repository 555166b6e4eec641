use crate::templates;
use crate::{bump, stats, PassConfig, PassResult, PipelineContext, Transform};
use rand::seq::IndexedRandom;
use solcloak_core::edit::{Edit, EditSet};
use solcloak_core::slots::{collect_slots, Slot};
use solcloak_core::source::line_of;
use solcloak_core::syntax::NodeKind;
use solcloak_utils::errors::TransformError;
use tracing::debug;

pub(crate) const INDENT: &str = "    ";

/// Inserts inert statements at statement boundaries of function and modifier bodies.
#[derive(Debug, Clone)]
pub struct DeadCodeInjection {
    config: PassConfig,
}

impl DeadCodeInjection {
    pub const fn new(config: PassConfig) -> Self {
        Self { config }
    }
}

/// Text to insert at `slot` so that `statement` lands on its own line.
///
/// `open` is the offset of the enclosing block's `{`.
fn format_insertion(src: &str, open: usize, slot: &Slot, statement: &str) -> String {
    let line_start = src[..slot.offset].rfind('\n').map_or(0, |nl| nl + 1);
    let at_line_start = src[line_start..slot.offset].trim().is_empty();
    let before_close = src.as_bytes().get(slot.offset) == Some(&b'}');
    let on_open_line = line_of(src, slot.offset) == line_of(src, open);

    if at_line_start {
        // `slot.indent` is already in the buffer; only the statement and the
        // indentation for the displaced text are added.
        let extra = if before_close { INDENT } else { "" };
        return format!("{extra}{statement}\n{}", slot.indent);
    }

    let extra = if on_open_line { INDENT } else { "" };
    let rest_of_line = src[slot.offset..].split('\n').next().unwrap_or("");
    let trailing = if rest_of_line.trim().is_empty() {
        String::new()
    } else {
        format!("\n{}", slot.indent)
    };
    format!("\n{}{extra}{statement}{trailing}", slot.indent)
}

impl Transform for DeadCodeInjection {
    fn name(&self) -> &'static str {
        "DeadCodeInjection"
    }

    fn apply(&self, ctx: &mut PipelineContext) -> Result<PassResult, TransformError> {
        self.config.validate()?;
        let mut stats = stats(["bodies", "unresolved", "inserted"]);
        let tree = ctx.syntax()?;
        let src = ctx.buffer().as_str().to_string();
        let mut edits = EditSet::new();

        let bodies = tree.descendants_of(|k| {
            matches!(
                k,
                NodeKind::FunctionDefinition { .. } | NodeKind::ModifierDefinition { .. }
            )
        });
        for def in bodies {
            let Some(body) = def.body() else {
                continue;
            };
            bump(&mut stats, "bodies");
            let slots = collect_slots(&src, body.start);
            if slots.is_empty() {
                debug!("no slots in body at {}", body);
                bump(&mut stats, "unresolved");
                continue;
            }
            if !self.config.select(&mut ctx.rng) {
                continue;
            }
            let Some(slot) = slots.choose(&mut ctx.rng) else {
                continue;
            };
            let statement = templates::dead_code(&mut ctx.rng);
            let text = format_insertion(&src, body.start, slot, &statement);
            debug!(
                "dead code at line {} of {}: {}",
                slot.line,
                def.declared_name().unwrap_or("<anonymous>"),
                statement
            );
            edits.push(Edit::insert(slot.offset, text))?;
            bump(&mut stats, "inserted");
        }

        ctx.ensure_fresh(&tree)?;
        PassResult::from_edits(ctx.buffer(), &edits, stats)
    }
}
