use async_trait::async_trait;
use clap::Args;
use solcloak_core::slots::{collect_slots, Slot};
use solcloak_core::source::SourceBuffer;
use solcloak_core::syntax::{NodeKind, SyntaxTree};
use std::error::Error;
use std::fmt::Write;
use std::path::PathBuf;

/// Arguments for the `slots` subcommand.
#[derive(Args)]
pub struct SlotsArgs {
    /// Solidity file to inspect.
    pub file: PathBuf,
    #[command(flatten)]
    pub parser: super::ParserArgs,
}

/// One body's slots, as listed by the subcommand.
fn body_slots(buffer: &SourceBuffer, tree: &SyntaxTree) -> Vec<(String, usize, Vec<Slot>)> {
    tree.descendants_of(|k| {
        matches!(
            k,
            NodeKind::FunctionDefinition { .. } | NodeKind::ModifierDefinition { .. }
        )
    })
    .into_iter()
    .filter_map(|def| {
        let body = def.body()?;
        let label = match (&def.kind, def.declared_name()) {
            (NodeKind::ModifierDefinition { .. }, Some(name)) => format!("modifier {name}"),
            (_, Some(name)) => format!("function {name}"),
            (_, None) => "function <unnamed>".to_string(),
        };
        let line = buffer.line_of(def.span.start);
        Some((label, line, collect_slots(buffer.as_str(), body.start)))
    })
    .collect()
}

fn render(buffer: &SourceBuffer, tree: &SyntaxTree) -> String {
    let mut out = String::new();
    for (label, line, slots) in body_slots(buffer, tree) {
        let _ = writeln!(out, "{label} (line {line}): {} slots", slots.len());
        for slot in slots {
            let _ = writeln!(
                out,
                "  offset {:>6}  line {:>4}  indent {}",
                slot.offset,
                slot.line,
                slot.indent.len()
            );
        }
    }
    out
}

#[async_trait]
impl super::Command for SlotsArgs {
    async fn execute(self) -> Result<(), Box<dyn Error>> {
        let (buffer, tree) = super::load(&self.file, &self.parser)?;
        print!("{}", render(&buffer, &tree));
        Ok(())
    }
}
