use crate::{bump, stats, PassConfig, PassResult, PipelineContext, Transform};
use serde::{Deserialize, Serialize};
use solcloak_core::edit::{Edit, EditSet};
use solcloak_core::syntax::NodeKind;
use solcloak_utils::errors::TransformError;
use std::fmt::Write;
use std::str::FromStr;
use tracing::debug;

/// How single-character pieces are joined back together.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StringConcat {
    /// `'a'+'b'`
    #[default]
    Plus,
    /// `string.concat('a', 'b')`
    StringConcat,
}

impl FromStr for StringConcat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "plus" | "+" => Ok(Self::Plus),
            "string-concat" | "string.concat" | "concat" => Ok(Self::StringConcat),
            other => Err(format!("unknown concatenation style '{other}'")),
        }
    }
}

/// Splits string literals into chains of one-character literals.
#[derive(Debug, Clone)]
pub struct StringLiteralEncoding {
    config: PassConfig,
    concat: StringConcat,
}

impl StringLiteralEncoding {
    pub const fn new(config: PassConfig, concat: StringConcat) -> Self {
        Self { config, concat }
    }
}

/// A single-quoted literal holding `c`.
fn char_literal(c: char) -> String {
    let mut out = String::from("'");
    match c {
        '\'' => out.push_str("\\'"),
        '\\' => out.push_str("\\\\"),
        '\n' => out.push_str("\\n"),
        '\r' => out.push_str("\\r"),
        '\t' => out.push_str("\\t"),
        c if c.is_ascii_control() => {
            let _ = write!(out, "\\x{:02x}", c as u32);
        }
        c => out.push(c),
    }
    out.push('\'');
    out
}

/// Source text that evaluates to `value`. The empty string stays `""`.
pub fn encode(value: &str, concat: StringConcat) -> String {
    if value.is_empty() {
        return "\"\"".to_string();
    }
    let pieces: Vec<String> = value.chars().map(char_literal).collect();
    match concat {
        StringConcat::Plus => pieces.join("+"),
        StringConcat::StringConcat => format!("string.concat({})", pieces.join(", ")),
    }
}

impl Transform for StringLiteralEncoding {
    fn name(&self) -> &'static str {
        "StringLiteralEncoding"
    }

    fn apply(&self, ctx: &mut PipelineContext) -> Result<PassResult, TransformError> {
        self.config.validate()?;
        let mut stats = stats(["candidates", "skipped", "encoded"]);
        let tree = ctx.syntax()?;
        let src = ctx.buffer().as_str().to_string();
        let mut edits = EditSet::new();

        for node in tree.walk() {
            let NodeKind::StringLiteral { value } = &node.kind else {
                continue;
            };
            if value.chars().count() <= 1 {
                continue;
            }
            bump(&mut stats, "candidates");
            let quoted = node
                .text(&src)
                .is_some_and(|t| t.starts_with('"') || t.starts_with('\''));
            if !quoted || !value.is_ascii() {
                debug!("leaving literal at {} as is", node.span);
                bump(&mut stats, "skipped");
                continue;
            }
            if !self.config.select(&mut ctx.rng) {
                continue;
            }
            edits.push(Edit::replace(node.span, encode(value, self.concat)))?;
            bump(&mut stats, "encoded");
        }

        ctx.ensure_fresh(&tree)?;
        PassResult::from_edits(ctx.buffer(), &edits, stats)
    }
}
