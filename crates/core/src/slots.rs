//! Statement-boundary insertion points inside a brace-delimited block.
//!
//! A slot is an offset where a complete new statement can be inserted without
//! splitting an existing one. Three kinds are produced for a block:
//!
//! 1. the first code position after the opening brace;
//! 2. the code position following every top-level `;`;
//! 3. the position just before the closing brace, whitespace trimmed.
//!
//! Kinds 1 and 2 are dropped when the position looks like the continuation of
//! a multi-line expression. Kind 2 is also dropped when the `;` ends the body
//! of an `if` followed by `else`, or the body of a `do` followed by its
//! `while`: a statement there would detach the tail from its head.

use crate::block::find_block_end;
use crate::scanner::{
    indentation_at, is_continuation, is_word_byte, skip_trivia, Depth, Scanner,
};
use crate::source::line_of;
use serde::Serialize;

/// A candidate insertion point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Slot {
    pub offset: usize,
    /// Leading whitespace of the slot's line.
    pub indent: String,
    /// 1-based.
    pub line: usize,
}

impl Slot {
    fn at(src: &str, offset: usize) -> Self {
        Self {
            offset,
            indent: indentation_at(src, offset).to_string(),
            line: line_of(src, offset),
        }
    }
}

/// Collects the slots of the block whose `{` is at `open`, sorted by offset.
///
/// Returns an empty list when the block cannot be resolved.
pub fn collect_slots(src: &str, open: usize) -> Vec<Slot> {
    let Ok(end) = find_block_end(src, open) else {
        return Vec::new();
    };
    let mut offsets = Vec::new();

    let first = skip_trivia(src, open + 1, end);
    if first <= end && !is_continuation(src, first) {
        offsets.push(first);
    }

    let bytes = src.as_bytes();
    // `do` statements whose trailing `while` has not been seen yet
    let mut open_do = 0usize;
    let mut last_code: Option<u8> = None;
    let mut scanner = Scanner::starting_at(src, open + 1);
    while let Some(cell) = scanner.next() {
        if cell.offset >= end {
            break;
        }
        if !cell.is_code() || cell.byte.is_ascii_whitespace() {
            continue;
        }
        let top_level = scanner.depth() == Depth::default();
        let starts_word = is_word_byte(cell.byte)
            && (cell.offset == 0 || !is_word_byte(bytes[cell.offset - 1]));
        if top_level && starts_word {
            match word_at(src, cell.offset) {
                "do" => open_do += 1,
                "while" if open_do > 0 && matches!(last_code, Some(b';' | b'}')) => open_do -= 1,
                _ => {}
            }
        }
        if top_level && cell.byte == b';' {
            let next = skip_trivia(src, cell.offset + 1, end);
            let word = word_at(src, next);
            let splits_statement = word == "else" || (word == "while" && open_do > 0);
            if next <= end && !is_continuation(src, next) && !splits_statement {
                offsets.push(next);
            }
        }
        last_code = Some(cell.byte);
    }

    let mut before_close = end;
    while before_close > open + 1 && bytes[before_close - 1].is_ascii_whitespace() {
        before_close -= 1;
    }
    offsets.push(before_close);

    offsets.sort_unstable();
    offsets.dedup();
    offsets.into_iter().map(|offset| Slot::at(src, offset)).collect()
}

/// The identifier-like word starting at `offset`, empty when there is none.
fn word_at(src: &str, offset: usize) -> &str {
    let len = src
        .as_bytes()
        .get(offset..)
        .map_or(0, |rest| rest.iter().take_while(|&&b| is_word_byte(b)).count());
    src.get(offset..offset + len).unwrap_or_default()
}
