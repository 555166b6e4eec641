//! Non-overlapping text edits over one buffer.
//!
//! An [`EditSet`] rejects intersecting edits as they are added, so a pass can
//! never produce text from two transformations that claim the same source.
//! Application runs from the highest start offset down, which keeps every
//! pending edit's offsets valid while earlier ones change the buffer length.

use serde::{Deserialize, Serialize};
use solcloak_utils::errors::EditError;
use std::fmt;

/// Byte offsets into a buffer. Half-open: `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    /// A span covering `[start, end)`; `end` is not checked against `start`.
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Byte length; zero for inverted spans.
    pub const fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// An insertion point, or an inverted span.
    pub const fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// Adjacent spans do not overlap; an empty span overlaps only a range that
    /// strictly surrounds it.
    pub const fn overlaps(&self, other: &Self) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Whether `other` lies entirely within this span.
    pub const fn contains(&self, other: &Self) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// The text this span covers, if it lies on character boundaries of `src`.
    pub fn slice<'a>(&self, src: &'a str) -> Option<&'a str> {
        src.get(self.start..self.end)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

/// Replace `buffer[start..end)` with `text`. Insertions have `start == end`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    pub span: Span,
    pub text: String,
}

impl Edit {
    pub fn replace(span: Span, text: impl Into<String>) -> Self {
        Self {
            span,
            text: text.into(),
        }
    }

    pub fn insert(at: usize, text: impl Into<String>) -> Self {
        Self::replace(Span::new(at, at), text)
    }
}

/// Validated collection of pairwise non-overlapping edits.
#[derive(Debug, Clone, Default)]
pub struct EditSet {
    edits: Vec<Edit>,
}

impl EditSet {
    pub const fn new() -> Self {
        Self { edits: Vec::new() }
    }

    /// Builds a set from `edits`, failing on the first overlapping pair.
    pub fn from_edits(edits: impl IntoIterator<Item = Edit>) -> Result<Self, EditError> {
        let mut set = Self::new();
        for edit in edits {
            set.push(edit)?;
        }
        Ok(set)
    }

    /// Adds an edit, rejecting it if it intersects one already in the set.
    pub fn push(&mut self, edit: Edit) -> Result<(), EditError> {
        let span = edit.span;
        if span.end < span.start {
            return Err(EditError::Inverted {
                start: span.start,
                end: span.end,
            });
        }
        if let Some(existing) = self.edits.iter().find(|e| e.span.overlaps(&span)) {
            return Err(EditError::Overlap {
                first_start: existing.span.start,
                first_end: existing.span.end,
                second_start: span.start,
                second_end: span.end,
            });
        }
        self.edits.push(edit);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.edits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Edit> {
        self.edits.iter()
    }

    /// Applies every edit to `src` and returns the new text.
    ///
    /// Bounds and character boundaries are checked for all edits before any
    /// text is produced. Edits sharing a start offset are applied so that they
    /// appear in the output in the order they were pushed.
    pub fn apply(&self, src: &str) -> Result<String, EditError> {
        for edit in &self.edits {
            let Span { start, end } = edit.span;
            if end > src.len() {
                return Err(EditError::OutOfBounds {
                    start,
                    end,
                    len: src.len(),
                });
            }
            if !src.is_char_boundary(start) {
                return Err(EditError::CharBoundary(start));
            }
            if !src.is_char_boundary(end) {
                return Err(EditError::CharBoundary(end));
            }
        }

        let mut order: Vec<(usize, &Edit)> = self.edits.iter().enumerate().collect();
        order.sort_by(|(ia, a), (ib, b)| {
            (b.span.start, b.span.end, ib).cmp(&(a.span.start, a.span.end, ia))
        });

        let mut out = src.to_string();
        for (_, edit) in order {
            out.replace_range(edit.span.start..edit.span.end, &edit.text);
        }
        Ok(out)
    }
}
