//! Byte-level lexical scanner for Solidity source.
//!
//! The scanner classifies every byte as code, line comment, block comment or
//! quoted string without building tokens. It is the primitive every pass uses
//! to find structural punctuation (braces, semicolons) without consulting the
//! AST provider, and it is what keeps inserted text from landing inside a
//! comment or a string literal.
//!
//! Depth counters for `(`, `[` and `{` move only on bytes classified as code.

/// Classification of one byte of source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Class {
    /// Outside any comment or string; newlines ending a line comment count here.
    Code,
    /// From `//` up to, not including, the newline.
    LineComment,
    /// From `/*` through `*/`.
    BlockComment,
    /// Inside a string literal, including both delimiting quotes.
    Quoted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LexState {
    Normal,
    LineComment,
    BlockComment,
    Quoted { quote: u8, escaped: bool },
}

/// Delimiter nesting seen so far, relative to where the scan started.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Depth {
    /// Open `(`.
    pub paren: usize,
    /// Open `[`.
    pub bracket: usize,
    /// Open `{`.
    pub brace: usize,
}

/// A classified byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    /// Byte offset into the scanned source.
    pub offset: usize,
    pub byte: u8,
    pub class: Class,
}

impl Cell {
    /// Whether the byte is outside comments and strings.
    pub const fn is_code(&self) -> bool {
        matches!(self.class, Class::Code)
    }
}

/// Single forward pass over the bytes of a source string.
#[derive(Debug, Clone)]
pub struct Scanner<'a> {
    bytes: &'a [u8],
    pos: usize,
    state: LexState,
    depth: Depth,
    pending: Option<Cell>,
}

impl<'a> Scanner<'a> {
    /// Starts scanning at the beginning of `src`.
    pub fn new(src: &'a str) -> Self {
        Self::starting_at(src, 0)
    }

    /// Starts scanning at `offset`, which must be a position in normal code.
    pub fn starting_at(src: &'a str, offset: usize) -> Self {
        Self {
            bytes: src.as_bytes(),
            pos: offset.min(src.len()),
            state: LexState::Normal,
            depth: Depth::default(),
            pending: None,
        }
    }

    /// Delimiter depth after the most recently yielded cell.
    pub const fn depth(&self) -> Depth {
        self.depth
    }

    fn queue(&mut self, offset: usize, byte: u8, class: Class) {
        self.pending = Some(Cell {
            offset,
            byte,
            class,
        });
        self.pos = offset + 1;
    }

    fn track(&mut self, byte: u8) {
        let depth = &mut self.depth;
        match byte {
            b'(' => depth.paren += 1,
            b')' => depth.paren = depth.paren.saturating_sub(1),
            b'[' => depth.bracket += 1,
            b']' => depth.bracket = depth.bracket.saturating_sub(1),
            b'{' => depth.brace += 1,
            b'}' => depth.brace = depth.brace.saturating_sub(1),
            _ => {}
        }
    }
}

impl Iterator for Scanner<'_> {
    type Item = Cell;

    fn next(&mut self) -> Option<Cell> {
        if let Some(cell) = self.pending.take() {
            return Some(cell);
        }
        let offset = self.pos;
        let byte = *self.bytes.get(offset)?;
        let next = self.bytes.get(offset + 1).copied();
        self.pos += 1;

        let class = match self.state {
            LexState::Normal => match (byte, next) {
                (b'/', Some(b'/')) => {
                    self.state = LexState::LineComment;
                    self.queue(offset + 1, b'/', Class::LineComment);
                    Class::LineComment
                }
                (b'/', Some(b'*')) => {
                    self.state = LexState::BlockComment;
                    self.queue(offset + 1, b'*', Class::BlockComment);
                    Class::BlockComment
                }
                (b'"' | b'\'', _) => {
                    self.state = LexState::Quoted {
                        quote: byte,
                        escaped: false,
                    };
                    Class::Quoted
                }
                _ => {
                    self.track(byte);
                    Class::Code
                }
            },
            LexState::LineComment => {
                if byte == b'\n' {
                    self.state = LexState::Normal;
                    Class::Code
                } else {
                    Class::LineComment
                }
            }
            LexState::BlockComment => {
                if byte == b'*' && next == Some(b'/') {
                    self.state = LexState::Normal;
                    self.queue(offset + 1, b'/', Class::BlockComment);
                }
                Class::BlockComment
            }
            LexState::Quoted { quote, escaped } => {
                self.state = if escaped {
                    LexState::Quoted {
                        quote,
                        escaped: false,
                    }
                } else if byte == b'\\' {
                    LexState::Quoted {
                        quote,
                        escaped: true,
                    }
                } else if byte == quote {
                    LexState::Normal
                } else {
                    LexState::Quoted {
                        quote,
                        escaped: false,
                    }
                };
                Class::Quoted
            }
        };

        Some(Cell {
            offset,
            byte,
            class,
        })
    }
}

/// Classifies the byte at `offset`, scanning from the start of `src`.
pub fn classify(src: &str, offset: usize) -> Option<Class> {
    Scanner::new(src)
        .find(|cell| cell.offset == offset)
        .map(|cell| cell.class)
}

/// Whether `offset` lies inside a comment or a string literal.
pub fn in_comment_or_string(src: &str, offset: usize) -> bool {
    matches!(
        classify(src, offset),
        Some(Class::LineComment | Class::BlockComment | Class::Quoted)
    )
}

/// Advances from `from` past whitespace and comments, never beyond `limit`.
///
/// An unterminated comment swallows everything up to `limit`.
pub fn skip_trivia(src: &str, from: usize, limit: usize) -> usize {
    let bytes = src.as_bytes();
    let limit = limit.min(bytes.len());
    let mut i = from;
    while i < limit {
        let b = bytes[i];
        if b.is_ascii_whitespace() {
            i += 1;
        } else if b == b'/' && bytes.get(i + 1) == Some(&b'/') {
            match find_byte(&bytes[..limit], i + 2, b'\n') {
                Some(nl) => i = nl + 1,
                None => return limit,
            }
        } else if b == b'/' && bytes.get(i + 1) == Some(&b'*') {
            match find_pair(&bytes[..limit], i + 2, b'*', b'/') {
                Some(close) => i = close + 2,
                None => return limit,
            }
        } else {
            break;
        }
    }
    i.min(limit)
}

/// Whether the byte at `offset` continues an expression from the previous line.
///
/// Insertion before such a byte would split a multi-line statement.
pub fn is_continuation(src: &str, offset: usize) -> bool {
    matches!(
        src.as_bytes().get(offset),
        Some(
            b'=' | b'>'
                | b'<'
                | b'+'
                | b'-'
                | b'*'
                | b'/'
                | b'%'
                | b'&'
                | b'|'
                | b'^'
                | b'!'
                | b'?'
                | b':'
                | b'.'
                | b')'
                | b','
                | b']'
        )
    )
}

/// Leading whitespace of the line containing `offset`, up to `offset`.
pub fn indentation_at(src: &str, offset: usize) -> &str {
    let offset = offset.min(src.len());
    let line_start = src.as_bytes()[..offset]
        .iter()
        .rposition(|&b| b == b'\n')
        .map_or(0, |nl| nl + 1);
    let prefix = &src.as_bytes()[line_start..offset];
    let width = prefix
        .iter()
        .take_while(|&&b| b == b' ' || b == b'\t' || b == b'\r')
        .count();
    &src[line_start..line_start + width]
}

/// Identifier-like words in `[start, end)` that sit in code, with their offsets.
pub fn code_words(src: &str, start: usize, end: usize) -> Vec<(usize, &str)> {
    let end = end.min(src.len());
    let mut words = Vec::new();
    let mut current: Option<usize> = None;
    for cell in Scanner::starting_at(src, start) {
        if cell.offset >= end {
            break;
        }
        let word_byte = cell.is_code() && is_word_byte(cell.byte);
        match (current, word_byte) {
            (None, true) => current = Some(cell.offset),
            (Some(begin), false) => {
                words.push((begin, &src[begin..cell.offset]));
                current = None;
            }
            _ => {}
        }
    }
    if let Some(begin) = current {
        words.push((begin, &src[begin..end]));
    }
    words
}

/// Bytes that may appear in an identifier or keyword.
pub const fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$'
}

fn find_byte(bytes: &[u8], from: usize, needle: u8) -> Option<usize> {
    bytes
        .get(from..)?
        .iter()
        .position(|&b| b == needle)
        .map(|i| from + i)
}

fn find_pair(bytes: &[u8], from: usize, first: u8, second: u8) -> Option<usize> {
    bytes
        .get(from..)?
        .windows(2)
        .position(|w| w[0] == first && w[1] == second)
        .map(|i| from + i)
}
