//! Tokenizer for the native Solidity parser.
//!
//! Whitespace and comments are dropped; every token keeps its exact byte span
//! so parsed nodes can point back into the buffer.

use crate::edit::Span;
use crate::scanner::is_word_byte;
use solcloak_utils::errors::ParseError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Identifiers and keywords alike.
    Ident,
    Number,
    /// `"..."` or `'...'`.
    Str,
    /// `unicode"..."`.
    UnicodeStr,
    /// `hex"..."`.
    HexStr,
    Punct,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn text<'a>(&self, src: &'a str) -> &'a str {
        &src[self.span.start..self.span.end]
    }
}

// Longest first so that greedy matching picks `>>>=` over `>>`.
const PUNCTUATION: &[&str] = &[
    ">>>=", ">>>", "<<=", ">>=", "**", "==", "!=", "<=", ">=", "&&", "||", "++", "--", "+=",
    "-=", "*=", "/=", "%=", "|=", "&=", "^=", "=>", "->", "<<", ">>", ":=", "(", ")", "{", "}",
    "[", "]", ";", ",", ".", "?", ":", "=", "<", ">", "+", "-", "*", "/", "%", "&", "|", "^",
    "!", "~", "@",
];

/// Splits `src` into tokens.
pub fn tokenize(src: &str) -> Result<Vec<Token>, ParseError> {
    let bytes = src.as_bytes();
    let len = bytes.len();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < len {
        let b = bytes[i];
        let next = bytes.get(i + 1).copied();

        if b.is_ascii_whitespace() {
            i += 1;
            continue;
        }
        if b == b'/' && next == Some(b'/') {
            i = bytes[i..]
                .iter()
                .position(|&c| c == b'\n')
                .map_or(len, |p| i + p + 1);
            continue;
        }
        if b == b'/' && next == Some(b'*') {
            i = bytes[i + 2..]
                .windows(2)
                .position(|w| w == b"*/")
                .map(|p| i + 2 + p + 2)
                .ok_or_else(|| syntax(i, "unterminated block comment"))?;
            continue;
        }

        let start = i;
        let kind = if b == b'"' || b == b'\'' {
            i = string_end(bytes, i)?;
            TokenKind::Str
        } else if b.is_ascii_alphabetic() || b == b'_' || b == b'$' {
            let mut j = i + 1;
            while j < len && is_word_byte(bytes[j]) {
                j += 1;
            }
            let word = &src[i..j];
            let quoted = matches!(bytes.get(j), Some(b'"' | b'\''));
            if quoted && (word == "unicode" || word == "hex") {
                i = string_end(bytes, j)?;
                if word == "hex" {
                    TokenKind::HexStr
                } else {
                    TokenKind::UnicodeStr
                }
            } else {
                i = j;
                TokenKind::Ident
            }
        } else if b.is_ascii_digit() || (b == b'.' && next.is_some_and(|c| c.is_ascii_digit())) {
            i = number_end(bytes, i);
            TokenKind::Number
        } else if let Some(p) = PUNCTUATION
            .iter()
            .find(|p| bytes[i..].starts_with(p.as_bytes()))
        {
            i += p.len();
            TokenKind::Punct
        } else {
            return Err(syntax(i, "unexpected character"));
        };

        tokens.push(Token {
            kind,
            span: Span::new(start, i),
        });
    }
    Ok(tokens)
}

fn syntax(offset: usize, message: &str) -> ParseError {
    ParseError::Syntax {
        offset,
        message: message.to_string(),
    }
}

/// Offset just past the closing quote of the string opened at `start`.
fn string_end(bytes: &[u8], start: usize) -> Result<usize, ParseError> {
    let quote = bytes[start];
    let mut j = start + 1;
    while let Some(&c) = bytes.get(j) {
        match c {
            b'\\' => j += 2,
            b'\n' => break,
            _ if c == quote => return Ok(j + 1),
            _ => j += 1,
        }
    }
    Err(syntax(start, "unterminated string literal"))
}

fn number_end(bytes: &[u8], start: usize) -> usize {
    let len = bytes.len();
    let mut j = start;
    if bytes[j] == b'0' && matches!(bytes.get(j + 1), Some(b'x' | b'X')) {
        j += 2;
        while j < len && (bytes[j].is_ascii_hexdigit() || bytes[j] == b'_') {
            j += 1;
        }
        return j;
    }
    let digits = |mut j: usize| {
        while j < len && (bytes[j].is_ascii_digit() || bytes[j] == b'_') {
            j += 1;
        }
        j
    };
    j = digits(j);
    if bytes.get(j) == Some(&b'.') && bytes.get(j + 1).is_some_and(u8::is_ascii_digit) {
        j = digits(j + 1);
    }
    if matches!(bytes.get(j), Some(b'e' | b'E')) {
        let sign = usize::from(matches!(bytes.get(j + 1), Some(b'-' | b'+')));
        if bytes.get(j + 1 + sign).is_some_and(u8::is_ascii_digit) {
            j = digits(j + 1 + sign);
        }
    }
    j
}

/// Decodes the escapes of a quoted literal's body (quotes excluded).
pub fn unescape(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('x') => {
                let hex: String = chars.by_ref().take(2).collect();
                if let Ok(byte) = u8::from_str_radix(&hex, 16) {
                    out.push(char::from(byte));
                }
            }
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                if let Some(ch) = u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    out.push(ch);
                }
            }
            // line continuation
            Some('\n') => {}
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}

/// `uint256`, `bytes32`, `address`, `fixed128x18` and friends.
pub fn is_elementary_type(word: &str) -> bool {
    if matches!(
        word,
        "address" | "bool" | "string" | "bytes" | "byte" | "int" | "uint" | "fixed" | "ufixed" | "var"
    ) {
        return true;
    }
    let digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    let fixed = |s: &str| {
        s.split_once('x')
            .is_some_and(|(m, n)| digits(m) && digits(n))
    };
    word.strip_prefix("uint").is_some_and(digits)
        || word.strip_prefix("int").is_some_and(digits)
        || word.strip_prefix("bytes").is_some_and(digits)
        || word.strip_prefix("ufixed").is_some_and(fixed)
        || word.strip_prefix("fixed").is_some_and(fixed)
}
