/// Module for computing source metrics used to evaluate Solidity obfuscation passes.
///
/// Implements a small set of text-level measurements: overall size, how the bytes split between
/// code, comments and string literals, and the open/close counts of each delimiter family seen in
/// code. The pipeline engine collects metrics before and after every pass to report growth and to
/// reject a pass whose output no longer balances its delimiters the way the input did.
///
/// # Usage
/// ```rust,ignore
/// let before = metrics::collect_metrics("contract C { function f() public {} }");
/// let after = metrics::collect_metrics(&obfuscated);
/// assert!(metrics::balance_preserved(&before, &after));
/// println!("growth: {:+.2}%", metrics::compare(&before, &after) * 100.0);
/// ```
use serde::{Deserialize, Serialize};
use solcloak_core::scanner::{Class, Scanner};

/// Open and close counts for one delimiter family, counted in code only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelimiterCount {
    pub open: usize,
    pub close: usize,
}

impl DelimiterCount {
    /// Opens minus closes. Zero for a well-formed source.
    pub fn net(&self) -> i64 {
        i64::try_from(self.open).unwrap_or(i64::MAX) - i64::try_from(self.close).unwrap_or(i64::MAX)
    }
}

/// Represents a set of text metrics for one Solidity source buffer.
///
/// Byte classes come from the lexical scanner, so a brace inside a string or a comment is never
/// counted as structure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metrics {
    /// Size of the buffer in bytes.
    pub byte_len: usize,
    /// Number of lines, counting a trailing partial line.
    pub line_count: usize,
    /// Bytes classified as code, whitespace included.
    pub code_bytes: usize,
    /// Bytes inside line or block comments, delimiters included.
    pub comment_bytes: usize,
    /// Bytes inside quoted strings, quotes included.
    pub string_bytes: usize,
    pub braces: DelimiterCount,
    pub parens: DelimiterCount,
    pub brackets: DelimiterCount,
}

/// Collects metrics from a source string.
///
/// Walks the buffer once with the lexical scanner, attributing every byte to its class and counting
/// each delimiter seen in code.
///
/// # Arguments
/// * `src` - The Solidity source text.
///
/// # Returns
/// A `Metrics` struct describing `src`.
pub fn collect_metrics(src: &str) -> Metrics {
    let mut metrics = Metrics {
        byte_len: src.len(),
        line_count: src.lines().count(),
        ..Metrics::default()
    };

    for cell in Scanner::new(src) {
        match cell.class {
            Class::Code => {
                metrics.code_bytes += 1;
                match cell.byte {
                    b'{' => metrics.braces.open += 1,
                    b'}' => metrics.braces.close += 1,
                    b'(' => metrics.parens.open += 1,
                    b')' => metrics.parens.close += 1,
                    b'[' => metrics.brackets.open += 1,
                    b']' => metrics.brackets.close += 1,
                    _ => {}
                }
            }
            Class::LineComment | Class::BlockComment => metrics.comment_bytes += 1,
            Class::Quoted => metrics.string_bytes += 1,
        }
    }
    metrics
}

/// Checks whether every delimiter family kept its net balance across a transform.
///
/// Inserted or wrapped text must be self-balanced, so the difference between opens and closes of
/// each family is expected to be identical before and after. A mismatch means the transform split
/// existing structure or emitted an unbalanced template.
///
/// # Arguments
/// * `before` - Metrics of the pass input.
/// * `after` - Metrics of the pass output.
///
/// # Returns
/// `true` if braces, parentheses and brackets all kept their net count.
pub fn balance_preserved(before: &Metrics, after: &Metrics) -> bool {
    before.braces.net() == after.braces.net()
        && before.parens.net() == after.parens.net()
        && before.brackets.net() == after.brackets.net()
}

/// Compares two sets of metrics to report the size effect of a transform.
///
/// # Arguments
/// * `before` - Metrics before the transform.
/// * `after` - Metrics after the transform.
///
/// # Returns
/// Relative size growth, so `0.25` means the output is a quarter larger. An empty input reports
/// `0.0`.
pub fn compare(before: &Metrics, after: &Metrics) -> f64 {
    if before.byte_len == 0 {
        return 0.0;
    }
    (after.byte_len as f64 - before.byte_len as f64) / before.byte_len as f64
}

/// Share of the buffer that is comments or strings, in `[0.0, 1.0]`.
pub fn opaque_ratio(metrics: &Metrics) -> f64 {
    if metrics.byte_len == 0 {
        return 0.0;
    }
    (metrics.comment_bytes + metrics.string_bytes) as f64 / metrics.byte_len as f64
}
