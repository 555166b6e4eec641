use sha3::{Digest, Keccak256};
use std::fmt;
use std::sync::Arc;

/// Immutable snapshot of one file's text at a point in the pipeline.
///
/// Cloning is cheap: the text is shared. Each snapshot carries the Keccak-256
/// fingerprint of its bytes so structural descriptions can be tied to the
/// exact generation of the buffer they were derived from.
#[derive(Clone, PartialEq, Eq)]
pub struct SourceBuffer {
    text: Arc<str>,
    fingerprint: [u8; 32],
}

impl SourceBuffer {
    pub fn new(text: impl Into<String>) -> Self {
        let text: String = text.into();
        let fingerprint = fingerprint_of(&text);
        Self {
            text: Arc::from(text),
            fingerprint,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub const fn fingerprint(&self) -> &[u8; 32] {
        &self.fingerprint
    }

    pub fn fingerprint_hex(&self) -> String {
        hex::encode(self.fingerprint)
    }

    /// 1-based line number of `offset`.
    pub fn line_of(&self, offset: usize) -> usize {
        line_of(&self.text, offset)
    }
}

impl fmt::Debug for SourceBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceBuffer")
            .field("len", &self.text.len())
            .field("fingerprint", &self.fingerprint_hex())
            .finish()
    }
}

impl AsRef<str> for SourceBuffer {
    fn as_ref(&self) -> &str {
        &self.text
    }
}

impl From<&str> for SourceBuffer {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for SourceBuffer {
    fn from(text: String) -> Self {
        Self::new(text)
    }
}

/// Keccak-256 of the buffer's bytes.
pub fn fingerprint_of(text: &str) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(text.as_bytes());
    hasher.finalize().into()
}

/// 1-based line number of `offset` within `text`. Offsets past the end clamp.
pub fn line_of(text: &str, offset: usize) -> usize {
    let end = offset.min(text.len());
    text.as_bytes()[..end].iter().filter(|&&b| b == b'\n').count() + 1
}
