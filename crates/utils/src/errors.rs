use thiserror::Error;

/// Errors raised by the block boundary resolver.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScanError {
    /// The offset handed to the resolver does not hold an opening brace.
    #[error("no opening brace at offset {0}")]
    NotAnOpenBrace(usize),
    /// End of buffer was reached before the brace opened at this offset closed.
    #[error("block opened at offset {0} is never closed")]
    BlockUnresolved(usize),
}

/// Errors raised while validating or applying an edit set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    /// Two edits claim intersecting byte ranges.
    #[error("overlapping edits [{first_start}, {first_end}) and [{second_start}, {second_end})")]
    Overlap {
        first_start: usize,
        first_end: usize,
        second_start: usize,
        second_end: usize,
    },
    /// The edit reaches past the end of the buffer.
    #[error("edit [{start}, {end}) out of bounds for buffer of {len} bytes")]
    OutOfBounds { start: usize, end: usize, len: usize },
    /// The edit's end precedes its start.
    #[error("edit range [{start}, {end}) is inverted")]
    Inverted { start: usize, end: usize },
    /// An edit boundary falls inside a multi-byte character.
    #[error("edit boundary {0} splits a UTF-8 character")]
    CharBoundary(usize),
}

/// Error type for structural description providers.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The source is not valid for the native parser.
    #[error("syntax error at byte {offset}: {message}")]
    Syntax { offset: usize, message: String },

    #[error("could not spawn AST provider '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The external provider exited unsuccessfully.
    #[error("AST provider failed: {0}")]
    Provider(String),

    /// The provider's output did not have the expected node shape.
    #[error("malformed AST output: {0}")]
    Malformed(String),

    #[error("json decode error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Error type for transform operations.
#[derive(Debug, Error)]
pub enum TransformError {
    #[error("parse failure: {0}")]
    Parse(#[from] ParseError),
    #[error("overlapping edit violation: {0}")]
    Edit(#[from] EditError),
    /// A pass was handed a syntax tree built from a different buffer.
    #[error("syntax tree does not describe the current buffer")]
    StaleSyntax,
    #[error("invalid pass configuration: {0}")]
    InvalidConfig(String),
    #[error("generic error: {0}")]
    Generic(String),
}

impl TransformError {
    /// Whether the error breaks an internal contract and must stop the pipeline.
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::StaleSyntax)
    }
}

/// Errors that can occur during obfuscation of a file or a run.
#[derive(Debug, Error)]
pub enum ObfuscateError {
    /// File read/write error.
    #[error("file error: {0}")]
    File(#[from] std::io::Error),

    #[error("could not read '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("could not write '{path}': {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Transform application failed fatally.
    #[error("transform error: {0}")]
    Transform(#[from] TransformError),

    /// Invalid transform pass specified.
    #[error("invalid pass: {0}")]
    InvalidPass(String),

    #[error("density {0} is outside [0.0, 1.0]")]
    InvalidDensity(f64),

    #[error("unknown parser '{0}', expected 'native' or 'node'")]
    InvalidParser(String),

    /// JSON serialization error.
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("no Solidity sources found under {0}")]
    NoInputs(String),
}
