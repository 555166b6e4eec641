//! Text-level primitives for rewriting Solidity sources.
//!
//! Everything here works on byte offsets into a [`source::SourceBuffer`]:
//! the lexical [`scanner`], the brace-matching [`block`] resolver, statement
//! [`slots`], span-based [`edit`]s and the [`syntax`] trees the passes query.

pub mod block;
pub mod edit;
pub mod scanner;
pub mod slots;
pub mod source;
pub mod syntax;

pub use edit::{Edit, EditSet, Span};
pub use source::SourceBuffer;
pub use syntax::{NodeKind, SyntaxNode, SyntaxProvider, SyntaxTree};
