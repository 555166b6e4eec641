//! Structural description of a Solidity source buffer.
//!
//! A [`SyntaxTree`] is only meaningful against the exact buffer it was parsed
//! from; it carries that buffer's fingerprint and [`SyntaxTree::is_valid_for`]
//! is the check every consumer runs before trusting a span.
//!
//! Two providers produce trees: the in-process [`NativeParser`] and the
//! [`NodeBridge`], which shells out to `@solidity-parser/parser`.

pub mod bridge;
pub mod json;
pub mod lexer;
pub mod parser;

pub use bridge::NodeBridge;
pub use parser::NativeParser;

use crate::edit::Span;
use crate::source::SourceBuffer;
use serde::Serialize;
use solcloak_utils::errors::ParseError;
use std::fmt;

/// Flavour of a contract-like definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractKind {
    Contract,
    Abstract,
    Interface,
    Library,
}

impl ContractKind {
    /// Keyword that immediately precedes the contract's name.
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Contract | Self::Abstract => "contract",
            Self::Interface => "interface",
            Self::Library => "library",
        }
    }
}

/// Node kinds the passes care about. Everything else is [`NodeKind::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum NodeKind {
    SourceUnit,
    ContractDefinition {
        name: String,
        kind: ContractKind,
    },
    /// A function with a body. Constructors, fallback and receive have no name.
    FunctionDefinition {
        name: Option<String>,
        body: Span,
    },
    /// A function without a body (interface member or abstract declaration).
    FunctionDeclaration {
        name: Option<String>,
    },
    ModifierDefinition {
        name: String,
        body: Span,
    },
    ModifierDeclaration {
        name: String,
    },
    StructDefinition {
        name: String,
    },
    EnumDefinition {
        name: String,
    },
    VariableDeclaration {
        name: Option<String>,
    },
    Block,
    ExpressionStatement,
    ForStatement,
    BinaryOperation {
        operator: String,
    },
    MemberAccess {
        member: String,
    },
    Identifier {
        name: String,
    },
    UserDefinedTypeName {
        name_path: String,
    },
    ModifierInvocation {
        name: String,
    },
    StringLiteral {
        value: String,
    },
    NumberLiteral {
        value: String,
    },
    Other {
        node_type: String,
    },
}

impl NodeKind {
    pub fn other(node_type: impl Into<String>) -> Self {
        Self::Other {
            node_type: node_type.into(),
        }
    }

    /// Short label used in logs and tree dumps.
    pub fn label(&self) -> &str {
        match self {
            Self::SourceUnit => "SourceUnit",
            Self::ContractDefinition { .. } => "ContractDefinition",
            Self::FunctionDefinition { .. } => "FunctionDefinition",
            Self::FunctionDeclaration { .. } => "FunctionDeclaration",
            Self::ModifierDefinition { .. } => "ModifierDefinition",
            Self::ModifierDeclaration { .. } => "ModifierDeclaration",
            Self::StructDefinition { .. } => "StructDefinition",
            Self::EnumDefinition { .. } => "EnumDefinition",
            Self::VariableDeclaration { .. } => "VariableDeclaration",
            Self::Block => "Block",
            Self::ExpressionStatement => "ExpressionStatement",
            Self::ForStatement => "ForStatement",
            Self::BinaryOperation { .. } => "BinaryOperation",
            Self::MemberAccess { .. } => "MemberAccess",
            Self::Identifier { .. } => "Identifier",
            Self::UserDefinedTypeName { .. } => "UserDefinedTypeName",
            Self::ModifierInvocation { .. } => "ModifierInvocation",
            Self::StringLiteral { .. } => "StringLiteral",
            Self::NumberLiteral { .. } => "NumberLiteral",
            Self::Other { node_type } => node_type,
        }
    }
}

/// A node with its byte span and children in source order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyntaxNode {
    #[serde(flatten)]
    pub kind: NodeKind,
    pub span: Span,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<SyntaxNode>,
}

impl SyntaxNode {
    pub const fn new(kind: NodeKind, span: Span, children: Vec<Self>) -> Self {
        Self {
            kind,
            span,
            children,
        }
    }

    pub const fn leaf(kind: NodeKind, span: Span) -> Self {
        Self::new(kind, span, Vec::new())
    }

    /// Name introduced by a definition or declaration node.
    pub fn declared_name(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::ContractDefinition { name, .. }
            | NodeKind::ModifierDefinition { name, .. }
            | NodeKind::ModifierDeclaration { name }
            | NodeKind::StructDefinition { name }
            | NodeKind::EnumDefinition { name } => Some(name),
            NodeKind::FunctionDefinition { name, .. }
            | NodeKind::FunctionDeclaration { name }
            | NodeKind::VariableDeclaration { name } => name.as_deref(),
            _ => None,
        }
    }

    /// Span of the body block of a function or modifier definition.
    pub const fn body(&self) -> Option<Span> {
        match &self.kind {
            NodeKind::FunctionDefinition { body, .. } | NodeKind::ModifierDefinition { body, .. } => {
                Some(*body)
            }
            _ => None,
        }
    }

    /// Pre-order traversal starting at this node.
    pub fn walk(&self) -> Preorder<'_> {
        Preorder { stack: vec![self] }
    }

    /// All nodes in this subtree (including this one) matching `pred`.
    pub fn descendants_of(&self, pred: impl Fn(&NodeKind) -> bool) -> Vec<&Self> {
        self.walk().filter(|node| pred(&node.kind)).collect()
    }

    /// The source text this node covers.
    pub fn text<'a>(&self, src: &'a str) -> Option<&'a str> {
        self.span.slice(src)
    }
}

/// Iterator returned by [`SyntaxNode::walk`].
#[derive(Debug)]
pub struct Preorder<'a> {
    stack: Vec<&'a SyntaxNode>,
}

impl<'a> Iterator for Preorder<'a> {
    type Item = &'a SyntaxNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

/// A parsed tree bound to the buffer generation it describes.
#[derive(Clone)]
pub struct SyntaxTree {
    root: SyntaxNode,
    fingerprint: [u8; 32],
}

impl SyntaxTree {
    pub fn new(root: SyntaxNode, buffer: &SourceBuffer) -> Self {
        Self {
            root,
            fingerprint: *buffer.fingerprint(),
        }
    }

    pub const fn root(&self) -> &SyntaxNode {
        &self.root
    }

    /// Whether this tree was parsed from exactly `buffer`.
    pub fn is_valid_for(&self, buffer: &SourceBuffer) -> bool {
        &self.fingerprint == buffer.fingerprint()
    }

    pub fn walk(&self) -> Preorder<'_> {
        self.root.walk()
    }

    pub fn descendants_of(&self, pred: impl Fn(&NodeKind) -> bool) -> Vec<&SyntaxNode> {
        self.root.descendants_of(pred)
    }
}

impl fmt::Debug for SyntaxTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyntaxTree")
            .field("nodes", &self.walk().count())
            .field("fingerprint", &hex::encode(self.fingerprint))
            .finish()
    }
}

/// Turns a source buffer into a [`SyntaxTree`].
pub trait SyntaxProvider: Send + Sync + fmt::Debug {
    /// Returns the provider's name for logging.
    fn name(&self) -> &'static str;
    /// Parses `buffer`; the returned tree is bound to it.
    fn parse(&self, buffer: &SourceBuffer) -> Result<SyntaxTree, ParseError>;
}
