//! In-process recursive-descent parser for Solidity.
//!
//! The parser builds just enough structure for the obfuscation passes: every
//! node carries an exact byte span, the kinds the passes inspect get their own
//! [`NodeKind`] variant, and everything else becomes [`NodeKind::Other`] with
//! its children preserved. Inline assembly is kept as an opaque node.
//!
//! Variable declarations and named-argument keys produce [`NodeKind::Identifier`]
//! children so that renaming reaches every site of a declared name.

use super::lexer::{is_elementary_type, tokenize, unescape, Token, TokenKind};
use super::{ContractKind, NodeKind, SyntaxNode, SyntaxProvider, SyntaxTree};
use crate::edit::Span;
use crate::source::SourceBuffer;
use solcloak_utils::errors::ParseError;
use tracing::debug;

/// The default, dependency-free AST provider.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeParser;

impl SyntaxProvider for NativeParser {
    fn name(&self) -> &'static str {
        "native"
    }

    fn parse(&self, buffer: &SourceBuffer) -> Result<SyntaxTree, ParseError> {
        let root = parse_source(buffer.as_str())?;
        debug!(
            "native parser: {} top-level items over {} bytes",
            root.children.len(),
            buffer.len()
        );
        Ok(SyntaxTree::new(root, buffer))
    }
}

/// Parses a whole source unit.
pub fn parse_source(src: &str) -> Result<SyntaxNode, ParseError> {
    let tokens = tokenize(src)?;
    Parser {
        src,
        tokens,
        pos: 0,
    }
    .source_unit()
}

type PResult<T> = Result<T, ParseError>;

const BINARY_OPERATORS: &[(&str, u8)] = &[
    ("||", 1),
    ("&&", 2),
    ("==", 3),
    ("!=", 3),
    ("<", 4),
    (">", 4),
    ("<=", 4),
    (">=", 4),
    ("|", 5),
    ("^", 6),
    ("&", 7),
    ("<<", 8),
    (">>", 8),
    (">>>", 8),
    ("+", 9),
    ("-", 9),
    ("*", 10),
    ("/", 10),
    ("%", 10),
    ("**", 11),
];

const ASSIGNMENT_OPERATORS: &[&str] = &[
    "=", "|=", "^=", "&=", "<<=", ">>=", ">>>=", "+=", "-=", "*=", "/=", "%=",
];

const NUMBER_UNITS: &[&str] = &[
    "wei", "gwei", "szabo", "finney", "ether", "seconds", "minutes", "hours", "days", "weeks",
    "years",
];

const FUNCTION_ATTRIBUTES: &[&str] = &[
    "public", "private", "internal", "external", "pure", "view", "payable", "constant", "virtual",
];

const VARIABLE_ATTRIBUTES: &[&str] = &[
    "public", "private", "internal", "constant", "immutable", "transient",
];

const DATA_LOCATIONS: &[&str] = &["memory", "storage", "calldata", "indexed"];

// Words that open an expression and must never be read as a type name.
const EXPRESSION_KEYWORDS: &[&str] = &["delete", "new", "true", "false", "this", "super"];

struct Parser<'a> {
    src: &'a str,
    tokens: Vec<Token>,
    pos: usize,
}

impl<'a> Parser<'a> {
    // ---- token helpers -------------------------------------------------

    fn peek_at(&self, n: usize) -> Option<Token> {
        self.tokens.get(self.pos + n).copied()
    }

    fn peek_text_at(&self, n: usize) -> &'a str {
        self.peek_at(n).map_or("", |t| t.text(self.src))
    }

    fn peek_text(&self) -> &'a str {
        self.peek_text_at(0)
    }

    fn peek_kind_at(&self, n: usize) -> Option<TokenKind> {
        self.peek_at(n).map(|t| t.kind)
    }

    fn at(&self, text: &str) -> bool {
        self.peek_text() == text
    }

    fn at_ident(&self) -> bool {
        self.peek_kind_at(0) == Some(TokenKind::Ident)
    }

    fn is_eof(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn start(&self) -> usize {
        self.peek_at(0).map_or(self.src.len(), |t| t.span.start)
    }

    fn last_end(&self) -> usize {
        self.pos
            .checked_sub(1)
            .and_then(|i| self.tokens.get(i))
            .map_or(0, |t| t.span.end)
    }

    fn span_from(&self, start: usize) -> Span {
        Span::new(start, self.last_end().max(start))
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        let found = if self.is_eof() {
            "end of input".to_string()
        } else {
            format!("'{}'", self.peek_text())
        };
        ParseError::Syntax {
            offset: self.start(),
            message: format!("{}, found {found}", message.into()),
        }
    }

    fn bump(&mut self) -> PResult<Token> {
        let token = self
            .peek_at(0)
            .ok_or_else(|| self.error("unexpected end of input"))?;
        self.pos += 1;
        Ok(token)
    }

    fn eat(&mut self, text: &str) -> bool {
        if self.at(text) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, text: &str) -> PResult<Token> {
        if self.at(text) {
            self.bump()
        } else {
            Err(self.error(format!("expected '{text}'")))
        }
    }

    fn ident(&mut self) -> PResult<(String, Span)> {
        if !self.at_ident() {
            return Err(self.error("expected identifier"));
        }
        let token = self.bump()?;
        Ok((token.text(self.src).to_string(), token.span))
    }

    fn identifier_node(&mut self) -> PResult<SyntaxNode> {
        let (name, span) = self.ident()?;
        Ok(SyntaxNode::leaf(NodeKind::Identifier { name }, span))
    }

    /// Consumes a balanced `open ... close` group starting at the current token.
    fn skip_balanced(&mut self, open: &str, close: &str) -> PResult<()> {
        self.expect(open)?;
        let mut depth = 1usize;
        while depth > 0 {
            let token = self.bump()?;
            let text = token.text(self.src);
            if text == open {
                depth += 1;
            } else if text == close {
                depth -= 1;
            }
        }
        Ok(())
    }

    /// Consumes tokens up to and including the next `;`.
    fn skip_past_semicolon(&mut self) -> PResult<()> {
        while !self.eat(";") {
            self.bump()?;
        }
        Ok(())
    }

    // ---- source units and contracts ------------------------------------

    fn source_unit(&mut self) -> PResult<SyntaxNode> {
        let mut children = Vec::new();
        while !self.is_eof() {
            children.push(self.source_item()?);
        }
        Ok(SyntaxNode::new(
            NodeKind::SourceUnit,
            Span::new(0, self.src.len()),
            children,
        ))
    }

    fn source_item(&mut self) -> PResult<SyntaxNode> {
        match self.peek_text() {
            "pragma" => self.directive("PragmaDirective"),
            "import" => self.directive("ImportDirective"),
            "abstract" | "contract" | "interface" | "library" => self.contract(),
            _ => self.member(),
        }
    }

    fn directive(&mut self, node_type: &str) -> PResult<SyntaxNode> {
        let start = self.start();
        self.bump()?;
        self.skip_past_semicolon()?;
        Ok(SyntaxNode::leaf(
            NodeKind::other(node_type),
            self.span_from(start),
        ))
    }

    fn contract(&mut self) -> PResult<SyntaxNode> {
        let start = self.start();
        let is_abstract = self.eat("abstract");
        let keyword = self.bump()?;
        let kind = match keyword.text(self.src) {
            "contract" if is_abstract => ContractKind::Abstract,
            "contract" => ContractKind::Contract,
            "interface" => ContractKind::Interface,
            "library" => ContractKind::Library,
            _ => return Err(self.error("expected contract, interface or library")),
        };
        let (name, _) = self.ident()?;

        let mut children = Vec::new();
        if self.eat("is") {
            loop {
                children.push(self.inheritance_specifier()?);
                if !self.eat(",") {
                    break;
                }
            }
        }
        self.expect("{")?;
        while !self.at("}") {
            if self.is_eof() {
                return Err(self.error("unterminated contract body"));
            }
            children.push(self.member()?);
        }
        self.expect("}")?;
        Ok(SyntaxNode::new(
            NodeKind::ContractDefinition { name, kind },
            self.span_from(start),
            children,
        ))
    }

    fn inheritance_specifier(&mut self) -> PResult<SyntaxNode> {
        let start = self.start();
        let mut children = vec![self.user_type_path()?];
        if self.at("(") {
            children.extend(self.call_arguments()?);
        }
        Ok(SyntaxNode::new(
            NodeKind::other("InheritanceSpecifier"),
            self.span_from(start),
            children,
        ))
    }

    /// A contract member or a file-level definition.
    fn member(&mut self) -> PResult<SyntaxNode> {
        let next = self.peek_text_at(1);
        match self.peek_text() {
            "function" => self.function(),
            "constructor" | "fallback" | "receive" if next == "(" => self.function(),
            "modifier" => self.modifier(),
            "struct" => self.struct_definition(),
            "enum" => self.enum_definition(),
            "event" => self.event_like("EventDefinition"),
            "error" if self.peek_kind_at(1) == Some(TokenKind::Ident) && self.peek_text_at(2) == "(" => {
                self.event_like("CustomErrorDefinition")
            }
            "using" => self.using_for(),
            "type" if self.peek_text_at(2) == "is" => self.type_definition(),
            ";" => {
                let start = self.start();
                self.bump()?;
                Ok(SyntaxNode::leaf(
                    NodeKind::other("EmptyStatement"),
                    self.span_from(start),
                ))
            }
            _ => self.state_variable(),
        }
    }

    fn function(&mut self) -> PResult<SyntaxNode> {
        let start = self.start();
        let head = self.bump()?;
        let name = if head.text(self.src) == "function" && self.at_ident() {
            Some(self.ident()?.0)
        } else {
            None
        };
        let mut children = self.parameter_list()?;

        let body = loop {
            match self.peek_text() {
                "{" => {
                    let block = self.block()?;
                    let span = block.span;
                    children.push(block);
                    break Some(span);
                }
                ";" => {
                    self.bump()?;
                    break None;
                }
                "returns" => {
                    self.bump()?;
                    children.extend(self.parameter_list()?);
                }
                "override" => {
                    self.bump()?;
                    if self.at("(") {
                        children.extend(self.override_list()?);
                    }
                }
                attr if FUNCTION_ATTRIBUTES.contains(&attr) => {
                    self.bump()?;
                }
                _ if self.at_ident() => children.push(self.modifier_invocation()?),
                _ => return Err(self.error("expected function body")),
            }
        };

        let kind = match body {
            Some(body) => NodeKind::FunctionDefinition { name, body },
            None => NodeKind::FunctionDeclaration { name },
        };
        Ok(SyntaxNode::new(kind, self.span_from(start), children))
    }

    fn modifier(&mut self) -> PResult<SyntaxNode> {
        let start = self.start();
        self.expect("modifier")?;
        let (name, _) = self.ident()?;
        let mut children = Vec::new();
        if self.at("(") {
            children.extend(self.parameter_list()?);
        }

        let body = loop {
            match self.peek_text() {
                "{" => {
                    let block = self.block()?;
                    let span = block.span;
                    children.push(block);
                    break Some(span);
                }
                ";" => {
                    self.bump()?;
                    break None;
                }
                "virtual" => {
                    self.bump()?;
                }
                "override" => {
                    self.bump()?;
                    if self.at("(") {
                        children.extend(self.override_list()?);
                    }
                }
                _ => return Err(self.error("expected modifier body")),
            }
        };

        let kind = match body {
            Some(body) => NodeKind::ModifierDefinition { name, body },
            None => NodeKind::ModifierDeclaration { name },
        };
        Ok(SyntaxNode::new(kind, self.span_from(start), children))
    }

    fn modifier_invocation(&mut self) -> PResult<SyntaxNode> {
        let start = self.start();
        let (mut name, _) = self.ident()?;
        while self.at(".") && self.peek_kind_at(1) == Some(TokenKind::Ident) {
            self.bump()?;
            name.push('.');
            name.push_str(&self.ident()?.0);
        }
        let children = if self.at("(") {
            self.call_arguments()?
        } else {
            Vec::new()
        };
        Ok(SyntaxNode::new(
            NodeKind::ModifierInvocation { name },
            self.span_from(start),
            children,
        ))
    }

    fn override_list(&mut self) -> PResult<Vec<SyntaxNode>> {
        self.expect("(")?;
        let mut paths = Vec::new();
        while !self.at(")") {
            paths.push(self.user_type_path()?);
            if !self.eat(",") {
                break;
            }
        }
        self.expect(")")?;
        Ok(paths)
    }

    fn parameter_list(&mut self) -> PResult<Vec<SyntaxNode>> {
        self.expect("(")?;
        let mut params = Vec::new();
        while !self.at(")") {
            params.push(self.parameter()?);
            if !self.eat(",") {
                break;
            }
        }
        self.expect(")")?;
        Ok(params)
    }

    fn parameter(&mut self) -> PResult<SyntaxNode> {
        let start = self.start();
        let mut children = vec![self.type_name()?];
        while DATA_LOCATIONS.contains(&self.peek_text()) {
            self.bump()?;
        }
        let name = if self.at_ident() {
            let node = self.identifier_node()?;
            let name = identifier_name(&node);
            children.push(node);
            name
        } else {
            None
        };
        Ok(SyntaxNode::new(
            NodeKind::VariableDeclaration { name },
            self.span_from(start),
            children,
        ))
    }

    fn struct_definition(&mut self) -> PResult<SyntaxNode> {
        let start = self.start();
        self.expect("struct")?;
        let (name, _) = self.ident()?;
        self.expect("{")?;
        let mut members = Vec::new();
        while !self.at("}") {
            let member_start = self.start();
            let ty = self.type_name()?;
            let ident = self.identifier_node()?;
            let member_name = identifier_name(&ident);
            self.expect(";")?;
            members.push(SyntaxNode::new(
                NodeKind::VariableDeclaration { name: member_name },
                self.span_from(member_start),
                vec![ty, ident],
            ));
        }
        self.expect("}")?;
        Ok(SyntaxNode::new(
            NodeKind::StructDefinition { name },
            self.span_from(start),
            members,
        ))
    }

    fn enum_definition(&mut self) -> PResult<SyntaxNode> {
        let start = self.start();
        self.expect("enum")?;
        let (name, _) = self.ident()?;
        self.expect("{")?;
        let mut values = Vec::new();
        while !self.at("}") {
            let (_, span) = self.ident()?;
            values.push(SyntaxNode::leaf(NodeKind::other("EnumValue"), span));
            if !self.eat(",") {
                break;
            }
        }
        self.expect("}")?;
        Ok(SyntaxNode::new(
            NodeKind::EnumDefinition { name },
            self.span_from(start),
            values,
        ))
    }

    fn event_like(&mut self, node_type: &str) -> PResult<SyntaxNode> {
        let start = self.start();
        self.bump()?;
        self.ident()?;
        let children = self.parameter_list()?;
        self.eat("anonymous");
        self.expect(";")?;
        Ok(SyntaxNode::new(
            NodeKind::other(node_type),
            self.span_from(start),
            children,
        ))
    }

    fn using_for(&mut self) -> PResult<SyntaxNode> {
        let start = self.start();
        self.expect("using")?;
        let mut children = Vec::new();
        if self.at("{") {
            self.skip_balanced("{", "}")?;
        } else {
            children.push(self.user_type_path()?);
        }
        if self.eat("for") && !self.eat("*") {
            children.push(self.type_name()?);
        }
        self.eat("global");
        self.expect(";")?;
        Ok(SyntaxNode::new(
            NodeKind::other("UsingForDeclaration"),
            self.span_from(start),
            children,
        ))
    }

    fn type_definition(&mut self) -> PResult<SyntaxNode> {
        let start = self.start();
        self.expect("type")?;
        self.ident()?;
        self.expect("is")?;
        let underlying = self.type_name()?;
        self.expect(";")?;
        Ok(SyntaxNode::new(
            NodeKind::other("TypeDefinition"),
            self.span_from(start),
            vec![underlying],
        ))
    }

    fn state_variable(&mut self) -> PResult<SyntaxNode> {
        let start = self.start();
        let mut children = vec![self.type_name()?];
        loop {
            let word = self.peek_text();
            if VARIABLE_ATTRIBUTES.contains(&word) {
                self.bump()?;
            } else if word == "override" {
                self.bump()?;
                if self.at("(") {
                    children.extend(self.override_list()?);
                }
            } else {
                break;
            }
        }
        let ident = self.identifier_node()?;
        let name = identifier_name(&ident);
        children.push(ident);
        if self.eat("=") {
            children.push(self.expression()?);
        }
        self.expect(";")?;
        Ok(SyntaxNode::new(
            NodeKind::VariableDeclaration { name },
            self.span_from(start),
            children,
        ))
    }

    // ---- types ---------------------------------------------------------

    fn type_name(&mut self) -> PResult<SyntaxNode> {
        let start = self.start();
        let word = self.peek_text();
        let mut ty = if word == "mapping" {
            self.mapping()?
        } else if word == "function" {
            self.function_type()?
        } else if is_elementary_type(word) {
            self.bump()?;
            if word == "address" {
                self.eat("payable");
            }
            SyntaxNode::leaf(NodeKind::other("ElementaryTypeName"), self.span_from(start))
        } else if self.at_ident() && !EXPRESSION_KEYWORDS.contains(&word) {
            self.user_type_path()?
        } else {
            return Err(self.error("expected type name"));
        };

        while self.at("[") {
            self.bump()?;
            let mut children = vec![ty];
            if !self.at("]") {
                children.push(self.expression()?);
            }
            self.expect("]")?;
            ty = SyntaxNode::new(
                NodeKind::other("ArrayTypeName"),
                self.span_from(start),
                children,
            );
        }
        Ok(ty)
    }

    fn user_type_path(&mut self) -> PResult<SyntaxNode> {
        let start = self.start();
        let (mut name_path, _) = self.ident()?;
        while self.at(".") && self.peek_kind_at(1) == Some(TokenKind::Ident) {
            self.bump()?;
            name_path.push('.');
            name_path.push_str(&self.ident()?.0);
        }
        Ok(SyntaxNode::leaf(
            NodeKind::UserDefinedTypeName { name_path },
            self.span_from(start),
        ))
    }

    fn mapping(&mut self) -> PResult<SyntaxNode> {
        let start = self.start();
        self.expect("mapping")?;
        self.expect("(")?;
        let key = self.type_name()?;
        if self.at_ident() {
            self.bump()?;
        }
        self.expect("=>")?;
        let value = self.type_name()?;
        if self.at_ident() {
            self.bump()?;
        }
        self.expect(")")?;
        Ok(SyntaxNode::new(
            NodeKind::other("Mapping"),
            self.span_from(start),
            vec![key, value],
        ))
    }

    fn function_type(&mut self) -> PResult<SyntaxNode> {
        let start = self.start();
        self.expect("function")?;
        let mut children = self.parameter_list()?;
        while FUNCTION_ATTRIBUTES.contains(&self.peek_text()) {
            self.bump()?;
        }
        if self.eat("returns") {
            children.extend(self.parameter_list()?);
        }
        Ok(SyntaxNode::new(
            NodeKind::other("FunctionTypeName"),
            self.span_from(start),
            children,
        ))
    }

    // ---- statements ----------------------------------------------------

    fn block(&mut self) -> PResult<SyntaxNode> {
        let start = self.start();
        self.expect("{")?;
        let mut statements = Vec::new();
        while !self.at("}") {
            if self.is_eof() {
                return Err(self.error("unterminated block"));
            }
            statements.push(self.statement()?);
        }
        self.expect("}")?;
        Ok(SyntaxNode::new(
            NodeKind::Block,
            self.span_from(start),
            statements,
        ))
    }

    fn statement(&mut self) -> PResult<SyntaxNode> {
        let start = self.start();
        let next = self.peek_text_at(1);
        let (node_type, children) = match self.peek_text() {
            "{" => return self.block(),
            "for" => return self.for_statement(),
            "assembly" => return self.assembly(),
            "try" => return self.try_statement(),
            "if" => {
                self.bump()?;
                let mut children = self.condition()?;
                children.push(self.statement()?);
                if self.eat("else") {
                    children.push(self.statement()?);
                }
                ("IfStatement", children)
            }
            "while" => {
                self.bump()?;
                let mut children = self.condition()?;
                children.push(self.statement()?);
                ("WhileStatement", children)
            }
            "do" => {
                self.bump()?;
                let body = self.statement()?;
                self.expect("while")?;
                let mut children = vec![body];
                children.extend(self.condition()?);
                self.expect(";")?;
                ("DoWhileStatement", children)
            }
            "return" => {
                self.bump()?;
                let children = if self.at(";") {
                    Vec::new()
                } else {
                    vec![self.expression()?]
                };
                self.expect(";")?;
                ("ReturnStatement", children)
            }
            word @ ("break" | "continue" | "throw") if next == ";" => {
                self.bump()?;
                self.bump()?;
                let node_type = match word {
                    "break" => "BreakStatement",
                    "continue" => "ContinueStatement",
                    _ => "ThrowStatement",
                };
                (node_type, Vec::new())
            }
            "emit" => {
                self.bump()?;
                let call = self.expression()?;
                self.expect(";")?;
                ("EmitStatement", vec![call])
            }
            "revert" if self.peek_kind_at(1) == Some(TokenKind::Ident) => {
                self.bump()?;
                let call = self.expression()?;
                self.expect(";")?;
                ("RevertStatement", vec![call])
            }
            "unchecked" if next == "{" => {
                self.bump()?;
                ("UncheckedStatement", vec![self.block()?])
            }
            ";" => {
                self.bump()?;
                ("EmptyStatement", Vec::new())
            }
            _ => return self.simple_statement(),
        };
        Ok(SyntaxNode::new(
            NodeKind::other(node_type),
            self.span_from(start),
            children,
        ))
    }

    /// `( expression )`
    fn condition(&mut self) -> PResult<Vec<SyntaxNode>> {
        self.expect("(")?;
        let condition = self.expression()?;
        self.expect(")")?;
        Ok(vec![condition])
    }

    /// A variable declaration or an expression statement, both `;`-terminated.
    fn simple_statement(&mut self) -> PResult<SyntaxNode> {
        if !EXPRESSION_KEYWORDS.contains(&self.peek_text()) {
            let checkpoint = self.pos;
            match self.variable_declaration_statement() {
                Ok(node) => return Ok(node),
                Err(_) => self.pos = checkpoint,
            }
        }
        let start = self.start();
        let expression = self.expression()?;
        self.expect(";")?;
        Ok(SyntaxNode::new(
            NodeKind::ExpressionStatement,
            self.span_from(start),
            vec![expression],
        ))
    }

    fn variable_declaration_statement(&mut self) -> PResult<SyntaxNode> {
        let start = self.start();
        let mut children = Vec::new();
        if self.eat("(") {
            while !self.at(")") {
                if self.eat(",") {
                    continue;
                }
                children.push(self.local_declaration()?);
                if !self.at(")") {
                    self.expect(",")?;
                }
            }
            self.expect(")")?;
            if children.is_empty() {
                return Err(self.error("empty tuple declaration"));
            }
            self.expect("=")?;
            children.push(self.expression()?);
        } else {
            children.push(self.local_declaration()?);
            if self.eat("=") {
                children.push(self.expression()?);
            }
        }
        self.expect(";")?;
        Ok(SyntaxNode::new(
            NodeKind::other("VariableDeclarationStatement"),
            self.span_from(start),
            children,
        ))
    }

    fn local_declaration(&mut self) -> PResult<SyntaxNode> {
        let start = self.start();
        let ty = self.type_name()?;
        while DATA_LOCATIONS.contains(&self.peek_text()) {
            self.bump()?;
        }
        let ident = self.identifier_node()?;
        let name = identifier_name(&ident);
        Ok(SyntaxNode::new(
            NodeKind::VariableDeclaration { name },
            self.span_from(start),
            vec![ty, ident],
        ))
    }

    fn for_statement(&mut self) -> PResult<SyntaxNode> {
        let start = self.start();
        self.expect("for")?;
        self.expect("(")?;
        let mut children = Vec::new();
        if !self.eat(";") {
            children.push(self.simple_statement()?);
        }
        if !self.at(";") {
            children.push(self.expression()?);
        }
        self.expect(";")?;
        if !self.at(")") {
            let loop_start = self.start();
            let expression = self.expression()?;
            children.push(SyntaxNode::new(
                NodeKind::ExpressionStatement,
                self.span_from(loop_start),
                vec![expression],
            ));
        }
        self.expect(")")?;
        children.push(self.statement()?);
        Ok(SyntaxNode::new(
            NodeKind::ForStatement,
            self.span_from(start),
            children,
        ))
    }

    fn assembly(&mut self) -> PResult<SyntaxNode> {
        let start = self.start();
        self.expect("assembly")?;
        if self.peek_kind_at(0) == Some(TokenKind::Str) {
            self.bump()?;
        }
        if self.at("(") {
            self.skip_balanced("(", ")")?;
        }
        self.skip_balanced("{", "}")?;
        Ok(SyntaxNode::leaf(
            NodeKind::other("InlineAssemblyStatement"),
            self.span_from(start),
        ))
    }

    fn try_statement(&mut self) -> PResult<SyntaxNode> {
        let start = self.start();
        self.expect("try")?;
        let mut children = vec![self.expression()?];
        if self.eat("returns") {
            children.extend(self.parameter_list()?);
        }
        children.push(self.block()?);
        while self.at("catch") {
            let clause_start = self.start();
            self.bump()?;
            let mut clause = Vec::new();
            if self.at_ident() {
                self.bump()?;
            }
            if self.at("(") {
                clause.extend(self.parameter_list()?);
            }
            clause.push(self.block()?);
            children.push(SyntaxNode::new(
                NodeKind::other("CatchClause"),
                self.span_from(clause_start),
                clause,
            ));
        }
        Ok(SyntaxNode::new(
            NodeKind::other("TryStatement"),
            self.span_from(start),
            children,
        ))
    }

    // ---- expressions ---------------------------------------------------

    fn expression(&mut self) -> PResult<SyntaxNode> {
        let start = self.start();
        let lhs = self.conditional()?;
        let op = self.peek_text();
        if self.peek_kind_at(0) == Some(TokenKind::Punct) && ASSIGNMENT_OPERATORS.contains(&op) {
            self.bump()?;
            let rhs = self.expression()?;
            return Ok(SyntaxNode::new(
                NodeKind::BinaryOperation {
                    operator: op.to_string(),
                },
                self.span_from(start),
                vec![lhs, rhs],
            ));
        }
        Ok(lhs)
    }

    fn conditional(&mut self) -> PResult<SyntaxNode> {
        let start = self.start();
        let condition = self.binary(1)?;
        if !self.eat("?") {
            return Ok(condition);
        }
        let when_true = self.expression()?;
        self.expect(":")?;
        let when_false = self.expression()?;
        Ok(SyntaxNode::new(
            NodeKind::other("Conditional"),
            self.span_from(start),
            vec![condition, when_true, when_false],
        ))
    }

    fn binary_operator(&self) -> Option<(&'a str, u8)> {
        if self.peek_kind_at(0) != Some(TokenKind::Punct) {
            return None;
        }
        let text = self.peek_text();
        BINARY_OPERATORS
            .iter()
            .find(|(op, _)| *op == text)
            .map(|&(_, prec)| (text, prec))
    }

    /// Precedence climbing; `**` is right-associative.
    fn binary(&mut self, min_prec: u8) -> PResult<SyntaxNode> {
        let start = self.start();
        let mut lhs = self.unary()?;
        while let Some((op, prec)) = self.binary_operator() {
            if prec < min_prec {
                break;
            }
            self.bump()?;
            let next_min = if op == "**" { prec } else { prec + 1 };
            let rhs = self.binary(next_min)?;
            lhs = SyntaxNode::new(
                NodeKind::BinaryOperation {
                    operator: op.to_string(),
                },
                self.span_from(start),
                vec![lhs, rhs],
            );
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> PResult<SyntaxNode> {
        let start = self.start();
        let is_prefix = match self.peek_kind_at(0) {
            Some(TokenKind::Punct) => matches!(self.peek_text(), "!" | "~" | "-" | "+" | "++" | "--"),
            Some(TokenKind::Ident) => self.at("delete"),
            _ => false,
        };
        if is_prefix {
            self.bump()?;
            let operand = self.unary()?;
            return Ok(SyntaxNode::new(
                NodeKind::other("UnaryOperation"),
                self.span_from(start),
                vec![operand],
            ));
        }
        let primary = self.primary()?;
        self.postfix(start, primary)
    }

    fn postfix(&mut self, start: usize, mut expr: SyntaxNode) -> PResult<SyntaxNode> {
        loop {
            expr = match self.peek_text() {
                "." => {
                    self.bump()?;
                    let (member, _) = self.ident()?;
                    SyntaxNode::new(
                        NodeKind::MemberAccess { member },
                        self.span_from(start),
                        vec![expr],
                    )
                }
                "(" => {
                    let mut children = vec![expr];
                    children.extend(self.call_arguments()?);
                    SyntaxNode::new(
                        NodeKind::other("FunctionCall"),
                        self.span_from(start),
                        children,
                    )
                }
                "[" => {
                    self.bump()?;
                    let mut children = vec![expr];
                    let mut node_type = "IndexAccess";
                    if !self.at("]") && !self.at(":") {
                        children.push(self.expression()?);
                    }
                    if self.eat(":") {
                        node_type = "IndexRangeAccess";
                        if !self.at("]") {
                            children.push(self.expression()?);
                        }
                    }
                    self.expect("]")?;
                    SyntaxNode::new(NodeKind::other(node_type), self.span_from(start), children)
                }
                "{" if self.peek_kind_at(1) == Some(TokenKind::Ident) && self.peek_text_at(2) == ":" => {
                    self.bump()?;
                    let mut children = vec![expr];
                    while !self.at("}") {
                        self.ident()?;
                        self.expect(":")?;
                        children.push(self.expression()?);
                        if !self.eat(",") {
                            break;
                        }
                    }
                    self.expect("}")?;
                    SyntaxNode::new(
                        NodeKind::other("FunctionCallOptions"),
                        self.span_from(start),
                        children,
                    )
                }
                "++" | "--" => {
                    self.bump()?;
                    SyntaxNode::new(
                        NodeKind::other("UnaryOperation"),
                        self.span_from(start),
                        vec![expr],
                    )
                }
                _ => return Ok(expr),
            };
        }
    }

    /// `( args )` or `({ name: value, ... })`.
    fn call_arguments(&mut self) -> PResult<Vec<SyntaxNode>> {
        self.expect("(")?;
        let mut args = Vec::new();
        if self.eat("{") {
            while !self.at("}") {
                args.push(self.identifier_node()?);
                self.expect(":")?;
                args.push(self.expression()?);
                if !self.eat(",") {
                    break;
                }
            }
            self.expect("}")?;
        } else {
            while !self.at(")") {
                args.push(self.expression()?);
                if !self.eat(",") {
                    break;
                }
            }
        }
        self.expect(")")?;
        Ok(args)
    }

    fn primary(&mut self) -> PResult<SyntaxNode> {
        let start = self.start();
        let token = self
            .peek_at(0)
            .ok_or_else(|| self.error("expected expression"))?;
        let text = token.text(self.src);

        let kind = match token.kind {
            TokenKind::Number => {
                self.bump()?;
                if NUMBER_UNITS.contains(&self.peek_text()) {
                    self.bump()?;
                }
                NodeKind::NumberLiteral {
                    value: text.to_string(),
                }
            }
            TokenKind::Str => {
                let mut value = String::new();
                while self.peek_kind_at(0) == Some(TokenKind::Str) {
                    let part = self.bump()?.text(self.src);
                    value.push_str(&unescape(&part[1..part.len() - 1]));
                }
                NodeKind::StringLiteral { value }
            }
            TokenKind::UnicodeStr | TokenKind::HexStr => {
                while self.peek_kind_at(0) == Some(token.kind) {
                    self.bump()?;
                }
                NodeKind::other(if token.kind == TokenKind::HexStr {
                    "HexLiteral"
                } else {
                    "UnicodeStringLiteral"
                })
            }
            TokenKind::Punct if text == "(" => return self.tuple("(", ")", "TupleExpression"),
            TokenKind::Punct if text == "[" => return self.tuple("[", "]", "InlineArray"),
            TokenKind::Punct => return Err(self.error("expected expression")),
            TokenKind::Ident => match text {
                "true" | "false" => {
                    self.bump()?;
                    NodeKind::other("BooleanLiteral")
                }
                "new" => {
                    self.bump()?;
                    let ty = self.type_name()?;
                    return Ok(SyntaxNode::new(
                        NodeKind::other("NewExpression"),
                        self.span_from(start),
                        vec![ty],
                    ));
                }
                _ if is_elementary_type(text) || text == "payable" => {
                    self.bump()?;
                    if text == "address" {
                        self.eat("payable");
                    }
                    NodeKind::other("ElementaryTypeName")
                }
                _ => {
                    self.bump()?;
                    NodeKind::Identifier {
                        name: text.to_string(),
                    }
                }
            },
        };
        Ok(SyntaxNode::leaf(kind, self.span_from(start)))
    }

    /// Parenthesized expression, tuple or inline array; components may be empty.
    fn tuple(&mut self, open: &str, close: &str, node_type: &str) -> PResult<SyntaxNode> {
        let start = self.start();
        self.expect(open)?;
        let mut children = Vec::new();
        while !self.at(close) {
            if self.eat(",") {
                continue;
            }
            children.push(self.expression()?);
            if !self.at(close) {
                self.expect(",")?;
            }
        }
        self.expect(close)?;
        Ok(SyntaxNode::new(
            NodeKind::other(node_type),
            self.span_from(start),
            children,
        ))
    }
}

fn identifier_name(node: &SyntaxNode) -> Option<String> {
    match &node.kind {
        NodeKind::Identifier { name } => Some(name.clone()),
        _ => None,
    }
}
