//! Per-file mapping from declared names to generated aliases.
//!
//! One registry lives in each [`crate::PipelineContext`] and is dropped with
//! it, so aliases never leak between files.

use indexmap::IndexMap;
use rand::Rng;
use serde::{Deserialize, Serialize};
use solcloak_core::syntax::lexer::is_elementary_type;
use std::collections::HashSet;

/// Language keywords, globals and built-in members that are never renamed.
///
/// Built-in member names are included so a user-declared field named, say,
/// `balance` keeps matching `address(x).balance` style accesses.
const RESERVED: &[&str] = &[
    // keywords
    "abstract", "after", "alias", "anonymous", "apply", "as", "assembly", "auto", "break",
    "calldata", "case", "catch", "constant", "constructor", "continue", "contract", "copyof",
    "default", "define", "delete", "do", "else", "emit", "enum", "error", "event", "external",
    "fallback", "false", "final", "for", "from", "function", "global", "hex", "if", "immutable",
    "implements", "import", "in", "indexed", "inline", "interface", "internal", "is", "let",
    "library", "macro", "mapping", "match", "memory", "modifier", "mutable", "new", "null", "of",
    "override", "partial", "payable", "pragma", "private", "promise", "public", "pure",
    "receive", "reference", "relocatable", "return", "returns", "revert", "sealed", "sizeof",
    "solidity", "static", "storage", "struct", "supports", "switch", "throw", "transient", "true",
    "try", "type", "typedef", "typeof", "unchecked", "unicode", "using", "var", "view",
    "virtual", "while",
    // units
    "wei", "gwei", "szabo", "finney", "ether", "seconds", "minutes", "hours", "days", "weeks",
    "years",
    // globals
    "_", "abi", "block", "msg", "tx", "now", "this", "super", "selfdestruct", "suicide",
    "addmod", "mulmod", "keccak256", "sha256", "sha3", "ripemd160", "ecrecover", "blockhash",
    "blobhash", "gasleft", "require", "assert",
    // built-in members
    "encode", "encodePacked", "encodeWithSelector", "encodeWithSignature", "encodeCall",
    "decode", "concat", "length", "push", "pop", "balance", "transfer", "send", "call",
    "delegatecall", "staticcall", "code", "codehash", "selector", "address", "sender", "value",
    "data", "sig", "origin", "gasprice", "timestamp", "number", "coinbase", "difficulty",
    "prevrandao", "gaslimit", "chainid", "basefee", "blobbasefee", "min", "max", "interfaceId",
    "name", "creationCode", "runtimeCode", "wrap", "unwrap", "gas", "salt",
];

/// Whether `name` is a keyword, an elementary type or a built-in global or member.
pub fn is_reserved(name: &str) -> bool {
    RESERVED.contains(&name) || is_elementary_type(name)
}

/// Knobs of the identifier renaming pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenameConfig {
    /// Prepended to every alias.
    pub prefix: String,
    /// Extra names never renamed.
    pub preserve: Vec<String>,
}

impl Default for RenameConfig {
    fn default() -> Self {
        Self {
            prefix: "obf_".to_string(),
            preserve: Vec::new(),
        }
    }
}

/// Memoized `original -> alias` bijection for one file.
#[derive(Debug, Clone)]
pub struct RenameRegistry {
    prefix: String,
    preserve: HashSet<String>,
    aliases: IndexMap<String, String>,
    issued: HashSet<String>,
}

impl Default for RenameRegistry {
    fn default() -> Self {
        Self::new(&RenameConfig::default())
    }
}

impl RenameRegistry {
    pub fn new(config: &RenameConfig) -> Self {
        Self {
            prefix: config.prefix.clone(),
            preserve: config.preserve.iter().cloned().collect(),
            aliases: IndexMap::new(),
            issued: HashSet::new(),
        }
    }

    /// Adopts a pass's prefix and adds its preserved names.
    ///
    /// Aliases already issued keep their old prefix.
    pub fn configure(&mut self, config: &RenameConfig) {
        self.prefix.clone_from(&config.prefix);
        self.preserve.extend(config.preserve.iter().cloned());
    }

    /// Marks `name` as never renamed.
    pub fn preserve(&mut self, name: impl Into<String>) {
        self.preserve.insert(name.into());
    }

    /// Reserved or preserved names keep their spelling.
    pub fn is_protected(&self, name: &str) -> bool {
        is_reserved(name) || self.preserve.contains(name)
    }

    /// Returns the alias for `name`, generating one on first sight.
    ///
    /// Protected names are returned unchanged and never recorded.
    pub fn lookup_or_create<R: Rng + ?Sized>(&mut self, name: &str, rng: &mut R) -> String {
        if self.is_protected(name) {
            return name.to_string();
        }
        if let Some(alias) = self.aliases.get(name) {
            return alias.clone();
        }
        let alias = loop {
            let candidate = format!("{}{}", self.prefix, hex::encode(rng.random::<[u8; 16]>()));
            if !self.issued.contains(&candidate) && !self.aliases.contains_key(&candidate) {
                break candidate;
            }
        };
        self.issued.insert(alias.clone());
        self.aliases.insert(name.to_string(), alias.clone());
        alias
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.aliases.get(name).map(String::as_str)
    }

    /// All aliases in the order they were issued.
    pub const fn aliases(&self) -> &IndexMap<String, String> {
        &self.aliases
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }
}
