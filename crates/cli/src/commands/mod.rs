use async_trait::async_trait;
use clap::{Args, Subcommand};
use solcloak_core::source::SourceBuffer;
use solcloak_core::syntax::{NativeParser, NodeBridge, SyntaxProvider, SyntaxTree};
use solcloak_utils::errors::ObfuscateError;
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub mod obfuscate;
pub mod slots;
pub mod tree;

#[derive(Subcommand)]
pub enum Cmd {
    /// Obfuscate Solidity files or directories
    Obfuscate(obfuscate::ObfuscateArgs),

    /// Print the structural description of a file as JSON
    Tree(tree::TreeArgs),

    /// List the insertion slots of every function and modifier body
    Slots(slots::SlotsArgs),
}

#[async_trait]
pub trait Command {
    async fn execute(self) -> Result<(), Box<dyn Error>>;
}

#[async_trait]
impl Command for Cmd {
    async fn execute(self) -> Result<(), Box<dyn Error>> {
        match self {
            Cmd::Obfuscate(args) => args.execute().await,
            Cmd::Tree(args) => args.execute().await,
            Cmd::Slots(args) => args.execute().await,
        }
    }
}

/// Parser selection shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct ParserArgs {
    /// Structural description provider: `native` or `node`.
    #[arg(long, default_value = "native")]
    pub parser: String,
    /// `node_modules` directory holding `@solidity-parser/parser` (for `--parser node`).
    #[arg(long)]
    pub node_modules: Option<PathBuf>,
}

impl ParserArgs {
    pub fn provider(&self) -> Result<Arc<dyn SyntaxProvider>, ObfuscateError> {
        match self.parser.as_str() {
            "native" => Ok(Arc::new(NativeParser)),
            "node" => Ok(Arc::new(NodeBridge::new(self.node_modules.clone()))),
            other => Err(ObfuscateError::InvalidParser(other.to_string())),
        }
    }
}

/// Reads and parses one file for the diagnostic subcommands.
fn load(
    file: &Path,
    parser: &ParserArgs,
) -> Result<(SourceBuffer, SyntaxTree), Box<dyn Error>> {
    let text = fs::read_to_string(file).map_err(|source| ObfuscateError::Read {
        path: file.display().to_string(),
        source,
    })?;
    let buffer = SourceBuffer::new(text);
    let tree = parser.provider()?.parse(&buffer)?;
    Ok((buffer, tree))
}
