//! AST provider backed by `@solidity-parser/parser` running under Node.js.
//!
//! The source is piped to a short inline script on stdin and the parser's
//! JSON comes back on stdout. The package is resolved through `NODE_PATH`,
//! so `module_dir` should point at a `node_modules` directory that has it.

use super::json::from_solidity_parser;
use super::{SyntaxProvider, SyntaxTree};
use crate::source::SourceBuffer;
use solcloak_utils::errors::ParseError;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use tracing::debug;

const SCRIPT: &str = r#"
const parser = require('@solidity-parser/parser');
let input = '';
process.stdin.setEncoding('utf8');
process.stdin.on('data', (chunk) => { input += chunk; });
process.stdin.on('end', () => {
  try {
    const ast = parser.parse(input, { range: true, tolerant: true });
    process.stdout.write(JSON.stringify(ast));
  } catch (e) {
    process.stderr.write(String(e && e.message ? e.message : e));
    process.exit(1);
  }
});
"#;

/// Runs the JavaScript Solidity parser as a child process.
#[derive(Debug, Clone)]
pub struct NodeBridge {
    pub node: PathBuf,
    pub module_dir: Option<PathBuf>,
}

impl Default for NodeBridge {
    fn default() -> Self {
        Self {
            node: PathBuf::from("node"),
            module_dir: None,
        }
    }
}

impl NodeBridge {
    pub fn new(module_dir: Option<PathBuf>) -> Self {
        Self {
            module_dir,
            ..Self::default()
        }
    }

    fn run(&self, src: &str) -> Result<Vec<u8>, ParseError> {
        let program = self.node.display().to_string();
        let mut command = Command::new(&self.node);
        command
            .arg("-e")
            .arg(SCRIPT)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = &self.module_dir {
            command.env("NODE_PATH", dir);
        }

        let mut child = command.spawn().map_err(|source| ParseError::Spawn {
            program: program.clone(),
            source,
        })?;
        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(src.as_bytes())
                .map_err(|source| ParseError::Spawn {
                    program: program.clone(),
                    source,
                })?;
        }
        let output = child
            .wait_with_output()
            .map_err(|source| ParseError::Spawn { program, source })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ParseError::Provider(stderr.trim().to_string()));
        }
        Ok(output.stdout)
    }
}

impl SyntaxProvider for NodeBridge {
    fn name(&self) -> &'static str {
        "node"
    }

    fn parse(&self, buffer: &SourceBuffer) -> Result<SyntaxTree, ParseError> {
        let stdout = self.run(buffer.as_str())?;
        debug!("node bridge returned {} bytes of AST JSON", stdout.len());
        let document: serde_json::Value = serde_json::from_slice(&stdout)?;
        let root = from_solidity_parser(&document, buffer.as_str())?;
        Ok(SyntaxTree::new(root, buffer))
    }
}
