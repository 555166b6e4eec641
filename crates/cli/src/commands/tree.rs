use async_trait::async_trait;
use clap::Args;
use std::error::Error;
use std::fs;
use std::path::PathBuf;

/// Arguments for the `tree` subcommand.
#[derive(Args)]
pub struct TreeArgs {
    /// Solidity file to parse.
    pub file: PathBuf,
    #[command(flatten)]
    pub parser: super::ParserArgs,
    /// Output file for the JSON tree (default: stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[async_trait]
impl super::Command for TreeArgs {
    async fn execute(self) -> Result<(), Box<dyn Error>> {
        let (buffer, tree) = super::load(&self.file, &self.parser)?;
        tracing::debug!("parsed {} ({:?})", self.file.display(), tree);
        let json = serde_json::to_string_pretty(tree.root())?;
        if let Some(out_path) = self.output {
            fs::write(&out_path, &json)?;
            tracing::info!(
                "wrote tree of {} bytes to {}",
                buffer.len(),
                out_path.display()
            );
        } else {
            println!("{json}");
        }
        Ok(())
    }
}
