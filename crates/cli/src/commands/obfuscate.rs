/// Module for the `obfuscate` subcommand, which rewrites Solidity sources.
///
/// Inputs are files or directories searched for `*.sol`. Every file runs through its own
/// pipeline on a blocking task; outputs mirror the input layout under `--out`.
use async_trait::async_trait;
use clap::Args;
use serde_json::json;
use solcloak_transform::arithmetic::{ArithmeticConfig, ArithmeticEncoding};
use solcloak_transform::control_flow::ControlFlowWrapping;
use solcloak_transform::dead_code::DeadCodeInjection;
use solcloak_transform::obfuscator::{
    create_report, obfuscate_source, print_obfuscation_analysis, ObfuscationConfig,
    ObfuscationResult,
};
use solcloak_transform::registry::RenameConfig;
use solcloak_transform::rename::IdentifierRenaming;
use solcloak_transform::string_literal::{StringConcat, StringLiteralEncoding};
use solcloak_transform::{PassConfig, Transform};
use solcloak_utils::errors::ObfuscateError;
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;

/// Arguments for the `obfuscate` subcommand.
#[derive(Args)]
pub struct ObfuscateArgs {
    /// Solidity files, or directories searched recursively for `*.sol`.
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,
    /// Output directory (default: obfuscated).
    #[arg(long, default_value = "obfuscated")]
    out: PathBuf,
    /// Comma-separated list of passes (default: dead,cf,literal,rename,arith).
    #[arg(long, default_value = "dead,cf,literal,rename,arith")]
    passes: String,
    /// Density applied to every pass that has no override of its own.
    #[arg(long)]
    density: Option<f64>,
    /// Dead-code injection density (default: 0.3).
    #[arg(long)]
    dead_density: Option<f64>,
    /// Control-flow wrapping density (default: 0.5).
    #[arg(long)]
    cf_density: Option<f64>,
    /// String literal encoding density (default: 1.0).
    #[arg(long)]
    literal_density: Option<f64>,
    /// Identifier renaming density, drawn once per declared name (default: 1.0).
    #[arg(long)]
    rename_density: Option<f64>,
    /// Arithmetic encoding density (default: 1.0).
    #[arg(long)]
    arith_density: Option<f64>,
    /// Random seed; one is drawn and reported when omitted.
    #[arg(long)]
    seed: Option<u64>,
    #[command(flatten)]
    parser: super::ParserArgs,
    /// Name of the appended bitwise helper library.
    #[arg(long, default_value = "Lib")]
    lib_name: String,
    /// Extra names never renamed.
    #[arg(long, value_delimiter = ',')]
    preserve: Vec<String>,
    /// Concatenation style for encoded literals: plus or string-concat.
    #[arg(long, default_value = "plus")]
    concat: StringConcat,
    /// Path to emit the JSON report (optional).
    #[arg(long)]
    emit: Option<PathBuf>,
    /// Print the result instead of writing it (single input only).
    #[arg(long)]
    stdout: bool,
}

/// A source file to process and where its output goes.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Job {
    source: PathBuf,
    relative: PathBuf,
}

/// Expands the inputs into jobs; a missing input still yields a job so its
/// read failure is reported against it.
fn collect_jobs(inputs: &[PathBuf]) -> Result<Vec<Job>, ObfuscateError> {
    let mut jobs = Vec::new();
    for input in inputs {
        if input.is_dir() {
            let mut found: Vec<Job> = WalkDir::new(input)
                .sort_by_file_name()
                .into_iter()
                .filter_map(Result::ok)
                .filter(|entry| entry.file_type().is_file())
                .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "sol"))
                .map(|entry| Job {
                    relative: entry
                        .path()
                        .strip_prefix(input)
                        .unwrap_or(entry.path())
                        .to_path_buf(),
                    source: entry.into_path(),
                })
                .collect();
            if found.is_empty() {
                tracing::warn!("no Solidity sources under {}", input.display());
            }
            jobs.append(&mut found);
        } else {
            let relative = input
                .file_name()
                .map_or_else(|| input.clone(), PathBuf::from);
            jobs.push(Job {
                source: input.clone(),
                relative,
            });
        }
    }
    if jobs.is_empty() {
        let listed = inputs
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(", ");
        return Err(ObfuscateError::NoInputs(listed));
    }
    Ok(jobs)
}

/// The pass's own density, else `--density`, else the pass default.
fn density(
    value: Option<f64>,
    fallback: Option<f64>,
    default: f64,
) -> Result<PassConfig, ObfuscateError> {
    let density = value.or(fallback).unwrap_or(default);
    if !(0.0..=1.0).contains(&density) {
        return Err(ObfuscateError::InvalidDensity(density));
    }
    Ok(PassConfig::new(density))
}

impl ObfuscateArgs {
    /// Builds the pass list from the comma-separated `--passes` value.
    fn build_passes(&self) -> Result<Vec<Box<dyn Transform>>, ObfuscateError> {
        self.passes
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|name| match name {
                "dead" | "dead_code" | "deadcode" => Ok(Box::new(DeadCodeInjection::new(
                    density(self.dead_density, self.density, 0.3)?,
                )) as Box<dyn Transform>),
                "cf" | "control_flow" | "controlflow" => Ok(Box::new(ControlFlowWrapping::new(
                    density(self.cf_density, self.density, 0.5)?,
                )) as Box<dyn Transform>),
                "literal" | "string" | "strings" => Ok(Box::new(StringLiteralEncoding::new(
                    density(self.literal_density, self.density, 1.0)?,
                    self.concat,
                )) as Box<dyn Transform>),
                "rename" | "layout" | "identifiers" => Ok(Box::new(IdentifierRenaming::new(
                    density(self.rename_density, self.density, 1.0)?,
                    RenameConfig::default(),
                )) as Box<dyn Transform>),
                "arith" | "op" | "arithmetic" => Ok(Box::new(ArithmeticEncoding::new(
                    density(self.arith_density, self.density, 1.0)?,
                    ArithmeticConfig {
                        library_name: self.lib_name.clone(),
                        ..ArithmeticConfig::default()
                    },
                )) as Box<dyn Transform>),
                other => Err(ObfuscateError::InvalidPass(other.to_string())),
            })
            .collect()
    }

    fn build_config(&self) -> Result<ObfuscationConfig, ObfuscateError> {
        let mut config = ObfuscationConfig {
            seed: self.seed,
            transforms: self.build_passes()?,
            provider: self.parser.provider()?,
            preserve: self.preserve.clone(),
        };
        // One seed per run, shared by every file.
        config.seed = Some(config.resolve_seed());
        Ok(config)
    }
}

/// Reads and obfuscates one file on the blocking pool.
fn process(job: &Job, config: &ObfuscationConfig) -> Result<ObfuscationResult, ObfuscateError> {
    let text = fs::read_to_string(&job.source).map_err(|source| ObfuscateError::Read {
        path: job.source.display().to_string(),
        source,
    })?;
    obfuscate_source(&job.relative.display().to_string(), &text, config)
}

fn write_output(
    out_dir: &Path,
    job: &Job,
    result: &ObfuscationResult,
) -> Result<PathBuf, ObfuscateError> {
    let target = out_dir.join(&job.relative);
    let write_error = |source| ObfuscateError::Write {
        path: target.display().to_string(),
        source,
    };
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent).map_err(write_error)?;
    }
    fs::write(&target, &result.obfuscated_source).map_err(write_error)?;
    Ok(target)
}

/// Executes the `obfuscate` subcommand.
#[async_trait]
impl super::Command for ObfuscateArgs {
    async fn execute(self) -> Result<(), Box<dyn Error>> {
        let config = Arc::new(self.build_config()?);
        let seed = config.seed.unwrap_or_default();
        let jobs = collect_jobs(&self.inputs)?;
        let to_stdout = self.stdout && jobs.len() == 1;
        if self.stdout && !to_stdout {
            tracing::warn!(
                "--stdout needs a single input; writing {} files under {}",
                jobs.len(),
                self.out.display()
            );
        }
        tracing::info!("obfuscating {} file(s) with seed 0x{:x}", jobs.len(), seed);

        let handles: Vec<_> = jobs
            .iter()
            .cloned()
            .map(|job| {
                let config = Arc::clone(&config);
                tokio::task::spawn_blocking(move || process(&job, &config))
            })
            .collect();

        let mut entries = Vec::new();
        let mut failed = Vec::new();
        let (mut total_original, mut total_obfuscated) = (0usize, 0usize);

        for (job, handle) in jobs.iter().zip(handles) {
            let label = job.relative.display().to_string();
            let outcome = match handle.await {
                Ok(outcome) => outcome,
                Err(join) => {
                    tracing::error!("{label}: task failed: {join}");
                    failed.push(label);
                    continue;
                }
            };
            let written = outcome.and_then(|result| {
                if to_stdout {
                    print!("{}", result.obfuscated_source);
                    return Ok(result);
                }
                let target = write_output(&self.out, job, &result)?;
                print_obfuscation_analysis(&label, &result);
                tracing::info!("wrote {}", target.display());
                Ok(result)
            });
            match written {
                Ok(result) => {
                    total_original += result.original_size;
                    total_obfuscated += result.obfuscated_size;
                    entries.push(create_report(&label, &result));
                }
                Err(e) => {
                    tracing::error!("{label}: {e}");
                    failed.push(label);
                }
            }
        }

        if let Some(path) = &self.emit {
            let report = json!({
                "seed": seed,
                "files": entries,
                "totals": {
                    "files": jobs.len(),
                    "succeeded": jobs.len() - failed.len(),
                    "failed": failed,
                    "original_bytes": total_original,
                    "obfuscated_bytes": total_obfuscated,
                    "size_delta_bytes": total_obfuscated as i64 - total_original as i64,
                },
            });
            fs::write(path, serde_json::to_string_pretty(&report)?)?;
            if !to_stdout {
                println!("📊 Wrote obfuscation report to {}", path.display());
            }
        }

        if failed.is_empty() {
            Ok(())
        } else {
            Err(format!(
                "{} of {} inputs produced no output: {}",
                failed.len(),
                jobs.len(),
                failed.join(", ")
            )
            .into())
        }
    }
}
