use crate::arithmetic::{ArithmeticConfig, ArithmeticEncoding};
use crate::control_flow::ControlFlowWrapping;
use crate::dead_code::DeadCodeInjection;
use crate::pass::{self, PassOutcome};
use crate::registry::{RenameConfig, RenameRegistry};
use crate::rename::IdentifierRenaming;
use crate::string_literal::{StringConcat, StringLiteralEncoding};
use crate::{PassConfig, PipelineContext, Transform};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::json;
use solcloak_core::source::SourceBuffer;
use solcloak_core::syntax::{NativeParser, SyntaxProvider};
use solcloak_utils::errors::ObfuscateError;
use std::sync::Arc;

/// Configuration for the obfuscation pipeline
pub struct ObfuscationConfig {
    /// Random seed for deterministic obfuscation; drawn at random when absent
    pub seed: Option<u64>,
    /// Passes to run, in order
    pub transforms: Vec<Box<dyn Transform>>,
    /// Source of structural descriptions
    pub provider: Arc<dyn SyntaxProvider>,
    /// Names never renamed, on top of the reserved set
    pub preserve: Vec<String>,
}

impl Default for ObfuscationConfig {
    fn default() -> Self {
        Self {
            seed: None,
            transforms: Vec::new(),
            provider: Arc::new(NativeParser),
            preserve: Vec::new(),
        }
    }
}

impl std::fmt::Debug for ObfuscationConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObfuscationConfig")
            .field("seed", &self.seed)
            .field(
                "transforms",
                &self.transforms.iter().map(|t| t.name()).collect::<Vec<_>>(),
            )
            .field("provider", &self.provider.name())
            .field("preserve", &self.preserve)
            .finish()
    }
}

/// Result of the obfuscation pipeline for one file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObfuscationResult {
    /// The transformed source text
    pub obfuscated_source: String,
    /// Original size in bytes
    pub original_size: usize,
    /// Obfuscated size in bytes
    pub obfuscated_size: usize,
    /// Size increase as percentage
    pub size_increase_percentage: f64,
    /// What each pass did, in execution order
    pub passes: Vec<PassOutcome>,
    /// Original name to alias, in issue order
    pub aliases: IndexMap<String, String>,
    /// Metadata about the obfuscation process
    pub metadata: ObfuscationMetadata,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObfuscationMetadata {
    /// Names of passes whose output was kept
    pub transforms_applied: Vec<String>,
    /// Seed used for the obfuscation
    pub seed_used: u64,
    /// Keccak-256 of the input, hex
    pub input_fingerprint: String,
    /// Keccak-256 of the output, hex
    pub output_fingerprint: String,
    pub timestamp: DateTime<Utc>,
}

impl ObfuscationConfig {
    /// The configured seed, or a fresh random one.
    pub fn resolve_seed(&self) -> u64 {
        self.seed.unwrap_or_else(rand::random)
    }
}

/// Runs one file through a fresh context and rename registry.
///
/// Only a fatal contract violation fails the call; pass failures are recorded
/// in [`ObfuscationResult::passes`].
pub fn obfuscate_source(
    label: &str,
    source: &str,
    config: &ObfuscationConfig,
) -> Result<ObfuscationResult, ObfuscateError> {
    // Step 1: Set up the per-file context
    let seed = config.resolve_seed();
    let input = SourceBuffer::new(source);
    let original_size = input.len();
    let input_fingerprint = input.fingerprint_hex();

    tracing::debug!("Starting obfuscation pipeline for {}:", label);
    tracing::debug!("  Input size: {} bytes", original_size);
    tracing::debug!("  Seed: 0x{:x}", seed);
    tracing::debug!("  Provider: {}", config.provider.name());
    tracing::debug!(
        "  Passes: {:?}",
        config.transforms.iter().map(|t| t.name()).collect::<Vec<_>>()
    );

    let registry = RenameRegistry::new(&RenameConfig {
        preserve: config.preserve.clone(),
        ..RenameConfig::default()
    });
    let mut ctx = PipelineContext::new(label, input, Arc::clone(&config.provider), seed)
        .with_registry(registry);

    // Step 2: Run the passes
    let report = pass::run(&mut ctx, &config.transforms)?;

    // Step 3: Collect metrics
    let output = ctx.buffer().clone();
    let obfuscated_size = output.len();
    let size_increase_percentage = if original_size > 0 {
        ((obfuscated_size as f64 - original_size as f64) / original_size as f64) * 100.0
    } else {
        0.0
    };

    tracing::debug!("Pipeline summary for {}:", label);
    for outcome in &report.outcomes {
        tracing::debug!(
            "  {}: changed={}, accepted={}, {:?}",
            outcome.name,
            outcome.changed,
            outcome.accepted,
            outcome.stats
        );
    }
    if !report.changed() && !config.transforms.is_empty() {
        tracing::warn!("{}: no pass changed the source", label);
    }

    Ok(ObfuscationResult {
        obfuscated_source: output.as_str().to_string(),
        original_size,
        obfuscated_size,
        size_increase_percentage,
        aliases: ctx.registry.aliases().clone(),
        metadata: ObfuscationMetadata {
            transforms_applied: report.applied(),
            seed_used: seed,
            input_fingerprint,
            output_fingerprint: output.fingerprint_hex(),
            timestamp: Utc::now(),
        },
        passes: report.outcomes,
    })
}

/// Prints detailed analysis of the obfuscation process
pub fn print_obfuscation_analysis(label: &str, result: &ObfuscationResult) {
    println!("Transform Analysis: {label}");
    println!("Original size: {} bytes", result.original_size);
    for outcome in &result.passes {
        let mark = match (&outcome.error, outcome.accepted) {
            (Some(_), _) => "failed",
            (None, true) => "applied",
            (None, false) if outcome.changed => "rejected",
            (None, false) => "unchanged",
        };
        let counts = outcome
            .stats
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(", ");
        println!("  {:<22} {:<9} {}", outcome.name, mark, counts);
        if let Some(error) = &outcome.error {
            println!("    → {error}");
        }
    }
    if !result.aliases.is_empty() {
        println!("Identifiers renamed: {}", result.aliases.len());
    }

    println!("✅ Obfuscation complete (seed 0x{:x})", result.metadata.seed_used);
    println!(
        "📈 Size change: {} → {} bytes ({:+.1}%)",
        result.original_size, result.obfuscated_size, result.size_increase_percentage
    );
    println!();
}

/// Creates the JSON report entry for one file
pub fn create_report(label: &str, result: &ObfuscationResult) -> serde_json::Value {
    json!({
        "file": label,
        "original_bytes": result.original_size,
        "obfuscated_bytes": result.obfuscated_size,
        "size_delta_bytes": (result.obfuscated_size as i64 - result.original_size as i64),
        "percent_size": result.size_increase_percentage,
        "passes": result.passes,
        "aliases": result.aliases,
        "transforms_applied": result.metadata.transforms_applied,
        "seed_used": result.metadata.seed_used,
        "input_fingerprint": result.metadata.input_fingerprint,
        "output_fingerprint": result.metadata.output_fingerprint,
        "timestamp": result.metadata.timestamp.to_rfc3339(),
    })
}

/// Convenience function to create common transform configurations
pub mod presets {
    use super::*;

    /// Every pass, with the command-line default densities
    pub fn default_obfuscation(seed: Option<u64>) -> ObfuscationConfig {
        ObfuscationConfig {
            seed,
            transforms: vec![
                Box::new(DeadCodeInjection::new(PassConfig::new(0.3))),
                Box::new(ControlFlowWrapping::new(PassConfig::new(0.5))),
                Box::new(StringLiteralEncoding::new(
                    PassConfig::default(),
                    StringConcat::default(),
                )),
                Box::new(IdentifierRenaming::default()),
                Box::new(ArithmeticEncoding::new(
                    PassConfig::default(),
                    ArithmeticConfig::default(),
                )),
            ],
            ..ObfuscationConfig::default()
        }
    }

    /// Light obfuscation (renaming and literals only)
    pub fn light_obfuscation(seed: Option<u64>) -> ObfuscationConfig {
        ObfuscationConfig {
            seed,
            transforms: vec![
                Box::new(StringLiteralEncoding::new(
                    PassConfig::default(),
                    StringConcat::default(),
                )),
                Box::new(IdentifierRenaming::default()),
            ],
            ..ObfuscationConfig::default()
        }
    }

    /// Custom obfuscation with specific intensity
    ///
    /// Densities scale with `intensity`; arithmetic encoding is only added
    /// above 0.7.
    pub fn custom_obfuscation(seed: Option<u64>, intensity: f64) -> ObfuscationConfig {
        let intensity = if intensity.is_nan() {
            0.0
        } else {
            intensity.clamp(0.0, 1.0)
        };
        let mut transforms: Vec<Box<dyn Transform>> = vec![
            Box::new(DeadCodeInjection::new(PassConfig::new(intensity * 0.6))),
            Box::new(ControlFlowWrapping::new(PassConfig::new(intensity))),
            Box::new(StringLiteralEncoding::new(
                PassConfig::new(intensity),
                StringConcat::default(),
            )),
            Box::new(IdentifierRenaming::new(
                PassConfig::new(intensity),
                RenameConfig::default(),
            )),
        ];
        if intensity > 0.7 {
            transforms.push(Box::new(ArithmeticEncoding::new(
                PassConfig::new(intensity),
                ArithmeticConfig::default(),
            )));
        }
        ObfuscationConfig {
            seed,
            transforms,
            ..ObfuscationConfig::default()
        }
    }
}
