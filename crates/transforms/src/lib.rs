//! Source-level obfuscation passes for Solidity.
//!
//! Every pass implements [`Transform`] and reads its input through a
//! [`PipelineContext`], which owns the current buffer, a syntax tree bound to
//! that exact buffer, the seeded generator and the per-file
//! [`registry::RenameRegistry`]. Passes never mutate the buffer in place:
//! they return a [`PassResult`] built from one non-overlapping
//! [`EditSet`](solcloak_core::edit::EditSet), and the [`pass`] engine decides
//! whether it replaces the previous buffer.
//!
//! The passes are [`dead_code`], [`control_flow`], [`string_literal`],
//! [`rename`] and [`arithmetic`]. [`obfuscator`] runs them over whole files
//! and holds the presets.

pub mod arithmetic;
pub mod bitwise;
pub mod context;
pub mod control_flow;
pub mod dead_code;
pub mod obfuscator;
pub mod pass;
pub mod registry;
pub mod rename;
pub mod string_literal;
pub mod templates;

pub use context::PipelineContext;

use indexmap::IndexMap;
use rand::Rng;
use serde::{Deserialize, Serialize};
use solcloak_core::edit::EditSet;
use solcloak_core::source::SourceBuffer;
use solcloak_utils::errors::TransformError;

/// Trait for Solidity source obfuscation passes.
pub trait Transform: Send + Sync {
    /// Returns the transform's name for logging and identification.
    fn name(&self) -> &'static str;
    /// Runs the pass over the context's current buffer.
    ///
    /// The pass must not touch the context's buffer itself; the pipeline decides whether the
    /// returned buffer replaces it.
    fn apply(&self, ctx: &mut PipelineContext) -> Result<PassResult, TransformError>;
}

/// Configuration shared by every pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PassConfig {
    /// Probability in `[0.0, 1.0]` that an eligible candidate is transformed.
    pub density: f64,
}

impl Default for PassConfig {
    fn default() -> Self {
        Self { density: 1.0 }
    }
}

impl PassConfig {
    pub const fn new(density: f64) -> Self {
        Self { density }
    }

    /// Rejects densities outside `[0.0, 1.0]`, NaN included.
    pub fn validate(&self) -> Result<(), TransformError> {
        if (0.0..=1.0).contains(&self.density) {
            Ok(())
        } else {
            Err(TransformError::InvalidConfig(format!(
                "density {} is outside [0.0, 1.0]",
                self.density
            )))
        }
    }

    /// Draws the per-candidate decision. A density of zero never selects.
    pub fn select<R: Rng + ?Sized>(&self, rng: &mut R) -> bool {
        if self.density <= 0.0 || self.density.is_nan() {
            return false;
        }
        rng.random::<f64>() < self.density
    }
}

/// Outcome of one pass invocation.
#[derive(Debug, Clone)]
pub struct PassResult {
    pub buffer: SourceBuffer,
    pub changed: bool,
    pub stats: IndexMap<String, u64>,
}

impl PassResult {
    /// The input buffer handed back untouched.
    pub fn unchanged(buffer: &SourceBuffer, stats: IndexMap<String, u64>) -> Self {
        Self {
            buffer: buffer.clone(),
            changed: false,
            stats,
        }
    }

    /// Applies `edits` to `buffer`. An empty set yields an unchanged result.
    pub fn from_edits(
        buffer: &SourceBuffer,
        edits: &EditSet,
        stats: IndexMap<String, u64>,
    ) -> Result<Self, TransformError> {
        if edits.is_empty() {
            return Ok(Self::unchanged(buffer, stats));
        }
        let text = edits.apply(buffer.as_str())?;
        let changed = text != buffer.as_str();
        Ok(Self {
            buffer: SourceBuffer::new(text),
            changed,
            stats,
        })
    }
}

/// Ordered counters a pass reports, all starting at zero.
pub(crate) fn stats<const N: usize>(keys: [&str; N]) -> IndexMap<String, u64> {
    keys.into_iter().map(|k| (k.to_string(), 0)).collect()
}

pub(crate) fn bump(stats: &mut IndexMap<String, u64>, key: &str) {
    *stats.entry(key.to_string()).or_insert(0) += 1;
}
