use crate::{PipelineContext, Transform};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use solcloak_analysis::metrics::{balance_preserved, collect_metrics, compare};
use solcloak_utils::errors::TransformError;
use tracing::{error, info, warn};

/// What happened to the buffer during one pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassOutcome {
    pub name: String,
    /// The pass produced a different buffer.
    pub changed: bool,
    /// The produced buffer replaced the previous one.
    pub accepted: bool,
    pub stats: IndexMap<String, u64>,
    /// Recoverable failure reported by the pass, if any.
    pub error: Option<String>,
    pub size_before: usize,
    pub size_after: usize,
}

/// Per-pass outcomes of one file's pipeline run, in execution order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineReport {
    pub outcomes: Vec<PassOutcome>,
}

impl PipelineReport {
    /// Whether any pass's output was kept.
    pub fn changed(&self) -> bool {
        self.outcomes.iter().any(|o| o.accepted)
    }

    /// Names of the passes whose output was kept.
    pub fn applied(&self) -> Vec<String> {
        self.outcomes
            .iter()
            .filter(|o| o.accepted)
            .map(|o| o.name.clone())
            .collect()
    }
}

/// Trait for running an ordered sequence of passes over one file's context.
pub trait Pipeline {
    fn run(
        &self,
        ctx: &mut PipelineContext,
        passes: &[Box<dyn Transform>],
    ) -> Result<PipelineReport, TransformError>;
}

/// Default implementation of the Pipeline trait.
///
/// Each pass sees the previous pass's accepted buffer. A pass error is recorded and the buffer
/// from before that pass is kept; only a fatal contract violation stops the run.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultPipeline;

impl Pipeline for DefaultPipeline {
    fn run(
        &self,
        ctx: &mut PipelineContext,
        passes: &[Box<dyn Transform>],
    ) -> Result<PipelineReport, TransformError> {
        let mut report = PipelineReport::default();

        for pass in passes {
            let before = collect_metrics(ctx.buffer().as_str());
            let mut outcome = PassOutcome {
                name: pass.name().to_string(),
                changed: false,
                accepted: false,
                stats: IndexMap::new(),
                error: None,
                size_before: before.byte_len,
                size_after: before.byte_len,
            };

            match pass.apply(ctx) {
                Ok(result) => {
                    outcome.stats = result.stats;
                    outcome.changed = result.changed;
                    if result.changed {
                        let after = collect_metrics(result.buffer.as_str());
                        let delta = compare(&before, &after);
                        let keep = balance_preserved(&before, &after);
                        info!(
                            "{:>22} Δ{:+.2} {}",
                            pass.name(),
                            delta,
                            if keep { "✓" } else { "×" }
                        );
                        if keep {
                            outcome.accepted = true;
                            outcome.size_after = after.byte_len;
                            ctx.set_buffer(result.buffer);
                        } else {
                            warn!(
                                "{}: {} output unbalances delimiters, keeping previous buffer",
                                ctx.label(),
                                pass.name()
                            );
                        }
                    } else {
                        info!("{:>22} Δ{:+.2} {}", pass.name(), 0.0, "·");
                    }
                }
                Err(e) if e.is_fatal() => {
                    error!("{}: {} aborted the pipeline: {}", ctx.label(), pass.name(), e);
                    return Err(e);
                }
                Err(e) => {
                    warn!("{}: {} failed: {}", ctx.label(), pass.name(), e);
                    info!("{:>22} Δ{:+.2} {}", pass.name(), 0.0, "×");
                    outcome.error = Some(e.to_string());
                }
            }

            report.outcomes.push(outcome);
        }
        Ok(report)
    }
}

/// Convenience function to run the default pipeline.
pub fn run(
    ctx: &mut PipelineContext,
    passes: &[Box<dyn Transform>],
) -> Result<PipelineReport, TransformError> {
    DefaultPipeline.run(ctx, passes)
}
