use crate::registry::RenameRegistry;
use rand::{rngs::StdRng, SeedableRng};
use solcloak_core::source::SourceBuffer;
use solcloak_core::syntax::{SyntaxProvider, SyntaxTree};
use solcloak_utils::errors::TransformError;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// State threaded through the passes for one file.
///
/// The context owns the current buffer, the last structural description, the
/// run's single seeded generator and the file's rename registry. It is created
/// per input and dropped once the output is produced.
pub struct PipelineContext {
    label: String,
    buffer: SourceBuffer,
    syntax: Option<Arc<SyntaxTree>>,
    provider: Arc<dyn SyntaxProvider>,
    /// Every random decision of every pass is drawn from here, in pass order.
    pub rng: StdRng,
    pub registry: RenameRegistry,
}

impl PipelineContext {
    pub fn new(
        label: impl Into<String>,
        buffer: SourceBuffer,
        provider: Arc<dyn SyntaxProvider>,
        seed: u64,
    ) -> Self {
        Self {
            label: label.into(),
            buffer,
            syntax: None,
            provider,
            rng: StdRng::seed_from_u64(seed),
            registry: RenameRegistry::default(),
        }
    }

    #[must_use]
    pub fn with_registry(mut self, registry: RenameRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub const fn buffer(&self) -> &SourceBuffer {
        &self.buffer
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    /// Replaces the current buffer. The cached tree is kept but will no
    /// longer validate against the new buffer.
    pub fn set_buffer(&mut self, buffer: SourceBuffer) {
        self.buffer = buffer;
    }

    /// A structural description of exactly the current buffer.
    ///
    /// Re-parses whenever the cached tree was built from a different buffer.
    pub fn syntax(&mut self) -> Result<Arc<SyntaxTree>, TransformError> {
        if let Some(tree) = &self.syntax {
            if tree.is_valid_for(&self.buffer) {
                return Ok(Arc::clone(tree));
            }
        }
        debug!(
            "{}: parsing {} bytes with {} provider",
            self.label,
            self.buffer.len(),
            self.provider.name()
        );
        let tree = Arc::new(self.provider.parse(&self.buffer)?);
        self.syntax = Some(Arc::clone(&tree));
        Ok(tree)
    }

    /// Fails with [`TransformError::StaleSyntax`] unless `tree` describes the
    /// current buffer.
    pub fn ensure_fresh(&self, tree: &SyntaxTree) -> Result<(), TransformError> {
        if tree.is_valid_for(&self.buffer) {
            Ok(())
        } else {
            Err(TransformError::StaleSyntax)
        }
    }
}

impl fmt::Debug for PipelineContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineContext")
            .field("label", &self.label)
            .field("buffer", &self.buffer)
            .field("provider", &self.provider.name())
            .field("cached_syntax", &self.syntax.is_some())
            .field("aliases", &self.registry.len())
            .finish()
    }
}
