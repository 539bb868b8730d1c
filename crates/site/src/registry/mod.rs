//! Component registry: loads each component once and hands out the cached
//! definition to every page build.

/// Single-file component parsing.
pub mod file;
/// Component sources (directory, in-memory).
pub mod source;
/// Component capability records.
pub mod types;

pub use source::{ComponentSource, DirSource, MemorySource};
pub use types::{ComponentDefinition, ComponentExports, Props, RenderFn};

use crate::cache::SingleFlight;
use crate::error::PipelineError;
use std::sync::Arc;

/// Shared cache of component definitions, created once per build run.
pub struct ComponentRegistry {
    source: Box<dyn ComponentSource>,
    cache: SingleFlight<ComponentDefinition>,
}

impl ComponentRegistry {
    /// A registry loading from `source`.
    pub fn new(source: impl ComponentSource + 'static) -> Self {
        Self {
            source: Box::new(source),
            cache: SingleFlight::default(),
        }
    }

    /// The definition for `id`, loading it on first use.
    ///
    /// The source is consulted at most once per identifier even when several
    /// page builds ask concurrently: later callers block on the in-flight load.
    /// A failed load leaves nothing behind and the next call tries again.
    pub fn load(&self, id: &str) -> Result<Arc<ComponentDefinition>, PipelineError> {
        self.cache.get_or_try_load(id, || {
            log::debug!("loading component {id}");
            let exports = self.source.load(id)?;
            ComponentDefinition::from_exports(id, exports)
        })
    }

    /// Render `id` with `props`.
    pub fn render(&self, id: &str, props: &Props) -> Result<String, PipelineError> {
        Ok(self.load(id)?.render(props))
    }

    /// Script text of `id`, if any.
    pub fn script_of(&self, id: &str) -> Result<Option<String>, PipelineError> {
        Ok(self.load(id)?.script().map(str::to_string))
    }

    /// Style text of `id`, if any.
    pub fn style_of(&self, id: &str) -> Result<Option<String>, PipelineError> {
        Ok(self.load(id)?.style().map(str::to_string))
    }

    /// Number of successfully loaded definitions.
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    /// Whether nothing has been loaded yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for ComponentRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentRegistry")
            .field("loaded", &self.len())
            .finish_non_exhaustive()
    }
}
