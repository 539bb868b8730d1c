//! Where component modules come from.

use super::file::parse_component_file;
use super::types::ComponentExports;
use crate::error::PipelineError;
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

/// Resolves and evaluates component modules by identifier.
pub trait ComponentSource: Send + Sync {
    /// Read and evaluate the module for `id`.
    ///
    /// Fails with `ComponentNotFound` when nothing exists under `id`.
    fn load(&self, id: &str) -> Result<ComponentExports, PipelineError>;
}

/// Component files under a components root.
#[derive(Debug, Clone)]
pub struct DirSource {
    root: PathBuf,
}

impl DirSource {
    /// Components are resolved relative to `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The components root.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ComponentSource for DirSource {
    fn load(&self, id: &str) -> Result<ComponentExports, PipelineError> {
        let not_found = || PipelineError::ComponentNotFound { id: id.to_string() };
        let path = resolve_under_root(&self.root, id).ok_or_else(not_found)?;
        let source = std::fs::read_to_string(&path).map_err(|err| match err.kind() {
            std::io::ErrorKind::NotFound => not_found(),
            _ => PipelineError::load_error(id, err.to_string()),
        })?;
        parse_component_file(id, &source)
    }
}

/// Components registered in code.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    components: HashMap<String, ComponentExports>,
}

impl MemorySource {
    /// An empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `exports` under `id`, replacing any earlier entry.
    pub fn insert(&mut self, id: impl Into<String>, exports: ComponentExports) {
        self.components.insert(id.into(), exports);
    }

    /// Builder-style [`MemorySource::insert`].
    pub fn with(mut self, id: impl Into<String>, exports: ComponentExports) -> Self {
        self.insert(id, exports);
        self
    }
}

impl ComponentSource for MemorySource {
    fn load(&self, id: &str) -> Result<ComponentExports, PipelineError> {
        self.components
            .get(id)
            .cloned()
            .ok_or_else(|| PipelineError::ComponentNotFound { id: id.to_string() })
    }
}

/// Joins a relative identifier onto `root`.
///
/// Returns `None` for empty, absolute, or parent-escaping identifiers.
pub(crate) fn resolve_under_root(root: &Path, id: &str) -> Option<PathBuf> {
    let relative = Path::new(id.trim());
    let mut parts = relative.components().peekable();
    parts.peek()?;
    if parts.all(|part| matches!(part, Component::Normal(_) | Component::CurDir)) {
        Some(root.join(relative))
    } else {
        None
    }
}
