use super::Template;
use crate::cache::SingleFlight;
use crate::error::PipelineError;
use crate::registry::source::resolve_under_root;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

enum Origin {
    Dir(PathBuf),
    Memory(HashMap<String, String>),
}

/// Loads templates by identifier, parsing each at most once.
pub struct TemplateStore {
    origin: Origin,
    cache: SingleFlight<Template>,
}

impl TemplateStore {
    /// Templates are files under `root`.
    pub fn from_dir(root: impl Into<PathBuf>) -> Self {
        Self::with_origin(Origin::Dir(root.into()))
    }

    /// Templates are held in memory, keyed by identifier.
    pub fn from_map<I, K, V>(templates: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self::with_origin(Origin::Memory(
            templates
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        ))
    }

    fn with_origin(origin: Origin) -> Self {
        Self {
            origin,
            cache: SingleFlight::default(),
        }
    }

    /// The parsed template for `id`.
    ///
    /// Concurrent first requests for the same identifier share one read and
    /// parse. Failures are not cached.
    pub fn get(&self, id: &str) -> Result<Arc<Template>, PipelineError> {
        self.cache.get_or_try_load(id, || {
            log::debug!("loading template {id}");
            let text = self.read(id)?;
            Template::parse(id, text)
        })
    }

    /// Number of successfully loaded templates.
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    /// Whether no template has been loaded yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read(&self, id: &str) -> Result<String, PipelineError> {
        let not_found = || PipelineError::TemplateNotFound { id: id.to_string() };
        match &self.origin {
            Origin::Memory(map) => map.get(id).cloned().ok_or_else(not_found),
            Origin::Dir(root) => {
                let path = resolve_under_root(root, id).ok_or_else(not_found)?;
                std::fs::read_to_string(&path).map_err(|source| {
                    if source.kind() == std::io::ErrorKind::NotFound {
                        not_found()
                    } else {
                        PipelineError::Io {
                            id: id.to_string(),
                            source,
                        }
                    }
                })
            }
        }
    }
}

impl std::fmt::Debug for TemplateStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let origin = match &self.origin {
            Origin::Dir(root) => format!("dir({})", root.display()),
            Origin::Memory(map) => format!("memory({} templates)", map.len()),
        };
        f.debug_struct("TemplateStore")
            .field("origin", &origin)
            .field("loaded", &self.len())
            .finish()
    }
}
