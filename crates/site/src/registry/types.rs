//! Component capability records.

use crate::error::PipelineError;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Props passed to a component's render operation.
pub type Props = BTreeMap<String, String>;

/// Render operation of a component.
pub type RenderFn = Arc<dyn Fn(&Props) -> String + Send + Sync>;

/// What a component module exposes, before validation.
///
/// Sources produce this record; the registry checks it once at load time and
/// turns it into a [`ComponentDefinition`].
#[derive(Clone, Default)]
pub struct ComponentExports {
    /// Render operation. Mandatory for a loadable component.
    pub render: Option<RenderFn>,
    /// Script text contributed once per page.
    pub script: Option<String>,
    /// Style text contributed once per page.
    pub style: Option<String>,
    /// Render output is itself template text and gets resolved again.
    pub nested: bool,
}

impl ComponentExports {
    /// Exports with only a render operation.
    pub fn render<F>(render: F) -> Self
    where
        F: Fn(&Props) -> String + Send + Sync + 'static,
    {
        Self {
            render: Some(Arc::new(render)),
            ..Self::default()
        }
    }

    /// Exports that always render the same markup.
    pub fn markup(markup: impl Into<String>) -> Self {
        let markup = markup.into();
        Self::render(move |_| markup.clone())
    }

    /// Add script text.
    pub fn with_script(mut self, script: impl Into<String>) -> Self {
        self.script = Some(script.into());
        self
    }

    /// Add style text.
    pub fn with_style(mut self, style: impl Into<String>) -> Self {
        self.style = Some(style.into());
        self
    }

    /// Mark the render output as a sub-template.
    pub fn nested(mut self) -> Self {
        self.nested = true;
        self
    }
}

impl std::fmt::Debug for ComponentExports {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentExports")
            .field("has_render", &self.render.is_some())
            .field("script", &self.script)
            .field("style", &self.style)
            .field("nested", &self.nested)
            .finish()
    }
}

/// A validated, cached component.
pub struct ComponentDefinition {
    id: String,
    render: RenderFn,
    script: Option<String>,
    style: Option<String>,
    nested: bool,
}

impl ComponentDefinition {
    /// Validates `exports`; a missing render fails with `ComponentLoadError`.
    pub fn from_exports(id: &str, exports: ComponentExports) -> Result<Self, PipelineError> {
        let Some(render) = exports.render else {
            return Err(PipelineError::load_error(id, "component exports no render operation"));
        };
        Ok(Self {
            id: id.to_string(),
            render,
            script: exports.script,
            style: exports.style,
            nested: exports.nested,
        })
    }

    /// Component identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Invoke render. Results are never cached.
    pub fn render(&self, props: &Props) -> String {
        (self.render)(props)
    }

    /// Script text, if the component has one.
    pub fn script(&self) -> Option<&str> {
        self.script.as_deref()
    }

    /// Style text, if the component has one.
    pub fn style(&self) -> Option<&str> {
        self.style.as_deref()
    }

    /// Whether render output is resolved again as a sub-template.
    pub fn is_nested(&self) -> bool {
        self.nested
    }
}

impl std::fmt::Debug for ComponentDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentDefinition")
            .field("id", &self.id)
            .field("has_script", &self.script.is_some())
            .field("has_style", &self.style.is_some())
            .field("nested", &self.nested)
            .finish_non_exhaustive()
    }
}
