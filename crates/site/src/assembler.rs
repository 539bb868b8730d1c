//! Page assembly: transform the body, resolve the template, splice assets.

use crate::assets::{AssetCollector, AssetSet, splice_assets};
use crate::config::{SiteConfig, Theme};
use crate::error::{BuildError, PipelineError, Stage};
use crate::fragment::Fragment;
use crate::registry::{ComponentRegistry, DirSource};
use crate::resolver::Resolver;
use crate::template::TemplateStore;
use goku_core::{MarkdownModule, Page, TransformChannel};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// One finished page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalDocument {
    /// Page identifier.
    pub page: String,
    /// Template the page was built with.
    pub template: String,
    /// The complete document text.
    pub html: String,
    /// Component assets placed in `html`.
    pub assets: AssetSet,
}

/// Cooperative cancellation flag, checked between stages.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// A token that is not cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask every build holding this token to stop at its next stage boundary.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Builds pages against shared caches.
///
/// Cheap to share across threads: every page build gets its own asset
/// collector, and the caches only ever grow through their single-flight loads.
#[derive(Debug, Clone)]
pub struct PageAssembler {
    channel: Arc<TransformChannel>,
    registry: Arc<ComponentRegistry>,
    templates: Arc<TemplateStore>,
    theme: Arc<Theme>,
    max_depth: usize,
}

impl PageAssembler {
    /// An assembler over explicitly provided collaborators.
    pub fn new(
        channel: Arc<TransformChannel>,
        registry: Arc<ComponentRegistry>,
        templates: Arc<TemplateStore>,
        theme: Arc<Theme>,
    ) -> Self {
        Self {
            channel,
            registry,
            templates,
            theme,
            max_depth: crate::config::DEFAULT_MAX_DEPTH,
        }
    }

    /// An assembler reading components and templates from the configured
    /// directories and transforming bodies with the markdown module.
    pub fn from_config(config: &SiteConfig) -> Self {
        let channel = TransformChannel::new(
            MarkdownModule::new(config.transform.markdown()),
            config.transform.capacities(),
        );
        Self::new(
            Arc::new(channel),
            Arc::new(ComponentRegistry::new(DirSource::new(&config.components_root))),
            Arc::new(TemplateStore::from_dir(&config.templates_root)),
            Arc::new(config.theme.clone()),
        )
        .with_max_depth(config.max_depth)
    }

    /// Override the nested component depth ceiling.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// The shared component registry.
    pub fn registry(&self) -> &ComponentRegistry {
        &self.registry
    }

    /// The shared template store.
    pub fn templates(&self) -> &TemplateStore {
        &self.templates
    }

    /// Build `page` with the template its front-matter names.
    pub fn build(&self, page: &Page) -> Result<FinalDocument, BuildError> {
        self.build_cancellable(page, &CancelToken::new())
    }

    /// Build `page` with an explicitly chosen template.
    ///
    /// The front-matter must still carry a template reference.
    pub fn build_with_template(
        &self,
        page: &Page,
        template_id: &str,
    ) -> Result<FinalDocument, BuildError> {
        self.run(page, Some(template_id), &CancelToken::new())
    }

    /// Like [`PageAssembler::build`], stopping early once `cancel` is set.
    pub fn build_cancellable(
        &self,
        page: &Page,
        cancel: &CancelToken,
    ) -> Result<FinalDocument, BuildError> {
        self.run(page, None, cancel)
    }

    fn run(
        &self,
        page: &Page,
        template_override: Option<&str>,
        cancel: &CancelToken,
    ) -> Result<FinalDocument, BuildError> {
        let fail = |stage: Stage, source: PipelineError| BuildError::new(page.id(), stage, source);
        let checkpoint = |stage: Stage| {
            if cancel.is_cancelled() {
                log::debug!("{}: cancelled before {stage}", page.id());
                Err(fail(stage, PipelineError::Cancelled))
            } else {
                Ok(())
            }
        };

        let Some(referenced) = page.template() else {
            return Err(fail(Stage::Validate, PipelineError::MissingTemplateReference));
        };
        let template_id = template_override.map_or(referenced, str::to_string);

        checkpoint(Stage::Transform)?;
        let body = self
            .channel
            .transform(page.body())
            .map(Fragment::new)
            .map_err(|err| fail(Stage::Transform, err.into()))?;

        checkpoint(Stage::LoadTemplate)?;
        let template = self
            .templates
            .get(&template_id)
            .map_err(|err| fail(Stage::LoadTemplate, err))?;

        let mut collector = AssetCollector::new();
        let resolved = Resolver::new(&self.registry, &self.theme, self.max_depth)
            .resolve(&template, page, &body, &mut collector)
            .map_err(|err| {
                fail(
                    Stage::Resolve {
                        directive: err.directive,
                    },
                    err.source,
                )
            })?;
        let assets = collector.drain();

        checkpoint(Stage::Splice)?;
        let html = splice_assets(resolved.text, &resolved.anchors, &assets)
            .map_err(|err| fail(Stage::Splice, err))?;

        log::debug!(
            "{}: built with {} ({} asset contributors)",
            page.id(),
            template_id,
            assets.len()
        );
        Ok(FinalDocument {
            page: page.id().to_string(),
            template: template_id,
            html,
            assets,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{ComponentExports, MemorySource};
    use goku_core::{BufferCapacities, TransformError};

    fn assembler(templates: &[(&str, &str)], components: MemorySource) -> PageAssembler {
        PageAssembler::new(
            Arc::new(TransformChannel::new(
                MarkdownModule::default(),
                BufferCapacities::default(),
            )),
            Arc::new(ComponentRegistry::new(components)),
            Arc::new(TemplateStore::from_map(templates.iter().copied())),
            Arc::new(Theme::default()),
        )
    }

    fn page(source: &str) -> Page {
        Page::parse("pages/index.md", source).unwrap()
    }

    #[test]
    fn missing_template_reference_fails_validation() {
        let err = assembler(&[], MemorySource::new())
            .build(&page("---\ntitle: x\n---\n# Hi"))
            .unwrap_err();
        assert_eq!(err.page, "pages/index.md");
        assert_eq!(err.stage, Stage::Validate);
        assert!(matches!(err.source, PipelineError::MissingTemplateReference));
    }

    #[test]
    fn unknown_template_fails_loading() {
        let err = assembler(&[], MemorySource::new())
            .build(&page("---\ntemplate: gone.html\n---\n"))
            .unwrap_err();
        assert_eq!(err.stage, Stage::LoadTemplate);
        assert!(matches!(err.source, PipelineError::TemplateNotFound { .. }));
    }

    #[test]
    fn explicit_template_overrides_front_matter() {
        let doc = assembler(
            &[("a.html", "A{{& content }}"), ("b.html", "B{{& content }}")],
            MemorySource::new(),
        )
        .build_with_template(&page("---\ntemplate: a.html\n---\ntext"), "b.html")
        .unwrap();
        assert_eq!(doc.template, "b.html");
        assert_eq!(doc.html, "B<p>text</p>");
    }

    #[test]
    fn transform_overflow_is_reported_at_transform_stage() {
        let assembler = PageAssembler::new(
            Arc::new(TransformChannel::new(
                MarkdownModule::default(),
                BufferCapacities {
                    input: 1024,
                    output: 8,
                },
            )),
            Arc::new(ComponentRegistry::new(MemorySource::new())),
            Arc::new(TemplateStore::from_map([("t.html", "{{& content }}")])),
            Arc::new(Theme::default()),
        );
        let err = assembler
            .build(&page("---\ntemplate: t.html\n---\nA paragraph that is far too long"))
            .unwrap_err();
        assert_eq!(err.stage, Stage::Transform);
        assert!(matches!(
            err.source,
            PipelineError::Transform(TransformError::OutputOverflow { capacity: 8, .. })
        ));
    }

    #[test]
    fn cancelled_build_stops_before_transform() {
        let assembler = assembler(&[("t.html", "{{& content }}")], MemorySource::new());
        let cancel = CancelToken::new();
        cancel.cancel();
        let err = assembler
            .build_cancellable(&page("---\ntemplate: t.html\n---\n# Hi"), &cancel)
            .unwrap_err();
        assert_eq!(err.stage, Stage::Transform);
        assert!(matches!(err.source, PipelineError::Cancelled));
        assert!(assembler.templates().is_empty());
    }

    #[test]
    fn resolve_failure_names_directive() {
        let err = assembler(
            &[("t.html", "<main>{{& component ghost.html }}</main>")],
            MemorySource::new(),
        )
        .build(&page("---\ntemplate: t.html\n---\n"))
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "page pages/index.md: resolve `{{& component ghost.html }}` failed: component not found: ghost.html"
        );
    }

    #[test]
    fn failed_page_leaves_loaded_components_usable() {
        let assembler = assembler(
            &[
                ("good.html", "{{& component ok.js }}"),
                ("bad.html", "{{& component ok.js }}{{& component ghost.js }}"),
            ],
            MemorySource::new().with("ok.js", ComponentExports::markup("<ok/>").with_script("ok()")),
        );
        assert!(assembler.build(&page("---\ntemplate: bad.html\n---\n")).is_err());
        let doc = assembler.build(&page("---\ntemplate: good.html\n---\n")).unwrap();
        assert_eq!(
            doc.html,
            "<ok/><script data-component=\"ok.js\">ok()</script>"
        );
        assert_eq!(assembler.registry().len(), 1);
    }
}
