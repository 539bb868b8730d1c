//! Placeholder resolution: one left-to-right pass over a template, splicing
//! directive replacements in as final fragments.
//!
//! Nothing here runs the markdown transform. The page body arrives already
//! transformed, and component output, variables and theme slots are inserted
//! as they are. Only components flagged `nested` have their output scanned for
//! directives again, with an explicit depth counter. Directive syntax in the
//! output of any other component reaches the document untouched; a warning is
//! logged when that happens.

use crate::assets::{Anchor, AssetCollector};
use crate::config::Theme;
use crate::error::PipelineError;
use crate::fragment::Fragment;
use crate::registry::ComponentRegistry;
use crate::template::{DIRECTIVE_OPEN, Directive, Segment, Template};
use goku_core::Page;
use thiserror::Error;

/// Resolved text plus where the asset anchors ended up.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolved {
    /// Template text with every directive replaced.
    pub text: String,
    /// Offsets of `{{& styles }}` / `{{& scripts }}` inside `text`.
    pub anchors: Vec<Anchor>,
}

/// A directive that could not be resolved.
#[derive(Debug, Error)]
#[error("{directive}: {source}")]
pub struct ResolveError {
    /// The failing directive as written.
    pub directive: String,
    /// Why it failed.
    #[source]
    pub source: PipelineError,
}

/// What a template is resolved against.
struct Scope<'p> {
    page: &'p Page,
    body: &'p Fragment,
}

/// Resolves templates against one page.
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'a> {
    registry: &'a ComponentRegistry,
    theme: &'a Theme,
    max_depth: usize,
}

impl<'a> Resolver<'a> {
    /// A resolver using `registry` for components and `theme` for slots.
    pub fn new(registry: &'a ComponentRegistry, theme: &'a Theme, max_depth: usize) -> Self {
        Self {
            registry,
            theme,
            max_depth,
        }
    }

    /// Resolves `template` for `page`, whose markdown body was already
    /// transformed into `body`. Component assets go to `collector`.
    pub fn resolve(
        &self,
        template: &Template,
        page: &Page,
        body: &Fragment,
        collector: &mut AssetCollector,
    ) -> Result<Resolved, ResolveError> {
        let scope = Scope { page, body };
        let mut out = Resolved::default();
        self.resolve_into(template, &scope, collector, 0, &mut out)?;
        Ok(out)
    }

    fn resolve_into(
        &self,
        template: &Template,
        scope: &Scope<'_>,
        collector: &mut AssetCollector,
        depth: usize,
        out: &mut Resolved,
    ) -> Result<(), ResolveError> {
        for segment in template.segments() {
            match segment {
                Segment::Text(range) => out.text.push_str(template.slice(range)),
                Segment::Directive { directive, span } => {
                    let fail = |source| ResolveError {
                        directive: template.slice(span).to_string(),
                        source,
                    };
                    self.apply(directive, scope, collector, depth, out, fail)?;
                }
            }
        }
        Ok(())
    }

    fn apply(
        &self,
        directive: &Directive,
        scope: &Scope<'_>,
        collector: &mut AssetCollector,
        depth: usize,
        out: &mut Resolved,
        fail: impl Fn(PipelineError) -> ResolveError,
    ) -> Result<(), ResolveError> {
        match directive {
            Directive::Content => out.text.push_str(scope.body.as_str()),
            Directive::Lookup(name) => {
                if let Some(value) = scope.page.front_matter().text(name) {
                    out.text.push_str(&html_escape::encode_text(&value));
                } else if let Some(slot) = self.theme.slot(name) {
                    out.text.push_str(slot);
                }
            }
            Directive::Anchor(kind) => out.anchors.push(Anchor {
                kind: *kind,
                offset: out.text.len(),
            }),
            Directive::Component { path, props } => {
                let definition = self.registry.load(path).map_err(&fail)?;
                let rendered = Fragment::new(definition.render(props));
                collector.register_if_absent(definition.id(), definition.script(), definition.style());

                if !definition.is_nested() {
                    if rendered.as_str().contains(DIRECTIVE_OPEN) {
                        log::warn!(
                            "component {path} is not nested; directives in its output are left as written"
                        );
                    }
                    out.text.push_str(rendered.as_str());
                    return Ok(());
                }
                if depth >= self.max_depth {
                    return Err(fail(PipelineError::TemplateRecursionLimitExceeded {
                        id: path.clone(),
                        limit: self.max_depth,
                    }));
                }
                log::debug!("expanding nested component {path} at depth {}", depth + 1);
                let sub = Template::parse(path.as_str(), rendered.into_string()).map_err(&fail)?;
                self.resolve_into(&sub, scope, collector, depth + 1, out)?;
            }
        }
        Ok(())
    }
}
