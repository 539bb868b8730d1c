//! Templates: page skeletons parsed into literal text and directives.

mod parse;
/// Template loading and caching.
pub mod store;

pub(crate) use parse::OPEN as DIRECTIVE_OPEN;
pub use store::TemplateStore;

use crate::error::PipelineError;
use crate::registry::Props;
use std::ops::Range;

/// Where collected component assets are placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnchorKind {
    /// `{{& styles }}`
    Styles,
    /// `{{& scripts }}`
    Scripts,
}

/// One placeholder occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// `{{& content }}`: the transformed page body.
    Content,
    /// `{{& component <path> key="value" }}`: a component's render output.
    Component {
        /// Component identifier relative to the components root.
        path: String,
        /// Props passed to render.
        props: Props,
    },
    /// `{{& <name> }}`: a front-matter variable, else a theme slot, else empty.
    Lookup(String),
    /// `{{& styles }}` or `{{& scripts }}`.
    Anchor(AnchorKind),
}

/// A run of template text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Literal text, as a byte range of the template.
    Text(Range<usize>),
    /// A directive and the byte range it occupied.
    Directive {
        /// Parsed directive.
        directive: Directive,
        /// Byte range of `{{& ... }}` in the template.
        span: Range<usize>,
    },
}

/// Parsed template text, shared read-only across pages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    id: String,
    text: String,
    segments: Vec<Segment>,
}

impl Template {
    /// Parses `text`; malformed directives fail with `TemplateSyntax`.
    pub fn parse(id: impl Into<String>, text: impl Into<String>) -> Result<Self, PipelineError> {
        let id = id.into();
        let text = text.into();
        let segments = parse::parse_segments(&id, &text)?;
        Ok(Self { id, text, segments })
    }

    /// Template identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Raw template text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Segments in source order.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Source text of a byte range.
    pub fn slice(&self, range: &Range<usize>) -> &str {
        &self.text[range.clone()]
    }

    /// Directives in source order.
    pub fn directives(&self) -> impl Iterator<Item = &Directive> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Directive { directive, .. } => Some(directive),
            Segment::Text(_) => None,
        })
    }
}
