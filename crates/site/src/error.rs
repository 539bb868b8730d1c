use goku_core::{SourceLocation, TransformError};
use thiserror::Error;

/// Page-scoped failures raised anywhere in the assembly pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// No component exists under the identifier.
    #[error("component not found: {id}")]
    ComponentNotFound {
        /// Component identifier.
        id: String,
    },
    /// The component exists but its exports are unusable.
    #[error("component {id} failed to load: {reason}")]
    ComponentLoadError {
        /// Component identifier.
        id: String,
        /// Why the exports were rejected.
        reason: String,
    },
    /// Output overflow, input overflow, or an internal module failure.
    #[error(transparent)]
    Transform(#[from] TransformError),
    /// Nested component expansion went deeper than the configured ceiling.
    #[error("template recursion limit of {limit} exceeded while expanding component {id}")]
    TemplateRecursionLimitExceeded {
        /// Component whose expansion crossed the limit.
        id: String,
        /// Configured depth ceiling.
        limit: usize,
    },
    /// The page front-matter names no template.
    #[error("front-matter has no `template` reference")]
    MissingTemplateReference,
    /// No template exists under the identifier.
    #[error("template not found: {id}")]
    TemplateNotFound {
        /// Template identifier.
        id: String,
    },
    /// Directive syntax could not be parsed.
    #[error("syntax error in {id} at {location}: {message}")]
    TemplateSyntax {
        /// Template or component identifier.
        id: String,
        /// Where the bad directive starts.
        location: SourceLocation,
        /// Error message
        message: String,
    },
    /// Reading a template or component source failed.
    #[error("failed to read {id}: {source}")]
    Io {
        /// Identifier being read.
        id: String,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },
    /// Styles or scripts could not be injected into the resolved document.
    #[error("asset injection failed: {0}")]
    AssetInjection(String),
    /// The build was cancelled between stages.
    #[error("build cancelled")]
    Cancelled,
}

impl PipelineError {
    /// Create a load error for `id`.
    pub fn load_error(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ComponentLoadError {
            id: id.into(),
            reason: reason.into(),
        }
    }

    /// Create a syntax error located at `offset` inside `text`.
    pub fn syntax(id: &str, text: &str, offset: usize, message: impl Into<String>) -> Self {
        Self::TemplateSyntax {
            id: id.to_string(),
            location: SourceLocation::from_offset(text, offset),
            message: message.into(),
        }
    }
}

/// Pipeline stage a page build failed in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stage {
    /// Checking the front-matter for a template reference.
    Validate,
    /// Running the page body through the transform channel.
    Transform,
    /// Loading and parsing the template.
    LoadTemplate,
    /// Resolving a directive.
    Resolve {
        /// The directive text as written, e.g. `{{& component nav.html }}`.
        directive: String,
    },
    /// Splicing collected styles and scripts into the document.
    Splice,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Validate => write!(f, "validate"),
            Stage::Transform => write!(f, "transform"),
            Stage::LoadTemplate => write!(f, "load template"),
            Stage::Resolve { directive } => write!(f, "resolve `{directive}`"),
            Stage::Splice => write!(f, "splice assets"),
        }
    }
}

/// A failed page build: which page, which stage, and why.
#[derive(Debug, Error)]
#[error("page {page}: {stage} failed: {source}")]
pub struct BuildError {
    /// Page identifier.
    pub page: String,
    /// Stage that failed.
    pub stage: Stage,
    /// The underlying failure.
    #[source]
    pub source: PipelineError,
}

impl BuildError {
    /// Attach page and stage to a pipeline failure.
    pub fn new(page: impl Into<String>, stage: Stage, source: PipelineError) -> Self {
        Self {
            page: page.into(),
            stage,
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_error_names_page_stage_and_cause() {
        let err = BuildError::new(
            "pages/index.md",
            Stage::Resolve {
                directive: "{{& component nav.html }}".into(),
            },
            PipelineError::ComponentNotFound {
                id: "nav.html".into(),
            },
        );
        assert_eq!(
            err.to_string(),
            "page pages/index.md: resolve `{{& component nav.html }}` failed: component not found: nav.html"
        );
    }

    #[test]
    fn transform_errors_pass_through() {
        let err = PipelineError::from(TransformError::OutputOverflow {
            needed: 9,
            capacity: 8,
        });
        assert_eq!(
            err.to_string(),
            "transform output of 9 bytes exceeds output buffer capacity of 8 bytes"
        );
    }

    #[test]
    fn syntax_error_carries_location() {
        let err = PipelineError::syntax("t.html", "<p>\n{{& oops", 4, "unterminated directive");
        assert_eq!(
            err.to_string(),
            "syntax error in t.html at 2:1: unterminated directive"
        );
    }
}
