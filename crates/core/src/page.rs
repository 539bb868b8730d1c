//! Page sources: front-matter plus a markdown body.

use crate::frontmatter::{FrontMatter, FrontmatterError, extract_frontmatter};
use std::path::Path;
use thiserror::Error;

/// Errors raised while reading or parsing a page source.
#[derive(Debug, Error)]
pub enum PageError {
    /// The source file could not be read.
    #[error("failed to read page {id}: {source}")]
    Io {
        /// Page identifier.
        id: String,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },
    /// The front-matter block is malformed.
    #[error("invalid front-matter in page {id}: {source}")]
    FrontMatter {
        /// Page identifier.
        id: String,
        /// Underlying front-matter error.
        #[source]
        source: FrontmatterError,
    },
}

/// One authored page, immutable once parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    id: String,
    front_matter: FrontMatter,
    body: String,
}

impl Page {
    /// Parses a page from its full source text.
    pub fn parse(id: impl Into<String>, source: &str) -> Result<Self, PageError> {
        let id = id.into();
        let extraction = match extract_frontmatter(source) {
            Ok(extraction) => extraction,
            Err(source) => return Err(PageError::FrontMatter { id, source }),
        };
        Ok(Self {
            body: source[extraction.body_start..].to_string(),
            front_matter: extraction.front_matter,
            id,
        })
    }

    /// Reads and parses a page source file; the path becomes the identifier.
    pub fn from_file(path: &Path) -> Result<Self, PageError> {
        let id = path.display().to_string();
        let source = match std::fs::read_to_string(path) {
            Ok(source) => source,
            Err(source) => return Err(PageError::Io { id, source }),
        };
        Self::parse(id, &source)
    }

    /// Builds a page from parts already split apart.
    pub fn from_parts(
        id: impl Into<String>,
        front_matter: FrontMatter,
        body: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            front_matter,
            body: body.into(),
        }
    }

    /// Page identifier (its source path).
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Parsed front-matter.
    pub fn front_matter(&self) -> &FrontMatter {
        &self.front_matter
    }

    /// Untransformed markdown body.
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Template reference from the front-matter.
    pub fn template(&self) -> Option<String> {
        self.front_matter.template()
    }
}
