#![deny(missing_docs)]
//! goku core: front-matter extraction, page sources, and the bounded-buffer
//! transform channel that turns markdown bodies into HTML fragments.

/// Transform channel, buffers, and the markdown module.
pub mod channel;
/// Core error types and source locations.
pub mod error;
/// YAML front-matter extraction.
pub mod frontmatter;
/// Page sources.
pub mod page;

pub use channel::buffer::{InputBuffer, OutputBuffer, decode_terminated, write_output};
pub use channel::markdown::{MarkdownModule, MarkdownOptions};
pub use channel::{BufferCapacities, DEFAULT_BUFFER_CAPACITY, TransformChannel, TransformModule};
pub use error::{SourceLocation, TransformError};
pub use frontmatter::{
    FrontMatter, FrontmatterError, FrontmatterExtraction, TEMPLATE_KEY, extract_frontmatter,
};
pub use page::{Page, PageError};
