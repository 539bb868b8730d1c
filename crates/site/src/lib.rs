#![deny(missing_docs)]
//! goku site assembly.
//!
//! A page's markdown body goes through the transform channel once. Its
//! template is then resolved in a single pass: `{{& content }}` takes the
//! transformed body, `{{& component path }}` takes a component's rendered
//! fragment, and `{{& name }}` takes a front-matter value or theme slot.
//! Component scripts and styles are collected once per page and spliced into
//! the finished document.
//!
//! ```no_run
//! use goku_core::Page;
//! use goku_site::{PageAssembler, SiteConfig};
//! use std::path::Path;
//!
//! let config = SiteConfig::load(Path::new("goku.yaml"))?;
//! let assembler = PageAssembler::from_config(&config);
//! let page = Page::from_file(Path::new("pages/index.md"))?;
//! let doc = assembler.build(&page)?;
//! println!("{}", doc.html);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

/// Page assembly.
pub mod assembler;
/// Script and style collection and placement.
pub mod assets;
/// Parallel page builds.
pub mod batch;
mod cache;
/// Site configuration and theme slots.
pub mod config;
/// Error types.
pub mod error;
/// Final markup.
pub mod fragment;
/// Component loading and caching.
pub mod registry;
/// Directive resolution.
pub mod resolver;
/// Templates and the template store.
pub mod template;

pub use assembler::{CancelToken, FinalDocument, PageAssembler};
pub use assets::{Anchor, AssetCollector, AssetEntry, AssetSet, splice_assets};
pub use batch::{BatchOptions, BatchReport, BatchStats};
pub use config::{ConfigError, DEFAULT_MAX_DEPTH, SiteConfig, Theme, TransformConfig};
pub use error::{BuildError, PipelineError, Stage};
pub use fragment::Fragment;
pub use registry::{
    ComponentDefinition, ComponentExports, ComponentRegistry, ComponentSource, DirSource,
    MemorySource, Props, RenderFn,
};
pub use resolver::{ResolveError, Resolved, Resolver};
pub use template::{AnchorKind, Directive, Segment, Template, TemplateStore};
