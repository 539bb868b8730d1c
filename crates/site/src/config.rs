//! Site configuration and the theme's named slots.

use goku_core::{BufferCapacities, DEFAULT_BUFFER_CAPACITY, MarkdownOptions};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default ceiling for nested component expansion.
pub const DEFAULT_MAX_DEPTH: usize = 16;

/// Errors raised while loading a site configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config {path}: {source}")]
    Io {
        /// Config file path.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },
    /// The configuration is not valid YAML for this schema.
    #[error("invalid config: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// Site-wide configuration, usually read from `goku.yaml`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct SiteConfig {
    /// Directory component identifiers are resolved against.
    pub components_root: PathBuf,
    /// Directory template identifiers are resolved against.
    pub templates_root: PathBuf,
    /// Active theme.
    pub theme: Theme,
    /// Transform channel settings.
    pub transform: TransformConfig,
    /// Ceiling for nested component expansion.
    pub max_depth: usize,
    /// Worker threads for batch builds; rayon's default when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_threads: Option<usize>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            components_root: PathBuf::from("components"),
            templates_root: PathBuf::from("templates"),
            theme: Theme::default(),
            transform: TransformConfig::default(),
            max_depth: DEFAULT_MAX_DEPTH,
            max_threads: None,
        }
    }
}

impl SiteConfig {
    /// Parse a configuration from YAML text.
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(text)?)
    }

    /// Read a configuration file; relative roots resolve against its directory.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_yaml_str(&text)?;
        if let Some(base) = path.parent() {
            config.rebase(base);
        }
        Ok(config)
    }

    /// Make relative roots relative to `base`.
    pub fn rebase(&mut self, base: &Path) {
        if self.components_root.is_relative() {
            self.components_root = base.join(&self.components_root);
        }
        if self.templates_root.is_relative() {
            self.templates_root = base.join(&self.templates_root);
        }
    }
}

/// Transform channel buffer sizes and markdown options.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct TransformConfig {
    /// Input buffer capacity in bytes.
    pub input_capacity: usize,
    /// Output buffer capacity in bytes.
    pub output_capacity: usize,
    /// Pass raw HTML in page bodies through unescaped.
    pub allow_raw_html: bool,
    /// Enable GitHub Flavored Markdown.
    pub gfm: bool,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            input_capacity: DEFAULT_BUFFER_CAPACITY,
            output_capacity: DEFAULT_BUFFER_CAPACITY,
            allow_raw_html: false,
            gfm: true,
        }
    }
}

impl TransformConfig {
    /// Buffer capacities for the channel.
    pub fn capacities(&self) -> BufferCapacities {
        BufferCapacities {
            input: self.input_capacity,
            output: self.output_capacity,
        }
    }

    /// Options for the markdown module.
    pub fn markdown(&self) -> MarkdownOptions {
        MarkdownOptions {
            gfm: self.gfm,
            allow_raw_html: self.allow_raw_html,
        }
    }
}

/// Named text values a template reaches through `{{& name }}` when the page
/// front-matter has no such key.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct Theme {
    /// Slot name to text.
    pub slots: BTreeMap<String, String>,
}

impl Theme {
    /// Text for `name`, if the theme defines it.
    pub fn slot(&self, name: &str) -> Option<&str> {
        self.slots.get(name).map(String::as_str)
    }

    /// Builder-style slot definition.
    pub fn with_slot(mut self, name: impl Into<String>, text: impl Into<String>) -> Self {
        self.slots.insert(name.into(), text.into());
        self
    }
}
