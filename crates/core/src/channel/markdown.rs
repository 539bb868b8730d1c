//! Markdown transform module built on markdown-rs.

use super::TransformModule;
use super::buffer::{decode_terminated, write_output};
use crate::error::TransformError;

/// Options for the markdown module.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MarkdownOptions {
    /// Enable GitHub Flavored Markdown constructs.
    pub gfm: bool,
    /// Pass raw HTML in the source through unescaped.
    pub allow_raw_html: bool,
}

impl MarkdownOptions {
    /// Plain CommonMark with raw HTML escaped.
    pub const fn commonmark() -> Self {
        Self {
            gfm: false,
            allow_raw_html: false,
        }
    }

    /// Convert to markdown-rs `Options`.
    pub fn to_markdown(self) -> ::markdown::Options {
        let constructs = if self.gfm {
            ::markdown::Constructs::gfm()
        } else {
            ::markdown::Constructs::default()
        };

        ::markdown::Options {
            parse: ::markdown::ParseOptions {
                constructs,
                ..::markdown::ParseOptions::default()
            },
            compile: ::markdown::CompileOptions {
                allow_dangerous_html: self.allow_raw_html,
                ..::markdown::CompileOptions::default()
            },
        }
    }
}

impl Default for MarkdownOptions {
    fn default() -> Self {
        Self {
            gfm: true,
            allow_raw_html: false,
        }
    }
}

/// Converts markdown read from the input buffer into HTML in the output buffer.
pub struct MarkdownModule {
    options: MarkdownOptions,
}

impl MarkdownModule {
    /// Creates a module with the given options.
    pub fn new(options: MarkdownOptions) -> Self {
        Self { options }
    }
}

impl Default for MarkdownModule {
    fn default() -> Self {
        Self::new(MarkdownOptions::default())
    }
}

impl TransformModule for MarkdownModule {
    fn invoke(&mut self, input: &[u8], output: &mut [u8]) -> Result<usize, TransformError> {
        let source = std::str::from_utf8(decode_terminated(input))
            .map_err(|err| TransformError::module(format!("input is not valid UTF-8: {err}")))?;
        let html = ::markdown::to_html_with_options(source, &self.options.to_markdown())
            .map_err(|message| TransformError::module(message.to_string()))?;
        write_output(output, html.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(module: &mut MarkdownModule, input: &str, capacity: usize) -> Result<String, TransformError> {
        let mut output = vec![0u8; capacity];
        let written = module.invoke(input.as_bytes(), &mut output)?;
        Ok(String::from_utf8(output[..written].to_vec()).unwrap())
    }

    #[test]
    fn renders_heading() {
        let mut module = MarkdownModule::default();
        assert_eq!(run(&mut module, "# Hi", 64).unwrap(), "<h1>Hi</h1>");
    }

    #[test]
    fn empty_input_renders_empty_output() {
        let mut module = MarkdownModule::default();
        assert_eq!(run(&mut module, "", 0).unwrap(), "");
    }

    #[test]
    fn raw_html_is_escaped_by_default() {
        let mut module = MarkdownModule::default();
        let html = run(&mut module, "a <b>bold</b>", 128).unwrap();
        assert_eq!(html, "<p>a &lt;b&gt;bold&lt;/b&gt;</p>");
    }

    #[test]
    fn raw_html_passes_through_when_allowed() {
        let mut module = MarkdownModule::new(MarkdownOptions {
            gfm: true,
            allow_raw_html: true,
        });
        let html = run(&mut module, "a <b>bold</b>", 128).unwrap();
        assert_eq!(html, "<p>a <b>bold</b></p>");
    }

    #[test]
    fn gfm_strikethrough_toggles_with_options() {
        let mut gfm = MarkdownModule::default();
        assert_eq!(run(&mut gfm, "~~gone~~", 64).unwrap(), "<p><del>gone</del></p>");

        let mut plain = MarkdownModule::new(MarkdownOptions::commonmark());
        assert_eq!(run(&mut plain, "~~gone~~", 64).unwrap(), "<p>~~gone~~</p>");
    }

    #[test]
    fn invalid_utf8_input_is_a_module_error() {
        let mut module = MarkdownModule::default();
        let mut output = [0u8; 16];
        let err = module.invoke(&[0xff, 0xfe], &mut output).unwrap_err();
        assert!(matches!(err, TransformError::Module(_)), "{err:?}");
    }
}
