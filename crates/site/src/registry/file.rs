//! Single-file components.
//!
//! ```text
//! ---
//! nested: false
//! ---
//! <button class="button">{{ label }}</button>
//!
//! <script>
//! document.querySelector(".button").addEventListener("click", () => {});
//! </script>
//!
//! <style>
//! .button { font-weight: bold; }
//! </style>
//! ```
//!
//! Front-matter is optional. `<script>` and `<style>` elements are lifted out
//! as the component's script and style; what is left is the render markup.
//! An element marked `data-inline` stays in the markup, as does anything inside
//! an HTML comment. `{{ name }}` interpolates an HTML-escaped prop.

use super::types::{ComponentExports, Props};
use crate::error::PipelineError;
use goku_core::extract_frontmatter;
use lol_html::{RewriteStrSettings, element, rewrite_str, text};
use serde_json::Value as JsonValue;
use std::cell::RefCell;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Piece {
    Text(String),
    Prop(String),
}

/// Parses a component file into its exports.
pub fn parse_component_file(id: &str, source: &str) -> Result<ComponentExports, PipelineError> {
    let extraction = extract_frontmatter(source)
        .map_err(|err| PipelineError::load_error(id, err.to_string()))?;
    let nested = match extraction.front_matter.get("nested") {
        None => false,
        Some(JsonValue::Bool(flag)) => *flag,
        Some(other) => {
            return Err(PipelineError::load_error(
                id,
                format!("`nested` must be a boolean, found {other}"),
            ));
        }
    };

    let Lifted {
        markup,
        script,
        style,
    } = lift_blocks(id, &source[extraction.body_start..])?;

    let markup = markup.trim();
    if markup.is_empty() {
        return Err(PipelineError::load_error(id, "component has no render markup"));
    }

    let pieces = compile_markup(markup);
    Ok(ComponentExports {
        render: Some(std::sync::Arc::new(move |props: &Props| render_pieces(&pieces, props))),
        script,
        style,
        nested,
    })
}

/// Selectors for lifted blocks. `data-inline` keeps a block in the markup.
const LIFTED_SCRIPTS: &str = "script:not([data-inline])";
const LIFTED_STYLES: &str = "style:not([data-inline])";

struct Lifted {
    markup: String,
    script: Option<String>,
    style: Option<String>,
}

/// Removes `<script>` and `<style>` elements from `markup`, returning their
/// trimmed contents joined by newlines. Blocks inside comments are markup.
fn lift_blocks(id: &str, markup: &str) -> Result<Lifted, PipelineError> {
    let scripts: RefCell<Vec<String>> = RefCell::default();
    let styles: RefCell<Vec<String>> = RefCell::default();

    let markup = rewrite_str(
        markup,
        RewriteStrSettings {
            element_content_handlers: vec![
                element!(LIFTED_SCRIPTS, |el| {
                    scripts.borrow_mut().push(String::new());
                    el.remove_and_keep_content();
                    Ok(())
                }),
                text!(LIFTED_SCRIPTS, |chunk| {
                    if let Some(block) = scripts.borrow_mut().last_mut() {
                        block.push_str(chunk.as_str());
                    }
                    chunk.remove();
                    Ok(())
                }),
                element!(LIFTED_STYLES, |el| {
                    styles.borrow_mut().push(String::new());
                    el.remove_and_keep_content();
                    Ok(())
                }),
                text!(LIFTED_STYLES, |chunk| {
                    if let Some(block) = styles.borrow_mut().last_mut() {
                        block.push_str(chunk.as_str());
                    }
                    chunk.remove();
                    Ok(())
                }),
            ],
            ..RewriteStrSettings::new()
        },
    )
    .map_err(|err| PipelineError::load_error(id, err.to_string()))?;

    Ok(Lifted {
        markup,
        script: join_blocks(scripts.into_inner()),
        style: join_blocks(styles.into_inner()),
    })
}

fn join_blocks(blocks: Vec<String>) -> Option<String> {
    let blocks: Vec<&str> = blocks
        .iter()
        .map(|block| block.trim())
        .filter(|block| !block.is_empty())
        .collect();
    if blocks.is_empty() {
        None
    } else {
        Some(blocks.join("\n"))
    }
}

fn compile_markup(markup: &str) -> Vec<Piece> {
    let mut pieces = Vec::new();
    let mut text = String::new();
    let mut rest = markup;

    while let Some(open) = rest.find("{{") {
        text.push_str(&rest[..open]);
        let after = &rest[open + 2..];
        let placeholder = after
            .find("}}")
            .map(|close| (after[..close].trim(), close))
            .filter(|(name, _)| is_prop_name(name));

        match placeholder {
            Some((name, close)) => {
                if !text.is_empty() {
                    pieces.push(Piece::Text(std::mem::take(&mut text)));
                }
                pieces.push(Piece::Prop(name.to_string()));
                rest = &after[close + 2..];
            }
            None => {
                text.push_str("{{");
                rest = after;
            }
        }
    }
    text.push_str(rest);
    if !text.is_empty() {
        pieces.push(Piece::Text(text));
    }
    pieces
}

fn is_prop_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

fn render_pieces(pieces: &[Piece], props: &Props) -> String {
    let mut out = String::new();
    for piece in pieces {
        match piece {
            Piece::Text(text) => out.push_str(text),
            Piece::Prop(name) => {
                if let Some(value) = props.get(name) {
                    out.push_str(&html_escape::encode_quoted_attribute(value));
                }
            }
        }
    }
    out
}
