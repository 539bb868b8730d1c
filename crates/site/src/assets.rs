//! Per-page collection of component scripts and styles, and their placement
//! in the finished document.

use crate::error::PipelineError;
use crate::template::AnchorKind;
use lol_html::html_content::{ContentType, Element};
use lol_html::{HandlerResult, RewriteStrSettings, element, end_tag, rewrite_str};
use std::cell::Cell;
use std::collections::HashSet;
use std::rc::Rc;

/// Script and style contributed by one component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetEntry {
    /// Contributing component.
    pub component: String,
    /// Script text, if any.
    pub script: Option<String>,
    /// Style text, if any.
    pub style: Option<String>,
}

/// Ordered, deduplicated assets drained from a collector.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetSet {
    entries: Vec<AssetEntry>,
}

impl AssetSet {
    /// Entries in first-use order.
    pub fn entries(&self) -> &[AssetEntry] {
        &self.entries
    }

    /// Number of contributing components.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no component contributed anything.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `<style>` tags for every style, in order.
    pub fn style_tags(&self) -> String {
        self.tags(AnchorKind::Styles)
    }

    /// `<script>` tags for every script, in order.
    pub fn script_tags(&self) -> String {
        self.tags(AnchorKind::Scripts)
    }

    fn tags(&self, kind: AnchorKind) -> String {
        let tag = match kind {
            AnchorKind::Styles => "style",
            AnchorKind::Scripts => "script",
        };
        self.entries
            .iter()
            .filter_map(|entry| {
                let text = match kind {
                    AnchorKind::Styles => entry.style.as_deref(),
                    AnchorKind::Scripts => entry.script.as_deref(),
                }?;
                Some(format!(
                    "<{tag} data-component=\"{}\">{text}</{tag}>",
                    html_escape::encode_double_quoted_attribute(&entry.component)
                ))
            })
            .collect()
    }
}

/// Accumulates assets during one page's resolution.
#[derive(Debug, Default)]
pub struct AssetCollector {
    entries: Vec<AssetEntry>,
    seen: HashSet<String>,
}

impl AssetCollector {
    /// A fresh, empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a component's assets unless it already contributed.
    ///
    /// Returns whether this call registered anything. Components with neither
    /// script nor style are not recorded.
    pub fn register_if_absent(
        &mut self,
        component: &str,
        script: Option<&str>,
        style: Option<&str>,
    ) -> bool {
        if (script.is_none() && style.is_none()) || self.seen.contains(component) {
            return false;
        }
        self.seen.insert(component.to_string());
        self.entries.push(AssetEntry {
            component: component.to_string(),
            script: script.map(str::to_string),
            style: style.map(str::to_string),
        });
        true
    }

    /// Takes everything collected so far and resets the collector.
    pub fn drain(&mut self) -> AssetSet {
        self.seen.clear();
        AssetSet {
            entries: std::mem::take(&mut self.entries),
        }
    }
}

/// Byte offset in resolved text where an asset anchor stood.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Anchor {
    /// What goes here.
    pub kind: AnchorKind,
    /// Offset into the resolved text.
    pub offset: usize,
}

/// Places style and script tags into `text`.
///
/// The first anchor of each kind receives its tags. A kind without an anchor
/// goes before `</head>` (styles) or `</body>` (scripts) when the
/// document writes that end tag, and is appended to the end of the document otherwise.
pub fn splice_assets(
    text: String,
    anchors: &[Anchor],
    assets: &AssetSet,
) -> Result<String, PipelineError> {
    let styles = assets.style_tags();
    let scripts = assets.script_tags();

    let first = |kind: AnchorKind| anchors.iter().find(|a| a.kind == kind).map(|a| a.offset);
    let mut inserts: Vec<(usize, &str)> = Vec::new();
    let mut pending_styles = None;
    let mut pending_scripts = None;

    if !scripts.is_empty() {
        match first(AnchorKind::Scripts) {
            Some(offset) => inserts.push((offset, scripts.as_str())),
            None => pending_scripts = Some(scripts.as_str()),
        }
    }
    if !styles.is_empty() {
        match first(AnchorKind::Styles) {
            Some(offset) => inserts.push((offset, styles.as_str())),
            None => pending_styles = Some(styles.as_str()),
        }
    }

    // Later offsets first so earlier ones stay valid. The sort is stable, so at
    // a shared offset styles are inserted last and end up ahead of scripts.
    inserts.sort_by(|a, b| b.0.cmp(&a.0));
    let mut text = text;
    for (offset, tags) in inserts {
        text.insert_str(offset, tags);
    }

    if pending_styles.is_none() && pending_scripts.is_none() {
        return Ok(text);
    }
    inject_fallback(text, pending_styles, pending_scripts)
}

/// Inserts tags before `</head>` / `</body>`. Elements whose end tag is
/// implied rather than written never fire their end tag handler, so their
/// tags fall through to the document end.
fn inject_fallback(
    text: String,
    styles: Option<&str>,
    scripts: Option<&str>,
) -> Result<String, PipelineError> {
    let head_done = Rc::new(Cell::new(false));
    let body_done = Rc::new(Cell::new(false));

    let mut handlers = Vec::new();
    if let Some(styles) = styles {
        handlers.push(element!("head", |el: &mut Element<'_, '_>| {
            before_end_tag(el, styles, &head_done)
        }));
    }
    if let Some(scripts) = scripts {
        handlers.push(element!("body", |el: &mut Element<'_, '_>| {
            before_end_tag(el, scripts, &body_done)
        }));
    }

    let mut out = rewrite_str(
        &text,
        RewriteStrSettings {
            element_content_handlers: handlers,
            ..RewriteStrSettings::new()
        },
    )
    .map_err(|err| PipelineError::AssetInjection(err.to_string()))?;

    if let Some(styles) = styles.filter(|_| !head_done.get()) {
        out.push_str(styles);
    }
    if let Some(scripts) = scripts.filter(|_| !body_done.get()) {
        out.push_str(scripts);
    }
    Ok(out)
}

fn before_end_tag(el: &mut Element<'_, '_>, tags: &str, done: &Rc<Cell<bool>>) -> HandlerResult {
    if done.get() {
        return Ok(());
    }
    let tags = tags.to_string();
    let done = Rc::clone(done);
    el.on_end_tag(end_tag!(move |end| {
        if !done.replace(true) {
            end.before(&tags, ContentType::Html);
        }
        Ok(())
    }))
}
