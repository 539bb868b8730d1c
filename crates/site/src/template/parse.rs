//! Directive scanning for template text.
//!
//! Directives look like `{{& content }}`, `{{& component nav.html title="Home" }}`
//! or `{{& title }}`. Everything else is literal text.

use super::{AnchorKind, Directive, Segment};
use crate::error::PipelineError;
use crate::registry::Props;

pub(crate) const OPEN: &str = "{{&";
const CLOSE: &str = "}}";

/// Splits `text` into literal and directive segments in one left-to-right pass.
pub(crate) fn parse_segments(id: &str, text: &str) -> Result<Vec<Segment>, PipelineError> {
    let mut segments = Vec::new();
    let mut cursor = 0usize;

    while let Some(rel) = text[cursor..].find(OPEN) {
        let open = cursor + rel;
        if open > cursor {
            segments.push(Segment::Text(cursor..open));
        }

        let inner_start = open + OPEN.len();
        let Some(close_rel) = text[inner_start..].find(CLOSE) else {
            return Err(PipelineError::syntax(id, text, open, "unterminated directive, expected `}}`"));
        };
        let close = inner_start + close_rel;
        let end = close + CLOSE.len();

        let directive = parse_directive(&text[inner_start..close])
            .map_err(|message| PipelineError::syntax(id, text, open, message))?;
        segments.push(Segment::Directive {
            directive,
            span: open..end,
        });
        cursor = end;
    }

    if cursor < text.len() {
        segments.push(Segment::Text(cursor..text.len()));
    }
    Ok(segments)
}

fn parse_directive(inner: &str) -> Result<Directive, String> {
    let tokens = tokenize(inner)?;
    let Some((head, rest)) = tokens.split_first() else {
        return Err("empty directive".to_string());
    };

    match *head {
        "component" => {
            let Some((path, attrs)) = rest.split_first() else {
                return Err("component directive needs a path".to_string());
            };
            let mut props = Props::new();
            for attr in attrs {
                let (key, value) = parse_attr(attr)?;
                props.insert(key, value);
            }
            Ok(Directive::Component {
                path: path.to_string(),
                props,
            })
        }
        name => {
            if let Some(extra) = rest.first() {
                return Err(format!("unexpected `{extra}` after `{name}`"));
            }
            Ok(match name {
                "content" => Directive::Content,
                "styles" => Directive::Anchor(AnchorKind::Styles),
                "scripts" => Directive::Anchor(AnchorKind::Scripts),
                _ => Directive::Lookup(name.to_string()),
            })
        }
    }
}

/// `key="value"`, `key='value'`, `key=value`, or a bare `key` (value `true`).
fn parse_attr(token: &str) -> Result<(String, String), String> {
    let (key, value) = match token.split_once('=') {
        Some((key, raw)) => (key, unquote(raw)),
        None => (token, "true"),
    };
    if key.is_empty() {
        return Err(format!("attribute `{token}` has no name"));
    }
    Ok((key.to_string(), value.to_string()))
}

fn unquote(raw: &str) -> &str {
    for quote in ['"', '\''] {
        if raw.len() >= 2 && raw.starts_with(quote) && raw.ends_with(quote) {
            return &raw[1..raw.len() - 1];
        }
    }
    raw
}

/// Splits on whitespace, keeping quoted runs (which may hold spaces) intact.
fn tokenize(input: &str) -> Result<Vec<&str>, String> {
    let mut tokens = Vec::new();
    let mut token_start: Option<usize> = None;
    let mut quote: Option<char> = None;

    for (i, c) in input.char_indices() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if c == '"' || c == '\'' => {
                token_start.get_or_insert(i);
                quote = Some(c);
            }
            None if c.is_whitespace() => {
                if let Some(start) = token_start.take() {
                    tokens.push(&input[start..i]);
                }
            }
            None => {
                token_start.get_or_insert(i);
            }
        }
    }

    if let Some(q) = quote {
        return Err(format!("unterminated {q} quote"));
    }
    if let Some(start) = token_start {
        tokens.push(&input[start..]);
    }
    Ok(tokens)
}
