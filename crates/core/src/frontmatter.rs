use serde_json::{Map, Value as JsonValue};
use thiserror::Error;

/// Front-matter key naming the template a page renders into.
pub const TEMPLATE_KEY: &str = "template";

/// Leading key-value block of a page source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrontMatter {
    values: Map<String, JsonValue>,
}

impl FrontMatter {
    /// Wraps an already parsed mapping.
    pub fn from_map(values: Map<String, JsonValue>) -> Self {
        Self { values }
    }

    /// Raw value for `key`.
    pub fn get(&self, key: &str) -> Option<&JsonValue> {
        self.values.get(key)
    }

    /// Value for `key` rendered as plain text.
    ///
    /// Strings come back as-is, numbers and booleans use their display form.
    /// Null, sequences and mappings have no scalar text and yield `None`.
    pub fn text(&self, key: &str) -> Option<String> {
        match self.values.get(key)? {
            JsonValue::String(s) => Some(s.clone()),
            JsonValue::Number(n) => Some(n.to_string()),
            JsonValue::Bool(b) => Some(b.to_string()),
            JsonValue::Null | JsonValue::Array(_) | JsonValue::Object(_) => None,
        }
    }

    /// The template reference, if present and non-blank.
    pub fn template(&self) -> Option<String> {
        self.text(TEMPLATE_KEY)
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
    }

    /// Whether the block declared no keys.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Borrow the underlying mapping.
    pub fn as_map(&self) -> &Map<String, JsonValue> {
        &self.values
    }
}

/// Result returned after splitting front-matter from a document.
#[derive(Debug)]
pub struct FrontmatterExtraction {
    /// Parsed front-matter.
    pub front_matter: FrontMatter,
    /// Byte offset inside the original document where the body begins.
    pub body_start: usize,
}

/// Errors emitted while parsing or extracting front-matter.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FrontmatterError {
    /// Opening `---` without a closing one.
    #[error("unterminated front-matter block: expected closing '---'")]
    Unterminated,
    /// YAML failed to parse.
    #[error("front-matter parse error: {0}")]
    Parse(String),
    /// Top-level YAML node was not a mapping.
    #[error("front-matter must be a YAML mapping at the top level")]
    InvalidRootType,
}

/// Splits the YAML front-matter block off the start of `input`.
///
/// Leading blank lines and a UTF-8 BOM are skipped. A document whose first
/// non-blank line is not `---` has empty front-matter and a body starting at 0.
pub fn extract_frontmatter(input: &str) -> Result<FrontmatterExtraction, FrontmatterError> {
    let Some((block, body_start)) = locate_block(input)? else {
        return Ok(FrontmatterExtraction {
            front_matter: FrontMatter::default(),
            body_start: 0,
        });
    };

    Ok(FrontmatterExtraction {
        front_matter: FrontMatter::from_map(parse_block(block)?),
        body_start,
    })
}

fn parse_block(block: &str) -> Result<Map<String, JsonValue>, FrontmatterError> {
    if block.trim().is_empty() {
        return Ok(Map::new());
    }

    let yaml: serde_yaml::Value =
        serde_yaml::from_str(block).map_err(|err| FrontmatterError::Parse(err.to_string()))?;
    let json =
        serde_json::to_value(yaml).map_err(|err| FrontmatterError::Parse(err.to_string()))?;

    match json {
        JsonValue::Null => Ok(Map::new()),
        JsonValue::Object(map) => Ok(map),
        _ => Err(FrontmatterError::InvalidRootType),
    }
}

/// Returns the block text between the fences and the offset just past the
/// closing fence line.
fn locate_block(input: &str) -> Result<Option<(&str, usize)>, FrontmatterError> {
    let start = if input.starts_with('\u{feff}') {
        '\u{feff}'.len_utf8()
    } else {
        0
    };

    let mut lines = Lines::new(input, start);
    let opening = loop {
        match lines.next() {
            Some(line) if line.text.trim().is_empty() => continue,
            Some(line) => break line,
            None => return Ok(None),
        }
    };
    if !is_fence(opening.text) {
        return Ok(None);
    }

    for line in lines {
        if is_fence(line.text) {
            let block = input[opening.end..line.start].trim_end_matches(['\r', '\n']);
            return Ok(Some((block, line.end)));
        }
    }
    Err(FrontmatterError::Unterminated)
}

fn is_fence(line: &str) -> bool {
    line.trim_end_matches('\r') == "---"
}

struct Line<'a> {
    text: &'a str,
    start: usize,
    end: usize,
}

/// Line iterator that keeps byte offsets into the source.
struct Lines<'a> {
    input: &'a str,
    cursor: usize,
}

impl<'a> Lines<'a> {
    fn new(input: &'a str, cursor: usize) -> Self {
        Self { input, cursor }
    }
}

impl<'a> Iterator for Lines<'a> {
    type Item = Line<'a>;

    fn next(&mut self) -> Option<Line<'a>> {
        if self.cursor >= self.input.len() {
            return None;
        }
        let start = self.cursor;
        let rest = &self.input[start..];
        let (text, end) = match rest.find('\n') {
            Some(pos) => (&rest[..pos], start + pos + 1),
            None => (rest, self.input.len()),
        };
        self.cursor = end;
        Some(Line { text, start, end })
    }
}
