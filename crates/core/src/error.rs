use thiserror::Error;

/// Source location information for error reporting
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    /// Optional file path
    pub file: Option<String>,
    /// Line number (1-indexed)
    pub line: usize,
    /// Column number (1-indexed)
    pub column: usize,
}

impl SourceLocation {
    /// Create a new source location
    pub fn new(line: usize, column: usize) -> Self {
        Self {
            file: None,
            line,
            column,
        }
    }

    /// Create a source location with file information
    pub fn with_file(file: String, line: usize, column: usize) -> Self {
        Self {
            file: Some(file),
            line,
            column,
        }
    }

    /// Computes the 1-indexed line and column of a byte offset inside `text`.
    pub fn from_offset(text: &str, offset: usize) -> Self {
        let offset = offset.min(text.len());
        let before = &text.as_bytes()[..offset];
        let line = before.iter().filter(|b| **b == b'\n').count() + 1;
        let line_start = before
            .iter()
            .rposition(|b| *b == b'\n')
            .map_or(0, |pos| pos + 1);
        let column = String::from_utf8_lossy(&before[line_start..]).chars().count() + 1;
        Self::new(line, column)
    }
}

impl std::fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(file) = &self.file {
            write!(f, "{}:{}:{}", file, self.line, self.column)
        } else {
            write!(f, "{}:{}", self.line, self.column)
        }
    }
}

/// Errors raised by the transform channel and the module behind it.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransformError {
    /// The transform result does not fit in the output buffer.
    #[error("transform output of {needed} bytes exceeds output buffer capacity of {capacity} bytes")]
    OutputOverflow {
        /// Bytes the module needed to write.
        needed: usize,
        /// Capacity of the output buffer.
        capacity: usize,
    },
    /// The source text does not fit in the input buffer.
    #[error("transform input of {len} bytes exceeds input buffer capacity of {capacity} bytes")]
    InputOverflow {
        /// Logical length of the source text.
        len: usize,
        /// Capacity of the input buffer.
        capacity: usize,
    },
    /// The isolated module reported an internal failure.
    #[error("transform module error: {0}")]
    Module(String),
}

impl TransformError {
    /// Create a module error from any displayable message
    pub fn module(message: impl Into<String>) -> Self {
        Self::Module(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn location_from_offset_counts_lines_and_columns() {
        let text = "<h1>\n  {{& oops";
        let loc = SourceLocation::from_offset(text, text.find("{{&").unwrap());
        assert_eq!(loc, SourceLocation::new(2, 3));
        assert_eq!(loc.to_string(), "2:3");
    }

    #[test]
    fn location_with_file_displays_path() {
        let loc = SourceLocation::with_file("templates/page.html".into(), 4, 1);
        assert_eq!(loc.to_string(), "templates/page.html:4:1");
    }

    #[test]
    fn overflow_message_names_both_sizes() {
        let err = TransformError::OutputOverflow {
            needed: 11,
            capacity: 10,
        };
        assert_eq!(
            err.to_string(),
            "transform output of 11 bytes exceeds output buffer capacity of 10 bytes"
        );
    }
}
