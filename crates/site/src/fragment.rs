/// Final markup that is spliced verbatim and never transformed again.
///
/// The transform channel takes `&str`, not `Fragment`; keeping the two apart
/// is what stops component output from being re-read as markdown.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fragment(String);

impl Fragment {
    /// Marks `markup` as final.
    pub fn new(markup: impl Into<String>) -> Self {
        Self(markup.into())
    }

    /// The markup.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Unwraps the markup.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for Fragment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
