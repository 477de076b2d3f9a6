use serde::{Deserialize, Serialize};

/// A language tag, as emitted by the analyzer boundary.
///
/// Kept as a freeform string rather than a closed enum: the analyzer is an
/// external collaborator (spec.md §1) and may recognize languages this
/// workspace has no opinion about. Comparisons are case-insensitive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Language(String);

impl Language {
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        let tag = match ext {
            "py" => "python",
            "ts" | "tsx" => "typescript",
            "js" | "jsx" => "javascript",
            "rs" => "rust",
            "go" => "go",
            "java" => "java",
            _ => return None,
        };
        Some(Self::new(tag))
    }
}

impl PartialEq for Language {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}
impl Eq for Language {}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
