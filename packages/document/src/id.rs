use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identifies one document in the store: the project config, or a single
/// page keyed by its `astFile` reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentId {
    Project,
    Page(String),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SelectorError {
    #[error("Invalid document selector: {0}")]
    Invalid(String),

    #[error("Empty page name in selector")]
    EmptyPage,
}

impl DocumentId {
    /// Parse a caller-supplied selector: `project` or `page:<astFile>`.
    pub fn parse(selector: &str) -> Result<Self, SelectorError> {
        if selector == "project" {
            return Ok(DocumentId::Project);
        }
        if let Some(name) = selector.strip_prefix("page:") {
            if name.is_empty() {
                return Err(SelectorError::EmptyPage);
            }
            return Ok(DocumentId::Page(name.to_string()));
        }
        Err(SelectorError::Invalid(selector.to_string()))
    }
}

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocumentId::Project => write!(f, "project"),
            DocumentId::Page(name) => write!(f, "page:{}", name),
        }
    }
}
