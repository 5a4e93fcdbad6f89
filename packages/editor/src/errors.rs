//! Error types for the editor

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Patch error: {0}")]
    Patch(#[from] crate::patch::PatchError),

    #[error("Selector error: {0}")]
    Selector(#[from] pagecraft_document::SelectorError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Document is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}
