use thiserror::Error;

/// Schema violations that surface at generation time. Patches are free to
/// leave a document in a state that trips these; the build fails loudly
/// instead of emitting wrong source text.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaError {
    #[error("Unknown component type: {0}")]
    UnknownComponent(String),

    #[error("Unresolved state key '{key}' referenced by node '{node_id}'")]
    UnresolvedStateKey { key: String, node_id: String },

    #[error("Duplicate node id '{0}'")]
    DuplicateNodeId(String),

    #[error("State key '{0}' is not a valid identifier")]
    InvalidStateKey(String),

    #[error("Invalid manifest: {0}")]
    InvalidManifest(String),
}
