use thiserror::Error;

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("Schema error: {0}")]
    Schema(#[from] pagecraft_compiler::SchemaError),

    #[error("Invalid project config: {0}")]
    InvalidConfig(String),

    #[error("Page AST {ast_file} is malformed: {reason}")]
    MalformedPageAst { ast_file: String, reason: String },

    #[error("IO error writing {artifact}: {source}")]
    ArtifactIo {
        artifact: String,
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
