use thiserror::Error;

/// Errors that can occur while building, loading, or querying a citation graph.
#[derive(Error, Debug)]
pub enum CiteGraphError {
    #[error("malformed input: document '{document_id}' is missing '{field}'")]
    MalformedInput { document_id: String, field: String },

    #[error("unknown graph: {message} (path: {path})")]
    UnknownGraph { message: String, path: String },

    #[error("invalid depth {depth}: max depth must be at least 1")]
    InvalidDepth { depth: u32 },

    #[error("snapshot error: {message} (path: {path})")]
    Snapshot { message: String, path: String },

    #[error("extraction error: {message} (path: {path})")]
    Extraction { message: String, path: String },

    #[error("config error: {message}")]
    Config { message: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias for results using `CiteGraphError`.
pub type Result<T> = std::result::Result<T, CiteGraphError>;
