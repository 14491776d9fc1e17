//! Crate-wide error type, aggregated from one `thiserror` enum per concern.

/// Top-level error for the hypergraph core.
#[derive(thiserror::Error, Debug)]
pub enum HypergraphError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Path engine error: {0}")]
    Path(#[from] PathError),

    #[error("Index error: {0}")]
    Index(#[from] IndexError),

    #[error("Discovery error: {0}")]
    Discovery(#[from] DiscoveryError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] IoError),
}

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("Node not found: {0}")]
    NodeNotFound(String),

    #[error("Edge not found: {0}")]
    EdgeNotFound(String),

    #[error("Edge {edge} references unknown node {node}")]
    DanglingReference { edge: String, node: String },

    #[error("Duplicate edge id in load: {0}")]
    DuplicateEdgeId(String),
}

#[derive(thiserror::Error, Debug)]
pub enum PathError {
    #[error("Invalid s parameter: {0} (must be >= 1)")]
    InvalidS(i64),
}

#[derive(thiserror::Error, Debug)]
pub enum IndexError {
    #[error("Index was built from a different graph than the one supplied")]
    GraphMismatch,
}

#[derive(thiserror::Error, Debug)]
pub enum DiscoveryError {
    #[error("Degenerate configuration: {0}")]
    InvalidConfig(String),
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("Invalid config: {0}")]
    Invalid(String),
}

#[derive(thiserror::Error, Debug)]
pub enum IoError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("File I/O error: {0}")]
    File(#[from] std::io::Error),

    #[error("Malformed {what}: {reason}")]
    Malformed { what: &'static str, reason: String },
}

pub type Result<T> = std::result::Result<T, HypergraphError>;
