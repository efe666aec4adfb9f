use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Dimension mismatch at position {position}: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize, position: usize },

    #[error("Length mismatch: {vectors} vectors, {contents} contents, {metadata} metadata entries")]
    LengthMismatch { vectors: usize, contents: usize, metadata: usize },

    #[error("Index is empty")]
    EmptyIndex,

    #[error("Index corruption: {0}")]
    IndexCorruption(String),

    #[error("External service failure: {0}")]
    ExternalService(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

impl Error {
    /// True for failures that belong to a single request rather than the
    /// process (the server keeps running after these).
    pub fn is_request_scoped(&self) -> bool {
        matches!(
            self,
            Self::ExternalService(_)
                | Self::EmptyIndex
                | Self::DimensionMismatch { .. }
                | Self::InvalidDocument(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
