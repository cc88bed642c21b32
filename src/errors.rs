use thiserror::Error;

#[derive(Debug, Error)]
pub enum RagError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unable to perform the operation as the index is absent. Index '{0}' must be created with create_index_maybe first.")]
    IndexAbsent(String),

    /// Raised by the index administration client when the named index does not exist.
    #[error("Index not found: {0}")]
    IndexNotFound(String),

    #[error("Embedding dimension mismatch: index expects {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Search service error ({status}): {message}")]
    SearchService { status: u16, message: String },

    #[error("Embeddings error: {0}")]
    Embeddings(String),

    #[error("Bulk upload failed for {failed} of {total} documents: {first_error}")]
    BulkUpload {
        failed: usize,
        total: usize,
        first_error: String,
    },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Embeddings table error: {0}")]
    Table(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("TOML deserialize error: {0}")]
    TomlDe(#[from] toml::de::Error),
}

impl serde::Serialize for RagError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::ser::Serializer,
    {
        serializer.serialize_str(self.to_string().as_str())
    }
}

pub type RagResult<T> = Result<T, RagError>;
