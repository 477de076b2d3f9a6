/// Storage errors. `Corrupted` is the single variant the auto-heal wrapper
/// (§4.M) matches on; everything else is invalid-input or transient.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("index corrupted: {reason}")]
    Corrupted { reason: String },

    #[error("manifest not found at {path}")]
    NotFound { path: String },

    #[error("vector index unavailable: {reason}")]
    VectorIndexUnavailable { reason: String },

    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl StorageError {
    /// Per §6's error surface, a mismatched/missing manifest or header is
    /// always `index_corrupted`, never transient.
    pub fn is_corrupted(&self) -> bool {
        matches!(self, Self::Corrupted { .. } | Self::NotFound { .. })
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::VectorIndexUnavailable { .. } | Self::Io(_))
    }
}
