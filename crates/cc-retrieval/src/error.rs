/// Retrieval errors, and the mapping from each variant to the `error_code`
/// surfaced in `{status: "error", error_code, message, hint?}` responses
/// (§6, §7).
#[derive(Debug, thiserror::Error)]
pub enum RetrievalError {
    #[error("storage error: {0}")]
    Storage(#[from] cc_storage::StorageError),

    #[error("indexer error: {0}")]
    Indexer(#[from] cc_indexer::IndexerError),

    #[error("invalid query parameters: {reason}")]
    InvalidParams { reason: String },

    #[error("query error: {reason}")]
    QueryFailed { reason: String },

    #[error("fusion error: {reason}")]
    FusionFailed { reason: String },

    #[error("graph expansion failed: {reason}")]
    ExpansionFailed { reason: String },

    #[error("indexing in progress")]
    Indexing,

    #[error("index rebuild failed: {reason}")]
    RebuildFailed { reason: String },
}

impl RetrievalError {
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Storage(e) => e.is_retryable(),
            Self::Indexer(e) => e.is_retryable(),
            _ => false,
        }
    }

    /// True only for the condition the auto-heal wrapper (§4.M) catches:
    /// a corrupted or missing on-disk artifact.
    pub fn is_corrupted(&self) -> bool {
        matches!(self, Self::Storage(e) if e.is_corrupted())
    }

    /// `error_code` per §6/§7: `invalid_params | index_corrupted | indexing |
    /// rebuild_failed | transient`.
    pub fn as_error_code(&self) -> &'static str {
        match self {
            Self::InvalidParams { .. } => "invalid_params",
            Self::Storage(e) if e.is_corrupted() => "index_corrupted",
            Self::Indexing => "indexing",
            Self::RebuildFailed { .. } => "rebuild_failed",
            Self::Storage(_) | Self::Indexer(_) => "transient",
            Self::QueryFailed { .. } | Self::FusionFailed { .. } | Self::ExpansionFailed { .. } => "transient",
        }
    }
}
