/// Indexer errors.
#[derive(Debug, thiserror::Error)]
pub enum IndexerError {
    #[error("analyzer error: {0}")]
    Analyzer(String),

    #[error("storage error: {0}")]
    Storage(#[from] cc_storage::StorageError),

    #[error("another build is already in progress for this root (lock held)")]
    LockHeld,

    #[error("pipeline failed at stage '{stage}': {reason}")]
    PipelineFailed { stage: String, reason: String },

    #[error("incremental build requested but staging is infeasible: {reason}")]
    IncrementalStagingInfeasible { reason: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl IndexerError {
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Storage(e) => e.is_retryable(),
            _ => false,
        }
    }
}
