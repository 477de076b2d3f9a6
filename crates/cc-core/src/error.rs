use std::path::PathBuf;

/// Errors from cc-core operations.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("hash computation failed for {path}: {reason}")]
    HashFailed { path: PathBuf, reason: String },

    #[error("type conversion failed: {reason}")]
    ConversionFailed { reason: String },

    #[error("invalid manifest field {field}: {reason}")]
    InvalidManifestField { field: &'static str, reason: String },
}

impl CoreError {
    pub fn is_retryable(&self) -> bool {
        false
    }
}
