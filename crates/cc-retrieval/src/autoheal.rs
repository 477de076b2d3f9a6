use std::path::Path;

use cc_indexer::{Analyzer, EmbeddingProvider, IndexOptions};

use crate::error::RetrievalError;

/// Wrap an index-consuming operation with the auto-heal protocol (§4.M,
/// P10): on `Corrupted`, trigger one full rebuild and retry the operation
/// exactly once. A `Corrupted` raised by the retry itself is not caught
/// again — it surfaces to the caller. A failed rebuild surfaces as
/// `RebuildFailed`, describing the indexer's terminal status.
pub fn with_auto_heal<T>(
    root: &Path,
    analyzer: &dyn Analyzer,
    embedder: &dyn EmbeddingProvider,
    tool_version: &str,
    mut operation: impl FnMut() -> Result<T, RetrievalError>,
) -> Result<T, RetrievalError> {
    match operation() {
        Ok(value) => Ok(value),
        Err(err) if err.is_corrupted() => {
            tracing::warn!(reason = %err, "index reported corrupted, triggering full rebuild");
            match cc_indexer::index(root, analyzer, embedder, tool_version, &IndexOptions::default()) {
                Ok(stats) => {
                    tracing::info!(indexed_files = stats.indexed_files, "rebuild succeeded, retrying operation");
                    operation()
                }
                Err(rebuild_err) => Err(RetrievalError::RebuildFailed { reason: rebuild_err.to_string() }),
            }
        }
        Err(err) => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cc_indexer::HashEmbeddingProvider;
    use cc_indexer::WholeFileAnalyzer;
    use cc_storage::StorageError;
    use std::cell::Cell;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn non_corrupted_error_passes_through_without_rebuild() {
        let tmp = TempDir::new().unwrap();
        let analyzer = WholeFileAnalyzer;
        let embedder = HashEmbeddingProvider::new(8);

        let result: Result<(), RetrievalError> = with_auto_heal(tmp.path(), &analyzer, &embedder, "test", || {
            Err(RetrievalError::QueryFailed { reason: "bad filter".into() })
        });

        assert!(matches!(result, Err(RetrievalError::QueryFailed { .. })));
    }

    #[test]
    fn corrupted_error_triggers_rebuild_then_retries_once() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("src")).unwrap();
        fs::write(tmp.path().join("src/a.py"), "def run():\n    pass\n").unwrap();

        let analyzer = WholeFileAnalyzer;
        let embedder = HashEmbeddingProvider::new(8);
        let attempts = Cell::new(0);

        let result: Result<&str, RetrievalError> = with_auto_heal(tmp.path(), &analyzer, &embedder, "test", || {
            attempts.set(attempts.get() + 1);
            if attempts.get() == 1 {
                Err(RetrievalError::Storage(StorageError::Corrupted { reason: "bad marker".into() }))
            } else {
                Ok("recovered")
            }
        });

        assert_eq!(result.unwrap(), "recovered");
        assert_eq!(attempts.get(), 2);
    }

    #[test]
    fn retry_corruption_after_successful_rebuild_surfaces_as_is() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("src")).unwrap();
        fs::write(tmp.path().join("src/a.py"), "def run():\n    pass\n").unwrap();

        let analyzer = WholeFileAnalyzer;
        let embedder = HashEmbeddingProvider::new(8);

        let result: Result<(), RetrievalError> = with_auto_heal(tmp.path(), &analyzer, &embedder, "test", || {
            Err(RetrievalError::Storage(StorageError::Corrupted { reason: "still bad".into() }))
        });

        assert!(matches!(result, Err(RetrievalError::Storage(StorageError::Corrupted { .. }))));
    }
}
