use std::path::Path;

use cc_core::{ArtifactHeader, BuildManifest, Chunk};
use serde::{Deserialize, Serialize};

use crate::error::StorageError;

/// On-disk shape of the keyword/chunk store: a header followed by the
/// ordered chunk sequence (§3, §4.B). A file lacking the `header` field
/// entirely (the legacy headerless format) fails to deserialize and is
/// treated as corruption, per §4.B.
#[derive(Debug, Serialize, Deserialize)]
pub struct ChunkStoreFile {
    pub header: ArtifactHeader,
    pub chunks: Vec<Chunk>,
}

/// Load the chunk store at `path`, verifying its header against
/// `expected_manifest` (§4.B `load`).
pub fn load(path: &Path, expected_manifest: &BuildManifest) -> Result<Vec<Chunk>, StorageError> {
    let bytes = std::fs::read(path).map_err(|_| StorageError::Corrupted {
        reason: format!("chunk store missing at {}", path.display()),
    })?;
    let file: ChunkStoreFile = serde_json::from_slice(&bytes).map_err(|e| StorageError::Corrupted {
        reason: format!("chunk store unreadable (legacy or malformed header): {e}"),
    })?;
    if !file.header.matches(expected_manifest) {
        return Err(StorageError::Corrupted {
            reason: "Keyword index build mismatch".to_string(),
        });
    }
    Ok(file.chunks)
}

/// Write a complete chunk store to `path`. Used by the indexer when
/// assembling staged artifacts (§4.E) — always a full replacement, never a
/// patch, so both full and incremental builds produce a self-consistent
/// chunk store.
pub fn write(path: &Path, header: ArtifactHeader, chunks: &[Chunk]) -> Result<(), StorageError> {
    let file = ChunkStoreFile {
        header,
        chunks: chunks.to_vec(),
    };
    let bytes = serde_json::to_vec(&file)?;
    std::fs::write(path, bytes)?;
    Ok(())
}
