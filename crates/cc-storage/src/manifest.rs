use std::path::{Path, PathBuf};

use cc_core::{ArtifactHeader, BuildManifest, FORMAT_VERSION, META_VERSION};

use crate::error::StorageError;

pub const MANIFEST_FILE: &str = "index-meta.json";
pub const VECTOR_BUILD_MARKER_FILE: &str = "index-build.json";

#[derive(serde::Deserialize)]
struct ChunkStoreHeaderOnly {
    header: ArtifactHeader,
}

/// Read the authoritative manifest from `root/index-meta.json` (§4.A).
pub fn read_manifest(root: &Path) -> Result<BuildManifest, StorageError> {
    let path = root.join(MANIFEST_FILE);
    let bytes = std::fs::read(&path).map_err(|_| StorageError::NotFound {
        path: path.display().to_string(),
    })?;
    serde_json::from_slice(&bytes).map_err(StorageError::from)
}

/// Atomically publish a manifest: write to a sibling temp file, then rename
/// (§4.E step 5 — manifest rename is the linearization point of a build).
pub fn write_manifest_atomic(root: &Path, manifest: &BuildManifest) -> Result<(), StorageError> {
    let dest = root.join(MANIFEST_FILE);
    let tmp = root.join(format!("{MANIFEST_FILE}.tmp-{}", manifest.build_id));
    let bytes = serde_json::to_vec_pretty(manifest)?;
    std::fs::write(&tmp, bytes)?;
    std::fs::rename(&tmp, &dest)?;
    Ok(())
}

/// Run the five ordered validation checks from §4.A. Fails closed: the
/// first failing check determines the `Corrupted` reason.
pub fn validate(root: &Path, manifest: &BuildManifest) -> Result<(), StorageError> {
    if manifest.meta_version != META_VERSION {
        return Err(corrupted("Meta version mismatch"));
    }
    if manifest.format_version != FORMAT_VERSION {
        return Err(corrupted("Format version mismatch"));
    }

    let keyword_path = root.join(&manifest.artifacts.keyword_store_path);
    let vector_path = root.join(&manifest.artifacts.vector_store_path);
    let intelligence_path = root.join(&manifest.artifacts.intelligence_path);
    for path in [&keyword_path, &vector_path, &intelligence_path] {
        if !path.exists() {
            return Err(corrupted(format!("artifact missing: {}", path.display())));
        }
    }

    let keyword_header = read_chunk_store_header(&keyword_path)?;
    if !keyword_header.matches(manifest) {
        return Err(corrupted("Keyword index build mismatch"));
    }

    let vector_header = read_vector_build_marker(&vector_path)?;
    if !vector_header.matches(manifest) {
        return Err(corrupted("Vector DB build mismatch"));
    }

    Ok(())
}

fn read_chunk_store_header(chunk_store_path: &Path) -> Result<ArtifactHeader, StorageError> {
    let file = std::fs::File::open(chunk_store_path)?;
    let parsed: ChunkStoreHeaderOnly = serde_json::from_reader(std::io::BufReader::new(file))
        .map_err(|e| StorageError::Corrupted {
            reason: format!("unreadable chunk store header: {e}"),
        })?;
    Ok(parsed.header)
}

fn read_vector_build_marker(vector_store_dir: &Path) -> Result<ArtifactHeader, StorageError> {
    let marker_path = vector_store_dir.join(VECTOR_BUILD_MARKER_FILE);
    let bytes = std::fs::read(&marker_path).map_err(|_| StorageError::Corrupted {
        reason: "missing vector-store build marker".to_string(),
    })?;
    serde_json::from_slice(&bytes).map_err(|e| StorageError::Corrupted {
        reason: format!("unreadable vector-store build marker: {e}"),
    })
}

fn corrupted(reason: impl Into<String>) -> StorageError {
    StorageError::Corrupted {
        reason: reason.into(),
    }
}

/// Write the vector-store build marker atomically alongside the vector data
/// (§4.C).
pub fn write_vector_build_marker_atomic(
    vector_store_dir: &Path,
    header: &ArtifactHeader,
) -> Result<(), StorageError> {
    std::fs::create_dir_all(vector_store_dir)?;
    let dest = vector_store_dir.join(VECTOR_BUILD_MARKER_FILE);
    let tmp: PathBuf = vector_store_dir.join(format!("{VECTOR_BUILD_MARKER_FILE}.tmp"));
    std::fs::write(&tmp, serde_json::to_vec(header)?)?;
    std::fs::rename(&tmp, &dest)?;
    Ok(())
}
