use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::StorageError;

pub const FILE_MANIFEST_FILE: &str = "file-manifest.json";

/// Per-file record used to classify a file as added/changed/deleted/
/// unchanged on the next incremental run (§3 File Manifest).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FileRecord {
    pub content_hash: u64,
    pub size: u64,
    pub mtime_unix_seconds: i64,
}

impl FileRecord {
    pub fn for_content(content: &[u8], mtime_unix_seconds: i64) -> Self {
        Self {
            content_hash: xxhash_rust::xxh3::xxh3_64(content),
            size: content.len() as u64,
            mtime_unix_seconds,
        }
    }
}

/// Mapping from relative-path to its last-recorded `FileRecord` (§3).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileManifest {
    pub files: BTreeMap<String, FileRecord>,
}

pub fn read(root: &Path) -> Result<FileManifest, StorageError> {
    let path = root.join(FILE_MANIFEST_FILE);
    match std::fs::read(&path) {
        Ok(bytes) => serde_json::from_slice(&bytes).map_err(StorageError::from),
        Err(_) => Ok(FileManifest::default()),
    }
}

pub fn write_atomic(root: &Path, manifest: &FileManifest) -> Result<(), StorageError> {
    let dest = root.join(FILE_MANIFEST_FILE);
    let tmp = root.join(format!("{FILE_MANIFEST_FILE}.tmp"));
    std::fs::write(&tmp, serde_json::to_vec(manifest)?)?;
    std::fs::rename(&tmp, &dest)?;
    Ok(())
}

/// Files classified by content-hash comparison against a prior manifest
/// (§4.E incremental protocol step 2).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileDiff {
    pub added: Vec<String>,
    pub changed: Vec<String>,
    pub deleted: Vec<String>,
    pub unchanged: Vec<String>,
}

impl FileDiff {
    pub fn has_changes(&self) -> bool {
        !self.added.is_empty() || !self.changed.is_empty() || !self.deleted.is_empty()
    }
}

/// Classify `current` (freshly scanned) against `previous` (the prior run's
/// manifest). A path present in both with an unchanged `content_hash` is
/// `unchanged` even if `mtime`/`size` differ (hash is authoritative;
/// `should_reindex`-style mtime bookkeeping is advisory only).
pub fn diff(previous: &FileManifest, current: &FileManifest) -> FileDiff {
    let mut result = FileDiff::default();

    for (path, record) in &current.files {
        match previous.files.get(path) {
            None => result.added.push(path.clone()),
            Some(prior) if prior.content_hash != record.content_hash => {
                result.changed.push(path.clone())
            }
            Some(_) => result.unchanged.push(path.clone()),
        }
    }
    for path in previous.files.keys() {
        if !current.files.contains_key(path) {
            result.deleted.push(path.clone());
        }
    }

    result.added.sort();
    result.changed.sort();
    result.deleted.sort();
    result.unchanged.sort();
    result
}
