use std::collections::HashMap;
use std::path::Path;

use cc_core::{ArtifactHeader, ChunkId};
use usearch::{Index, IndexOptions, MetricKind, ScalarKind};

use crate::error::StorageError;
use crate::manifest::write_vector_build_marker_atomic;

const INDEX_FILE: &str = "vectors.usearch";

/// Equality filters applied to candidates before they are returned from
/// `cosine_knn` (§4.C). `None` means "don't filter on this field".
#[derive(Debug, Clone, Default)]
pub struct VectorFilters {
    pub framework: Option<String>,
    pub component_type: Option<String>,
    pub layer: Option<String>,
    pub language: Option<String>,
}

impl VectorFilters {
    fn matches(&self, meta: &VectorEntryMeta) -> bool {
        if let Some(framework) = &self.framework {
            if meta.framework.as_deref() != Some(framework.as_str()) {
                return false;
            }
        }
        if let Some(component_type) = &self.component_type {
            if meta.component_type.as_deref() != Some(component_type.as_str()) {
                return false;
            }
        }
        if let Some(layer) = &self.layer {
            if meta.layer.as_deref() != Some(layer.as_str()) {
                return false;
            }
        }
        if let Some(language) = &self.language {
            if meta.language.as_deref() != Some(language.as_str()) {
                return false;
            }
        }
        true
    }
}

/// Metadata carried alongside each vector, used for filtering and for
/// mapping a hit back to its chunk and path (§4.C).
#[derive(Debug, Clone)]
pub struct VectorEntryMeta {
    pub chunk_id: ChunkId,
    pub relative_path: String,
    pub framework: Option<String>,
    pub component_type: Option<String>,
    pub layer: Option<String>,
    pub language: Option<String>,
}

/// A batch entry to upsert (§4.C `upsert`).
pub struct VectorEntry {
    pub meta: VectorEntryMeta,
    pub vector: Vec<f32>,
}

/// A single k-NN hit: the chunk id and its cosine similarity (not distance —
/// similarity, so higher is better, per §4.C).
#[derive(Debug, Clone)]
pub struct VectorHit {
    pub chunk_id: ChunkId,
    pub relative_path: String,
    pub cosine_similarity: f32,
}

/// HNSW vector index backed by usearch (§4.C).
///
/// Configuration: cosine distance, M=32, ef_construction=200, ef_search=100.
/// Dimension is fixed at creation time. usearch keys are u64; `ChunkId` is a
/// 128-bit uuid, so a bidirectional sidecar maps the low 64 bits of the
/// uuid's integer form to its full metadata, persisted next to the index.
pub struct VectorStore {
    index: Index,
    dimension: usize,
    key_to_meta: HashMap<u64, VectorEntryMeta>,
}

impl VectorStore {
    pub fn new(dimension: usize) -> Result<Self, StorageError> {
        let index = create_index(dimension)?;
        Ok(Self {
            index,
            dimension,
            key_to_meta: HashMap::new(),
        })
    }

    /// Open an existing vector store directory, or create a fresh in-memory
    /// one if it doesn't exist yet.
    pub fn open(dir: &Path, dimension: usize) -> Result<Self, StorageError> {
        let index_path = dir.join(INDEX_FILE);
        if !index_path.exists() {
            return Self::new(dimension);
        }
        let index = create_index(dimension)?;
        index
            .load(index_path.to_str().unwrap_or(""))
            .map_err(|e| StorageError::VectorIndexUnavailable {
                reason: format!("failed to load vector index: {e}"),
            })?;
        let loaded_dim = index.dimensions();
        if loaded_dim != dimension {
            return Err(StorageError::DimensionMismatch {
                expected: dimension,
                actual: loaded_dim,
            });
        }
        let key_to_meta = load_key_map(&index_path)?;
        Ok(Self {
            index,
            dimension,
            key_to_meta,
        })
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn count(&self) -> usize {
        self.key_to_meta.len()
    }

    pub fn is_empty(&self) -> bool {
        self.key_to_meta.is_empty()
    }

    /// Upsert a batch of vectors (§4.C `upsert`). Idempotent: re-upserting a
    /// chunk id replaces its prior vector and metadata.
    pub fn upsert(&mut self, entries: Vec<VectorEntry>) -> Result<(), StorageError> {
        for entry in entries {
            self.upsert_one(entry)?;
        }
        Ok(())
    }

    fn upsert_one(&mut self, entry: VectorEntry) -> Result<(), StorageError> {
        if entry.vector.len() != self.dimension {
            return Err(StorageError::DimensionMismatch {
                expected: self.dimension,
                actual: entry.vector.len(),
            });
        }
        let key = chunk_id_to_key(entry.meta.chunk_id);
        if self.index.contains(key) {
            let _ = self.index.remove(key);
        }
        if self.index.size() >= self.index.capacity() {
            let new_cap = (self.index.capacity() + 1).max(64) * 2;
            self.index
                .reserve(new_cap)
                .map_err(|e| StorageError::VectorIndexUnavailable {
                    reason: format!("reserve failed: {e}"),
                })?;
        }
        self.index
            .add(key, &entry.vector)
            .map_err(|e| StorageError::VectorIndexUnavailable {
                reason: format!("add failed: {e}"),
            })?;
        self.key_to_meta.insert(key, entry.meta);
        Ok(())
    }

    /// Remove every chunk whose relative path is in `paths` (§4.C
    /// `delete_by_paths`, used when a file is removed or rewritten).
    pub fn delete_by_paths(&mut self, paths: &[String]) -> Result<usize, StorageError> {
        let keys: Vec<u64> = self
            .key_to_meta
            .iter()
            .filter(|(_, meta)| paths.iter().any(|p| p == &meta.relative_path))
            .map(|(&key, _)| key)
            .collect();
        for key in &keys {
            self.index
                .remove(*key)
                .map_err(|e| StorageError::VectorIndexUnavailable {
                    reason: format!("remove failed: {e}"),
                })?;
            self.key_to_meta.remove(key);
        }
        Ok(keys.len())
    }

    /// Drop every vector, keeping the store open for a fresh full build
    /// (§4.C `drop_all`).
    pub fn drop_all(&mut self) -> Result<(), StorageError> {
        let keys: Vec<u64> = self.key_to_meta.keys().copied().collect();
        for key in keys {
            let _ = self.index.remove(key);
        }
        self.key_to_meta.clear();
        Ok(())
    }

    /// Cosine k-NN search with equality metadata filters applied after
    /// retrieval (§4.C `cosine_knn`). Over-fetches to compensate for
    /// filtered-out candidates, then truncates to `k`.
    pub fn cosine_knn(
        &self,
        query: &[f32],
        k: usize,
        filters: &VectorFilters,
    ) -> Result<Vec<VectorHit>, StorageError> {
        if query.len() != self.dimension {
            return Err(StorageError::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            });
        }
        if self.index.size() == 0 {
            return Ok(Vec::new());
        }
        let fetch_k = (k * 8).max(k + 32).min(self.index.size());
        let matches = self
            .index
            .search(query, fetch_k)
            .map_err(|e| StorageError::VectorIndexUnavailable {
                reason: format!("search failed: {e}"),
            })?;
        let mut hits: Vec<VectorHit> = matches
            .keys
            .iter()
            .zip(matches.distances.iter())
            .filter_map(|(&key, &cosine_distance)| {
                let meta = self.key_to_meta.get(&key)?;
                if !filters.matches(meta) {
                    return None;
                }
                Some(VectorHit {
                    chunk_id: meta.chunk_id,
                    relative_path: meta.relative_path.clone(),
                    cosine_similarity: (1.0 - cosine_distance).max(0.0),
                })
            })
            .collect();
        hits.truncate(k);
        Ok(hits)
    }

    /// Persist the index, key map, and build marker to `dir` (§4.C, §4.A).
    pub fn save(&self, dir: &Path, header: &ArtifactHeader) -> Result<(), StorageError> {
        std::fs::create_dir_all(dir)?;
        let index_path = dir.join(INDEX_FILE);
        self.index
            .save(index_path.to_str().unwrap_or(""))
            .map_err(|e| StorageError::VectorIndexUnavailable {
                reason: format!("save failed: {e}"),
            })?;
        save_key_map(&index_path, &self.key_to_meta)?;
        write_vector_build_marker_atomic(dir, header)?;
        Ok(())
    }
}

fn chunk_id_to_key(id: ChunkId) -> u64 {
    id.0.as_u128() as u64
}

fn create_index(dimension: usize) -> Result<Index, StorageError> {
    let mut options = IndexOptions::default();
    options.dimensions = dimension;
    options.metric = MetricKind::Cos;
    options.quantization = ScalarKind::F32;
    options.connectivity = 32; // M=32
    options.expansion_add = 200; // ef_construction=200
    options.expansion_search = 100; // ef_search=100

    Index::new(&options).map_err(|e| StorageError::VectorIndexUnavailable {
        reason: format!("failed to create index: {e}"),
    })
}

fn key_map_path(index_path: &Path) -> std::path::PathBuf {
    index_path.with_extension("keymap.json")
}

fn save_key_map(index_path: &Path, map: &HashMap<u64, VectorEntryMeta>) -> Result<(), StorageError> {
    #[derive(serde::Serialize)]
    struct Entry<'a> {
        key: u64,
        chunk_id: ChunkId,
        relative_path: &'a str,
        framework: &'a Option<String>,
        component_type: &'a Option<String>,
        layer: &'a Option<String>,
        language: &'a Option<String>,
    }
    let entries: Vec<Entry> = map
        .iter()
        .map(|(&key, meta)| Entry {
            key,
            chunk_id: meta.chunk_id,
            relative_path: &meta.relative_path,
            framework: &meta.framework,
            component_type: &meta.component_type,
            layer: &meta.layer,
            language: &meta.language,
        })
        .collect();
    let path = key_map_path(index_path);
    std::fs::write(&path, serde_json::to_vec(&entries)?)?;
    Ok(())
}

fn load_key_map(index_path: &Path) -> Result<HashMap<u64, VectorEntryMeta>, StorageError> {
    #[derive(serde::Deserialize)]
    struct Entry {
        key: u64,
        chunk_id: ChunkId,
        relative_path: String,
        framework: Option<String>,
        component_type: Option<String>,
        layer: Option<String>,
        language: Option<String>,
    }
    let path = key_map_path(index_path);
    if !path.exists() {
        return Ok(HashMap::new());
    }
    let bytes = std::fs::read(&path)?;
    let entries: Vec<Entry> = serde_json::from_slice(&bytes).map_err(|e| {
        StorageError::VectorIndexUnavailable {
            reason: format!("unreadable key map: {e}"),
        }
    })?;
    Ok(entries
        .into_iter()
        .map(|e| {
            (
                e.key,
                VectorEntryMeta {
                    chunk_id: e.chunk_id,
                    relative_path: e.relative_path,
                    framework: e.framework,
                    component_type: e.component_type,
                    layer: e.layer,
                    language: e.language,
                },
            )
        })
        .collect())
}
